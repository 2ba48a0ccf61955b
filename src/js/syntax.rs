//! Syntax helpers over the bracket tree.
//!
//! These recognize the handful of constructs the lint rules and transform
//! passes care about (expression extents, declarator lists, binding
//! patterns, import declarations) without building a full AST.

use crate::error::Result;
use crate::js::token::{Group, JsxAttr, JsxAttrValue, JsxChild, JsxElement, Node, TokenKind};

/// Reserved words plus literals; never variable references.
const RESERVED: &[&str] = &[
    "break", "case", "catch", "class", "const", "continue", "debugger", "default", "delete", "do",
    "else", "export", "extends", "finally", "for", "function", "if", "import", "in", "instanceof",
    "new", "return", "super", "switch", "this", "throw", "try", "typeof", "var", "void", "while",
    "with", "yield", "let", "static", "await", "enum", "null", "true", "false",
];

/// Contextual keywords that are treated as non-references.
const CONTEXTUAL: &[&str] = &["async", "of", "get", "set", "as", "from", "target", "meta"];

/// Keywords after which an expression must continue.
const CONTINUING_KEYWORDS: &[&str] = &[
    "return", "typeof", "new", "delete", "void", "in", "instanceof", "of", "await", "yield",
    "case", "throw", "extends", "else", "do", "var", "let", "const",
];

pub fn is_reserved(name: &str) -> bool {
    RESERVED.contains(&name)
}

/// Whether an identifier can never be a variable reference.
pub fn is_non_reference(name: &str) -> bool {
    is_reserved(name) || CONTEXTUAL.contains(&name)
}

/// Kind of bracket level a node sequence sits in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Program,
    Paren,
    Bracket,
    Brace,
    /// Template substitution or JSX expression container.
    Embedded,
}

impl Level {
    pub fn of(group: &Group) -> Self {
        match group.open.text.as_str() {
            "(" => Level::Paren,
            "[" => Level::Bracket,
            _ => Level::Brace,
        }
    }
}

/// Split a node sequence at its top-level commas.
///
/// A trailing comma does not produce an empty final element; holes
/// (`[a, , b]`) produce empty elements.
pub fn split_commas(nodes: &[Node]) -> Vec<&[Node]> {
    let mut parts = Vec::new();
    let mut start = 0;
    for (i, node) in nodes.iter().enumerate() {
        if node.is_punct(",") {
            parts.push(&nodes[start..i]);
            start = i + 1;
        }
    }
    if start < nodes.len() {
        parts.push(&nodes[start..]);
    }
    parts
}

/// Whether `node` can be the last token of an expression.
fn ends_expression(node: &Node) -> bool {
    match node {
        Node::Group(_) => true,
        Node::Token(token) => match token.kind {
            TokenKind::Ident => !CONTINUING_KEYWORDS.contains(&token.text.as_str()),
            TokenKind::Punct => matches!(token.text.as_str(), "++" | "--"),
            _ => true,
        },
    }
}

/// Whether `node` can only begin a new statement after a line break.
fn starts_statement(node: &Node) -> bool {
    match node {
        Node::Group(group) => group.open.text == "{",
        Node::Token(token) => match token.kind {
            TokenKind::Ident => !matches!(token.text.as_str(), "in" | "instanceof" | "of"),
            TokenKind::Punct => matches!(token.text.as_str(), "++" | "--" | "!" | "~"),
            _ => true,
        },
    }
}

/// Whether automatic semicolon insertion splits `prev` from `next`.
pub fn is_asi_boundary(prev: &Node, next: &Node) -> bool {
    next.has_newline_before() && ends_expression(prev) && starts_statement(next)
}

/// Index just past the assignment expression starting at `start`.
///
/// The expression stops at a top-level `,` or `;`, at a `:` that does not
/// close a pending `?`, at a line break where a semicolon would be
/// inserted, or at the end of the sequence.
pub fn expression_end(nodes: &[Node], start: usize) -> usize {
    let mut pending_conditionals = 0usize;
    let mut i = start;
    while i < nodes.len() {
        let node = &nodes[i];
        if i > start && is_asi_boundary(&nodes[i - 1], node) {
            break;
        }
        if node.is_punct(",") || node.is_punct(";") {
            break;
        }
        if node.is_punct("?") {
            pending_conditionals += 1;
        } else if node.is_punct(":") {
            if pending_conditionals == 0 {
                break;
            }
            pending_conditionals -= 1;
        }
        i += 1;
    }
    i
}

/// Index just past the statement starting at `start`, including its `;`.
pub fn statement_end(nodes: &[Node], start: usize) -> usize {
    let mut i = start;
    loop {
        let end = expression_end(nodes, i);
        match nodes.get(end) {
            Some(node) if node.is_punct(",") => i = end + 1,
            Some(node) if node.is_punct(";") => return end + 1,
            _ => return end,
        }
    }
}

/// One declarator of a `var`/`let`/`const` declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declarator {
    /// Index of the binding (identifier or pattern group).
    pub pattern: usize,
    /// Range of the initializer expression, without the `=`.
    pub init: Option<std::ops::Range<usize>>,
}

/// A parsed declaration list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclarationList {
    pub declarators: Vec<Declarator>,
    /// Index just past the declaration, including a terminating `;`.
    pub end: usize,
    /// Whether the declaration ends with an explicit `;`.
    pub has_semicolon: bool,
}

/// Parse the declarators following the `var`/`let`/`const` at `keyword`.
pub fn declarations(nodes: &[Node], keyword: usize) -> DeclarationList {
    let mut declarators = Vec::new();
    let mut i = keyword + 1;

    while i < nodes.len() {
        let pattern = i;
        i += 1;
        let init = if nodes.get(i).is_some_and(|n| n.is_punct("=")) {
            let start = i + 1;
            let end = expression_end(nodes, start);
            i = end;
            Some(start..end)
        } else {
            None
        };
        declarators.push(Declarator { pattern, init });

        if nodes.get(i).is_some_and(|n| n.is_punct(",")) {
            i += 1;
            continue;
        }
        break;
    }

    let has_semicolon = nodes.get(i).is_some_and(|n| n.is_punct(";"));
    DeclarationList {
        declarators,
        end: if has_semicolon { i + 1 } else { i },
        has_semicolon,
    }
}

/// Collect the names bound by a binding pattern node.
pub fn pattern_names(node: &Node, out: &mut Vec<String>) {
    match node {
        Node::Token(_) => {
            if let Some(name) = node.ident() {
                if !is_reserved(name) {
                    out.push(name.to_string());
                }
            }
        }
        Node::Group(group) if group.open.text == "{" => {
            for element in split_commas(&group.children) {
                let Some(first) = element.first() else {
                    continue;
                };
                if first.is_punct("...") {
                    if let Some(rest) = element.get(1) {
                        pattern_names(rest, out);
                    }
                } else if let Some(colon) = element.iter().position(|n| n.is_punct(":")) {
                    if let Some(target) = element.get(colon + 1) {
                        pattern_names(target, out);
                    }
                } else {
                    pattern_names(first, out);
                }
            }
        }
        Node::Group(group) => {
            for element in split_commas(&group.children) {
                let start = usize::from(element.first().is_some_and(|n| n.is_punct("...")));
                if let Some(target) = element.get(start) {
                    pattern_names(target, out);
                }
            }
        }
    }
}

/// A parsed `import` declaration.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ImportDecl {
    pub default: Option<String>,
    pub namespace: Option<String>,
    /// `(imported, local)` pairs.
    pub named: Vec<(String, String)>,
    /// Module specifier as written, with quotes.
    pub source: String,
    /// Index just past the declaration, including a terminating `;`.
    pub end: usize,
}

impl ImportDecl {
    /// Local names introduced by the declaration.
    pub fn locals(&self) -> Vec<String> {
        self.default
            .iter()
            .chain(self.namespace.iter())
            .cloned()
            .chain(self.named.iter().map(|(_, local)| local.clone()))
            .collect()
    }
}

/// Parse the `import` declaration starting at `start`.
///
/// Returns `None` when the tokens are not a static import declaration
/// (`import(...)`, `import.meta`) or are malformed.
pub fn parse_import(nodes: &[Node], start: usize) -> Option<ImportDecl> {
    if !nodes.get(start)?.is_ident("import") {
        return None;
    }
    let mut decl = ImportDecl::default();
    let mut i = start + 1;

    if let Some(Node::Token(token)) = nodes.get(i) {
        if token.kind == TokenKind::Str {
            decl.source = token.text.clone();
            decl.end = skip_semicolon(nodes, i + 1);
            return Some(decl);
        }
    }

    loop {
        let node = nodes.get(i)?;
        if node.is_ident("from") && (decl.default.is_some() || decl.namespace.is_some() || i > start + 1) {
            break;
        }
        if node.is_punct("*") {
            if !nodes.get(i + 1)?.is_ident("as") {
                return None;
            }
            decl.namespace = Some(nodes.get(i + 2)?.ident()?.to_string());
            i += 3;
        } else if let Some(group) = node.group().filter(|g| g.open.text == "{") {
            for element in split_commas(&group.children) {
                let imported = element.first()?.ident()?.to_string();
                let local = match element.get(1) {
                    Some(as_node) if as_node.is_ident("as") => element.get(2)?.ident()?.to_string(),
                    Some(_) => return None,
                    None => imported.clone(),
                };
                decl.named.push((imported, local));
            }
            i += 1;
        } else if let Some(name) = node.ident() {
            decl.default = Some(name.to_string());
            i += 1;
        } else {
            return None;
        }

        if nodes.get(i).is_some_and(|n| n.is_punct(",")) {
            i += 1;
        }
    }

    match nodes.get(i + 1) {
        Some(Node::Token(token)) if token.kind == TokenKind::Str => {
            decl.source = token.text.clone();
            decl.end = skip_semicolon(nodes, i + 2);
            Some(decl)
        }
        _ => None,
    }
}

fn skip_semicolon(nodes: &[Node], i: usize) -> usize {
    if nodes.get(i).is_some_and(|n| n.is_punct(";")) {
        i + 1
    } else {
        i
    }
}

/// Whether the `(` group at `i` is a parameter list: arrow parameters,
/// `function` and method parameters, or a `catch` binding.
pub fn is_parameter_list(nodes: &[Node], i: usize) -> bool {
    if nodes.get(i + 1).is_some_and(|n| n.is_punct("=>")) {
        return true;
    }
    let Some(prev) = i.checked_sub(1).map(|p| &nodes[p]) else {
        return false;
    };
    if prev.is_ident("function") || prev.is_ident("catch") || prev.is_punct("*") {
        return true;
    }
    if i >= 2 && nodes[i - 2].is_ident("function") {
        return true;
    }
    // Method heads: `name(...) {`.
    let before_body = nodes.get(i + 1).is_some_and(|n| n.is_group("{"));
    let is_key = match prev {
        Node::Group(group) => group.open.text == "[",
        Node::Token(token) => match token.kind {
            TokenKind::Ident => !is_reserved(&token.text),
            TokenKind::Str | TokenKind::Number => true,
            _ => false,
        },
    };
    before_body && is_key
}

/// Whether the `{` group at `i` is the body of a function, method or
/// arrow (as opposed to a block or an object literal).
pub fn is_function_body(nodes: &[Node], i: usize) -> bool {
    if !nodes.get(i).is_some_and(|n| n.is_group("{")) || i == 0 {
        return false;
    }
    if nodes[i - 1].is_punct("=>") {
        return true;
    }
    nodes[i - 1].is_group("(")
        && is_parameter_list(nodes, i - 1)
        && !(i >= 2 && nodes[i - 2].is_ident("catch"))
}

// ========== Traversal ==========

/// Visit every node sequence, including template substitutions and JSX
/// expression containers, parents before children.
pub fn visit(nodes: &[Node], level: Level, f: &mut dyn FnMut(&[Node], Level)) {
    f(nodes, level);
    for node in nodes {
        match node {
            Node::Group(group) => visit(&group.children, Level::of(group), f),
            Node::Token(token) => match &token.kind {
                TokenKind::Template(template) => {
                    for expr in &template.exprs {
                        visit(&expr.nodes, Level::Embedded, f);
                    }
                }
                TokenKind::Jsx(element) => visit_jsx(element, f),
                _ => {}
            },
        }
    }
}

fn visit_jsx(element: &JsxElement, f: &mut dyn FnMut(&[Node], Level)) {
    for attr in &element.attrs {
        match attr {
            JsxAttr::Spread(fragment) => visit(&fragment.nodes, Level::Embedded, f),
            JsxAttr::Named {
                value: Some(JsxAttrValue::Expr(fragment)),
                ..
            } => visit(&fragment.nodes, Level::Embedded, f),
            JsxAttr::Named {
                value: Some(JsxAttrValue::Element(child)),
                ..
            } => visit_jsx(child, f),
            JsxAttr::Named { .. } => {}
        }
    }
    for child in &element.children {
        match child {
            JsxChild::Expr(fragment) => visit(&fragment.nodes, Level::Embedded, f),
            JsxChild::Element(child) => visit_jsx(child, f),
            JsxChild::Text(_) => {}
        }
    }
}

/// Rewrite every node sequence bottom-up: children and template
/// substitutions first, then the sequence itself.
///
/// JSX interiors are not visited; the JSX pass replaces whole elements.
pub fn visit_mut(
    nodes: &mut Vec<Node>,
    level: Level,
    f: &mut dyn FnMut(&mut Vec<Node>, Level) -> Result<()>,
) -> Result<()> {
    for node in nodes.iter_mut() {
        match node {
            Node::Group(group) => {
                let child_level = Level::of(group);
                visit_mut(&mut group.children, child_level, f)?;
            }
            Node::Token(token) => {
                if let TokenKind::Template(template) = &mut token.kind {
                    for expr in template.exprs.iter_mut() {
                        visit_mut(&mut expr.nodes, Level::Embedded, f)?;
                    }
                }
            }
        }
    }
    f(nodes, level)
}
