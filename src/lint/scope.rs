//! Name resolution for `no-undef` and `react-in-jsx-scope`.
//!
//! References are resolved against a stack of scopes: the program, each
//! function (its parameters, hoisted `var`s and its own name) and each
//! block (`let`, `const`, `class` and function declarations). `catch`
//! bindings, `for (let ...)` heads and named class expressions get a
//! scope of their own.

use std::collections::HashSet;

use crate::js::syntax::{
    declarations, expression_end, is_asi_boundary, is_function_body, is_non_reference,
    is_parameter_list, parse_import, pattern_names, statement_end, visit, Level,
};
use crate::js::{Fragment, Group, JsxAttr, JsxAttrValue, JsxChild, JsxElement, Node, TokenKind};

/// A use of a name that must resolve to a declaration or global.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    pub name: String,
    pub line: usize,
    pub col: usize,
}

/// Names declared at the top level of the program, hoisted `var`s
/// included.
pub fn program_names(program: &Fragment) -> HashSet<String> {
    let mut names = Vec::new();
    imports(&program.nodes, &mut names);
    hoisted_vars(&program.nodes, &mut names);
    block_declarations(&program.nodes, &mut names);
    names.into_iter().collect()
}

/// References that resolve to no enclosing declaration, in source order.
pub fn unresolved(program: &Fragment) -> Vec<Reference> {
    let mut resolver = Resolver::default();
    resolver.scoped(program_names(program).into_iter().collect(), |r| {
        r.walk(&program.nodes, Level::Program);
    });
    let mut refs = resolver.unresolved;
    refs.sort_by_key(|r| (r.line, r.col));
    refs
}

fn imports(nodes: &[Node], out: &mut Vec<String>) {
    for i in 0..nodes.len() {
        if let Some(decl) = parse_import(nodes, i) {
            out.extend(decl.locals());
        }
    }
}

/// `var` names declared in `nodes` outside nested functions.
fn hoisted_vars(nodes: &[Node], out: &mut Vec<String>) {
    for (i, node) in nodes.iter().enumerate() {
        match node {
            Node::Token(_) if node.is_ident("var") && !is_member_name(nodes, i) => {
                for declarator in declarations(nodes, i).declarators {
                    pattern_names(&nodes[declarator.pattern], out);
                }
            }
            Node::Group(group) if !is_function_body(nodes, i) => hoisted_vars(&group.children, out),
            _ => {}
        }
    }
}

/// Whether the keyword at `i` starts a statement.
fn starts_statement(nodes: &[Node], i: usize) -> bool {
    match i.checked_sub(1).map(|p| &nodes[p]) {
        None => true,
        Some(prev) => {
            prev.is_punct(";")
                || prev.is_group("{")
                || prev.is_ident("export")
                || prev.is_ident("default")
                || is_asi_boundary(prev, &nodes[i])
        }
    }
}

/// Names a block sequence declares directly: `let`, `const`, and `class`
/// and `function` declarations.
fn block_declarations(nodes: &[Node], out: &mut Vec<String>) {
    for (i, node) in nodes.iter().enumerate() {
        if is_member_name(nodes, i) {
            continue;
        }
        match node.ident() {
            Some("let" | "const") => {
                for declarator in declarations(nodes, i).declarators {
                    pattern_names(&nodes[declarator.pattern], out);
                }
            }
            Some("function") if starts_statement(nodes, i) => {
                let j = if nodes.get(i + 1).is_some_and(|n| n.is_punct("*")) {
                    i + 2
                } else {
                    i + 1
                };
                if let Some(name) = nodes.get(j).and_then(Node::ident) {
                    out.push(name.to_string());
                }
            }
            Some("class") if starts_statement(nodes, i) => {
                if let Some(name) = nodes.get(i + 1).and_then(Node::ident) {
                    if name != "extends" {
                        out.push(name.to_string());
                    }
                }
            }
            _ => {}
        }
    }
}

fn is_member_name(nodes: &[Node], i: usize) -> bool {
    i > 0 && (nodes[i - 1].is_punct(".") || nodes[i - 1].is_punct("?."))
}

#[derive(Default)]
struct Resolver {
    scopes: Vec<HashSet<String>>,
    unresolved: Vec<Reference>,
}

impl Resolver {
    fn scoped(&mut self, names: Vec<String>, f: impl FnOnce(&mut Self)) {
        self.scopes.push(names.into_iter().collect());
        f(self);
        self.scopes.pop();
    }

    fn resolve(&mut self, name: &str, line: usize, col: usize) {
        if !self.scopes.iter().rev().any(|scope| scope.contains(name)) {
            self.unresolved.push(Reference {
                name: name.to_string(),
                line,
                col,
            });
        }
    }

    fn walk(&mut self, nodes: &[Node], level: Level) {
        let mut i = 0;
        while i < nodes.len() {
            i = self.step(nodes, i, level);
        }
    }

    /// Resolve what starts at `i`; returns the index to continue from.
    fn step(&mut self, nodes: &[Node], i: usize, level: Level) -> usize {
        let node = &nodes[i];
        if node.is_ident("import") {
            if let Some(decl) = parse_import(nodes, i) {
                return decl.end;
            }
        }
        if !is_member_name(nodes, i) {
            if node.is_ident("function") {
                return self.function(nodes, i);
            }
            let is_key = nodes
                .get(i + 1)
                .is_some_and(|n| n.is_punct(":") || n.is_group("("));
            if node.is_ident("class") && !is_key {
                return self.class(nodes, i);
            }
            if node.is_ident("catch") && nodes.get(i + 1).is_some_and(|n| n.is_group("(")) {
                return self.catch(nodes, i);
            }
            if node.is_ident("for") {
                if let Some(end) = self.lexical_for(nodes, i) {
                    return end;
                }
            }
        }

        match node {
            Node::Token(token) => match &token.kind {
                TokenKind::Ident if nodes.get(i + 1).is_some_and(|n| n.is_punct("=>")) => {
                    let mut params = Vec::new();
                    pattern_names(node, &mut params);
                    return self.arrow(nodes, i, params);
                }
                TokenKind::Ident => {
                    if !is_non_reference(&token.text) && is_reference_position(nodes, i, level) {
                        self.resolve(&token.text, token.line, token.col);
                    }
                }
                TokenKind::Template(template) => {
                    for expr in &template.exprs {
                        self.walk(&expr.nodes, Level::Embedded);
                    }
                }
                TokenKind::Jsx(element) => self.jsx(element),
                _ => {}
            },
            Node::Group(group) if group.open.text == "(" && is_parameter_list(nodes, i) => {
                let mut params = Vec::new();
                pattern_names(node, &mut params);
                if nodes.get(i + 1).is_some_and(|n| n.is_punct("=>")) {
                    return self.arrow(nodes, i, params);
                }
                if let Some(Node::Group(body)) = nodes.get(i + 1).filter(|n| n.is_group("{")) {
                    self.function_scope(params, group, body);
                    return i + 2;
                }
                self.walk(&group.children, Level::Paren);
            }
            Node::Group(group) if group.open.text == "{" => self.block(group),
            Node::Group(group) => self.walk(&group.children, Level::of(group)),
        }
        i + 1
    }

    fn block(&mut self, group: &Group) {
        let mut names = Vec::new();
        block_declarations(&group.children, &mut names);
        self.scoped(names, |r| r.walk(&group.children, Level::Brace));
    }

    /// Parameters and body share one scope.
    fn function_scope(&mut self, mut names: Vec<String>, params: &Group, body: &Group) {
        hoisted_vars(&body.children, &mut names);
        block_declarations(&body.children, &mut names);
        self.scoped(names, |r| {
            r.walk(&params.children, Level::Paren);
            r.walk(&body.children, Level::Brace);
        });
    }

    /// `function [*] [name] (params) { body }`; the name is visible inside.
    fn function(&mut self, nodes: &[Node], i: usize) -> usize {
        let mut j = i + 1;
        if nodes.get(j).is_some_and(|n| n.is_punct("*")) {
            j += 1;
        }
        let mut names = Vec::new();
        if let Some(name) = nodes.get(j).and_then(Node::ident) {
            names.push(name.to_string());
            j += 1;
        }
        match (nodes.get(j), nodes.get(j + 1)) {
            (Some(Node::Group(params)), Some(Node::Group(body)))
                if params.open.text == "(" && body.open.text == "{" =>
            {
                pattern_names(&nodes[j], &mut names);
                self.function_scope(names, params, body);
                j + 2
            }
            _ => j,
        }
    }

    /// Arrow whose parameters are at `i`. An expression body ends where
    /// the assignment expression does.
    fn arrow(&mut self, nodes: &[Node], i: usize, params: Vec<String>) -> usize {
        let body = i + 2;
        match (&nodes[i], nodes.get(body)) {
            (Node::Group(param_group), Some(Node::Group(block))) if block.open.text == "{" => {
                self.function_scope(params, param_group, block);
                body + 1
            }
            (_, Some(Node::Group(block))) if block.open.text == "{" => {
                let empty = Group::new("(", Vec::new(), ")");
                self.function_scope(params, &empty, block);
                body + 1
            }
            _ => {
                let end = expression_end(nodes, body).max(body);
                self.scoped(params, |r| {
                    if let Node::Group(param_group) = &nodes[i] {
                        r.walk(&param_group.children, Level::Paren);
                    }
                    r.walk(&nodes[body..end], Level::Embedded);
                });
                end
            }
        }
    }

    /// `class [Name] [extends Heritage] { body }`; a class expression's
    /// name is visible inside it.
    fn class(&mut self, nodes: &[Node], i: usize) -> usize {
        let Some(offset) = nodes[i + 1..].iter().position(|n| n.is_group("{")) else {
            return i + 1;
        };
        let body = i + 1 + offset;
        let names: Vec<String> = nodes
            .get(i + 1)
            .and_then(Node::ident)
            .filter(|name| *name != "extends")
            .map(str::to_string)
            .into_iter()
            .collect();
        let start = i + 1 + names.len();
        self.scoped(names, |r| r.walk(&nodes[start..=body], Level::Embedded));
        body + 1
    }

    fn catch(&mut self, nodes: &[Node], i: usize) -> usize {
        let mut names = Vec::new();
        pattern_names(&nodes[i + 1], &mut names);
        let end = (i + 3).min(nodes.len());
        self.scoped(names, |r| r.walk(&nodes[i + 1..end], Level::Embedded));
        end
    }

    /// `for (let ...)` and `for (const ...)`: the head's bindings cover
    /// the head and the body. `None` for other loops.
    fn lexical_for(&mut self, nodes: &[Node], i: usize) -> Option<usize> {
        let Some(Node::Group(head)) = nodes.get(i + 1) else {
            return None;
        };
        let declares = head.open.text == "("
            && head
                .children
                .first()
                .is_some_and(|n| n.is_ident("let") || n.is_ident("const"));
        if !declares {
            return None;
        }
        let mut names = Vec::new();
        for declarator in declarations(&head.children, 0).declarators {
            pattern_names(&head.children[declarator.pattern], &mut names);
        }
        let end = match nodes.get(i + 2) {
            Some(body) if body.is_group("{") => i + 3,
            Some(_) => statement_end(nodes, i + 2),
            None => nodes.len(),
        };
        self.scoped(names, |r| r.walk(&nodes[i + 1..end], Level::Embedded));
        Some(end)
    }

    fn jsx(&mut self, element: &JsxElement) {
        if let Some(name) = &element.name {
            let head = name.split(['.', ':']).next().unwrap_or_default();
            let is_component = name.contains('.') || head.starts_with(|c: char| c.is_uppercase());
            if is_component && head != "this" {
                self.resolve(head, element.line, element.col + 1);
            }
        }
        for attr in &element.attrs {
            match attr {
                JsxAttr::Spread(fragment) => self.walk(&fragment.nodes, Level::Embedded),
                JsxAttr::Named {
                    value: Some(JsxAttrValue::Expr(fragment)),
                    ..
                } => self.walk(&fragment.nodes, Level::Embedded),
                JsxAttr::Named {
                    value: Some(JsxAttrValue::Element(child)),
                    ..
                } => self.jsx(child),
                JsxAttr::Named { .. } => {}
            }
        }
        for child in &element.children {
            match child {
                JsxChild::Expr(fragment) => self.walk(&fragment.nodes, Level::Embedded),
                JsxChild::Element(child) => self.jsx(child),
                JsxChild::Text(_) => {}
            }
        }
    }
}

fn is_reference_position(nodes: &[Node], i: usize, level: Level) -> bool {
    let prev = i.checked_sub(1).and_then(|p| nodes.get(p));
    let next = nodes.get(i + 1);

    // Property access.
    if prev.is_some_and(|p| p.is_punct(".") || p.is_punct("?.")) {
        return false;
    }
    // Declared names, labels on break/continue and renamed export specifiers.
    if prev.is_some_and(|p| {
        ["class", "function", "break", "continue", "as"]
            .iter()
            .any(|word| p.is_ident(word))
    }) {
        return false;
    }

    let starts_element = prev.map_or(true, |p| p.is_punct(",") || p.is_punct(";"));

    // Object keys, pattern keys and statement labels.
    if next.is_some_and(|n| n.is_punct(":")) && starts_element {
        return false;
    }

    // Method names in object literals and class bodies.
    let is_method_head = next.is_some_and(|n| n.is_group("("))
        && nodes.get(i + 2).is_some_and(|n| n.is_group("{"));
    if is_method_head && level == Level::Brace {
        let after_modifier = prev.is_some_and(|p| {
            p.is_punct("*")
                || p.is_group("{")
                || ["get", "set", "static", "async"]
                    .iter()
                    .any(|m| p.is_ident(m))
        });
        if starts_element || after_modifier {
            return false;
        }
    }

    true
}

/// Position of the first JSX element in the file, if any.
pub fn first_jsx(program: &Fragment) -> Option<(usize, usize)> {
    let mut first: Option<(usize, usize)> = None;
    visit(&program.nodes, Level::Program, &mut |nodes, _| {
        for node in nodes {
            if let Node::Token(token) = node {
                if matches!(token.kind, TokenKind::Jsx(_)) {
                    let position = (token.line, token.col);
                    if first.map_or(true, |f| position < f) {
                        first = Some(position);
                    }
                }
            }
        }
    });
    first
}
