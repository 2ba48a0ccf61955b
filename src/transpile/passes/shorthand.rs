//! Shorthand properties and methods in object literals.
//!
//! `{ a, m() {} }` becomes `{ a: a, m: function () {} }`. Only braces in
//! expression position are object literals; blocks, class bodies and
//! binding patterns are left alone.

use std::collections::HashSet;

use crate::js::syntax::{declarations, is_reserved, Level};
use crate::js::{Fragment, Node, Token, TokenKind};
use crate::transpile::passes::is_parameter_list;
use crate::Result;

/// Keywords after which a `{` starts an expression.
const EXPRESSION_KEYWORDS: &[&str] = &[
    "return", "typeof", "void", "delete", "in", "instanceof", "of", "yield", "await", "throw",
    "case", "new",
];

pub fn run(program: &mut Fragment) -> Result<()> {
    visit_objects(&mut program.nodes, &mut |nodes, i| {
        if let Node::Group(group) = &mut nodes[i] {
            expand_object(&mut group.children);
        }
        Ok(())
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Braces {
    Object,
    Pattern,
    Block,
}

/// Call `f` on every object literal, innermost first, as the parent
/// sequence and the literal's index in it. `f` may replace the literal
/// with any number of nodes.
///
/// Braces that are blocks, class bodies or binding patterns are skipped.
pub fn visit_objects(
    nodes: &mut Vec<Node>,
    f: &mut dyn FnMut(&mut Vec<Node>, usize) -> Result<()>,
) -> Result<()> {
    walk(nodes, Level::Program, false, f)
}

fn walk(
    nodes: &mut Vec<Node>,
    level: Level,
    in_pattern: bool,
    f: &mut dyn FnMut(&mut Vec<Node>, usize) -> Result<()>,
) -> Result<()> {
    let patterns = declared_patterns(nodes);
    let kinds: Vec<(bool, Option<Braces>)> = (0..nodes.len())
        .map(|i| match &nodes[i] {
            Node::Group(group) => match group.open.text.as_str() {
                "(" => (in_pattern || is_parameter_list(nodes, i), None),
                "[" => (in_pattern || patterns.contains(&i), None),
                _ => {
                    let kind = if in_pattern || patterns.contains(&i) {
                        Braces::Pattern
                    } else if is_expression_position(nodes, i, level) {
                        if nodes.get(i + 1).is_some_and(|n| n.is_punct("=")) {
                            Braces::Pattern
                        } else {
                            Braces::Object
                        }
                    } else {
                        Braces::Block
                    };
                    (kind == Braces::Pattern, Some(kind))
                }
            },
            Node::Token(_) => (false, None),
        })
        .collect();

    // Back to front, so replacing a literal leaves earlier indices valid.
    for i in (0..nodes.len()).rev() {
        let (child_pattern, kind) = kinds[i];
        match &mut nodes[i] {
            Node::Group(group) => {
                let child_level = Level::of(group);
                walk(&mut group.children, child_level, child_pattern, f)?;
            }
            Node::Token(token) => {
                if let TokenKind::Template(template) = &mut token.kind {
                    for expr in template.exprs.iter_mut() {
                        walk(&mut expr.nodes, Level::Embedded, false, f)?;
                    }
                }
            }
        }
        if kind == Some(Braces::Object) {
            f(nodes, i)?;
        }
    }
    Ok(())
}

/// Indices of binding patterns in `var`/`let`/`const` declarations.
fn declared_patterns(nodes: &[Node]) -> HashSet<usize> {
    let mut patterns = HashSet::new();
    for (i, node) in nodes.iter().enumerate() {
        let is_keyword = node.is_ident("var") || node.is_ident("let") || node.is_ident("const");
        if is_keyword && !(i > 0 && nodes[i - 1].is_punct(".")) {
            patterns.extend(declarations(nodes, i).declarators.iter().map(|d| d.pattern));
        }
    }
    patterns
}

fn is_expression_position(nodes: &[Node], i: usize, level: Level) -> bool {
    match i.checked_sub(1).map(|p| &nodes[p]) {
        None => matches!(level, Level::Paren | Level::Bracket | Level::Embedded),
        Some(Node::Group(_)) => false,
        Some(Node::Token(token)) => match token.kind {
            TokenKind::Punct => !matches!(token.text.as_str(), "=>" | ";"),
            TokenKind::Ident => EXPRESSION_KEYWORDS.contains(&token.text.as_str()),
            _ => false,
        },
    }
}

fn expand_object(children: &mut Vec<Node>) {
    let old = std::mem::take(children);
    let mut element = Vec::new();
    for node in old {
        if node.is_punct(",") {
            children.extend(expand_property(std::mem::take(&mut element)));
            children.push(node);
        } else {
            element.push(node);
        }
    }
    children.extend(expand_property(element));
}

enum Shape {
    Shorthand,
    Method,
    /// Method with a leading `async` or `*`.
    Modified(&'static str),
    Other,
}

fn shape(element: &[Node]) -> Shape {
    match element {
        [Node::Token(token)] if token.kind == TokenKind::Ident && !is_reserved(&token.text) => {
            Shape::Shorthand
        }
        [key, params, body] if is_method(key, params, body) => Shape::Method,
        [modifier, key, params, body] if is_method(key, params, body) => {
            if modifier.is_punct("*") {
                Shape::Modified("function*")
            } else if modifier.is_ident("async") {
                Shape::Modified("async function")
            } else {
                Shape::Other
            }
        }
        _ => Shape::Other,
    }
}

fn expand_property(mut element: Vec<Node>) -> Vec<Node> {
    match shape(&element) {
        Shape::Shorthand => {
            let name = element[0].first_token().text.clone();
            element.push(Node::Token(Token::punct(":", "")));
            element.push(Node::Token(Token::ident(&name, " ")));
            element
        }
        Shape::Method => {
            let body = element.pop();
            let params = element.pop();
            let key = element.pop();
            match (key, params, body) {
                (Some(key), Some(params), Some(body)) => {
                    method_to_property(key, "function", params, body)
                }
                _ => Vec::new(),
            }
        }
        Shape::Modified(keyword) => {
            let body = element.pop();
            let params = element.pop();
            let key = element.pop();
            let leading = element
                .first()
                .map(|modifier| modifier.leading().to_string())
                .unwrap_or_default();
            match (key, params, body) {
                (Some(mut key), Some(params), Some(body)) => {
                    key.first_token_mut().leading = leading;
                    method_to_property(key, keyword, params, body)
                }
                _ => Vec::new(),
            }
        }
        Shape::Other => element,
    }
}

fn is_method(key: &Node, params: &Node, body: &Node) -> bool {
    let is_key = match key {
        Node::Group(group) => group.open.text == "[",
        Node::Token(token) => matches!(token.kind, TokenKind::Ident | TokenKind::Str | TokenKind::Number),
    };
    is_key && params.is_group("(") && body.is_group("{")
}

/// `key: <keyword> (params) body`.
fn method_to_property(key: Node, keyword: &str, mut params: Node, body: Node) -> Vec<Node> {
    params.first_token_mut().leading = " ".to_string();
    let mut nodes = vec![key, Node::Token(Token::punct(":", ""))];
    for word in keyword.split(' ') {
        match word.strip_suffix('*') {
            Some(word) => {
                nodes.push(Node::Token(Token::ident(word, " ")));
                nodes.push(Node::Token(Token::punct("*", "")));
            }
            None => nodes.push(Node::Token(Token::ident(word, " "))),
        }
    }
    nodes.push(params);
    nodes.push(body);
    nodes
}
