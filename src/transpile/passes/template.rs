//! Template literals to string concatenation.

use crate::js::syntax::{is_reserved, visit_mut, Level};
use crate::js::{print_trimmed, Fragment, Node, Template, TokenKind};
use crate::transpile::passes::splice;
use crate::{Error, Result};

pub fn run(program: &mut Fragment) -> Result<()> {
    visit_mut(&mut program.nodes, Level::Program, &mut |nodes, _| lower_templates(nodes))
}

fn lower_templates(nodes: &mut Vec<Node>) -> Result<()> {
    let mut i = 0;
    while i < nodes.len() {
        let code = match &nodes[i] {
            Node::Token(token) => match &token.kind {
                TokenKind::Template(template) => {
                    if i > 0 && is_tag(&nodes[i - 1]) {
                        return Err(Error::Unsupported(format!(
                            "tagged templates are not supported (line {})",
                            token.line
                        )));
                    }
                    let code = concatenation(template);
                    let needs_parens = !template.exprs.is_empty()
                        && !(is_open_before(nodes, i) && is_open_after(nodes, i));
                    Some(if needs_parens {
                        format!("({})", code)
                    } else {
                        code
                    })
                }
                _ => None,
            },
            Node::Group(_) => None,
        };
        i += match code {
            Some(code) => splice(nodes, i..i + 1, &code)?,
            None => 1,
        };
    }
    Ok(())
}

/// Whether `prev` makes the following template a tagged template.
fn is_tag(prev: &Node) -> bool {
    match prev {
        Node::Group(group) => group.open.text != "{",
        Node::Token(token) => match &token.kind {
            TokenKind::Ident => !is_reserved(&token.text) || token.text == "this" || token.text == "super",
            TokenKind::Template(_) => true,
            _ => false,
        },
    }
}

/// Whether a `+` chain can sit after the previous node without parens.
fn is_open_before(nodes: &[Node], i: usize) -> bool {
    let Some(prev) = i.checked_sub(1).and_then(|p| nodes.get(p)) else {
        return true;
    };
    ["=", "+=", ",", ";", "=>", ":", "?", "+"]
        .iter()
        .any(|p| prev.is_punct(p))
        || ["return", "throw", "yield", "case"]
            .iter()
            .any(|k| prev.is_ident(k))
}

/// Whether a `+` chain can sit before the next node without parens.
fn is_open_after(nodes: &[Node], i: usize) -> bool {
    match nodes.get(i + 1) {
        None => true,
        Some(next) => {
            [",", ";", ":", "?", "+"].iter().any(|p| next.is_punct(p))
                || (next.has_newline_before() && !next.first_token().text.starts_with(['.', '[', '(']))
        }
    }
}

/// `'a' + (b) + 'c'`; the first string is always kept so the result is a
/// string even when the template starts with a substitution.
fn concatenation(template: &Template) -> String {
    let mut parts = vec![string_literal(&template.quasis[0])];
    for (i, expr) in template.exprs.iter().enumerate() {
        parts.push(format!("({})", print_trimmed(&expr.nodes)));
        if let Some(quasi) = template.quasis.get(i + 1).filter(|q| !q.is_empty()) {
            parts.push(string_literal(quasi));
        }
    }
    parts.join(" + ")
}

/// Convert raw template text into a single-quoted string literal.
///
/// Escapes other than `` \` `` and `\$` mean the same in both literal
/// kinds and are copied as written.
fn string_literal(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len() + 2);
    out.push('\'');
    let mut chars = raw.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some(escaped @ ('`' | '$')) => out.push(escaped),
                Some(escaped) => {
                    out.push('\\');
                    out.push(escaped);
                }
                None => out.push_str("\\\\"),
            },
            '\'' => out.push_str("\\'"),
            '\r' => {
                chars.next_if_eq(&'\n');
                out.push_str("\\n");
            }
            '\n' => out.push_str("\\n"),
            c => out.push(c),
        }
    }
    out.push('\'');
    out
}
