//! Final check for output that targets ES5.
//!
//! With every `es2015` pass selected, anything newer that survived the
//! passes would reach the output unchanged. These constructs have no
//! lowering and fail the file instead.

use crate::js::syntax::{visit, Level};
use crate::js::{Fragment, Node, TokenKind};
use crate::{Error, Result};

pub fn es5_residue(program: &Fragment) -> Result<()> {
    let mut found: Option<String> = None;
    visit(&program.nodes, Level::Program, &mut |nodes, level| {
        if found.is_none() {
            found = residue_in(nodes, level);
        }
    });
    match found {
        Some(message) => Err(Error::Unsupported(message)),
        None => Ok(()),
    }
}

fn residue_in(nodes: &[Node], level: Level) -> Option<String> {
    for (i, node) in nodes.iter().enumerate() {
        let Node::Token(token) = node else {
            continue;
        };
        let prev = i.checked_sub(1).map(|p| &nodes[p]);
        let is_member = prev.is_some_and(|p| p.is_punct(".") || p.is_punct("?."));
        let at = || format!("{}:{}", token.line, token.col);
        match &token.kind {
            TokenKind::Ident if is_member || nodes.get(i + 1).is_some_and(|n| n.is_punct(":")) => {}
            TokenKind::Ident => match token.text.as_str() {
                "function" if nodes.get(i + 1).is_some_and(|n| n.is_punct("*")) => {
                    return Some(format!("generator function at {} has no ES5 form", at()));
                }
                "yield" => return Some(format!("`yield` at {} has no ES5 form", at())),
                "class" => return Some(format!("class at {} was not lowered", at())),
                "new" if nodes.get(i + 1).is_some_and(|n| n.is_punct(".")) => {
                    return Some(format!("`new.target` at {} has no ES5 form", at()));
                }
                _ => {}
            },
            TokenKind::Punct => match token.text.as_str() {
                "=>" => return Some(format!("arrow function at {} was not lowered", at())),
                "..." if level == Level::Brace => {
                    return Some(format!("object spread at {} has no ES5 form", at()));
                }
                "..." => return Some(format!("spread at {} was not lowered", at())),
                "*" if level == Level::Brace
                    && prev.map_or(true, |p| p.is_punct(","))
                    && nodes.get(i + 2).is_some_and(|n| n.is_group("(")) =>
                {
                    return Some(format!("generator method at {} has no ES5 form", at()));
                }
                _ => {}
            },
            TokenKind::Regex => {
                let flags = token.text.rsplit('/').next().unwrap_or_default();
                if let Some(flag) = flags.chars().find(|c| matches!(c, 'u' | 'y' | 's')) {
                    return Some(format!(
                        "regular expression flag `{}` at {} has no ES5 form",
                        flag,
                        at()
                    ));
                }
            }
            TokenKind::Template(_) => {
                return Some(format!("template literal at {} was not lowered", at()));
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::js::parse;

    fn check(source: &str) -> Result<()> {
        es5_residue(&parse(source).unwrap())
    }

    #[test]
    fn test_es5_passes() {
        assert!(check("var o = { a: function () { return this.b; } };\nvar r = /a+/gi;").is_ok());
        assert!(check("x.class = y.yield; z.new.a; f({ class: 1 });").is_ok());
    }

    #[test]
    fn test_newer_constructs_fail() {
        for source in [
            "function* g() {}",
            "var o = { *g() {} };",
            "function f() { return new.target; }",
            "var r = /a/u;",
            "var r = /a/y;",
            "var o = { ...rest };",
            "var f = () => 1;",
        ] {
            let err = check(source).unwrap_err();
            assert!(matches!(err, Error::Unsupported(_)), "{}", source);
        }
    }

    #[test]
    fn test_message_names_the_position() {
        let err = check("var a;\nvar r = /x/u;").unwrap_err();
        assert_eq!(
            err.to_string(),
            Error::Unsupported("regular expression flag `u` at 2:9 has no ES5 form".to_string())
                .to_string()
        );
    }
}
