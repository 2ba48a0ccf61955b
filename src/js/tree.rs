//! Bracket tree construction.

use crate::error::{Error, Result};
use crate::js::token::{Group, Node, Token, TokenKind};

fn closer_for(open: &str) -> &'static str {
    match open {
        "(" => ")",
        "[" => "]",
        _ => "}",
    }
}

/// Nest a flat token list into groups at `()`, `[]` and `{}`.
///
/// # Errors
/// Returns a parse error for a closer without an opener, a mismatched
/// closer, or an opener that is never closed.
pub fn build(tokens: Vec<Token>) -> Result<Vec<Node>> {
    let mut stack: Vec<(Token, Vec<Node>)> = Vec::new();
    let mut current: Vec<Node> = Vec::new();

    for token in tokens {
        if token.kind != TokenKind::Punct {
            current.push(Node::Token(token));
            continue;
        }

        match token.text.as_str() {
            "(" | "[" | "{" => {
                stack.push((token, std::mem::take(&mut current)));
            }
            ")" | "]" | "}" => {
                let Some((open, parent)) = stack.pop() else {
                    return Err(Error::parse(
                        token.line,
                        token.col,
                        format!("Unexpected token `{}`", token.text),
                    ));
                };
                let expected = closer_for(&open.text);
                if token.text != expected {
                    return Err(Error::parse(
                        token.line,
                        token.col,
                        format!("Unexpected token `{}`, expected `{}`", token.text, expected),
                    ));
                }
                let children = std::mem::replace(&mut current, parent);
                current.push(Node::Group(Group {
                    open,
                    children,
                    close: token,
                }));
            }
            _ => current.push(Node::Token(token)),
        }
    }

    if let Some((open, _)) = stack.pop() {
        return Err(Error::parse(
            open.line,
            open.col,
            format!("Unclosed `{}`", open.text),
        ));
    }

    Ok(current)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn punct(text: &str, line: usize, col: usize) -> Token {
        Token {
            line,
            col,
            ..Token::punct(text, "")
        }
    }

    #[test]
    fn test_build_nested_groups() {
        let tokens = vec![
            punct("(", 1, 1),
            punct("[", 1, 2),
            punct("]", 1, 3),
            Token::ident("a", ""),
            punct(")", 1, 5),
        ];
        let nodes = build(tokens).unwrap();
        assert_eq!(nodes.len(), 1);
        let outer = nodes[0].group().unwrap();
        assert_eq!(outer.children.len(), 2);
        assert!(outer.children[0].is_group("["));
        assert_eq!(outer.close.text, ")");
    }

    #[test]
    fn test_build_unexpected_closer() {
        let err = build(vec![punct(")", 3, 7)]).unwrap_err();
        assert!(matches!(err, Error::Parse { line: 3, col: 7, .. }));
        assert!(err.to_string().contains("Unexpected token `)`"));
    }

    #[test]
    fn test_build_mismatched_closer() {
        let err = build(vec![punct("(", 1, 1), punct("]", 1, 2)]).unwrap_err();
        assert!(err.to_string().contains("expected `)`"));
    }

    #[test]
    fn test_build_unclosed() {
        let err = build(vec![punct("{", 2, 4)]).unwrap_err();
        assert!(matches!(err, Error::Parse { line: 2, col: 4, .. }));
        assert!(err.to_string().contains("Unclosed `{`"));
    }
}
