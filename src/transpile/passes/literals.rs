//! ES2015 literal forms.
//!
//! - binary and octal numbers (`0b101`, `0o17`) become decimal;
//! - `\u{...}` escapes in strings become `\uXXXX`, as a surrogate pair
//!   above the basic plane;
//! - sticky regular expressions (`/a/y`) become `new RegExp(...)` calls.
//!
//! Unicode-mode regular expressions (`/a/u`) have no rewrite.

use crate::js::syntax::{visit_mut, Level};
use crate::js::{Fragment, Node, TokenKind};
use crate::transpile::passes::{quote, splice};
use crate::{Error, Result};

pub fn run(program: &mut Fragment) -> Result<()> {
    visit_mut(&mut program.nodes, Level::Program, &mut |nodes, _| {
        let mut i = 0;
        while i < nodes.len() {
            let Node::Token(token) = &mut nodes[i] else {
                i += 1;
                continue;
            };
            match token.kind {
                TokenKind::Number => {
                    if let Some(value) = radix_value(&token.text)? {
                        token.text = value;
                    }
                }
                TokenKind::Str if token.text.contains("\\u{") => {
                    token.text = code_point_escapes(&token.text)?;
                }
                TokenKind::Regex => {
                    if let Some(code) = sticky_regex(&token.text, (token.line, token.col))? {
                        i += splice(nodes, i..i + 1, &code)?;
                        continue;
                    }
                }
                _ => {}
            }
            i += 1;
        }
        Ok(())
    })
}

/// Decimal text of a `0b`/`0o` literal; `None` for other numbers.
fn radix_value(text: &str) -> Result<Option<String>> {
    let radix = match text.get(..2).map(str::to_ascii_lowercase).as_deref() {
        Some("0b") => 2,
        Some("0o") => 8,
        _ => return Ok(None),
    };
    if text.ends_with('n') {
        return Err(Error::Unsupported(format!("BigInt literal `{}`", text)));
    }
    let digits: String = text[2..].chars().filter(|c| *c != '_').collect();
    u128::from_str_radix(&digits, radix)
        .map(|value| Some(value.to_string()))
        .map_err(|_| Error::Unsupported(format!("numeric literal `{}` is out of range", text)))
}

/// Rewrite `\u{X}` escapes in a quoted string literal.
fn code_point_escapes(text: &str) -> Result<String> {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('u') if chars.peek() == Some(&'{') => {
                chars.next();
                let hex: String = chars.by_ref().take_while(|c| *c != '}').collect();
                let code = u32::from_str_radix(&hex, 16)
                    .ok()
                    .and_then(char::from_u32)
                    .ok_or_else(|| {
                        Error::Unsupported(format!("invalid code point escape `\\u{{{}}}`", hex))
                    })?;
                let mut units = [0u16; 2];
                for unit in code.encode_utf16(&mut units) {
                    out.push_str(&format!("\\u{:04X}", unit));
                }
            }
            Some(next) => {
                out.push('\\');
                out.push(next);
            }
            None => out.push('\\'),
        }
    }
    Ok(out)
}

/// `new RegExp(...)` for a literal with the `y` flag.
fn sticky_regex(text: &str, (line, col): (usize, usize)) -> Result<Option<String>> {
    let Some(slash) = text.rfind('/') else {
        return Ok(None);
    };
    let (pattern, flags) = (&text[1..slash], &text[slash + 1..]);
    if flags.contains('u') {
        return Err(Error::Unsupported(format!(
            "unicode regular expression at {}:{}",
            line, col
        )));
    }
    if !flags.contains('y') {
        return Ok(None);
    }
    Ok(Some(format!("new RegExp({}, {})", quote(pattern), quote(flags))))
}
