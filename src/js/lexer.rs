//! Lexer for ES2015+ sources with JSX.
//!
//! The lexer decides between division and regular expressions (and between
//! `<` and a JSX tag) from the previous significant token. Template
//! substitutions and JSX expression containers are lexed recursively into
//! their own fragments, so a whole template or JSX element is one token.

use crate::error::{Error, Result};
use crate::js::token::{
    Fragment, JsxAttr, JsxAttrValue, JsxChild, JsxElement, Template, Token, TokenKind,
};
use crate::js::tree;

const PUNCTUATORS: &[&str] = &[
    ">>>=", "...", "===", "!==", "**=", "<<=", ">>=", ">>>", "&&=", "||=", "??=", "=>", "==",
    "!=", "<=", ">=", "&&", "||", "??", "?.", "++", "--", "+=", "-=", "*=", "/=", "%=", "&=",
    "|=", "^=", "**", "<<", ">>", "{", "}", "(", ")", "[", "]", ";", ",", "<", ">", "+", "-",
    "*", "/", "%", "&", "|", "^", "!", "~", "?", ":", "=", ".", "@", "#",
];

/// Keywords after which an expression (and so a regex or JSX) may start.
const EXPRESSION_KEYWORDS: &[&str] = &[
    "return",
    "typeof",
    "instanceof",
    "in",
    "of",
    "new",
    "delete",
    "void",
    "throw",
    "case",
    "do",
    "else",
    "yield",
    "await",
    "extends",
];

pub struct Lexer {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    col: usize,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            pos: 0,
            line: 1,
            col: 1,
        }
    }

    /// Lex the whole input and build its bracket tree.
    pub fn tokenize(mut self) -> Result<Fragment> {
        let (tokens, trailing) = self.lex_tokens(false)?;
        Ok(Fragment {
            nodes: tree::build(tokens)?,
            trailing,
        })
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(c)
    }

    fn slice(&self, start: usize, end: usize) -> String {
        self.chars[start..end].iter().collect()
    }

    fn error(&self, message: impl Into<String>) -> Error {
        Error::parse(self.line, self.col, message)
    }

    fn expect(&mut self, expected: char) -> Result<()> {
        match self.peek() {
            Some(c) if c == expected => {
                self.bump();
                Ok(())
            }
            Some(c) => Err(self.error(format!("Unexpected character `{}`, expected `{}`", c, expected))),
            None => Err(self.error(format!("Unexpected end of input, expected `{}`", expected))),
        }
    }

    /// Lex tokens until end of input, or until the `}` that closes an
    /// embedded expression when `in_braces` is set.
    fn lex_tokens(&mut self, in_braces: bool) -> Result<(Vec<Token>, String)> {
        let mut tokens: Vec<Token> = Vec::new();
        let mut depth = 0usize;

        loop {
            let leading = self.skip_trivia()?;
            let Some(c) = self.peek() else {
                if in_braces {
                    return Err(self.error("Unterminated expression, expected `}`"));
                }
                return Ok((tokens, leading));
            };

            if in_braces && c == '}' && depth == 0 {
                self.bump();
                return Ok((tokens, leading));
            }

            let (line, col) = (self.line, self.col);
            let expression_allowed = expression_allowed(tokens.last());
            let (kind, text) = self.lex_token(c, expression_allowed)?;

            if kind == TokenKind::Punct {
                match text.as_str() {
                    "{" => depth += 1,
                    "}" => depth = depth.saturating_sub(1),
                    _ => {}
                }
            }

            tokens.push(Token {
                kind,
                text,
                leading,
                line,
                col,
            });
        }
    }

    /// Lex an embedded expression after its opening `{` (or `${`).
    fn lex_embedded(&mut self) -> Result<Fragment> {
        let (tokens, trailing) = self.lex_tokens(true)?;
        Ok(Fragment {
            nodes: tree::build(tokens)?,
            trailing,
        })
    }

    fn skip_trivia(&mut self) -> Result<String> {
        let start = self.pos;
        loop {
            match (self.peek(), self.peek_at(1)) {
                (Some(c), _) if c.is_whitespace() || c == '\u{feff}' => {
                    self.bump();
                }
                (Some('/'), Some('/')) => {
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.bump();
                    }
                }
                (Some('/'), Some('*')) => {
                    let (line, col) = (self.line, self.col);
                    self.bump();
                    self.bump();
                    loop {
                        match (self.peek(), self.peek_at(1)) {
                            (Some('*'), Some('/')) => {
                                self.bump();
                                self.bump();
                                break;
                            }
                            (Some(_), _) => {
                                self.bump();
                            }
                            (None, _) => {
                                return Err(Error::parse(line, col, "Unterminated comment"));
                            }
                        }
                    }
                }
                _ => break,
            }
        }
        Ok(self.slice(start, self.pos))
    }

    fn lex_token(&mut self, c: char, expression_allowed: bool) -> Result<(TokenKind, String)> {
        let start = self.pos;

        if is_ident_start(c) {
            while self.peek().is_some_and(is_ident_continue) {
                self.bump();
            }
            return Ok((TokenKind::Ident, self.slice(start, self.pos)));
        }

        if c.is_ascii_digit() || (c == '.' && self.peek_at(1).is_some_and(|d| d.is_ascii_digit())) {
            self.lex_number()?;
            return Ok((TokenKind::Number, self.slice(start, self.pos)));
        }

        match c {
            '"' | '\'' => {
                self.lex_string(c)?;
                Ok((TokenKind::Str, self.slice(start, self.pos)))
            }
            '`' => {
                let template = self.lex_template()?;
                Ok((
                    TokenKind::Template(Box::new(template)),
                    self.slice(start, self.pos),
                ))
            }
            '/' if expression_allowed => {
                self.lex_regex()?;
                Ok((TokenKind::Regex, self.slice(start, self.pos)))
            }
            '<' if expression_allowed
                && self
                    .peek_at(1)
                    .is_some_and(|n| n == '>' || is_ident_start(n)) =>
            {
                let element = self.jsx_element()?;
                Ok((TokenKind::Jsx(Box::new(element)), self.slice(start, self.pos)))
            }
            _ => {
                let punct = self.match_punct().ok_or_else(|| {
                    self.error(format!("Unexpected character `{}`", c))
                })?;
                for _ in 0..punct.chars().count() {
                    self.bump();
                }
                Ok((TokenKind::Punct, punct.to_string()))
            }
        }
    }

    fn match_punct(&self) -> Option<&'static str> {
        PUNCTUATORS.iter().copied().find(|p| {
            let matches = p
                .chars()
                .enumerate()
                .all(|(i, pc)| self.peek_at(i) == Some(pc));
            // `a?.5:b` is a conditional, not optional chaining.
            matches && !(*p == "?." && self.peek_at(2).is_some_and(|d| d.is_ascii_digit()))
        })
    }

    fn lex_number(&mut self) -> Result<()> {
        let radix_prefix = self.peek() == Some('0')
            && self
                .peek_at(1)
                .is_some_and(|p| matches!(p, 'x' | 'X' | 'o' | 'O' | 'b' | 'B'));

        if radix_prefix {
            self.bump();
            self.bump();
            while self.peek().is_some_and(|c| c.is_ascii_alphanumeric() || c == '_') {
                self.bump();
            }
        } else {
            while self.peek().is_some_and(|c| c.is_ascii_digit() || c == '_') {
                self.bump();
            }
            if self.peek() == Some('.') {
                self.bump();
                while self.peek().is_some_and(|c| c.is_ascii_digit() || c == '_') {
                    self.bump();
                }
            }
            if matches!(self.peek(), Some('e' | 'E')) {
                let sign = matches!(self.peek_at(1), Some('+' | '-'));
                let digit_at = if sign { 2 } else { 1 };
                if self.peek_at(digit_at).is_some_and(|d| d.is_ascii_digit()) {
                    for _ in 0..=digit_at {
                        self.bump();
                    }
                    while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                        self.bump();
                    }
                }
            }
            if self.peek() == Some('n') {
                self.bump();
            }
        }

        if self.peek().is_some_and(is_ident_start) {
            return Err(self.error("Identifier directly after number"));
        }
        Ok(())
    }

    fn lex_string(&mut self, quote: char) -> Result<()> {
        let (line, col) = (self.line, self.col);
        self.bump();
        loop {
            match self.bump() {
                Some('\\') => {
                    if self.bump().is_none() {
                        return Err(Error::parse(line, col, "Unterminated string constant"));
                    }
                }
                Some(c) if c == quote => return Ok(()),
                Some('\n') | None => {
                    return Err(Error::parse(line, col, "Unterminated string constant"));
                }
                Some(_) => {}
            }
        }
    }

    fn lex_template(&mut self) -> Result<Template> {
        let (line, col) = (self.line, self.col);
        self.bump();

        let mut quasis = Vec::new();
        let mut exprs = Vec::new();
        let mut quasi_start = self.pos;

        loop {
            match self.peek() {
                None => return Err(Error::parse(line, col, "Unterminated template")),
                Some('\\') => {
                    self.bump();
                    if self.bump().is_none() {
                        return Err(Error::parse(line, col, "Unterminated template"));
                    }
                }
                Some('`') => {
                    quasis.push(self.slice(quasi_start, self.pos));
                    self.bump();
                    return Ok(Template { quasis, exprs });
                }
                Some('$') if self.peek_at(1) == Some('{') => {
                    quasis.push(self.slice(quasi_start, self.pos));
                    self.bump();
                    self.bump();
                    exprs.push(self.lex_embedded()?);
                    quasi_start = self.pos;
                }
                Some(_) => {
                    self.bump();
                }
            }
        }
    }

    fn lex_regex(&mut self) -> Result<()> {
        let (line, col) = (self.line, self.col);
        self.bump();
        let mut in_class = false;
        loop {
            match self.bump() {
                None | Some('\n') => {
                    return Err(Error::parse(line, col, "Unterminated regular expression"));
                }
                Some('\\') => {
                    if matches!(self.bump(), None | Some('\n')) {
                        return Err(Error::parse(line, col, "Unterminated regular expression"));
                    }
                }
                Some('[') => in_class = true,
                Some(']') => in_class = false,
                Some('/') if !in_class => break,
                Some(_) => {}
            }
        }
        while self.peek().is_some_and(is_ident_continue) {
            self.bump();
        }
        Ok(())
    }

    // ========== JSX ==========

    fn jsx_element(&mut self) -> Result<JsxElement> {
        let (line, col) = (self.line, self.col);
        self.expect('<')?;
        self.skip_trivia()?;

        let name = if self.peek() == Some('>') {
            None
        } else {
            Some(self.jsx_name()?)
        };

        let mut element = JsxElement {
            name,
            attrs: Vec::new(),
            children: Vec::new(),
            line,
            col,
        };

        loop {
            self.skip_trivia()?;
            match self.peek() {
                Some('/') => {
                    self.bump();
                    self.skip_trivia()?;
                    self.expect('>')?;
                    if element.name.is_none() {
                        return Err(Error::parse(line, col, "JSX fragments cannot be self-closing"));
                    }
                    return Ok(element);
                }
                Some('>') => {
                    self.bump();
                    break;
                }
                Some('{') => {
                    self.bump();
                    self.skip_trivia()?;
                    for _ in 0..3 {
                        self.expect('.')?;
                    }
                    element.attrs.push(JsxAttr::Spread(self.lex_embedded()?));
                }
                Some(c) if is_ident_start(c) => {
                    let name = self.jsx_name()?;
                    self.skip_trivia()?;
                    let value = if self.peek() == Some('=') {
                        self.bump();
                        self.skip_trivia()?;
                        Some(self.jsx_attr_value()?)
                    } else {
                        None
                    };
                    element.attrs.push(JsxAttr::Named { name, value });
                }
                Some(c) => {
                    return Err(self.error(format!("Unexpected character `{}` in JSX tag", c)));
                }
                None => return Err(Error::parse(line, col, "Unterminated JSX tag")),
            }
        }

        let mut text_start = self.pos;
        loop {
            match self.peek() {
                None => {
                    return Err(Error::parse(
                        line,
                        col,
                        format!(
                            "Expected corresponding JSX closing tag for <{}>",
                            element.name.as_deref().unwrap_or("")
                        ),
                    ));
                }
                Some('{') => {
                    self.flush_jsx_text(text_start, &mut element.children);
                    self.bump();
                    element.children.push(JsxChild::Expr(self.lex_embedded()?));
                    text_start = self.pos;
                }
                Some('<') => {
                    self.flush_jsx_text(text_start, &mut element.children);
                    if self.closing_tag_ahead() {
                        self.jsx_closing_tag(&element)?;
                        return Ok(element);
                    }
                    element.children.push(JsxChild::Element(self.jsx_element()?));
                    text_start = self.pos;
                }
                Some(_) => {
                    self.bump();
                }
            }
        }
    }

    fn flush_jsx_text(&self, start: usize, children: &mut Vec<JsxChild>) {
        if self.pos > start {
            children.push(JsxChild::Text(self.slice(start, self.pos)));
        }
    }

    fn closing_tag_ahead(&self) -> bool {
        let mut offset = 1;
        while self.peek_at(offset).is_some_and(char::is_whitespace) {
            offset += 1;
        }
        self.peek_at(offset) == Some('/')
    }

    fn jsx_closing_tag(&mut self, element: &JsxElement) -> Result<()> {
        let (line, col) = (self.line, self.col);
        self.expect('<')?;
        self.skip_trivia()?;
        self.expect('/')?;
        self.skip_trivia()?;
        let name = if self.peek() == Some('>') {
            None
        } else {
            Some(self.jsx_name()?)
        };
        self.skip_trivia()?;
        self.expect('>')?;

        if name != element.name {
            return Err(Error::parse(
                line,
                col,
                format!(
                    "Expected corresponding JSX closing tag for <{}>",
                    element.name.as_deref().unwrap_or("")
                ),
            ));
        }
        Ok(())
    }

    fn jsx_name(&mut self) -> Result<String> {
        let start = self.pos;
        match self.peek() {
            Some(c) if is_ident_start(c) => {}
            Some(c) => return Err(self.error(format!("Unexpected character `{}` in JSX name", c))),
            None => return Err(self.error("Unexpected end of input in JSX name")),
        }
        while self
            .peek()
            .is_some_and(|c| is_ident_continue(c) || matches!(c, '-' | '.' | ':'))
        {
            self.bump();
        }
        Ok(self.slice(start, self.pos))
    }

    fn jsx_attr_value(&mut self) -> Result<JsxAttrValue> {
        match self.peek() {
            Some(quote @ ('"' | '\'')) => {
                let (line, col) = (self.line, self.col);
                self.bump();
                let start = self.pos;
                loop {
                    match self.peek() {
                        Some(c) if c == quote => break,
                        Some(_) => {
                            self.bump();
                        }
                        None => {
                            return Err(Error::parse(line, col, "Unterminated JSX attribute string"))
                        }
                    }
                }
                let value = self.slice(start, self.pos);
                self.bump();
                Ok(JsxAttrValue::Str(value))
            }
            Some('{') => {
                self.bump();
                Ok(JsxAttrValue::Expr(self.lex_embedded()?))
            }
            Some('<') => Ok(JsxAttrValue::Element(Box::new(self.jsx_element()?))),
            Some(c) => Err(self.error(format!("Unexpected character `{}` in JSX attribute value", c))),
            None => Err(self.error("Unexpected end of input in JSX attribute")),
        }
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$'
}

fn is_ident_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$' || c == '\u{200c}' || c == '\u{200d}'
}

/// Whether an expression may start after `prev`, which decides regex vs
/// division and JSX vs less-than.
fn expression_allowed(prev: Option<&Token>) -> bool {
    let Some(prev) = prev else {
        return true;
    };
    match prev.kind {
        TokenKind::Punct => !matches!(prev.text.as_str(), ")" | "]" | "}" | "++" | "--"),
        TokenKind::Ident => EXPRESSION_KEYWORDS.contains(&prev.text.as_str()),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::js::token::Node;

    fn lex(source: &str) -> Vec<Token> {
        let mut lexer = Lexer::new(source);
        lexer.lex_tokens(false).unwrap().0
    }

    fn kinds_and_text(source: &str) -> Vec<String> {
        lex(source)
            .into_iter()
            .map(|t| {
                let kind = match t.kind {
                    TokenKind::Ident => "id",
                    TokenKind::Number => "num",
                    TokenKind::Str => "str",
                    TokenKind::Regex => "re",
                    TokenKind::Punct => "p",
                    TokenKind::Template(_) => "tpl",
                    TokenKind::Jsx(_) => "jsx",
                };
                format!("{}:{}", kind, t.text)
            })
            .collect()
    }

    fn lex_err(source: &str) -> String {
        Lexer::new(source).tokenize().unwrap_err().to_string()
    }

    #[test]
    fn test_lex_basic_statement() {
        assert_eq!(
            kinds_and_text("const a = 1.5e3;"),
            vec!["id:const", "id:a", "p:=", "num:1.5e3", "p:;"]
        );
    }

    #[test]
    fn test_lex_longest_punctuator() {
        assert_eq!(
            kinds_and_text("a >>>= b === c => ...d"),
            vec!["id:a", "p:>>>=", "id:b", "p:===", "id:c", "p:=>", "p:...", "id:d"]
        );
    }

    #[test]
    fn test_lex_trivia_is_kept() {
        let tokens = lex("a /* c */ b // tail\nc");
        assert_eq!(tokens[1].leading, " /* c */ ");
        assert_eq!(tokens[2].leading, " // tail\n");
        assert_eq!((tokens[2].line, tokens[2].col), (2, 1));
    }

    #[test]
    fn test_lex_regex_vs_division() {
        assert_eq!(
            kinds_and_text("x = a / b / c"),
            vec!["id:x", "p:=", "id:a", "p:/", "id:b", "p:/", "id:c"]
        );
        assert_eq!(
            kinds_and_text("x = /[/]a\\//g.test(y)"),
            vec!["id:x", "p:=", "re:/[/]a\\//g", "p:.", "id:test", "p:(", "id:y", "p:)"]
        );
        assert_eq!(kinds_and_text("return /a/"), vec!["id:return", "re:/a/"]);
    }

    #[test]
    fn test_lex_strings_with_escapes() {
        assert_eq!(
            kinds_and_text(r#"'it\'s' "say \"hi\"""#),
            vec![r"str:'it\'s'", r#"str:"say \"hi\"""#]
        );
    }

    #[test]
    fn test_lex_numbers() {
        assert_eq!(
            kinds_and_text("0xff 1_000 .5 10n 2e-3"),
            vec!["num:0xff", "num:1_000", "num:.5", "num:10n", "num:2e-3"]
        );
    }

    #[test]
    fn test_lex_optional_chaining_vs_conditional() {
        assert_eq!(kinds_and_text("a?.b"), vec!["id:a", "p:?.", "id:b"]);
        assert_eq!(
            kinds_and_text("a?.5:1"),
            vec!["id:a", "p:?", "num:.5", "p::", "num:1"]
        );
    }

    #[test]
    fn test_lex_template_with_substitutions() {
        let tokens = lex("`a${b + `c${d}`}e`");
        assert_eq!(tokens.len(), 1);
        let TokenKind::Template(template) = &tokens[0].kind else {
            panic!("expected template");
        };
        assert_eq!(template.quasis, vec!["a", "e"]);
        assert_eq!(template.exprs.len(), 1);
        assert_eq!(template.exprs[0].nodes.len(), 3);
    }

    #[test]
    fn test_lex_template_with_object_in_substitution() {
        let tokens = lex("`${ {a: 1}.a }`");
        let TokenKind::Template(template) = &tokens[0].kind else {
            panic!("expected template");
        };
        assert!(template.exprs[0].nodes[0].is_group("{"));
        assert_eq!(template.exprs[0].trailing, " ");
    }

    #[test]
    fn test_lex_jsx_element() {
        let tokens = lex("const el = <div className=\"x\" {...rest}>Hi {name}<br /></div>;");
        assert_eq!(tokens.len(), 5);
        let TokenKind::Jsx(element) = &tokens[3].kind else {
            panic!("expected jsx");
        };
        assert_eq!(element.name.as_deref(), Some("div"));
        assert_eq!(element.attrs.len(), 2);
        assert_eq!(element.children.len(), 3);
        assert!(matches!(element.children[0], JsxChild::Text(ref t) if t == "Hi "));
        assert!(matches!(element.children[2], JsxChild::Element(ref e) if e.name.as_deref() == Some("br")));
        assert_eq!(tokens[4].text, ";");
    }

    #[test]
    fn test_lex_jsx_fragment_and_member_names() {
        let tokens = lex("<><Foo.Bar x={1} /></>");
        let TokenKind::Jsx(element) = &tokens[0].kind else {
            panic!("expected jsx");
        };
        assert!(element.name.is_none());
        let JsxChild::Element(child) = &element.children[0] else {
            panic!("expected child element");
        };
        assert_eq!(child.name.as_deref(), Some("Foo.Bar"));
    }

    #[test]
    fn test_less_than_is_not_jsx_after_identifier() {
        assert_eq!(
            kinds_and_text("a <b"),
            vec!["id:a", "p:<", "id:b"]
        );
    }

    #[test]
    fn test_tokenize_builds_groups() {
        let fragment = Lexer::new("f(a, [b], {c})").tokenize().unwrap();
        assert_eq!(fragment.nodes.len(), 2);
        let Node::Group(args) = &fragment.nodes[1] else {
            panic!("expected group");
        };
        assert_eq!(args.children.len(), 5);
    }

    #[test]
    fn test_lex_errors() {
        assert!(lex_err("'abc").contains("Unterminated string"));
        assert!(lex_err("/* never closed").contains("Unterminated comment"));
        assert!(lex_err("`abc").contains("Unterminated template"));
        assert!(lex_err("x = /abc").contains("Unterminated regular expression"));
        assert!(lex_err("<div>hi</span>").contains("closing tag"));
        assert!(lex_err("a ¤ b").contains("Unexpected character"));
        assert!(lex_err("3in").contains("after number"));
    }

    #[test]
    fn test_lex_error_position() {
        let err = Lexer::new("a\n  'open").tokenize().unwrap_err();
        assert!(matches!(err, Error::Parse { line: 2, col: 3, .. }));
    }
}
