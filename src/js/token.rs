//! Token and tree types for JavaScript sources.
//!
//! Every token keeps the whitespace and comments that precede it
//! (`leading`), so an untouched tree prints back to the exact input.

/// Lexical category of a token.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// Identifiers and keywords alike; keywords are told apart by text.
    Ident,
    Number,
    /// String literal, `text` includes the quotes.
    Str,
    /// Regular expression literal including slashes and flags.
    Regex,
    Punct,
    Template(Box<Template>),
    Jsx(Box<JsxElement>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// Source text of the token. For templates this is the original text
    /// and may be stale after a pass rewrote a substitution; the printer
    /// rebuilds templates from their parts.
    pub text: String,
    /// Whitespace and comments before the token.
    pub leading: String,
    /// 1-based position; zero for synthesized tokens.
    pub line: usize,
    pub col: usize,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, leading: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
            leading: leading.into(),
            line: 0,
            col: 0,
        }
    }

    pub fn ident(text: &str, leading: &str) -> Self {
        Self::new(TokenKind::Ident, text, leading)
    }

    pub fn punct(text: &str, leading: &str) -> Self {
        Self::new(TokenKind::Punct, text, leading)
    }

    pub fn is_punct(&self, text: &str) -> bool {
        self.kind == TokenKind::Punct && self.text == text
    }

    pub fn is_ident(&self, text: &str) -> bool {
        self.kind == TokenKind::Ident && self.text == text
    }

    /// Whether a line break precedes this token.
    pub fn has_newline_before(&self) -> bool {
        self.leading.contains('\n')
    }
}

/// A template literal: `quasis.len() == exprs.len() + 1`.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    /// Raw text between substitutions, escapes untouched.
    pub quasis: Vec<String>,
    pub exprs: Vec<Fragment>,
}

/// A JSX element or fragment, parsed out of a single token.
#[derive(Debug, Clone, PartialEq)]
pub struct JsxElement {
    /// Tag name (`div`, `App`, `a.b`); `None` for `<>...</>`.
    pub name: Option<String>,
    pub attrs: Vec<JsxAttr>,
    pub children: Vec<JsxChild>,
    pub line: usize,
    pub col: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum JsxAttr {
    Named {
        name: String,
        value: Option<JsxAttrValue>,
    },
    /// `{...expr}`; the fragment excludes the dots.
    Spread(Fragment),
}

#[derive(Debug, Clone, PartialEq)]
pub enum JsxAttrValue {
    /// Quoted value without its quotes; JSX strings have no escapes.
    Str(String),
    Expr(Fragment),
    Element(Box<JsxElement>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum JsxChild {
    Text(String),
    /// `{expr}`; may be empty (or comment-only).
    Expr(Fragment),
    Element(JsxElement),
}

/// A node of the bracket tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Token(Token),
    Group(Group),
}

impl Node {
    pub fn token(&self) -> Option<&Token> {
        match self {
            Node::Token(token) => Some(token),
            Node::Group(_) => None,
        }
    }

    pub fn group(&self) -> Option<&Group> {
        match self {
            Node::Group(group) => Some(group),
            Node::Token(_) => None,
        }
    }

    pub fn is_punct(&self, text: &str) -> bool {
        self.token().is_some_and(|t| t.is_punct(text))
    }

    pub fn is_ident(&self, text: &str) -> bool {
        self.token().is_some_and(|t| t.is_ident(text))
    }

    /// Text of an identifier token.
    pub fn ident(&self) -> Option<&str> {
        match self {
            Node::Token(token) if token.kind == TokenKind::Ident => Some(&token.text),
            _ => None,
        }
    }

    /// Whether this is a group opened by `open` (`(`, `[` or `{`).
    pub fn is_group(&self, open: &str) -> bool {
        self.group().is_some_and(|g| g.open.text == open)
    }

    /// The first token of the node, which carries its leading trivia.
    pub fn first_token(&self) -> &Token {
        match self {
            Node::Token(token) => token,
            Node::Group(group) => &group.open,
        }
    }

    pub fn first_token_mut(&mut self) -> &mut Token {
        match self {
            Node::Token(token) => token,
            Node::Group(group) => &mut group.open,
        }
    }

    pub fn leading(&self) -> &str {
        &self.first_token().leading
    }

    pub fn has_newline_before(&self) -> bool {
        self.first_token().has_newline_before()
    }

    pub fn position(&self) -> (usize, usize) {
        let token = self.first_token();
        (token.line, token.col)
    }
}

/// A bracketed group; `close.leading` holds the trivia before the closer.
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    pub open: Token,
    pub children: Vec<Node>,
    pub close: Token,
}

impl Group {
    pub fn new(open: &str, children: Vec<Node>, close: &str) -> Self {
        Self {
            open: Token::punct(open, ""),
            children,
            close: Token::punct(close, ""),
        }
    }
}

/// A sequence of nodes plus the trivia that trails the last one.
///
/// Whole programs, template substitutions and JSX expression containers
/// are all fragments.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Fragment {
    pub nodes: Vec<Node>,
    pub trailing: String,
}

impl Fragment {
    pub fn new(nodes: Vec<Node>) -> Self {
        Self {
            nodes,
            trailing: String::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
