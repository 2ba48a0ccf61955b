//! Lint rules.
//!
//! Rules see the parsed program and the raw source; they never modify
//! either.

use std::collections::HashSet;

use crate::js::syntax::{visit, Level};
use crate::js::{Fragment, Node, Token, TokenKind};
use crate::lint::scope;

/// What a rule sees of one file.
pub struct LintContext<'a> {
    pub source: &'a str,
    pub program: &'a Fragment,
    pub globals: &'a HashSet<String>,
}

/// A rule finding, positioned 1-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    pub line: usize,
    pub col: usize,
    pub message: String,
}

impl Finding {
    fn new(line: usize, col: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            col,
            message: message.into(),
        }
    }
}

pub trait Rule: Send + Sync {
    fn name(&self) -> &'static str;
    fn check(&self, ctx: &LintContext<'_>) -> Vec<Finding>;
}

/// Every rule, in reporting order.
pub fn all() -> Vec<Box<dyn Rule>> {
    vec![
        Box::new(NoUndef),
        Box::new(ReactInJsxScope),
        Box::new(Eqeqeq),
        Box::new(NoVar),
        Box::new(NoDebugger),
        Box::new(Quotes),
        Box::new(NoTrailingSpaces),
        Box::new(EolLast),
    ]
}

/// Call `f` with every token in the program, each exactly once.
fn each_token(program: &Fragment, f: &mut dyn FnMut(&[Node], usize, &Token)) {
    visit(&program.nodes, Level::Program, &mut |nodes, _| {
        for (i, node) in nodes.iter().enumerate() {
            if let Node::Token(token) = node {
                f(nodes, i, token);
            }
        }
    });
}

fn is_member_name(nodes: &[Node], i: usize) -> bool {
    i > 0 && (nodes[i - 1].is_punct(".") || nodes[i - 1].is_punct("?."))
}

// ========== Scope ==========

pub struct NoUndef;

impl Rule for NoUndef {
    fn name(&self) -> &'static str {
        "no-undef"
    }

    fn check(&self, ctx: &LintContext<'_>) -> Vec<Finding> {
        scope::unresolved(ctx.program)
            .into_iter()
            .filter(|r| !ctx.globals.contains(&r.name))
            .map(|r| Finding::new(r.line, r.col, format!("'{}' is not defined.", r.name)))
            .collect()
    }
}

/// JSX compiles to `React.createElement`, so `React` must resolve.
pub struct ReactInJsxScope;

impl Rule for ReactInJsxScope {
    fn name(&self) -> &'static str {
        "react-in-jsx-scope"
    }

    fn check(&self, ctx: &LintContext<'_>) -> Vec<Finding> {
        let Some((line, col)) = scope::first_jsx(ctx.program) else {
            return Vec::new();
        };
        if ctx.globals.contains("React") || scope::program_names(ctx.program).contains("React") {
            return Vec::new();
        }
        vec![Finding::new(line, col, "'React' must be in scope when using JSX")]
    }
}

// ========== Tokens ==========

pub struct Eqeqeq;

impl Rule for Eqeqeq {
    fn name(&self) -> &'static str {
        "eqeqeq"
    }

    fn check(&self, ctx: &LintContext<'_>) -> Vec<Finding> {
        let mut findings = Vec::new();
        each_token(ctx.program, &mut |_, _, token| {
            let expected = match token.text.as_str() {
                "==" => "===",
                "!=" => "!==",
                _ => return,
            };
            if token.kind == TokenKind::Punct {
                findings.push(Finding::new(
                    token.line,
                    token.col,
                    format!("Expected '{}' and instead saw '{}'.", expected, token.text),
                ));
            }
        });
        findings
    }
}

pub struct NoVar;

impl Rule for NoVar {
    fn name(&self) -> &'static str {
        "no-var"
    }

    fn check(&self, ctx: &LintContext<'_>) -> Vec<Finding> {
        let mut findings = Vec::new();
        each_token(ctx.program, &mut |nodes, i, token| {
            if token.is_ident("var") && !is_member_name(nodes, i) {
                findings.push(Finding::new(
                    token.line,
                    token.col,
                    "Unexpected var, use let or const instead.",
                ));
            }
        });
        findings
    }
}

pub struct NoDebugger;

impl Rule for NoDebugger {
    fn name(&self) -> &'static str {
        "no-debugger"
    }

    fn check(&self, ctx: &LintContext<'_>) -> Vec<Finding> {
        let mut findings = Vec::new();
        each_token(ctx.program, &mut |nodes, i, token| {
            if token.is_ident("debugger") && !is_member_name(nodes, i) {
                findings.push(Finding::new(
                    token.line,
                    token.col,
                    "Unexpected 'debugger' statement.",
                ));
            }
        });
        findings
    }
}

/// Single quotes, unless the string itself contains one.
pub struct Quotes;

impl Rule for Quotes {
    fn name(&self) -> &'static str {
        "quotes"
    }

    fn check(&self, ctx: &LintContext<'_>) -> Vec<Finding> {
        let mut findings = Vec::new();
        each_token(ctx.program, &mut |_, _, token| {
            if token.kind != TokenKind::Str || !token.text.starts_with('"') {
                return;
            }
            if !token.text.trim_matches('"').contains('\'') {
                findings.push(Finding::new(token.line, token.col, "Strings must use singlequote."));
            }
        });
        findings
    }
}

// ========== Layout ==========

pub struct NoTrailingSpaces;

impl Rule for NoTrailingSpaces {
    fn name(&self) -> &'static str {
        "no-trailing-spaces"
    }

    fn check(&self, ctx: &LintContext<'_>) -> Vec<Finding> {
        ctx.source
            .split('\n')
            .enumerate()
            .filter_map(|(idx, line)| {
                let line = line.strip_suffix('\r').unwrap_or(line);
                let trimmed = line.trim_end_matches([' ', '\t']);
                (trimmed.len() != line.len()).then(|| {
                    Finding::new(
                        idx + 1,
                        trimmed.chars().count() + 1,
                        "Trailing spaces not allowed.",
                    )
                })
            })
            .collect()
    }
}

pub struct EolLast;

impl Rule for EolLast {
    fn name(&self) -> &'static str {
        "eol-last"
    }

    fn check(&self, ctx: &LintContext<'_>) -> Vec<Finding> {
        if ctx.source.is_empty() || ctx.source.ends_with('\n') {
            return Vec::new();
        }
        let line = ctx.source.split('\n').count();
        let col = ctx.source.rsplit('\n').next().unwrap_or_default().chars().count() + 1;
        vec![Finding::new(
            line,
            col,
            "Newline required at end of file but not found.",
        )]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::js::parse;

    fn run(rule: &dyn Rule, source: &str) -> Vec<Finding> {
        let program = parse(source).unwrap();
        let globals: HashSet<String> = ["console".to_string()].into_iter().collect();
        let ctx = LintContext {
            source,
            program: &program,
            globals: &globals,
        };
        rule.check(&ctx)
    }

    #[test]
    fn test_no_undef() {
        let findings = run(&NoUndef, "const a = 1;\nconsole.log(a, b);\n");
        assert_eq!(findings, vec![Finding::new(2, 16, "'b' is not defined.")]);
    }

    #[test]
    fn test_no_undef_hoisted_function() {
        assert!(run(&NoUndef, "go();\nfunction go() {}\n").is_empty());
    }

    #[test]
    fn test_no_undef_arrow_parameter_out_of_scope() {
        let findings = run(&NoUndef, "const f = (item) => item;\nconsole.log(f(1), item);\n");
        assert_eq!(findings, vec![Finding::new(2, 19, "'item' is not defined.")]);
    }

    #[test]
    fn test_react_in_jsx_scope() {
        let findings = run(&ReactInJsxScope, "render(<div/>);\n");
        assert_eq!(findings.len(), 1);
        assert_eq!((findings[0].line, findings[0].col), (1, 8));

        let source = "import React from 'react';\nrender(<div/>);\n";
        assert!(run(&ReactInJsxScope, source).is_empty());
    }

    #[test]
    fn test_eqeqeq() {
        let findings = run(&Eqeqeq, "if (a == b && c != d && e === f) {}\n");
        assert_eq!(findings.len(), 2);
        assert_eq!(findings[0].message, "Expected '===' and instead saw '=='.");
        assert_eq!(findings[1].message, "Expected '!==' and instead saw '!='.");
    }

    #[test]
    fn test_no_var_and_debugger() {
        assert_eq!(run(&NoVar, "var a = obj.var;\n").len(), 1);
        let findings = run(&NoDebugger, "function f() {\n  debugger;\n}\n");
        assert_eq!(findings, vec![Finding::new(2, 3, "Unexpected 'debugger' statement.")]);
    }

    #[test]
    fn test_quotes() {
        let findings = run(&Quotes, "a(\"x\", 'y', \"it's\");\n");
        assert_eq!(findings, vec![Finding::new(1, 3, "Strings must use singlequote.")]);
    }

    #[test]
    fn test_trailing_spaces() {
        let findings = run(&NoTrailingSpaces, "a; \nb;\r\nc;\t\t\n");
        assert_eq!(
            findings,
            vec![
                Finding::new(1, 3, "Trailing spaces not allowed."),
                Finding::new(3, 3, "Trailing spaces not allowed."),
            ]
        );
    }

    #[test]
    fn test_eol_last() {
        assert!(run(&EolLast, "a;\n").is_empty());
        assert!(run(&EolLast, "").is_empty());
        assert_eq!(
            run(&EolLast, "a;\nbc;"),
            vec![Finding::new(2, 4, "Newline required at end of file but not found.")]
        );
    }
}
