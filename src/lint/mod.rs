//! Linter gate.
//!
//! Every file of the lint source set is checked against the enabled rules.
//! Files are linted concurrently on the blocking pool; the report lists
//! violations in source-set order, then by position within a file.

pub mod globals;
pub mod rules;
pub mod scope;

use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use futures::future::join_all;
use serde::Serialize;

use crate::config::LintConfig;
use crate::lint::rules::{LintContext, Rule};
use crate::source::SourceFile;
use crate::util::{blocking, display_path};
use crate::{js, klog_debug, klog_warn, Error, Result};

/// Rule name reported for files that cannot be read or parsed.
pub const PARSE_ERROR_RULE: &str = "parse-error";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub file: String,
    pub line: usize,
    pub col: usize,
    pub rule: String,
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}  {}  {}",
            self.file, self.line, self.col, self.rule, self.message
        )
    }
}

/// Outcome of linting a source set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LintReport {
    pub files_checked: usize,
    pub violations: Vec<Violation>,
}

impl LintReport {
    pub fn is_clean(&self) -> bool {
        self.violations.is_empty()
    }

    /// One line per violation followed by a problem count.
    pub fn format_text(&self) -> String {
        let mut out = String::new();
        for violation in &self.violations {
            out.push_str(&violation.to_string());
            out.push('\n');
        }
        if !self.is_clean() {
            let count = self.violations.len();
            let noun = if count == 1 { "problem" } else { "problems" };
            out.push_str(&format!("\n{} {}\n", count, noun));
        }
        out
    }

    /// The violations as a JSON array of objects.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.violations)?)
    }
}

pub struct Linter {
    rules: Vec<Box<dyn Rule>>,
    globals: HashSet<String>,
}

impl Linter {
    /// Build a linter from its configuration.
    ///
    /// Fails on an unknown environment or an unknown disabled rule name.
    pub fn new(config: &LintConfig) -> Result<Self> {
        let mut rules = rules::all();
        for name in &config.disabled_rules {
            if !rules.iter().any(|rule| rule.name() == name) {
                return Err(Error::Validation(format!("Unknown lint rule: {}", name)));
            }
        }
        rules.retain(|rule| !config.disabled_rules.iter().any(|name| name == rule.name()));

        let mut globals: HashSet<String> = config.globals.iter().cloned().collect();
        for env in &config.env {
            globals.extend(globals::environment(env)?.iter().map(|g| g.to_string()));
        }

        klog_debug!(
            "Linter::new rules={:?}, globals={}",
            rules.iter().map(|r| r.name()).collect::<Vec<_>>(),
            globals.len()
        );
        Ok(Self { rules, globals })
    }

    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|rule| rule.name()).collect()
    }

    /// Lint one source text, reported under `file`.
    pub fn lint_source(&self, file: &str, source: &str) -> Vec<Violation> {
        let program = match js::parse(source) {
            Ok(program) => program,
            Err(Error::Parse { line, col, message }) => {
                return vec![violation(file, line, col, PARSE_ERROR_RULE, message)];
            }
            Err(e) => return vec![violation(file, 1, 1, PARSE_ERROR_RULE, e.to_string())],
        };

        let ctx = LintContext {
            source,
            program: &program,
            globals: &self.globals,
        };
        let mut violations: Vec<Violation> = self
            .rules
            .iter()
            .flat_map(|rule| {
                rule.check(&ctx)
                    .into_iter()
                    .map(move |f| violation(file, f.line, f.col, rule.name(), f.message))
            })
            .collect();
        violations.sort_by_key(|v| (v.line, v.col));
        violations
    }

    /// Lint a file on disk; unreadable files become a `parse-error` violation.
    pub fn lint_path(&self, path: &Path, file: &str) -> Vec<Violation> {
        match std::fs::read_to_string(path) {
            Ok(source) => self.lint_source(file, &source),
            Err(e) => {
                klog_warn!("Could not read {}: {}", path.display(), e);
                vec![violation(file, 1, 1, PARSE_ERROR_RULE, e.to_string())]
            }
        }
    }
}

fn violation(file: &str, line: usize, col: usize, rule: &str, message: String) -> Violation {
    Violation {
        file: file.to_string(),
        line,
        col,
        rule: rule.to_string(),
        message,
    }
}

/// Lint `files` concurrently and collect the report in file order.
pub async fn lint_files(linter: Arc<Linter>, files: &[SourceFile], root: &Path) -> Result<LintReport> {
    let jobs = files.iter().map(|file| {
        let linter = Arc::clone(&linter);
        let path = file.path.clone();
        let display = display_path(&file.path, root);
        blocking(move || Ok(linter.lint_path(&path, &display)))
    });

    let mut report = LintReport {
        files_checked: files.len(),
        violations: Vec::new(),
    };
    for result in join_all(jobs).await {
        report.violations.extend(result?);
    }
    klog_debug!(
        "Linted {} file(s), {} violation(s)",
        report.files_checked,
        report.violations.len()
    );
    Ok(report)
}
