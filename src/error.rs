use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Invalid glob pattern: {0}")]
    Glob(#[from] glob::PatternError),

    #[error("File not found with singular glob: {0}")]
    NoMatch(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Task not found: {0}")]
    UnknownTask(String),

    #[error("Unknown preset: {0}")]
    UnknownPreset(String),

    #[error("Parse error at {line}:{col}: {message}")]
    Parse {
        line: usize,
        col: usize,
        message: String,
    },

    #[error("Unsupported syntax: {0}")]
    Unsupported(String),

    #[error("Failed to transform {}: {message}", path.display())]
    Transform { path: PathBuf, message: String },

    #[error("Lint failed with {0} problem(s)")]
    LintFailed(usize),

    #[error("Task '{task}' not run: dependency '{dependency}' failed")]
    DependencyFailed { task: String, dependency: String },

    #[error("Task join error: {0}")]
    TaskJoin(String),
}

impl Error {
    /// Build a parse error at the given source position.
    pub fn parse(line: usize, col: usize, message: impl Into<String>) -> Self {
        Error::Parse {
            line,
            col,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
