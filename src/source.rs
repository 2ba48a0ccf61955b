//! Source file sets.
//!
//! A [`SourceSet`] is an ordered list of glob patterns fixed at
//! configuration time. Resolving it against a project root yields the
//! matched files in a stable order, each paired with its path relative to
//! the static base of the pattern that matched it. That relative path is
//! what output files are written under.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use glob::{MatchOptions, Pattern};

use crate::util::normalize;
use crate::{klog_debug, Error, Result};

const GLOB_META: &[char] = &['*', '?', '[', '{'];

/// A file selected by a [`SourceSet`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Full path of the file (project root joined with the match).
    pub path: PathBuf,
    /// Path relative to the base directory of the matching pattern.
    pub relative: PathBuf,
}

/// Ordered glob patterns; a leading `!` excludes earlier matches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSet {
    patterns: Vec<String>,
}

impl SourceSet {
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            patterns: patterns.into_iter().map(Into::into).collect(),
        }
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// Resolve the patterns against `root`.
    ///
    /// Files come back in pattern order and sorted within a pattern. A file
    /// matched by more than one pattern is listed once, with the base of the
    /// first pattern that matched it.
    ///
    /// # Errors
    /// - [`Error::Glob`] for a malformed pattern
    /// - [`Error::NoMatch`] when a literal (wildcard-free) pattern names a
    ///   file that does not exist
    /// - [`Error::Io`] when a directory cannot be read during the walk
    pub fn resolve(&self, root: &Path) -> Result<Vec<SourceFile>> {
        let mut files: Vec<SourceFile> = Vec::new();
        let mut seen: HashSet<PathBuf> = HashSet::new();
        let escaped_root = Pattern::escape(&root.to_string_lossy());
        let normalized_root = normalize(root);

        for raw in &self.patterns {
            if let Some(negated) = raw.strip_prefix('!') {
                // Matched against the root-relative path, so a relative
                // root such as `.` excludes the same files as an absolute one.
                let exclude = Pattern::new(negated.trim_start_matches("./"))?;
                let before = files.len();
                files.retain(|file| {
                    let relative = file
                        .path
                        .strip_prefix(&normalized_root)
                        .unwrap_or(&file.path);
                    !exclude.matches_path_with(relative, match_options())
                });
                seen = files.iter().map(|f| f.path.clone()).collect();
                klog_debug!("Pattern {} excluded {} file(s)", raw, before - files.len());
                continue;
            }

            let base = root.join(glob_base(raw));
            let matches = if is_glob(raw) {
                expand(&format!("{}/{}", escaped_root, raw))?
            } else {
                let path = normalize(&root.join(raw));
                if !path.is_file() {
                    return Err(Error::NoMatch(raw.clone()));
                }
                vec![path]
            };
            klog_debug!("Pattern {} matched {} file(s)", raw, matches.len());

            let base = normalize(&base);
            for path in matches {
                if !seen.insert(path.clone()) {
                    continue;
                }
                let relative = path
                    .strip_prefix(&base)
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|_| PathBuf::from(path.file_name().unwrap_or_default()));
                files.push(SourceFile { path, relative });
            }
        }

        Ok(files)
    }
}

fn match_options() -> MatchOptions {
    MatchOptions {
        case_sensitive: true,
        require_literal_separator: true,
        require_literal_leading_dot: false,
    }
}

fn expand(pattern: &str) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for entry in glob::glob_with(pattern, match_options())? {
        let path = entry.map_err(|e| Error::Io(e.into_error()))?;
        if path.is_file() {
            paths.push(normalize(&path));
        }
    }
    paths.sort();
    Ok(paths)
}

/// Whether a pattern contains any glob metacharacter.
pub fn is_glob(pattern: &str) -> bool {
    pattern.contains(GLOB_META)
}

/// The static directory prefix of a pattern.
///
/// `src/**/*.js` has base `src`; a literal file path has its parent
/// directory as base, so `ok.js` has the empty base.
pub fn glob_base(pattern: &str) -> PathBuf {
    let segments: Vec<&str> = pattern.split('/').collect();
    let literal: Vec<&str> = if is_glob(pattern) {
        segments
            .iter()
            .take_while(|segment| !is_glob(segment))
            .copied()
            .collect()
    } else {
        segments[..segments.len().saturating_sub(1)].to_vec()
    };
    normalize(&literal.iter().collect::<PathBuf>())
}
