//! Transpiler stage.
//!
//! Each file of the build source set is parsed once, run through the
//! passes its presets select (always in the fixed pass order) and printed.
//! Outputs land under the destination directory at the file's path
//! relative to its glob base. Nothing is written unless every file
//! transformed successfully.

pub mod check;
pub mod passes;
pub mod preset;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::future::join_all;
use serde::Serialize;

use crate::config::BuildConfig;
use crate::source::SourceFile;
use crate::transpile::passes::PassContext;
use crate::util::blocking;
use crate::{js, klog, klog_debug, klog_trace, Error, Result};

pub use preset::{resolve_presets, Pass};

/// Outcome of a build: the files written, relative to the destination.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BuildReport {
    pub written: Vec<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct Transpiler {
    passes: Vec<Pass>,
    pragma: String,
    /// Every `es2015` pass is selected, so nothing newer may remain.
    targets_es5: bool,
}

impl Transpiler {
    /// Resolve the configured presets; unknown names fail here, before any
    /// file is read.
    pub fn new(config: &BuildConfig) -> Result<Self> {
        let passes = resolve_presets(&config.presets)?;
        klog_debug!(
            "Transpiler::new passes={:?}",
            passes.iter().map(Pass::name).collect::<Vec<_>>()
        );
        let targets_es5 = Pass::es2015().iter().all(|pass| passes.contains(pass));
        Ok(Self {
            passes,
            pragma: config.jsx_pragma.clone(),
            targets_es5,
        })
    }

    pub fn passes(&self) -> &[Pass] {
        &self.passes
    }

    /// Transform one source text.
    pub fn transform(&self, source: &str) -> Result<String> {
        let mut program = js::parse(source)?;
        let mut ctx = PassContext::new(&self.pragma, &program);
        for pass in &self.passes {
            klog_trace!("Applying pass {} ({} top-level nodes)", pass, program.nodes.len());
            passes::apply(*pass, &mut program, &mut ctx)?;
        }
        if self.targets_es5 {
            check::es5_residue(&program)?;
        }
        let mut out = js::print(&program);
        ctx.append_helpers(&mut out);
        Ok(out)
    }

    /// Read and transform a file; every failure names the file.
    pub fn transform_file(&self, path: &Path) -> Result<String> {
        let source = std::fs::read_to_string(path).map_err(|e| transform_error(path, e.to_string()))?;
        self.transform(&source).map_err(|e| {
            let message = match e {
                Error::Parse { line, col, message } => format!("{}:{}: {}", line, col, message),
                Error::Unsupported(message) => message,
                other => other.to_string(),
            };
            transform_error(path, message)
        })
    }
}

fn transform_error(path: &Path, message: String) -> Error {
    Error::Transform {
        path: path.to_path_buf(),
        message,
    }
}

/// Transform `files` concurrently, then write them under `dest`.
///
/// With `clean`, `dest` is removed first. Existing files are otherwise
/// overwritten and unrelated files are left in place.
pub async fn build_files(
    transpiler: Arc<Transpiler>,
    files: &[SourceFile],
    dest: &Path,
    clean: bool,
) -> Result<BuildReport> {
    let jobs = files.iter().map(|file| {
        let transpiler = Arc::clone(&transpiler);
        let path = file.path.clone();
        blocking(move || transpiler.transform_file(&path))
    });

    let mut outputs = Vec::with_capacity(files.len());
    for (file, result) in files.iter().zip(join_all(jobs).await) {
        outputs.push((file.relative.clone(), result?));
    }

    if clean && tokio::fs::try_exists(dest).await? {
        klog!("Cleaning {}", dest.display());
        tokio::fs::remove_dir_all(dest).await?;
    }

    let mut report = BuildReport::default();
    for (relative, code) in outputs {
        let target = dest.join(&relative);
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&target, code).await?;
        klog_debug!("Wrote {}", target.display());
        report.written.push(relative);
    }
    Ok(report)
}
