//! The `lint` and `build` tasks.
//!
//! [`Pipeline::standard`] registers the two stages on a fresh pipeline:
//! `lint` with no dependencies and `build` depending on `lint`.

use std::path::PathBuf;
use std::sync::Arc;

use futures::future::BoxFuture;

use crate::config::{BuildConfig, Config, LintConfig};
use crate::core::Task;
use crate::lint::{lint_files, Linter};
use crate::runner::{Pipeline, TaskAction};
use crate::source::SourceSet;
use crate::transpile::{build_files, Transpiler};
use crate::util::display_path;
use crate::{klog, Error, Result};

pub const LINT_TASK: &str = "lint";
pub const BUILD_TASK: &str = "build";

/// How the lint report is printed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

/// Linter Gate: fails with [`Error::LintFailed`] when any violation is found.
pub struct LintTask {
    config: LintConfig,
    root: PathBuf,
    format: ReportFormat,
}

impl LintTask {
    pub fn new(config: LintConfig, root: PathBuf, format: ReportFormat) -> Self {
        Self {
            config,
            root,
            format,
        }
    }

    async fn execute(&self) -> Result<()> {
        let linter = Arc::new(Linter::new(&self.config)?);
        let files = SourceSet::new(self.config.sources.iter().cloned()).resolve(&self.root)?;
        klog!("Linting {} file(s)", files.len());

        let report = lint_files(linter, &files, &self.root).await?;
        if report.is_clean() {
            return Ok(());
        }
        match self.format {
            ReportFormat::Text => print!("{}", report.format_text()),
            ReportFormat::Json => println!("{}", report.to_json()?),
        }
        Err(Error::LintFailed(report.violations.len()))
    }
}

impl TaskAction for LintTask {
    fn run(&self) -> BoxFuture<'_, Result<()>> {
        Box::pin(self.execute())
    }
}

/// Transpiler Stage: writes every transformed file under the destination.
pub struct BuildTask {
    config: BuildConfig,
    root: PathBuf,
    dest: PathBuf,
    format: ReportFormat,
}

impl BuildTask {
    pub fn new(config: &Config, root: PathBuf, format: ReportFormat) -> Self {
        Self {
            dest: config.dest_dir(&root),
            config: config.build.clone(),
            root,
            format,
        }
    }

    async fn execute(&self) -> Result<()> {
        let transpiler = Arc::new(Transpiler::new(&self.config)?);
        let files = SourceSet::new(self.config.sources.iter().cloned()).resolve(&self.root)?;
        klog!(
            "Building {} file(s) into {}",
            files.len(),
            self.dest.display()
        );

        let report = build_files(transpiler, &files, &self.dest, self.config.clean).await?;
        if self.format == ReportFormat::Text {
            println!(
                "Wrote {} file(s) to {}",
                report.written.len(),
                display_path(&self.dest, &self.root)
            );
        }
        Ok(())
    }
}

impl TaskAction for BuildTask {
    fn run(&self) -> BoxFuture<'_, Result<()>> {
        Box::pin(self.execute())
    }
}

impl Pipeline {
    /// The `lint` -> `build` pipeline over the project at `root`.
    pub fn standard(config: &Config, root: PathBuf, format: ReportFormat) -> Result<Self> {
        let mut pipeline = Pipeline::new();
        pipeline.register(
            Task::new(LINT_TASK, "Check sources against the lint rules"),
            &[],
            LintTask::new(config.lint.clone(), root.clone(), format),
        )?;
        pipeline.register(
            Task::new(BUILD_TASK, "Transpile sources into the destination directory"),
            &[LINT_TASK],
            BuildTask::new(config, root, format),
        )?;
        Ok(pipeline)
    }
}
