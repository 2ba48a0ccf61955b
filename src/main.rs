use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use kiln::config::{Config, CONFIG_FILE};
use kiln::tasks::{ReportFormat, BUILD_TASK, LINT_TASK};
use kiln::{klog, klog_error, Error, Pipeline, Result};

/// Kiln - lint and transpile a JavaScript source tree
#[derive(Parser, Debug)]
#[command(name = "kiln")]
#[command(version, about, long_about = None)]
#[command(after_help = "ENVIRONMENT:\n    KILN_DEBUG=1    Enable debug logging (alternative to --debug)")]
pub struct Cli {
    /// Pipeline definition file
    #[arg(long, global = true, default_value = CONFIG_FILE)]
    pub config: PathBuf,

    /// Project root (defaults to the directory holding the config file)
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    /// Enable debug logging (writes to ~/.kiln/kiln.log)
    #[arg(short = 'd', long, global = true)]
    pub debug: bool,

    /// Lint report format
    #[arg(long, global = true, value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Run the linter over the lint sources
    Lint,

    /// Lint, then transpile the build sources into the destination directory
    Build,

    /// List the pipeline's tasks and their dependencies
    Tasks,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    kiln::log::init_with_debug(cli.debug);
    if kiln::log::is_debug() {
        klog!("Kiln starting (debug mode enabled)");
        if let Some(path) = kiln::log::log_path() {
            eprintln!("Debug log: {}", path.display());
        }
    } else {
        klog!("Kiln starting");
    }

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            klog_error!("{}", e);
            // The report already lists every violation.
            if !matches!(e, Error::LintFailed(_)) {
                eprintln!("Error: {}", e);
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = Config::load(&cli.config)?;
    let root = match cli.root {
        Some(root) => root,
        None => project_root(&cli.config)?,
    };
    klog!("Project root: {}", root.display());

    let mut pipeline = Pipeline::standard(&config, root, cli.format)?;
    let task = match cli.command {
        Command::Tasks => return list_tasks(&pipeline),
        Command::Lint => LINT_TASK,
        Command::Build => BUILD_TASK,
    };

    let rt = tokio::runtime::Runtime::new()?;
    let report = rt.block_on(pipeline.run(task))?;
    for (id, status) in &report.tasks {
        klog!("{}: {}", id, status);
    }
    Ok(())
}

fn project_root(config_path: &Path) -> Result<PathBuf> {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => Ok(parent.to_path_buf()),
        _ => Ok(std::env::current_dir()?),
    }
}

fn list_tasks(pipeline: &Pipeline) -> Result<()> {
    for task in pipeline.tasks()? {
        if task.dependencies.is_empty() {
            println!("{:<8} {}", task.name, task.description);
        } else {
            println!(
                "{:<8} {} (after: {})",
                task.name,
                task.description,
                task.dependencies.join(", ")
            );
        }
    }
    Ok(())
}
