//! Test fixtures for integration tests.
//!
//! Provides a temporary project tree with helpers for writing sources,
//! reading outputs and running the pipeline or the binary against it.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

use kiln::config::{Config, CONFIG_FILE};
use kiln::tasks::ReportFormat;
use kiln::{Pipeline, Result, RunReport};

/// A project tree in a temporary directory.
pub struct TestProject {
    /// Kept alive so the directory outlives the test.
    _temp_dir: TempDir,
    /// Path to the project root.
    pub path: PathBuf,
}

impl TestProject {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().to_path_buf();
        Self {
            _temp_dir: temp_dir,
            path,
        }
    }

    /// A project holding the given `(relative path, contents)` files.
    pub fn with_files(files: &[(&str, &str)]) -> Self {
        let project = Self::new();
        for (name, contents) in files {
            project.write(name, contents);
        }
        project
    }

    pub fn write(&self, relative: &str, contents: &str) {
        let path = self.path.join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        std::fs::write(path, contents).expect("Failed to write file");
    }

    pub fn read(&self, relative: &str) -> String {
        std::fs::read_to_string(self.path.join(relative)).expect("Failed to read file")
    }

    pub fn exists(&self, relative: &str) -> bool {
        self.path.join(relative).exists()
    }

    /// Files under `relative`, as sorted paths relative to it.
    pub fn list(&self, relative: &str) -> Vec<String> {
        let mut found = Vec::new();
        collect(&self.path.join(relative), Path::new(""), &mut found);
        found.sort();
        found
    }

    pub fn config(&self) -> Config {
        Config::load(&self.path.join(CONFIG_FILE)).expect("Failed to load config")
    }

    /// Run `task` through the standard pipeline.
    pub async fn run(&self, task: &str) -> Result<RunReport> {
        let mut pipeline = Pipeline::standard(&self.config(), self.path.clone(), ReportFormat::Text)?;
        pipeline.run(task).await
    }

    /// Run the `kiln` binary with the project as working directory.
    pub fn kiln(&self, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_kiln"))
            .args(args)
            .current_dir(&self.path)
            .env(kiln::log::LOG_ENV, self.path.join("kiln.log"))
            .env_remove(kiln::log::DEBUG_ENV)
            .output()
            .expect("Failed to run kiln")
    }
}

fn collect(dir: &Path, prefix: &Path, found: &mut Vec<String>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let name = prefix.join(entry.file_name());
        if entry.path().is_dir() {
            collect(&entry.path(), &name, found);
        } else {
            found.push(name.to_string_lossy().replace('\\', "/"));
        }
    }
}

pub const OK_JS: &str = "const cats = ['Felix', 'Tom'];\nconsole.log(cats.length);\n";

pub const BAD_JS: &str = "console.log(undeclaredCat);\n";
