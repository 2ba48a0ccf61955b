use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::{klog_debug, Result};

/// Default name of the pipeline definition file.
pub const CONFIG_FILE: &str = "kiln.toml";

/// Pipeline definition, loaded once from `kiln.toml`.
///
/// Missing sections and fields fall back to the defaults below, which
/// reproduce the classic `lint` + `build` pair.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub lint: LintConfig,
    #[serde(default)]
    pub build: BuildConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LintConfig {
    /// Glob patterns selecting the files to lint.
    pub sources: Vec<String>,
    /// Environments whose globals are predeclared (`builtin`, `browser`, `node`).
    pub env: Vec<String>,
    /// Extra global names treated as declared.
    pub globals: Vec<String>,
    /// Rule names to switch off.
    pub disabled_rules: Vec<String>,
}

impl Default for LintConfig {
    fn default() -> Self {
        Self {
            sources: vec!["src/**/*.js".to_string(), "src/**/*.jsx".to_string()],
            env: vec!["builtin".to_string(), "browser".to_string()],
            globals: Vec::new(),
            disabled_rules: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BuildConfig {
    /// Glob patterns selecting the files to transpile.
    pub sources: Vec<String>,
    /// Named presets (or single pass names) to apply.
    pub presets: Vec<String>,
    /// Destination directory, relative to the project root.
    pub dest: String,
    /// Remove the destination directory before writing.
    pub clean: bool,
    /// Function that JSX elements are compiled into calls of.
    pub jsx_pragma: String,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            sources: vec!["src/**/*.js".to_string()],
            presets: vec!["es2015".to_string(), "react".to_string()],
            dest: "lib".to_string(),
            clean: false,
            jsx_pragma: "React.createElement".to_string(),
        }
    }
}

impl Config {
    /// Load the pipeline definition from `path`, or defaults if it does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        klog_debug!("Config::load path={}", path.display());
        if !path.exists() {
            klog_debug!("Config file not found, using defaults");
            return Ok(Self::default());
        }
        let config: Self = toml::from_str(&fs::read_to_string(path)?)?;
        klog_debug!(
            "Config loaded: lint.sources={:?}, build.sources={:?}, presets={:?}, dest={}",
            config.lint.sources,
            config.build.sources,
            config.build.presets,
            config.build.dest
        );
        Ok(config)
    }

    /// Resolve the destination directory against the project root.
    pub fn dest_dir(&self, root: &Path) -> PathBuf {
        let dest = Path::new(&self.build.dest);
        if dest.is_absolute() {
            dest.to_path_buf()
        } else {
            root.join(dest)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.lint.sources, vec!["src/**/*.js", "src/**/*.jsx"]);
        assert_eq!(config.build.sources, vec!["src/**/*.js"]);
        assert_eq!(config.build.presets, vec!["es2015", "react"]);
        assert_eq!(config.build.dest, "lib");
        assert!(!config.build.clean);
        assert_eq!(config.build.jsx_pragma, "React.createElement");
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
            [build]
            dest = "dist"
            "#,
        )
        .unwrap();
        assert_eq!(config.build.dest, "dist");
        assert_eq!(config.build.presets, vec!["es2015", "react"]);
        assert_eq!(config.lint, LintConfig::default());
    }

    #[test]
    fn test_config_roundtrip() {
        let mut config = Config::default();
        config.lint.globals = vec!["jQuery".to_string()];
        config.lint.disabled_rules = vec!["quotes".to_string()];
        config.build.clean = true;
        let toml = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&toml).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(&dir.path().join(CONFIG_FILE)).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_invalid_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "[build\ndest = ").unwrap();
        assert!(matches!(
            Config::load(&path).unwrap_err(),
            crate::Error::TomlParse(_)
        ));
    }

    #[test]
    fn test_dest_dir_relative_and_absolute() {
        let mut config = Config::default();
        assert_eq!(
            config.dest_dir(Path::new("/project")),
            PathBuf::from("/project/lib")
        );
        config.build.dest = "/tmp/out".to_string();
        assert_eq!(
            config.dest_dir(Path::new("/project")),
            PathBuf::from("/tmp/out")
        );
    }
}
