//! Shared utility functions.

use std::path::{Path, PathBuf};

use tokio::task::spawn_blocking;

use crate::{Error, Result};

/// Run CPU-bound or blocking file work on tokio's blocking pool.
pub async fn blocking<F, T>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    spawn_blocking(f)
        .await
        .map_err(|e| Error::TaskJoin(e.to_string()))?
}

/// Render `path` relative to `root` for reports, falling back to the full path.
pub fn display_path(path: &Path, root: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/")
}

/// Normalize `.` and `..` components without touching the filesystem.
pub fn normalize(path: &Path) -> PathBuf {
    use std::path::Component;

    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_blocking_success() {
        assert_eq!(blocking(|| Ok::<_, Error>(42)).await.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_blocking_propagates_error() {
        let result = blocking(|| Err::<(), _>(Error::LintFailed(1))).await;
        assert!(matches!(result.unwrap_err(), Error::LintFailed(1)));
    }

    #[test]
    fn test_display_path() {
        assert_eq!(
            display_path(Path::new("/p/src/a/b.js"), Path::new("/p")),
            "src/a/b.js"
        );
        assert_eq!(
            display_path(Path::new("/elsewhere/x.js"), Path::new("/p")),
            "/elsewhere/x.js"
        );
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize(Path::new("./src/./a/../b.js")), PathBuf::from("src/b.js"));
        assert_eq!(normalize(Path::new("../x")), PathBuf::from("../x"));
    }
}
