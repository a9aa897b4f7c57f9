//! History collaborator: stages and commits rewritten files

#[cfg(test)]
use mockall::automock;

use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("git {command} failed: {stderr}")]
    CommandFailed { command: String, stderr: String },
}

/// Version history for container files
///
/// Each operation is all-or-nothing; callers serialize access.
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait History: Send + Sync {
    /// Drop uncommitted changes in the working tree
    async fn discard_changes(&self) -> Result<(), HistoryError>;

    /// Stage `path` for the next commit
    async fn stage(&self, path: &Path) -> Result<(), HistoryError>;

    /// Commit everything staged
    async fn commit(&self, message: &str) -> Result<(), HistoryError>;
}

/// [`History`] backed by the `git` command line
pub struct GitHistory {
    root: PathBuf,
}

impl GitHistory {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    async fn git(&self, args: &[&str]) -> Result<(), HistoryError> {
        debug!("git {}", args.join(" "));

        let output = Command::new("git")
            .arg("-C")
            .arg(&self.root)
            .args(args)
            .output()
            .await?;

        if !output.status.success() {
            return Err(HistoryError::CommandFailed {
                command: args.first().copied().unwrap_or_default().to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(())
    }
}

#[async_trait::async_trait]
impl History for GitHistory {
    async fn discard_changes(&self) -> Result<(), HistoryError> {
        self.git(&["reset", "--hard"]).await
    }

    async fn stage(&self, path: &Path) -> Result<(), HistoryError> {
        // git -C resolves relative paths against the repository root
        let path = tokio::fs::canonicalize(path).await?;
        self.git(&["add", "--", &*path.to_string_lossy()]).await
    }

    async fn commit(&self, message: &str) -> Result<(), HistoryError> {
        self.git(&["commit", "--quiet", "-m", message]).await
    }
}
