//! Runs one pipeline task per container file, concurrently

use std::path::{Path, PathBuf};

use futures::future::join_all;
use tracing::{error, info};

use crate::pipeline::PipelineError;
use crate::pipeline::file::FilePipeline;

/// Extensions of container definition files
const CONTAINER_FILE_EXTENSIONS: [&str; 2] = ["yml", "yaml"];

/// Outcome of one run over all container files
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Files processed
    pub files: usize,
    /// Commits made across all files
    pub updated: usize,
    /// Files whose task failed
    pub failed: Vec<PathBuf>,
}

impl RunSummary {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

pub struct Updater {
    pipeline: FilePipeline,
}

impl Updater {
    pub fn new(pipeline: FilePipeline) -> Self {
        Self { pipeline }
    }

    /// Process every container file in `folder`
    ///
    /// Files run concurrently; a failing file never affects its siblings.
    pub async fn run(&self, folder: &Path) -> Result<RunSummary, PipelineError> {
        let paths = discover_files(folder).await?;
        info!("Checking {} container files in {}", paths.len(), folder.display());

        let futures = paths.iter().map(|path| async move {
            let result = self.pipeline.process_file(path).await;
            (path, result)
        });

        let mut summary = RunSummary {
            files: paths.len(),
            ..RunSummary::default()
        };

        for (path, result) in join_all(futures).await {
            match result {
                Ok(updated) => summary.updated += updated,
                Err(e) => {
                    error!("{}: {}", path.display(), e);
                    summary.failed.push(path.clone());
                }
            }
        }

        Ok(summary)
    }
}

/// Container files directly inside `folder`, sorted by path
pub async fn discover_files(folder: &Path) -> Result<Vec<PathBuf>, PipelineError> {
    let discover_error = |source| PipelineError::Discover {
        path: folder.to_path_buf(),
        source,
    };

    let mut entries = tokio::fs::read_dir(folder).await.map_err(discover_error)?;
    let mut paths = Vec::new();

    while let Some(entry) = entries.next_entry().await.map_err(discover_error)? {
        let path = entry.path();
        let is_file = entry
            .file_type()
            .await
            .map_err(discover_error)?
            .is_file();
        let has_extension = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| CONTAINER_FILE_EXTENSIONS.contains(&e));

        if is_file && has_extension {
            paths.push(path);
        }
    }

    paths.sort();
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn discover_files_returns_sorted_yaml_files_only() {
        let temp_dir = TempDir::new().unwrap();
        for name in ["web.yml", "apps.yaml", "notes.txt", "README.md"] {
            std::fs::write(temp_dir.path().join(name), "").unwrap();
        }
        std::fs::create_dir(temp_dir.path().join("nested.yaml")).unwrap();

        let paths = discover_files(temp_dir.path()).await.unwrap();

        assert_eq!(
            paths,
            vec![
                temp_dir.path().join("apps.yaml"),
                temp_dir.path().join("web.yml"),
            ]
        );
    }

    #[tokio::test]
    async fn discover_files_fails_for_missing_folder() {
        let temp_dir = TempDir::new().unwrap();

        let result = discover_files(&temp_dir.path().join("missing")).await;

        assert!(matches!(result, Err(PipelineError::Discover { .. })));
    }

    #[test]
    fn run_summary_reports_failures() {
        let summary = RunSummary {
            files: 2,
            updated: 1,
            failed: vec![PathBuf::from("containers/broken.yaml")],
        };

        assert!(!summary.is_success());
        assert!(RunSummary::default().is_success());
    }
}
