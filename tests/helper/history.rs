//! History test utilities

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use image_updater::pipeline::{History, HistoryError};

/// One commit as seen by [`RecordingHistory`]
#[derive(Debug, Clone)]
pub struct RecordedCommit {
    pub message: String,
    pub path: PathBuf,
    /// File content at the moment of the commit
    pub content: String,
}

/// History that records commits and measures overlapping stage-commit spans
///
/// Every stage and commit sleeps for `delay`, giving concurrent tasks a chance
/// to interleave if nothing serializes them. Watched files are compared
/// against their last committed content on every stage and commit; a change
/// to any file other than the one being committed counts as a foreign write.
pub struct RecordingHistory {
    delay: Duration,
    staged: Mutex<Option<PathBuf>>,
    commits: Mutex<Vec<RecordedCommit>>,
    committed: Mutex<HashMap<PathBuf, String>>,
    active: AtomicUsize,
    max_active: AtomicUsize,
    foreign_writes: AtomicUsize,
    discarded: AtomicUsize,
}

impl RecordingHistory {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            staged: Mutex::new(None),
            commits: Mutex::new(Vec::new()),
            committed: Mutex::new(HashMap::new()),
            active: AtomicUsize::new(0),
            max_active: AtomicUsize::new(0),
            foreign_writes: AtomicUsize::new(0),
            discarded: AtomicUsize::new(0),
        }
    }

    /// Like [`RecordingHistory::new`], snapshotting `paths` as committed
    pub fn watching(delay: Duration, paths: &[PathBuf]) -> Self {
        let history = Self::new(delay);
        {
            let mut committed = history.committed.lock().unwrap();
            for path in paths {
                committed.insert(path.clone(), std::fs::read_to_string(path).unwrap());
            }
        }
        history
    }

    /// Writes to other watched files seen inside a stage-commit span
    pub fn foreign_writes(&self) -> usize {
        self.foreign_writes.load(Ordering::SeqCst)
    }

    fn check_other_files(&self, own: &Path) {
        let committed = self.committed.lock().unwrap().clone();
        for (path, content) in committed {
            if path != own && std::fs::read_to_string(&path).unwrap() != content {
                self.foreign_writes.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    pub fn commits(&self) -> Vec<RecordedCommit> {
        self.commits.lock().unwrap().clone()
    }

    /// Highest number of stage-commit spans ever open at once
    pub fn max_overlap(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }

    pub fn discard_count(&self) -> usize {
        self.discarded.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl History for RecordingHistory {
    async fn discard_changes(&self) -> Result<(), HistoryError> {
        self.discarded.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn stage(&self, path: &Path) -> Result<(), HistoryError> {
        let active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(active, Ordering::SeqCst);
        *self.staged.lock().unwrap() = Some(path.to_path_buf());
        self.check_other_files(path);

        tokio::time::sleep(self.delay).await;
        Ok(())
    }

    async fn commit(&self, message: &str) -> Result<(), HistoryError> {
        tokio::time::sleep(self.delay).await;

        let staged = self.staged.lock().unwrap().take();
        let Some(path) = staged else {
            return Err(HistoryError::CommandFailed {
                command: "commit".to_string(),
                stderr: "nothing staged".to_string(),
            });
        };

        self.check_other_files(&path);
        let content = tokio::fs::read_to_string(&path).await?;
        self.committed
            .lock()
            .unwrap()
            .entry(path.clone())
            .and_modify(|c| *c = content.clone());
        self.commits.lock().unwrap().push(RecordedCommit {
            message: message.to_string(),
            path,
            content,
        });
        self.active.fetch_sub(1, Ordering::SeqCst);
        Ok(())
    }
}
