//! File update pipeline
//!
//! # Modules
//!
//! - [`document`]: Multi-document container files on disk
//! - [`history`]: Staging and committing rewritten files
//! - [`file`]: Sequential per-file update with a shared critical section
//! - [`orchestrator`]: Concurrent processing of every container file

pub mod document;
pub mod file;
pub mod history;
pub mod orchestrator;

use std::path::PathBuf;

use thiserror::Error;

pub use document::{ContainerFile, DocumentError};
pub use file::FilePipeline;
pub use history::{GitHistory, History, HistoryError};
pub use orchestrator::{RunSummary, Updater};

/// Failures that abort one file task
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error(transparent)]
    History(#[from] HistoryError),

    #[error("Failed to list {path}: {source}")]
    Discover {
        path: PathBuf,
        source: std::io::Error,
    },
}
