//! Shared utilities for integration tests
#![allow(dead_code, unused_imports)]

mod history;
mod registry;

pub use history::{RecordedCommit, RecordingHistory};
pub use registry::{StaticRegistry, create_test_pipeline, create_test_resolver};

use std::path::{Path, PathBuf};

/// Write `content` to `folder/name` and return the path
pub fn write_container_file(folder: &Path, name: &str, content: &str) -> PathBuf {
    let path = folder.join(name);
    std::fs::write(&path, content).unwrap();
    path
}
