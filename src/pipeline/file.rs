//! Per-file update pipeline
//!
//! Containers of one file are resolved in document order. Each positive
//! decision rewrites the file, stages it and commits it while holding the
//! lock shared by all file tasks, so no other task can write between this
//! file's disk write and its commit.

use std::path::Path;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{Level, debug, error, info, warn};

use crate::config::ImageOverride;
use crate::pipeline::PipelineError;
use crate::pipeline::document::ContainerFile;
use crate::pipeline::history::History;
use crate::version::error::SkipReason;
use crate::version::resolver::{UpdateDecision, UpdateResolver};

pub struct FilePipeline {
    resolver: Arc<UpdateResolver>,
    history: Arc<dyn History>,
    /// Guards the write-stage-commit sequence across all files
    lock: Mutex<()>,
    dry_run: bool,
}

impl FilePipeline {
    pub fn new(resolver: Arc<UpdateResolver>, history: Arc<dyn History>) -> Self {
        Self {
            resolver,
            history,
            lock: Mutex::new(()),
            dry_run: false,
        }
    }

    /// Resolve and log decisions without writing or committing
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Update every container of `path`
    ///
    /// Returns the number of committed updates. Containers that cannot be
    /// resolved are logged and skipped; write or history failures abort the
    /// remaining containers of this file.
    pub async fn process_file(&self, path: &Path) -> Result<usize, PipelineError> {
        let mut file = ContainerFile::load(path).await?;
        let mut updated = 0;

        for index in 0..file.len() {
            let Some((image, inline)) = Self::container_settings(&file, index) else {
                continue;
            };

            let decision = match self.resolver.resolve(&image, inline.as_ref()).await {
                Ok(decision) => decision,
                Err(reason) => {
                    log_skip(&image, &reason);
                    continue;
                }
            };

            if self.dry_run {
                info!(
                    "{}: Would update to {} (dry run).",
                    decision.full_image, decision.tag
                );
                continue;
            }

            self.apply(&mut file, index, &decision).await?;
            updated += 1;
            info!("{}: Updated to {}.", decision.full_image, decision.tag);
        }

        Ok(updated)
    }

    /// Image and inline override of document `index`; `None` skips the document
    fn container_settings(
        file: &ContainerFile,
        index: usize,
    ) -> Option<(String, Option<ImageOverride>)> {
        let Some(image) = file.image(index) else {
            warn!(
                "{}: Document {} has no image, skipping.",
                file.path().display(),
                index
            );
            return None;
        };

        let container = file.container(index)?;
        match ImageOverride::from_document(image, container) {
            Ok(inline) => Some((image.to_string(), inline)),
            Err(e) => {
                warn!("{}: {}", image, e);
                None
            }
        }
    }

    /// Rewrite, stage and commit one decision inside the critical section
    async fn apply(
        &self,
        file: &mut ContainerFile,
        index: usize,
        decision: &UpdateDecision,
    ) -> Result<(), PipelineError> {
        let message = format!(
            "refactor({}): update {} to {}",
            file.stem(),
            decision.repository,
            decision.tag
        );

        let _guard = self.lock.lock().await;
        debug!("Entered critical section for {}", file.path().display());

        file.set_image(index, decision.image());
        file.save().await?;
        self.history.stage(file.path()).await?;
        self.history.commit(&message).await?;

        Ok(())
    }
}

fn log_skip(image: &str, reason: &SkipReason) {
    let level = reason.level();
    if level == Level::ERROR {
        error!("{}: {}", image, reason);
    } else if level == Level::WARN {
        warn!("{}: {}", image, reason);
    } else if level == Level::INFO {
        info!("{}: {}", image, reason);
    } else {
        debug!("{}: {}", image, reason);
    }
}
