// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Per-file processing run by the job worker

use std::path::{Path, PathBuf};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::watch;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{lock, ActiveClaim, JobShared, JobState, JobSummary, ProcessingOptions, ProgressEvent, TerminalStatus};
use crate::audit::Outcome;
use crate::naming::{build_filename, normalize_caption, uniqueness_token};
use crate::naming::filename::dotted_extension;
use crate::oracle::CaptionOracle;
use crate::validate::is_valid_image;

pub const INVALID_IMAGE: &str = "Invalid image file";
pub const CAPTION_FAILED: &str = "Failed to generate caption";
pub const NO_FREE_NAME: &str = "Could not find a free filename";

/// Everything the worker task owns for one job
pub(super) struct Worker {
    pub id: Uuid,
    pub shared: Arc<JobShared>,
    pub images: Vec<PathBuf>,
    pub options: ProcessingOptions,
    pub oracle: Arc<dyn CaptionOracle>,
    pub progress: UnboundedSender<ProgressEvent>,
    pub claim: ActiveClaim,
    pub publish: watch::Sender<Option<JobSummary>>,
}

impl Worker {
    pub async fn run(self) {
        let total = self.images.len();
        info!("Job {}: found {} image(s) to process", self.id, total);
        // A closed receiver only means nobody is watching
        let _ = self.progress.send(ProgressEvent::Started { total });

        let mut status = TerminalStatus::Completed;
        for (i, path) in self.images.iter().enumerate() {
            if self.shared.stop.load(Ordering::SeqCst) {
                info!("Job {}: processing stopped by user", self.id);
                status = TerminalStatus::Stopped;
                break;
            }

            info!("Processing image {} of {}: {}", i + 1, total, basename(path));
            let outcome = process_image(path, &self.options, self.oracle.as_ref()).await;
            info!("{}", outcome);

            lock(&self.shared.audit).append(outcome.clone());
            let _ = self.progress.send(ProgressEvent::File {
                index: i + 1,
                total,
                outcome,
            });
        }

        let summary = JobSummary::from_log(self.id, status, total, &lock(&self.shared.audit));
        *lock(&self.shared.state) = JobState::Completed;
        // Free the slot before anyone hears about it
        drop(self.claim);
        self.publish.send_replace(Some(summary));
        let _ = self.progress.send(ProgressEvent::Finished(status));
        info!("Job {} finished: {:?}", self.id, status);
    }
}

/// Validate, caption and rename one file
pub async fn process_image(
    path: &Path,
    options: &ProcessingOptions,
    oracle: &dyn CaptionOracle,
) -> Outcome {
    let original_name = basename(path);
    let directory = options.base_directory.clone();

    if !is_valid_image(path) {
        return Outcome::skipped(original_name, INVALID_IMAGE, directory);
    }

    let caption = match oracle.caption(path).await {
        Ok(text) if !text.trim().is_empty() => text,
        Ok(_) => {
            warn!("{} returned an empty caption for {:?}", oracle.name(), path);
            return Outcome::error(original_name, CAPTION_FAILED, directory);
        }
        Err(e) => {
            warn!("{} failed on {:?}: {}", oracle.name(), path, e);
            return Outcome::error(original_name, CAPTION_FAILED, directory);
        }
    };

    let normalized = normalize_caption(&caption);
    debug!("Caption {:?} normalized to {:?}", caption, normalized);

    let parent = path.parent().unwrap_or_else(|| Path::new(""));
    let extension = dotted_extension(path);
    let new_name = match pick_free_name(parent, options.naming.collision_retries, || {
        build_filename(
            &normalized,
            options.append_date,
            &uniqueness_token(options.naming.token_length),
            &extension,
        )
    }) {
        Some(name) => name,
        None => {
            warn!("Every candidate name for {:?} already exists", path);
            return Outcome::error(original_name, NO_FREE_NAME, directory);
        }
    };

    match std::fs::rename(path, parent.join(&new_name)) {
        Ok(()) => Outcome::renamed(original_name, new_name, directory),
        Err(e) => {
            warn!("Rename of {:?} failed: {}", path, e);
            Outcome::error(original_name, e.to_string(), directory)
        }
    }
}

/// First candidate from `next_name` that does not exist in `parent`.
///
/// Tries once plus `retries` more times.
fn pick_free_name(
    parent: &Path,
    retries: u32,
    mut next_name: impl FnMut() -> String,
) -> Option<String> {
    (0..=retries).map(|_| next_name()).find(|name| {
        let taken = parent.join(name).exists();
        if taken {
            debug!("Candidate {:?} already exists, retrying", name);
        }
        !taken
    })
}

fn basename(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}
