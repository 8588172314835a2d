// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Batch rename job
//!
//! A [`BatchJob`] walks a list of image paths on a dedicated tokio task,
//! captions each image, renames it and records one [`Outcome`] per file.
//! Progress is reported over an unbounded channel so the caller's own loop
//! never blocks on the worker.
//!
//! ```text
//! Idle -> Running -> Completed
//!            \-> StopRequested -> Completed
//! ```
//!
//! Cancellation is cooperative: the stop flag is checked once before each
//! file, so the file in flight always finishes and is recorded.
//!
//! At most one job runs per process, whichever `BatchJob` started it.

mod worker;

pub use worker::{process_image, CAPTION_FAILED, INVALID_IMAGE, NO_FREE_NAME};

use serde::Serialize;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::watch;
use tracing::info;
use uuid::Uuid;

use crate::audit::{Action, AuditLog, Outcome};
use crate::oracle::CaptionOracle;
use crate::validate::has_image_extension;
use crate::{NamifyError, Result};
use worker::Worker;

/// Lifecycle of a job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum JobState {
    Idle,
    Running,
    StopRequested,
    Completed,
}

impl JobState {
    /// Running or winding down after a stop request
    pub fn is_active(&self) -> bool {
        matches!(self, JobState::Running | JobState::StopRequested)
    }
}

/// How a job ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TerminalStatus {
    /// Every file was processed
    Completed,
    /// A stop request ended the job early
    Stopped,
    /// No image files were supplied
    NoWork,
}

/// Events sent to the presentation layer
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// The filtered file list is known and non-empty
    Started { total: usize },
    /// One file finished; `index` is 1-based
    File {
        index: usize,
        total: usize,
        outcome: Outcome,
    },
    /// Sent exactly once per job
    Finished(TerminalStatus),
}

/// Filename generation knobs
#[derive(Debug, Clone)]
pub struct NamingRules {
    pub token_length: usize,
    /// Extra attempts when a generated name already exists
    pub collision_retries: u32,
}

impl Default for NamingRules {
    fn default() -> Self {
        Self {
            token_length: 5,
            collision_retries: 5,
        }
    }
}

/// Options captured when a job starts
#[derive(Debug, Clone, Default)]
pub struct ProcessingOptions {
    /// Insert today's date into new filenames
    pub append_date: bool,
    /// Directory shown in outcomes; not used to resolve paths
    pub base_directory: String,
    pub naming: NamingRules,
}

/// Result of a finished job
#[derive(Debug, Clone, Serialize)]
pub struct JobSummary {
    pub id: Uuid,
    pub status: TerminalStatus,
    /// Image files presented to the job
    pub total: usize,
    pub renamed: usize,
    pub skipped: usize,
    pub errors: usize,
}

impl JobSummary {
    fn from_log(id: Uuid, status: TerminalStatus, total: usize, log: &AuditLog) -> Self {
        Self {
            id,
            status,
            total,
            renamed: log.count(Action::Renamed),
            skipped: log.count(Action::Skipped),
            errors: log.count(Action::Error),
        }
    }

    /// Files that produced an outcome
    pub fn processed(&self) -> usize {
        self.renamed + self.skipped + self.errors
    }
}

/// Set while a job is running anywhere in the process
static ACTIVE: AtomicBool = AtomicBool::new(false);

/// The process-wide job slot; released when dropped
pub(crate) struct ActiveClaim(());

impl ActiveClaim {
    fn acquire() -> Option<Self> {
        ACTIVE
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| ActiveClaim(()))
    }

    fn held() -> bool {
        ACTIVE.load(Ordering::SeqCst)
    }
}

impl Drop for ActiveClaim {
    fn drop(&mut self) {
        ACTIVE.store(false, Ordering::SeqCst);
    }
}

/// Summary of one job, `None` until its worker finishes
type SummaryWatch = watch::Receiver<Option<JobSummary>>;

pub(crate) struct JobShared {
    state: Mutex<JobState>,
    stop: AtomicBool,
    audit: Mutex<AuditLog>,
    finished: Mutex<Option<SummaryWatch>>,
}

/// Lock a mutex, carrying on with the data if a holder panicked
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Controller for batch rename jobs (cheap to clone, all clones share state)
#[derive(Clone)]
pub struct BatchJob {
    shared: Arc<JobShared>,
}

impl Default for BatchJob {
    fn default() -> Self {
        Self::new()
    }
}

impl BatchJob {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(JobShared {
                state: Mutex::new(JobState::Idle),
                stop: AtomicBool::new(false),
                audit: Mutex::new(AuditLog::new()),
                finished: Mutex::new(None),
            }),
        }
    }

    /// Start processing `paths` in the order given.
    ///
    /// Paths without an image extension are dropped. Fails with
    /// [`NamifyError::JobAlreadyRunning`] while a job is active in this
    /// process (started through any `BatchJob`) and
    /// with [`NamifyError::OracleUnavailable`] if the oracle cannot serve
    /// requests; in both cases the state is left untouched.
    pub async fn start(
        &self,
        paths: Vec<PathBuf>,
        options: ProcessingOptions,
        oracle: Arc<dyn CaptionOracle>,
        progress: UnboundedSender<ProgressEvent>,
    ) -> Result<()> {
        if self.state().is_active() || ActiveClaim::held() {
            return Err(NamifyError::JobAlreadyRunning);
        }

        let presented = paths.len();
        let images: Vec<PathBuf> = paths.into_iter().filter(|p| has_image_extension(p)).collect();
        info!("{} of {} path(s) are images", images.len(), presented);

        if !images.is_empty() {
            oracle.check_available().await.map_err(|e| match e {
                NamifyError::OracleUnavailable(_) => e,
                other => NamifyError::OracleUnavailable(other.to_string()),
            })?;
        }

        let claim = {
            let mut state = lock(&self.shared.state);
            if state.is_active() {
                return Err(NamifyError::JobAlreadyRunning);
            }
            let claim = ActiveClaim::acquire().ok_or(NamifyError::JobAlreadyRunning)?;
            self.shared.stop.store(false, Ordering::SeqCst);
            lock(&self.shared.audit).clear();
            *state = JobState::Running;
            claim
        };

        let id = Uuid::new_v4();

        if images.is_empty() {
            info!("Job {}: no image files found to process", id);
            let summary = JobSummary::from_log(id, TerminalStatus::NoWork, 0, &AuditLog::new());
            let (_, finished) = watch::channel(Some(summary));
            *lock(&self.shared.finished) = Some(finished);
            *lock(&self.shared.state) = JobState::Completed;
            drop(claim);
            let _ = progress.send(ProgressEvent::Finished(TerminalStatus::NoWork));
            return Ok(());
        }

        let (publish, finished) = watch::channel(None);
        *lock(&self.shared.finished) = Some(finished);

        let worker = Worker {
            id,
            shared: Arc::clone(&self.shared),
            images,
            options,
            oracle,
            progress,
            claim,
            publish,
        };
        tokio::spawn(worker.run());

        Ok(())
    }

    /// Ask the running job to stop before its next file.
    ///
    /// Idempotent and non-blocking; ignored when no job is active.
    pub fn request_stop(&self) {
        let mut state = lock(&self.shared.state);
        if *state == JobState::Running {
            self.shared.stop.store(true, Ordering::SeqCst);
            *state = JobState::StopRequested;
            info!("Stop requested");
        }
    }

    /// Clear the audit log and return to `Idle`
    pub fn reset(&self) -> Result<()> {
        let mut state = lock(&self.shared.state);
        if state.is_active() {
            return Err(NamifyError::InvalidState(
                "cannot reset while a job is running".to_string(),
            ));
        }
        lock(&self.shared.audit).clear();
        *lock(&self.shared.finished) = None;
        self.shared.stop.store(false, Ordering::SeqCst);
        *state = JobState::Idle;
        Ok(())
    }

    /// Wait for the current job to finish.
    ///
    /// Any number of clones may wait at once. A job started after this
    /// call began does not change what it returns.
    pub async fn wait(&self) -> Result<JobSummary> {
        let mut finished = lock(&self.shared.finished)
            .clone()
            .ok_or_else(|| NamifyError::InvalidState("no job has been started".to_string()))?;

        let summary = finished
            .wait_for(Option::is_some)
            .await
            .map_err(|_| NamifyError::InvalidState("job worker exited without a summary".to_string()))?
            .clone();

        summary.ok_or_else(|| NamifyError::InvalidState("job has no summary".to_string()))
    }

    pub fn state(&self) -> JobState {
        *lock(&self.shared.state)
    }

    /// Snapshot of the outcomes recorded so far
    pub fn outcomes(&self) -> Vec<Outcome> {
        lock(&self.shared.audit).outcomes().to_vec()
    }

    /// Snapshot of the audit log
    pub fn audit_log(&self) -> AuditLog {
        lock(&self.shared.audit).clone()
    }
}
