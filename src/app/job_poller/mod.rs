// Job poller - Tracks a remote merge job from submission to a verified output

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::domain::errors::DomainError;
use crate::domain::model::JobStatus;
use crate::ports::*;

/// Delay between two status checks
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(2000);

/// Consecutive failed status checks tolerated before giving up
pub const DEFAULT_MAX_POLL_FAILURES: u32 = 3;

/// Extension of the merged artifact
pub const OUTPUT_EXTENSION: &str = ".mp4";

pub const MISSING_OUTPUT_STAGE: &str = "File processing error";
pub const MISSING_OUTPUT_MESSAGE: &str = "Unable to access the merged file. Please try again.";

const START_STAGE: &str = "Starting merge process...";
const START_FAILED_STAGE: &str = "Request failed";
const START_FAILED_MESSAGE: &str = "Failed to start merge process";
const REMOTE_FAILED_STAGE: &str = "failed";
const REMOTE_FAILED_MESSAGE: &str = "Unknown error occurred";
const STATUS_CHECK_FAILED_STAGE: &str = "Status check failed";

/// Poll timing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    pub interval: Duration,
    pub max_failures: u32,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            max_failures: DEFAULT_MAX_POLL_FAILURES,
        }
    }
}

/// Job id from a result-path hint: `/abc123.mp4` -> `abc123`
pub fn tracking_id(result_path: &str) -> String {
    let trimmed = result_path.strip_prefix('/').unwrap_or(result_path);
    trimmed
        .strip_suffix(OUTPUT_EXTENSION)
        .unwrap_or(trimmed)
        .to_string()
}

/// File name the existence check is asked about
pub fn artifact_name(job_id: &str) -> String {
    format!("{}{}", job_id, OUTPUT_EXTENSION)
}

/// Current status plus the generation allowed to change it.
///
/// Every `start` and `reset` opens a new generation. Writers from an older
/// generation are refused, so a response that lands after a reset or restart
/// cannot overwrite the newer state.
struct StatusCell {
    generation: Mutex<u64>,
    tx: watch::Sender<JobStatus>,
}

impl StatusCell {
    fn new() -> Self {
        let (tx, _rx) = watch::channel(JobStatus::Idle);
        Self {
            generation: Mutex::new(0),
            tx,
        }
    }

    fn lock_generation(&self) -> MutexGuard<'_, u64> {
        self.generation
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn advance(&self, status: JobStatus) -> u64 {
        let mut generation = self.lock_generation();
        *generation += 1;
        self.tx.send_replace(status);
        *generation
    }

    fn is_current(&self, generation: u64) -> bool {
        *self.lock_generation() == generation
    }

    fn publish(&self, generation: u64, status: JobStatus) -> bool {
        self.update(generation, |_| status)
    }

    fn update(&self, generation: u64, next: impl FnOnce(&JobStatus) -> JobStatus) -> bool {
        let current_generation = self.lock_generation();
        if *current_generation != generation {
            return false;
        }
        let status = {
            let current = self.tx.borrow();
            next(&current)
        };
        self.tx.send_replace(status);
        true
    }
}

struct ActivePoll {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

/// Submits a merge job and follows it until it completes, fails or is reset.
///
/// At most one poll task runs at a time. Dropping the poller cancels it.
pub struct JobPoller {
    api: Arc<dyn JobApiPort>,
    settings: PollSettings,
    cell: Arc<StatusCell>,
    active: Mutex<Option<ActivePoll>>,
}

impl JobPoller {
    pub fn new(api: Arc<dyn JobApiPort>, settings: PollSettings) -> Self {
        Self {
            api,
            settings,
            cell: Arc::new(StatusCell::new()),
            active: Mutex::new(None),
        }
    }

    pub fn settings(&self) -> PollSettings {
        self.settings
    }

    /// Snapshot of the current status
    pub fn status(&self) -> JobStatus {
        self.cell.tx.borrow().clone()
    }

    /// Receiver notified on every status change
    pub fn subscribe(&self) -> watch::Receiver<JobStatus> {
        self.cell.tx.subscribe()
    }

    /// A poll task is running
    pub fn is_polling(&self) -> bool {
        self.lock_active()
            .as_ref()
            .map_or(false, |active| !active.handle.is_finished())
    }

    /// Submit `request` as a new job, discarding whatever came before.
    ///
    /// Returns the status right after the submission answered: `Processing`
    /// (with polling started when the upstream gave a result path) or `Failed`.
    pub async fn start(&self, request: &MergeRequest) -> JobStatus {
        self.stop_polling();
        let generation = self.cell.advance(JobStatus::Starting);
        info!(clips = request.videos.len(), generation, "Submitting merge job");

        let envelope = match self.api.start_job(request).await {
            Ok(envelope) => envelope,
            Err(err) => {
                warn!(error = %err, "Merge submission failed");
                self.cell.publish(generation, submission_failure(&err));
                return self.status();
            }
        };

        let (status, job_id) = interpret_envelope(&envelope);
        if !self.cell.publish(generation, status) {
            debug!(generation, "Merge submission superseded");
            return self.status();
        }

        match job_id {
            Some(job_id) if matches!(self.status(), JobStatus::Processing { .. }) => {
                info!(job_id = %job_id, "Merge job accepted, polling for status");
                self.spawn_poll(generation, job_id);
            }
            None if envelope.status.as_deref() != Some("error") => {
                warn!("Merge job accepted without a result path; status cannot be tracked");
            }
            _ => {}
        }

        self.status()
    }

    /// Back to `Idle` from any state, stopping any poll in progress
    pub fn reset(&self) {
        self.stop_polling();
        self.cell.advance(JobStatus::Idle);
        info!("Merge status reset");
    }

    /// Cancel the poll task and wait for it to exit
    pub async fn stop(&self) {
        let active = self.lock_active().take();
        if let Some(active) = active {
            active.token.cancel();
            if let Err(err) = active.handle.await {
                warn!(error = %err, "Poll task ended abnormally");
            }
        }
    }

    /// Resolves once nothing is in flight: terminal, idle, or processing
    /// without a trackable job.
    pub async fn wait_for_settled(&self) -> JobStatus {
        let mut rx = self.subscribe();
        loop {
            // Clone before touching `active` so the watch lock is never held with it
            let current = rx.borrow_and_update().clone();
            let untracked = matches!(current, JobStatus::Processing { .. }) && !self.is_polling();
            if !current.is_active() || untracked {
                return current;
            }
            if rx.changed().await.is_err() {
                return rx.borrow().clone();
            }
        }
    }

    fn lock_active(&self) -> MutexGuard<'_, Option<ActivePoll>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn stop_polling(&self) {
        if let Some(active) = self.lock_active().take() {
            active.token.cancel();
            debug!("Poll task cancelled");
        }
    }

    fn spawn_poll(&self, generation: u64, job_id: String) {
        let token = CancellationToken::new();
        let handle = tokio::spawn(poll_loop(
            Arc::clone(&self.api),
            Arc::clone(&self.cell),
            self.settings,
            generation,
            job_id,
            token.clone(),
        ));

        let mut active = self.lock_active();
        if let Some(previous) = active.replace(ActivePoll {
            token: token.clone(),
            handle,
        }) {
            previous.token.cancel();
        }
        // A reset may have slipped in between publishing and spawning
        if !self.cell.is_current(generation) {
            token.cancel();
        }
    }
}

impl Drop for JobPoller {
    fn drop(&mut self) {
        self.stop_polling();
    }
}

fn submission_failure(err: &DomainError) -> JobStatus {
    let error_message = match err {
        DomainError::Upstream {
            message: Some(msg), ..
        } => msg.clone(),
        DomainError::Upstream { message: None, .. } => START_FAILED_MESSAGE.to_string(),
        other => other.user_message(),
    };
    JobStatus::Failed {
        stage: START_FAILED_STAGE.to_string(),
        error_message,
    }
}

fn interpret_envelope(envelope: &JobEnvelope) -> (JobStatus, Option<String>) {
    if envelope.status.as_deref() == Some("error") {
        let status = JobStatus::Failed {
            stage: envelope
                .stage
                .clone()
                .unwrap_or_else(|| START_FAILED_STAGE.to_string()),
            error_message: envelope
                .error
                .clone()
                .unwrap_or_else(|| START_FAILED_MESSAGE.to_string()),
        };
        return (status, None);
    }

    let status = JobStatus::Processing {
        progress: envelope.progress.unwrap_or(0.0),
        stage: envelope
            .stage
            .clone()
            .unwrap_or_else(|| START_STAGE.to_string()),
    };
    let job_id = envelope
        .url
        .as_deref()
        .map(tracking_id)
        .filter(|id| !id.is_empty());
    (status, job_id)
}

fn verified_status(job_id: &str, check: Result<FileCheck, DomainError>) -> JobStatus {
    match check {
        Ok(FileCheck { exists: true, path }) => JobStatus::Completed {
            result_path: path.unwrap_or_else(|| format!("/{}", artifact_name(job_id))),
        },
        Ok(_) => {
            warn!(job_id, "Merged file not found");
            missing_output()
        }
        Err(err) => {
            warn!(job_id, error = %err, "Existence check failed");
            missing_output()
        }
    }
}

fn missing_output() -> JobStatus {
    JobStatus::Failed {
        stage: MISSING_OUTPUT_STAGE.to_string(),
        error_message: MISSING_OUTPUT_MESSAGE.to_string(),
    }
}

async fn poll_loop(
    api: Arc<dyn JobApiPort>,
    cell: Arc<StatusCell>,
    settings: PollSettings,
    generation: u64,
    job_id: String,
    token: CancellationToken,
) {
    let mut ticker = interval_at(Instant::now() + settings.interval, settings.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut failures = 0u32;

    loop {
        tokio::select! {
            biased;
            _ = token.cancelled() => break,
            _ = ticker.tick() => {}
        }
        if !cell.is_current(generation) {
            break;
        }

        let report = tokio::select! {
            biased;
            _ = token.cancelled() => break,
            report = api.check_status(&job_id) => report,
        };

        let report = match report {
            Ok(report) => {
                failures = 0;
                report
            }
            Err(err) => {
                failures += 1;
                warn!(job_id = %job_id, failures, error = %err, "Status check failed");
                if failures >= settings.max_failures {
                    cell.publish(
                        generation,
                        JobStatus::Failed {
                            stage: STATUS_CHECK_FAILED_STAGE.to_string(),
                            error_message: err.user_message(),
                        },
                    );
                    break;
                }
                continue;
            }
        };

        match report.status {
            RemoteJobState::Completed => {
                info!(job_id = %job_id, "Merge job completed, verifying output");
                let verifying = JobStatus::VerifyingOutput {
                    job_id: job_id.clone(),
                };
                if !cell.publish(generation, verifying) {
                    break;
                }
                let artifact = artifact_name(&job_id);
                let check = tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    check = api.check_file(&artifact) => check,
                };
                let status = verified_status(&job_id, check);
                info!(job_id = %job_id, status = %status, "Merge job finished");
                cell.publish(generation, status);
                break;
            }
            RemoteJobState::Error => {
                let status = JobStatus::Failed {
                    stage: report
                        .stage
                        .unwrap_or_else(|| REMOTE_FAILED_STAGE.to_string()),
                    error_message: report
                        .error
                        .unwrap_or_else(|| REMOTE_FAILED_MESSAGE.to_string()),
                };
                warn!(job_id = %job_id, status = %status, "Merge job failed upstream");
                cell.publish(generation, status);
                break;
            }
            RemoteJobState::Processing | RemoteJobState::Unknown => {
                let applied = cell.update(generation, |current| match current {
                    JobStatus::Processing { progress, stage } => JobStatus::Processing {
                        progress: report.progress.unwrap_or(*progress),
                        stage: report.stage.clone().unwrap_or_else(|| stage.clone()),
                    },
                    other => other.clone(),
                });
                if !applied {
                    break;
                }
                debug!(job_id = %job_id, progress = ?report.progress, "Merge job progress");
            }
        }
    }

    debug!(job_id = %job_id, generation, "Poll loop finished");
}

#[cfg(test)]
mod tests;
