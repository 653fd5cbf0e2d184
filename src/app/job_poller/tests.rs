// Unit tests for the merge job poller

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use super::*;

const TICK: Duration = Duration::from_millis(20);

struct ScriptedJobApi {
    start: Mutex<Result<JobEnvelope, DomainError>>,
    statuses: Mutex<VecDeque<Result<StatusReport, DomainError>>>,
    file_check: Mutex<Result<FileCheck, DomainError>>,
    file_delay: Duration,
    status_calls: AtomicUsize,
    polled_ids: Mutex<Vec<String>>,
    checked_files: Mutex<Vec<String>>,
}

impl ScriptedJobApi {
    fn new(start: Result<JobEnvelope, DomainError>) -> Self {
        Self {
            start: Mutex::new(start),
            statuses: Mutex::new(VecDeque::new()),
            file_check: Mutex::new(Ok(FileCheck::default())),
            file_delay: Duration::ZERO,
            status_calls: AtomicUsize::new(0),
            polled_ids: Mutex::new(Vec::new()),
            checked_files: Mutex::new(Vec::new()),
        }
    }

    fn accepting(url: &str) -> Self {
        Self::new(Ok(JobEnvelope {
            status: Some("processing".to_string()),
            progress: Some(0.0),
            stage: Some("queued".to_string()),
            url: Some(url.to_string()),
            error: None,
        }))
    }

    fn with_statuses(self, statuses: Vec<Result<StatusReport, DomainError>>) -> Self {
        *self.statuses.lock().unwrap() = statuses.into();
        self
    }

    fn with_file_check(self, check: Result<FileCheck, DomainError>) -> Self {
        *self.file_check.lock().unwrap() = check;
        self
    }

    fn with_file_delay(mut self, delay: Duration) -> Self {
        self.file_delay = delay;
        self
    }

    fn set_start(&self, start: Result<JobEnvelope, DomainError>) {
        *self.start.lock().unwrap() = start;
    }

    fn calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl JobApiPort for ScriptedJobApi {
    async fn start_job(&self, _request: &MergeRequest) -> Result<JobEnvelope, DomainError> {
        self.start.lock().unwrap().clone()
    }

    async fn check_status(&self, job_id: &str) -> Result<StatusReport, DomainError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        self.polled_ids.lock().unwrap().push(job_id.to_string());
        self.statuses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(processing(None, None)))
    }

    async fn check_file(&self, file_name: &str) -> Result<FileCheck, DomainError> {
        self.checked_files.lock().unwrap().push(file_name.to_string());
        tokio::time::sleep(self.file_delay).await;
        self.file_check.lock().unwrap().clone()
    }
}

fn processing(progress: Option<f64>, stage: Option<&str>) -> StatusReport {
    StatusReport {
        status: RemoteJobState::Processing,
        progress,
        stage: stage.map(str::to_string),
        error: None,
    }
}

fn completed() -> StatusReport {
    StatusReport {
        status: RemoteJobState::Completed,
        progress: Some(100.0),
        stage: Some("done".to_string()),
        error: None,
    }
}

fn request() -> MergeRequest {
    MergeRequest {
        videos: vec![MergeClip {
            position: 1,
            video_id: "dQw4w9WgXcQ".to_string(),
            start_time: "00:00:00".to_string(),
            end_time: "00:00:10".to_string(),
        }],
    }
}

fn poller(api: &Arc<ScriptedJobApi>) -> JobPoller {
    JobPoller::new(
        Arc::clone(api) as Arc<dyn JobApiPort>,
        PollSettings {
            interval: TICK,
            max_failures: 3,
        },
    )
}

async fn settle(poller: &JobPoller) -> JobStatus {
    tokio::time::timeout(Duration::from_secs(5), poller.wait_for_settled())
        .await
        .expect("poller did not settle")
}

#[test]
fn test_tracking_id_derivation() {
    assert_eq!(tracking_id("/abc123.mp4"), "abc123");
    assert_eq!(tracking_id("abc123.mp4"), "abc123");
    assert_eq!(tracking_id("/abc123"), "abc123");
    assert_eq!(tracking_id("/merged/abc.mp4"), "merged/abc");
    assert_eq!(artifact_name(&tracking_id("/abc123.mp4")), "abc123.mp4");
}

#[test]
fn test_status_cell_refuses_stale_generation() {
    let cell = StatusCell::new();
    let first = cell.advance(JobStatus::Starting);
    let second = cell.advance(JobStatus::Idle);

    assert!(!cell.publish(first, JobStatus::Starting));
    assert_eq!(*cell.tx.borrow(), JobStatus::Idle);
    assert!(cell.publish(second, JobStatus::Starting));
    assert_eq!(*cell.tx.borrow(), JobStatus::Starting);
}

#[tokio::test]
async fn test_completes_with_verified_path() {
    let api = Arc::new(
        ScriptedJobApi::accepting("/job42.mp4")
            .with_statuses(vec![
                Ok(processing(Some(10.0), Some("downloading"))),
                Ok(processing(Some(50.0), Some("merging"))),
                Ok(completed()),
            ])
            .with_file_check(Ok(FileCheck {
                exists: true,
                path: Some("/x.mp4".to_string()),
            })),
    );
    let poller = poller(&api);

    let started = poller.start(&request()).await;
    assert_eq!(
        started,
        JobStatus::Processing {
            progress: 0.0,
            stage: "queued".to_string()
        }
    );

    let status = settle(&poller).await;
    assert_eq!(
        status,
        JobStatus::Completed {
            result_path: "/x.mp4".to_string()
        }
    );
    assert!(api.polled_ids.lock().unwrap().iter().all(|id| id == "job42"));
    assert_eq!(*api.checked_files.lock().unwrap(), vec!["job42.mp4".to_string()]);
}

#[tokio::test]
async fn test_missing_output_fails_with_fixed_message() {
    let api = Arc::new(
        ScriptedJobApi::accepting("/job42.mp4")
            .with_statuses(vec![Ok(processing(Some(10.0), None)), Ok(completed())])
            .with_file_check(Ok(FileCheck {
                exists: false,
                path: None,
            })),
    );
    let poller = poller(&api);
    poller.start(&request()).await;

    assert_eq!(
        settle(&poller).await,
        JobStatus::Failed {
            stage: MISSING_OUTPUT_STAGE.to_string(),
            error_message: MISSING_OUTPUT_MESSAGE.to_string(),
        }
    );
}

#[tokio::test]
async fn test_observes_verifying_state() {
    let api = Arc::new(
        ScriptedJobApi::accepting("/job42.mp4")
            .with_statuses(vec![Ok(completed())])
            .with_file_check(Ok(FileCheck {
                exists: true,
                path: None,
            }))
            .with_file_delay(TICK * 2),
    );
    let poller = poller(&api);
    let mut rx = poller.subscribe();
    poller.start(&request()).await;

    let mut seen = Vec::new();
    loop {
        let status = rx.borrow_and_update().clone();
        let done = status.is_terminal();
        seen.push(status);
        if done {
            break;
        }
        tokio::time::timeout(Duration::from_secs(5), rx.changed())
            .await
            .unwrap()
            .unwrap();
    }

    assert!(seen.contains(&JobStatus::VerifyingOutput {
        job_id: "job42".to_string()
    }));
    assert_eq!(
        seen.last(),
        Some(&JobStatus::Completed {
            result_path: "/job42.mp4".to_string()
        })
    );
}

#[tokio::test]
async fn test_remote_error_uses_upstream_fields() {
    let api = Arc::new(ScriptedJobApi::accepting("/job42.mp4").with_statuses(vec![Ok(
        StatusReport {
            status: RemoteJobState::Error,
            progress: None,
            stage: Some("encoding".to_string()),
            error: Some("codec exploded".to_string()),
        },
    )]));
    let poller = poller(&api);
    poller.start(&request()).await;

    assert_eq!(
        settle(&poller).await,
        JobStatus::Failed {
            stage: "encoding".to_string(),
            error_message: "codec exploded".to_string(),
        }
    );
}

#[tokio::test]
async fn test_remote_error_defaults() {
    let api = Arc::new(ScriptedJobApi::accepting("/job42.mp4").with_statuses(vec![Ok(
        StatusReport {
            status: RemoteJobState::Error,
            progress: None,
            stage: None,
            error: None,
        },
    )]));
    let poller = poller(&api);
    poller.start(&request()).await;

    assert_eq!(
        settle(&poller).await,
        JobStatus::Failed {
            stage: "failed".to_string(),
            error_message: "Unknown error occurred".to_string(),
        }
    );
}

#[tokio::test]
async fn test_progress_keeps_previous_fields() {
    let api = Arc::new(ScriptedJobApi::accepting("/job42.mp4").with_statuses(vec![
        Ok(processing(Some(30.0), Some("downloading"))),
        Ok(processing(None, None)),
    ]));
    let poller = poller(&api);
    poller.start(&request()).await;

    while api.calls() < 3 {
        tokio::time::sleep(TICK).await;
    }
    assert_eq!(
        poller.status(),
        JobStatus::Processing {
            progress: 30.0,
            stage: "downloading".to_string()
        }
    );
    poller.reset();
}

#[tokio::test]
async fn test_start_upstream_rejection() {
    let api = Arc::new(ScriptedJobApi::new(Err(DomainError::Upstream {
        status: 400,
        message: Some("too many videos".to_string()),
    })));
    let poller = poller(&api);

    assert_eq!(
        poller.start(&request()).await,
        JobStatus::Failed {
            stage: "Request failed".to_string(),
            error_message: "too many videos".to_string(),
        }
    );
    assert!(!poller.is_polling());

    api.set_start(Err(DomainError::Upstream {
        status: 500,
        message: None,
    }));
    assert_eq!(
        poller.start(&request()).await,
        JobStatus::Failed {
            stage: "Request failed".to_string(),
            error_message: "Failed to start merge process".to_string(),
        }
    );
}

#[tokio::test]
async fn test_start_network_error_is_generic() {
    let api = Arc::new(ScriptedJobApi::new(Err(DomainError::Network(
        "connection refused (os error 111)".to_string(),
    ))));
    let poller = poller(&api);

    assert_eq!(
        poller.start(&request()).await,
        JobStatus::Failed {
            stage: "Request failed".to_string(),
            error_message: "Network error, please try again".to_string(),
        }
    );
    tokio::time::sleep(TICK * 3).await;
    assert_eq!(api.calls(), 0);
}

#[tokio::test]
async fn test_start_without_path_does_not_poll() {
    let api = Arc::new(ScriptedJobApi::new(Ok(JobEnvelope::default())));
    let poller = poller(&api);

    let status = poller.start(&request()).await;
    assert_eq!(
        status,
        JobStatus::Processing {
            progress: 0.0,
            stage: "Starting merge process...".to_string()
        }
    );
    assert_eq!(settle(&poller).await, status);
    tokio::time::sleep(TICK * 3).await;
    assert_eq!(api.calls(), 0);
}

#[tokio::test]
async fn test_reset_mid_poll_stops_requests() {
    let api = Arc::new(ScriptedJobApi::accepting("/job42.mp4"));
    let poller = poller(&api);
    poller.start(&request()).await;

    while api.calls() < 2 {
        tokio::time::sleep(TICK).await;
    }
    poller.reset();
    assert_eq!(poller.status(), JobStatus::Idle);

    let calls = api.calls();
    tokio::time::sleep(TICK * 5).await;
    assert_eq!(api.calls(), calls);
    assert!(!poller.is_polling());
    assert_eq!(poller.status(), JobStatus::Idle);
}

#[tokio::test]
async fn test_restart_replaces_previous_poll() {
    let api = Arc::new(ScriptedJobApi::accepting("/first.mp4"));
    let poller = poller(&api);
    poller.start(&request()).await;
    while api.calls() < 2 {
        tokio::time::sleep(TICK).await;
    }

    api.set_start(Ok(JobEnvelope {
        status: Some("processing".to_string()),
        url: Some("/second.mp4".to_string()),
        ..JobEnvelope::default()
    }));
    poller.start(&request()).await;
    api.polled_ids.lock().unwrap().clear();

    let calls = api.calls();
    while api.calls() < calls + 3 {
        tokio::time::sleep(TICK).await;
    }
    assert!(api
        .polled_ids
        .lock()
        .unwrap()
        .iter()
        .all(|id| id == "second"));
    poller.stop().await;
    assert!(!poller.is_polling());
}

#[tokio::test]
async fn test_drop_cancels_polling() {
    let api = Arc::new(ScriptedJobApi::accepting("/job42.mp4"));
    {
        let poller = poller(&api);
        poller.start(&request()).await;
        while api.calls() < 1 {
            tokio::time::sleep(TICK).await;
        }
    }

    let calls = api.calls();
    tokio::time::sleep(TICK * 5).await;
    assert_eq!(api.calls(), calls);
}

#[tokio::test]
async fn test_transient_status_failures_are_retried() {
    let api = Arc::new(
        ScriptedJobApi::accepting("/job42.mp4")
            .with_statuses(vec![
                Err(DomainError::Network("timeout".to_string())),
                Err(DomainError::Network("timeout".to_string())),
                Ok(completed()),
            ])
            .with_file_check(Ok(FileCheck {
                exists: true,
                path: Some("/job42.mp4".to_string()),
            })),
    );
    let poller = poller(&api);
    poller.start(&request()).await;

    assert_eq!(
        settle(&poller).await,
        JobStatus::Completed {
            result_path: "/job42.mp4".to_string()
        }
    );
}

#[tokio::test]
async fn test_repeated_status_failures_fail_the_job() {
    let api = Arc::new(ScriptedJobApi::accepting("/job42.mp4").with_statuses(vec![
        Err(DomainError::Network("timeout".to_string())),
        Err(DomainError::Network("timeout".to_string())),
        Err(DomainError::Network("timeout".to_string())),
    ]));
    let poller = poller(&api);
    poller.start(&request()).await;

    assert_eq!(
        settle(&poller).await,
        JobStatus::Failed {
            stage: "Status check failed".to_string(),
            error_message: "Network error, please try again".to_string(),
        }
    );
    assert_eq!(api.calls(), 3);
}
