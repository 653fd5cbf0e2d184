// Domain models - Core types and data structures

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::utils::time::to_display;

/// Minimum distance in seconds between the start and end of a clip
pub const MIN_CLIP_GAP: f64 = 1.0;

/// Selected `[start, end]` interval, in seconds, of a video of known length
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: f64,
    pub end: f64,
    pub total_duration: f64,
}

impl TimeRange {
    /// Range of a video whose metadata has not arrived yet
    pub fn empty() -> Self {
        Self {
            start: 0.0,
            end: 0.0,
            total_duration: 0.0,
        }
    }

    /// Range covering the whole video
    pub fn full(total_duration: f64) -> Self {
        let total = total_duration.max(0.0);
        Self {
            start: 0.0,
            end: total,
            total_duration: total,
        }
    }

    /// Length of the selection in seconds
    pub fn duration(&self) -> f64 {
        (self.end - self.start).max(0.0)
    }

    /// Ordering and minimum-gap invariants of a committed range
    pub fn is_valid(&self) -> bool {
        self.start >= 0.0
            && self.start + MIN_CLIP_GAP <= self.end
            && self.end <= self.total_duration
    }
}

impl Default for TimeRange {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", to_display(self.start), to_display(self.end))
    }
}

/// Editable text mirrors of a range's two bounds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTimeFields {
    pub start: String,
    pub end: String,
}

impl RawTimeFields {
    /// Display form of the given range
    pub fn from_range(range: &TimeRange) -> Self {
        Self {
            start: to_display(range.start),
            end: to_display(range.end),
        }
    }
}

impl Default for RawTimeFields {
    fn default() -> Self {
        Self::from_range(&TimeRange::empty())
    }
}

/// Stable identity of a clip in a sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemId(Uuid);

impl ItemId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ItemId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Status of a remote merge job as seen by its poller
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum JobStatus {
    #[default]
    Idle,
    Starting,
    Processing { progress: f64, stage: String },
    VerifyingOutput { job_id: String },
    Completed { result_path: String },
    Failed { stage: String, error_message: String },
}

impl JobStatus {
    /// `Completed` or `Failed`: nothing changes until an explicit reset
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed { .. } | JobStatus::Failed { .. })
    }

    /// A job is in flight
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            JobStatus::Starting | JobStatus::Processing { .. } | JobStatus::VerifyingOutput { .. }
        )
    }

    /// Progress in percent
    pub fn progress(&self) -> f64 {
        match self {
            JobStatus::Processing { progress, .. } => *progress,
            JobStatus::VerifyingOutput { .. } | JobStatus::Completed { .. } => 100.0,
            _ => 0.0,
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobStatus::Idle => write!(f, "idle"),
            JobStatus::Starting => write!(f, "starting: Initializing..."),
            JobStatus::Processing { progress, stage } => {
                write!(f, "processing ({:.0}%): {}", progress, stage)
            }
            JobStatus::VerifyingOutput { job_id } => write!(f, "verifying output of {}", job_id),
            JobStatus::Completed { result_path } => write!(f, "completed: {}", result_path),
            JobStatus::Failed {
                stage,
                error_message,
            } => write!(f, "failed ({}): {}", stage, error_message),
        }
    }
}
