// Ports - Interface definitions (contracts)

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::errors::*;

/// Resolution label the upstream uses for audio-only formats
pub const AUDIO_ONLY: &str = "audio only";

/// Embedded media player the range model seeks while the user edits
pub trait PlayerPort: Send + Sync {
    /// Length of the loaded video in seconds
    fn duration(&self) -> f64;

    /// Move playback to `seconds`
    fn seek_to(&self, seconds: f64, allow_seek_ahead: bool);
}

/// Port for the trim-info and download services
#[async_trait]
pub trait MediaApiPort: Send + Sync {
    /// List the formats available for a video
    async fn fetch_formats(&self, video_url: &str) -> Result<TrimInfo, DomainError>;

    /// Request a (possibly trimmed) download
    async fn request_download(
        &self,
        request: &DownloadRequest,
    ) -> Result<DownloadResponse, DomainError>;
}

/// Port for the remote merge job service
#[async_trait]
pub trait JobApiPort: Send + Sync {
    /// Submit a merge job
    async fn start_job(&self, request: &MergeRequest) -> Result<JobEnvelope, DomainError>;

    /// Query the state of a running job
    async fn check_status(&self, job_id: &str) -> Result<StatusReport, DomainError>;

    /// Confirm that an output artifact is reachable
    async fn check_file(&self, file_name: &str) -> Result<FileCheck, DomainError>;
}

/// One downloadable rendition of a video
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormatDescriptor {
    #[serde(default)]
    pub ext: String,
    #[serde(default)]
    pub container: Option<String>,
    #[serde(default)]
    pub resolution: String,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub format_id: String,
    #[serde(default)]
    pub url: Option<String>,
}

impl FormatDescriptor {
    pub fn is_audio_only(&self) -> bool {
        self.resolution == AUDIO_ONLY
    }
}

/// Trim-info response
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrimInfo {
    #[serde(default)]
    pub formats: Vec<FormatDescriptor>,
}

impl TrimInfo {
    /// First audio-only format
    pub fn audio_format(&self) -> Option<&FormatDescriptor> {
        self.formats.iter().find(|f| f.is_audio_only())
    }

    /// Format whose note matches the requested resolution, e.g. `720p`
    pub fn video_format(&self, note: &str) -> Option<&FormatDescriptor> {
        self.formats
            .iter()
            .find(|f| f.note.as_deref() == Some(note))
    }

    /// Distinct mp4 resolution notes in upstream order
    pub fn resolutions(&self) -> Vec<&str> {
        let mut notes: Vec<&str> = Vec::new();
        for format in self.formats.iter().filter(|f| f.ext == "mp4") {
            if let Some(note) = format.note.as_deref() {
                if !note.is_empty() && !notes.contains(&note) {
                    notes.push(note);
                }
            }
        }
        notes
    }
}

/// Download request body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DownloadRequest {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_format_id: Option<String>,
    pub end_time: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format_id: Option<String>,
    pub start_time: f64,
    pub is_trim: bool,
}

/// Download response envelope
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DownloadResponse {
    #[serde(default)]
    pub data: Option<DownloadData>,
    #[serde(default)]
    pub error: Option<String>,
}

impl DownloadResponse {
    pub fn downloadable_url(&self) -> Option<&str> {
        self.data
            .as_ref()
            .and_then(|d| d.downloadable_url.as_deref())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DownloadData {
    #[serde(default)]
    pub downloadable_url: Option<String>,
}

/// Merge request body, one entry per clip in output order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergeRequest {
    pub videos: Vec<MergeClip>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergeClip {
    pub position: usize,
    #[serde(rename = "videoId")]
    pub video_id: String,
    #[serde(rename = "startTime")]
    pub start_time: String,
    #[serde(rename = "endTime")]
    pub end_time: String,
}

/// Response to a merge submission
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobEnvelope {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub progress: Option<f64>,
    #[serde(default)]
    pub stage: Option<String>,
    /// Expected result path, e.g. `/abc123.mp4`
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Remote job state reported by the status endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RemoteJobState {
    Processing,
    Completed,
    Error,
    #[serde(other)]
    Unknown,
}

/// Status-check response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusReport {
    pub status: RemoteJobState,
    #[serde(default)]
    pub progress: Option<f64>,
    #[serde(default)]
    pub stage: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Existence-check response
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileCheck {
    #[serde(default)]
    pub exists: bool,
    #[serde(default)]
    pub path: Option<String>,
}
