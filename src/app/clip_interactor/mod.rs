// Clip interactor - Orchestrates the single-clip download use case

use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::errors::*;
use crate::domain::model::*;
use crate::ports::*;
use crate::utils::time::video_id_from_url;

/// A trimmed clip to request
#[derive(Debug, Clone, PartialEq)]
pub struct ClipRequest {
    pub url: String,
    pub range: TimeRange,
    /// Resolution note, e.g. `720p`
    pub resolution: String,
}

/// Download link for a trimmed clip
#[derive(Debug, Clone, PartialEq)]
pub struct ClipResponse {
    pub downloadable_url: String,
    pub format_id: String,
    pub audio_format_id: Option<String>,
    pub range: TimeRange,
}

/// Interactor for the single-clip use case
pub struct ClipInteractor {
    media_port: Arc<dyn MediaApiPort>,
}

impl ClipInteractor {
    /// Create new clip interactor with injected port
    pub fn new(media_port: Arc<dyn MediaApiPort>) -> Self {
        Self { media_port }
    }

    /// Formats the upstream offers for `url`
    pub async fn list_formats(&self, url: &str) -> Result<TrimInfo, DomainError> {
        let url = url.trim();
        if url.is_empty() {
            return Err(DomainError::Validation("Video URL is required".to_string()));
        }
        if video_id_from_url(url).is_none() {
            return Err(DomainError::Validation(
                "Not a YouTube video URL".to_string(),
            ));
        }

        let info = self.media_port.fetch_formats(url).await?;
        info!(
            formats = info.formats.len(),
            resolutions = ?info.resolutions(),
            "Formats fetched"
        );
        Ok(info)
    }

    /// Request a trimmed download of `request.range` at the chosen resolution
    pub async fn create_clip(&self, request: &ClipRequest) -> Result<ClipResponse, DomainError> {
        if request.resolution.trim().is_empty() {
            return Err(DomainError::Validation(
                "Please select a video quality.".to_string(),
            ));
        }
        if !request.range.is_valid() {
            return Err(DomainError::Validation(format!(
                "Invalid clip range {}",
                request.range
            )));
        }

        let info = self.list_formats(&request.url).await?;
        let video = info
            .video_format(request.resolution.trim())
            .ok_or_else(|| {
                DomainError::Validation(format!(
                    "Resolution {} is not available for this video",
                    request.resolution
                ))
            })?;
        let audio = info.audio_format();
        if audio.is_none() {
            warn!(url = %request.url, "No audio-only format offered; clip will be silent");
        }

        let download = DownloadRequest {
            url: request.url.trim().to_string(),
            audio_format_id: audio.map(|f| f.format_id.clone()),
            end_time: request.range.end,
            format_id: Some(video.format_id.clone()),
            start_time: request.range.start,
            is_trim: true,
        };
        info!(
            format_id = %video.format_id,
            range = %request.range,
            "Requesting trimmed download"
        );

        let response = self.media_port.request_download(&download).await?;
        let link = response.downloadable_url().ok_or_else(|| DomainError::Upstream {
            status: 200,
            message: Some(
                response
                    .error
                    .clone()
                    .unwrap_or_else(|| "Download link missing from response".to_string()),
            ),
        })?;

        Ok(ClipResponse {
            downloadable_url: link.to_string(),
            format_id: video.format_id.clone(),
            audio_format_id: download.audio_format_id,
            range: request.range,
        })
    }
}
