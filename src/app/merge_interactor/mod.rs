// Merge interactor - Submits a clip sequence as one merge job

use std::sync::Arc;

use tracing::info;

use crate::app::job_poller::{JobPoller, PollSettings};
use crate::domain::errors::*;
use crate::domain::model::*;
use crate::domain::sequence::ClipSequence;
use crate::ports::*;

/// Interactor for the multi-clip merge use case
pub struct MergeInteractor {
    poller: JobPoller,
}

impl MergeInteractor {
    pub fn new(job_port: Arc<dyn JobApiPort>, settings: PollSettings) -> Self {
        Self {
            poller: JobPoller::new(job_port, settings),
        }
    }

    /// Start merging every clip of `sequence` that has a video.
    ///
    /// Any job already being followed is discarded first.
    pub async fn merge(&self, sequence: &ClipSequence) -> Result<JobStatus, DomainError> {
        let request = sequence.merge_request();
        if request.videos.is_empty() {
            return Err(DomainError::Validation(
                "At least one clip needs a YouTube video".to_string(),
            ));
        }

        info!(
            clips = request.videos.len(),
            skipped = sequence.len() - request.videos.len(),
            "Merging clip sequence"
        );
        Ok(self.poller.start(&request).await)
    }

    /// Poller following the current job
    pub fn poller(&self) -> &JobPoller {
        &self.poller
    }
}
