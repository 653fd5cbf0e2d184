use std::sync::Arc;

use crate::adapters::{AppConfig, HttpUpstreamAdapter};
use crate::app::{
    clip_interactor::ClipInteractor, job_poller::PollSettings, merge_interactor::MergeInteractor,
};
use crate::domain::errors::DomainError;
use crate::ports::{JobApiPort, MediaApiPort};

pub trait AppContainer: Send + Sync {
    fn clip_interactor(&self) -> Arc<ClipInteractor>;
    fn merge_interactor(&self) -> Arc<MergeInteractor>;
}

pub struct DefaultAppContainer {
    clip_interactor: Arc<ClipInteractor>,
    merge_interactor: Arc<MergeInteractor>,
}

impl DefaultAppContainer {
    pub fn new(config: &AppConfig) -> Result<Self, DomainError> {
        config.validate()?;
        let upstream = Arc::new(HttpUpstreamAdapter::from_config(config)?);

        let clip_interactor = Arc::new(ClipInteractor::new(
            Arc::clone(&upstream) as Arc<dyn MediaApiPort>
        ));

        let merge_interactor = Arc::new(MergeInteractor::new(
            Arc::clone(&upstream) as Arc<dyn JobApiPort>,
            PollSettings {
                interval: config.poll_interval(),
                max_failures: config.max_poll_failures,
            },
        ));

        Ok(Self {
            clip_interactor,
            merge_interactor,
        })
    }
}

impl AppContainer for DefaultAppContainer {
    fn clip_interactor(&self) -> Arc<ClipInteractor> {
        Arc::clone(&self.clip_interactor)
    }

    fn merge_interactor(&self) -> Arc<MergeInteractor> {
        Arc::clone(&self.merge_interactor)
    }
}
