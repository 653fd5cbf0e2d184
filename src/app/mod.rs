// Application layer - Use case interactors

pub mod clip_interactor;
pub mod container;
pub mod job_poller;
pub mod merge_interactor;

// Re-export interactors
pub use clip_interactor::{ClipInteractor, ClipRequest, ClipResponse};
pub use container::{AppContainer, DefaultAppContainer};
pub use job_poller::{JobPoller, PollSettings};
pub use merge_interactor::MergeInteractor;
