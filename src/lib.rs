//! yt-trimmer library
//!
//! Clip-range model, merge job poller, ordered clip sequence and the HTTP
//! relay of a YouTube clip creator. Trimming, downloading and merging happen
//! on remote services; this crate drives them.

pub mod adapters;
pub mod app;
pub mod cli;
pub mod config_initialization;
pub mod domain;
pub mod error;
pub mod ports;
pub mod relay;
pub mod utils;

// Re-export commonly used types
pub use domain::errors::DomainError;
pub use domain::model::{JobStatus, TimeRange};
pub use domain::rules::ClipRange;
pub use domain::sequence::{ClipSequence, ItemPatch};
pub use error::{TrimmerError, TrimmerResult};
