//! Utility functions and helpers

pub mod logging;
pub mod time;

pub use logging::{init_logging, LogFormat, LoggingConfig};
pub use time::{from_display, to_display, video_id_from_url};
