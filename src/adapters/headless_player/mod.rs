// Headless player adapter - stands in for the embedded player outside a browser

use std::sync::{Mutex, PoisonError};

use tracing::debug;

use crate::ports::PlayerPort;

/// Player with a known duration that only remembers where it was seeked to
pub struct HeadlessPlayer {
    duration: f64,
    position: Mutex<f64>,
}

impl HeadlessPlayer {
    pub fn new(duration: f64) -> Self {
        Self {
            duration: duration.max(0.0),
            position: Mutex::new(0.0),
        }
    }

    /// Last seek target
    pub fn position(&self) -> f64 {
        *self.position.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl PlayerPort for HeadlessPlayer {
    fn duration(&self) -> f64 {
        self.duration
    }

    fn seek_to(&self, seconds: f64, allow_seek_ahead: bool) {
        debug!(seconds, allow_seek_ahead, "Seek");
        *self.position.lock().unwrap_or_else(PoisonError::into_inner) =
            seconds.clamp(0.0, self.duration);
    }
}
