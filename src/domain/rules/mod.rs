// Domain rules - Clip range commit policy

use std::fmt;
use std::sync::Arc;

use crate::domain::model::*;
use crate::ports::PlayerPort;
use crate::utils::time::{from_display, to_display};

/// Result of committing a raw time field
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CommitOutcome {
    /// Text parsed; the bound moved to the contained (clamped) value
    Applied(f64),
    /// Text rejected; the field was restored from the current range
    Reverted,
}

/// Clip range bound to its editable text fields and, once loaded, a player.
///
/// `range` is the single source of truth. Raw text is re-derived from it after
/// every programmatic change and only read back at commit time.
#[derive(Clone, Default)]
pub struct ClipRange {
    range: TimeRange,
    raw: RawTimeFields,
    initialized: bool,
    player: Option<Arc<dyn PlayerPort>>,
}

impl ClipRange {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn range(&self) -> &TimeRange {
        &self.range
    }

    pub fn raw(&self) -> &RawTimeFields {
        &self.raw
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn has_player(&self) -> bool {
        self.player.is_some()
    }

    /// Length of the selection
    pub fn selected_duration(&self) -> f64 {
        self.range.duration()
    }

    /// Selection length as `HH:MM:SS`
    pub fn formatted_duration(&self) -> String {
        to_display(self.selected_duration())
    }

    pub fn attach_player(&mut self, player: Arc<dyn PlayerPort>) {
        self.player = Some(player);
    }

    /// Player-ready signal: keep the handle and initialize from its duration
    pub fn on_player_ready(&mut self, player: Arc<dyn PlayerPort>) -> bool {
        let duration = player.duration();
        self.attach_player(player);
        self.initialize(duration)
    }

    /// Select the whole video. Only the first call after creation or `reset`
    /// has any effect; returns whether it did.
    pub fn initialize(&mut self, total_duration: f64) -> bool {
        if self.initialized {
            return false;
        }
        self.range = TimeRange::full(total_duration);
        self.raw = RawTimeFields::from_range(&self.range);
        self.initialized = true;
        true
    }

    /// Forget the loaded video so the next `initialize` applies again
    pub fn reset(&mut self) {
        self.range = TimeRange::empty();
        self.raw = RawTimeFields::default();
        self.initialized = false;
        self.player = None;
    }

    /// Both slider thumbs moved. The slider enforces order and gap itself.
    pub fn on_slider_change(&mut self, start: f64, end: f64) {
        self.range.start = start;
        self.range.end = end;
        self.sync_raw();
        self.seek(start);
    }

    /// Text typed into the start field, not yet committed
    pub fn set_raw_start(&mut self, text: impl Into<String>) {
        self.raw.start = text.into();
    }

    /// Text typed into the end field, not yet committed
    pub fn set_raw_end(&mut self, text: impl Into<String>) {
        self.raw.end = text.into();
    }

    /// Commit start text, clamped to `[0, end - 1]`
    pub fn commit_start(&mut self, raw_text: &str) -> CommitOutcome {
        let parsed = match self.parse_for_commit(raw_text) {
            Some(secs) => secs,
            None => {
                self.raw.start = to_display(self.range.start);
                return CommitOutcome::Reverted;
            }
        };

        let clamped = parsed.min(self.range.end - MIN_CLIP_GAP).max(0.0);
        self.range.start = clamped;
        self.raw.start = to_display(clamped);
        self.seek(clamped);
        CommitOutcome::Applied(clamped)
    }

    /// Commit end text, clamped to `[start + 1, total_duration]`.
    ///
    /// Playback returns to the clip start, not the new end.
    pub fn commit_end(&mut self, raw_text: &str) -> CommitOutcome {
        let parsed = match self.parse_for_commit(raw_text) {
            Some(secs) => secs,
            None => {
                self.raw.end = to_display(self.range.end);
                return CommitOutcome::Reverted;
            }
        };

        let clamped = parsed
            .min(self.range.total_duration)
            .max(self.range.start + MIN_CLIP_GAP);
        self.range.end = clamped;
        self.raw.end = to_display(clamped);
        self.seek(self.range.start);
        CommitOutcome::Applied(clamped)
    }

    /// Nudge the start by `delta` seconds within `[0, end - 1]` and seek to it.
    /// `None` until a duration is known.
    pub fn step_start(&mut self, delta: f64) -> Option<f64> {
        if !self.initialized {
            return None;
        }
        let start = (self.range.start + delta)
            .min(self.range.end - MIN_CLIP_GAP)
            .max(0.0);
        self.range.start = start;
        self.raw.start = to_display(start);
        self.seek(start);
        Some(start)
    }

    /// Nudge the end by `delta` seconds within `[start + 1, total_duration]`.
    ///
    /// Unlike `commit_end`, playback jumps to the new end.
    pub fn step_end(&mut self, delta: f64) -> Option<f64> {
        if !self.initialized {
            return None;
        }
        let end = (self.range.end + delta)
            .min(self.range.total_duration)
            .max(self.range.start + MIN_CLIP_GAP);
        self.range.end = end;
        self.raw.end = to_display(end);
        self.seek(end);
        Some(end)
    }

    /// Play from the clip start
    pub fn seek_start(&self) {
        self.seek(self.range.start);
    }

    /// Play from the clip end
    pub fn seek_end(&self) {
        self.seek(self.range.end);
    }

    /// Commit whatever is currently typed in the start field
    pub fn commit_raw_start(&mut self) -> CommitOutcome {
        let text = self.raw.start.clone();
        self.commit_start(&text)
    }

    /// Commit whatever is currently typed in the end field
    pub fn commit_raw_end(&mut self) -> CommitOutcome {
        let text = self.raw.end.clone();
        self.commit_end(&text)
    }

    /// Set the range programmatically and resync the text fields.
    ///
    /// Once a duration is known it is kept and the bounds are clamped to it;
    /// otherwise `range` supplies the duration and counts as initialization,
    /// so a later player-ready signal leaves it alone.
    pub(crate) fn replace_range(&mut self, range: TimeRange) {
        let total_duration = if self.initialized {
            self.range.total_duration
        } else {
            range.total_duration.max(range.end)
        };
        let start = range.start.max(0.0).min(total_duration);
        let end = range.end.min(total_duration).max(start);
        self.range = TimeRange {
            start,
            end,
            total_duration,
        };
        self.initialized = true;
        self.sync_raw();
    }

    fn parse_for_commit(&self, raw_text: &str) -> Option<f64> {
        // Nothing to clamp against until the duration is known
        if !self.initialized {
            return None;
        }
        from_display(raw_text).map(|secs| secs as f64)
    }

    fn sync_raw(&mut self) {
        self.raw = RawTimeFields::from_range(&self.range);
    }

    fn seek(&self, seconds: f64) {
        if let Some(player) = &self.player {
            player.seek_to(seconds, true);
        }
    }
}

impl fmt::Debug for ClipRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClipRange")
            .field("range", &self.range)
            .field("raw", &self.raw)
            .field("initialized", &self.initialized)
            .field("player", &self.player.is_some())
            .finish()
    }
}
