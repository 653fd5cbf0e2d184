// Ordered clip sequence - multi-clip merge mode

use std::sync::Arc;

use crate::domain::errors::DomainError;
use crate::domain::model::*;
use crate::domain::rules::ClipRange;
use crate::ports::{MergeClip, MergeRequest, PlayerPort};
use crate::utils::time::video_id_from_url;

/// Most clips a merge can hold
pub const MAX_CLIPS: usize = 5;

/// One clip of a merge: source video plus selected range
#[derive(Debug, Clone)]
pub struct ClipItem {
    id: ItemId,
    pub source_url: String,
    pub video_id: Option<String>,
    pub clip: ClipRange,
    pub clip_url: Option<String>,
}

impl ClipItem {
    /// Fresh item with no source
    pub fn empty() -> Self {
        Self {
            id: ItemId::new(),
            source_url: String::new(),
            video_id: None,
            clip: ClipRange::new(),
            clip_url: None,
        }
    }

    pub fn id(&self) -> ItemId {
        self.id
    }

    /// Fold a patch into this item. Identity never changes.
    pub fn apply(&mut self, patch: ItemPatch) {
        let ItemPatch {
            source_url,
            video_id,
            range,
            raw_start,
            raw_end,
            player,
            clip_url,
        } = patch;

        if let Some(url) = source_url {
            self.source_url = url;
        }
        if let Some(video_id) = video_id {
            self.video_id = video_id;
        }
        if let Some(player) = player {
            self.clip.on_player_ready(player);
        }
        if let Some(range) = range {
            self.clip.replace_range(range);
        }
        if let Some(text) = raw_start {
            self.clip.set_raw_start(text);
        }
        if let Some(text) = raw_end {
            self.clip.set_raw_end(text);
        }
        if let Some(clip_url) = clip_url {
            self.clip_url = clip_url;
        }
    }
}

/// Partial update of a [`ClipItem`]; `None` leaves a field untouched
#[derive(Default, Clone)]
pub struct ItemPatch {
    pub source_url: Option<String>,
    pub video_id: Option<Option<String>>,
    pub range: Option<TimeRange>,
    pub raw_start: Option<String>,
    pub raw_end: Option<String>,
    pub player: Option<Arc<dyn PlayerPort>>,
    pub clip_url: Option<Option<String>>,
}

impl ItemPatch {
    /// URL edit: new source and the video id extracted from it
    pub fn source_url(url: impl Into<String>) -> Self {
        let url = url.into();
        Self {
            video_id: Some(video_id_from_url(&url)),
            source_url: Some(url),
            ..Self::default()
        }
    }

    /// Player finished loading
    pub fn player_ready(player: Arc<dyn PlayerPort>) -> Self {
        Self {
            player: Some(player),
            ..Self::default()
        }
    }

    pub fn range(range: TimeRange) -> Self {
        Self {
            range: Some(range),
            ..Self::default()
        }
    }

    pub fn raw_times(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            raw_start: Some(start.into()),
            raw_end: Some(end.into()),
            ..Self::default()
        }
    }
}

/// Clips in merge order. Never empty, never longer than [`MAX_CLIPS`].
#[derive(Debug, Clone)]
pub struct ClipSequence {
    items: Vec<ClipItem>,
}

impl ClipSequence {
    pub fn new() -> Self {
        Self {
            items: vec![ClipItem::empty()],
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the sequence holds no clips. A sequence always keeps at least one.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.items.len() >= MAX_CLIPS
    }

    pub fn items(&self) -> &[ClipItem] {
        &self.items
    }

    pub fn get(&self, index: usize) -> Option<&ClipItem> {
        self.items.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut ClipItem> {
        self.items.get_mut(index)
    }

    pub fn position(&self, id: ItemId) -> Option<usize> {
        self.items.iter().position(|item| item.id == id)
    }

    /// Append an empty clip
    pub fn insert(&mut self) -> Result<ItemId, DomainError> {
        if self.is_full() {
            return Err(DomainError::SequenceFull(MAX_CLIPS));
        }
        let item = ClipItem::empty();
        let id = item.id;
        self.items.push(item);
        Ok(id)
    }

    /// Delete the clip at `index`. Removing the last clip leaves one fresh
    /// empty clip behind.
    pub fn remove(&mut self, index: usize) -> Result<ClipItem, DomainError> {
        self.check_index(index)?;
        let removed = self.items.remove(index);
        if self.items.is_empty() {
            self.items.push(ClipItem::empty());
        }
        Ok(removed)
    }

    /// Merge `patch` into the clip at `index`
    pub fn update(&mut self, index: usize, patch: ItemPatch) -> Result<&ClipItem, DomainError> {
        self.check_index(index)?;
        let item = &mut self.items[index];
        item.apply(patch);
        Ok(item)
    }

    /// Move the clip `from` to the position currently held by `to`
    pub fn reorder(&mut self, from: ItemId, to: ItemId) -> Result<(), DomainError> {
        if from == to {
            return Ok(());
        }
        let old_index = self
            .position(from)
            .ok_or_else(|| DomainError::UnknownItem(from.to_string()))?;
        let new_index = self
            .position(to)
            .ok_or_else(|| DomainError::UnknownItem(to.to_string()))?;

        let moved = self.items.remove(old_index);
        self.items.insert(new_index, moved);
        Ok(())
    }

    /// Merge request for every clip that has a video id, in sequence order
    pub fn merge_request(&self) -> MergeRequest {
        let videos = self
            .items
            .iter()
            .filter_map(|item| {
                item.video_id.as_ref().map(|video_id| (video_id, item.clip.raw()))
            })
            .enumerate()
            .map(|(idx, (video_id, raw))| MergeClip {
                position: idx + 1,
                video_id: video_id.clone(),
                start_time: raw.start.clone(),
                end_time: raw.end.clone(),
            })
            .collect();

        MergeRequest { videos }
    }

    fn check_index(&self, index: usize) -> Result<(), DomainError> {
        if index >= self.items.len() {
            return Err(DomainError::IndexOutOfRange {
                index,
                len: self.items.len(),
            });
        }
        Ok(())
    }
}

impl Default for ClipSequence {
    fn default() -> Self {
        Self::new()
    }
}
