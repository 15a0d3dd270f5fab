//! Application state owned by the workflow controller.

use chrono::{DateTime, Utc};
use shared::domain::{CropRect, ImageRecord, ImageStatus, Orientation};

use crate::status::{next_actionable, status_from_crops};

pub const FIRST_STAGE: u8 = 1;

/// Image list, selection and editor buffers.
///
/// The current image is tracked as a position in `images`, so it always refers
/// to a live record; every operation that replaces or shrinks the list
/// re-points or clears it.
#[derive(Debug, Clone)]
pub struct AppState {
    initialized: bool,
    images: Vec<ImageRecord>,
    current: Option<usize>,
    stage: u8,
    portrait_crop: CropRect,
    landscape_crop: CropRect,
    unprocessed_only: bool,
    last_synced_at: Option<DateTime<Utc>>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            initialized: false,
            images: Vec::new(),
            current: None,
            stage: FIRST_STAGE,
            portrait_crop: CropRect::default(),
            landscape_crop: CropRect::default(),
            unprocessed_only: false,
            last_synced_at: None,
        }
    }
}

impl AppState {
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn mark_initialized(&mut self) {
        self.initialized = true;
    }

    pub fn images(&self) -> &[ImageRecord] {
        &self.images
    }

    /// Adopts a new image list wholesale, keeping the selection when the
    /// selected image is still present.
    pub fn replace_images(&mut self, images: Vec<ImageRecord>) {
        let selected = self.current_identifier();
        self.images = images;
        self.current = selected.and_then(|identifier| self.position(&identifier));
    }

    pub fn mark_synced(&mut self, at: DateTime<Utc>) {
        self.last_synced_at = Some(at);
    }

    pub fn last_synced_at(&self) -> Option<DateTime<Utc>> {
        self.last_synced_at
    }

    pub fn position(&self, identifier: &str) -> Option<usize> {
        self.images.iter().position(|image| image.is(identifier))
    }

    pub fn image(&self, identifier: &str) -> Option<&ImageRecord> {
        self.images.iter().find(|image| image.is(identifier))
    }

    pub fn current(&self) -> Option<&ImageRecord> {
        self.current.and_then(|idx| self.images.get(idx))
    }

    pub fn current_identifier(&self) -> Option<String> {
        self.current().map(|image| image.identifier().to_string())
    }

    pub fn is_current(&self, identifier: &str) -> bool {
        self.current().is_some_and(|image| image.is(identifier))
    }

    /// Points the editor at `identifier` with fresh crop buffers.
    pub fn select(&mut self, identifier: &str) -> Option<&ImageRecord> {
        let idx = self.position(identifier)?;
        self.current = Some(idx);
        self.clear_crops();
        self.stage = FIRST_STAGE;
        self.images.get(idx)
    }

    pub fn clear_current(&mut self) {
        self.current = None;
        self.clear_crops();
        self.stage = FIRST_STAGE;
    }

    pub fn set_status(&mut self, identifier: &str, status: ImageStatus) -> bool {
        match self.images.iter_mut().find(|image| image.is(identifier)) {
            Some(image) => {
                image.status = status;
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, identifier: &str) -> Option<ImageRecord> {
        let idx = self.position(identifier)?;
        let removed = self.images.remove(idx);
        let current = self.current;
        self.current = match current {
            Some(current) if current == idx => {
                self.clear_crops();
                self.stage = FIRST_STAGE;
                None
            }
            Some(current) if current > idx => Some(current - 1),
            other => other,
        };
        Some(removed)
    }

    pub fn crop(&self, orientation: Orientation) -> CropRect {
        match orientation {
            Orientation::Portrait => self.portrait_crop,
            Orientation::Landscape => self.landscape_crop,
        }
    }

    pub fn set_crop(&mut self, orientation: Orientation, rect: CropRect) {
        match orientation {
            Orientation::Portrait => self.portrait_crop = rect,
            Orientation::Landscape => self.landscape_crop = rect,
        }
    }

    pub fn clear_crops(&mut self) {
        self.portrait_crop = CropRect::default();
        self.landscape_crop = CropRect::default();
    }

    /// Status implied by the editor's crop buffers alone.
    pub fn local_status(&self) -> ImageStatus {
        status_from_crops(&self.portrait_crop, &self.landscape_crop)
    }

    pub fn stage(&self) -> u8 {
        self.stage
    }

    pub fn set_stage(&mut self, stage: u8) {
        self.stage = stage;
    }

    pub fn unprocessed_only(&self) -> bool {
        self.unprocessed_only
    }

    pub fn set_unprocessed_only(&mut self, enabled: bool) {
        self.unprocessed_only = enabled;
    }

    /// Next image needing work after the current one, under the active filter.
    pub fn next_actionable(&self) -> Option<&ImageRecord> {
        next_actionable(&self.images, self.current, self.unprocessed_only)
            .and_then(|idx| self.images.get(idx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> AppState {
        let mut state = AppState::default();
        state.replace_images(vec![
            ImageRecord::new("one.jpg").with_asset_id("a1"),
            ImageRecord::new("two.jpg"),
            ImageRecord::new("three.jpg").with_asset_id("a3"),
        ]);
        state
    }

    #[test]
    fn lookups_use_the_resolved_identifier() {
        let state = sample();
        assert!(state.image("a1").is_some());
        assert!(state.image("one.jpg").is_none());
        assert!(state.image("two.jpg").is_some());
    }

    #[test]
    fn replacing_the_list_repoints_selection() {
        let mut state = sample();
        state.select("a3").expect("select");
        state.replace_images(vec![
            ImageRecord::new("three.jpg").with_asset_id("a3"),
            ImageRecord::new("four.jpg"),
        ]);
        assert_eq!(state.current_identifier().as_deref(), Some("a3"));

        state.replace_images(vec![ImageRecord::new("four.jpg")]);
        assert!(state.current().is_none());
    }

    #[test]
    fn removing_records_keeps_selection_consistent() {
        let mut state = sample();
        state.select("a3").expect("select");
        state.remove("a1").expect("remove");
        assert_eq!(state.current_identifier().as_deref(), Some("a3"));

        state.set_crop(
            Orientation::Portrait,
            CropRect {
                x: 0.0,
                y: 0.0,
                width: 10.0,
                height: 20.0,
            },
        );
        state.remove("a3").expect("remove");
        assert!(state.current().is_none());
        assert_eq!(state.local_status(), ImageStatus::Unprocessed);
        assert!(state.remove("missing").is_none());
    }

    #[test]
    fn selecting_resets_editor_buffers() {
        let mut state = sample();
        state.set_stage(3);
        state.set_crop(
            Orientation::Landscape,
            CropRect {
                x: 1.0,
                y: 1.0,
                width: 5.0,
                height: 5.0,
            },
        );
        assert_eq!(state.local_status(), ImageStatus::Landscape);

        state.select("two.jpg").expect("select");
        assert_eq!(state.stage(), FIRST_STAGE);
        assert_eq!(state.local_status(), ImageStatus::Unprocessed);
        assert!(state.select("nope").is_none());
        assert!(state.is_current("two.jpg"));
    }
}
