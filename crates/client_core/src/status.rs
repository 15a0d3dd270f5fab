//! Pure status derivation and list navigation.

use shared::domain::{CropRect, ImageRecord, ImageStatus};

/// Where a reconciled status came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusSource {
    Backend,
    LocalCrops,
    /// The lookup failed for an image not open in the editor; its stored
    /// status was kept.
    Stored,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusReport {
    pub status: ImageStatus,
    pub source: StatusSource,
}

/// Status implied by the crop rectangles held by the editor.
pub fn status_from_crops(portrait: &CropRect, landscape: &CropRect) -> ImageStatus {
    ImageStatus::from_presence(portrait.has_area(), landscape.has_area())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusIcon {
    Pending,
    Partial,
    Done,
}

/// How a list or grid entry shows a status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusPresentation {
    pub icon: StatusIcon,
    pub completed: bool,
}

pub fn presentation(status: ImageStatus) -> StatusPresentation {
    let icon = match status {
        ImageStatus::Unprocessed => StatusIcon::Pending,
        ImageStatus::Portrait | ImageStatus::Landscape => StatusIcon::Partial,
        ImageStatus::Both | ImageStatus::Completed => StatusIcon::Done,
    };
    StatusPresentation {
        icon,
        completed: status.is_done(),
    }
}

/// Whether an image still needs work under the current list filter.
pub fn is_actionable(record: &ImageRecord, unprocessed_only: bool) -> bool {
    match record.status {
        ImageStatus::Completed => false,
        ImageStatus::Unprocessed => true,
        _ => !unprocessed_only,
    }
}

/// Index of the next actionable image after `current`, wrapping around once.
/// The current image itself is never returned.
pub fn next_actionable(
    images: &[ImageRecord],
    current: Option<usize>,
    unprocessed_only: bool,
) -> Option<usize> {
    let len = images.len();
    if len == 0 {
        return None;
    }
    let start = current.map_or(0, |idx| idx + 1);
    (0..len)
        .map(|offset| (start + offset) % len)
        .filter(|idx| Some(*idx) != current)
        .find(|idx| is_actionable(&images[*idx], unprocessed_only))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(width: f64) -> CropRect {
        CropRect {
            x: 0.0,
            y: 0.0,
            width,
            height: width,
        }
    }

    fn list(statuses: &[ImageStatus]) -> Vec<ImageRecord> {
        statuses
            .iter()
            .enumerate()
            .map(|(idx, status)| ImageRecord::new(format!("img{idx}.jpg")).with_status(*status))
            .collect()
    }

    #[test]
    fn local_crops_follow_the_truth_table() {
        assert_eq!(
            status_from_crops(&rect(10.0), &rect(5.0)),
            ImageStatus::Both
        );
        assert_eq!(
            status_from_crops(&rect(10.0), &rect(0.0)),
            ImageStatus::Portrait
        );
        assert_eq!(
            status_from_crops(&rect(0.0), &rect(5.0)),
            ImageStatus::Landscape
        );
        assert_eq!(
            status_from_crops(&CropRect::default(), &CropRect::default()),
            ImageStatus::Unprocessed
        );
    }

    #[test]
    fn presentation_marks_done_states_completed() {
        assert_eq!(
            presentation(ImageStatus::Unprocessed),
            StatusPresentation {
                icon: StatusIcon::Pending,
                completed: false
            }
        );
        assert_eq!(presentation(ImageStatus::Landscape).icon, StatusIcon::Partial);
        assert!(!presentation(ImageStatus::Portrait).completed);
        assert!(presentation(ImageStatus::Both).completed);
        assert!(presentation(ImageStatus::Completed).completed);
    }

    #[test]
    fn next_wraps_around_and_skips_completed() {
        use ImageStatus::*;
        let images = list(&[Unprocessed, Completed, Completed, Portrait]);
        assert_eq!(next_actionable(&images, Some(3), false), Some(0));
        assert_eq!(next_actionable(&images, Some(0), false), Some(3));
        assert_eq!(next_actionable(&images, None, false), Some(0));
    }

    #[test]
    fn filter_skips_partially_cropped_images() {
        use ImageStatus::*;
        let images = list(&[Completed, Both, Landscape, Unprocessed]);
        assert_eq!(next_actionable(&images, Some(0), true), Some(3));
        assert_eq!(next_actionable(&images, Some(0), false), Some(1));
    }

    #[test]
    fn never_returns_the_current_image() {
        use ImageStatus::*;
        let images = list(&[Completed, Unprocessed, Completed]);
        assert_eq!(next_actionable(&images, Some(1), false), None);
        assert_eq!(next_actionable(&[], None, false), None);
    }
}
