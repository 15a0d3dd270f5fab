//! Presentation boundary driven by the workflow controller.

use shared::domain::{ImageRecord, ImageStatus, Orientation};

use crate::{manage::ManageRow, status::StatusPresentation};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    NoImage,
    Editor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Error,
}

/// Per-row actions of the manage table that show a busy state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManageAction {
    Reupload(Orientation),
    DeleteOriginal,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ManageView {
    Loading,
    Empty,
    Table(Vec<ManageRow>),
    Error(String),
}

/// Everything the controller asks of the UI. Calls are made outside of any
/// state lock and must not block on the controller.
pub trait View: Send + Sync {
    fn render_image_list(&self, images: &[ImageRecord], unprocessed_only: bool);
    fn show_image(&self, image: &ImageRecord, stage: u8);
    fn show_screen(&self, screen: Screen);
    fn update_stage(&self, stage: u8);
    fn update_item_status(
        &self,
        identifier: &str,
        status: ImageStatus,
        presentation: StatusPresentation,
    );
    /// Disables the sync control with a busy label, or restores it.
    fn set_sync_control(&self, syncing: bool);
    fn set_action_busy(&self, identifier: &str, action: ManageAction, busy: bool);
    /// Blocking message the user has to acknowledge.
    fn alert(&self, message: &str);
    /// Transient message in the manage view.
    fn notify(&self, message: &str, level: NoticeLevel);
    fn confirm(&self, prompt: &str) -> bool;
    fn show_manage(&self, open: bool);
    fn render_manage(&self, view: &ManageView);
    fn remove_manage_row(&self, identifier: &str);
}
