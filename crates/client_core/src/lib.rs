//! Client side of the crop workflow: talks to the crop service, keeps the
//! image list and per-image status, and tells a [`View`] what to show.

pub mod backend;
pub mod controller;
pub mod error;
pub mod manage;
pub mod render;
pub mod state;
pub mod status;
pub mod sync;
pub mod view;

pub use backend::{CropBackend, HttpBackend};
pub use controller::{
    all_processed_message, BlockReason, ControllerOptions, ImageListSource, Outcome,
    SyncSummary, WorkflowController,
};
pub use error::ClientError;
pub use manage::{CropCell, ManageRow, OutputSizes};
pub use state::AppState;
pub use status::{StatusIcon, StatusPresentation, StatusReport, StatusSource};
pub use view::{ManageAction, ManageView, NoticeLevel, Screen, View};
