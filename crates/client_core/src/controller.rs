//! Workflow controller: sync coordination, status reconciliation and the
//! per-image operations of the crop workflow.

use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use shared::{
    domain::{CropRect, ImageStatus, Orientation},
    error::ApiError,
    protocol::{CropDataResponse, ReplyStatus},
};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::{
    backend::CropBackend,
    error::ClientError,
    manage::{build_rows, OutputSizes},
    render::{RenderQueue, RenderTask},
    state::AppState,
    status::{presentation, StatusReport, StatusSource},
    sync::SyncGate,
    view::{ManageAction, ManageView, NoticeLevel, Screen, View},
};

pub const ALL_PROCESSED_MESSAGE: &str = "All images have been processed! Well done!";
pub const ALL_UNPROCESSED_DONE_MESSAGE: &str =
    "All unprocessed images have been processed! Turn off the filter to review the rest.";
const MANAGE_LOAD_ERROR: &str = "Error loading images. Please try again.";

/// Why an operation did nothing. Never surfaced to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockReason {
    NotInitialized,
    SyncInProgress,
    NoCurrentImage,
    UnknownImage,
    MissingParameters,
    Declined,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T = ()> {
    Done(T),
    Blocked(BlockReason),
    /// Rejected by the backend or lost in transport; the user has been told.
    Failed(String),
}

impl<T> Outcome<T> {
    pub fn is_done(&self) -> bool {
        matches!(self, Outcome::Done(_))
    }

    pub fn blocked_by(&self) -> Option<BlockReason> {
        match self {
            Outcome::Blocked(reason) => Some(*reason),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageListSource {
    /// The sync reply carried the list.
    Embedded,
    /// Fetched from `/images` after the sync.
    Refetched,
    /// The follow-up fetch failed; the previous list was kept.
    Unchanged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncSummary {
    pub new_files: usize,
    pub images: usize,
    pub source: ImageListSource,
}

#[derive(Debug, Clone, Default)]
pub struct ControllerOptions {
    pub output_sizes: OutputSizes,
    pub unprocessed_only: bool,
}

pub struct WorkflowController {
    backend: Arc<dyn CropBackend>,
    view: Arc<dyn View>,
    sync_gate: SyncGate,
    state: Mutex<AppState>,
    renders: Mutex<RenderQueue>,
    output_sizes: OutputSizes,
}

/// Folds a `success: false` reply into the error path.
fn accepted(result: Result<ReplyStatus, ClientError>) -> Result<ReplyStatus, ClientError> {
    Ok(result?.into_result()?)
}

fn asset_label(value: Value) -> String {
    match value {
        Value::String(text) => text,
        other => other.to_string(),
    }
}

/// Crop presence for one orientation; a 404 means nothing is saved.
fn crop_saved(result: Result<CropDataResponse, ClientError>) -> Result<bool, ClientError> {
    match result {
        Ok(reply) => Ok(reply.has_crop()),
        Err(err) if err.is_not_found() => Ok(false),
        Err(err) => Err(err),
    }
}

/// Marks a manage-table action busy until dropped.
struct BusyAction<'a> {
    view: &'a dyn View,
    identifier: &'a str,
    action: ManageAction,
}

impl<'a> BusyAction<'a> {
    fn start(view: &'a dyn View, identifier: &'a str, action: ManageAction) -> Self {
        view.set_action_busy(identifier, action, true);
        Self {
            view,
            identifier,
            action,
        }
    }
}

impl Drop for BusyAction<'_> {
    fn drop(&mut self) {
        self.view
            .set_action_busy(self.identifier, self.action, false);
    }
}

impl WorkflowController {
    pub fn new(
        backend: Arc<dyn CropBackend>,
        view: Arc<dyn View>,
        options: ControllerOptions,
    ) -> Arc<Self> {
        let mut state = AppState::default();
        state.set_unprocessed_only(options.unprocessed_only);
        Arc::new(Self {
            backend,
            view,
            sync_gate: SyncGate::default(),
            state: Mutex::new(state),
            renders: Mutex::new(RenderQueue::default()),
            output_sizes: options.output_sizes,
        })
    }

    pub fn is_syncing(&self) -> bool {
        self.sync_gate.is_syncing()
    }

    pub async fn snapshot(&self) -> AppState {
        self.state.lock().await.clone()
    }

    async fn schedule(&self, task: RenderTask) {
        let version = self.renders.lock().await.schedule(task);
        debug!(version, "render scheduled");
    }

    /// Loads the image list and unlocks syncing.
    pub async fn initialize(&self) -> Result<usize, ClientError> {
        let images = self.backend.list_images().await.map_err(|err| {
            error!(%err, "failed to load image list");
            err
        })?;
        let count = images.len();
        {
            let mut state = self.state.lock().await;
            state.replace_images(images);
            state.mark_initialized();
        }
        self.schedule(RenderTask::ImageList).await;
        info!(images = count, "image list loaded");
        Ok(count)
    }

    /// Pulls new images from the photo service. At most one sync runs at a
    /// time; overlapping calls return `Blocked` without touching the network.
    pub async fn sync(&self) -> Result<Outcome<SyncSummary>, ClientError> {
        if !self.state.lock().await.is_initialized() {
            info!("sync blocked: application not initialized");
            return Ok(Outcome::Blocked(BlockReason::NotInitialized));
        }

        let Some(_permit) = self.sync_gate.try_begin(self.view.as_ref()) else {
            info!("sync blocked: operation in progress");
            return Ok(Outcome::Blocked(BlockReason::SyncInProgress));
        };

        info!("starting sync");
        let response = match self.backend.sync().await {
            Ok(response) => response,
            Err(err) => {
                error!(%err, "error syncing with photo service");
                self.view
                    .alert(&format!("Error syncing with photo service: {err}"));
                return Err(err);
            }
        };

        if !response.status.success {
            let message =
                ApiError::from_reply(response.status.error, response.status.message).message;
            warn!(%message, "sync rejected by backend");
            self.view.alert(&format!("Sync failed: {message}"));
            return Ok(Outcome::Failed(message));
        }

        let new_files = response.files.len();
        let (images, source) = match response.images {
            Some(images) => (Some(images), ImageListSource::Embedded),
            None => match self.backend.list_images().await {
                Ok(images) => (Some(images), ImageListSource::Refetched),
                Err(err) => {
                    error!(%err, "error fetching images after sync");
                    (None, ImageListSource::Unchanged)
                }
            },
        };

        let adopted = match images {
            Some(images) => {
                let count = images.len();
                {
                    let mut state = self.state.lock().await;
                    state.replace_images(images);
                    state.mark_synced(Utc::now());
                }
                self.schedule(RenderTask::ImageList).await;
                count
            }
            None => 0,
        };

        info!(new_files, images = adopted, ?source, "sync completed");
        Ok(Outcome::Done(SyncSummary {
            new_files,
            images: adopted,
            source,
        }))
    }

    /// Uploads every processed crop. Returns the uploaded asset ids.
    pub async fn upload_all(&self) -> Result<Outcome<Vec<String>>, ClientError> {
        if self.is_syncing() {
            info!("upload blocked: sync in progress");
            return Ok(Outcome::Blocked(BlockReason::SyncInProgress));
        }

        let response = match self.backend.upload_all().await {
            Ok(response) => response,
            Err(err) => {
                error!(%err, "error uploading to photo service");
                self.view
                    .alert(&format!("Error uploading to photo service: {err}"));
                return Err(err);
            }
        };

        match response.status.into_result() {
            Ok(_) => {
                let assets: Vec<String> =
                    response.uploaded_assets.into_iter().map(asset_label).collect();
                info!(uploaded = assets.len(), "upload completed");
                self.view.alert(&format!(
                    "Successfully uploaded {} images to the photo service",
                    assets.len()
                ));
                Ok(Outcome::Done(assets))
            }
            Err(rejection) => {
                let message = rejection.message;
                warn!(%message, "upload rejected by backend");
                self.view
                    .alert(&format!("Error uploading to photo service: {message}"));
                Ok(Outcome::Failed(message))
            }
        }
    }

    pub async fn select_image(&self, identifier: &str) -> Outcome {
        let selected = {
            let mut state = self.state.lock().await;
            state
                .select(identifier)
                .cloned()
                .map(|image| (image, state.stage()))
        };
        match selected {
            Some((image, stage)) => {
                self.view.show_screen(Screen::Editor);
                self.view.show_image(&image, stage);
                Outcome::Done(())
            }
            None => {
                warn!(identifier, "select: unknown image");
                Outcome::Blocked(BlockReason::UnknownImage)
            }
        }
    }

    pub async fn set_crop(&self, orientation: Orientation, rect: CropRect) {
        self.state.lock().await.set_crop(orientation, rect);
    }

    pub async fn set_stage(&self, stage: u8) {
        self.state.lock().await.set_stage(stage);
        self.schedule(RenderTask::UpdateStage).await;
    }

    pub async fn set_unprocessed_only(&self, enabled: bool) {
        self.state.lock().await.set_unprocessed_only(enabled);
        self.schedule(RenderTask::ImageList).await;
    }

    /// Re-derives the status of `identifier` from the backend's saved crops.
    /// When either lookup fails the editor's crop buffers stand in, but only
    /// for the image they belong to; any other image keeps its stored status.
    pub async fn reconcile_status(&self, identifier: &str) -> StatusReport {
        let (portrait, landscape) = futures::join!(
            self.backend.fetch_crop(identifier, Orientation::Portrait),
            self.backend.fetch_crop(identifier, Orientation::Landscape),
        );

        let report = match (crop_saved(portrait), crop_saved(landscape)) {
            (Ok(has_portrait), Ok(has_landscape)) => StatusReport {
                status: ImageStatus::from_presence(has_portrait, has_landscape),
                source: StatusSource::Backend,
            },
            (portrait, landscape) => {
                let reason = portrait
                    .err()
                    .or(landscape.err())
                    .map(|err| err.to_string())
                    .unwrap_or_default();
                let state = self.state.lock().await;
                if state.is_current(identifier) {
                    warn!(
                        identifier,
                        error = %reason,
                        "crop lookup failed; using local crop buffers"
                    );
                    StatusReport {
                        status: state.local_status(),
                        source: StatusSource::LocalCrops,
                    }
                } else {
                    warn!(
                        identifier,
                        error = %reason,
                        "crop lookup failed; keeping stored status"
                    );
                    let status = state
                        .image(identifier)
                        .map_or(ImageStatus::Unprocessed, |image| image.status);
                    return StatusReport {
                        status,
                        source: StatusSource::Stored,
                    };
                }
            }
        };

        self.state
            .lock()
            .await
            .set_status(identifier, report.status);
        self.view
            .update_item_status(identifier, report.status, presentation(report.status));
        debug!(identifier, status = %report.status, source = ?report.source, "status reconciled");
        report
    }

    /// Marks the current image completed and moves to the next image needing
    /// work. Returns the newly selected identifier, if any.
    pub async fn complete_image(&self) -> Outcome<Option<String>> {
        if self.is_syncing() {
            info!("complete blocked: sync in progress");
            return Outcome::Blocked(BlockReason::SyncInProgress);
        }
        let Some(identifier) = self.state.lock().await.current_identifier() else {
            return Outcome::Blocked(BlockReason::NoCurrentImage);
        };

        if let Err(err) = accepted(self.backend.complete(&identifier).await) {
            error!(%err, identifier, "error completing image");
            self.view.alert(&format!("Error completing image: {err}"));
            return Outcome::Failed(err.to_string());
        }

        let (next, navigation) = {
            let mut state = self.state.lock().await;
            state.set_status(&identifier, ImageStatus::Completed);
            if !state.is_current(&identifier) {
                // The user moved on while the request was in flight.
                (None, None)
            } else {
                match state.next_actionable().map(|image| image.identifier().to_string()) {
                    Some(next) => {
                        state.select(&next);
                        (Some(next.clone()), Some(RenderTask::SelectImage(next)))
                    }
                    None => {
                        state.clear_current();
                        let unprocessed_only = state.unprocessed_only();
                        (None, Some(RenderTask::AllProcessed { unprocessed_only }))
                    }
                }
            }
        };

        self.view.update_item_status(
            &identifier,
            ImageStatus::Completed,
            presentation(ImageStatus::Completed),
        );
        if let Some(task) = navigation {
            self.schedule(task).await;
        }
        info!(identifier, next = ?next, "image completed");
        Outcome::Done(next)
    }

    /// Discards the current image's crops and returns it to the first stage.
    pub async fn reset_image(&self) -> Outcome {
        if self.is_syncing() {
            info!("reset blocked: sync in progress");
            return Outcome::Blocked(BlockReason::SyncInProgress);
        }
        let Some(identifier) = self.state.lock().await.current_identifier() else {
            return Outcome::Blocked(BlockReason::NoCurrentImage);
        };

        if let Err(err) = accepted(self.backend.reset(&identifier).await) {
            error!(%err, identifier, "error resetting image");
            self.view.alert(&format!("Error resetting image: {err}"));
            return Outcome::Failed(err.to_string());
        }

        {
            let mut state = self.state.lock().await;
            if state.is_current(&identifier) {
                state.clear_crops();
                state.set_stage(crate::state::FIRST_STAGE);
            }
            state.set_status(&identifier, ImageStatus::Unprocessed);
        }
        self.view.update_item_status(
            &identifier,
            ImageStatus::Unprocessed,
            presentation(ImageStatus::Unprocessed),
        );
        self.schedule(RenderTask::UpdateStage).await;
        info!(identifier, "image reset");
        Outcome::Done(())
    }

    /// Removes saved crop data without any user interaction.
    pub async fn delete_crop_metadata(
        &self,
        identifier: &str,
        orientation: Orientation,
    ) -> Outcome<ReplyStatus> {
        if identifier.trim().is_empty() {
            error!("missing identifier for delete operation");
            return Outcome::Blocked(BlockReason::MissingParameters);
        }
        if self.is_syncing() {
            return Outcome::Blocked(BlockReason::SyncInProgress);
        }

        match self.backend.delete_crop(identifier, orientation).await {
            Ok(reply) if reply.success => {
                info!(identifier, %orientation, "deleted crop metadata");
                Outcome::Done(reply)
            }
            Ok(reply) => {
                let message = ApiError::from_reply(reply.error, reply.message).message;
                warn!(identifier, %orientation, %message, "failed to delete crop metadata");
                Outcome::Failed(message)
            }
            Err(err) => {
                error!(%err, identifier, %orientation, "error deleting crop metadata");
                Outcome::Failed(err.to_string())
            }
        }
    }

    pub async fn open_manage(&self) -> Outcome<usize> {
        self.view.show_manage(true);
        self.load_manage_data().await
    }

    pub fn close_manage(&self) {
        self.view.show_manage(false);
    }

    /// Rebuilds the manage table from the backend. Returns the row count.
    pub async fn load_manage_data(&self) -> Outcome<usize> {
        self.view.render_manage(&ManageView::Loading);

        let (images, crops) =
            match futures::try_join!(self.backend.list_images(), self.backend.all_crops()) {
                Ok(loaded) => loaded,
                Err(err) => {
                    error!(%err, "error loading manage data");
                    self.view
                        .render_manage(&ManageView::Error(MANAGE_LOAD_ERROR.to_string()));
                    return Outcome::Failed(err.to_string());
                }
            };

        let rows = build_rows(&images, &crops, self.backend.as_ref(), self.output_sizes);
        let count = rows.len();
        if rows.is_empty() {
            self.view.render_manage(&ManageView::Empty);
        } else {
            self.view.render_manage(&ManageView::Table(rows));
        }
        Outcome::Done(count)
    }

    /// Deletes one saved crop after confirmation, then refreshes the table and
    /// the affected image's status.
    pub async fn delete_crop_image(&self, identifier: &str, orientation: Orientation) -> Outcome {
        if self.is_syncing() {
            return Outcome::Blocked(BlockReason::SyncInProgress);
        }
        if !self
            .view
            .confirm(&format!("Are you sure you want to delete the {orientation} crop?"))
        {
            return Outcome::Blocked(BlockReason::Declined);
        }

        if let Err(err) = accepted(self.backend.delete_crop(identifier, orientation).await) {
            let message = err.to_string();
            error!(identifier, %orientation, %message, "error deleting crop");
            self.view.notify(
                &format!("Error deleting {orientation} crop: {message}"),
                NoticeLevel::Error,
            );
            return Outcome::Failed(message);
        }

        self.load_manage_data().await;

        let is_current = {
            let mut state = self.state.lock().await;
            let is_current = state.is_current(identifier);
            if is_current {
                state.set_crop(orientation, CropRect::default());
            }
            is_current
        };
        if is_current {
            self.reconcile_status(identifier).await;
        }

        self.view.notify(
            &format!("{orientation} crop deleted successfully"),
            NoticeLevel::Success,
        );
        Outcome::Done(())
    }

    /// Uploads one crop again after confirmation.
    pub async fn reupload_crop_image(
        &self,
        identifier: &str,
        orientation: Orientation,
    ) -> Outcome {
        if self.is_syncing() {
            return Outcome::Blocked(BlockReason::SyncInProgress);
        }
        if !self.view.confirm(&format!(
            "Are you sure you want to re-upload the {orientation} crop to the photo service?"
        )) {
            return Outcome::Blocked(BlockReason::Declined);
        }

        let _busy = BusyAction::start(
            self.view.as_ref(),
            identifier,
            ManageAction::Reupload(orientation),
        );
        match accepted(self.backend.upload_single(identifier, orientation).await) {
            Ok(_) => {
                info!(identifier, %orientation, "crop re-uploaded");
                self.view.notify(
                    &format!("{orientation} crop uploaded successfully"),
                    NoticeLevel::Success,
                );
                Outcome::Done(())
            }
            Err(err) => {
                let message = err.to_string();
                error!(identifier, %orientation, %message, "error uploading crop");
                self.view.notify(
                    &format!("Error uploading {orientation} crop: {message}"),
                    NoticeLevel::Error,
                );
                Outcome::Failed(message)
            }
        }
    }

    /// Leaves the manage view and opens the editor on the given crop stage.
    pub async fn recrop_image(&self, identifier: &str, orientation: Orientation) -> Outcome {
        self.close_manage();
        let selected = self.select_image(identifier).await;
        if !selected.is_done() {
            return selected;
        }
        self.set_stage(orientation.stage()).await;
        Outcome::Done(())
    }

    /// Removes the source image from the photo service after confirmation.
    pub async fn delete_original_image(&self, identifier: &str, display_name: &str) -> Outcome {
        if self.is_syncing() {
            return Outcome::Blocked(BlockReason::SyncInProgress);
        }
        let confirmed = self.view.confirm(&format!(
            "Are you sure you want to delete \"{display_name}\" from the source album?\n\n\
             This will permanently remove the original image from the photo service. \
             This action cannot be undone."
        ));
        if !confirmed {
            return Outcome::Blocked(BlockReason::Declined);
        }

        let _busy = BusyAction::start(self.view.as_ref(), identifier, ManageAction::DeleteOriginal);
        if let Err(err) = accepted(self.backend.delete_original(identifier).await) {
            let message = err.to_string();
            error!(identifier, %message, "error deleting original image");
            self.view.notify(
                &format!("Error deleting original image: {message}"),
                NoticeLevel::Error,
            );
            return Outcome::Failed(message);
        }

        self.view.remove_manage_row(identifier);
        let was_current = {
            let mut state = self.state.lock().await;
            let was_current = state.is_current(identifier);
            state.remove(identifier);
            was_current
        };
        self.schedule(RenderTask::ImageList).await;
        if was_current {
            self.schedule(RenderTask::NoImage).await;
        }

        info!(identifier, "original image deleted");
        self.view
            .notify("Original image deleted successfully", NoticeLevel::Success);
        Outcome::Done(())
    }

    /// Flushes deferred renders. The host calls this once per frame; if a sync
    /// started since the renders were queued they are dropped. Returns how many
    /// renders ran.
    pub async fn run_frame(&self) -> usize {
        let tasks = self
            .renders
            .lock()
            .await
            .take_frame(self.sync_gate.is_syncing());
        if tasks.is_empty() {
            return 0;
        }

        let state = self.snapshot().await;
        for task in &tasks {
            match task {
                RenderTask::ImageList => self
                    .view
                    .render_image_list(state.images(), state.unprocessed_only()),
                RenderTask::UpdateStage => self.view.update_stage(state.stage()),
                RenderTask::SelectImage(identifier) => {
                    if let Some(image) = state.current().filter(|image| image.is(identifier)) {
                        self.view.show_screen(Screen::Editor);
                        self.view.show_image(image, state.stage());
                    }
                }
                RenderTask::NoImage => self.view.show_screen(Screen::NoImage),
                RenderTask::AllProcessed { unprocessed_only } => {
                    self.view.show_screen(Screen::NoImage);
                    self.view.alert(all_processed_message(*unprocessed_only));
                }
            }
        }
        tasks.len()
    }
}

pub fn all_processed_message(unprocessed_only: bool) -> &'static str {
    if unprocessed_only {
        ALL_UNPROCESSED_DONE_MESSAGE
    } else {
        ALL_PROCESSED_MESSAGE
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
