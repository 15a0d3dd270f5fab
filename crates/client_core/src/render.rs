//! Deferred rendering, flushed once per frame by the host.

use std::mem;

use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderTask {
    ImageList,
    UpdateStage,
    SelectImage(String),
    NoImage,
    AllProcessed { unprocessed_only: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RenderSlot {
    List,
    Stage,
    Navigation,
}

impl RenderTask {
    fn slot(&self) -> RenderSlot {
        match self {
            RenderTask::ImageList => RenderSlot::List,
            RenderTask::UpdateStage => RenderSlot::Stage,
            RenderTask::SelectImage(_) | RenderTask::NoImage | RenderTask::AllProcessed { .. } => {
                RenderSlot::Navigation
            }
        }
    }
}

/// Pending renders with latest-wins coalescing: a task replaces any queued task
/// in the same slot. A frame that runs while a sync is in flight drops
/// everything queued rather than deferring it again.
#[derive(Debug, Default)]
pub struct RenderQueue {
    pending: Vec<RenderTask>,
    version: u64,
}

impl RenderQueue {
    pub fn schedule(&mut self, task: RenderTask) -> u64 {
        let slot = task.slot();
        self.pending.retain(|queued| queued.slot() != slot);
        self.pending.push(task);
        self.version += 1;
        self.version
    }

    /// Incremented on every schedule; lets callers tell whether anything was
    /// queued since they last looked.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn take_frame(&mut self, syncing: bool) -> Vec<RenderTask> {
        let tasks = mem::take(&mut self.pending);
        if syncing && !tasks.is_empty() {
            debug!(dropped = tasks.len(), "skipping frame: sync in progress");
            return Vec::new();
        }
        tasks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_slot_keeps_only_latest() {
        let mut queue = RenderQueue::default();
        queue.schedule(RenderTask::SelectImage("a".into()));
        queue.schedule(RenderTask::ImageList);
        queue.schedule(RenderTask::AllProcessed {
            unprocessed_only: true,
        });
        queue.schedule(RenderTask::ImageList);

        assert_eq!(queue.version(), 4);
        assert_eq!(
            queue.take_frame(false),
            vec![
                RenderTask::AllProcessed {
                    unprocessed_only: true
                },
                RenderTask::ImageList,
            ]
        );
        assert!(queue.is_empty());
    }

    #[test]
    fn frame_during_sync_drops_pending_work() {
        let mut queue = RenderQueue::default();
        queue.schedule(RenderTask::ImageList);
        assert!(queue.take_frame(true).is_empty());
        assert!(queue.is_empty());
        assert!(queue.take_frame(false).is_empty());
    }
}
