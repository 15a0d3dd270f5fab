//! Single in-flight guard for the remote sync.

use std::sync::atomic::{AtomicBool, Ordering};

use tracing::debug;

use crate::view::View;

#[derive(Debug, Default)]
pub struct SyncGate {
    in_flight: AtomicBool,
}

impl SyncGate {
    pub fn is_syncing(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Claims the gate, or returns `None` while another sync holds it. The
    /// check and the claim are one atomic step.
    pub fn try_begin<'a>(&'a self, view: &'a dyn View) -> Option<SyncPermit<'a>> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()?;
        view.set_sync_control(true);
        Some(SyncPermit { gate: self, view })
    }
}

/// Held for the duration of one sync. Dropping it reopens the gate and
/// re-enables the sync control on every exit path.
pub struct SyncPermit<'a> {
    gate: &'a SyncGate,
    view: &'a dyn View,
}

impl Drop for SyncPermit<'_> {
    fn drop(&mut self) {
        self.gate.in_flight.store(false, Ordering::Release);
        self.view.set_sync_control(false);
        debug!("sync state reset");
    }
}
