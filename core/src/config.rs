//! Synchronization settings.

use serde::{Deserialize, Serialize};
use tracesync_proto::Timestamp;

use crate::error::SyncError;

/// Options for one synchronization run. Times are in nanoseconds.
///
/// Defaults mirror the settings the synchronizer has always shipped with: 10ns minimal
/// spacing, 10ns minimal message delay, both amortizations on, earliest-start alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Minimal difference between two successive events of one process.
    pub min_event_diff: Timestamp,
    /// Minimal delay between a send and its matching receive.
    pub min_msg_delay: Timestamp,
    pub forward_amortization: bool,
    pub backward_amortization: bool,
    /// Align every process's first event to the latest-starting process instead of aligning
    /// declared init times to the earliest one.
    pub weak_initial_sync: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self { min_event_diff: 10, min_msg_delay: 10, forward_amortization: true, backward_amortization: true, weak_initial_sync: false }
    }
}

impl SyncConfig {
    /// No spacing, no delay, no amortization: a causally consistent log passes through unchanged.
    pub fn passthrough() -> Self {
        Self { min_event_diff: 0, min_msg_delay: 0, forward_amortization: false, backward_amortization: false, weak_initial_sync: false }
    }

    pub fn from_json(json: &str) -> Result<Self, SyncError> { Ok(serde_json::from_str(json)?) }

    pub fn with_min_event_diff(mut self, diff: Timestamp) -> Self {
        self.min_event_diff = diff;
        self
    }

    pub fn with_min_msg_delay(mut self, delay: Timestamp) -> Self {
        self.min_msg_delay = delay;
        self
    }

    pub fn with_forward_amortization(mut self, enabled: bool) -> Self {
        self.forward_amortization = enabled;
        self
    }

    pub fn with_backward_amortization(mut self, enabled: bool) -> Self {
        self.backward_amortization = enabled;
        self
    }

    pub fn with_weak_initial_sync(mut self, enabled: bool) -> Self {
        self.weak_initial_sync = enabled;
        self
    }
}
