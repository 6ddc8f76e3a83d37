//! Deferred backward amortizations.

use std::collections::VecDeque;

use tracesync_proto::Timestamp;

use super::send_table::SendTable;

/// A backward amortization waiting for the receive times of the sends before its trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BaTask {
    /// Output index of the receive that jumped.
    pub trigger: usize,
    /// Corrected time of that receive.
    pub time: Timestamp,
    pub jump: Timestamp,
}

impl BaTask {
    pub fn is_ready(&self, sends: &mut SendTable) -> bool { sends.resolved_before(Some(self.trigger)) }
}

/// FIFO of pending tasks. Triggers only grow, so once the front task is not ready no later
/// task is either.
#[derive(Debug, Default, Clone)]
pub struct TaskQueue {
    tasks: VecDeque<BaTask>,
}

impl TaskQueue {
    pub fn push(&mut self, task: BaTask) {
        debug_assert!(self.tasks.back().map_or(true, |last| last.trigger < task.trigger));
        self.tasks.push_back(task);
    }

    pub fn len(&self) -> usize { self.tasks.len() }

    pub fn is_empty(&self) -> bool { self.tasks.is_empty() }

    pub fn pop_ready(&mut self, sends: &mut SendTable) -> Option<BaTask> {
        if self.tasks.front()?.is_ready(sends) {
            self.tasks.pop_front()
        } else {
            None
        }
    }

    /// Next task regardless of readiness, for finalization.
    pub fn pop_any(&mut self) -> Option<BaTask> { self.tasks.pop_front() }
}
