//! Clock-condition check over an uncorrected traversal.

use serde::{Deserialize, Serialize};
use tracing::debug;
use tracesync_proto::{Event, ProcessId, Timestamp, Tracelog};

use crate::{
    error::SyncError,
    initial::InitialSync,
    replay::{Replay, ReplayObserver},
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationReport {
    pub total_receives: usize,
    /// Receives timestamped before their matching send.
    pub violations: usize,
    /// Largest `send_time - receive_time` among the violations.
    pub max_delay: Timestamp,
    /// Mean of that delay over the violations; zero without any.
    pub avg_delay: Timestamp,
}

impl VerificationReport {
    pub fn is_consistent(&self) -> bool { self.violations == 0 }
}

#[derive(Default)]
struct ViolationCounter {
    report: VerificationReport,
    delay_sum: u128,
}

impl ReplayObserver for ViolationCounter {
    fn on_event(&mut self, _process: ProcessId, _event: &Event, _time: Timestamp) {}

    fn on_receive(&mut self, process: ProcessId, send_time: Timestamp, receive_time: Timestamp) {
        self.report.total_receives += 1;
        if receive_time < send_time {
            let delay = send_time - receive_time;
            debug!(%process, send_time, receive_time, delay, "clock condition violated");
            self.report.violations += 1;
            self.report.max_delay = self.report.max_delay.max(delay);
            self.delay_sum += u128::from(delay);
        }
    }
}

/// Verify a tracelog with declared init times aligned to the earliest start.
pub fn verify(tracelog: &Tracelog) -> Result<VerificationReport, SyncError> { verify_with(tracelog, InitialSync::EarliestStart) }

pub fn verify_with(tracelog: &Tracelog, policy: InitialSync) -> Result<VerificationReport, SyncError> {
    let mut counter = ViolationCounter::default();
    Replay::new(tracelog, policy, &mut counter).run()?;

    let mut report = counter.report;
    if report.violations > 0 {
        report.avg_delay = (counter.delay_sum / report.violations as u128) as Timestamp;
    }
    Ok(report)
}
