//! Before/after statistics of a synchronization.
//!
//! Both logs are replayed independently on blocking worker threads and joined before the
//! results are combined. The interesting number is how much each interval following a send
//! changed: synchronization should keep them, so every changed interval is a breakpoint.

use serde::{Deserialize, Serialize};
use tokio::task::{spawn_blocking, JoinError};
use tracing::{debug, warn};
use tracesync_proto::{Event, EventKind, ProcessId, Timestamp, Tracelog};

use crate::{
    error::{ComparisonError, LogSide, SyncError},
    initial::InitialSync,
    replay::{Replay, ReplayObserver},
};

/// What one replay of a log gathers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogStatistics {
    first_event: Option<Timestamp>,
    last_event: Timestamp,
    idle_time: Timestamp,
    idle_count: usize,
    /// Per process: time from each send to the process's next event.
    send_intervals: Vec<Vec<Timestamp>>,
    /// Per process: kind and time of the previous event.
    previous: Vec<Option<(EventKind, Timestamp)>>,
}

impl LogStatistics {
    pub fn gather(tracelog: &Tracelog, policy: InitialSync) -> Result<Self, SyncError> {
        let count = tracelog.process_count();
        let mut stats = Self { send_intervals: vec![Vec::new(); count], previous: vec![None; count], ..Self::default() };
        Replay::new(tracelog, policy, &mut stats).run()?;
        Ok(stats)
    }

    pub fn execution_time(&self) -> Timestamp { self.first_event.map_or(0, |first| self.last_event.saturating_sub(first)) }

    pub fn idle_time(&self) -> Timestamp { self.idle_time }

    pub fn idle_average(&self) -> Timestamp {
        if self.idle_count == 0 {
            0
        } else {
            self.idle_time / self.idle_count as Timestamp
        }
    }

    pub fn send_intervals(&self, process: ProcessId) -> &[Timestamp] { self.send_intervals.get(process.index()).map(Vec::as_slice).unwrap_or_default() }

    pub fn process_count(&self) -> usize { self.send_intervals.len() }

    pub fn summary(&self) -> SideSummary {
        SideSummary { execution_time: self.execution_time(), idle_time: self.idle_time(), idle_avg: self.idle_average() }
    }
}

impl ReplayObserver for LogStatistics {
    fn on_event(&mut self, process: ProcessId, event: &Event, time: Timestamp) {
        let slot = process.index();
        match self.previous.get(slot).copied().flatten() {
            Some((EventKind::Idle, previous)) => {
                self.idle_time = self.idle_time.saturating_add(time.saturating_sub(previous));
                self.idle_count += 1;
            }
            Some((EventKind::Send, previous)) => self.send_intervals[slot].push(time.saturating_sub(previous)),
            Some(_) => {}
            None => self.first_event = Some(self.first_event.map_or(time, |first| first.min(time))),
        }
        if let Some(previous) = self.previous.get_mut(slot) {
            *previous = Some((event.kind(), time));
        }
        self.last_event = self.last_event.max(time);
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SideSummary {
    pub execution_time: Timestamp,
    pub idle_time: Timestamp,
    pub idle_avg: Timestamp,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonReport {
    pub original: SideSummary,
    pub synced: SideSummary,
    /// Send intervals whose length changed.
    pub breakpoints: usize,
    /// Largest change of a send interval (negative when intervals only shrank).
    pub max_gap: i64,
    pub avg_gap: i64,
}

/// Replay `original` and `synced` in parallel and compare them. With `weak_sync` the original
/// is aligned the way a weakly synchronized log was; the synced log is taken as it is.
pub async fn compare(original: Tracelog, synced: Tracelog, weak_sync: bool) -> Result<ComparisonReport, ComparisonError> {
    if original.process_count() != synced.process_count() {
        return Err(ComparisonError::ProcessCountMismatch { original: original.process_count(), synced: synced.process_count() });
    }

    let original_policy = InitialSync::from_weak(weak_sync);
    let (original, synced) = tokio::join!(
        spawn_blocking(move || LogStatistics::gather(&original, original_policy)),
        spawn_blocking(move || LogStatistics::gather(&synced, InitialSync::EarliestStart)),
    );
    let original = side_result(LogSide::Original, original)?;
    let synced = side_result(LogSide::Synced, synced)?;

    compare_statistics(&original, &synced)
}

fn side_result(side: LogSide, joined: Result<Result<LogStatistics, SyncError>, JoinError>) -> Result<LogStatistics, ComparisonError> {
    match joined {
        Ok(Ok(stats)) => Ok(stats),
        Ok(Err(source)) => {
            warn!(%side, error = %source, "log analysis failed");
            Err(ComparisonError::Analysis { side, source })
        }
        Err(join_error) => {
            warn!(%side, error = %join_error, "analysis worker failed");
            Err(ComparisonError::WorkerFailed { side, reason: join_error.to_string() })
        }
    }
}

pub fn compare_statistics(original: &LogStatistics, synced: &LogStatistics) -> Result<ComparisonReport, ComparisonError> {
    if original.process_count() != synced.process_count() {
        return Err(ComparisonError::ProcessCountMismatch { original: original.process_count(), synced: synced.process_count() });
    }

    let mut breakpoints = 0usize;
    let mut max_gap = 0i64;
    let mut gap_sum = 0i128;
    for process in ProcessId::range(original.process_count()) {
        let (before, after) = (original.send_intervals(process), synced.send_intervals(process));
        if before.len() != after.len() {
            return Err(ComparisonError::IntervalCountMismatch { process, original: before.len(), synced: after.len() });
        }
        for (before, after) in before.iter().zip(after) {
            let gap = i128::from(*after) - i128::from(*before);
            if gap != 0 {
                max_gap = max_gap.max(saturate(gap));
                gap_sum += gap;
                breakpoints += 1;
            }
        }
    }
    let avg_gap = if breakpoints == 0 { 0 } else { saturate(gap_sum / breakpoints as i128) };
    debug!(breakpoints, max_gap, avg_gap, "comparison finished");

    Ok(ComparisonReport { original: original.summary(), synced: synced.summary(), breakpoints, max_gap, avg_gap })
}

fn saturate(gap: i128) -> i64 { i64::try_from(gap).unwrap_or(if gap < 0 { i64::MIN } else { i64::MAX }) }
