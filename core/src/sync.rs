use std::{collections::VecDeque, fs, path::Path};

use tracing::{debug, info, warn};
use tracesync_proto::{archive, ProcessId, Timestamp, Tracelog};

use crate::{
    amortization::{Refill, SendHandle},
    config::SyncConfig,
    cursor::EventCursor,
    error::{MalformedTrace, SyncError},
    initial::{self, InitialSync},
    matrix::MessageMatrix,
    scheduler::{self, Traversal, TraversalSummary},
    trace::SyncedTrace,
};

/// A tracelog whose timestamps satisfy the clock condition.
///
/// Built either by synchronizing a raw tracelog ([`SyncedTraceLog::from_tracelog`]) or by
/// loading an archive that was exported from one earlier ([`SyncedTraceLog::from_archive`],
/// [`SyncedTraceLog::from_file`]).
#[derive(Debug, Clone)]
pub struct SyncedTraceLog {
    tracelog: Tracelog,
    time_offsets: Vec<Timestamp>,
    summary: Option<TraversalSummary>,
}

impl SyncedTraceLog {
    pub fn from_tracelog(tracelog: Tracelog, config: SyncConfig) -> Result<Self, SyncError> {
        let alignment = initial::align(&tracelog, InitialSync::from_weak(config.weak_initial_sync));
        let (pointer_size, traces, project) = tracelog.into_parts();
        info!(processes = traces.len(), ?config, "synchronizing tracelog");

        let mut synchronizer = Synchronizer::new(traces.into_iter().zip(&alignment.offsets).map(|(t, offset)| SyncedTrace::new(t, *offset, config)).collect());
        let summary = scheduler::run(&mut synchronizer)?;
        synchronizer.finalize()?;

        let pending = synchronizer.messages.pending_total();
        if pending > 0 {
            warn!(pending, "messages were sent but never received");
        }

        let time_offsets = synchronizer.traces.iter().map(SyncedTrace::time_offset).collect();
        let traces = synchronizer
            .traces
            .into_iter()
            .map(|trace| {
                let mut output = trace.into_output();
                output.init_time = alignment.reference_init_time;
                output
            })
            .collect();
        let tracelog = Tracelog::new(pointer_size, traces, project)?;
        info!(events = summary.events, stalls = summary.stalls, "tracelog synchronized");

        Ok(Self { tracelog, time_offsets, summary: Some(summary) })
    }

    /// Load an already synchronized archive. Its timestamps are taken as they are.
    pub fn from_archive(data: &[u8]) -> Result<Self, SyncError> {
        let tracelog = archive::decode(data)?;
        let time_offsets = initial::align(&tracelog, InitialSync::EarliestStart).offsets;
        Ok(Self { tracelog, time_offsets, summary: None })
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SyncError> {
        let path = path.as_ref();
        debug!(path = %path.display(), "loading synced tracelog");
        Self::from_archive(&fs::read(path)?)
    }

    pub fn export(&self) -> Result<Vec<u8>, SyncError> { Ok(archive::encode(&self.tracelog)?) }

    pub fn export_to_file(&self, path: impl AsRef<Path>) -> Result<(), SyncError> {
        let path = path.as_ref();
        fs::write(path, self.export()?)?;
        debug!(path = %path.display(), "exported synced tracelog");
        Ok(())
    }

    pub fn tracelog(&self) -> &Tracelog { &self.tracelog }

    pub fn into_tracelog(self) -> Tracelog { self.tracelog }

    /// Final time offset of each process: the initial alignment plus everything forward
    /// amortization added.
    pub fn time_offsets(&self) -> &[Timestamp] { &self.time_offsets }

    /// Traversal statistics, when this log was synchronized rather than loaded.
    pub fn summary(&self) -> Option<TraversalSummary> { self.summary }
}

/// Owns every trace plus the message matrix, and routes receive times back to senders.
struct Synchronizer {
    traces: Vec<SyncedTrace>,
    messages: MessageMatrix<SendHandle>,
    refills: VecDeque<Refill>,
}

impl Synchronizer {
    fn new(traces: Vec<SyncedTrace>) -> Self {
        let count = traces.len();
        Self { traces, messages: MessageMatrix::new(count), refills: VecDeque::new() }
    }

    fn trace_mut(&mut self, process: ProcessId) -> Result<&mut SyncedTrace, SyncError> {
        let process_count = self.traces.len();
        self.traces.get_mut(process.index()).ok_or_else(|| MalformedTrace::UnknownProcess { process, peer: process, process_count }.into())
    }

    /// Deliver the outbox of `from`, and transitively whatever those deliveries produce.
    fn deliver_refills(&mut self, from: ProcessId) -> Result<(), SyncError> {
        let outbox = self.trace_mut(from)?.take_refills();
        self.refills.extend(outbox);
        while let Some(Refill { handle, receive_time }) = self.refills.pop_front() {
            let sender = self.trace_mut(handle.sender)?;
            if !sender.refill_receive_time(handle.seq, receive_time) {
                warn!(sender = %handle.sender, seq = handle.seq, "receive time for unknown send");
            }
            let produced = sender.take_refills();
            self.refills.extend(produced);
        }
        Ok(())
    }

    fn finalize(&mut self) -> Result<(), SyncError> {
        for process in ProcessId::range(self.traces.len()) {
            self.trace_mut(process)?.finalize();
            self.deliver_refills(process)?;
        }
        Ok(())
    }
}

impl Traversal for Synchronizer {
    type Cursor = EventCursor;

    fn process_count(&self) -> usize { self.traces.len() }

    fn cursor(&self, process: ProcessId) -> &EventCursor { self.traces[process.index()].cursor() }

    fn has_message(&self, from: ProcessId, to: ProcessId) -> Result<bool, SyncError> { Ok(self.messages.has_pending(from, to)?) }

    fn process_event(&mut self, process: ProcessId) -> Result<(), SyncError> {
        if let Some(outgoing) = self.trace_mut(process)?.process_local()? {
            self.messages.push(process, outgoing.target, outgoing.handle)?;
        }
        Ok(())
    }

    fn process_receive(&mut self, process: ProcessId, sender: ProcessId) -> Result<(), SyncError> {
        let unmatched = MalformedTrace::UnmatchedReceive { process, sender };
        let handle = self.messages.pop(sender, process)?.ok_or(unmatched.clone())?;
        let send_time = self.trace_mut(handle.sender)?.send_time(handle.seq).ok_or(unmatched)?;
        self.trace_mut(process)?.process_receive(send_time, handle)?;
        self.deliver_refills(process)
    }

    fn finish_process(&mut self, process: ProcessId) -> Result<(), SyncError> {
        let trace = self.trace_mut(process)?;
        debug!(%process, offset = trace.time_offset(), deferred = trace.pending_tasks(), "process exhausted");
        Ok(())
    }
}
