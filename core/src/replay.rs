//! Read-only traversal of a tracelog in causal order.
//!
//! Nothing is corrected: each event is reported to a [`ReplayObserver`] with its time on the
//! common clock (raw time plus the process's initial offset), and each receive also with the
//! time of its matching send.

use tracesync_proto::{Event, Payload, ProcessId, Timestamp, Tracelog};

use crate::{
    cursor::{EventCursor, TraceCursor},
    error::{MalformedTrace, SyncError},
    initial::{self, InitialSync},
    matrix::MessageMatrix,
    scheduler::{self, Traversal, TraversalSummary},
};

pub trait ReplayObserver {
    /// Called for every event, receives included, in processing order.
    fn on_event(&mut self, process: ProcessId, event: &Event, time: Timestamp);

    fn on_receive(&mut self, _process: ProcessId, _send_time: Timestamp, _receive_time: Timestamp) {}
}

pub struct Replay<'a, O> {
    cursors: Vec<EventCursor>,
    offsets: Vec<Timestamp>,
    messages: MessageMatrix<Timestamp>,
    observer: &'a mut O,
}

impl<'a, O: ReplayObserver> Replay<'a, O> {
    pub fn new(tracelog: &Tracelog, policy: InitialSync, observer: &'a mut O) -> Self {
        let offsets = initial::align(tracelog, policy).offsets;
        let cursors: Vec<_> = tracelog.traces().iter().cloned().map(EventCursor::new).collect();
        let messages = MessageMatrix::new(cursors.len());
        Self { cursors, offsets, messages, observer }
    }

    pub fn run(mut self) -> Result<TraversalSummary, SyncError> { scheduler::run(&mut self) }

    fn consume(&mut self, process: ProcessId) -> Option<(Event, Timestamp)> {
        let event = self.cursors.get_mut(process.index())?.advance_and_decode()?;
        let time = event.time.saturating_add(self.offsets.get(process.index()).copied().unwrap_or_default());
        Some((event, time))
    }
}

impl<O: ReplayObserver> Traversal for Replay<'_, O> {
    type Cursor = EventCursor;

    fn process_count(&self) -> usize { self.cursors.len() }

    fn cursor(&self, process: ProcessId) -> &EventCursor { &self.cursors[process.index()] }

    fn has_message(&self, from: ProcessId, to: ProcessId) -> Result<bool, SyncError> { Ok(self.messages.has_pending(from, to)?) }

    fn process_event(&mut self, process: ProcessId) -> Result<(), SyncError> {
        let Some((event, time)) = self.consume(process) else {
            return Ok(());
        };
        if let Payload::Send { target, .. } = event.payload {
            self.messages.push(process, target, time)?;
        }
        self.observer.on_event(process, &event, time);
        Ok(())
    }

    fn process_receive(&mut self, process: ProcessId, sender: ProcessId) -> Result<(), SyncError> {
        let send_time = self.messages.pop(sender, process)?.ok_or(MalformedTrace::UnmatchedReceive { process, sender })?;
        let (event, time) = self.consume(process).ok_or(MalformedTrace::MissingSender { process })?;
        self.observer.on_receive(process, send_time, time);
        self.observer.on_event(process, &event, time);
        Ok(())
    }
}
