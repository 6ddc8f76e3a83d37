//! Forward-only access to one process's events.
//!
//! The traversal never decodes bytes itself: it peeks at the next event through a
//! [`TraceCursor`], consumes it, and rewrites the timestamp of what it just consumed.
//! [`EventCursor`] is the in-memory implementation over a decoded [`ProcessTrace`]; corrected
//! events accumulate in its output buffer and are only encoded again at export time.

use tracesync_proto::{Event, EventKind, ProcessId, ProcessTrace, Timestamp};

pub trait TraceCursor {
    fn process_id(&self) -> ProcessId;

    fn next_event_kind(&self) -> Option<EventKind>;

    fn next_event_time(&self) -> Option<Timestamp>;

    /// Consume the next event, append it to the output and return it.
    fn advance_and_decode(&mut self) -> Option<Event>;

    /// Rewrite the timestamp of the most recently consumed event.
    fn patch_last_timestamp(&mut self, time: Timestamp);

    /// Sender of the next event if it is a receive, without consuming it.
    fn message_target_of_next_receive(&self) -> Option<ProcessId>;

    fn is_exhausted(&self) -> bool { self.next_event_kind().is_none() }
}

#[derive(Debug, Clone)]
pub struct EventCursor {
    process_id: ProcessId,
    init_time: Timestamp,
    input: Vec<Event>,
    position: usize,
    output: Vec<Event>,
}

impl EventCursor {
    pub fn new(trace: ProcessTrace) -> Self {
        let capacity = trace.events.len();
        Self { process_id: trace.process_id, init_time: trace.init_time, input: trace.events, position: 0, output: Vec::with_capacity(capacity) }
    }

    /// Events consumed so far, with whatever timestamps have been written back.
    pub fn output(&self) -> &[Event] { &self.output }

    pub fn output_mut(&mut self) -> &mut [Event] { &mut self.output }

    pub fn consumed(&self) -> usize { self.position }

    /// The corrected trace. Only meaningful once the cursor is exhausted.
    pub fn into_output(self) -> ProcessTrace { ProcessTrace::new(self.process_id, self.init_time, self.output) }

    fn peek(&self) -> Option<&Event> { self.input.get(self.position) }
}

impl TraceCursor for EventCursor {
    fn process_id(&self) -> ProcessId { self.process_id }

    fn next_event_kind(&self) -> Option<EventKind> { self.peek().map(Event::kind) }

    fn next_event_time(&self) -> Option<Timestamp> { self.peek().map(|e| e.time) }

    fn advance_and_decode(&mut self) -> Option<Event> {
        let event = self.input.get(self.position)?.clone();
        self.position += 1;
        self.output.push(event.clone());
        Some(event)
    }

    fn patch_last_timestamp(&mut self, time: Timestamp) {
        if let Some(last) = self.output.last_mut() {
            last.time = time;
        }
    }

    fn message_target_of_next_receive(&self) -> Option<ProcessId> {
        match self.peek() {
            Some(event) if event.is_receive() => event.peer(),
            _ => None,
        }
    }
}
