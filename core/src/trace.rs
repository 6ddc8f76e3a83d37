use std::collections::BTreeMap;

use tracing::{debug, trace};
use tracesync_proto::{Event, Payload, ProcessId, ProcessTrace, Timestamp};

use crate::{
    amortization::{forward, AmortizationPlan, BaTask, Refill, SendHandle, SendSeq, SendTable, TaskQueue},
    config::SyncConfig,
    corrector::LocalClock,
    cursor::{EventCursor, TraceCursor},
    error::{MalformedTrace, SyncError},
};

/// A message leaving this process, to be queued in the message matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Outgoing {
    pub target: ProcessId,
    pub handle: SendHandle,
}

/// Synchronization state of one process.
///
/// Owns the cursor over the process's events, the offset aligning its clock to the common
/// one, and the bookkeeping both amortizations need. Receive times travel between traces as
/// [`Refill`]s collected in an outbox; the owner of all traces delivers them.
#[derive(Debug)]
pub struct SyncedTrace {
    cursor: EventCursor,
    config: SyncConfig,
    time_offset: Timestamp,
    clock: LocalClock,
    sends: SendTable,
    /// Output index of each processed receive -> the send it matched.
    receive_links: BTreeMap<usize, SendHandle>,
    tasks: TaskQueue,
    outbox: Vec<Refill>,
}

impl SyncedTrace {
    pub fn new(trace: ProcessTrace, time_offset: Timestamp, config: SyncConfig) -> Self {
        Self {
            cursor: EventCursor::new(trace),
            config,
            time_offset,
            clock: LocalClock::new(config.min_event_diff, config.min_msg_delay),
            sends: SendTable::new(config.min_msg_delay),
            receive_links: BTreeMap::new(),
            tasks: TaskQueue::default(),
            outbox: Vec::new(),
        }
    }

    pub fn process_id(&self) -> ProcessId { self.cursor.process_id() }

    pub fn cursor(&self) -> &EventCursor { &self.cursor }

    pub fn time_offset(&self) -> Timestamp { self.time_offset }

    pub fn sends(&self) -> &SendTable { &self.sends }

    pub fn pending_tasks(&self) -> usize { self.tasks.len() }

    /// Corrected time of one of this process's sends, including any backward shift so far.
    pub fn send_time(&self, seq: SendSeq) -> Option<Timestamp> { self.sends.get(seq).map(|r| r.time) }

    /// Process the next event, which must not be a receive. Sends are recorded and returned so
    /// the caller can queue them for their receiver.
    pub fn process_local(&mut self) -> Result<Option<Outgoing>, SyncError> {
        let process = self.process_id();
        let Some(event) = self.cursor.advance_and_decode() else {
            return Ok(None);
        };
        if event.is_receive() {
            return Err(MalformedTrace::MissingSender { process }.into());
        }

        let time = self.clock.local(event.time.saturating_add(self.time_offset));
        self.cursor.patch_last_timestamp(time);
        trace!(%process, %event, time, "local event");

        match event.payload {
            Payload::Send { target, .. } => Ok(Some(self.process_send(time, target))),
            _ => Ok(None),
        }
    }

    fn process_send(&mut self, time: Timestamp, target: ProcessId) -> Outgoing {
        let index = self.cursor.consumed() - 1;
        let seq = self.sends.push(index, time);
        Outgoing { target, handle: SendHandle { sender: self.process_id(), seq } }
    }

    /// Process the next event as the receive of the message identified by `handle`, whose send
    /// currently sits at `send_time`. Returns the corrected receive time.
    pub fn process_receive(&mut self, send_time: Timestamp, handle: SendHandle) -> Result<Timestamp, SyncError> {
        let process = self.process_id();
        let event = match self.cursor.advance_and_decode() {
            Some(event) if event.is_receive() => event,
            _ => return Err(MalformedTrace::MissingSender { process }.into()),
        };

        let correction = self.clock.receive(event.time.saturating_add(self.time_offset), send_time);
        self.cursor.patch_last_timestamp(correction.time);
        let index = self.cursor.consumed() - 1;
        self.receive_links.insert(index, handle);
        self.outbox.push(Refill { handle, receive_time: correction.time });

        let jump = correction.message_jump();
        trace!(%process, raw = event.time, time = correction.time, send_time, jump, "receive");
        if jump > 0 {
            if self.config.forward_amortization {
                self.time_offset = forward::amortize(self.time_offset, &correction);
                debug!(%process, offset = self.time_offset, "forward amortization");
            }
            if self.config.backward_amortization {
                self.tasks.push(BaTask { trigger: index, time: correction.time, jump });
            }
        }
        self.run_ready_tasks();

        Ok(correction.time)
    }

    /// Record that the receive of one of this process's sends now sits at `time`, and run any
    /// deferred amortization that became ready.
    pub fn refill_receive_time(&mut self, seq: SendSeq, time: Timestamp) -> bool {
        if !self.sends.refill(seq, time) {
            return false;
        }
        self.run_ready_tasks();
        true
    }

    /// Receive-time updates produced since the last call.
    pub fn take_refills(&mut self) -> Vec<Refill> { std::mem::take(&mut self.outbox) }

    /// Run every remaining deferred amortization. Sends still lacking a receive time keep
    /// everything before them in place.
    pub fn finalize(&mut self) {
        let remaining = self.tasks.len();
        while let Some(task) = self.tasks.pop_any() {
            self.amortize_backward(task);
        }
        debug!(process = %self.process_id(), remaining, offset = self.time_offset, "trace finalized");
    }

    pub fn output(&self) -> &[Event] { self.cursor.output() }

    pub fn into_output(self) -> ProcessTrace { self.cursor.into_output() }

    fn run_ready_tasks(&mut self) {
        while let Some(task) = self.tasks.pop_ready(&mut self.sends) {
            self.amortize_backward(task);
        }
    }

    fn amortize_backward(&mut self, task: BaTask) {
        let plan = AmortizationPlan::new(&self.sends, task.trigger, task.jump);
        debug!(
            process = %self.process_id(),
            trigger = task.trigger,
            time = task.time,
            jump = task.jump,
            breakpoints = plan.breakpoints.len(),
            "backward amortization"
        );
        let refills = plan.apply(self.cursor.output_mut(), &mut self.sends, &self.receive_links);
        self.outbox.extend(refills);
    }
}
