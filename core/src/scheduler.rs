//! Cooperative traversal of all processes in causal order.
//!
//! One process is current at a time. Its events are processed in file order until it reaches
//! a receive whose message has not been sent yet; attention then moves to the sender without
//! consuming anything. A process that runs out of events is exhausted and the lowest pending
//! process becomes current.
//!
//! The stall chain records every process that handed over attention since the last event was
//! processed. Handing over to a process already on the chain means nobody in the cycle can
//! ever progress.

use tracing::{debug, trace};
use tracesync_proto::{EventKind, ProcessId};

use crate::{
    cursor::TraceCursor,
    error::{MalformedTrace, SyncError},
};

/// What the scheduler drives: the synchronizer, the verifier and the comparator each provide
/// their own event handling over the same traversal.
pub trait Traversal {
    type Cursor: TraceCursor;

    fn process_count(&self) -> usize;

    /// `process` is always below `process_count()`.
    fn cursor(&self, process: ProcessId) -> &Self::Cursor;

    /// Whether a message from `from` to `to` is waiting to be received.
    fn has_message(&self, from: ProcessId, to: ProcessId) -> Result<bool, SyncError>;

    /// Consume the next event of `process`, which is not a receive.
    fn process_event(&mut self, process: ProcessId) -> Result<(), SyncError>;

    /// Consume the next event of `process`, a receive whose message from `sender` is pending.
    fn process_receive(&mut self, process: ProcessId, sender: ProcessId) -> Result<(), SyncError>;

    fn finish_process(&mut self, _process: ProcessId) -> Result<(), SyncError> { Ok(()) }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TraversalSummary {
    pub events: usize,
    /// Times attention moved to a sender because its message was not there yet.
    pub stalls: usize,
}

pub fn run<T: Traversal + ?Sized>(traversal: &mut T) -> Result<TraversalSummary, SyncError> {
    let process_count = traversal.process_count();
    let mut exhausted = vec![false; process_count];
    let mut stall_chain: Vec<ProcessId> = Vec::new();
    let mut summary = TraversalSummary::default();
    let mut current = ProcessId::new(0);

    while current.index() < process_count {
        let cursor = traversal.cursor(current);
        let receive_from = cursor.message_target_of_next_receive();

        match cursor.next_event_kind() {
            None => {
                exhausted[current.index()] = true;
                traversal.finish_process(current)?;
                stall_chain.clear();
                trace!(process = %current, "exhausted");

                match exhausted.iter().position(|done| !done) {
                    Some(next) => current = ProcessId::new(next),
                    None => break,
                }
            }
            Some(EventKind::Receive) => {
                let sender = receive_from.ok_or(MalformedTrace::MissingSender { process: current })?;
                if sender.index() >= process_count {
                    return Err(MalformedTrace::UnknownProcess { process: current, peer: sender, process_count }.into());
                }

                if traversal.has_message(sender, current)? {
                    traversal.process_receive(current, sender)?;
                    summary.events += 1;
                    stall_chain.clear();
                    continue;
                }

                if exhausted[sender.index()] {
                    return Err(MalformedTrace::UnmatchedReceive { process: current, sender }.into());
                }
                stall_chain.push(current);
                if let Some(start) = stall_chain.iter().position(|p| *p == sender) {
                    return Err(SyncError::CausalDeadlock { waiting: stall_chain.split_off(start) });
                }

                trace!(process = %current, %sender, "stall");
                summary.stalls += 1;
                current = sender;
            }
            Some(_) => {
                traversal.process_event(current)?;
                summary.events += 1;
                stall_chain.clear();
            }
        }
    }

    debug!(events = summary.events, stalls = summary.stalls, "traversal complete");
    Ok(summary)
}
