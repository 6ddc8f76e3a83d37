//! Per-process record of outstanding and answered sends.

use tracesync_proto::{ProcessId, Timestamp};

/// Position of a send in its process's [`SendTable`].
pub type SendSeq = usize;

/// Reference to one send: the process that sent it and its position there.
/// This is what travels through the message matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SendHandle {
    pub sender: ProcessId,
    pub seq: SendSeq,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendRecord {
    /// Position of the send in the process's output buffer.
    pub index: usize,
    /// Corrected send time.
    pub time: Timestamp,
    /// Corrected receive time, once the receiver has processed the message.
    pub receive: Option<Timestamp>,
    /// How far the send could move later without breaking the clock condition:
    /// `receive - min_msg_delay - time`. Zero while unresolved.
    pub slack: Timestamp,
}

#[derive(Debug, Clone)]
pub struct SendTable {
    records: Vec<SendRecord>,
    /// Every record before this position has its receive time.
    resolved_prefix: usize,
    min_msg_delay: Timestamp,
}

impl SendTable {
    pub fn new(min_msg_delay: Timestamp) -> Self { Self { records: Vec::new(), resolved_prefix: 0, min_msg_delay } }

    pub fn push(&mut self, index: usize, time: Timestamp) -> SendSeq {
        debug_assert!(self.records.last().map_or(true, |r| r.index < index));
        self.records.push(SendRecord { index, time, receive: None, slack: 0 });
        self.records.len() - 1
    }

    pub fn get(&self, seq: SendSeq) -> Option<&SendRecord> { self.records.get(seq) }

    pub fn records(&self) -> &[SendRecord] { &self.records }

    pub fn len(&self) -> usize { self.records.len() }

    pub fn is_empty(&self) -> bool { self.records.is_empty() }

    /// Record (or update) the receive time of a send. Returns false for an unknown seq.
    pub fn refill(&mut self, seq: SendSeq, receive: Timestamp) -> bool {
        let min_msg_delay = self.min_msg_delay;
        let Some(record) = self.records.get_mut(seq) else {
            return false;
        };
        record.receive = Some(receive);
        record.slack = receive.saturating_sub(record.time.saturating_add(min_msg_delay));
        true
    }

    /// Move the send at output position `index` later by `shift`, consuming that much slack.
    pub fn shift_at(&mut self, index: usize, shift: Timestamp) -> Option<SendSeq> {
        let seq = self.records.binary_search_by_key(&index, |r| r.index).ok()?;
        let record = &mut self.records[seq];
        record.time = record.time.saturating_add(shift);
        record.slack = record.slack.saturating_sub(shift);
        Some(seq)
    }

    /// True when every send positioned before `bound` (or every send, without a bound) knows its receive time.
    pub fn resolved_before(&mut self, bound: Option<usize>) -> bool {
        while self.records.get(self.resolved_prefix).is_some_and(|r| r.receive.is_some()) {
            self.resolved_prefix += 1;
        }
        match (self.records.get(self.resolved_prefix), bound) {
            (None, _) => true,
            (Some(first_unresolved), Some(bound)) => first_unresolved.index >= bound,
            (Some(_), None) => false,
        }
    }
}
