//! Message Exchange Matrix: one FIFO per ordered (sender, receiver) pair.
//!
//! FIFO order is what pairs a receive with its send: the k-th receive in `to` from `from`
//! matches the k-th send in `from` to `to`.

use std::collections::VecDeque;

use tracesync_proto::ProcessId;

use crate::error::MalformedTrace;

#[derive(Debug, Clone)]
pub struct MessageMatrix<T> {
    process_count: usize,
    queues: Vec<VecDeque<T>>,
}

impl<T> MessageMatrix<T> {
    pub fn new(process_count: usize) -> Self {
        Self { process_count, queues: (0..process_count * process_count).map(|_| VecDeque::new()).collect() }
    }

    pub fn process_count(&self) -> usize { self.process_count }

    pub fn push(&mut self, from: ProcessId, to: ProcessId, item: T) -> Result<(), MalformedTrace> {
        let slot = self.slot(from, to)?;
        self.queues[slot].push_back(item);
        Ok(())
    }

    pub fn pop(&mut self, from: ProcessId, to: ProcessId) -> Result<Option<T>, MalformedTrace> {
        let slot = self.slot(from, to)?;
        Ok(self.queues[slot].pop_front())
    }

    pub fn peek(&self, from: ProcessId, to: ProcessId) -> Result<Option<&T>, MalformedTrace> {
        let slot = self.slot(from, to)?;
        Ok(self.queues[slot].front())
    }

    pub fn has_pending(&self, from: ProcessId, to: ProcessId) -> Result<bool, MalformedTrace> { Ok(self.peek(from, to)?.is_some()) }

    /// Messages sent but not yet received, across all pairs.
    pub fn pending_total(&self) -> usize { self.queues.iter().map(VecDeque::len).sum() }

    fn slot(&self, from: ProcessId, to: ProcessId) -> Result<usize, MalformedTrace> {
        for (process, peer) in [(to, from), (from, to)] {
            if peer.index() >= self.process_count {
                return Err(MalformedTrace::UnknownProcess { process, peer, process_count: self.process_count });
            }
        }
        Ok(from.index() * self.process_count + to.index())
    }
}
