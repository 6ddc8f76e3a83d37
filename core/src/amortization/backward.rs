//! Backward amortization.
//!
//! A receive that had to jump forward leaves one artificially long gap right before it. The
//! jump is instead spread over the events preceding the receive: everything before the receive
//! moves later by up to the jump, so the gap shrinks back to what was measured. Sends limit
//! how far they (and everything before them) may move: a send can only move by its slack, or
//! its own receive would precede it. The resulting shift is a non-decreasing step function
//! over the output buffer, with steps at the limiting sends ("breakpoints").
//!
//! ```text
//! shift
//!  jump ┤                    ┌──────────  <- up to the trigger receive
//!       │           ┌────────┘
//!       │     ┌─────┘                     <- step at each breakpoint send
//!     0 ┼─────┴───────────────────────── output index
//! ```

use std::collections::BTreeMap;

use tracesync_proto::{Event, Timestamp};

use super::send_table::{SendHandle, SendRecord, SendTable};

/// A send that limits the shift of everything up to and including it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Breakpoint {
    /// Output index of the last send in its same-time group.
    pub index: usize,
    pub shift: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AmortizationPlan {
    /// Output index of the receive that triggered the amortization.
    pub trigger: usize,
    pub jump: Timestamp,
    /// Strictly increasing in both index and shift, every shift below `jump`.
    pub breakpoints: Vec<Breakpoint>,
}

/// Tells a sender that the receive time of one of its sends has moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Refill {
    pub handle: SendHandle,
    pub receive_time: Timestamp,
}

impl AmortizationPlan {
    pub fn new(sends: &SendTable, trigger: usize, jump: Timestamp) -> Self {
        let mut breakpoints: Vec<Breakpoint> = Vec::new();

        let preceding = sends.records().iter().take_while(|r| r.index < trigger);
        for group in group_by_time(preceding) {
            // simultaneous sends move together, so the tightest of them decides
            let Some(limit) = group.iter().map(|r| r.slack).min() else { continue };
            let Some(index) = group.last().map(|r| r.index) else { continue };

            // an earlier breakpoint allowing as much or more is shadowed by this one
            while breakpoints.last().is_some_and(|bp| bp.shift >= limit) {
                breakpoints.pop();
            }
            if limit < jump {
                breakpoints.push(Breakpoint { index, shift: limit });
            }
        }

        Self { trigger, jump, breakpoints }
    }

    /// Shift applied to the event at output position `index`.
    pub fn shift_at(&self, index: usize) -> Timestamp {
        if index >= self.trigger {
            return 0;
        }
        self.breakpoints.iter().find(|bp| bp.index >= index).map_or(self.jump, |bp| bp.shift)
    }

    /// Height of each step of the shift curve. Always sums to `jump`.
    pub fn increments(&self) -> Vec<Timestamp> {
        let mut previous = 0;
        let mut steps = Vec::with_capacity(self.breakpoints.len() + 1);
        for bp in &self.breakpoints {
            steps.push(bp.shift - previous);
            previous = bp.shift;
        }
        steps.push(self.jump - previous);
        steps
    }

    /// Move the events before the trigger, consume slack of moved sends and report moved receives.
    pub fn apply(&self, output: &mut [Event], sends: &mut SendTable, receive_links: &BTreeMap<usize, SendHandle>) -> Vec<Refill> {
        let mut refills = Vec::new();
        let mut breakpoints = self.breakpoints.iter().peekable();

        for (index, event) in output.iter_mut().enumerate().take(self.trigger) {
            while breakpoints.peek().is_some_and(|bp| bp.index < index) {
                breakpoints.next();
            }
            let shift = breakpoints.peek().map_or(self.jump, |bp| bp.shift);
            if shift == 0 {
                continue;
            }

            event.time = event.time.saturating_add(shift);
            if event.is_send() {
                sends.shift_at(index, shift);
            } else if let Some(handle) = receive_links.get(&index) {
                refills.push(Refill { handle: *handle, receive_time: event.time });
            }
        }

        refills
    }
}

fn group_by_time<'a>(records: impl Iterator<Item = &'a SendRecord>) -> Vec<Vec<&'a SendRecord>> {
    let mut groups: Vec<Vec<&'a SendRecord>> = Vec::new();
    for record in records {
        match groups.last_mut() {
            Some(group) if group[0].time == record.time => group.push(record),
            _ => groups.push(vec![record]),
        }
    }
    groups
}
