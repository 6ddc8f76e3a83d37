//! Clock Corrector: the two timestamp rules every event passes through.
//!
//! A `last_event_time` of zero means the process has not emitted a corrected event yet, so the
//! spacing rule does not apply to its first event. Times saturate at `Timestamp::MAX`.

use tracesync_proto::Timestamp;

/// Correct a local (non-receive) event: keep it at least `min_event_diff` after the previous one.
pub fn correct_local(time: Timestamp, last_event_time: Timestamp, min_event_diff: Timestamp) -> Timestamp {
    if last_event_time != 0 {
        time.max(last_event_time.saturating_add(min_event_diff))
    } else {
        time
    }
}

/// Correct a receive: never earlier than `send_time + min_msg_delay`, and spaced like a local event.
pub fn correct_receive(
    time: Timestamp,
    send_time: Timestamp,
    last_event_time: Timestamp,
    min_event_diff: Timestamp,
    min_msg_delay: Timestamp,
) -> Timestamp {
    correct_local(time, last_event_time, min_event_diff).max(send_time.saturating_add(min_msg_delay))
}

/// Per-process clock state for the corrector rules.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalClock {
    last_event_time: Timestamp,
    min_event_diff: Timestamp,
    min_msg_delay: Timestamp,
}

/// Outcome of correcting one receive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReceiveCorrection {
    pub time: Timestamp,
    /// Earliest time the local rules alone would allow; anything above it is caused by the message.
    pub local_bound: Timestamp,
}

impl ReceiveCorrection {
    /// How far the matching send pushed the receive beyond what local spacing required.
    pub fn message_jump(&self) -> Timestamp { self.time.saturating_sub(self.local_bound) }
}

impl LocalClock {
    pub fn new(min_event_diff: Timestamp, min_msg_delay: Timestamp) -> Self { Self { last_event_time: 0, min_event_diff, min_msg_delay } }

    pub fn last_event_time(&self) -> Timestamp { self.last_event_time }

    pub fn local(&mut self, time: Timestamp) -> Timestamp {
        let corrected = correct_local(time, self.last_event_time, self.min_event_diff);
        self.last_event_time = corrected;
        corrected
    }

    pub fn receive(&mut self, time: Timestamp, send_time: Timestamp) -> ReceiveCorrection {
        let local_bound = correct_local(time, self.last_event_time, self.min_event_diff);
        let corrected = correct_receive(time, send_time, self.last_event_time, self.min_event_diff, self.min_msg_delay);
        self.last_event_time = corrected;
        ReceiveCorrection { time: corrected, local_bound }
    }
}
