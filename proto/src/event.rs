use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::id::{ProcessId, Timestamp};

/// Discriminant of a trace event, used when peeking at a trace without decoding the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    Spawn,
    TransitionFired,
    TransitionFinished,
    Send,
    Receive,
    Idle,
    Quit,
    End,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EventKind::Spawn => "spawn",
            EventKind::TransitionFired => "transition-fired",
            EventKind::TransitionFinished => "transition-finished",
            EventKind::Send => "send",
            EventKind::Receive => "receive",
            EventKind::Idle => "idle",
            EventKind::Quit => "quit",
            EventKind::End => "end",
        };
        f.write_str(name)
    }
}

/// Token values attached to an event. Never interpreted, only carried through to the output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenData(pub Bytes);

impl TokenData {
    pub fn empty() -> Self { TokenData(Bytes::new()) }

    pub fn is_empty(&self) -> bool { self.0.is_empty() }
}

impl From<&'static [u8]> for TokenData {
    fn from(value: &'static [u8]) -> Self { TokenData(Bytes::from_static(value)) }
}

impl From<Vec<u8>> for TokenData {
    fn from(value: Vec<u8>) -> Self { TokenData(Bytes::from(value)) }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Payload {
    Spawn { net_id: u32 },
    TransitionFired { transition_id: u32, tokens: TokenData },
    TransitionFinished { tokens: TokenData },
    Send { target: ProcessId, tokens: TokenData },
    Receive { origin: ProcessId, tokens: TokenData },
    Idle,
    Quit,
    End,
}

/// A single trace record: its (possibly corrected) timestamp plus the untouched payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub time: Timestamp,
    pub payload: Payload,
}

impl Event {
    pub fn new(time: Timestamp, payload: Payload) -> Self { Self { time, payload } }

    pub fn spawn(time: Timestamp, net_id: u32) -> Self { Self::new(time, Payload::Spawn { net_id }) }

    pub fn fired(time: Timestamp, transition_id: u32) -> Self {
        Self::new(time, Payload::TransitionFired { transition_id, tokens: TokenData::empty() })
    }

    pub fn finished(time: Timestamp) -> Self { Self::new(time, Payload::TransitionFinished { tokens: TokenData::empty() }) }

    pub fn send(time: Timestamp, target: ProcessId) -> Self { Self::new(time, Payload::Send { target, tokens: TokenData::empty() }) }

    pub fn receive(time: Timestamp, origin: ProcessId) -> Self {
        Self::new(time, Payload::Receive { origin, tokens: TokenData::empty() })
    }

    pub fn idle(time: Timestamp) -> Self { Self::new(time, Payload::Idle) }

    pub fn quit(time: Timestamp) -> Self { Self::new(time, Payload::Quit) }

    pub fn end(time: Timestamp) -> Self { Self::new(time, Payload::End) }

    pub fn kind(&self) -> EventKind {
        match &self.payload {
            Payload::Spawn { .. } => EventKind::Spawn,
            Payload::TransitionFired { .. } => EventKind::TransitionFired,
            Payload::TransitionFinished { .. } => EventKind::TransitionFinished,
            Payload::Send { .. } => EventKind::Send,
            Payload::Receive { .. } => EventKind::Receive,
            Payload::Idle => EventKind::Idle,
            Payload::Quit => EventKind::Quit,
            Payload::End => EventKind::End,
        }
    }

    /// The other end of a message: the target of a send or the origin of a receive.
    pub fn peer(&self) -> Option<ProcessId> {
        match &self.payload {
            Payload::Send { target, .. } => Some(*target),
            Payload::Receive { origin, .. } => Some(*origin),
            _ => None,
        }
    }

    pub fn is_receive(&self) -> bool { matches!(self.payload, Payload::Receive { .. }) }

    pub fn is_send(&self) -> bool { matches!(self.payload, Payload::Send { .. }) }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.peer() {
            Some(peer) => write!(f, "{}@{}({})", self.kind(), self.time, peer),
            None => write!(f, "{}@{}", self.kind(), self.time),
        }
    }
}
