//! Error types for synchronization, verification and comparison.
//!
//! Malformed input and causal deadlocks abort a whole run; nothing partial is returned.
//! Comparison failures are reported per side so one broken log does not hide the other.

use std::fmt;

use thiserror::Error;
use tracesync_proto::{DecodeError, ProcessId};

/// Why a trace cannot be traversed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MalformedTrace {
    /// A send or receive names a process the tracelog does not have.
    #[error("{process} references unknown {peer} (run has {process_count} processes)")]
    UnknownProcess { process: ProcessId, peer: ProcessId, process_count: usize },

    /// The receive's sender has no more events and never sent the message.
    #[error("receive in {process} from {sender} has no matching send")]
    UnmatchedReceive { process: ProcessId, sender: ProcessId },

    /// The next event was reported as a receive but carries no sender.
    #[error("receive in {process} has no resolvable sender")]
    MissingSender { process: ProcessId },
}

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("malformed trace: {0}")]
    Malformed(#[from] MalformedTrace),

    /// Every pending process is waiting on a message from another waiting process.
    #[error("causal deadlock between {}", display_chain(.waiting))]
    CausalDeadlock { waiting: Vec<ProcessId> },

    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
}

/// Which log of a comparison an error belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogSide {
    Original,
    Synced,
}

impl fmt::Display for LogSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogSide::Original => f.write_str("original"),
            LogSide::Synced => f.write_str("synced"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ComparisonError {
    #[error("process count differs: original has {original}, synced has {synced}")]
    ProcessCountMismatch { original: usize, synced: usize },

    #[error("{process} has {original} send intervals in the original log but {synced} in the synced log")]
    IntervalCountMismatch { process: ProcessId, original: usize, synced: usize },

    #[error("{side} log could not be analysed: {source}")]
    Analysis {
        side: LogSide,
        #[source]
        source: SyncError,
    },

    #[error("{side} analysis worker failed: {reason}")]
    WorkerFailed { side: LogSide, reason: String },
}

fn display_chain(chain: &[ProcessId]) -> String { chain.iter().map(|p| p.to_string()).collect::<Vec<_>>().join(" -> ") }
