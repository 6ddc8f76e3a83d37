use thiserror::Error;

use crate::id::ProcessId;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("invalid archive header: {0}")]
    InvalidHeader(String),

    #[error("invalid pointer size {0} (expected 4 or 8)")]
    InvalidPointerSize(u8),

    #[error("stream of {process} truncated: expected {expected} bytes, {available} available")]
    Truncated { process: ProcessId, expected: usize, available: usize },

    #[error("stream at position {position} belongs to {found}")]
    ProcessMismatch { position: usize, found: ProcessId },

    #[error("undecodable trace record: {0}")]
    Record(#[from] bincode::Error),
}
