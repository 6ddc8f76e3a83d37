pub mod amortization;
pub mod comparator;
pub mod config;
pub mod corrector;
pub mod cursor;
pub mod error;
pub mod initial;
pub mod matrix;
pub mod replay;
pub mod scheduler;
pub mod sync;
pub mod trace;
pub mod verifier;

pub use comparator::{compare, ComparisonReport, LogStatistics, SideSummary};
pub use config::SyncConfig;
pub use error::{ComparisonError, LogSide, MalformedTrace, SyncError};
pub use initial::InitialSync;
pub use sync::SyncedTraceLog;
pub use verifier::{verify, verify_with, VerificationReport};

pub use tracesync_proto as proto;
