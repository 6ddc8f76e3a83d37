//! # tracesync
//!
//! Reconciles the per-process traces of a distributed run, each recorded against its own
//! skewed clock, into one log where every receive happens after its send.
//!
//! ## Core Concepts
//!
//! - **Tracelog**: one trace per process plus the opaque project description of the run
//! - **Clock condition**: a receive is timestamped at least `min_msg_delay` after its send
//! - **Forward amortization**: a correction at a receive is carried into every later event of
//!   the process through its time offset
//! - **Backward amortization**: the same correction is spread over the events before the
//!   receive, as far as the slack of earlier sends allows
//! - **Verification / comparison**: count clock-condition violations, and measure how much
//!   synchronization changed a log
//!
//! ## Example
//!
//! ```rust
//! use tracesync::{proto::{Event, ProcessId, Tracelog}, verify, SyncConfig, SyncedTraceLog};
//!
//! # fn main() -> Result<(), tracesync::SyncError> {
//! let log = Tracelog::from_events(vec![
//!     vec![Event::spawn(0, 0), Event::send(100, ProcessId(1))],
//!     vec![Event::spawn(0, 0), Event::receive(90, ProcessId(0))],
//! ]);
//! assert_eq!(verify(&log)?.violations, 1);
//!
//! let synced = SyncedTraceLog::from_tracelog(log, SyncConfig::default())?;
//! assert!(verify(synced.tracelog())?.is_consistent());
//!
//! let archive = synced.export()?;
//! assert_eq!(SyncedTraceLog::from_archive(&archive)?.tracelog(), synced.tracelog());
//! # Ok(())
//! # }
//! ```

pub use tracesync_core::*;
pub use tracesync_proto::archive;
