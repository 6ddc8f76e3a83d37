//! Amortization Engine.
//!
//! Forward amortization folds a receive's jump into the process's time offset. Backward
//! amortization spreads it over the events before the receive, limited by the slack of the
//! process's earlier sends, and runs once those sends all know their receive times.

pub mod backward;
pub mod forward;
pub mod send_table;
pub mod task;

pub use backward::{AmortizationPlan, Breakpoint, Refill};
pub use send_table::{SendHandle, SendRecord, SendSeq, SendTable};
pub use task::{BaTask, TaskQueue};
