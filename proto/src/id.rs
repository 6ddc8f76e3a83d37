use serde::{Deserialize, Serialize};
use std::fmt;

/// Time in nanoseconds. Raw trace times are relative to the owning process's init time.
pub type Timestamp = u64;

/// Rank of a traced process within a run.
#[derive(PartialEq, Eq, Hash, Clone, Copy, Ord, PartialOrd, Serialize, Deserialize, Default)]
pub struct ProcessId(pub u32);

impl ProcessId {
    /// Id of the process at `index`. Indices past `u32::MAX` saturate.
    pub fn new(index: usize) -> Self { ProcessId(u32::try_from(index).unwrap_or(u32::MAX)) }

    pub fn index(&self) -> usize { self.0 as usize }

    /// Iterate the ids `0..count`.
    pub fn range(count: usize) -> impl Iterator<Item = ProcessId> + Clone { (0..count).map(ProcessId::new) }
}

impl fmt::Display for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "p{}", self.0) }
}

impl fmt::Debug for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "ProcessId({})", self.0) }
}

impl From<u32> for ProcessId {
    fn from(value: u32) -> Self { ProcessId(value) }
}
