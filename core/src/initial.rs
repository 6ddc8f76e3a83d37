//! Initial clock alignment, applied before any event is corrected.

use serde::{Deserialize, Serialize};
use tracesync_proto::{Timestamp, Tracelog};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum InitialSync {
    /// Shift every process by how much later it declared its start than the earliest process.
    #[default]
    EarliestStart,
    /// Shift every process so its first event lines up with the latest first event of the run.
    Weak,
}

impl InitialSync {
    pub fn from_weak(weak: bool) -> Self {
        if weak {
            InitialSync::Weak
        } else {
            InitialSync::EarliestStart
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitialAlignment {
    /// Starting time offset per process.
    pub offsets: Vec<Timestamp>,
    /// Init time of the common clock the offsets map onto.
    pub reference_init_time: Timestamp,
}

pub fn align(tracelog: &Tracelog, policy: InitialSync) -> InitialAlignment {
    let traces = tracelog.traces();
    match policy {
        InitialSync::EarliestStart => {
            let start = traces.iter().map(|t| t.init_time).min().unwrap_or(0);
            InitialAlignment { offsets: traces.iter().map(|t| t.init_time - start).collect(), reference_init_time: start }
        }
        InitialSync::Weak => {
            let anchor = traces.iter().filter_map(|t| Some((t.first_event_time()?, t.init_time))).max_by_key(|(first, _)| *first);
            let Some((latest, anchor_init)) = anchor else {
                return InitialAlignment { offsets: vec![0; traces.len()], reference_init_time: 0 };
            };
            let offsets = traces.iter().map(|t| t.first_event_time().map_or(0, |first| latest - first)).collect();
            InitialAlignment { offsets, reference_init_time: anchor_init }
        }
    }
}
