use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::{
    error::DecodeError,
    event::Event,
    id::{ProcessId, Timestamp},
};

/// The events captured for one process, in file order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessTrace {
    pub process_id: ProcessId,
    /// Declared start time of the process on its own clock.
    pub init_time: Timestamp,
    pub events: Vec<Event>,
}

impl ProcessTrace {
    pub fn new(process_id: ProcessId, init_time: Timestamp, events: Vec<Event>) -> Self { Self { process_id, init_time, events } }

    pub fn first_event_time(&self) -> Option<Timestamp> { self.events.first().map(|e| e.time) }

    pub fn len(&self) -> usize { self.events.len() }

    pub fn is_empty(&self) -> bool { self.events.is_empty() }
}

/// A complete multi-process run: one trace per process plus the opaque project description
/// that the archive carries after the trace streams.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tracelog {
    pointer_size: u8,
    traces: Vec<ProcessTrace>,
    project: Bytes,
}

impl Tracelog {
    pub fn new(pointer_size: u8, traces: Vec<ProcessTrace>, project: impl Into<Bytes>) -> Result<Self, DecodeError> {
        if pointer_size != 4 && pointer_size != 8 {
            return Err(DecodeError::InvalidPointerSize(pointer_size));
        }
        for (position, trace) in traces.iter().enumerate() {
            if trace.process_id.index() != position {
                return Err(DecodeError::ProcessMismatch { position, found: trace.process_id });
            }
        }
        Ok(Self { pointer_size, traces, project: project.into() })
    }

    /// Build a tracelog from bare event lists. Process `i` gets id `i` and init time 0.
    pub fn from_events(traces: Vec<Vec<Event>>) -> Self {
        let traces = traces.into_iter().enumerate().map(|(i, events)| ProcessTrace::new(ProcessId::new(i), 0, events)).collect();
        Self { pointer_size: 8, traces, project: Bytes::new() }
    }

    pub fn pointer_size(&self) -> u8 { self.pointer_size }

    pub fn process_count(&self) -> usize { self.traces.len() }

    pub fn traces(&self) -> &[ProcessTrace] { &self.traces }

    pub fn trace(&self, process: ProcessId) -> Option<&ProcessTrace> { self.traces.get(process.index()) }

    pub fn project(&self) -> &Bytes { &self.project }

    pub fn into_parts(self) -> (u8, Vec<ProcessTrace>, Bytes) { (self.pointer_size, self.traces, self.project) }

    pub fn first_event_times(&self) -> Vec<Option<Timestamp>> { self.traces.iter().map(|t| t.first_event_time()).collect() }

    pub fn event_count(&self) -> usize { self.traces.iter().map(|t| t.len()).sum() }
}
