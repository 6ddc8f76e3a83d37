use std::collections::{HashMap, VecDeque};

use rand::{rngs::StdRng, Rng, SeedableRng};
use tracing::Level;

use tracesync::proto::{Event, Payload, ProcessId, ProcessTrace, Timestamp, Tracelog};

// Initialize tracing for tests
#[ctor::ctor]
fn init_tracing() { tracing_subscriber::fmt().with_max_level(Level::INFO).with_test_writer().init(); }

/// Shape of a generated run.
#[allow(unused)]
#[derive(Debug, Clone, Copy)]
pub struct RunShape {
    pub processes: usize,
    pub steps: usize,
    /// Each process's clock runs ahead of real time by up to this much.
    pub max_skew: Timestamp,
    /// Declared init times are drawn from `0..=max_init`.
    pub max_init: Timestamp,
}

impl Default for RunShape {
    fn default() -> Self { Self { processes: 4, steps: 120, max_skew: 400, max_init: 0 } }
}

/// Simulate a run: one global clock, every process recording it with its own skew. Receives
/// only happen for messages already sent, so the run is always causally traversable, and every
/// raw time is at least 1.
#[allow(unused)]
pub fn random_run(seed: u64, shape: RunShape) -> Tracelog {
    let mut rng = StdRng::seed_from_u64(seed);
    let skews: Vec<Timestamp> = (0..shape.processes).map(|_| rng.gen_range(0..=shape.max_skew)).collect();
    let inits: Vec<Timestamp> = (0..shape.processes).map(|_| rng.gen_range(0..=shape.max_init)).collect();
    let mut events: Vec<Vec<Event>> = vec![Vec::new(); shape.processes];
    let mut in_flight: HashMap<(usize, usize), usize> = HashMap::new();
    let mut now: Timestamp = 1;

    for (p, trace) in events.iter_mut().enumerate() {
        trace.push(Event::spawn(now + skews[p], 0));
        now += rng.gen_range(0..3);
    }

    for _ in 0..shape.steps {
        now += rng.gen_range(0..20);
        let p = rng.gen_range(0..shape.processes);
        let local = now + skews[p];

        let senders: Vec<usize> = (0..shape.processes).filter(|s| in_flight.get(&(*s, p)).is_some_and(|n| *n > 0)).collect();
        let event = match rng.gen_range(0..10) {
            0..=3 if !senders.is_empty() => {
                let sender = senders[rng.gen_range(0..senders.len())];
                *in_flight.entry((sender, p)).or_default() -= 1;
                Event::receive(local, ProcessId::new(sender))
            }
            4..=6 if shape.processes > 1 => {
                let target = (p + rng.gen_range(1..shape.processes)) % shape.processes;
                *in_flight.entry((p, target)).or_default() += 1;
                Event::send(local, ProcessId::new(target))
            }
            7 => Event::idle(local),
            8 => Event::fired(local, rng.gen_range(0..8)),
            _ => Event::finished(local),
        };
        events[p].push(event);
    }

    let traces = events.into_iter().enumerate().map(|(p, events)| ProcessTrace::new(ProcessId::new(p), inits[p], events)).collect();
    Tracelog::new(8, traces, &b"<project/>"[..]).expect("generated tracelog is valid")
}

/// Every matched message of a tracelog as `(send_time, receive_time)`, pairing the k-th receive
/// from a sender with the k-th send to that receiver. Times must already share one clock.
#[allow(unused)]
pub fn message_pairs(tracelog: &Tracelog) -> Vec<(Timestamp, Timestamp)> {
    let mut sends: HashMap<(ProcessId, ProcessId), VecDeque<Timestamp>> = HashMap::new();
    for trace in tracelog.traces() {
        for event in &trace.events {
            if let Payload::Send { target, .. } = event.payload {
                sends.entry((trace.process_id, target)).or_default().push_back(event.time);
            }
        }
    }

    let mut pairs = Vec::new();
    for trace in tracelog.traces() {
        for event in &trace.events {
            if let Payload::Receive { origin, .. } = event.payload {
                let send = sends.get_mut(&(origin, trace.process_id)).and_then(VecDeque::pop_front).expect("receive has a matching send");
                pairs.push((send, event.time));
            }
        }
    }
    pairs
}

#[allow(unused)]
pub fn times(tracelog: &Tracelog, process: u32) -> Vec<Timestamp> {
    tracelog.trace(ProcessId(process)).map(|t| t.events.iter().map(|e| e.time).collect()).unwrap_or_default()
}
