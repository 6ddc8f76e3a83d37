mod common;
use anyhow::Result;
use common::*;

use rand::{rngs::StdRng, Rng, SeedableRng};
use tracesync::{
    amortization::{AmortizationPlan, SendTable},
    initial::{self, InitialSync},
    proto::{archive, Timestamp},
    verify, SyncConfig, SyncedTraceLog,
};

const SEEDS: u64 = 40;

fn configs() -> Vec<SyncConfig> {
    vec![
        SyncConfig::default(),
        SyncConfig::default().with_forward_amortization(false),
        SyncConfig::default().with_backward_amortization(false),
        SyncConfig::default().with_forward_amortization(false).with_backward_amortization(false),
        SyncConfig::default().with_min_event_diff(1).with_min_msg_delay(50),
        SyncConfig::default().with_weak_initial_sync(true),
    ]
}

// ============================================================================
// Clock condition and local spacing
// ============================================================================

#[test]
fn test_clock_condition_holds_for_every_configuration() -> Result<()> {
    for seed in 0..SEEDS {
        let log = random_run(seed, RunShape { max_init: 300, ..RunShape::default() });
        for config in configs() {
            let synced = SyncedTraceLog::from_tracelog(log.clone(), config)?;
            for (send, receive) in message_pairs(synced.tracelog()) {
                assert!(receive >= send + config.min_msg_delay, "seed {seed} {config:?}: receive {receive} before send {send}");
            }
            assert!(verify(synced.tracelog())?.is_consistent());
        }
    }
    Ok(())
}

#[test]
fn test_local_events_stay_spaced() -> Result<()> {
    for seed in 0..SEEDS {
        let log = random_run(seed, RunShape { processes: 3, steps: 90, ..RunShape::default() });
        for config in configs() {
            let synced = SyncedTraceLog::from_tracelog(log.clone(), config)?;
            for trace in synced.tracelog().traces() {
                for pair in trace.events.windows(2) {
                    assert!(
                        pair[1].time >= pair[0].time + config.min_event_diff,
                        "seed {seed} {config:?} {}: {} then {}",
                        trace.process_id,
                        pair[0],
                        pair[1]
                    );
                }
            }
        }
    }
    Ok(())
}

#[test]
fn test_events_keep_their_payloads() -> Result<()> {
    let log = random_run(7, RunShape::default());
    let synced = SyncedTraceLog::from_tracelog(log.clone(), SyncConfig::default())?;
    for (before, after) in log.traces().iter().zip(synced.tracelog().traces()) {
        assert_eq!(before.events.len(), after.events.len());
        for (b, a) in before.events.iter().zip(&after.events) {
            assert_eq!(b.payload, a.payload);
        }
    }
    Ok(())
}

// ============================================================================
// No-op configuration
// ============================================================================

#[test]
fn test_consistent_log_passes_through_unchanged() -> Result<()> {
    for seed in 0..SEEDS {
        let log = random_run(seed, RunShape { max_skew: 0, ..RunShape::default() });
        assert!(verify(&log)?.is_consistent());
        let synced = SyncedTraceLog::from_tracelog(log.clone(), SyncConfig::passthrough())?;
        assert_eq!(synced.tracelog(), &log, "seed {seed}");
    }
    Ok(())
}

// ============================================================================
// Amortization
// ============================================================================

#[test]
fn test_forward_offsets_never_shrink() -> Result<()> {
    for seed in 0..SEEDS {
        let log = random_run(seed, RunShape { max_init: 500, ..RunShape::default() });
        let start = initial::align(&log, InitialSync::EarliestStart).offsets;
        let synced = SyncedTraceLog::from_tracelog(log, SyncConfig::default())?;
        for (process, (before, after)) in start.iter().zip(synced.time_offsets()).enumerate() {
            assert!(after >= before, "seed {seed} p{process}: offset went from {before} to {after}");
        }
    }
    Ok(())
}

#[test]
fn test_offsets_stay_put_without_forward_amortization() -> Result<()> {
    let log = random_run(3, RunShape { max_init: 500, ..RunShape::default() });
    let start = initial::align(&log, InitialSync::EarliestStart).offsets;
    let synced = SyncedTraceLog::from_tracelog(log, SyncConfig::default().with_forward_amortization(false))?;
    assert_eq!(synced.time_offsets(), start.as_slice());
    Ok(())
}

#[test]
fn test_backward_steps_add_up_to_the_jump() {
    let mut rng = StdRng::seed_from_u64(11);
    for _ in 0..200 {
        let mut sends = SendTable::new(rng.gen_range(0..20));
        let mut index = 0;
        let mut time: Timestamp = 1;
        for _ in 0..rng.gen_range(0..12) {
            index += rng.gen_range(1..4);
            time += rng.gen_range(0..30);
            let seq = sends.push(index, time);
            if rng.gen_bool(0.8) {
                sends.refill(seq, time + rng.gen_range(0..200));
            }
        }
        let trigger = index + rng.gen_range(1..4);
        let jump = rng.gen_range(1..150);
        let plan = AmortizationPlan::new(&sends, trigger, jump);

        assert_eq!(plan.increments().iter().sum::<Timestamp>(), jump);
        let shifts: Vec<_> = (0..trigger).map(|i| plan.shift_at(i)).collect();
        assert!(shifts.windows(2).all(|w| w[0] <= w[1]), "{shifts:?}");
        for record in sends.records() {
            assert!(plan.shift_at(record.index) <= record.slack, "send at {} moves past its slack", record.index);
        }
    }
}

// ============================================================================
// Export
// ============================================================================

#[test]
fn test_export_round_trip() -> Result<()> {
    for seed in 0..10 {
        let log = random_run(seed, RunShape { max_init: 1_000, ..RunShape::default() });
        let synced = SyncedTraceLog::from_tracelog(log, SyncConfig::default())?;
        let bytes = synced.export()?;

        let decoded = archive::decode(&bytes)?;
        assert_eq!(&decoded, synced.tracelog());
        let reloaded = SyncedTraceLog::from_archive(&bytes)?;
        assert!(reloaded.time_offsets().iter().all(|offset| *offset == 0));
        assert_eq!(reloaded.export()?, bytes);
    }
    Ok(())
}
