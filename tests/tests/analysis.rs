mod common;
use anyhow::Result;
use common::*;

use tracesync::{
    compare,
    proto::{Event, ProcessId, Tracelog},
    verify, ComparisonError, LogSide, SyncConfig, SyncError, SyncedTraceLog, VerificationReport,
};

fn skewed() -> Tracelog {
    Tracelog::from_events(vec![
        vec![Event::spawn(1, 0), Event::send(100, ProcessId(1)), Event::send(150, ProcessId(2)), Event::quit(200)],
        vec![Event::spawn(1, 0), Event::receive(60, ProcessId(0)), Event::idle(70), Event::send(90, ProcessId(2)), Event::quit(120)],
        vec![Event::spawn(1, 0), Event::receive(140, ProcessId(0)), Event::receive(150, ProcessId(1)), Event::end(160)],
    ])
}

// ============================================================================
// Verifier
// ============================================================================

#[test]
fn test_verifier_finds_skew() -> Result<()> {
    let report = verify(&skewed())?;
    assert_eq!(report, VerificationReport { total_receives: 3, violations: 2, max_delay: 40, avg_delay: 25 });
    Ok(())
}

#[test]
fn test_verifier_accepts_synced_logs() -> Result<()> {
    for seed in 0..20 {
        let log = random_run(seed, RunShape { max_skew: 1_000, ..RunShape::default() });
        let before = verify(&log)?;
        let synced = SyncedTraceLog::from_tracelog(log, SyncConfig::default())?;
        let after = verify(synced.tracelog())?;
        assert_eq!(after.total_receives, before.total_receives);
        assert_eq!(after.violations, 0, "seed {seed}");
    }
    Ok(())
}

// ============================================================================
// Comparator
// ============================================================================

#[tokio::test]
async fn test_identical_logs_compare_clean() -> Result<()> {
    let log = random_run(5, RunShape { max_skew: 0, ..RunShape::default() });
    let report = compare(log.clone(), log, false).await?;
    assert_eq!(report.breakpoints, 0);
    assert_eq!(report.max_gap, 0);
    assert_eq!(report.avg_gap, 0);
    assert_eq!(report.original, report.synced);
    Ok(())
}

#[tokio::test]
async fn test_passthrough_sync_introduces_no_gaps() -> Result<()> {
    let log = random_run(9, RunShape { max_skew: 0, ..RunShape::default() });
    let synced = SyncedTraceLog::from_tracelog(log.clone(), SyncConfig::passthrough())?;
    let report = compare(log, synced.into_tracelog(), false).await?;
    assert_eq!((report.breakpoints, report.max_gap, report.avg_gap), (0, 0, 0));
    Ok(())
}

#[tokio::test]
async fn test_synchronization_gaps_are_reported() -> Result<()> {
    // p1's send to p2 can only move 30ns, while the idle event after it moves by the whole 210ns
    let log = Tracelog::from_events(vec![
        vec![Event::spawn(1, 0), Event::send(300, ProcessId(1))],
        vec![Event::spawn(10, 0), Event::send(20, ProcessId(2)), Event::idle(80), Event::receive(100, ProcessId(0))],
        vec![Event::spawn(40, 0), Event::receive(60, ProcessId(1))],
    ]);
    let synced = SyncedTraceLog::from_tracelog(log.clone(), SyncConfig::default().with_forward_amortization(false))?;
    let report = compare(log, synced.into_tracelog(), false).await?;

    assert_eq!((report.breakpoints, report.max_gap, report.avg_gap), (1, 180, 180));
    assert_eq!(report.original.idle_time, 20);
    assert_eq!(report.synced.idle_time, 20);
    assert_eq!(report.original.execution_time, 299);
    assert_eq!(report.synced.execution_time, 309);
    Ok(())
}

#[tokio::test]
async fn test_weak_comparison_reloads_from_file() -> Result<()> {
    let log = random_run(21, RunShape { max_init: 2_000, ..RunShape::default() });
    let synced = SyncedTraceLog::from_tracelog(log.clone(), SyncConfig::default().with_weak_initial_sync(true))?;

    let path = std::env::temp_dir().join(format!("tracesync-weak-{}.kst", std::process::id()));
    synced.export_to_file(&path)?;
    let reloaded = SyncedTraceLog::from_file(&path)?;
    std::fs::remove_file(&path)?;
    assert_eq!(reloaded.tracelog(), synced.tracelog());

    let report = compare(log, reloaded.into_tracelog(), true).await?;
    assert!(report.max_gap >= report.avg_gap);
    Ok(())
}

#[tokio::test]
async fn test_process_count_mismatch() {
    let two = Tracelog::from_events(vec![vec![], vec![]]);
    let three = Tracelog::from_events(vec![vec![], vec![], vec![]]);
    let err = compare(two, three, false).await.unwrap_err();
    assert!(matches!(err, ComparisonError::ProcessCountMismatch { original: 2, synced: 3 }));
    assert_eq!(err.to_string(), "process count differs: original has 2, synced has 3");
}

#[tokio::test]
async fn test_broken_original_is_attributed() {
    let broken = Tracelog::from_events(vec![vec![Event::receive(1, ProcessId(1))], vec![Event::quit(1)]]);
    let fine = Tracelog::from_events(vec![vec![Event::quit(1)], vec![Event::quit(1)]]);
    let err = compare(broken, fine, false).await.unwrap_err();
    assert!(matches!(err, ComparisonError::Analysis { side: LogSide::Original, source: SyncError::Malformed(_) }));
}

#[test]
fn test_missing_file() {
    let err = SyncedTraceLog::from_file("/nonexistent/tracesync.kst").unwrap_err();
    assert!(matches!(err, SyncError::Io(_)));
}
