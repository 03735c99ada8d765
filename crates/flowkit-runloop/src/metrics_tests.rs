use super::*;

#[test]
fn test_metrics_new() {
    let metrics = RunnerMetrics::new();
    assert_eq!(metrics.emitted.load(Ordering::Relaxed), 0);
    assert_eq!(metrics.uptime_secs(), 0);
}

#[test]
fn test_record_counters() {
    let metrics = RunnerMetrics::new();
    metrics.record_emitted();
    metrics.record_emitted();
    metrics.record_rejected();
    metrics.record_processed();
    metrics.record_dispatch_failure();
    metrics.record_follow_up();
    metrics.record_dropped_follow_up();
    metrics.record_retry();

    let snapshot = metrics.snapshot();
    assert_eq!(snapshot.emitted, 2);
    assert_eq!(snapshot.rejected, 1);
    assert_eq!(snapshot.processed, 1);
    assert_eq!(snapshot.dispatch_failures, 1);
    assert_eq!(snapshot.follow_ups, 1);
    assert_eq!(snapshot.dropped_follow_ups, 1);
    assert_eq!(snapshot.retries, 1);
}

#[test]
fn test_pending_and_failure_rate() {
    let snapshot = MetricsSnapshot {
        timestamp: Utc::now(),
        uptime_secs: 3,
        emitted: 8,
        rejected: 1,
        processed: 8,
        dispatch_failures: 2,
        follow_ups: 2,
        dropped_follow_ups: 0,
        retries: 0,
    };
    assert_eq!(snapshot.pending(), 2);
    assert_eq!(snapshot.failure_rate(), 0.25);
}

#[test]
fn test_zero_division() {
    let snapshot = RunnerMetrics::new().snapshot();
    assert_eq!(snapshot.failure_rate(), 0.0);
    assert_eq!(snapshot.pending(), 0);
}

#[test]
fn test_snapshot_serializes() {
    let metrics = RunnerMetrics::new();
    metrics.mark_start();
    metrics.record_processed();
    let value = serde_json::to_value(metrics.snapshot()).unwrap();
    assert_eq!(value["processed"], 1);
}
