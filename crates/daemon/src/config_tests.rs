use super::*;

#[test]
fn defaults_match_documented_values() {
    let config = DaemonConfig::default();
    assert_eq!(config.worker.concurrency, 4);
    assert_eq!(config.scheduler.tick_seconds, 30);
}

#[test]
fn worker_poll_interval_converts_millis_to_a_duration() {
    let worker = WorkerConfig { concurrency: 4, poll_interval_ms: 250 };
    assert_eq!(worker.poll_interval(), Duration::from_millis(250));
}
