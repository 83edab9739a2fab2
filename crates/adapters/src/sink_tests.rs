use super::*;

#[tokio::test]
async fn logging_sink_always_succeeds() {
    let sink = LoggingNotificationSink::new();
    let result = sink.send("job_alerts:1", "user:1", "Job started", "crawl started").await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn fake_sink_records_calls() {
    let sink = FakeNotificationSink::new();
    sink.send("job_alerts:1", "user:1", "Job started", "crawl started").await.unwrap();
    let calls = sink.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].recipient, "user:1");
}

#[tokio::test]
async fn fake_sink_fails_once_when_scripted() {
    let sink = FakeNotificationSink::new();
    sink.fail_next();
    let first = sink.send("job_alerts:1", "user:1", "t", "m").await;
    assert!(first.is_err());
    let second = sink.send("job_alerts:1", "user:1", "t", "m").await;
    assert!(second.is_ok());
}
