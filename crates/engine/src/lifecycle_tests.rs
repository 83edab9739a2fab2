use super::*;
use crawl_adapters::CancelSignal;
use crawl_core::{JobKind, JobStatus, UserId, DEFAULT_TIMEOUT_SECONDS};
use crawl_storage::InMemoryStateStore;
use std::collections::HashMap;

fn controller() -> JobLifecycleController<InMemoryStateStore> {
    JobLifecycleController::new(Arc::new(InMemoryStateStore::new()), Arc::new(EphemeralStore::new()))
}

fn descriptor() -> JobDescriptor {
    JobDescriptor {
        user_id: UserId::new(1),
        keyword_id: None,
        schedule_id: None,
        name: "test".into(),
        kind: JobKind::AllKeywordsCrawl { limit: 10 },
        parameters: HashMap::new(),
        priority: Priority::Normal,
        max_retries: 2,
        timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
        scheduled_for: None,
    }
}

#[test]
fn create_inserts_pending_job() {
    let lc = controller();
    let job = lc.create(descriptor(), Utc::now()).unwrap();
    assert_eq!(job.status, JobStatus::Pending);
}

#[test]
fn enqueue_transitions_to_queued_and_populates_the_queue() {
    let lc = controller();
    let job = lc.create(descriptor(), Utc::now()).unwrap();
    let job = lc.enqueue(job, Priority::High, None).unwrap();
    assert_eq!(job.status, JobStatus::Queued);
    assert_eq!(lc.ephemeral().queues.stats().high_len, 1);
}

#[test]
fn start_sets_started_at_and_mirrors_status() {
    let lc = controller();
    let job = lc.create(descriptor(), Utc::now()).unwrap();
    let job = lc.enqueue(job, Priority::Normal, None).unwrap();
    let job = lc.start(job, Utc::now()).unwrap();
    assert_eq!(job.status, JobStatus::Running);
    assert!(job.started_at.is_some());
    assert_eq!(lc.ephemeral().status(job.id).unwrap().status, JobStatus::Running);
}

#[test]
fn record_progress_reports_milestone_crossing_once() {
    let lc = controller();
    let job = lc.create(descriptor(), Utc::now()).unwrap();
    let job = lc.enqueue(job, Priority::Normal, None).unwrap();
    let mut job = lc.start(job, Utc::now()).unwrap();

    let first = lc.record_progress(&mut job, 30, Some(100), None, Utc::now()).unwrap();
    assert_eq!(first, Some(25));
    let second = lc.record_progress(&mut job, 40, Some(100), None, Utc::now()).unwrap();
    assert_eq!(second, None);
}

#[test]
fn checkpoint_bumps_version_and_persists() {
    let lc = controller();
    let job = lc.create(descriptor(), Utc::now()).unwrap();
    let job = lc.enqueue(job, Priority::Normal, None).unwrap();
    let mut job = lc.start(job, Utc::now()).unwrap();
    let version_before = job.version;
    lc.record_progress(&mut job, 5, Some(10), None, Utc::now()).unwrap();
    lc.checkpoint(&mut job).unwrap();
    assert_eq!(job.version, version_before + 1);
    let reloaded = lc.store().load_job(job.id).unwrap();
    assert_eq!(reloaded.progress.current, 5);
}

#[test]
fn complete_mirrors_and_removes_from_active_jobs() {
    let lc = controller();
    let job = lc.create(descriptor(), Utc::now()).unwrap();
    let job = lc.enqueue(job, Priority::Normal, None).unwrap();
    let job = lc.start(job, Utc::now()).unwrap();
    let job = lc.complete(job, 10, 9, 1, 2, Utc::now()).unwrap();
    assert_eq!(job.status, JobStatus::Completed);
    assert!(lc.ephemeral().active_job(job.id).is_none());
}

#[test]
fn fail_retries_while_under_max_retries_then_exhausts() {
    let lc = controller();
    let job = lc.create(descriptor(), Utc::now()).unwrap();
    let job = lc.enqueue(job, Priority::Normal, None).unwrap();
    let job = lc.start(job, Utc::now()).unwrap();
    let (job, should_retry) = lc.fail(job, "rate limited", Utc::now()).unwrap();
    assert!(should_retry);
    assert_eq!(job.status, JobStatus::Retrying);

    let job = lc.enqueue(job, Priority::Normal, None).unwrap();
    let job = lc.start(job, Utc::now()).unwrap();
    let (job, should_retry) = lc.fail(job, "rate limited again", Utc::now()).unwrap();
    assert!(should_retry);

    let job = lc.enqueue(job, Priority::Normal, None).unwrap();
    let job = lc.start(job, Utc::now()).unwrap();
    let (job, should_retry) = lc.fail(job, "still failing", Utc::now()).unwrap();
    assert!(!should_retry);
    assert_eq!(job.status, JobStatus::Failed);
    assert_eq!(job.retry_count, 2);
}

#[test]
fn cancel_trips_registered_signal_and_clears_queue() {
    let lc = controller();
    let job = lc.create(descriptor(), Utc::now()).unwrap();
    let job = lc.enqueue(job, Priority::Normal, None).unwrap();
    let signal = CancelSignal::new();
    lc.register_cancel_signal(job.id, signal.clone());

    let job = lc.cancel(job, Utc::now()).unwrap();
    assert_eq!(job.status, JobStatus::Cancelled);
    assert!(signal.is_cancelled());
    assert_eq!(lc.ephemeral().queues.stats().total_len(), 0);
}

#[test]
fn retry_moves_a_never_ran_failed_job_straight_to_queued() {
    let lc = controller();
    let job = lc.create(descriptor(), Utc::now()).unwrap();
    let job = lc.enqueue(job, Priority::Normal, None).unwrap();
    // Queued, never started: mark_failed's "never ran" edge case applies.
    let (job, should_retry) = lc.fail(job, "could not dequeue", Utc::now()).unwrap();
    assert!(!should_retry);
    assert_eq!(job.status, JobStatus::Failed);
    assert_eq!(job.retry_count, 0);

    let job = lc.retry(job, Priority::Normal, Utc::now()).unwrap();
    assert_eq!(job.status, JobStatus::Queued);
    assert_eq!(job.retry_count, 1);
}
