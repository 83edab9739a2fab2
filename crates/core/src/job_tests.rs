use super::*;

fn now() -> DateTime<Utc> {
    DateTime::from_timestamp_millis(1_700_000_000_000).expect("valid timestamp")
}

#[test]
fn happy_path_transitions() {
    let mut job = Job::builder().build();
    assert_eq!(job.status, JobStatus::Pending);

    job.mark_queued(Priority::High).expect("enqueue");
    assert_eq!(job.status, JobStatus::Queued);
    assert_eq!(job.priority, Priority::High);

    job.mark_started(now()).expect("start");
    assert_eq!(job.status, JobStatus::Running);
    assert!(job.started_at.is_some());

    job.apply_progress(50, Some(100), Some("halfway".into())).expect("progress");
    assert_eq!(job.progress.percentage(), 50.0);

    job.mark_completed(100, 90, 10, 5, now()).expect("complete");
    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.points_consumed, 5);
    assert!(job.completed_at.is_some());
}

#[test]
fn progress_percentage_clamps_at_100_and_avoids_divide_by_zero() {
    let mut p = Progress::default();
    assert_eq!(p.percentage(), 0.0);
    p.total = 10;
    p.current = 15;
    assert_eq!(p.percentage(), 100.0);
}

#[test]
fn fail_with_retries_remaining_goes_to_retrying_and_bumps_retry_count() {
    let mut job = Job::builder().max_retries(3).build();
    job.mark_queued(Priority::Normal).expect("enqueue");
    job.mark_started(now()).expect("start");

    let should_retry = job.mark_failed("connection reset", now()).expect("fail");
    assert!(should_retry);
    assert_eq!(job.status, JobStatus::Retrying);
    assert_eq!(job.retry_count, 1);
}

#[test]
fn fail_after_exhausting_retries_goes_to_failed() {
    let mut job = Job::builder().build();
    job.max_retries = 1;
    job.mark_queued(Priority::Normal).expect("enqueue");
    job.mark_started(now()).expect("start");
    job.retry_count = 1;

    let should_retry = job.mark_failed("still broken", now()).expect("fail");
    assert!(!should_retry);
    assert_eq!(job.status, JobStatus::Failed);
}

#[test]
fn fail_on_job_that_never_ran_skips_retry() {
    let mut job = Job::builder().build();
    let should_retry = job.mark_failed("bad params", now()).expect("fail");
    assert!(!should_retry);
    assert_eq!(job.status, JobStatus::Failed);
}

#[test]
fn fail_on_already_terminal_job_is_a_silent_no_op() {
    let mut job = Job::builder().build();
    job.status = JobStatus::Cancelled;
    let should_retry = job.mark_failed("too late", now()).expect("fail is a no-op");
    assert!(!should_retry);
    assert_eq!(job.status, JobStatus::Cancelled);
}

#[test]
fn cancel_is_reachable_from_every_non_terminal_status() {
    for status in [JobStatus::Pending, JobStatus::Queued, JobStatus::Running, JobStatus::Retrying] {
        let mut job = Job::builder().build();
        job.status = status;
        job.mark_cancelled(now()).unwrap_or_else(|_| panic!("cancel should succeed from {status}"));
        assert_eq!(job.status, JobStatus::Cancelled);
    }
}

#[test]
fn cancel_rejected_once_terminal() {
    let mut job = Job::builder().build();
    job.status = JobStatus::Completed;
    assert!(job.mark_cancelled(now()).is_err());
}

#[test]
fn starting_a_non_queued_job_is_rejected() {
    let mut job = Job::builder().build();
    assert!(job.mark_started(now()).is_err());
}

#[test]
fn retry_backoff_follows_exponential_schedule_capped_at_one_hour() {
    assert_eq!(retry_backoff_seconds(0), 60);
    assert_eq!(retry_backoff_seconds(1), 120);
    assert_eq!(retry_backoff_seconds(2), 240);
    assert_eq!(retry_backoff_seconds(10), 3600);
}

#[test]
fn priority_ordering_is_urgent_first() {
    let mut priorities = vec![Priority::Low, Priority::Urgent, Priority::Normal, Priority::High];
    priorities.sort();
    assert_eq!(priorities, vec![Priority::Urgent, Priority::High, Priority::Normal, Priority::Low]);
}
