use super::*;
use crawl_core::{JobKind, JobMetricSample, JobStatus, Progress, UserId};
use crawl_storage::InMemoryStateStore;
use std::sync::Arc;

fn view() -> (Arc<InMemoryStateStore>, Arc<EphemeralStore>, MonitoringView<InMemoryStateStore>) {
    let store = Arc::new(InMemoryStateStore::new());
    let ephemeral = Arc::new(EphemeralStore::new());
    let view = MonitoringView::new(Arc::clone(&store), Arc::clone(&ephemeral));
    (store, ephemeral, view)
}

#[test]
fn dashboard_aggregates_active_and_24h_terminal_jobs() {
    let (store, _ephemeral, view) = view();
    let user_id = UserId::new(1);
    let now = Utc::now();

    store
        .create_job(
            Job::builder()
                .id(JobId::new(1))
                .user_id(user_id)
                .status(JobStatus::Running)
                .build(),
        )
        .unwrap();
    store
        .create_job(
            Job::builder()
                .id(JobId::new(2))
                .user_id(user_id)
                .status(JobStatus::Completed)
                .completed_at(Some(now - ChronoDuration::hours(1)))
                .points_consumed(5)
                .progress(Progress { current: 10, total: 10, items_processed: 10, ..Progress::default() })
                .build(),
        )
        .unwrap();
    store
        .create_job(
            Job::builder()
                .id(JobId::new(3))
                .user_id(user_id)
                .status(JobStatus::Failed)
                .completed_at(Some(now - ChronoDuration::hours(2)))
                .build(),
        )
        .unwrap();
    store
        .create_job(
            Job::builder()
                .id(JobId::new(4))
                .user_id(user_id)
                .status(JobStatus::Completed)
                .completed_at(Some(now - ChronoDuration::hours(30)))
                .build(),
        )
        .unwrap();

    let stats = view.dashboard(user_id, now);
    assert_eq!(stats.active_jobs, 1);
    assert_eq!(stats.failed_count_24h, 1);
    assert_eq!(stats.success_rate_24h, 50.0);
    assert_eq!(stats.items_per_hour, 10.0);
}

#[test]
fn dashboard_is_cached_for_60_seconds() {
    let (store, ephemeral, view) = view();
    let user_id = UserId::new(2);
    let now = Utc::now();
    store.create_job(Job::builder().id(JobId::new(1)).user_id(user_id).status(JobStatus::Running).build()).unwrap();

    let first = view.dashboard(user_id, now);
    assert_eq!(first.active_jobs, 1);

    // A second job appears but the cached snapshot should still be served.
    store.create_job(Job::builder().id(JobId::new(2)).user_id(user_id).status(JobStatus::Running).build()).unwrap();
    let second = view.dashboard(user_id, now);
    assert_eq!(second.active_jobs, 1);

    assert!(ephemeral.dashboard_snapshot(user_id).is_some());
}

#[test]
fn active_jobs_merges_live_progress_over_the_stored_row() {
    let (store, ephemeral, view) = view();
    let user_id = UserId::new(3);
    let job = store
        .create_job(
            Job::builder()
                .id(JobId::new(1))
                .user_id(user_id)
                .status(JobStatus::Running)
                .kind(JobKind::AllKeywordsCrawl { limit: 10 })
                .progress(Progress { current: 1, total: 10, ..Progress::default() })
                .build(),
        )
        .unwrap();

    ephemeral.upsert_active_job(crawl_ephemeral::ActiveJobSummary {
        job_id: job.id,
        user_id,
        status: JobStatus::Running,
        percentage: 70.0,
    });

    let active = view.active_jobs(user_id);
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].percentage, 70.0);
}

#[test]
fn job_progress_reports_eta_from_the_latest_metric_sample() {
    let (store, ephemeral, view) = view();
    let job = store
        .create_job(
            Job::builder()
                .id(JobId::new(1))
                .progress(Progress { current: 50, total: 100, ..Progress::default() })
                .status(JobStatus::Running)
                .build(),
        )
        .unwrap();

    ephemeral.record_metric_sample(JobMetricSample::builder().job_id(job.id).items_per_second(5.0).build());

    let progress = view.job_progress(job.id).unwrap();
    assert_eq!(progress.current, 50);
    assert_eq!(progress.eta_seconds, Some(10.0));
}

#[test]
fn job_progress_returns_none_for_an_unknown_job() {
    let (_store, _ephemeral, view) = view();
    assert!(view.job_progress(JobId::new(999)).is_none());
}
