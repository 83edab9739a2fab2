use super::*;
use crawl_core::{JobId, JobKind, JobStatus, Priority, UserId};

fn entry(job_id: u64) -> QueueEntry {
    QueueEntry {
        job_id: JobId::new(job_id),
        priority: Priority::Normal,
        enqueued_at: Utc::now(),
        scheduled_for: None,
        job_kind: JobKind::AllKeywordsCrawl { limit: 10 },
        retry_count: 0,
    }
}

#[test]
fn status_mirror_absence_does_not_imply_job_nonexistence() {
    let store = EphemeralStore::new();
    assert!(store.status(JobId::new(1)).is_none());
    store.mirror_status(JobId::new(1), JobStatus::Running, Utc::now());
    assert_eq!(store.status(JobId::new(1)).unwrap().status, JobStatus::Running);
}

#[test]
fn enqueue_and_dequeue_update_queue_stats_snapshot() {
    let store = EphemeralStore::new();
    store.enqueue(entry(1));
    assert_eq!(store.queue_stats().total_len(), 1);
    store.dequeue(None, Utc::now());
    assert_eq!(store.queue_stats().total_len(), 0);
}

#[test]
fn active_jobs_map_tracks_and_removes_summaries() {
    let store = EphemeralStore::new();
    let summary = ActiveJobSummary { job_id: JobId::new(1), user_id: UserId::new(1), status: JobStatus::Running, percentage: 50.0 };
    store.upsert_active_job(summary.clone());
    assert_eq!(store.active_job(JobId::new(1)), Some(summary));
    store.remove_active_job(JobId::new(1));
    assert_eq!(store.active_job(JobId::new(1)), None);
}

#[test]
fn user_notifications_list_is_capped_and_most_recent_first() {
    let store = EphemeralStore::new();
    let user_id = UserId::new(1);
    for i in 0..5u64 {
        store.push_user_notification(
            user_id,
            UserNotificationEntry { notification_id: crawl_core::NotificationId::new(i), title: format!("n{i}"), created_at: Utc::now() },
        );
    }
    let list = store.user_notifications(user_id);
    assert_eq!(list[0].title, "n4");
}

#[tokio::test]
async fn publish_reaches_both_the_event_channel_and_the_global_channel() {
    let store = EphemeralStore::new();
    let event = Event::JobStarted { job_id: JobId::new(1), user_id: UserId::new(1), at: Utc::now() };
    let mut all_events = store.subscribe_all();
    let mut job_events = store.pubsub.subscribe(event.channel());

    store.publish(event.clone());

    assert_eq!(all_events.recv().await.unwrap(), event);
    assert_eq!(job_events.recv().await.unwrap(), event);
}

#[test]
fn dashboard_snapshot_round_trips() {
    let store = EphemeralStore::new();
    let user_id = UserId::new(1);
    assert!(store.dashboard_snapshot(user_id).is_none());
    store.cache_dashboard_snapshot(user_id, "{\"active_jobs\":3}".into());
    assert_eq!(store.dashboard_snapshot(user_id).as_deref(), Some("{\"active_jobs\":3}"));
}
