use super::*;
use crawl_adapters::FakeNotificationSink;
use crawl_core::NotificationPreferences;
use crawl_storage::InMemoryStateStore;
use std::time::Duration;

fn router() -> (Arc<NotificationRouter<InMemoryStateStore, FakeNotificationSink>>, Arc<FakeNotificationSink>) {
    let sink = Arc::new(FakeNotificationSink::new());
    let router = Arc::new(NotificationRouter::new(Arc::new(InMemoryStateStore::new()), Arc::new(EphemeralStore::new()), Arc::clone(&sink)));
    (router, sink)
}

async fn settle() {
    tokio::time::sleep(Duration::from_millis(20)).await;
}

#[tokio::test]
async fn job_started_event_delivers_an_in_app_notification_by_default() {
    let (router, sink) = router();
    let user_id = UserId::new(1);
    let job_id = JobId::new(1);

    router.handle_event(Event::JobStarted { job_id, user_id, at: Utc::now() }).await;
    settle().await;

    let calls = sink.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].channel, "in_app");
    assert!(calls[0].message.contains(&job_id.to_string()));

    let stored = router.store.query_notifications(user_id, 10);
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].delivery_status, crawl_core::DeliveryStatus::Delivered);
    assert!(stored[0].sent);

    assert_eq!(router.ephemeral.user_notifications(user_id).len(), 1);
}

#[tokio::test]
async fn progress_milestones_are_suppressed_by_default_preferences() {
    let (router, sink) = router();
    let user_id = UserId::new(2);
    let job_id = JobId::new(2);

    router
        .handle_event(Event::JobProgressMilestone { job_id, user_id, milestone_pct: 50, current: 50, total: 100, at: Utc::now() })
        .await;
    settle().await;

    assert!(sink.calls().is_empty());
    assert!(router.store.query_notifications(user_id, 10).is_empty());
}

#[tokio::test]
async fn opted_out_notification_type_is_not_delivered() {
    let (router, sink) = router();
    let user_id = UserId::new(3);
    let job_id = JobId::new(3);

    let mut prefs = NotificationPreferences::defaults(user_id);
    prefs.job_completed = false;
    router.ephemeral.set_notification_preferences(user_id, prefs);

    router.handle_event(Event::JobCompleted { job_id, user_id, items_processed: 10, items_saved: 9, at: Utc::now() }).await;
    settle().await;

    assert!(sink.calls().is_empty());
}

#[tokio::test]
async fn job_cancelled_events_do_not_produce_notifications() {
    let (router, sink) = router();
    let user_id = UserId::new(9);
    let job_id = JobId::new(9);

    router.handle_event(Event::JobCancelled { job_id, user_id, at: Utc::now() }).await;
    settle().await;

    assert!(sink.calls().is_empty());
}

#[tokio::test]
async fn sms_delivery_uses_the_phone_number_on_file_as_recipient() {
    let (router, sink) = router();
    let user_id = UserId::new(5);
    let job_id = JobId::new(5);

    let mut prefs = NotificationPreferences::defaults(user_id);
    prefs.sms_enabled = true;
    prefs.phone_number = Some("+15551234567".into());
    router.ephemeral.set_notification_preferences(user_id, prefs);

    router.handle_event(Event::JobCompleted { job_id, user_id, items_processed: 10, items_saved: 9, at: Utc::now() }).await;
    settle().await;

    let calls = sink.calls();
    let sms = calls.iter().find(|c| c.channel == "sms").expect("sms delivery should have been attempted");
    assert_eq!(sms.recipient, "+15551234567");
}

#[tokio::test]
async fn sms_opt_in_without_a_phone_number_is_not_delivered() {
    let (router, sink) = router();
    let user_id = UserId::new(6);
    let job_id = JobId::new(6);

    let mut prefs = NotificationPreferences::defaults(user_id);
    prefs.sms_enabled = true;
    router.ephemeral.set_notification_preferences(user_id, prefs);

    router.handle_event(Event::JobCompleted { job_id, user_id, items_processed: 10, items_saved: 9, at: Utc::now() }).await;
    settle().await;

    assert!(sink.calls().iter().all(|c| c.channel != "sms"));
}

#[tokio::test]
async fn email_opt_in_adds_a_second_delivery_alongside_in_app() {
    let (router, sink) = router();
    let user_id = UserId::new(4);
    let job_id = JobId::new(4);

    let mut prefs = NotificationPreferences::defaults(user_id);
    prefs.email_enabled = true;
    router.ephemeral.set_notification_preferences(user_id, prefs);

    router.handle_event(Event::JobCompleted { job_id, user_id, items_processed: 10, items_saved: 9, at: Utc::now() }).await;
    settle().await;

    let calls = sink.calls();
    assert_eq!(calls.len(), 2);
    assert!(calls.iter().any(|c| c.channel == "in_app"));
    assert!(calls.iter().any(|c| c.channel == "email"));
}

#[tokio::test]
async fn schedule_fired_events_do_not_produce_notifications() {
    let (router, sink) = router();
    router
        .handle_event(Event::ScheduleFired { schedule_id: crawl_core::ScheduleId::new(1), job_id: JobId::new(5), at: Utc::now() })
        .await;
    settle().await;
    assert!(sink.calls().is_empty());
}
