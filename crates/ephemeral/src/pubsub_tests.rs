use super::*;
use crawl_core::{JobId, UserId};

#[tokio::test]
async fn publish_with_no_subscribers_is_a_silent_no_op() {
    let pubsub = PubSub::new();
    let delivered = pubsub.publish(Event::JobStarted { job_id: JobId::new(1), user_id: UserId::new(1), at: chrono::Utc::now() });
    assert_eq!(delivered, 0);
}

#[tokio::test]
async fn subscriber_receives_published_event_on_its_channel() {
    let pubsub = PubSub::new();
    let event = Event::JobStarted { job_id: JobId::new(7), user_id: UserId::new(1), at: chrono::Utc::now() };
    let mut rx = pubsub.subscribe(event.channel());

    let delivered = pubsub.publish(event.clone());
    assert_eq!(delivered, 1);

    let received = rx.recv().await.expect("event delivered");
    assert_eq!(received, event);
}
