// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Notification Router: consumes the lifecycle event stream and turns
//! wanted events into delivered, durably recorded notifications.

use crawl_adapters::NotificationSink;
use crawl_core::{DeliveryMethod, Event, JobId, Notification, NotificationPreferences, NotificationType, Severity, UserId};
use crawl_ephemeral::{EphemeralStore, UserNotificationEntry};
use crawl_storage::StateStore;
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tokio_util::sync::CancellationToken;

/// What an [`Event`] says to notify about, once it's been decided the event
/// is notification-worthy at all (schedule-fired, cancellation, and
/// notification-delivered events are not; they don't map to a
/// [`NotificationType`]).
struct NotificationIntent {
    kind: NotificationType,
    severity: Severity,
    user_id: UserId,
    job_id: Option<JobId>,
    title: String,
    message: String,
}

fn intent_for(event: &Event) -> Option<NotificationIntent> {
    match event {
        Event::JobStarted { job_id, user_id, .. } => Some(NotificationIntent {
            kind: NotificationType::JobStarted,
            severity: Severity::Info,
            user_id: *user_id,
            job_id: Some(*job_id),
            title: "Job started".into(),
            message: format!("Job {job_id} has started running."),
        }),
        Event::JobProgressMilestone { job_id, user_id, milestone_pct, .. } => Some(NotificationIntent {
            kind: NotificationType::JobProgress,
            severity: Severity::Info,
            user_id: *user_id,
            job_id: Some(*job_id),
            title: "Job progress".into(),
            message: format!("Job {job_id} is {milestone_pct}% complete."),
        }),
        Event::JobCompleted { job_id, user_id, items_saved, .. } => Some(NotificationIntent {
            kind: NotificationType::JobCompleted,
            severity: Severity::Success,
            user_id: *user_id,
            job_id: Some(*job_id),
            title: "Job completed".into(),
            message: format!("Job {job_id} completed, {items_saved} items saved."),
        }),
        Event::JobFailed { job_id, user_id, error, will_retry, .. } => Some(NotificationIntent {
            kind: NotificationType::JobFailed,
            severity: if *will_retry { Severity::Info } else { Severity::Error },
            user_id: *user_id,
            job_id: Some(*job_id),
            title: if *will_retry { "Job will retry".into() } else { "Job failed".into() },
            message: format!("Job {job_id} failed: {error}"),
        }),
        Event::JobCancelled { .. } | Event::ScheduleFired { .. } | Event::NotificationDelivered { .. } => None,
    }
}

/// The address a delivery method actually sends to. SMS goes to the user's
/// phone number on file; in-app and email fall back to a user-id-derived
/// address since neither has a separate address field here.
fn recipient_for(method: DeliveryMethod, user_id: UserId, prefs: &NotificationPreferences) -> String {
    match method {
        DeliveryMethod::Sms => prefs.phone_number.clone().unwrap_or_else(|| user_id.to_string()),
        DeliveryMethod::Email | DeliveryMethod::InApp => user_id.to_string(),
    }
}

/// Subscribes to every lifecycle event and, for each one the recipient user
/// actually wants, records and dispatches a [`Notification`] per opted-in
/// [`DeliveryMethod`]. Slow sinks never block event consumption: each
/// delivery runs on its own spawned task.
pub struct NotificationRouter<S: StateStore, N: NotificationSink> {
    store: Arc<S>,
    ephemeral: Arc<EphemeralStore>,
    sink: Arc<N>,
}

impl<S: StateStore, N: NotificationSink> NotificationRouter<S, N> {
    pub fn new(store: Arc<S>, ephemeral: Arc<EphemeralStore>, sink: Arc<N>) -> Self {
        Self { store, ephemeral, sink }
    }

    pub fn spawn(self: Arc<Self>, shutdown: CancellationToken) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move { self.run(shutdown).await })
    }

    async fn run(&self, shutdown: CancellationToken) {
        tracing::info!("notification router started");
        let mut events = self.ephemeral.subscribe_all();
        loop {
            tokio::select! {
                received = events.recv() => {
                    match received {
                        Ok(event) => self.handle_event(event).await,
                        Err(RecvError::Lagged(skipped)) => {
                            tracing::warn!(skipped, "notification router dropped lagging events");
                        }
                        Err(RecvError::Closed) => break,
                    }
                }
                _ = shutdown.cancelled() => break,
            }
        }
        tracing::info!("notification router stopped");
    }

    async fn handle_event(&self, event: Event) {
        let Some(intent) = intent_for(&event) else { return };

        let prefs = self.ephemeral.notification_preferences(intent.user_id).unwrap_or_else(|| crawl_core::NotificationPreferences::defaults(intent.user_id));
        if !prefs.wants(intent.kind) {
            return;
        }

        for method in prefs.delivery_methods() {
            self.dispatch(&intent, method, &prefs);
        }
    }

    /// Record the notification row, then deliver it on a detached task so a
    /// slow or failing sink can never stall event consumption.
    fn dispatch(&self, intent: &NotificationIntent, method: DeliveryMethod, prefs: &NotificationPreferences) {
        let recipient = recipient_for(method, intent.user_id, prefs);
        let notification = Notification {
            id: self.store.next_notification_id(),
            user_id: intent.user_id,
            job_id: intent.job_id,
            kind: intent.kind,
            severity: intent.severity,
            title: intent.title.clone(),
            message: intent.message.clone(),
            delivery_method: method,
            recipient,
            created_at: Utc::now(),
            sent: false,
            sent_at: None,
            delivery_status: crawl_core::DeliveryStatus::Pending,
            error_message: None,
            read: false,
            read_at: None,
        };
        let Ok(notification) = self.store.create_notification(notification) else {
            tracing::warn!(user_id = %intent.user_id, "failed to record notification row");
            return;
        };

        if method == DeliveryMethod::InApp {
            self.ephemeral.push_user_notification(
                notification.user_id,
                UserNotificationEntry { notification_id: notification.id, title: notification.title.clone(), created_at: notification.created_at },
            );
        }

        let store = Arc::clone(&self.store);
        let ephemeral = Arc::clone(&self.ephemeral);
        let sink = Arc::clone(&self.sink);
        tokio::spawn(async move {
            let channel = notification.delivery_method.to_string();
            let outcome = sink.send(&channel, &notification.recipient, &notification.title, &notification.message).await;
            let delivered = outcome.is_ok();
            let error = outcome.err().map(|err| err.to_string());
            if let Err(err) = store.mark_notification_sent(notification.id, delivered, error) {
                tracing::warn!(notification_id = %notification.id, %err, "failed to record delivery outcome");
                return;
            }
            if delivered {
                ephemeral.publish(Event::NotificationDelivered { notification_id: notification.id, user_id: notification.user_id, at: Utc::now() });
            }
        });
    }
}

#[cfg(test)]
#[path = "notifier_tests.rs"]
mod tests;
