// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Notification records and per-user delivery preferences.

use crate::ids::{JobId, NotificationId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What happened that triggered a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    JobStarted,
    JobProgress,
    JobCompleted,
    JobFailed,
}

crate::simple_display! {
    NotificationType {
        JobStarted => "job_started",
        JobProgress => "job_progress",
        JobCompleted => "job_completed",
        JobFailed => "job_failed",
    }
}

/// Severity used by clients to prioritize rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Success,
    Error,
}

crate::simple_display! {
    Severity {
        Info => "info",
        Success => "success",
        Error => "error",
    }
}

/// Where a notification is delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryMethod {
    InApp,
    Email,
    Sms,
}

crate::simple_display! {
    DeliveryMethod {
        InApp => "in_app",
        Email => "email",
        Sms => "sms",
    }
}

/// Outcome of handing a notification to its [`DeliveryMethod`] sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    Pending,
    Delivered,
    Failed,
}

crate::simple_display! {
    DeliveryStatus {
        Pending => "pending",
        Delivered => "delivered",
        Failed => "failed",
    }
}

/// A single notification record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub user_id: UserId,
    pub job_id: Option<JobId>,
    pub kind: NotificationType,
    pub severity: Severity,
    pub title: String,
    pub message: String,
    pub delivery_method: DeliveryMethod,
    pub recipient: String,
    pub created_at: DateTime<Utc>,
    pub sent: bool,
    pub sent_at: Option<DateTime<Utc>>,
    pub delivery_status: DeliveryStatus,
    pub error_message: Option<String>,
    pub read: bool,
    pub read_at: Option<DateTime<Utc>>,
}

impl Notification {
    /// Record a sink's delivery outcome. On success sets `sent`, `sent_at`,
    /// and `delivery_status = Delivered`; failures are logged on the row
    /// rather than retried inline.
    pub fn record_delivery(&mut self, delivered: bool, error: Option<String>, now: DateTime<Utc>) {
        if delivered {
            self.sent = true;
            self.sent_at = Some(now);
            self.delivery_status = DeliveryStatus::Delivered;
            self.error_message = None;
        } else {
            self.delivery_status = DeliveryStatus::Failed;
            self.error_message = error;
        }
    }

    /// Mark as read by the recipient user.
    pub fn mark_read(&mut self, now: DateTime<Utc>) {
        self.read = true;
        self.read_at = Some(now);
    }
}

/// A user's opt-in/opt-out preferences, per [`NotificationType`] and
/// [`DeliveryMethod`].
///
/// Defaults mirror the original product's notification settings: lifecycle
/// milestones (started/completed/failed) are on in-app by default, progress
/// updates are off by default to avoid spam, and email/SMS require explicit
/// opt-in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationPreferences {
    pub user_id: UserId,
    pub job_started: bool,
    pub job_progress: bool,
    pub job_completed: bool,
    pub job_failed: bool,
    pub email_enabled: bool,
    pub sms_enabled: bool,
    pub phone_number: Option<String>,
}

impl NotificationPreferences {
    /// Construct the defaults for a newly registered user.
    pub fn defaults(user_id: UserId) -> Self {
        Self {
            user_id,
            job_started: true,
            job_progress: false,
            job_completed: true,
            job_failed: true,
            email_enabled: false,
            sms_enabled: false,
            phone_number: None,
        }
    }

    /// Whether notifications of `kind` should be generated at all for this user.
    pub fn wants(&self, kind: NotificationType) -> bool {
        match kind {
            NotificationType::JobStarted => self.job_started,
            NotificationType::JobProgress => self.job_progress,
            NotificationType::JobCompleted => self.job_completed,
            NotificationType::JobFailed => self.job_failed,
        }
    }

    /// The delivery methods to use for a wanted notification: in-app always,
    /// plus email/SMS if the user opted in. SMS additionally requires a
    /// phone number on file; an SMS opt-in with no number on record never
    /// produces an address-less delivery attempt.
    pub fn delivery_methods(&self) -> Vec<DeliveryMethod> {
        let mut methods = vec![DeliveryMethod::InApp];
        if self.email_enabled {
            methods.push(DeliveryMethod::Email);
        }
        if self.sms_enabled && self.phone_number.is_some() {
            methods.push(DeliveryMethod::Sms);
        }
        methods
    }
}

/// Milestone percentages that trigger a progress notification. Fires only
/// when progress crosses one of these boundaries, never continuously.
pub const PROGRESS_MILESTONES: [u8; 3] = [25, 50, 75];

/// Whether progress moving from `previous_pct` to `current_pct` crosses a
/// milestone boundary that hasn't already been announced.
pub fn crosses_milestone(previous_pct: f64, current_pct: f64) -> Option<u8> {
    PROGRESS_MILESTONES
        .iter()
        .copied()
        .find(|&m| previous_pct < m as f64 && current_pct >= m as f64)
}

crate::builder! {
    pub struct NotificationBuilder => Notification {
        into {
            title: String = "Job update",
            message: String = "",
            recipient: String = "",
        }
        set {
            id: NotificationId = NotificationId::new(1),
            user_id: UserId = UserId::new(1),
            job_id: Option<JobId> = None,
            kind: NotificationType = NotificationType::JobCompleted,
            severity: Severity = Severity::Info,
            delivery_method: DeliveryMethod = DeliveryMethod::InApp,
            created_at: DateTime<Utc> = Utc::now(),
            sent: bool = false,
            sent_at: Option<DateTime<Utc>> = None,
            delivery_status: DeliveryStatus = DeliveryStatus::Pending,
            error_message: Option<String> = None,
            read: bool = false,
            read_at: Option<DateTime<Utc>> = None,
        }
    }
}

#[cfg(test)]
#[path = "notification_tests.rs"]
mod tests;
