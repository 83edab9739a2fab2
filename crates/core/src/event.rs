// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lifecycle events published to the Ephemeral Store's pub/sub channels and
//! consumed by the Notification Router, which subscribes to the relevant
//! channel and reacts to each event kind in turn.

use crate::ids::{JobId, NotificationId, ScheduleId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A durable state transition or schedule firing, tagged by kind for easy
/// dispatch: started, completed, failed, cancelled, or a progress milestone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Event {
    JobStarted {
        job_id: JobId,
        user_id: UserId,
        at: DateTime<Utc>,
    },
    /// Only emitted when progress crosses a milestone boundary; every
    /// ephemeral progress write does not produce one of these.
    JobProgressMilestone {
        job_id: JobId,
        user_id: UserId,
        milestone_pct: u8,
        current: u64,
        total: u64,
        at: DateTime<Utc>,
    },
    JobCompleted {
        job_id: JobId,
        user_id: UserId,
        items_processed: u64,
        items_saved: u64,
        at: DateTime<Utc>,
    },
    JobFailed {
        job_id: JobId,
        user_id: UserId,
        error: String,
        will_retry: bool,
        at: DateTime<Utc>,
    },
    JobCancelled {
        job_id: JobId,
        user_id: UserId,
        at: DateTime<Utc>,
    },
    ScheduleFired {
        schedule_id: ScheduleId,
        job_id: JobId,
        at: DateTime<Utc>,
    },
    NotificationDelivered {
        notification_id: NotificationId,
        user_id: UserId,
        at: DateTime<Utc>,
    },
}

impl Event {
    /// The job this event concerns, if any (schedule-fired and
    /// notification-delivered events also carry one, indirectly).
    pub fn job_id(&self) -> Option<JobId> {
        match self {
            Event::JobStarted { job_id, .. }
            | Event::JobProgressMilestone { job_id, .. }
            | Event::JobCompleted { job_id, .. }
            | Event::JobFailed { job_id, .. }
            | Event::JobCancelled { job_id, .. }
            | Event::ScheduleFired { job_id, .. } => Some(*job_id),
            Event::NotificationDelivered { .. } => None,
        }
    }

    /// The ephemeral pub/sub channel name this event publishes to:
    /// `job_progress:<id>`, `job_alerts:<id>`, or `user_notifications:<user_id>`.
    pub fn channel(&self) -> String {
        match self {
            Event::JobProgressMilestone { job_id, .. } => format!("job_progress:{job_id}"),
            Event::JobStarted { job_id, .. } | Event::JobCompleted { job_id, .. } | Event::JobFailed { job_id, .. } | Event::JobCancelled { job_id, .. } => {
                format!("job_alerts:{job_id}")
            }
            Event::ScheduleFired { job_id, .. } => format!("job_alerts:{job_id}"),
            Event::NotificationDelivered { user_id, .. } => format!("user_notifications:{user_id}"),
        }
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
