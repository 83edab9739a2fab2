// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Recurring schedules that spawn jobs on a cadence.

use crate::ids::{KeywordId, ScheduleId, UserId};
use crate::job::{JobDescriptor, JobKind, Priority, DEFAULT_TIMEOUT_SECONDS};
use chrono::{DateTime, Datelike, Duration as ChronoDuration, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;

/// How often a schedule fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleFrequency {
    Once,
    Hourly,
    Daily,
    Weekly,
    Monthly,
    /// A constrained cron-like expression is deliberately out of scope here;
    /// this carries a plain interval so [`compute_next`] has something
    /// deterministic to do.
    Custom { interval_seconds: u64 },
}

crate::simple_display! {
    ScheduleFrequency {
        Once => "once",
        Hourly => "hourly",
        Daily => "daily",
        Weekly => "weekly",
        Monthly => "monthly",
        Custom { .. } => "custom",
    }
}

/// The job template a schedule instantiates on each fire. A schedule carries
/// a template, not a live job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobTemplate {
    pub name: String,
    pub kind: JobKind,
    pub parameters: HashMap<String, String>,
    pub priority: Priority,
    pub max_retries: u32,
    pub timeout_seconds: u32,
}

impl JobTemplate {
    /// Instantiate a concrete [`JobDescriptor`] for a single firing.
    pub fn instantiate(&self, user_id: UserId, keyword_id: Option<KeywordId>, schedule_id: ScheduleId) -> JobDescriptor {
        JobDescriptor {
            user_id,
            keyword_id,
            schedule_id: Some(schedule_id),
            name: self.name.clone(),
            kind: self.kind.clone(),
            parameters: self.parameters.clone(),
            priority: self.priority,
            max_retries: self.max_retries,
            timeout_seconds: self.timeout_seconds,
            scheduled_for: None,
        }
    }
}

/// A recurring job template.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Schedule {
    pub id: ScheduleId,
    pub user_id: UserId,
    pub keyword_id: Option<KeywordId>,
    pub name: String,
    pub description: Option<String>,
    pub template: JobTemplate,
    pub frequency: ScheduleFrequency,
    /// IANA timezone name the fixed-hour anchors (09:00, Monday, first-of-month)
    /// are evaluated in.
    pub timezone: String,
    pub max_concurrent_jobs: u32,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub next_run_at: Option<DateTime<Utc>>,
    pub last_run_at: Option<DateTime<Utc>>,
    pub total_runs: u64,
    pub successful_runs: u64,
    pub failed_runs: u64,
    pub version: u64,
}

impl Schedule {
    /// Whether this schedule is due to fire at `now`: active, with
    /// `next_run_at <= now`.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.active && self.next_run_at.is_some_and(|t| t <= now)
    }

    /// `successful_runs / total_runs` as a percentage; 0 before any run
    /// completes.
    pub fn success_rate(&self) -> f64 {
        if self.total_runs == 0 {
            return 0.0;
        }
        100.0 * self.successful_runs as f64 / self.total_runs as f64
    }

    /// Record the terminal outcome of a job this schedule spawned.
    pub fn record_outcome(&mut self, succeeded: bool) {
        if succeeded {
            self.successful_runs += 1;
        } else {
            self.failed_runs += 1;
        }
        self.version += 1;
    }

    /// The timezone to evaluate fixed-hour anchors in; falls back to UTC if
    /// the stored IANA name fails to parse (should not happen for validated
    /// input, but this keeps the scheduler loop infallible).
    pub fn tz(&self) -> Tz {
        Tz::from_str(&self.timezone).unwrap_or(Tz::UTC)
    }

    /// Record a firing and compute the next run time: `last_run_at = now`,
    /// `next_run_at = compute_next(now, frequency)`, `total_runs += 1`. A
    /// `Once` schedule deactivates instead.
    pub fn record_fire(&mut self, now: DateTime<Utc>) {
        self.last_run_at = Some(now);
        self.total_runs += 1;
        self.version += 1;
        if matches!(self.frequency, ScheduleFrequency::Once) {
            self.active = false;
            self.next_run_at = None;
        } else {
            self.next_run_at = Some(compute_next(now, self.frequency, self.tz()));
        }
    }
}

/// Computes the next run time for a frequency. A pure function of `(now,
/// frequency)` for non-custom frequencies.
pub fn compute_next(now: DateTime<Utc>, frequency: ScheduleFrequency, tz: Tz) -> DateTime<Utc> {
    match frequency {
        ScheduleFrequency::Once => now,
        ScheduleFrequency::Hourly => now + ChronoDuration::hours(1),
        ScheduleFrequency::Daily => next_daily_anchor(now, tz),
        ScheduleFrequency::Weekly => next_weekly_anchor(now, tz),
        ScheduleFrequency::Monthly => next_monthly_anchor(now, tz),
        ScheduleFrequency::Custom { interval_seconds } => now + ChronoDuration::seconds(interval_seconds.max(1) as i64),
    }
}

const ANCHOR_HOUR: u32 = 9;

/// Next occurrence of `09:00` in `tz`, strictly after `now`.
fn next_daily_anchor(now: DateTime<Utc>, tz: Tz) -> DateTime<Utc> {
    let local = now.with_timezone(&tz);
    let today_anchor = local.date_naive().and_hms_opt(ANCHOR_HOUR, 0, 0).expect("valid time");
    let today_anchor = tz.from_local_datetime(&today_anchor).single().unwrap_or(local);
    let anchor = if today_anchor > local { today_anchor } else { today_anchor + ChronoDuration::days(1) };
    anchor.with_timezone(&Utc)
}

/// Next Monday `09:00` in `tz`, strictly after `now`.
fn next_weekly_anchor(now: DateTime<Utc>, tz: Tz) -> DateTime<Utc> {
    let local = now.with_timezone(&tz);
    let days_until_monday = (7 - local.weekday().num_days_from_monday()) % 7;
    let mut candidate_date = local.date_naive() + ChronoDuration::days(days_until_monday as i64);
    let mut anchor = tz
        .from_local_datetime(&candidate_date.and_hms_opt(ANCHOR_HOUR, 0, 0).expect("valid time"))
        .single()
        .unwrap_or(local);
    if anchor <= local {
        candidate_date += ChronoDuration::days(7);
        anchor = tz
            .from_local_datetime(&candidate_date.and_hms_opt(ANCHOR_HOUR, 0, 0).expect("valid time"))
            .single()
            .unwrap_or(anchor);
    }
    anchor.with_timezone(&Utc)
}

/// First day of next month, `09:00`, in `tz`.
fn next_monthly_anchor(now: DateTime<Utc>, tz: Tz) -> DateTime<Utc> {
    let local = now.with_timezone(&tz);
    let (year, month) = if local.month() == 12 { (local.year() + 1, 1) } else { (local.year(), local.month() + 1) };
    let anchor = tz
        .with_ymd_and_hms(year, month, 1, ANCHOR_HOUR, 0, 0)
        .single()
        .unwrap_or(local);
    anchor.with_timezone(&Utc)
}

crate::builder! {
    pub struct ScheduleBuilder => Schedule {
        into {
            name: String = "scheduled-crawl",
            timezone: String = "UTC",
        }
        option {
            description: String = None,
        }
        set {
            id: ScheduleId = ScheduleId::new(1),
            user_id: UserId = UserId::new(1),
            keyword_id: Option<KeywordId> = None,
            template: JobTemplate = JobTemplate {
                name: "scheduled-crawl".into(),
                kind: JobKind::AllKeywordsCrawl { limit: 50 },
                parameters: HashMap::new(),
                priority: Priority::Normal,
                max_retries: 3,
                timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            },
            frequency: ScheduleFrequency = ScheduleFrequency::Daily,
            max_concurrent_jobs: u32 = 1,
            active: bool = true,
            created_at: DateTime<Utc> = Utc::now(),
            next_run_at: Option<DateTime<Utc>> = None,
            last_run_at: Option<DateTime<Utc>> = None,
            total_runs: u64 = 0,
            successful_runs: u64 = 0,
            failed_runs: u64 = 0,
            version: u64 = 0,
        }
    }
}

#[cfg(test)]
#[path = "schedule_tests.rs"]
mod tests;
