// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Point-in-time resource/throughput samples recorded while a job runs: job
//! id, timestamp, cpu%, memory-MB, items-per-second, queue-size, and
//! active-connections.

use crate::ids::JobId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single metric observation, capped at 100 per job with a 1h TTL in the
/// Ephemeral Store under `job_metrics:<id>`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JobMetricSample {
    pub job_id: JobId,
    pub at: DateTime<Utc>,
    pub cpu_percent: f32,
    pub memory_mb: f32,
    pub items_per_second: f64,
    pub queue_size: u64,
    pub active_connections: u32,
}

impl JobMetricSample {
    /// ETA in seconds to finish the remaining work at this sample's rate:
    /// `(total - current) / items_per_second` when speed is positive.
    pub fn eta_seconds(&self, current: u64, total: u64) -> Option<f64> {
        if self.items_per_second <= 0.0 || total <= current {
            return None;
        }
        Some((total - current) as f64 / self.items_per_second)
    }
}

crate::builder! {
    pub struct JobMetricSampleBuilder => JobMetricSample {
        set {
            job_id: JobId = JobId::new(1),
            at: DateTime<Utc> = Utc::now(),
            cpu_percent: f32 = 0.0,
            memory_mb: f32 = 0.0,
            items_per_second: f64 = 0.0,
            queue_size: u64 = 0,
            active_connections: u32 = 0,
        }
    }
}

#[cfg(test)]
#[path = "metrics_tests.rs"]
mod tests;
