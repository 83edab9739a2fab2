// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon configuration: defaults, overridden by an optional TOML file,
//! overridden in turn by `CRAWLD__`-prefixed, double-underscore-nested
//! environment variables (e.g. `CRAWLD__WORKER__CONCURRENCY=8`).

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// Concurrent worker loops.
    pub concurrency: usize,
    pub poll_interval_ms: u64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self { concurrency: 4, poll_interval_ms: 1000 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Wake interval between scheduler ticks.
    pub tick_seconds: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self { tick_seconds: 30 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DaemonConfig {
    pub bind_addr: String,
    pub worker: WorkerConfig,
    pub scheduler: SchedulerConfig,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self { bind_addr: "0.0.0.0:8080".into(), worker: WorkerConfig::default(), scheduler: SchedulerConfig::default() }
    }
}

impl WorkerConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl SchedulerConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.tick_seconds)
    }
}

#[derive(Debug, thiserror::Error)]
#[error("failed to load daemon configuration: {0}")]
pub struct ConfigError(#[from] figment::Error);

impl DaemonConfig {
    /// Layer defaults, `crawld.toml` (if present), then environment
    /// overrides, matching the sibling example repos' figment convention.
    pub fn load() -> Result<Self, ConfigError> {
        Figment::from(Serialized::defaults(DaemonConfig::default()))
            .merge(Toml::file("crawld.toml"))
            .merge(Env::prefixed("CRAWLD__").split("__"))
            .extract()
            .map_err(ConfigError)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
