// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A minimal `CrawlExecutor` standing in for a real external content API
//! client. This lets the daemon binary run standalone without a real Reddit
//! API integration; a deployment wires a real implementation behind the same
//! trait instead.

use async_trait::async_trait;
use crawl_adapters::{CancelSignal, CrawlExecutor, CrawlResult, ExecError, ProgressCallback, ProgressTick};
use crawl_core::JobKind;
use std::time::Duration;

/// Simulates crawl work by reporting a handful of progress ticks over a
/// short delay, observing `cancel_signal` between ticks.
pub struct SimulatedCrawlExecutor {
    tick_count: u64,
    tick_delay: Duration,
}

impl SimulatedCrawlExecutor {
    pub fn new() -> Self {
        Self { tick_count: 10, tick_delay: Duration::from_millis(200) }
    }

    fn limit(job_kind: &JobKind) -> u64 {
        match job_kind {
            JobKind::KeywordCrawl { limit, .. }
            | JobKind::TrendingCrawl { limit, .. }
            | JobKind::AllKeywordsCrawl { limit }
            | JobKind::CommentsCrawl { limit, .. } => *limit as u64,
        }
    }
}

impl Default for SimulatedCrawlExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CrawlExecutor for SimulatedCrawlExecutor {
    async fn execute(&self, job_kind: &JobKind, progress: ProgressCallback, cancel: CancelSignal) -> Result<CrawlResult, ExecError> {
        let total = Self::limit(job_kind).max(self.tick_count);
        let per_tick = total.div_ceil(self.tick_count);
        let mut processed = 0u64;

        for _ in 0..self.tick_count {
            if cancel.is_cancelled() {
                return Ok(CrawlResult { items_processed: processed, items_saved: processed, items_failed: 0, points_consumed: processed });
            }
            tokio::time::sleep(self.tick_delay).await;
            processed = (processed + per_tick).min(total);
            progress(ProgressTick { current: processed, total, items_saved: processed, items_failed: 0 });
        }

        Ok(CrawlResult { items_processed: processed, items_saved: processed, items_failed: 0, points_consumed: processed })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn reports_progress_up_to_the_requested_limit() {
        let executor = SimulatedCrawlExecutor { tick_count: 2, tick_delay: Duration::from_millis(1) };
        let last_current = Arc::new(AtomicU64::new(0));
        let recorder = Arc::clone(&last_current);
        let progress: ProgressCallback = Arc::new(move |tick| recorder.store(tick.current, Ordering::SeqCst));

        let result = executor.execute(&JobKind::AllKeywordsCrawl { limit: 10 }, progress, CancelSignal::new()).await.unwrap();

        assert_eq!(result.items_processed, 10);
        assert_eq!(last_current.load(Ordering::SeqCst), 10);
    }

    #[tokio::test]
    async fn stops_early_once_cancelled() {
        let executor = SimulatedCrawlExecutor { tick_count: 5, tick_delay: Duration::from_millis(50) };
        let cancel = CancelSignal::new();
        cancel.cancel();

        let result = executor.execute(&JobKind::AllKeywordsCrawl { limit: 100 }, Arc::new(|_| {}), cancel).await.unwrap();

        assert_eq!(result.items_processed, 0);
    }
}
