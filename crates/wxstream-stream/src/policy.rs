//! Refresh and retry decisions.
//!
//! A cached reading younger than the freshness window is reused without
//! calling upstream. Failed fetches are retried immediately, without backoff,
//! until the retry bound is reached.

use chrono::{DateTime, Duration, Utc};
use wxstream_core::RefreshConfig;

use crate::store::CachedState;

/// Outcome of counting a failed fetch attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Try again immediately with the incremented count.
    Retry { next: u32 },
    /// The bound is reached; no further upstream call for this trigger.
    Exhausted { count: u32 },
}

/// Decides when a cached reading is stale and how long to keep retrying.
#[derive(Debug, Clone)]
pub struct RefreshPolicy {
    freshness_window: Duration,
    retry_bound: u32,
}

impl RefreshPolicy {
    pub fn new(config: &RefreshConfig) -> Self {
        Self {
            freshness_window: Duration::minutes(config.freshness_minutes as i64),
            retry_bound: config.retry_bound,
        }
    }

    /// A fetch is skipped only when the previous one is recent enough. A
    /// state that never fetched always refreshes.
    pub fn should_refresh(&self, state: &CachedState, now: DateTime<Utc>) -> bool {
        match state.last_fetch_at {
            Some(last) => now.signed_duration_since(last) >= self.freshness_window,
            None => true,
        }
    }

    /// Count a failed attempt. The count never exceeds the bound.
    pub fn on_fetch_failure(&self, retry_count: u32) -> RetryDecision {
        let next = retry_count.saturating_add(1).min(self.retry_bound);
        if next < self.retry_bound {
            RetryDecision::Retry { next }
        } else {
            RetryDecision::Exhausted { count: next }
        }
    }

    /// True when a persisted count already used up the attempt budget.
    pub fn is_exhausted(&self, retry_count: u32) -> bool {
        retry_count >= self.retry_bound
    }
}
