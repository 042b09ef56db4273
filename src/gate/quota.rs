//! Per-identity daily quota
//!
//! Fixed-window counter with lazy reset: a window starts at the first request
//! of an identity and is replaced by a fresh one on the first request after it
//! has run for longer than the window length. There is no background sweep.
//! Up to twice the cap can pass in a burst straddling a window boundary.

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

/// Default number of admitted requests per identity and window
pub const MAX_REQUESTS_PER_DAY: u32 = 10;

/// Quota errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum QuotaError {
    #[error("Daily quota of {limit} requests exceeded")]
    Exceeded {
        limit: u32,
        resets_at: DateTime<Utc>,
    },
}

/// Usage state for one identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UsageRecord {
    pub count: u32,
    pub window_start: DateTime<Utc>,
}

impl UsageRecord {
    pub fn fresh(now: DateTime<Utc>) -> Self {
        Self {
            count: 0,
            window_start: now,
        }
    }

    fn is_stale(&self, now: DateTime<Utc>, window: Duration) -> bool {
        now - self.window_start > window
    }
}

/// Storage for usage records keyed by identity id.
///
/// `update` must give the closure exclusive access to the record for the whole
/// call so the read-check-increment sequence is atomic per identity.
pub trait UsageStore: Send + Sync {
    /// Run `f` on the record for `identity_id`, inserting `init` first if absent
    fn update<R>(
        &self,
        identity_id: &str,
        init: UsageRecord,
        f: impl FnOnce(&mut UsageRecord) -> R,
    ) -> R;

    fn get(&self, identity_id: &str) -> Option<UsageRecord>;
}

/// Process-local store. Entries live for the life of the process.
#[derive(Debug, Default)]
pub struct InMemoryUsageStore {
    records: DashMap<String, UsageRecord>,
}

impl InMemoryUsageStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl UsageStore for InMemoryUsageStore {
    fn update<R>(
        &self,
        identity_id: &str,
        init: UsageRecord,
        f: impl FnOnce(&mut UsageRecord) -> R,
    ) -> R {
        // The entry guard holds the shard write lock until `f` returns.
        let mut entry = self.records.entry(identity_id.to_string()).or_insert(init);
        f(entry.value_mut())
    }

    fn get(&self, identity_id: &str) -> Option<UsageRecord> {
        self.records.get(identity_id).map(|r| *r.value())
    }
}

/// Cap and window length
#[derive(Debug, Clone, Copy)]
pub struct QuotaPolicy {
    pub max_requests: u32,
    pub window: Duration,
}

impl Default for QuotaPolicy {
    fn default() -> Self {
        Self {
            max_requests: MAX_REQUESTS_PER_DAY,
            window: Duration::hours(24),
        }
    }
}

/// Usage snapshot returned on admission and by usage queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QuotaStatus {
    pub used: u32,
    pub limit: u32,
    pub remaining: u32,
    pub window_start: DateTime<Utc>,
    pub resets_at: DateTime<Utc>,
}

impl QuotaStatus {
    fn from_record(record: &UsageRecord, policy: &QuotaPolicy) -> Self {
        Self {
            used: record.count,
            limit: policy.max_requests,
            remaining: policy.max_requests.saturating_sub(record.count),
            window_start: record.window_start,
            resets_at: record.window_start + policy.window,
        }
    }
}

/// Tracks admitted requests per identity against the policy cap
#[derive(Debug)]
pub struct QuotaTracker<S: UsageStore = InMemoryUsageStore> {
    store: S,
    policy: QuotaPolicy,
}

impl<S: UsageStore> QuotaTracker<S> {
    pub fn new(store: S, policy: QuotaPolicy) -> Self {
        Self { store, policy }
    }

    /// Charge one request to `identity_id` at time `now`.
    ///
    /// Rejected attempts leave the record untouched.
    pub fn admit_at(&self, identity_id: &str, now: DateTime<Utc>) -> Result<QuotaStatus, QuotaError> {
        let policy = self.policy;

        let outcome = self.store.update(identity_id, UsageRecord::fresh(now), |record| {
            if record.is_stale(now, policy.window) {
                *record = UsageRecord::fresh(now);
            }

            if record.count >= policy.max_requests {
                return Err(QuotaError::Exceeded {
                    limit: policy.max_requests,
                    resets_at: record.window_start + policy.window,
                });
            }

            record.count += 1;
            Ok(QuotaStatus::from_record(record, &policy))
        });

        match &outcome {
            Ok(status) => info!(
                identity = %identity_id,
                new_count = status.used,
                cap = status.limit,
                "Request admitted"
            ),
            Err(QuotaError::Exceeded { limit, resets_at }) => warn!(
                identity = %identity_id,
                cap = limit,
                resets_at = %resets_at.to_rfc3339(),
                "Daily quota exceeded"
            ),
        }

        outcome
    }

    /// Current usage without charging. A stale window reports as empty.
    pub fn usage_at(&self, identity_id: &str, now: DateTime<Utc>) -> QuotaStatus {
        let record = match self.store.get(identity_id) {
            Some(record) if !record.is_stale(now, self.policy.window) => record,
            _ => UsageRecord::fresh(now),
        };
        QuotaStatus::from_record(&record, &self.policy)
    }

    #[cfg(test)]
    pub fn record(&self, identity_id: &str) -> Option<UsageRecord> {
        self.store.get(identity_id)
    }
}
