// Last aggregation result per interval, with freshness checks.
// Reads never fail the caller: a missing or unreadable entry is a miss.

mod file;
mod memory;

pub use file::FileCacheStore;
pub use memory::MemoryCacheStore;

use crate::error::CacheError;
use crate::models::CacheEntry;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::time::Duration;

#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Entry for `key`, or `None` if absent or unreadable.
    async fn get(&self, key: &str) -> Option<CacheEntry>;

    /// Replace the entry for `key` (no merge, no history).
    async fn set(&self, key: &str, entry: &CacheEntry) -> Result<(), CacheError>;
}

/// `now - entry.timestamp < threshold`. Entries stamped in the future count as fresh.
pub fn is_fresh(entry: &CacheEntry, threshold: Duration, now: DateTime<Utc>) -> bool {
    match entry.age(now).to_std() {
        Ok(age) => age < threshold,
        Err(_) => true,
    }
}

/// How long cached results may be served, by outcome.
#[derive(Debug, Clone, Copy)]
pub struct FreshnessPolicy {
    pub complete: Duration,
    /// Window for failed or partial runs. Zero disables serving them.
    pub partial: Duration,
}

impl Default for FreshnessPolicy {
    fn default() -> Self {
        Self {
            complete: Duration::from_secs(6 * 3600),
            partial: Duration::from_secs(10 * 60),
        }
    }
}

impl From<&crate::config::CacheConfig> for FreshnessPolicy {
    fn from(c: &crate::config::CacheConfig) -> Self {
        Self {
            complete: Duration::from_secs(c.fresh_hours.saturating_mul(3600)),
            partial: Duration::from_secs(c.partial_fresh_minutes.saturating_mul(60)),
        }
    }
}

impl FreshnessPolicy {
    pub fn threshold_for(&self, entry: &CacheEntry) -> Duration {
        if entry.result.is_complete() {
            self.complete
        } else {
            self.partial
        }
    }

    pub fn is_servable(&self, entry: &CacheEntry, now: DateTime<Utc>) -> bool {
        let threshold = self.threshold_for(entry);
        !threshold.is_zero() && is_fresh(entry, threshold, now)
    }
}
