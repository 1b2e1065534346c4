// Cached aggregation result plus the time it was produced.
// On the wire the result fields sit next to `timestamp` (flattened).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::AggregationResult;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub result: AggregationResult,
}

impl CacheEntry {
    pub fn new(result: AggregationResult) -> Self {
        Self::at(Utc::now(), result)
    }

    pub fn at(timestamp: DateTime<Utc>, result: AggregationResult) -> Self {
        Self { timestamp, result }
    }

    pub fn age(&self, now: DateTime<Utc>) -> chrono::Duration {
        now.signed_duration_since(self.timestamp)
    }
}
