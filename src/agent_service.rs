// "Fetch all" coordination: serve a fresh cached aggregation, otherwise run the
// aggregator (one run per interval at a time, under a deadline) and cache the result.
// Single-agent and single-page reads go straight to the source.

use crate::aggregator::Aggregator;
use crate::cache_store::{CacheStore, FreshnessPolicy};
use crate::cookie_client::AgentSource;
use crate::error::AgentError;
use crate::models::{AgentRecord, AggregationResult, CacheEntry, Interval, PageRequest};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

pub struct AgentService {
    source: Arc<dyn AgentSource>,
    aggregator: Aggregator,
    cache: Arc<dyn CacheStore>,
    freshness: FreshnessPolicy,
    run_timeout: Duration,
    /// Single-flight guard per interval.
    runs: HashMap<Interval, Mutex<()>>,
}

impl AgentService {
    pub fn new(
        source: Arc<dyn AgentSource>,
        aggregator: Aggregator,
        cache: Arc<dyn CacheStore>,
        freshness: FreshnessPolicy,
        run_timeout: Duration,
    ) -> Self {
        let runs = Interval::ALL
            .into_iter()
            .map(|interval| (interval, Mutex::new(())))
            .collect();
        Self {
            source,
            aggregator,
            cache,
            freshness,
            run_timeout,
            runs,
        }
    }

    pub async fn agent_by_twitter(
        &self,
        handle: &str,
        interval: Interval,
    ) -> Result<AgentRecord, AgentError> {
        self.source.agent_by_twitter(handle, interval).await
    }

    pub async fn agent_by_contract(
        &self,
        address: &str,
        interval: Interval,
    ) -> Result<AgentRecord, AgentError> {
        self.source.agent_by_contract(address, interval).await
    }

    /// One page of the listing, shaped like an aggregation result.
    pub async fn page(&self, request: &PageRequest) -> Result<AggregationResult, AgentError> {
        request.validate()?;
        let page = self.source.fetch_page(request).await?;
        Ok(AggregationResult::single_page(
            request.page,
            request.page_size,
            page.records,
        ))
    }

    /// Cached aggregation if still servable, otherwise a fresh run (which is then cached,
    /// partial or not). Concurrent callers for the same interval share one run.
    #[instrument(skip(self), fields(operation = "fetch_all"))]
    pub async fn fetch_all(&self, interval: Interval) -> Result<CacheEntry, AgentError> {
        if let Some(entry) = self.servable(interval).await {
            debug!("serving cached aggregation");
            return Ok(entry);
        }

        let _run = self.run_lock(interval).lock().await;
        // Another caller may have finished a run while we waited.
        if let Some(entry) = self.servable(interval).await {
            debug!("serving aggregation produced while waiting");
            return Ok(entry);
        }
        self.aggregate_and_store(interval).await
    }

    /// Re-aggregate regardless of cache state (used by the refresh worker).
    #[instrument(skip(self), fields(operation = "refresh"))]
    pub async fn refresh(&self, interval: Interval) -> Result<CacheEntry, AgentError> {
        let _run = self.run_lock(interval).lock().await;
        self.aggregate_and_store(interval).await
    }

    async fn servable(&self, interval: Interval) -> Option<CacheEntry> {
        let entry = self.cache.get(interval.as_str()).await?;
        self.freshness
            .is_servable(&entry, Utc::now())
            .then_some(entry)
    }

    fn run_lock(&self, interval: Interval) -> &Mutex<()> {
        // Every Interval variant is inserted in `new`.
        &self.runs[&interval]
    }

    async fn aggregate_and_store(&self, interval: Interval) -> Result<CacheEntry, AgentError> {
        let result = tokio::time::timeout(self.run_timeout, self.aggregator.run(interval))
            .await
            .map_err(|_| {
                warn!(
                    timeout_secs = self.run_timeout.as_secs(),
                    "aggregation deadline exceeded; discarding run"
                );
                AgentError::Timeout(self.run_timeout)
            })?;

        let entry = CacheEntry::new(result);
        if let Err(e) = self.cache.set(interval.as_str(), &entry).await {
            warn!(error = %e, "failed to write aggregation cache");
        } else {
            info!(
                total_count = entry.result.total_count,
                success = entry.result.success,
                "aggregation cached"
            );
        }
        Ok(entry)
    }
}
