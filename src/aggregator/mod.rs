// Pages through the Cookie.fun agent listing and concatenates the results.
// Pages are fetched strictly in order 1..N, one at a time, with the rate limiter
// consulted between requests. A failed page ends the run; earlier pages are kept.

pub mod rate_limit;

pub use rate_limit::{FixedDelay, RateLimiter, TokenBucket, Unthrottled};

use crate::cookie_client::AgentSource;
use crate::models::{AggregationResult, Interval, PageRequest};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

#[derive(Debug, Clone, Copy)]
pub struct AggregatorConfig {
    /// Safety ceiling on pages per run.
    pub max_pages: u32,
    pub page_size: u32,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            max_pages: 300,
            page_size: crate::models::DEFAULT_PAGE_SIZE,
        }
    }
}

impl From<&crate::config::AggregationConfig> for AggregatorConfig {
    fn from(c: &crate::config::AggregationConfig) -> Self {
        Self {
            max_pages: c.max_pages,
            page_size: c.page_size,
        }
    }
}

#[derive(Clone)]
pub struct Aggregator {
    source: Arc<dyn AgentSource>,
    limiter: Arc<dyn RateLimiter>,
    config: AggregatorConfig,
}

impl Aggregator {
    pub fn new(
        source: Arc<dyn AgentSource>,
        limiter: Arc<dyn RateLimiter>,
        config: AggregatorConfig,
    ) -> Self {
        Self {
            source,
            limiter,
            config,
        }
    }

    /// Fetch every page for `interval`. Never fails: upstream errors end the run
    /// early and are reported through `success`, `partial_data` and `error`.
    #[instrument(skip(self), fields(operation = "aggregate", max_pages = self.config.max_pages))]
    pub async fn run(&self, interval: Interval) -> AggregationResult {
        let AggregatorConfig {
            max_pages,
            page_size,
        } = self.config;

        let mut page: u32 = 1;
        let mut data = Vec::new();
        let mut has_more = true;
        let mut error: Option<String> = None;

        while has_more && page <= max_pages {
            let request = PageRequest::new(page, page_size, interval);
            match self.source.fetch_page(&request).await {
                Ok(result) if result.records.is_empty() => {
                    debug!(page, "empty page; upstream exhausted");
                    has_more = false;
                }
                Ok(result) => {
                    debug!(
                        page,
                        records = result.records.len(),
                        total_pages = ?result.total_pages,
                        "page fetched"
                    );
                    data.extend(result.records);
                    page += 1;
                    if page <= max_pages {
                        self.limiter.wait().await;
                    }
                }
                Err(e) => {
                    warn!(page, error = %e, "page fetch failed; keeping earlier pages");
                    error = Some(e.to_string());
                    break;
                }
            }
        }

        let page_ceiling_reached = has_more && error.is_none() && page > max_pages;
        if page_ceiling_reached {
            warn!(
                max_pages,
                records = data.len(),
                "page ceiling reached before upstream was exhausted"
            );
        }

        let last_page = page - 1;
        let result = AggregationResult {
            success: error.is_none(),
            partial_data: error.is_some() || page_ceiling_reached,
            last_successful_page: last_page,
            total_count: data.len(),
            data,
            page_size,
            current_page: last_page,
            page_ceiling_reached,
            error,
        };
        info!(
            %interval,
            success = result.success,
            partial = result.partial_data,
            pages = last_page,
            total_count = result.total_count,
            "aggregation finished"
        );
        result
    }
}
