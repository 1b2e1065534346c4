// Domain models: agent records, paging, aggregation results, cache entries

mod aggregation;
mod cache_entry;
mod interval;
mod page;

pub use aggregation::AggregationResult;
pub use cache_entry::CacheEntry;
pub use interval::Interval;
pub use page::{AgentPage, DEFAULT_PAGE_SIZE, PageRequest};

/// One Cookie.fun agent profile, passed through verbatim.
pub type AgentRecord = serde_json::Map<String, serde_json::Value>;
