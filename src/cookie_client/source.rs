use async_trait::async_trait;

use crate::error::AgentError;
use crate::models::{AgentPage, AgentRecord, Interval, PageRequest};

/// Read access to Cookie.fun agent data. `CookieClient` is the production implementation.
#[async_trait]
pub trait AgentSource: Send + Sync {
    async fn agent_by_twitter(
        &self,
        handle: &str,
        interval: Interval,
    ) -> Result<AgentRecord, AgentError>;

    async fn agent_by_contract(
        &self,
        address: &str,
        interval: Interval,
    ) -> Result<AgentRecord, AgentError>;

    async fn fetch_page(&self, request: &PageRequest) -> Result<AgentPage, AgentError>;
}
