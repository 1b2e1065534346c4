// Combined result of paging through the agent listing.

use serde::{Deserialize, Serialize};

use super::AgentRecord;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregationResult {
    /// False when a page fetch failed mid-run.
    pub success: bool,
    /// True when the run stopped before the upstream ran out of pages.
    pub partial_data: bool,
    pub last_successful_page: u32,
    pub data: Vec<AgentRecord>,
    pub total_count: usize,
    pub page_size: u32,
    pub current_page: u32,
    #[serde(default)]
    pub page_ceiling_reached: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AggregationResult {
    /// Single-page view: what `/agents/paged` returns.
    pub fn single_page(page: u32, page_size: u32, data: Vec<AgentRecord>) -> Self {
        Self {
            success: true,
            partial_data: false,
            last_successful_page: page,
            total_count: data.len(),
            data,
            page_size,
            current_page: page,
            page_ceiling_reached: false,
            error: None,
        }
    }

    /// Complete means the upstream was exhausted without error.
    pub fn is_complete(&self) -> bool {
        self.success && !self.partial_data
    }
}
