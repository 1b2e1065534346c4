// Page request for /agents/agentsPaged and the decoded page body.

use serde::{Deserialize, Serialize};

use super::{AgentRecord, Interval};
use crate::error::AgentError;

pub const DEFAULT_PAGE_SIZE: u32 = 25;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRequest {
    pub page: u32,
    pub page_size: u32,
    pub interval: Interval,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            interval: Interval::default(),
        }
    }
}

impl PageRequest {
    pub fn new(page: u32, page_size: u32, interval: Interval) -> Self {
        Self {
            page,
            page_size,
            interval,
        }
    }

    /// Build from raw query values. Missing or zero page/pageSize take the defaults,
    /// an unknown interval string is rejected.
    pub fn from_query(
        page: Option<u32>,
        page_size: Option<u32>,
        interval: Option<&str>,
    ) -> Result<Self, AgentError> {
        Ok(Self {
            page: page.filter(|p| *p > 0).unwrap_or(1),
            page_size: page_size.filter(|s| *s > 0).unwrap_or(DEFAULT_PAGE_SIZE),
            interval: Interval::parse_or_default(interval)?,
        })
    }

    pub fn validate(&self) -> Result<(), AgentError> {
        if self.page == 0 {
            return Err(AgentError::Validation("page must be >= 1".into()));
        }
        if self.page_size == 0 {
            return Err(AgentError::Validation("pageSize must be >= 1".into()));
        }
        Ok(())
    }
}

/// One decoded page of the agent listing, records in upstream order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AgentPage {
    pub records: Vec<AgentRecord>,
    /// `totalPages` from the Cookie.fun envelope, when present.
    pub total_pages: Option<u32>,
}

impl AgentPage {
    /// Extract records from a page body: `ok.data` (v2 envelope), top-level `data`,
    /// or a bare array.
    pub fn from_body(body: serde_json::Value) -> Result<Self, AgentError> {
        let (container, data) = match body {
            serde_json::Value::Array(items) => (None, items),
            serde_json::Value::Object(mut obj) => {
                let mut inner = match obj.remove("ok") {
                    Some(serde_json::Value::Object(ok)) => ok,
                    _ => obj,
                };
                match inner.remove("data") {
                    Some(serde_json::Value::Array(items)) => (Some(inner), items),
                    _ => {
                        return Err(AgentError::upstream(
                            None,
                            "malformed page body: no data array",
                        ));
                    }
                }
            }
            _ => {
                return Err(AgentError::upstream(
                    None,
                    "malformed page body: expected object or array",
                ));
            }
        };

        let total_pages = container
            .as_ref()
            .and_then(|c| c.get("totalPages"))
            .and_then(|v| v.as_u64())
            .and_then(|v| u32::try_from(v).ok());

        let mut records = Vec::with_capacity(data.len());
        for item in data {
            match item {
                serde_json::Value::Object(record) => records.push(record),
                other => {
                    return Err(AgentError::upstream(
                        None,
                        format!("malformed page body: record is not an object: {other}"),
                    ));
                }
            }
        }
        Ok(Self {
            records,
            total_pages,
        })
    }
}
