// Error types for the agent data path (client, aggregator, service) and the cache store.

use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AgentError {
    /// Caller input rejected before any network call.
    #[error("validation error: {0}")]
    Validation(String),

    /// Non-success status, transport failure, or undecodable body from Cookie.fun.
    /// `status` is `None` when no HTTP response was received.
    #[error("upstream error ({}): {message}", fmt_status(.status))]
    Upstream {
        status: Option<u16>,
        message: String,
    },

    #[error("aggregation timed out after {}s", .0.as_secs())]
    Timeout(Duration),
}

fn fmt_status(status: &Option<u16>) -> String {
    match status {
        Some(s) => format!("status {s}"),
        None => "no response".to_string(),
    }
}

impl AgentError {
    pub fn upstream(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Upstream {
            status,
            message: message.into(),
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

impl From<reqwest::Error> for AgentError {
    fn from(e: reqwest::Error) -> Self {
        Self::Upstream {
            status: e.status().map(|s| s.as_u16()),
            message: e.to_string(),
        }
    }
}

/// Cache store failures. Never surfaced past the store: reads degrade to a miss.
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("cache io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("cache json error: {0}")]
    Json(#[from] serde_json::Error),
}
