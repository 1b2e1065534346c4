// Cookie.fun v2 API client. One HTTP call per operation; inputs are checked before any I/O.

mod source;

pub use source::AgentSource;

use crate::config::{UpstreamConfig, mask_secret};
use crate::error::AgentError;
use crate::models::{AgentPage, AgentRecord, Interval, PageRequest};
use async_trait::async_trait;
use reqwest::Url;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use std::time::Duration;
use tracing::instrument;

/// Longest upstream error body kept in an `AgentError::Upstream`.
const MAX_ERROR_BODY: usize = 512;

pub struct CookieClient {
    http: reqwest::Client,
    base_url: Url,
}

impl CookieClient {
    /// Build the client with the API key attached to every request
    /// (`Authorization: Bearer` and `x-api-key`).
    pub fn connect(config: &UpstreamConfig) -> anyhow::Result<Self> {
        let base_url = Url::parse(&config.base_url)?;
        anyhow::ensure!(
            !base_url.cannot_be_a_base(),
            "upstream.base_url cannot be used as a base: {}",
            config.base_url
        );

        let mut bearer = HeaderValue::from_str(&format!("Bearer {}", config.api_key))?;
        bearer.set_sensitive(true);
        let mut api_key = HeaderValue::from_str(&config.api_key)?;
        api_key.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(HeaderName::from_static("x-api-key"), api_key);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .default_headers(headers)
            .build()?;

        tracing::info!(
            base_url = %base_url,
            api_key = %mask_secret(&config.api_key),
            "Cookie.fun client ready"
        );
        Ok(Self { http, base_url })
    }

    /// `base_url` + path segments, each segment percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, AgentError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| AgentError::upstream(None, "base url cannot carry a path"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json(
        &self,
        url: Url,
        query: &[(&str, String)],
    ) -> Result<serde_json::Value, AgentError> {
        let response = self.http.get(url).query(query).send().await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "Cookie.fun request failed");
            return Err(AgentError::upstream(
                Some(status.as_u16()),
                truncate(&body, MAX_ERROR_BODY),
            ));
        }
        serde_json::from_str(&body).map_err(|e| {
            AgentError::upstream(Some(status.as_u16()), format!("invalid JSON body: {e}"))
        })
    }

    async fn get_agent(
        &self,
        segments: &[&str],
        interval: Interval,
    ) -> Result<AgentRecord, AgentError> {
        let url = self.endpoint(segments)?;
        match self
            .get_json(url, &[("interval", interval.as_str().to_string())])
            .await?
        {
            serde_json::Value::Object(record) => Ok(record),
            _ => Err(AgentError::upstream(
                None,
                "malformed agent body: expected an object",
            )),
        }
    }
}

#[async_trait]
impl AgentSource for CookieClient {
    #[instrument(skip(self), fields(source = "cookie_fun", operation = "agent_by_twitter"))]
    async fn agent_by_twitter(
        &self,
        handle: &str,
        interval: Interval,
    ) -> Result<AgentRecord, AgentError> {
        let handle = require_non_empty("twitter username", handle)?;
        self.get_agent(&["agents", "twitterUsername", handle], interval)
            .await
    }

    #[instrument(skip(self), fields(source = "cookie_fun", operation = "agent_by_contract"))]
    async fn agent_by_contract(
        &self,
        address: &str,
        interval: Interval,
    ) -> Result<AgentRecord, AgentError> {
        let address = require_non_empty("contract address", address)?;
        self.get_agent(&["agents", "contractAddress", address], interval)
            .await
    }

    #[instrument(skip(self), fields(source = "cookie_fun", operation = "fetch_page"))]
    async fn fetch_page(&self, request: &PageRequest) -> Result<AgentPage, AgentError> {
        request.validate()?;
        let url = self.endpoint(&["agents", "agentsPaged"])?;
        let body = self
            .get_json(
                url,
                &[
                    ("page", request.page.to_string()),
                    ("pageSize", request.page_size.to_string()),
                    ("interval", request.interval.as_str().to_string()),
                ],
            )
            .await?;
        AgentPage::from_body(body)
    }
}

fn require_non_empty<'a>(what: &str, value: &'a str) -> Result<&'a str, AgentError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AgentError::Validation(format!("{what} must be non-empty")));
    }
    Ok(trimmed)
}

fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…", &s[..end])
}
