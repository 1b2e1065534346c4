// Shared test helpers: a scripted in-memory agent source and a fake Cookie.fun server.
#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::get,
};
use cookiefun::agent_service::AgentService;
use cookiefun::aggregator::{Aggregator, AggregatorConfig, Unthrottled};
use cookiefun::cache_store::{CacheStore, FreshnessPolicy, MemoryCacheStore};
use cookiefun::cookie_client::AgentSource;
use cookiefun::error::AgentError;
use cookiefun::models::{AgentPage, AgentRecord, Interval, PageRequest};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

pub const TEST_API_KEY: &str = "test-key-0123456789";

pub fn record(id: &str) -> AgentRecord {
    let mut r = AgentRecord::new();
    r.insert("id".into(), serde_json::Value::String(id.into()));
    r
}

pub fn records(ids: &[&str]) -> Vec<AgentRecord> {
    ids.iter().map(|id| record(id)).collect()
}

pub fn ids(data: &[AgentRecord]) -> Vec<String> {
    data.iter()
        .map(|r| r["id"].as_str().unwrap_or_default().to_string())
        .collect()
}

enum Scripted {
    Page(Vec<AgentRecord>),
    Fail(u16),
}

/// Agent source answering page requests from a script. Pages past the script are empty,
/// unless `endless` is set, in which case every unscripted page has one record.
#[derive(Default)]
pub struct ScriptedSource {
    pages: HashMap<u32, Scripted>,
    endless: bool,
    delay: Option<Duration>,
    page_calls: AtomicUsize,
    agent_calls: AtomicUsize,
    requests: Mutex<Vec<PageRequest>>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pages 1..=N from `pages`, in order.
    pub fn with_pages(pages: Vec<Vec<AgentRecord>>) -> Self {
        let mut s = Self::new();
        for (i, p) in pages.into_iter().enumerate() {
            s.pages.insert(i as u32 + 1, Scripted::Page(p));
        }
        s
    }

    pub fn failing_at(mut self, page: u32, status: u16) -> Self {
        self.pages.insert(page, Scripted::Fail(status));
        self
    }

    pub fn endless(mut self) -> Self {
        self.endless = true;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn page_calls(&self) -> usize {
        self.page_calls.load(Ordering::SeqCst)
    }

    pub fn agent_calls(&self) -> usize {
        self.agent_calls.load(Ordering::SeqCst)
    }

    pub fn total_calls(&self) -> usize {
        self.page_calls() + self.agent_calls()
    }

    pub fn requests(&self) -> Vec<PageRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn agent(&self, key: &str, value: &str, interval: Interval) -> AgentRecord {
        self.agent_calls.fetch_add(1, Ordering::SeqCst);
        let mut r = AgentRecord::new();
        r.insert(key.into(), value.into());
        r.insert("interval".into(), interval.as_str().into());
        r
    }
}

#[async_trait]
impl AgentSource for ScriptedSource {
    async fn agent_by_twitter(
        &self,
        handle: &str,
        interval: Interval,
    ) -> Result<AgentRecord, AgentError> {
        if handle == "missing" {
            self.agent_calls.fetch_add(1, Ordering::SeqCst);
            return Err(AgentError::upstream(Some(404), "not found"));
        }
        Ok(self.agent("twitterUsername", handle, interval))
    }

    async fn agent_by_contract(
        &self,
        address: &str,
        interval: Interval,
    ) -> Result<AgentRecord, AgentError> {
        Ok(self.agent("contractAddress", address, interval))
    }

    async fn fetch_page(&self, request: &PageRequest) -> Result<AgentPage, AgentError> {
        self.page_calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(*request);
        if let Some(d) = self.delay {
            tokio::time::sleep(d).await;
        }
        match self.pages.get(&request.page) {
            Some(Scripted::Page(records)) => Ok(AgentPage {
                records: records.clone(),
                total_pages: None,
            }),
            Some(Scripted::Fail(status)) => {
                Err(AgentError::upstream(Some(*status), "scripted failure"))
            }
            None if self.endless => Ok(AgentPage {
                records: vec![record(&format!("p{}", request.page))],
                total_pages: None,
            }),
            None => Ok(AgentPage::default()),
        }
    }
}

pub fn aggregator(source: Arc<ScriptedSource>, max_pages: u32) -> Aggregator {
    Aggregator::new(
        source,
        Arc::new(Unthrottled),
        AggregatorConfig {
            max_pages,
            page_size: 25,
        },
    )
}

pub fn service_with(
    source: Arc<ScriptedSource>,
    cache: Arc<dyn CacheStore>,
    run_timeout: Duration,
) -> AgentService {
    AgentService::new(
        source.clone(),
        aggregator(source, 300),
        cache,
        FreshnessPolicy::default(),
        run_timeout,
    )
}

pub fn service(source: Arc<ScriptedSource>) -> (AgentService, Arc<MemoryCacheStore>) {
    let cache = Arc::new(MemoryCacheStore::new());
    let svc = service_with(source, cache.clone(), Duration::from_secs(30));
    (svc, cache)
}

// --- Fake Cookie.fun upstream -------------------------------------------------

#[derive(Clone, Default)]
pub struct FakeUpstream {
    pub hits: Arc<AtomicUsize>,
    pub last_query: Arc<Mutex<HashMap<String, String>>>,
}

fn authorized(headers: &HeaderMap) -> bool {
    let bearer = format!("Bearer {TEST_API_KEY}");
    headers.get("x-api-key").and_then(|v| v.to_str().ok()) == Some(TEST_API_KEY)
        && headers.get("authorization").and_then(|v| v.to_str().ok()) == Some(bearer.as_str())
}

async fn fake_twitter(
    State(up): State<FakeUpstream>,
    headers: HeaderMap,
    Path(username): Path<String>,
    Query(q): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    up.hits.fetch_add(1, Ordering::SeqCst);
    *up.last_query.lock().unwrap() = q;
    if !authorized(&headers) {
        return (StatusCode::UNAUTHORIZED, Json(serde_json::json!({"error": "bad key"})));
    }
    (
        StatusCode::OK,
        Json(serde_json::json!({"ok": {"agentName": username, "twitterUsernames": [username]}})),
    )
}

async fn fake_contract(
    State(up): State<FakeUpstream>,
    Path(address): Path<String>,
    Query(q): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    up.hits.fetch_add(1, Ordering::SeqCst);
    *up.last_query.lock().unwrap() = q;
    if address == "missing" {
        return (StatusCode::NOT_FOUND, "agent not found".to_string()).into_response();
    }
    Json(serde_json::json!({"ok": {"contracts": [{"contractAddress": address}]}})).into_response()
}

/// Pages 1 and 2 hold two records each; later pages are empty.
async fn fake_paged(
    State(up): State<FakeUpstream>,
    Query(q): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    up.hits.fetch_add(1, Ordering::SeqCst);
    let page: u32 = q.get("page").and_then(|p| p.parse().ok()).unwrap_or(0);
    *up.last_query.lock().unwrap() = q;
    let data: Vec<serde_json::Value> = if page == 1 || page == 2 {
        (0..2)
            .map(|i| serde_json::json!({"id": format!("p{page}-{i}")}))
            .collect()
    } else {
        vec![]
    };
    Json(serde_json::json!({
        "ok": {"data": data, "currentPage": page, "totalPages": 2, "totalCount": 4},
        "success": true,
        "error": null
    }))
}

/// Serve the fake on an ephemeral port; returns its `/v2` base URL.
pub async fn spawn_fake_upstream() -> (String, FakeUpstream) {
    let state = FakeUpstream::default();
    let app = Router::new()
        .route("/v2/agents/twitterUsername/{username}", get(fake_twitter))
        .route("/v2/agents/contractAddress/{address}", get(fake_contract))
        .route("/v2/agents/agentsPaged", get(fake_paged))
        .with_state(state.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    (format!("http://{addr}/v2"), state)
}
