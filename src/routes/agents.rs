// Agent endpoints. Errors become `{"error": ...}`: 400 for bad input on the listing
// routes, 500 with a generic message for upstream failures and for any failure of a
// single-agent lookup, 504 when the aggregation deadline passes.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;

use super::AppState;
use crate::error::AgentError;
use crate::models::{AgentRecord, AggregationResult, CacheEntry, Interval, PageRequest};

#[derive(Debug, Deserialize)]
pub(super) struct IntervalQuery {
    interval: Option<String>,
}

/// Raw strings so that unparsable numbers fall back to defaults instead of rejecting.
#[derive(Debug, Deserialize)]
pub(super) struct PagedQuery {
    page: Option<String>,
    #[serde(rename = "pageSize")]
    page_size: Option<String>,
    interval: Option<String>,
}

pub(super) struct ApiError {
    error: AgentError,
    context: &'static str,
    /// Single-agent lookups answer every failure, bad input included, with 500.
    lookup: bool,
}

impl ApiError {
    fn new(context: &'static str) -> impl FnOnce(AgentError) -> Self {
        move |error| Self {
            error,
            context,
            lookup: false,
        }
    }

    fn lookup(context: &'static str) -> impl FnOnce(AgentError) -> Self {
        move |error| Self {
            error,
            context,
            lookup: true,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.error {
            AgentError::Validation(_) if self.lookup => {
                (StatusCode::INTERNAL_SERVER_ERROR, self.context.to_string())
            }
            AgentError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AgentError::Upstream { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, self.context.to_string())
            }
            AgentError::Timeout(_) => (
                StatusCode::GATEWAY_TIMEOUT,
                format!("{} (timed out)", self.context),
            ),
        };
        if status.is_server_error() && !matches!(self.error, AgentError::Validation(_)) {
            tracing::warn!(error = %self.error, status = status.as_u16(), "{}", self.context);
        } else {
            tracing::debug!(error = %self.error, "rejected request");
        }
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

fn required_interval(raw: Option<&str>) -> Result<Interval, AgentError> {
    raw.ok_or_else(|| AgentError::Validation("interval is required: _3Days or _7Days".into()))?
        .parse()
}

/// GET /agents/twitter/{username}?interval=
pub(super) async fn by_twitter(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Query(q): Query<IntervalQuery>,
) -> Result<Json<AgentRecord>, ApiError> {
    let context = "Failed to fetch agent data by Twitter username";
    let interval = required_interval(q.interval.as_deref()).map_err(ApiError::lookup(context))?;
    state
        .service
        .agent_by_twitter(&username, interval)
        .await
        .map(Json)
        .map_err(ApiError::lookup(context))
}

/// GET /agents/contract/{address}?interval=
pub(super) async fn by_contract(
    State(state): State<AppState>,
    Path(address): Path<String>,
    Query(q): Query<IntervalQuery>,
) -> Result<Json<AgentRecord>, ApiError> {
    let context = "Failed to fetch agent data by contract address";
    let interval = required_interval(q.interval.as_deref()).map_err(ApiError::lookup(context))?;
    state
        .service
        .agent_by_contract(&address, interval)
        .await
        .map(Json)
        .map_err(ApiError::lookup(context))
}

/// GET /agents/paged?page=&pageSize=&interval=
pub(super) async fn paged(
    State(state): State<AppState>,
    Query(q): Query<PagedQuery>,
) -> Result<Json<AggregationResult>, ApiError> {
    let context = "Failed to fetch paged agents";
    let request = PageRequest::from_query(
        lenient_u32(q.page.as_deref()),
        lenient_u32(q.page_size.as_deref()),
        q.interval.as_deref(),
    )
    .map_err(ApiError::new(context))?;
    state
        .service
        .page(&request)
        .await
        .map(Json)
        .map_err(ApiError::new(context))
}

/// GET /agents/all?interval=: cached when fresh, otherwise aggregated now.
pub(super) async fn all(
    State(state): State<AppState>,
    Query(q): Query<IntervalQuery>,
) -> Result<Json<CacheEntry>, ApiError> {
    let context = "Failed to fetch all agents";
    let interval =
        Interval::parse_or_default(q.interval.as_deref()).map_err(ApiError::new(context))?;
    state
        .service
        .fetch_all(interval)
        .await
        .map(Json)
        .map_err(ApiError::new(context))
}

fn lenient_u32(raw: Option<&str>) -> Option<u32> {
    raw.and_then(|s| s.trim().parse().ok())
}
