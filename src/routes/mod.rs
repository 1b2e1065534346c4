// HTTP routes

mod agents;
mod http;

use axum::{Router, routing::get};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::agent_service::AgentService;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) service: Arc<AgentService>,
}

pub fn app(service: Arc<AgentService>) -> Router {
    let state = AppState { service };
    Router::new()
        .route("/", get(|| async { "cookiefun: Cookie.fun agent analytics proxy" })) // GET /
        .route("/version", get(http::version_handler)) // GET /version
        .route("/agents/twitter/{username}", get(agents::by_twitter)) // GET /agents/twitter/:username
        .route("/agents/contract/{address}", get(agents::by_contract)) // GET /agents/contract/:address
        .route("/agents/paged", get(agents::paged)) // GET /agents/paged
        .route("/agents/all", get(agents::all)) // GET /agents/all
        .nest("/api/cookie-fun", browser_client_routes())
        .layer(CorsLayer::new().allow_origin(Any))
        .with_state(state)
}

/// Paths used by the existing browser client (mounted under /api/cookie-fun).
fn browser_client_routes() -> Router<AppState> {
    Router::new()
        .route("/twitter/{username}", get(agents::by_twitter))
        .route("/contract/{address}", get(agents::by_contract))
        .route("/agents/paged", get(agents::paged))
        .route("/agents/all", get(agents::all))
}
