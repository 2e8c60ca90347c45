//! HTTP gateway (Axum) over the leaderboard services.
//!
//! This module is primarily used by the `rankboard` server binary.

#![allow(missing_docs)]

pub mod error;
pub mod handler;
pub mod state;

#[cfg(test)]
mod handler_tests;

use std::time::Duration;

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode, header::HeaderValue},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use error::GatewayError;
pub use handler::{
    leaderboard_handler, search_handler, simulate_updates_handler, sync_handler,
    update_score_handler, user_rank_handler,
};
pub use state::HandlerState;

use crate::cache::RankCache;
use crate::store::ScoreStore;

/// Header carrying a short machine-readable status on health and error responses.
pub const RANKBOARD_STATUS_HEADER: &str = "X-Rankboard-Status";

pub const COMPONENT_CONNECTED: &str = "connected";
pub const COMPONENT_DISCONNECTED: &str = "disconnected";
pub const COMPONENT_DISABLED: &str = "disabled";

/// Timeout for a single `--health-check` request.
pub const HEALTH_CHECK_TIMEOUT: Duration = Duration::from_secs(1);

/// Returns true when `GET /health` on the local `port` answers with a 2xx status.
pub async fn check_health(port: u16) -> bool {
    let url = format!("http://127.0.0.1:{}/health", port);
    let client = match reqwest::Client::builder()
        .timeout(HEALTH_CHECK_TIMEOUT)
        .no_proxy()
        .build()
    {
        Ok(client) => client,
        Err(_) => return false,
    };

    match client.get(&url).send().await {
        Ok(res) => res.status().is_success(),
        Err(_) => false,
    }
}

pub fn create_router_with_state<S, C>(state: HandlerState<S, C>) -> Router
where
    S: ScoreStore + Clone + 'static,
    C: RankCache + Clone + 'static,
{
    Router::new()
        .route("/health", get(health_handler))
        .route("/ready", get(ready_handler))
        .route("/api/v1/leaderboard", get(leaderboard_handler))
        .route("/api/v1/users/search", get(search_handler))
        .route("/api/v1/users/{username}/rank", get(user_rank_handler))
        .route("/api/v1/users/{username}/score", post(update_score_handler))
        .route("/api/v1/admin/sync", post(sync_handler))
        .route("/api/v1/admin/sync-redis", post(sync_handler))
        .route("/api/v1/admin/simulate-updates", post(simulate_updates_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[derive(serde::Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub database: &'static str,
    pub cache: &'static str,
}

#[derive(serde::Serialize)]
pub struct ReadyResponse {
    pub status: &'static str,
    pub cache_enabled: bool,
    pub cache_warm: bool,
}

#[tracing::instrument(skip(state))]
pub async fn health_handler<S, C>(State(state): State<HandlerState<S, C>>) -> Response
where
    S: ScoreStore + Clone + 'static,
    C: RankCache + Clone + 'static,
{
    let database = async {
        match state.store.ping().await {
            Ok(()) => COMPONENT_CONNECTED,
            Err(e) => {
                tracing::warn!(error = %e, "Database ping failed");
                COMPONENT_DISCONNECTED
            }
        }
    };
    let cache = async {
        match state.cache.as_ref() {
            None => COMPONENT_DISABLED,
            Some(cache) => match cache.ping().await {
                Ok(()) => COMPONENT_CONNECTED,
                Err(e) => {
                    tracing::warn!(error = %e, "Cache ping failed");
                    COMPONENT_DISCONNECTED
                }
            },
        }
    };
    let (database, cache) = tokio::join!(database, cache);

    // The cache is optional; only the store decides overall health.
    let healthy = database == COMPONENT_CONNECTED;
    let (status_code, status) = if healthy {
        (StatusCode::OK, "healthy")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "unhealthy")
    };

    let mut headers = HeaderMap::new();
    headers.insert(RANKBOARD_STATUS_HEADER, HeaderValue::from_static(status));

    (
        status_code,
        headers,
        Json(HealthResponse {
            status,
            database,
            cache,
        }),
    )
        .into_response()
}

#[tracing::instrument(skip(state))]
pub async fn ready_handler<S, C>(State(state): State<HandlerState<S, C>>) -> Response
where
    S: ScoreStore + Clone + 'static,
    C: RankCache + Clone + 'static,
{
    let cache_enabled = state.cache.is_some();
    let cache_warm = state.warm.is_warm();
    let is_ready = !cache_enabled || cache_warm;

    let (status_code, status) = if is_ready {
        (StatusCode::OK, "ready")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "warming")
    };

    let mut headers = HeaderMap::new();
    headers.insert(RANKBOARD_STATUS_HEADER, HeaderValue::from_static(status));

    (
        status_code,
        headers,
        Json(ReadyResponse {
            status,
            cache_enabled,
            cache_warm,
        }),
    )
        .into_response()
}
