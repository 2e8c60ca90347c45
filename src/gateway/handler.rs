use std::str::FromStr;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::cache::{RANKBOARD_SOURCE_HEADER, RankCache};
use crate::constants::{
    DEFAULT_PAGE_SIZE, DEFAULT_SIMULATED_UPDATES, MAX_SIMULATED_UPDATES, is_valid_score,
};
use crate::gateway::error::GatewayError;
use crate::gateway::state::HandlerState;
use crate::store::ScoreStore;

#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<String>,
    pub limit: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
    pub limit: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SimulateParams {
    pub count: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ScoreUpdateRequest {
    pub score: i32,
}

#[derive(Debug, Serialize)]
pub struct ScoreUpdateAccepted {
    pub message: &'static str,
    pub username: String,
    pub score: i32,
}

#[derive(Debug, Serialize)]
pub struct SyncResponse {
    pub message: &'static str,
    pub count: u64,
}

#[derive(Debug, Serialize)]
pub struct SimulateAccepted {
    pub message: &'static str,
    pub requested: usize,
    pub queued: usize,
}

/// Parses an optional query parameter; absent or blank means `default`.
pub(crate) fn parse_param<T: FromStr>(
    name: &str,
    value: Option<&str>,
    default: T,
) -> Result<T, GatewayError> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(default),
        Some(raw) => raw
            .parse()
            .map_err(|_| GatewayError::InvalidRequest(format!("invalid {} parameter: {}", name, raw))),
    }
}

#[instrument(skip(state))]
pub async fn leaderboard_handler<S, C>(
    State(state): State<HandlerState<S, C>>,
    Query(params): Query<PageParams>,
) -> Result<Response, GatewayError>
where
    S: ScoreStore + Clone + 'static,
    C: RankCache + Clone + 'static,
{
    let page = parse_param("page", params.page.as_deref(), 1u32)?;
    let limit = parse_param("limit", params.limit.as_deref(), DEFAULT_PAGE_SIZE)?;

    let result = state.leaderboard.get_page(page, limit).await?;

    let mut headers = HeaderMap::new();
    headers.insert(
        RANKBOARD_SOURCE_HEADER,
        HeaderValue::from_static(result.source.as_header_value()),
    );

    Ok((StatusCode::OK, headers, Json(result)).into_response())
}

#[instrument(skip(state))]
pub async fn search_handler<S, C>(
    State(state): State<HandlerState<S, C>>,
    Query(params): Query<SearchParams>,
) -> Result<Response, GatewayError>
where
    S: ScoreStore + Clone + 'static,
    C: RankCache + Clone + 'static,
{
    let query = params
        .q
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .ok_or_else(|| GatewayError::InvalidRequest("query parameter 'q' is required".to_string()))?;
    let limit = parse_param("limit", params.limit.as_deref(), DEFAULT_PAGE_SIZE)?;

    let results = state.users.search(query, limit).await?;
    Ok(Json(results).into_response())
}

#[instrument(skip(state))]
pub async fn user_rank_handler<S, C>(
    State(state): State<HandlerState<S, C>>,
    Path(username): Path<String>,
) -> Result<Response, GatewayError>
where
    S: ScoreStore + Clone + 'static,
    C: RankCache + Clone + 'static,
{
    let rank = state.users.get_user_rank(&username).await?;
    Ok(Json(rank).into_response())
}

#[instrument(skip(state, body))]
pub async fn update_score_handler<S, C>(
    State(state): State<HandlerState<S, C>>,
    Path(username): Path<String>,
    Json(body): Json<serde_json::Value>,
) -> Result<Response, GatewayError>
where
    S: ScoreStore + Clone + 'static,
    C: RankCache + Clone + 'static,
{
    let request: ScoreUpdateRequest = serde_json::from_value(body)
        .map_err(|e| GatewayError::InvalidRequest(format!("invalid request body: {}", e)))?;

    if !is_valid_score(request.score) {
        return Err(GatewayError::InvalidRequest(format!(
            "score must be between 100 and 5000, got {}",
            request.score
        )));
    }

    let exists = state
        .store
        .find_by_username(&username)
        .await
        .map_err(|e| GatewayError::StoreFailure(e.to_string()))?
        .is_some();
    if !exists {
        return Err(GatewayError::NotFound { username });
    }

    state.pipeline.queue_update(&username, request.score)?;
    debug!(username = %username, score = request.score, "Score update queued");

    Ok((
        StatusCode::ACCEPTED,
        Json(ScoreUpdateAccepted {
            message: "Update queued",
            username,
            score: request.score,
        }),
    )
        .into_response())
}

#[instrument(skip(state))]
pub async fn sync_handler<S, C>(
    State(state): State<HandlerState<S, C>>,
) -> Result<Response, GatewayError>
where
    S: ScoreStore + Clone + 'static,
    C: RankCache + Clone + 'static,
{
    let report = state.synchronizer.sync_all().await?;
    info!(cached = report.cached, "Manual cache sync complete");

    Ok(Json(SyncResponse {
        message: "Cache synchronized",
        count: report.cached,
    })
    .into_response())
}

#[instrument(skip(state))]
pub async fn simulate_updates_handler<S, C>(
    State(state): State<HandlerState<S, C>>,
    Query(params): Query<SimulateParams>,
) -> Result<Response, GatewayError>
where
    S: ScoreStore + Clone + 'static,
    C: RankCache + Clone + 'static,
{
    let count = parse_param("count", params.count.as_deref(), DEFAULT_SIMULATED_UPDATES)?;
    if !(1..=MAX_SIMULATED_UPDATES).contains(&count) {
        return Err(GatewayError::InvalidRequest(
            "count must be between 1 and 100".to_string(),
        ));
    }

    let queued = state.pipeline.simulate_random_updates(count).await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(SimulateAccepted {
            message: "Updates queued",
            requested: count,
            queued,
        }),
    )
        .into_response())
}
