use axum::{
    Json,
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use thiserror::Error;

use super::RANKBOARD_STATUS_HEADER;
use crate::leaderboard::QueryError;
use crate::pipeline::PipelineError;
use crate::sync::SyncError;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("user not found: {username}")]
    NotFound { username: String },

    #[error("store failure: {0}")]
    StoreFailure(String),

    #[error("update queue full (capacity {capacity}), retry later")]
    QueueFull { capacity: usize },

    #[error("cache is disabled")]
    CacheDisabled,

    #[error("cache unavailable: {0}")]
    CacheUnavailable(String),

    #[error("service unavailable: {0}")]
    Unavailable(String),

    #[error("internal error: {0}")]
    InternalError(String),
}

#[derive(serde::Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
}

impl From<QueryError> for GatewayError {
    fn from(err: QueryError) -> Self {
        match err {
            QueryError::Validation(message) => GatewayError::InvalidRequest(message),
            QueryError::NotFound { username } => GatewayError::NotFound { username },
            QueryError::Store(e) => GatewayError::StoreFailure(e.to_string()),
        }
    }
}

impl From<PipelineError> for GatewayError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::QueueFull { capacity } => GatewayError::QueueFull { capacity },
            PipelineError::InvalidScore { .. } => GatewayError::InvalidRequest(err.to_string()),
            PipelineError::Closed => GatewayError::Unavailable(err.to_string()),
            PipelineError::Store(e) => GatewayError::StoreFailure(e.to_string()),
            PipelineError::InvalidConfig { .. } => GatewayError::InternalError(err.to_string()),
        }
    }
}

impl From<SyncError> for GatewayError {
    fn from(err: SyncError) -> Self {
        match err {
            SyncError::Store(e) => GatewayError::StoreFailure(e.to_string()),
            SyncError::Cache(e) => GatewayError::CacheUnavailable(e.to_string()),
            SyncError::CacheDisabled => GatewayError::CacheDisabled,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let (status, rankboard_status) = match &self {
            GatewayError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "invalid_request"),
            GatewayError::NotFound { .. } => (StatusCode::NOT_FOUND, "not_found"),
            GatewayError::StoreFailure(_) => (StatusCode::INTERNAL_SERVER_ERROR, "store_error"),
            GatewayError::QueueFull { .. } => (StatusCode::SERVICE_UNAVAILABLE, "queue_full"),
            GatewayError::CacheDisabled => (StatusCode::SERVICE_UNAVAILABLE, "cache_disabled"),
            GatewayError::CacheUnavailable(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, "cache_unavailable")
            }
            GatewayError::Unavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "unavailable"),
            GatewayError::InternalError(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error")
            }
        };

        let mut headers = HeaderMap::new();
        headers.insert(
            RANKBOARD_STATUS_HEADER,
            HeaderValue::from_static(rankboard_status),
        );

        let body = Json(ErrorResponse {
            error: self.to_string(),
            code: status.as_u16(),
        });

        (status, headers, body).into_response()
    }
}
