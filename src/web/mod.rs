use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use thiserror::Error;
use tower_http::cors::{Any, CorsLayer};

use crate::crawler::{
    cse,
    dse::{self, DseTable},
    table::ResultSet,
};

/// Builds the API router. All origins, methods and headers are allowed; the
/// endpoints serve public market data and take no input.
pub fn router() -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/dse-table", get(dse_table))
        .route("/api/cse-bonds", get(cse_bonds))
        .route("/api/cse-current-price", get(cse_current_price))
        .route("/api/cse-merged", get(cse_merged))
        .layer(cors)
}

#[derive(Debug, Error)]
pub enum ApiError {
    /// The upstream page was fetched but the expected table is absent.
    #[error("{0}")]
    NotFound(String),
    /// Fetch or parse failure.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::NotFound(message) => (StatusCode::NOT_FOUND, message).into_response(),
            ApiError::Internal(why) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": why.to_string() })),
            )
                .into_response(),
        }
    }
}

async fn dse_table() -> Result<Json<DseTable>, ApiError> {
    match dse::visit().await? {
        Some(table) => Ok(Json(table)),
        None => Err(ApiError::NotFound("No DSE data found".to_string())),
    }
}

async fn cse_bonds() -> Result<Json<ResultSet>, ApiError> {
    match cse::bonds().await? {
        Some(table) => Ok(Json(table)),
        None => Err(ApiError::NotFound("CSE Table not found".to_string())),
    }
}

async fn cse_current_price() -> Result<Json<ResultSet>, ApiError> {
    match cse::current_price().await? {
        Some(table) => Ok(Json(table)),
        None => Err(ApiError::NotFound(
            "CSE Current Market Price table not found".to_string(),
        )),
    }
}

async fn cse_merged() -> Result<Json<ResultSet>, ApiError> {
    match cse::merged().await? {
        Some(table) => Ok(Json(table)),
        None => Err(ApiError::NotFound("No CSE data found.".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use anyhow::anyhow;
    use axum::response::IntoResponse;

    use super::*;

    #[test]
    fn test_not_found_response_status() {
        let response = ApiError::NotFound("CSE Table not found".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_internal_response_status() {
        let response = ApiError::Internal(anyhow!("connection refused")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_router_builds() {
        let _ = router();
    }
}
