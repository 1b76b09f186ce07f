use axum::{extract::State, response::Json};
use std::sync::Arc;

use crate::node::NodeContext;
use crate::web::models::{ApiResponse, HealthResponse, WebError};

/// Health check endpoint: current height, peer count, and mempool size.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Health check successful", body = HealthResponse),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn health_check(
    State(node): State<Arc<NodeContext>>,
) -> Result<Json<ApiResponse<HealthResponse>>, WebError> {
    let height = node.get_best_height()?;
    let connected_peers = node.get_peer_count()?;
    let mempool_size = node.get_mempool_size()?;

    let response = HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        blockchain_height: height,
        connected_peers,
        mempool_size,
    };

    Ok(Json(ApiResponse::success(response)))
}

/// Liveness probe: the process is up, nothing more.
#[utoipa::path(
    get,
    path = "/health/live",
    tag = "Health",
    responses((status = 200, description = "Service is alive", body = String))
)]
pub async fn liveness() -> Json<ApiResponse<String>> {
    Json(ApiResponse::success("alive".to_string()))
}

/// Readiness probe: the block store answers a height query.
#[utoipa::path(
    get,
    path = "/health/ready",
    tag = "Health",
    responses(
        (status = 200, description = "Service is ready", body = String),
        (status = 500, description = "Block store unreachable")
    )
)]
pub async fn readiness(
    State(node): State<Arc<NodeContext>>,
) -> Result<Json<ApiResponse<String>>, WebError> {
    node.get_best_height()?;
    Ok(Json(ApiResponse::success("ready".to_string())))
}
