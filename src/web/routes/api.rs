use axum::{Router, routing::{get, post}};
use std::sync::Arc;

use crate::node::NodeContext;
use crate::web::handlers::{did, health};

/// DID lifecycle routes — §6's HTTP surface.
pub fn create_did_routes() -> Router<Arc<NodeContext>> {
    Router::new()
        .route("/did/create", post(did::create_did))
        .route("/did/find", post(did::find_did))
        .route("/did/challenge", post(did::issue_challenge))
        .route("/did/verify", post(did::verify_challenge))
        .route("/did/update/kem", post(did::update_kem))
        .route("/kem/publickey/get", post(did::get_kem_public_key))
}

pub fn create_monitor_routes() -> Router<Arc<NodeContext>> {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
}

/// Create API v1 router with version prefix
pub fn create_api_v1_routes() -> Router<Arc<NodeContext>> {
    Router::new().nest("/api/v1", create_did_routes())
}

/// Create all API routes served by the DID service.
pub fn create_all_api_routes() -> Router<Arc<NodeContext>> {
    Router::new()
        .merge(create_did_routes())
        .merge(create_api_v1_routes())
        .merge(create_monitor_routes())
}
