use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::did::document::Jwk;

/// Generic API response wrapper. Left undocumented in the OpenAPI schema
/// (utoipa's generic-schema support needs one alias per concrete `T`); the
/// `utoipa::path` response bodies below document the unwrapped payload
/// type instead.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            timestamp: Utc::now(),
        }
    }

    pub fn error(error: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error),
            timestamp: Utc::now(),
        }
    }
}

/// Health check response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub blockchain_height: usize,
    pub connected_peers: usize,
    pub mempool_size: usize,
}

/// `POST /did/challenge` response — the bare nonce the caller must sign.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ChallengeResponse {
    pub did: String,
    pub challenge: String,
}

/// `POST /did/verify` response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct VerifyChallengeResponse {
    pub verified: bool,
}

/// `POST /kem/publickey/get` response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct KemPublicKeyResponse {
    pub did: String,
    pub public_key_jwk: Jwk,
}
