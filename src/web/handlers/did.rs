//! DID lifecycle endpoints: create, resolve, challenge/verify, and the KEM
//! key attachment/lookup pair.

use axum::{extract::State, response::Json};
use data_encoding::BASE64;
use std::sync::Arc;
use validator::Validate;

use crate::did::document::DidDocument;
use crate::node::NodeContext;
use crate::web::models::{
    ApiResponse, ChallengeRequest, ChallengeResponse, CreateDidRequest, FindDidRequest, KemPublicKeyRequest,
    KemPublicKeyResponse, UpdateKemRequest, VerifyChallengeRequest, VerifyChallengeResponse, WebError,
};

fn validate(result: Result<(), validator::ValidationErrors>) -> Result<(), WebError> {
    result.map_err(|e| WebError::ValidationError(e.to_string()))
}

/// Builds an ECDSA-only DID document for `address`'s wallet, publishes it
/// as a self-attested transaction, and returns the document.
#[utoipa::path(
    post,
    path = "/did/create",
    tag = "DID",
    request_body = CreateDidRequest,
    responses(
        (status = 200, description = "Document created", body = DidDocument),
        (status = 400, description = "Invalid or unknown address")
    )
)]
pub async fn create_did(
    State(node): State<Arc<NodeContext>>,
    Json(request): Json<CreateDidRequest>,
) -> Result<Json<ApiResponse<DidDocument>>, WebError> {
    validate(request.validate())?;
    let did = node.create_did(&request.address, None)?;
    let document = node.find_did(&did)?;
    Ok(Json(ApiResponse::success(document)))
}

/// Resolves the most recently published document for `did`.
#[utoipa::path(
    post,
    path = "/did/find",
    tag = "DID",
    request_body = FindDidRequest,
    responses(
        (status = 200, description = "Document found", body = DidDocument),
        (status = 404, description = "No document for this DID")
    )
)]
pub async fn find_did(
    State(node): State<Arc<NodeContext>>,
    Json(request): Json<FindDidRequest>,
) -> Result<Json<ApiResponse<DidDocument>>, WebError> {
    validate(request.validate())?;
    let document = node.find_did(&request.did)?;
    Ok(Json(ApiResponse::success(document)))
}

/// Issues a fresh 32-byte challenge bound to `did`'s authentication key,
/// caching it for five minutes.
#[utoipa::path(
    post,
    path = "/did/challenge",
    tag = "DID",
    request_body = ChallengeRequest,
    responses(
        (status = 200, description = "Challenge issued", body = ChallengeResponse),
        (status = 404, description = "No document for this DID")
    )
)]
pub async fn issue_challenge(
    State(node): State<Arc<NodeContext>>,
    Json(request): Json<ChallengeRequest>,
) -> Result<Json<ApiResponse<ChallengeResponse>>, WebError> {
    validate(request.validate())?;
    let challenge = node.issue_challenge(&request.did)?;
    Ok(Json(ApiResponse::success(ChallengeResponse {
        did: request.did,
        challenge,
    })))
}

/// Verifies a base64-encoded `r ‖ s` signature over the cached challenge.
#[utoipa::path(
    post,
    path = "/did/verify",
    tag = "DID",
    request_body = VerifyChallengeRequest,
    responses(
        (status = 200, description = "Verification result", body = VerifyChallengeResponse),
        (status = 401, description = "No pending challenge or signature mismatch")
    )
)]
pub async fn verify_challenge(
    State(node): State<Arc<NodeContext>>,
    Json(request): Json<VerifyChallengeRequest>,
) -> Result<Json<ApiResponse<VerifyChallengeResponse>>, WebError> {
    validate(request.validate())?;
    let signature = BASE64
        .decode(request.signature.as_bytes())
        .map_err(|e| WebError::InvalidRequest(e.to_string()))?;
    let verified = node.verify_challenge(&request.did, &signature)?;
    Ok(Json(ApiResponse::success(VerifyChallengeResponse { verified })))
}

/// Resolves `did`'s document, appends a `KemJsonKey2025` verification
/// method for `kem_address`'s wallet, and re-publishes it.
#[utoipa::path(
    post,
    path = "/did/update/kem",
    tag = "DID",
    request_body = UpdateKemRequest,
    responses(
        (status = 200, description = "Document updated", body = DidDocument),
        (status = 400, description = "Invalid or unknown address")
    )
)]
pub async fn update_kem(
    State(node): State<Arc<NodeContext>>,
    Json(request): Json<UpdateKemRequest>,
) -> Result<Json<ApiResponse<DidDocument>>, WebError> {
    validate(request.validate())?;
    let did = node.update_kem_key(&request.address, &request.kem_address)?;
    let document = node.find_did(&did)?;
    Ok(Json(ApiResponse::success(document)))
}

/// Returns the `publicKeyJwk` of `did`'s `KemJsonKey2025` method, if any.
#[utoipa::path(
    post,
    path = "/kem/publickey/get",
    tag = "DID",
    request_body = KemPublicKeyRequest,
    responses(
        (status = 200, description = "Lattice public key", body = KemPublicKeyResponse),
        (status = 404, description = "No lattice key on this document")
    )
)]
pub async fn get_kem_public_key(
    State(node): State<Arc<NodeContext>>,
    Json(request): Json<KemPublicKeyRequest>,
) -> Result<Json<ApiResponse<KemPublicKeyResponse>>, WebError> {
    validate(request.validate())?;
    let document = node.find_did(&request.did)?;
    let method = document
        .verification_method
        .iter()
        .find(|vm| vm.id.ends_with("#lattice-key"))
        .ok_or_else(|| WebError::NotFound(format!("no lattice key for {}", request.did)))?;

    Ok(Json(ApiResponse::success(KemPublicKeyResponse {
        did: request.did,
        public_key_jwk: method.public_key_jwk.clone(),
    })))
}
