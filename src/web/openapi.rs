use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::web::handlers::{did, health};

/// OpenAPI documentation for the DID HTTP service.
#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        health::liveness,
        health::readiness,
        did::create_did,
        did::find_did,
        did::issue_challenge,
        did::verify_challenge,
        did::update_kem,
        did::get_kem_public_key,
    ),
    components(
        schemas(
            crate::web::models::responses::HealthResponse,
            crate::web::models::responses::ChallengeResponse,
            crate::web::models::responses::VerifyChallengeResponse,
            crate::web::models::responses::KemPublicKeyResponse,
            crate::web::models::requests::CreateDidRequest,
            crate::web::models::requests::FindDidRequest,
            crate::web::models::requests::ChallengeRequest,
            crate::web::models::requests::VerifyChallengeRequest,
            crate::web::models::requests::UpdateKemRequest,
            crate::web::models::requests::KemPublicKeyRequest,
            crate::web::models::errors::ErrorResponse,
            crate::did::document::DidDocument,
            crate::did::document::VerificationMethod,
            crate::did::document::Jwk,
        )
    ),
    tags(
        (name = "Health", description = "Health check endpoints"),
        (name = "DID", description = "Decentralized identifier lifecycle: create, resolve, challenge, verify, KEM attachment"),
    ),
    info(
        title = "easyblock node DID service",
        version = "0.1.0",
        description = "DID lifecycle operations over the node's UTXO blockchain"
    ),
    servers(
        (url = "http://localhost:8080", description = "Local node")
    )
)]
pub struct ApiDoc;

/// Create Swagger UI router
pub fn create_swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi())
}
