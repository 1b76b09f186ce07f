use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// `POST /did/create`
#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateDidRequest {
    #[validate(length(min = 26, max = 35, message = "Invalid address format"))]
    pub address: String,
}

/// `POST /did/find`
#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct FindDidRequest {
    #[validate(length(min = 1, message = "did must not be empty"))]
    pub did: String,
}

/// `POST /did/challenge`
#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct ChallengeRequest {
    #[validate(length(min = 1, message = "did must not be empty"))]
    pub did: String,
}

/// `POST /did/verify` — `signature` is base64-encoded `r ‖ s`.
#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct VerifyChallengeRequest {
    #[validate(length(min = 1, message = "did must not be empty"))]
    pub did: String,
    #[validate(length(min = 1, message = "signature must not be empty"))]
    pub signature: String,
}

/// `POST /did/update/kem`
#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateKemRequest {
    #[serde(default = "default_kem_kind")]
    pub kind: String,
    #[validate(length(min = 1, message = "did must not be empty"))]
    pub did: String,
    #[validate(length(min = 26, max = 35, message = "Invalid address format"))]
    pub address: String,
    #[validate(length(min = 26, max = 35, message = "Invalid kem_address format"))]
    pub kem_address: String,
}

fn default_kem_kind() -> String {
    "kem".to_string()
}

/// `POST /kem/publickey/get`
#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct KemPublicKeyRequest {
    #[validate(length(min = 1, message = "did must not be empty"))]
    pub did: String,
}
