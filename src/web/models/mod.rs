pub mod errors;
pub mod requests;
pub mod responses;

pub use errors::{ErrorResponse, WebError};
pub use requests::{ChallengeRequest, CreateDidRequest, FindDidRequest, KemPublicKeyRequest, UpdateKemRequest, VerifyChallengeRequest};
pub use responses::{ApiResponse, ChallengeResponse, HealthResponse, KemPublicKeyResponse, VerifyChallengeResponse};
