// Web layer: the DID HTTP service (axum + utoipa), built against NodeContext.
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod openapi;
pub mod routes;
pub mod server;

// Don't re-export web::* from the crate root to avoid naming conflicts.
// Use explicit paths (`web::models::ApiResponse`) at call sites instead.
pub use server::{WebServer, WebServerConfig, create_web_server, create_web_server_with_config};
