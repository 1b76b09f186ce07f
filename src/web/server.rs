use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::node::NodeContext;
use crate::web::routes::create_all_api_routes;

/// Web server configuration
#[derive(Debug, Clone)]
pub struct WebServerConfig {
    pub host: String,
    pub port: u16,
    pub enable_cors: bool,
}

impl Default for WebServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            enable_cors: true,
        }
    }
}

/// The DID HTTP service.
pub struct WebServer {
    config: WebServerConfig,
    node: Arc<NodeContext>,
}

impl WebServer {
    pub fn new(node_context: NodeContext, config: WebServerConfig) -> Self {
        Self {
            config,
            node: Arc::new(node_context),
        }
    }

    /// Create the main application router
    pub fn create_app(&self) -> Router {
        let mut app = create_all_api_routes()
            .merge(crate::web::openapi::create_swagger_ui())
            .with_state(self.node.clone());

        if self.config.enable_cors {
            app = app.layer(CorsLayer::permissive());
        }

        app = app.layer(CompressionLayer::new()).layer(TraceLayer::new_for_http());

        app
    }

    /// Start the web server with graceful shutdown
    pub async fn start_with_shutdown(&self) -> Result<(), Box<dyn std::error::Error>> {
        let app = self.create_app();

        let addr = SocketAddr::from(([0, 0, 0, 0], self.config.port));

        tracing::info!("Starting DID HTTP service on {} with graceful shutdown", addr);

        let listener = tokio::net::TcpListener::bind(addr).await?;

        let shutdown_signal = async {
            tokio::signal::ctrl_c()
                .await
                .expect("Failed to install CTRL+C signal handler");
            tracing::info!("Shutdown signal received");
        };

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal)
            .await?;

        Ok(())
    }
}

/// Create a web server with default configuration
pub fn create_web_server(node_context: NodeContext) -> WebServer {
    WebServer::new(node_context, WebServerConfig::default())
}

/// Create a web server with custom configuration
pub fn create_web_server_with_config(node_context: NodeContext, config: WebServerConfig) -> WebServer {
    WebServer::new(node_context, config)
}
