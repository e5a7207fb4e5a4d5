//! REST gateway server.

use std::future::Future;

use axum::{
    http::{header, Method},
    routing::{get, post},
    Router,
};
use ksm_core::config::ServerConfig;
use ksm_secrets::SecretManager;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::error::GatewayError;
use crate::handlers;
use crate::Result;

/// Default gateway port.
pub const DEFAULT_PORT: u16 = 8080;

/// Gateway configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayConfig {
    /// Listen host.
    pub host: String,

    /// Port number.
    pub port: u16,

    /// Enable CORS.
    pub cors: bool,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            cors: true,
        }
    }
}

impl GatewayConfig {
    /// Build from the `server` config section.
    pub fn from_settings(settings: &ServerConfig) -> Self {
        Self {
            host: settings.host.clone(),
            port: settings.port,
            cors: settings.cors,
        }
    }
}

/// The REST gateway.
pub struct Gateway {
    config: GatewayConfig,
    manager: SecretManager,
}

impl Gateway {
    /// Create a new gateway serving `manager`.
    pub fn new(config: GatewayConfig, manager: SecretManager) -> Self {
        Self { config, manager }
    }

    /// Gateway configuration.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Run until the process is interrupted.
    pub async fn run(&self) -> Result<()> {
        self.run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Failed to listen for shutdown signal: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await
    }

    /// Run until `shutdown` resolves, then drain in-flight requests.
    pub async fn run_until<F>(&self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind((self.config.host.as_str(), self.config.port)).await?;
        let addr = listener.local_addr()?;
        info!("Starting gateway server on {}", addr);

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| GatewayError::Internal(e.to_string()))?;

        info!("Gateway server stopped");
        Ok(())
    }

    /// Create the Axum router.
    pub fn router(&self) -> Router {
        build_router(self.manager.clone(), self.config.cors)
    }
}

/// Build the router for `manager`, optionally with a CORS layer.
pub fn build_router(manager: SecretManager, cors: bool) -> Router {
    let api = Router::new()
        .route("/secrets", post(handlers::create_secret))
        .route("/secrets/:namespace", get(handlers::list_secrets))
        .route(
            "/secrets/:namespace/:name",
            get(handlers::get_secret)
                .put(handlers::update_secret)
                .delete(handlers::delete_secret),
        );

    let mut router = Router::new()
        .nest("/api/v1", api)
        .route("/health", get(handlers::health))
        .with_state(manager)
        .layer(TraceLayer::new_for_http());

    if cors {
        router = router.layer(create_cors_layer());
    }

    router
}

fn create_cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .max_age(std::time::Duration::from_secs(3600))
}
