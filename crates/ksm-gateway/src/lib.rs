//! REST gateway for KSM.
//!
//! Exposes the secret lifecycle operations over HTTP/JSON:
//! - `POST /api/v1/secrets` and `GET /api/v1/secrets/:namespace`
//! - `GET`/`PUT`/`DELETE /api/v1/secrets/:namespace/:name`
//! - `GET /health`
//!
//! Every handler delegates to a [`ksm_secrets::SecretManager`]; failures are
//! rendered as `{error, field?, message}` with a status derived from the
//! error kind.

pub mod error;
pub mod handlers;
pub mod server;

pub use error::{ApiError, ErrorResponse, GatewayError};
pub use server::{build_router, Gateway, GatewayConfig};

/// Result type for gateway operations.
pub type Result<T> = std::result::Result<T, GatewayError>;
