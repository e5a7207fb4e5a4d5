//! # ksm-core
//!
//! Configuration, paths, and shared utilities for KSM.
//!
//! This crate is consumed by every other KSM crate:
//!
//! - **Configuration**: Loading, validation, and persistence of `ksm.json5`
//! - **Paths**: Resolution of the KSM home directory and well-known files
//! - **Environment**: Typed access to `KSM_*` overrides
//! - **Secrets**: A redacting string wrapper for credentials held in memory

pub mod config;
pub mod env;
pub mod error;
pub mod paths;
pub mod secret;

// Re-exports for convenience
pub use config::Config;
pub use error::{ConfigError, Result};
pub use secret::SecretString;
