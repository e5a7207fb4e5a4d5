//! Error types for secret management.
//!
//! Two layers: [`StoreError`] is what a store backend reports, and
//! [`SecretError`] is the application taxonomy every front end maps from.
//! The lifecycle manager is the only place that converts one into the other.

use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

/// A record failed structural checks before reaching the store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {field}: {message}")]
pub struct ValidationError {
    /// Offending field: `name`, `namespace`, or `data`.
    pub field: &'static str,

    /// Human-readable explanation.
    pub message: String,
}

impl ValidationError {
    /// Create a validation error for `field`.
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Failures reported by a [`crate::SecretStore`] implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("secret {name} not found in namespace {namespace}")]
    NotFound { namespace: String, name: String },

    #[error("secret {name} already exists in namespace {namespace}")]
    AlreadyExists { namespace: String, name: String },

    #[error("secret {name} in namespace {namespace} has a newer version")]
    Conflict { namespace: String, name: String },

    #[error("store call timed out after {0:?}")]
    Timeout(Duration),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("store responded {status}: {message}")]
    Status { status: u16, message: String },

    #[error("malformed store response: {0}")]
    Malformed(String),

    #[error("store configuration error: {0}")]
    Config(String),
}

impl StoreError {
    pub fn not_found(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self::NotFound {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    pub fn already_exists(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self::AlreadyExists {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    pub fn conflict(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self::Conflict {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Whether this is the store's "not found" signal.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Errors returned by the lifecycle manager.
///
/// Exactly five kinds; front ends map each to a status code or exit message
/// and never invent new ones.
#[derive(Debug, Error)]
pub enum SecretError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{}", not_found_message(.resource_kind, .namespace, .name))]
    NotFound {
        resource_kind: &'static str,
        namespace: String,
        name: String,
    },

    #[error("secret {name} already exists in namespace {namespace}")]
    AlreadyExists { namespace: String, name: String },

    #[error("secret {name} in namespace {namespace} was modified concurrently; fetch it and retry")]
    Conflict { namespace: String, name: String },

    #[error("internal error: {0}")]
    Internal(#[source] StoreError),
}

impl SecretError {
    /// Stable classification used by front ends.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::AlreadyExists { .. } => ErrorKind::AlreadyExists,
            Self::Conflict { .. } => ErrorKind::Conflict,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Offending field for validation failures.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Self::Validation(e) => Some(e.field),
            _ => None,
        }
    }
}

fn not_found_message(resource_kind: &str, namespace: &str, name: &str) -> String {
    if resource_kind == "namespace" {
        format!("namespace {} not found", namespace)
    } else {
        format!("{} {} not found in namespace {}", resource_kind, name, namespace)
    }
}

/// Classification of a [`SecretError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    NotFound,
    AlreadyExists,
    Conflict,
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::NotFound => "not_found",
            Self::AlreadyExists => "already_exists",
            Self::Conflict => "conflict",
            Self::Internal => "internal",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Convenience result alias for lifecycle operations.
pub type Result<T> = std::result::Result<T, SecretError>;
