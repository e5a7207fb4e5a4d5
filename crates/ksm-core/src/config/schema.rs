//! Configuration schema definitions.

use crate::secret::SecretString;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main KSM configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Backing secret store.
    #[serde(default)]
    pub store: StoreSettings,

    /// REST server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Lifecycle manager defaults.
    #[serde(default)]
    pub manager: ManagerSettings,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Secret store configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreSettings {
    /// Which store implementation to use.
    #[serde(default)]
    pub backend: StoreBackend,

    /// Cluster API server base URL (e.g. `https://10.0.0.1:6443`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_server: Option<String>,

    /// Bearer token for the cluster API.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<SecretString>,

    /// File holding the bearer token; read at startup.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_file: Option<PathBuf>,

    /// PEM bundle trusted in addition to the system roots.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ca_file: Option<PathBuf>,

    /// Kubeconfig to take the current context from. When unset and no
    /// `api_server` is given, `~/.kube/config` is used if present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kubeconfig: Option<PathBuf>,

    /// Discover the API server and token from the pod environment.
    #[serde(default)]
    pub in_cluster: bool,

    /// HTTP request timeout in seconds.
    #[serde(default = "default_store_timeout")]
    pub timeout_secs: u64,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            api_server: None,
            token: None,
            token_file: None,
            ca_file: None,
            kubeconfig: None,
            in_cluster: false,
            timeout_secs: default_store_timeout(),
        }
    }
}

fn default_store_timeout() -> u64 {
    30
}

/// Secret store backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Remote cluster secret API.
    #[default]
    Cluster,

    /// Process-local store; contents vanish on exit.
    Memory,
}

impl std::str::FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cluster" => Ok(Self::Cluster),
            "memory" => Ok(Self::Memory),
            other => Err(format!(
                "unknown store backend '{}', expected 'cluster' or 'memory'",
                other
            )),
        }
    }
}

/// REST server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen host.
    #[serde(default = "default_host")]
    pub host: String,

    /// Listen port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Enable the CORS layer.
    #[serde(default = "default_true")]
    pub cors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors: true,
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Lifecycle manager defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManagerSettings {
    /// Namespace used by the CLI when `--namespace` is not given.
    #[serde(default = "default_namespace")]
    pub default_namespace: String,

    /// Kind assigned to records created without one.
    #[serde(default = "default_kind")]
    pub default_kind: String,

    /// Upper bound for a single store call, in seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub call_timeout_secs: Option<u64>,
}

impl Default for ManagerSettings {
    fn default() -> Self {
        Self {
            default_namespace: default_namespace(),
            default_kind: default_kind(),
            call_timeout_secs: None,
        }
    }
}

fn default_namespace() -> String {
    "default".to_string()
}

fn default_kind() -> String {
    "Opaque".to_string()
}

/// Logging configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level.
    #[serde(default)]
    pub level: LogLevel,

    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

/// Log level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Filter directive name for this level.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

fn default_true() -> bool {
    true
}
