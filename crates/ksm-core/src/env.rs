//! Environment variable handling.

use std::env;

/// Get an environment variable, returning None if not set or empty.
pub fn get_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.is_empty())
}

/// Get an environment variable with a default value.
pub fn get_var_or(name: &str, default: &str) -> String {
    get_var(name).unwrap_or_else(|| default.to_string())
}

/// Get an environment variable as a u16 (e.g., for ports).
pub fn get_u16(name: &str) -> Option<u16> {
    get_var(name).and_then(|v| v.parse().ok())
}

/// Environment variable names understood by KSM.
pub mod vars {
    /// KSM home directory override.
    pub const KSM_HOME: &str = "KSM_HOME";

    /// Cluster API server URL.
    pub const KSM_API_SERVER: &str = "KSM_API_SERVER";

    /// Bearer token for the cluster API.
    pub const KSM_TOKEN: &str = "KSM_TOKEN";

    /// Default namespace for CLI operations.
    pub const KSM_NAMESPACE: &str = "KSM_NAMESPACE";

    /// REST server port.
    pub const KSM_PORT: &str = "KSM_PORT";

    /// Set inside a pod; used for in-cluster discovery.
    pub const KUBERNETES_SERVICE_HOST: &str = "KUBERNETES_SERVICE_HOST";

    /// Set inside a pod alongside the host.
    pub const KUBERNETES_SERVICE_PORT: &str = "KUBERNETES_SERVICE_PORT";
}
