//! Configuration loading and persistence.

use super::Config;
use crate::env;
use crate::error::ConfigError;
use crate::paths;
use crate::secret::SecretString;
use std::fs;
use std::path::Path;
use tracing::debug;

impl Config {
    /// Load configuration from the default path.
    pub fn load_default() -> Result<Self, ConfigError> {
        let path = paths::config_file()?;
        Self::load(&path)
    }

    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        debug!(path = %path.display(), "loaded configuration file");
        Self::parse(&content)
    }

    /// Parse configuration from a string.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        json5::from_str(content).map_err(|e| ConfigError::Json5(e.to_string()))
    }

    /// Resolve the configuration used by the binaries.
    ///
    /// An explicit path must exist. Without one, the default path is tried
    /// and a missing file falls back to defaults. `KSM_*` environment
    /// overrides are applied last in both cases.
    pub fn resolve(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::load(path)?,
            None => match Self::load_default() {
                Ok(config) => config,
                Err(ConfigError::NotFound(_)) => Self::default(),
                Err(e) => return Err(e),
            },
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Overlay `KSM_*` environment variables onto this configuration.
    pub fn apply_env_overrides(&mut self) {
        if let Some(server) = env::get_var(env::vars::KSM_API_SERVER) {
            self.store.api_server = Some(server);
        }
        if let Some(token) = env::get_var(env::vars::KSM_TOKEN) {
            self.store.token = Some(SecretString::new(token));
        }
        if let Some(namespace) = env::get_var(env::vars::KSM_NAMESPACE) {
            self.manager.default_namespace = namespace;
        }
        if let Some(port) = env::get_u16(env::vars::KSM_PORT) {
            self.server.port = port;
        }
    }

    /// Save configuration to a file path.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = self.to_json5()?;

        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        // Write atomically
        let temp_path = path.with_extension("tmp");
        fs::write(&temp_path, &content)?;
        fs::rename(&temp_path, path)?;

        Ok(())
    }

    /// Serialize to JSON5 string.
    pub fn to_json5(&self) -> Result<String, ConfigError> {
        // json5 doesn't have a serializer; plain JSON is valid JSON5
        serde_json::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Validate the configuration, collecting all errors before returning.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        if self.server.port == 0 {
            errors.push("Server port cannot be 0".to_string());
        }

        if self.server.host.trim().is_empty() {
            errors.push("Server host must not be empty".to_string());
        }

        if self.store.in_cluster && self.store.kubeconfig.is_some() {
            errors.push("Set only one of store.in_cluster and store.kubeconfig".to_string());
        }

        if let Some(server) = &self.store.api_server {
            if !(server.starts_with("http://") || server.starts_with("https://")) {
                errors.push(format!(
                    "Invalid store.api_server '{}', expected an http(s) URL",
                    server
                ));
            }
        }

        if self.store.token.is_some() && self.store.token_file.is_some() {
            errors.push("Set only one of store.token and store.token_file".to_string());
        }

        if self.store.timeout_secs == 0 {
            errors.push("store.timeout_secs must be greater than 0".to_string());
        }

        if self.manager.default_namespace.is_empty() {
            errors.push("manager.default_namespace must not be empty".to_string());
        }

        if self.manager.call_timeout_secs == Some(0) {
            errors.push("manager.call_timeout_secs must be greater than 0".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors.join("; ")))
        }
    }
}
