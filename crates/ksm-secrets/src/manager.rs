//! Secret lifecycle orchestration.
//!
//! [`SecretManager`] validates input, sequences calls against a
//! [`SecretStore`], applies the update merge rules, and converts every store
//! failure into a [`SecretError`]. It holds no state of its own beyond the
//! store handle and its configuration.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use ksm_core::config::ManagerSettings;
use tracing::{debug, info};

use crate::error::{Result, SecretError, StoreError};
use crate::store::{SecretStore, StoreResult};
use crate::types::{SecretRecord, DEFAULT_KIND};
use crate::validator::{validate_identity, validate_namespace, validate_record};

/// Manager behaviour knobs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagerConfig {
    /// Kind given to records created with an empty `kind`.
    pub default_kind: String,

    /// Upper bound for each individual store call.
    pub call_timeout: Option<Duration>,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            default_kind: DEFAULT_KIND.to_string(),
            call_timeout: None,
        }
    }
}

impl ManagerConfig {
    /// Build from the `manager` config section.
    pub fn from_settings(settings: &ManagerSettings) -> Self {
        Self {
            default_kind: settings.default_kind.clone(),
            call_timeout: settings.call_timeout_secs.map(Duration::from_secs),
        }
    }
}

/// Lifecycle orchestrator over a [`SecretStore`].
///
/// Every operation validates before touching the store, makes at most two
/// sequential store calls, and never retries.
///
/// `create` checks for an existing record before writing. That check and the
/// write are separate store calls, so a concurrent creator can still win;
/// the store's own uniqueness check rejects the loser with `AlreadyExists`.
#[derive(Clone)]
pub struct SecretManager {
    store: Arc<dyn SecretStore>,
    config: ManagerConfig,
}

impl SecretManager {
    /// Create a manager with default configuration.
    pub fn new(store: Arc<dyn SecretStore>) -> Self {
        Self {
            store,
            config: ManagerConfig::default(),
        }
    }

    /// Replace the configuration.
    pub fn with_config(mut self, config: ManagerConfig) -> Self {
        self.config = config;
        self
    }

    /// Current configuration.
    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    /// Create a new record.
    ///
    /// Fails with `AlreadyExists` if `(namespace, name)` is taken. An empty
    /// `kind` is replaced by the configured default.
    pub async fn create(&self, mut record: SecretRecord) -> Result<SecretRecord> {
        validate_record(&record)?;

        match self.call(self.store.get(&record.namespace, &record.name)).await {
            Ok(_) => return Err(already_exists(&record)),
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(SecretError::Internal(e)),
        }

        if record.kind.is_empty() {
            record.kind = self.config.default_kind.clone();
        }

        let result = self.call(self.store.create(&record)).await;
        match result {
            Ok(created) => {
                info!(namespace = %created.namespace, name = %created.name, "secret created");
                Ok(created)
            }
            Err(StoreError::AlreadyExists { .. }) => Err(already_exists(&record)),
            Err(StoreError::NotFound { .. }) => Err(SecretError::NotFound {
                resource_kind: "namespace",
                namespace: record.namespace.clone(),
                name: record.namespace,
            }),
            Err(e) => Err(SecretError::Internal(e)),
        }
    }

    /// Replace the entries of an existing record.
    ///
    /// `entries` replace the stored map wholesale. `kind` is only changed
    /// when the incoming value is non-empty. The fetched version is sent as
    /// the expected version, so a concurrent writer surfaces as `Conflict`.
    pub async fn update(&self, record: SecretRecord) -> Result<SecretRecord> {
        validate_record(&record)?;

        let existing = match self.call(self.store.get(&record.namespace, &record.name)).await {
            Ok(existing) => existing,
            Err(e) if e.is_not_found() => {
                return Err(secret_not_found(&record.namespace, &record.name))
            }
            Err(e) => return Err(SecretError::Internal(e)),
        };

        let kind = if record.kind.is_empty() {
            existing.kind
        } else {
            record.kind
        };
        let replacement = SecretRecord {
            name: record.name,
            namespace: record.namespace,
            kind,
            entries: record.entries,
            resource_version: existing.resource_version,
            created_at: existing.created_at,
        };

        let expected = replacement.resource_version.as_deref();
        let result = self.call(self.store.update(&replacement, expected)).await;
        match result {
            Ok(updated) => {
                info!(namespace = %updated.namespace, name = %updated.name, "secret updated");
                Ok(updated)
            }
            Err(StoreError::Conflict { .. }) => Err(SecretError::Conflict {
                namespace: replacement.namespace,
                name: replacement.name,
            }),
            Err(e) if e.is_not_found() => {
                Err(secret_not_found(&replacement.namespace, &replacement.name))
            }
            Err(e) => Err(SecretError::Internal(e)),
        }
    }

    /// Delete a record.
    pub async fn delete(&self, namespace: &str, name: &str) -> Result<()> {
        validate_identity(namespace, name)?;

        match self.call(self.store.delete(namespace, name)).await {
            Ok(()) => {
                info!(namespace, name, "secret deleted");
                Ok(())
            }
            Err(e) if e.is_not_found() => Err(secret_not_found(namespace, name)),
            Err(e) => Err(SecretError::Internal(e)),
        }
    }

    /// Fetch a record, including its version token.
    pub async fn get(&self, namespace: &str, name: &str) -> Result<SecretRecord> {
        validate_identity(namespace, name)?;

        self.call(self.store.get(namespace, name))
            .await
            .map_err(|e| match e {
                e if e.is_not_found() => secret_not_found(namespace, name),
                e => SecretError::Internal(e),
            })
    }

    /// List the records in a namespace, in store order.
    pub async fn list(&self, namespace: &str) -> Result<Vec<SecretRecord>> {
        validate_namespace(namespace)?;

        let records = self
            .call(self.store.list(namespace))
            .await
            .map_err(SecretError::Internal)?;

        let records: Vec<SecretRecord> = records
            .into_iter()
            .filter(|r| r.namespace == namespace)
            .collect();
        debug!(namespace, count = records.len(), "listed secrets");
        Ok(records)
    }

    /// Whether a record exists.
    pub async fn exists(&self, namespace: &str, name: &str) -> Result<bool> {
        validate_identity(namespace, name)?;

        match self.call(self.store.get(namespace, name)).await {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(SecretError::Internal(e)),
        }
    }

    /// Fetch a single entry value.
    pub async fn get_value(&self, namespace: &str, name: &str, key: &str) -> Result<String> {
        let mut record = self.get(namespace, name).await?;
        record
            .entries
            .remove(key)
            .ok_or_else(|| SecretError::NotFound {
                resource_kind: "key",
                namespace: namespace.to_string(),
                name: format!("{}/{}", name, key),
            })
    }

    async fn call<T, F>(&self, fut: F) -> StoreResult<T>
    where
        F: Future<Output = StoreResult<T>>,
    {
        match self.config.call_timeout {
            Some(limit) => tokio::time::timeout(limit, fut)
                .await
                .map_err(|_| StoreError::Timeout(limit))?,
            None => fut.await,
        }
    }
}

fn already_exists(record: &SecretRecord) -> SecretError {
    SecretError::AlreadyExists {
        namespace: record.namespace.clone(),
        name: record.name.clone(),
    }
}

fn secret_not_found(namespace: &str, name: &str) -> SecretError {
    SecretError::NotFound {
        resource_kind: "secret",
        namespace: namespace.to_string(),
        name: name.to_string(),
    }
}
