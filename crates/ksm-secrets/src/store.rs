//! Secret storage backends.
//!
//! Defines the [`SecretStore`] capability trait that the lifecycle manager
//! drives, and provides [`InMemorySecretStore`], a process-local
//! implementation with the same existence and version semantics as the
//! cluster API. The remote implementation lives in [`crate::cluster`].

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::StoreError;
use crate::types::SecretRecord;

/// Result alias for store calls.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Async trait for the authoritative secret store.
///
/// Each call is atomic on its own; nothing spans two calls. Implementations
/// signal absence with [`StoreError::NotFound`].
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Fetch a record, including its current version token.
    async fn get(&self, namespace: &str, name: &str) -> StoreResult<SecretRecord>;

    /// Create a record. Fails with `AlreadyExists` if the key is taken.
    async fn create(&self, record: &SecretRecord) -> StoreResult<SecretRecord>;

    /// Replace a record.
    ///
    /// When `expected_version` is given and no longer current the store
    /// rejects the write with `Conflict`.
    async fn update(
        &self,
        record: &SecretRecord,
        expected_version: Option<&str>,
    ) -> StoreResult<SecretRecord>;

    /// Delete a record.
    async fn delete(&self, namespace: &str, name: &str) -> StoreResult<()>;

    /// List every record in a namespace. Empty namespaces yield an empty list.
    async fn list(&self, namespace: &str) -> StoreResult<Vec<SecretRecord>>;
}

/// A process-local store keyed by `(namespace, name)`.
///
/// Versions are drawn from a single counter, so every successful write gets
/// a fresh token. Listing is ordered by name.
#[derive(Default)]
pub struct InMemorySecretStore {
    records: RwLock<BTreeMap<(String, String), SecretRecord>>,
    version: AtomicU64,
}

impl InMemorySecretStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records across all namespaces.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// Whether the store holds no records.
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    fn next_version(&self) -> String {
        (self.version.fetch_add(1, Ordering::Relaxed) + 1).to_string()
    }
}

fn key_of(namespace: &str, name: &str) -> (String, String) {
    (namespace.to_string(), name.to_string())
}

#[async_trait]
impl SecretStore for InMemorySecretStore {
    async fn get(&self, namespace: &str, name: &str) -> StoreResult<SecretRecord> {
        self.records
            .read()
            .await
            .get(&key_of(namespace, name))
            .cloned()
            .ok_or_else(|| StoreError::not_found(namespace, name))
    }

    async fn create(&self, record: &SecretRecord) -> StoreResult<SecretRecord> {
        let mut records = self.records.write().await;
        let key = key_of(&record.namespace, &record.name);
        if records.contains_key(&key) {
            return Err(StoreError::already_exists(&record.namespace, &record.name));
        }

        let mut stored = record.clone();
        stored.resource_version = Some(self.next_version());
        stored.created_at = Some(Utc::now());
        debug!(namespace = %record.namespace, name = %record.name, "stored new secret");
        records.insert(key, stored.clone());
        Ok(stored)
    }

    async fn update(
        &self,
        record: &SecretRecord,
        expected_version: Option<&str>,
    ) -> StoreResult<SecretRecord> {
        let mut records = self.records.write().await;
        let key = key_of(&record.namespace, &record.name);
        let current = records
            .get(&key)
            .ok_or_else(|| StoreError::not_found(&record.namespace, &record.name))?;

        if let Some(expected) = expected_version {
            if current.resource_version.as_deref() != Some(expected) {
                return Err(StoreError::conflict(&record.namespace, &record.name));
            }
        }

        let mut stored = record.clone();
        stored.resource_version = Some(self.next_version());
        stored.created_at = current.created_at;
        debug!(namespace = %record.namespace, name = %record.name, "replaced secret");
        records.insert(key, stored.clone());
        Ok(stored)
    }

    async fn delete(&self, namespace: &str, name: &str) -> StoreResult<()> {
        self.records
            .write()
            .await
            .remove(&key_of(namespace, name))
            .map(|_| ())
            .ok_or_else(|| StoreError::not_found(namespace, name))
    }

    async fn list(&self, namespace: &str) -> StoreResult<Vec<SecretRecord>> {
        Ok(self
            .records
            .read()
            .await
            .iter()
            .filter(|((ns, _), _)| ns == namespace)
            .map(|(_, record)| record.clone())
            .collect())
    }
}
