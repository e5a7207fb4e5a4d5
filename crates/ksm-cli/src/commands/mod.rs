//! CLI command implementations.

pub mod config;
pub mod secrets;
pub mod server;

use std::sync::Arc;

use ksm_core::config::{Config, StoreBackend};
use ksm_secrets::{
    ClusterSecretStore, InMemorySecretStore, ManagerConfig, SecretManager, SecretStore,
};
use tracing::warn;

/// Build the lifecycle manager over the configured store.
pub fn build_manager(config: &Config) -> anyhow::Result<SecretManager> {
    let store: Arc<dyn SecretStore> = match config.store.backend {
        StoreBackend::Memory => {
            warn!("Using the in-memory store; secrets are lost when the process exits");
            Arc::new(InMemorySecretStore::new())
        }
        StoreBackend::Cluster => Arc::new(
            ClusterSecretStore::from_settings(&config.store)
                .map_err(|e| anyhow::anyhow!("Failed to initialize secret store: {}", e))?,
        ),
    };

    Ok(SecretManager::new(store).with_config(ManagerConfig::from_settings(&config.manager)))
}
