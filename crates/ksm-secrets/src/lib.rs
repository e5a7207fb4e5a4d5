//! Secret lifecycle management for KSM.
//!
//! Validates namespaced secret records, sequences create/update/delete/get/list
//! calls against an authoritative store, and normalizes store failures into
//! the [`SecretError`] taxonomy shared by every front end.

pub mod cluster;
pub mod error;
pub mod kubeconfig;
pub mod manager;
pub mod store;
pub mod types;
pub mod validator;

pub use cluster::ClusterSecretStore;
pub use error::{ErrorKind, Result, SecretError, StoreError, ValidationError};
pub use kubeconfig::KubeconfigConnection;
pub use manager::{ManagerConfig, SecretManager};
pub use store::{InMemorySecretStore, SecretStore};
pub use types::SecretRecord;
