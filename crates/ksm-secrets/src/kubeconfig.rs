//! Connection details read from a kubeconfig file.
//!
//! Only the current context is resolved: its cluster's `server` and CA, and
//! its user's bearer token or client certificate. Exec plugins and auth
//! providers are not supported. Relative file references are resolved
//! against the kubeconfig's own directory.

use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use ksm_core::SecretString;
use serde::Deserialize;

use crate::error::StoreError;
use crate::store::StoreResult;

/// What the current context says about reaching the cluster.
pub struct KubeconfigConnection {
    /// Name of the context that was resolved.
    pub context: String,

    /// API server URL.
    pub server: String,

    /// PEM bundle for the cluster CA.
    pub ca_pem: Option<Vec<u8>>,

    /// Bearer token.
    pub token: Option<SecretString>,

    /// Client certificate followed by its private key, PEM encoded.
    pub identity_pem: Option<Vec<u8>>,
}

impl KubeconfigConnection {
    /// Load and resolve the kubeconfig at `path`.
    pub fn load(path: &Path) -> StoreResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            StoreError::config(format!("failed to read kubeconfig {}: {}", path.display(), e))
        })?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        Self::parse(&raw, base_dir)
    }

    /// Resolve kubeconfig YAML, reading referenced files from `base_dir`.
    pub fn parse(raw: &str, base_dir: &Path) -> StoreResult<Self> {
        let config: Kubeconfig = serde_yaml::from_str(raw)
            .map_err(|e| StoreError::config(format!("invalid kubeconfig: {}", e)))?;

        let context_name = config
            .current_context
            .filter(|name| !name.is_empty())
            .ok_or_else(|| StoreError::config("kubeconfig has no current-context"))?;

        let context = config
            .contexts
            .into_iter()
            .find(|c| c.name == context_name)
            .map(|c| c.context)
            .ok_or_else(|| {
                StoreError::config(format!("kubeconfig context '{}' not found", context_name))
            })?;

        let cluster = config
            .clusters
            .into_iter()
            .find(|c| c.name == context.cluster)
            .map(|c| c.cluster)
            .ok_or_else(|| {
                StoreError::config(format!("kubeconfig cluster '{}' not found", context.cluster))
            })?;

        let user = match &context.user {
            Some(name) => config
                .users
                .into_iter()
                .find(|u| &u.name == name)
                .map(|u| u.user)
                .ok_or_else(|| {
                    StoreError::config(format!("kubeconfig user '{}' not found", name))
                })?,
            None => UserEntry::default(),
        };

        let ca_pem = read_pem(
            cluster.certificate_authority_data,
            cluster.certificate_authority,
            base_dir,
            "certificate-authority",
        )?;

        let token = match (user.token.filter(|t| !t.is_empty()), user.token_file) {
            (Some(token), _) => Some(SecretString::new(token)),
            (None, Some(file)) => {
                let path = resolve(base_dir, &file);
                Some(SecretString::from_file(&path).map_err(|e| {
                    StoreError::config(format!(
                        "failed to read kubeconfig tokenFile {}: {}",
                        path.display(),
                        e
                    ))
                })?)
            }
            (None, None) => None,
        };

        let cert = read_pem(
            user.client_certificate_data,
            user.client_certificate,
            base_dir,
            "client-certificate",
        )?;
        let key = read_pem(user.client_key_data, user.client_key, base_dir, "client-key")?;
        let identity_pem = match (cert, key) {
            (Some(mut cert), Some(key)) => {
                cert.push(b'\n');
                cert.extend_from_slice(&key);
                Some(cert)
            }
            (None, None) => None,
            _ => {
                return Err(StoreError::config(
                    "kubeconfig user needs both client-certificate and client-key",
                ))
            }
        };

        Ok(Self {
            context: context_name,
            server: cluster.server,
            ca_pem,
            token,
            identity_pem,
        })
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "kebab-case")]
struct Kubeconfig {
    #[serde(default)]
    current_context: Option<String>,

    #[serde(default)]
    clusters: Vec<NamedCluster>,

    #[serde(default)]
    contexts: Vec<NamedContext>,

    #[serde(default)]
    users: Vec<NamedUser>,
}

#[derive(Deserialize)]
struct NamedCluster {
    name: String,
    cluster: ClusterEntry,
}

#[derive(Deserialize)]
#[serde(rename_all = "kebab-case")]
struct ClusterEntry {
    server: String,

    #[serde(default)]
    certificate_authority: Option<PathBuf>,

    #[serde(default)]
    certificate_authority_data: Option<String>,
}

#[derive(Deserialize)]
struct NamedContext {
    name: String,
    context: ContextEntry,
}

#[derive(Deserialize)]
struct ContextEntry {
    cluster: String,

    #[serde(default)]
    user: Option<String>,
}

#[derive(Deserialize)]
struct NamedUser {
    name: String,

    #[serde(default)]
    user: UserEntry,
}

/// No `Debug`: holds credentials.
#[derive(Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct UserEntry {
    #[serde(default)]
    token: Option<String>,

    #[serde(default, rename = "tokenFile")]
    token_file: Option<PathBuf>,

    #[serde(default)]
    client_certificate: Option<PathBuf>,

    #[serde(default)]
    client_certificate_data: Option<String>,

    #[serde(default)]
    client_key: Option<PathBuf>,

    #[serde(default)]
    client_key_data: Option<String>,
}

fn resolve(base_dir: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}

/// Inline base64 `data` wins over a file reference.
fn read_pem(
    data: Option<String>,
    file: Option<PathBuf>,
    base_dir: &Path,
    what: &str,
) -> StoreResult<Option<Vec<u8>>> {
    if let Some(data) = data.filter(|d| !d.is_empty()) {
        let pem = STANDARD.decode(data.trim().as_bytes()).map_err(|e| {
            StoreError::config(format!("kubeconfig {}-data is not base64: {}", what, e))
        })?;
        return Ok(Some(pem));
    }

    match file {
        Some(file) => {
            let path = resolve(base_dir, &file);
            std::fs::read(&path).map(Some).map_err(|e| {
                StoreError::config(format!(
                    "failed to read kubeconfig {} {}: {}",
                    what,
                    path.display(),
                    e
                ))
            })
        }
        None => Ok(None),
    }
}
