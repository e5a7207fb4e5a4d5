//! Cluster-backed secret store.
//!
//! Talks to a Kubernetes-style REST API:
//!
//! ```text
//! GET    /api/v1/namespaces/{ns}/secrets
//! POST   /api/v1/namespaces/{ns}/secrets
//! GET    /api/v1/namespaces/{ns}/secrets/{name}
//! PUT    /api/v1/namespaces/{ns}/secrets/{name}
//! DELETE /api/v1/namespaces/{ns}/secrets/{name}
//! ```
//!
//! Entry values travel base64-encoded in `data`. The version token is
//! `metadata.resourceVersion`; sending it on `PUT` makes the write
//! conditional and the server answers `409` when it is stale.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use ksm_core::config::StoreSettings;
use ksm_core::{env, paths, SecretString};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use url::Url;

use crate::error::StoreError;
use crate::kubeconfig::KubeconfigConnection;
use crate::store::{SecretStore, StoreResult};
use crate::types::SecretRecord;

/// `SecretStore` implementation over the cluster secret API.
pub struct ClusterSecretStore {
    client: Client,
    api_base: Url,
    token: Option<SecretString>,
    timeout: Duration,
}

impl ClusterSecretStore {
    /// Create a store for `api_server` with a per-request timeout.
    pub fn new(api_server: &str, timeout: Duration) -> StoreResult<Self> {
        Self::build(api_server, timeout, None, None)
    }

    /// Build a store from the `store` config section.
    ///
    /// The connection comes from, in order:
    /// - `in_cluster`: `KUBERNETES_SERVICE_HOST`/`KUBERNETES_SERVICE_PORT`
    ///   and the service-account token and CA mount;
    /// - the current context of `kubeconfig`, or of `~/.kube/config` when
    ///   no `api_server` is given and that file exists.
    ///
    /// Explicit `api_server`, `token`, `token_file` and `ca_file` settings
    /// override whatever was discovered.
    pub fn from_settings(settings: &StoreSettings) -> StoreResult<Self> {
        Self::connect(settings, paths::default_kubeconfig())
    }

    fn connect(settings: &StoreSettings, default_kubeconfig: Option<PathBuf>) -> StoreResult<Self> {
        let mut api_server = settings.api_server.clone();
        let mut token = settings.token.clone();
        let mut token_file = settings.token_file.clone();
        let mut ca_file = settings.ca_file.clone();
        let mut ca_pem = None;
        let mut identity_pem = None;

        if settings.in_cluster {
            if api_server.is_none() {
                api_server = Some(in_cluster_api_server()?);
            }
            token_file = token_file.or_else(|| Some(PathBuf::from(paths::SERVICE_ACCOUNT_TOKEN)));
            ca_file = ca_file.or_else(|| Some(PathBuf::from(paths::SERVICE_ACCOUNT_CA)));
        } else if settings.kubeconfig.is_some() || api_server.is_none() {
            let kube = load_kubeconfig(settings.kubeconfig.as_deref(), default_kubeconfig)?;
            if let Some(kube) = kube {
                debug!(context = %kube.context, server = %kube.server, "using kubeconfig context");
                api_server = api_server.or(Some(kube.server));
                ca_pem = kube.ca_pem;
                identity_pem = kube.identity_pem;
                if token.is_none() && token_file.is_none() {
                    token = kube.token;
                }
            }
        }

        let api_server = api_server.ok_or_else(|| {
            StoreError::config(
                "no API server configured; set store.api_server, store.kubeconfig \
                 or store.in_cluster",
            )
        })?;

        if let Some(path) = ca_file {
            ca_pem = Some(read_file(&path, "CA bundle")?);
        }

        let mut store = Self::build(
            &api_server,
            Duration::from_secs(settings.timeout_secs),
            ca_pem.as_deref(),
            identity_pem.as_deref(),
        )?;

        let token = match (token, token_file) {
            (Some(token), _) => Some(token),
            (None, Some(path)) => Some(SecretString::from_file(&path).map_err(|e| {
                StoreError::config(format!("failed to read token file {}: {}", path.display(), e))
            })?),
            (None, None) => None,
        };
        if let Some(token) = token {
            store = store.with_token(token);
        }

        debug!(
            api_server = %store.api_base,
            in_cluster = settings.in_cluster,
            "configured cluster store"
        );
        Ok(store)
    }

    fn build(
        api_server: &str,
        timeout: Duration,
        ca_pem: Option<&[u8]>,
        identity_pem: Option<&[u8]>,
    ) -> StoreResult<Self> {
        let api_base = Url::parse(api_server).map_err(|e| {
            StoreError::config(format!("invalid API server URL '{}': {}", api_server, e))
        })?;
        if api_base.cannot_be_a_base() {
            return Err(StoreError::config(format!(
                "API server URL '{}' cannot carry a path",
                api_server
            )));
        }

        let mut builder = Client::builder().timeout(timeout);
        if let Some(pem) = ca_pem {
            let cert = reqwest::Certificate::from_pem(pem)
                .map_err(|e| StoreError::config(format!("invalid CA bundle: {}", e)))?;
            builder = builder.add_root_certificate(cert);
        }
        if let Some(pem) = identity_pem {
            let identity = reqwest::Identity::from_pem(pem)
                .map_err(|e| StoreError::config(format!("invalid client certificate: {}", e)))?;
            builder = builder.identity(identity);
        }
        let client = builder
            .build()
            .map_err(|e| StoreError::config(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_base,
            token: None,
            timeout,
        })
    }

    /// Authenticate every request with a bearer token.
    pub fn with_token(mut self, token: impl Into<SecretString>) -> Self {
        let token = token.into();
        self.token = (!token.is_empty()).then_some(token);
        self
    }

    /// URL of the secrets collection, or of one secret.
    ///
    /// `.` and `..` would be read as path navigation and address the
    /// collection or another resource, so no object by that name can be
    /// reached; they are reported as `NotFound`.
    fn secrets_url(&self, namespace: &str, name: Option<&str>) -> StoreResult<Url> {
        let relative = |segment: &str| segment == "." || segment == "..";
        if relative(namespace) || name.map_or(false, relative) {
            return Err(StoreError::not_found(namespace, name.unwrap_or_default()));
        }

        let mut url = self.api_base.clone();
        // `build` rejects cannot-be-a-base URLs, so segments are always available.
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(["api", "v1", "namespaces", namespace, "secrets"]);
            if let Some(name) = name {
                segments.push(name);
            }
        }
        Ok(url)
    }

    async fn send(&self, request: RequestBuilder) -> StoreResult<Response> {
        let request = match &self.token {
            Some(token) => request.bearer_auth(token.expose_secret()),
            None => request,
        };
        request.send().await.map_err(|e| self.transport_error(e))
    }

    fn transport_error(&self, e: reqwest::Error) -> StoreError {
        if e.is_timeout() {
            StoreError::Timeout(self.timeout)
        } else {
            StoreError::Transport(e.to_string())
        }
    }

    async fn read_secret(&self, response: Response, namespace: &str) -> StoreResult<SecretRecord> {
        let body = response.bytes().await.map_err(|e| self.transport_error(e))?;
        let wire: WireSecret =
            serde_json::from_slice(&body).map_err(|e| StoreError::Malformed(e.to_string()))?;
        wire.into_record(namespace)
    }
}

#[async_trait]
impl SecretStore for ClusterSecretStore {
    async fn get(&self, namespace: &str, name: &str) -> StoreResult<SecretRecord> {
        debug!(namespace, name, "GET secret");
        let url = self.secrets_url(namespace, Some(name))?;
        let response = self.send(self.client.get(url)).await?;

        match response.status() {
            s if s.is_success() => self.read_secret(response, namespace).await,
            StatusCode::NOT_FOUND => Err(StoreError::not_found(namespace, name)),
            _ => Err(status_error(response).await),
        }
    }

    async fn create(&self, record: &SecretRecord) -> StoreResult<SecretRecord> {
        debug!(namespace = %record.namespace, name = %record.name, "POST secret");
        let url = self.secrets_url(&record.namespace, None)?;
        let body = WireSecret::from_record(record, None);
        let response = self.send(self.client.post(url).json(&body)).await?;

        match response.status() {
            s if s.is_success() => self.read_secret(response, &record.namespace).await,
            StatusCode::CONFLICT => {
                Err(StoreError::already_exists(&record.namespace, &record.name))
            }
            StatusCode::NOT_FOUND => Err(StoreError::not_found(&record.namespace, &record.name)),
            _ => Err(status_error(response).await),
        }
    }

    async fn update(
        &self,
        record: &SecretRecord,
        expected_version: Option<&str>,
    ) -> StoreResult<SecretRecord> {
        debug!(
            namespace = %record.namespace,
            name = %record.name,
            version = ?expected_version,
            "PUT secret"
        );
        let url = self.secrets_url(&record.namespace, Some(&record.name))?;
        let body = WireSecret::from_record(record, expected_version);
        let response = self.send(self.client.put(url).json(&body)).await?;

        match response.status() {
            s if s.is_success() => self.read_secret(response, &record.namespace).await,
            StatusCode::CONFLICT => Err(StoreError::conflict(&record.namespace, &record.name)),
            StatusCode::NOT_FOUND => Err(StoreError::not_found(&record.namespace, &record.name)),
            _ => Err(status_error(response).await),
        }
    }

    async fn delete(&self, namespace: &str, name: &str) -> StoreResult<()> {
        debug!(namespace, name, "DELETE secret");
        let url = self.secrets_url(namespace, Some(name))?;
        let response = self.send(self.client.delete(url)).await?;

        match response.status() {
            s if s.is_success() => Ok(()),
            StatusCode::NOT_FOUND => Err(StoreError::not_found(namespace, name)),
            _ => Err(status_error(response).await),
        }
    }

    async fn list(&self, namespace: &str) -> StoreResult<Vec<SecretRecord>> {
        debug!(namespace, "LIST secrets");
        let url = match self.secrets_url(namespace, None) {
            Ok(url) => url,
            // No namespace can be named `.` or `..`.
            Err(e) if e.is_not_found() => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };
        let response = self.send(self.client.get(url)).await?;

        match response.status() {
            s if s.is_success() => {
                let body = response.bytes().await.map_err(|e| self.transport_error(e))?;
                let list: WireSecretList = serde_json::from_slice(&body)
                    .map_err(|e| StoreError::Malformed(e.to_string()))?;
                list.items
                    .into_iter()
                    .map(|item| item.into_record(namespace))
                    .collect()
            }
            // A namespace that does not exist holds no secrets.
            StatusCode::NOT_FOUND => Ok(Vec::new()),
            _ => Err(status_error(response).await),
        }
    }
}

fn in_cluster_api_server() -> StoreResult<String> {
    let host = env::get_var(env::vars::KUBERNETES_SERVICE_HOST).ok_or_else(|| {
        StoreError::config("in_cluster is set but KUBERNETES_SERVICE_HOST is not")
    })?;
    let port = env::get_var_or(env::vars::KUBERNETES_SERVICE_PORT, "443");
    if host.contains(':') {
        Ok(format!("https://[{}]:{}", host, port))
    } else {
        Ok(format!("https://{}:{}", host, port))
    }
}

fn read_file(path: &Path, what: &str) -> StoreResult<Vec<u8>> {
    std::fs::read(path).map_err(|e| {
        StoreError::config(format!("failed to read {} {}: {}", what, path.display(), e))
    })
}

/// An explicit kubeconfig must be readable; the default one is optional.
fn load_kubeconfig(
    explicit: Option<&Path>,
    default: Option<PathBuf>,
) -> StoreResult<Option<KubeconfigConnection>> {
    match (explicit, default) {
        (Some(path), _) => KubeconfigConnection::load(path).map(Some),
        (None, Some(path)) if path.exists() => KubeconfigConnection::load(&path).map(Some),
        (None, _) => Ok(None),
    }
}

async fn status_error(response: Response) -> StoreError {
    let status = response.status().as_u16();
    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<WireStatus>(&text)
        .ok()
        .and_then(|s| s.message)
        .filter(|m| !m.is_empty())
        .unwrap_or(text);
    warn!(status, %message, "cluster API returned an error");
    StoreError::Status { status, message }
}

/// Secret object as the cluster API encodes it.
///
/// No `Debug`: `data` holds the (encoded) secret values.
#[derive(Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireSecret {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    api_version: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    kind: Option<String>,

    #[serde(default)]
    metadata: WireMetadata,

    #[serde(rename = "type", default, skip_serializing_if = "String::is_empty")]
    secret_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    data: Option<BTreeMap<String, String>>,
}

#[derive(Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireMetadata {
    #[serde(default)]
    name: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    namespace: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    resource_version: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    creation_timestamp: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
struct WireSecretList {
    #[serde(default)]
    items: Vec<WireSecret>,
}

#[derive(Deserialize)]
struct WireStatus {
    #[serde(default)]
    message: Option<String>,
}

impl WireSecret {
    fn from_record(record: &SecretRecord, resource_version: Option<&str>) -> Self {
        let data = record
            .entries
            .iter()
            .map(|(k, v)| (k.clone(), STANDARD.encode(v.as_bytes())))
            .collect();

        Self {
            api_version: Some("v1".to_string()),
            kind: Some("Secret".to_string()),
            metadata: WireMetadata {
                name: record.name.clone(),
                namespace: record.namespace.clone(),
                resource_version: resource_version.map(str::to_string),
                creation_timestamp: None,
            },
            secret_type: record.kind.clone(),
            data: Some(data),
        }
    }

    fn into_record(self, requested_namespace: &str) -> StoreResult<SecretRecord> {
        let mut entries = BTreeMap::new();
        for (key, encoded) in self.data.unwrap_or_default() {
            let bytes = STANDARD.decode(encoded.as_bytes()).map_err(|e| {
                StoreError::Malformed(format!("entry '{}' is not base64: {}", key, e))
            })?;
            let value = String::from_utf8(bytes)
                .map_err(|_| StoreError::Malformed(format!("entry '{}' is not valid UTF-8", key)))?;
            entries.insert(key, value);
        }

        let namespace = if self.metadata.namespace.is_empty() {
            requested_namespace.to_string()
        } else {
            self.metadata.namespace
        };

        Ok(SecretRecord {
            name: self.metadata.name,
            namespace,
            kind: self.secret_type,
            entries,
            resource_version: self.metadata.resource_version,
            created_at: self.metadata.creation_timestamp,
        })
    }
}
