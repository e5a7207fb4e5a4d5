//! REST handlers for `/api/v1/secrets`.
//!
//! Handlers only translate between JSON and [`SecretRecord`]; every rule
//! lives in [`SecretManager`].

use std::collections::BTreeMap;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use ksm_secrets::{SecretManager, SecretRecord};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ApiResult;

/// Body of `POST /api/v1/secrets`.
#[derive(Debug, Deserialize)]
pub struct CreateSecretRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub namespace: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub data: BTreeMap<String, String>,
}

/// Body of `PUT /api/v1/secrets/:namespace/:name`.
///
/// Any `name`/`namespace` in the body is ignored in favour of the path.
#[derive(Debug, Deserialize)]
pub struct UpdateSecretRequest {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub data: BTreeMap<String, String>,
}

/// A secret as returned by the API.
#[derive(Debug, Serialize, Deserialize)]
pub struct SecretResponse {
    pub name: String,
    pub namespace: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub data: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl From<SecretRecord> for SecretResponse {
    fn from(record: SecretRecord) -> Self {
        Self {
            name: record.name,
            namespace: record.namespace,
            kind: record.kind,
            data: record.entries,
            resource_version: record.resource_version,
            created_at: record.created_at,
        }
    }
}

/// Acknowledgement for writes.
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
    pub name: String,
    pub namespace: String,
}

impl MessageResponse {
    fn new(message: &str, record_namespace: String, record_name: String) -> Self {
        Self {
            message: message.to_string(),
            name: record_name,
            namespace: record_namespace,
        }
    }
}

/// `POST /api/v1/secrets`
pub async fn create_secret(
    State(manager): State<SecretManager>,
    Json(request): Json<CreateSecretRequest>,
) -> ApiResult<(StatusCode, Json<MessageResponse>)> {
    debug!(namespace = %request.namespace, name = %request.name, "create request");
    let record = SecretRecord::new(request.namespace, request.name)
        .with_kind(request.kind)
        .with_entries(request.data);

    let created = manager.create(record).await?;
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new(
            "secret created",
            created.namespace,
            created.name,
        )),
    ))
}

/// `GET /api/v1/secrets/:namespace`
pub async fn list_secrets(
    State(manager): State<SecretManager>,
    Path(namespace): Path<String>,
) -> ApiResult<Json<Vec<SecretResponse>>> {
    let records = manager.list(&namespace).await?;
    Ok(Json(records.into_iter().map(SecretResponse::from).collect()))
}

/// `GET /api/v1/secrets/:namespace/:name`
pub async fn get_secret(
    State(manager): State<SecretManager>,
    Path((namespace, name)): Path<(String, String)>,
) -> ApiResult<Json<SecretResponse>> {
    let record = manager.get(&namespace, &name).await?;
    Ok(Json(record.into()))
}

/// `PUT /api/v1/secrets/:namespace/:name`
pub async fn update_secret(
    State(manager): State<SecretManager>,
    Path((namespace, name)): Path<(String, String)>,
    Json(request): Json<UpdateSecretRequest>,
) -> ApiResult<Json<MessageResponse>> {
    debug!(%namespace, %name, "update request");
    let record = SecretRecord::new(namespace, name)
        .with_kind(request.kind)
        .with_entries(request.data);

    let updated = manager.update(record).await?;
    Ok(Json(MessageResponse::new(
        "secret updated",
        updated.namespace,
        updated.name,
    )))
}

/// `DELETE /api/v1/secrets/:namespace/:name`
pub async fn delete_secret(
    State(manager): State<SecretManager>,
    Path((namespace, name)): Path<(String, String)>,
) -> ApiResult<Json<MessageResponse>> {
    manager.delete(&namespace, &name).await?;
    Ok(Json(MessageResponse::new("secret deleted", namespace, name)))
}

/// `GET /health`
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
