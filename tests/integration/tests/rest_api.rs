//! End-to-end REST lifecycle against the in-memory store.
//!
//! Requests go through the full router (tracing and CORS layers included)
//! via `oneshot`, so no socket is opened.

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use ksm_gateway::build_router;
use ksm_gateway::handlers::{MessageResponse, SecretResponse};
use ksm_gateway::ErrorResponse;
use ksm_secrets::{InMemorySecretStore, SecretManager};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

fn app() -> Router {
    build_router(
        SecretManager::new(Arc::new(InMemorySecretStore::new())),
        true,
    )
}

async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header("content-type", "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    let response = app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

#[tokio::test]
async fn test_create_duplicate_then_get() {
    let app = app();
    let body = json!({
        "name": "db-creds",
        "namespace": "default",
        "data": { "password": "x" }
    });

    let (status, created) = call(&app, "POST", "/api/v1/secrets", Some(body.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    let created: MessageResponse = serde_json::from_value(created).unwrap();
    assert_eq!(created.name, "db-creds");

    let (status, err) = call(&app, "POST", "/api/v1/secrets", Some(body)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    let err: ErrorResponse = serde_json::from_value(err).unwrap();
    assert_eq!(err.error, "already_exists");

    let (status, secret) = call(&app, "GET", "/api/v1/secrets/default/db-creds", None).await;
    assert_eq!(status, StatusCode::OK);
    let secret: SecretResponse = serde_json::from_value(secret).unwrap();
    assert_eq!(secret.kind, "Opaque");
    assert_eq!(secret.data.len(), 1);
    assert_eq!(secret.data["password"], "x");
}

#[tokio::test]
async fn test_full_lifecycle() {
    let app = app();

    let (status, _) = call(
        &app,
        "POST",
        "/api/v1/secrets",
        Some(json!({
            "name": "app-config",
            "namespace": "team-a",
            "type": "Opaque",
            "data": { "host": "db.internal", "port": "5432" }
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, list) = call(&app, "GET", "/api/v1/secrets/team-a", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().unwrap().len(), 1);

    // Full replace: "port" disappears.
    let (status, _) = call(
        &app,
        "PUT",
        "/api/v1/secrets/team-a/app-config",
        Some(json!({ "data": { "host": "db2.internal" } })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, secret) = call(&app, "GET", "/api/v1/secrets/team-a/app-config", None).await;
    let secret: SecretResponse = serde_json::from_value(secret).unwrap();
    assert_eq!(secret.data.len(), 1);
    assert_eq!(secret.data["host"], "db2.internal");

    let (status, _) = call(&app, "DELETE", "/api/v1/secrets/team-a/app-config", None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, err) = call(&app, "GET", "/api/v1/secrets/team-a/app-config", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(err["error"], "not_found");

    let (status, list) = call(&app, "GET", "/api/v1/secrets/team-a", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list, json!([]));
}

#[tokio::test]
async fn test_namespaces_are_isolated() {
    let app = app();
    for namespace in ["team-a", "team-b"] {
        let (status, _) = call(
            &app,
            "POST",
            "/api/v1/secrets",
            Some(json!({
                "name": "shared-name",
                "namespace": namespace,
                "data": { "owner": namespace }
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (_, secret) = call(&app, "GET", "/api/v1/secrets/team-b/shared-name", None).await;
    assert_eq!(secret["data"]["owner"], "team-b");

    let (status, _) = call(&app, "DELETE", "/api/v1/secrets/team-a/shared-name", None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = call(&app, "GET", "/api/v1/secrets/team-b/shared-name", None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_validation_errors_name_the_field() {
    let app = app();
    let cases = [
        (json!({ "namespace": "default", "data": { "k": "v" } }), "name"),
        (json!({ "name": "ok", "namespace": "default", "data": { "-lead": "v" } }), "data"),
        (json!({ "name": "ok", "namespace": "", "data": { "k": "v" } }), "namespace"),
        (json!({ "name": "ok", "namespace": "default", "data": {} }), "data"),
        (json!({ "name": "ok", "namespace": "default", "data": { "API_KEY": "v" } }), "data"),
    ];

    for (body, field) in cases {
        let (status, err) = call(&app, "POST", "/api/v1/secrets", Some(body.clone())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "body: {}", body);
        assert_eq!(err["error"], "validation");
        assert_eq!(err["field"], field, "body: {}", body);
    }

    // Nothing was stored.
    let (_, list) = call(&app, "GET", "/api/v1/secrets/default", None).await;
    assert_eq!(list, json!([]));
}

#[tokio::test]
async fn test_update_missing_is_not_found() {
    let (status, err) = call(
        &app(),
        "PUT",
        "/api/v1/secrets/default/ghost",
        Some(json!({ "data": { "k": "v" } })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(err["error"], "not_found");
}

#[tokio::test]
async fn test_cors_preflight() {
    let request = Request::builder()
        .method("OPTIONS")
        .uri("/api/v1/secrets")
        .header("origin", "http://localhost:3000")
        .header("access-control-request-method", "POST")
        .body(Body::empty())
        .unwrap();
    let response = app().oneshot(request).await.unwrap();
    assert!(response.status().is_success());
    assert!(response
        .headers()
        .contains_key("access-control-allow-origin"));
}
