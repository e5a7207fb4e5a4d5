//! Manager flows over the cluster store, against a mock API server.

use ksm_secrets::{ClusterSecretStore, ErrorKind, SecretError, SecretManager, SecretRecord};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{any, body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const COLLECTION: &str = "/api/v1/namespaces/default/secrets";
const DB_CREDS: &str = "/api/v1/namespaces/default/secrets/db-creds";

fn manager_for(server: &MockServer) -> SecretManager {
    let store = ClusterSecretStore::new(&server.uri(), Duration::from_secs(5))
        .unwrap()
        .with_token("test-token");
    SecretManager::new(Arc::new(store))
}

/// `password` is base64 for the value given.
fn wire_secret(version: &str, password_b64: &str) -> Value {
    json!({
        "apiVersion": "v1",
        "kind": "Secret",
        "metadata": {
            "name": "db-creds",
            "namespace": "default",
            "resourceVersion": version,
            "creationTimestamp": "2024-05-01T12:00:00Z"
        },
        "type": "Opaque",
        "data": { "password": password_b64 }
    })
}

#[tokio::test]
async fn test_create_checks_then_posts() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(DB_CREDS))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(COLLECTION))
        .and(header("authorization", "Bearer test-token"))
        .and(body_partial_json(json!({
            "metadata": { "name": "db-creds", "namespace": "default" },
            "type": "Opaque",
            "data": { "password": "eA==" }
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(wire_secret("1", "eA==")))
        .expect(1)
        .mount(&server)
        .await;

    let created = manager_for(&server)
        .create(SecretRecord::new("default", "db-creds").with_entry("password", "x"))
        .await
        .unwrap();
    assert_eq!(created.resource_version.as_deref(), Some("1"));
    assert_eq!(created.entries["password"], "x");
    assert!(created.created_at.is_some());
}

#[tokio::test]
async fn test_create_existing_skips_post() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(DB_CREDS))
        .respond_with(ResponseTemplate::new(200).set_body_json(wire_secret("1", "eA==")))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let err = manager_for(&server)
        .create(SecretRecord::new("default", "db-creds").with_entry("password", "x"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AlreadyExists);
}

#[tokio::test]
async fn test_update_carries_version_and_maps_conflict() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(DB_CREDS))
        .respond_with(ResponseTemplate::new(200).set_body_json(wire_secret("41", "eA==")))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(DB_CREDS))
        .and(body_partial_json(json!({
            "metadata": { "resourceVersion": "41" },
            "data": { "password": "eQ==" }
        })))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "kind": "Status",
            "message": "the object has been modified"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let err = manager_for(&server)
        .update(SecretRecord::new("default", "db-creds").with_entry("password", "y"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
}

#[tokio::test]
async fn test_server_failure_is_internal() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(DB_CREDS))
        .respond_with(ResponseTemplate::new(500).set_body_string("etcd unavailable"))
        .mount(&server)
        .await;

    let err = manager_for(&server).get("default", "db-creds").await.unwrap_err();
    assert!(matches!(err, SecretError::Internal(_)));
    assert!(err.to_string().contains("etcd unavailable"), "got: {}", err);
}

#[tokio::test]
async fn test_get_value_and_list() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(DB_CREDS))
        .respond_with(ResponseTemplate::new(200).set_body_json(wire_secret("3", "eA==")))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(COLLECTION))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "kind": "SecretList",
            "items": [wire_secret("3", "eA==")]
        })))
        .mount(&server)
        .await;

    let manager = manager_for(&server);
    assert_eq!(
        manager.get_value("default", "db-creds", "password").await.unwrap(),
        "x"
    );
    let missing = manager
        .get_value("default", "db-creds", "username")
        .await
        .unwrap_err();
    assert_eq!(missing.kind(), ErrorKind::NotFound);

    let records = manager.list("default").await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].name, "db-creds");
}

#[tokio::test]
async fn test_dot_names_do_not_touch_the_collection() {
    let server = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "items": [] })))
        .expect(0)
        .mount(&server)
        .await;

    let manager = manager_for(&server);
    let err = manager.delete("default", "..").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    let err = manager.get("default", "..").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    let err = manager.delete("..", "db-creds").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(manager.list("..").await.unwrap().is_empty());
}
