//! Integration tests for the admin HTTP client

#![cfg(feature = "client")]

use goftr_admin_core::storage::{ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY};
use goftr_admin_core::{
    CredentialPair, KeyValueStore, LoginRequest, MemoryStore, TokenStore, UpdateUserRequest,
    UserStatus,
};
use goftr_admin_http::{AdminClient, ClientError};
use serde_json::json;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

struct Harness {
    client: AdminClient,
    backend: Arc<MemoryStore>,
    auth_failures: Arc<AtomicUsize>,
}

fn harness(server: &MockServer, tokens: Option<(&str, &str)>) -> Harness {
    let backend = Arc::new(MemoryStore::new());
    let store = TokenStore::new(backend.clone());
    if let Some((access, refresh)) = tokens {
        store.save(&CredentialPair::new(access, refresh)).unwrap();
    }

    let auth_failures = Arc::new(AtomicUsize::new(0));
    let counter = auth_failures.clone();
    let client = AdminClient::builder()
        .base_url(server.uri())
        .token_store(store)
        .on_auth_failure(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .build()
        .unwrap();

    Harness {
        client,
        backend,
        auth_failures,
    }
}

fn profile_body(id: i64, role: &str) -> serde_json::Value {
    json!({
        "success": true,
        "data": {
            "id": id,
            "email": "ada@example.com",
            "first_name": "Ada",
            "last_name": "Lovelace",
            "role": role,
            "active": "active"
        }
    })
}

fn token_body(access: &str, refresh: &str) -> serde_json::Value {
    json!({
        "success": true,
        "data": { "access_token": access, "refresh_token": refresh, "expires_in": 86400 }
    })
}

#[tokio::test]
async fn test_client_builder() {
    let client = AdminClient::builder()
        .base_url("http://localhost:3005/api/v1/")
        .build()
        .unwrap();
    assert_eq!(client.base_url(), "http://localhost:3005/api/v1");
}

#[tokio::test]
async fn test_client_builder_requires_base_url() {
    let result = AdminClient::builder().build();
    assert!(matches!(result, Err(ClientError::Configuration(_))));
}

#[tokio::test]
async fn test_attaches_bearer_token_and_unwraps_envelope() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/me"))
        .and(header("authorization", "Bearer A1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(profile_body(7, "admin")))
        .expect(1)
        .mount(&server)
        .await;

    let h = harness(&server, Some(("A1", "R1")));
    let profile = h.client.me().await.unwrap();

    assert_eq!(profile.id, 7);
    assert!(profile.is_admin());
    assert_eq!(profile.status, Some(UserStatus::Active));
}

#[tokio::test]
async fn test_no_authorization_header_without_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users"))
        .and(|req: &Request| !req.headers.contains_key("authorization"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [] })))
        .expect(1)
        .mount(&server)
        .await;

    let h = harness(&server, None);
    assert!(h.client.list_users().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_single_401_is_refreshed_and_retried_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/me"))
        .and(header("authorization", "Bearer A0"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .and(body_json(json!({ "refresh_token": "R0" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("A1", "R1")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/users/me"))
        .and(header("authorization", "Bearer A1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(profile_body(3, "user")))
        .expect(1)
        .mount(&server)
        .await;

    let h = harness(&server, Some(("A0", "R0")));
    let profile = h.client.me().await.unwrap();

    assert_eq!(profile.id, 3);
    assert_eq!(
        h.client.tokens().read().unwrap(),
        Some(CredentialPair::new("A1", "R1"))
    );
    assert_eq!(h.auth_failures.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_401_on_retry_propagates_without_looping() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/me"))
        .respond_with(ResponseTemplate::new(401))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("A1", "R1")))
        .expect(1)
        .mount(&server)
        .await;

    let h = harness(&server, Some(("A0", "R0")));
    let result = h.client.me().await;

    assert!(matches!(result, Err(ClientError::AuthenticationFailed(_))));
    assert_eq!(h.auth_failures.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_401_without_refresh_token_clears_session() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/me"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("A1", "R1")))
        .expect(0)
        .mount(&server)
        .await;

    let h = harness(&server, None);
    h.backend.set(ACCESS_TOKEN_KEY, "A0").unwrap();

    let result = h.client.me().await;

    assert!(matches!(result, Err(ClientError::AuthenticationFailed(_))));
    assert!(h.backend.is_empty());
    assert_eq!(h.auth_failures.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_failed_refresh_returns_original_error_and_clears_session() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/users/9"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "success": false,
            "error": { "code": 401, "message": "Token expired" }
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let h = harness(&server, Some(("A0", "R0")));
    let result = h.client.delete_user(9).await;

    match result {
        Err(ClientError::AuthenticationFailed(message)) => assert_eq!(message, "Token expired"),
        other => panic!("expected original 401, got {other:?}"),
    }
    assert_eq!(h.backend.get(ACCESS_TOKEN_KEY).unwrap(), None);
    assert_eq!(h.backend.get(REFRESH_TOKEN_KEY).unwrap(), None);
    assert_eq!(h.auth_failures.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_concurrent_401s_share_one_refresh() {
    let server = MockServer::start().await;
    Mock::given(header("authorization", "Bearer A0"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(token_body("A1", "R1"))
                .set_delay(Duration::from_millis(100)),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/users/me"))
        .and(header("authorization", "Bearer A1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(profile_body(1, "admin")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/users"))
        .and(header("authorization", "Bearer A1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [] })))
        .expect(1)
        .mount(&server)
        .await;

    let h = harness(&server, Some(("A0", "R0")));
    let (profile, users) = tokio::join!(h.client.me(), h.client.list_users());

    assert_eq!(profile.unwrap().id, 1);
    assert!(users.unwrap().is_empty());
    assert_eq!(h.auth_failures.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_login_401_is_not_intercepted() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .and(|req: &Request| !req.headers.contains_key("authorization"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "success": false,
            "error": { "code": 401, "message": "Invalid credentials" }
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("A1", "R1")))
        .expect(0)
        .mount(&server)
        .await;

    let h = harness(&server, Some(("A0", "R0")));
    let result = h
        .client
        .login(&LoginRequest {
            email: "ada@example.com".into(),
            password: "wrong-password".into(),
        })
        .await;

    assert!(matches!(result, Err(ClientError::AuthenticationFailed(_))));
    assert_eq!(
        h.client.tokens().read().unwrap(),
        Some(CredentialPair::new("A0", "R0"))
    );
    assert_eq!(h.auth_failures.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_login_returns_pair_without_storing_it() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .and(body_json(json!({ "email": "ada@example.com", "password": "correct-horse" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("A1", "R1")))
        .mount(&server)
        .await;

    let h = harness(&server, None);
    let pair = h
        .client
        .login(&LoginRequest {
            email: "ada@example.com".into(),
            password: "correct-horse".into(),
        })
        .await
        .unwrap();

    assert_eq!(pair, CredentialPair::new("A1", "R1"));
    assert!(h.backend.is_empty());
}

#[tokio::test]
async fn test_error_envelope_message_is_surfaced() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/users/5"))
        .and(body_json(json!({ "email": "taken@example.com" })))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "success": false,
            "error": { "code": 409, "message": "Record already exists", "details": "email" }
        })))
        .mount(&server)
        .await;

    let h = harness(&server, Some(("A1", "R1")));
    let result = h
        .client
        .update_user(
            5,
            &UpdateUserRequest {
                email: Some("taken@example.com".into()),
                ..Default::default()
            },
        )
        .await;

    match result {
        Err(ClientError::Conflict(message)) => assert_eq!(message, "Record already exists: email"),
        other => panic!("expected conflict, got {other:?}"),
    }
}

#[tokio::test]
async fn test_forbidden_is_returned_unchanged() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users"))
        .respond_with(ResponseTemplate::new(403).set_body_string("Forbidden"))
        .mount(&server)
        .await;

    let h = harness(&server, Some(("A1", "R1")));
    let result = h.client.list_users().await;

    assert!(matches!(result, Err(ClientError::Forbidden(_))));
    assert_eq!(result.unwrap_err().status(), Some(403));
    assert_eq!(h.backend.len(), 2);
}

#[tokio::test]
async fn test_unit_responses_ignore_missing_data() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/logout"))
        .and(header("authorization", "Bearer A1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "success": true, "message": "bye" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let h = harness(&server, Some(("A1", "R1")));
    h.client.logout().await.unwrap();
}

#[tokio::test]
async fn test_refresh_is_sent_without_bearer_and_leaves_store_alone() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .and(body_json(json!({ "refresh_token": "R0" })))
        .and(|req: &Request| !req.headers.contains_key("authorization"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("A1", "R1")))
        .expect(1)
        .mount(&server)
        .await;

    let h = harness(&server, Some(("A0", "R0")));
    let pair = h.client.refresh("R0").await.unwrap();

    assert_eq!(pair, CredentialPair::new("A1", "R1"));
    assert_eq!(
        h.client.tokens().read().unwrap(),
        Some(CredentialPair::new("A0", "R0"))
    );
}

#[tokio::test]
async fn test_rejected_refresh_does_not_trigger_another_refresh() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let h = harness(&server, Some(("A0", "R0")));
    let result = h.client.refresh("R0").await;

    assert!(matches!(result, Err(ClientError::AuthenticationFailed(_))));
    assert_eq!(h.backend.len(), 2);
    assert_eq!(h.auth_failures.load(Ordering::SeqCst), 0);
}
