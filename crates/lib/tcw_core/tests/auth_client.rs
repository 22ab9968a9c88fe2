//! Auth client against mocked token and profile endpoints.

mod common;

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use httpmock::prelude::*;
use serde_json::json;

use common::{Harness, PROFILE_PATH, TOKEN_PATH, alice_profile, bob_profile, token_expiring_in};
use tcw_core::auth::capabilities::{has_menu_access, has_permission, has_role};
use tcw_core::auth::client::AuthClient;
use tcw_core::auth::{AuthError, user_message};
use tcw_core::config::{AuthConfig, DEFAULT_ORIGIN};
use tcw_core::models::auth::Credentials;
use tcw_core::storage::{MemoryStore, SessionStore};

fn alice() -> Credentials {
    Credentials::new("alice", "secret")
}

#[tokio::test]
async fn complete_login_end_to_end() {
    let h = Harness::start().await;
    let token_mock = h.server.mock(|when, then| {
        when.method(POST)
            .path(TOKEN_PATH)
            .header("content-type", "application/x-www-form-urlencoded");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!({"access_token": "h.p.s", "expires_in": 3600}));
    });
    let profile_mock = h.server.mock(|when, then| {
        when.method(GET)
            .path(PROFILE_PATH)
            .header("authorization", "Bearer h.p.s");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(alice_profile());
    });

    let before = Utc::now();
    let user = h.client.complete_login(&alice()).await.unwrap();
    token_mock.assert();
    profile_mock.assert();

    assert_eq!(user.id, "1");
    assert_eq!(user.display_name, "Alice Smith");
    assert_eq!(user.initials, "AS");
    assert!(has_role(&user, 1));
    assert!(has_menu_access(&user, "home"));
    assert!(has_permission(&user, "home"));
    assert!(has_permission(&user, "main.home"));

    let record = h.store.load().expect("session persisted");
    assert_eq!(record.token, "h.p.s");
    assert_eq!(record.user, user);
    let lifetime = record.token_expiry - before;
    assert!(lifetime >= chrono::Duration::seconds(3599));
    assert!(lifetime <= chrono::Duration::seconds(3605));
}

#[tokio::test]
async fn profile_failure_persists_nothing() {
    let h = Harness::start().await;
    h.server.mock(|when, then| {
        when.method(POST).path(TOKEN_PATH);
        then.status(200)
            .json_body(json!({"access_token": "h.p.s", "token_type": "Bearer", "expires_in": 3600}));
    });
    h.server.mock(|when, then| {
        when.method(GET).path(PROFILE_PATH);
        then.status(500)
            .json_body(json!({"code": "E500", "message": "database offline"}));
    });

    let err = h.client.complete_login(&alice()).await.unwrap_err();
    match &err {
        AuthError::AuthFailed {
            status,
            code,
            description,
        } => {
            assert_eq!(*status, 500);
            assert_eq!(code.as_deref(), Some("E500"));
            assert_eq!(description.as_deref(), Some("database offline"));
        }
        other => panic!("expected AuthFailed, got {other:?}"),
    }
    assert!(user_message(&err).starts_with("Server error"));
    assert!(h.backend.is_empty());
}

#[tokio::test]
async fn token_rejection_carries_server_error() {
    let h = Harness::start().await;
    h.server.mock(|when, then| {
        when.method(POST).path(TOKEN_PATH);
        then.status(400).json_body(json!({
            "error": "invalid_grant",
            "error_description": "invalid_username_or_password"
        }));
    });
    let err = h.client.request_token(&alice()).await.unwrap_err();
    assert!(matches!(
        &err,
        AuthError::AuthFailed { status: 400, code: Some(c), description: Some(d) }
            if c == "invalid_grant" && d == "invalid_username_or_password"
    ));
    assert!(user_message(&err).starts_with("Invalid username or password"));

    let err = h.client.complete_login(&alice()).await.unwrap_err();
    assert_eq!(err.status(), Some(400));
    assert!(h.backend.is_empty());
}

#[tokio::test]
async fn unknown_status_falls_back_to_server_description() {
    let h = Harness::start().await;
    h.server.mock(|when, then| {
        when.method(POST).path(TOKEN_PATH);
        then.status(418)
            .json_body(json!({"error": "teapot", "error_description": "short and stout"}));
    });

    let err = h.client.request_token(&alice()).await.unwrap_err();
    assert_eq!(user_message(&err), "short and stout");
}

#[tokio::test]
async fn token_response_without_access_token_is_invalid() {
    let h = Harness::start().await;
    h.server.mock(|when, then| {
        when.method(POST).path(TOKEN_PATH);
        then.status(200).json_body(json!({"token_type": "Bearer", "expires_in": 3600}));
    });

    let err = h.client.request_token(&alice()).await.unwrap_err();
    assert!(matches!(err, AuthError::InvalidResponse(_)));
}

#[tokio::test]
async fn enveloped_profile_is_unwrapped() {
    let h = Harness::start().await;
    h.server.mock(|when, then| {
        when.method(GET).path(PROFILE_PATH);
        then.status(200).json_body(json!({
            "success": true,
            "data": bob_profile(),
            "message": null
        }));
    });

    let raw = h.client.fetch_profile("tok").await.unwrap();
    assert_eq!(raw.username.as_deref(), Some("bob"));
    assert_eq!(raw.email.as_deref(), Some("bob@example.com"));
}

#[tokio::test]
async fn failed_envelope_is_invalid_response() {
    let h = Harness::start().await;
    h.server.mock(|when, then| {
        when.method(GET).path(PROFILE_PATH);
        then.status(200).json_body(json!({
            "success": false,
            "data": null,
            "message": "User is disabled"
        }));
    });

    let err = h.client.fetch_profile("tok").await.unwrap_err();
    assert!(matches!(err, AuthError::InvalidResponse(m) if m.contains("User is disabled")));
}

#[tokio::test]
async fn profile_request_sends_expected_headers() {
    let h = Harness::start().await;
    let mock = h.server.mock(|when, then| {
        when.method(GET)
            .path(PROFILE_PATH)
            .header("authorization", "Bearer tok")
            .header("accept", "application/json")
            .header("accept-language", "en")
            .header("cache-control", "no-cache")
            .header("origin", DEFAULT_ORIGIN);
        then.status(200).json_body(bob_profile());
    });

    h.client.fetch_profile("tok").await.unwrap();
    mock.assert();
}

#[tokio::test]
async fn unreachable_server_is_a_network_error() {
    let config = AuthConfig {
        request_timeout: Duration::from_secs(2),
        ..AuthConfig::default().with_base_url("http://127.0.0.1:9")
    };
    let store = SessionStore::new(Arc::new(MemoryStore::new()), "tcw");
    let client = AuthClient::new(config, store).unwrap();

    let err = client.request_token(&alice()).await.unwrap_err();
    assert!(matches!(err, AuthError::Network(_)));
    assert!(user_message(&err).starts_with("Network connection error"));
}

#[tokio::test]
async fn is_authenticated_clears_expired_session() {
    let h = Harness::start().await;
    h.seed_session(&token_expiring_in(-10), alice_profile());
    assert!(h.store.has_token());

    assert!(!h.client.is_authenticated());
    assert!(h.backend.is_empty());
    assert!(h.client.current_user().is_none());
}

#[tokio::test]
async fn valid_session_is_reported() {
    let h = Harness::start().await;
    let token = token_expiring_in(3600);
    h.seed_session(&token, alice_profile());

    assert!(h.client.is_authenticated());
    assert_eq!(h.client.current_token(), Some(token));
    assert_eq!(h.client.current_user().unwrap().display_name, "Alice Smith");
}

#[tokio::test]
async fn token_without_user_is_not_a_session() {
    let h = Harness::start().await;
    h.store.set_token(&token_expiring_in(3600));
    assert!(!h.client.is_authenticated());
    assert!(h.client.current_token().is_none());
}

#[tokio::test]
async fn refresh_profile_requires_a_token() {
    let h = Harness::start().await;
    let err = h.client.refresh_profile().await.unwrap_err();
    assert!(matches!(err, AuthError::NotAuthenticated));
}

#[tokio::test]
async fn refresh_profile_overwrites_stored_user() {
    let h = Harness::start().await;
    let token = token_expiring_in(3600);
    h.seed_session(&token, alice_profile());
    let auth = format!("Bearer {token}");
    h.server.mock(move |when, then| {
        when.method(GET).path(PROFILE_PATH).header("authorization", auth);
        then.status(200).json_body(bob_profile());
    });

    let user = h.client.refresh_profile().await.unwrap();
    assert_eq!(user.display_name, "Bob Builder");
    assert_eq!(h.store.user().unwrap(), user);
    assert_eq!(h.store.token(), Some(token));
}

#[tokio::test]
async fn logout_aborts_in_flight_login() {
    let h = Harness::start().await;
    h.server.mock(|when, then| {
        when.method(POST).path(TOKEN_PATH);
        then.status(200)
            .delay(Duration::from_secs(3))
            .json_body(json!({"access_token": "h.p.s", "expires_in": 3600}));
    });
    h.server.mock(|when, then| {
        when.method(GET).path(PROFILE_PATH);
        then.status(200).json_body(alice_profile());
    });

    let client = h.client.clone();
    let login = tokio::spawn(async move { client.complete_login(&alice()).await });
    tokio::time::sleep(Duration::from_millis(200)).await;
    h.client.logout();

    let result = tokio::time::timeout(Duration::from_secs(2), login)
        .await
        .expect("login resolves promptly after logout")
        .unwrap();
    assert!(matches!(result, Err(AuthError::Cancelled)));
    assert!(h.backend.is_empty());

    // Later requests are not affected by the earlier cancellation.
    h.client.logout();
    assert!(h.client.fetch_profile("tok").await.is_ok());
}

#[tokio::test]
async fn out_of_range_expires_in_is_invalid() {
    let h = Harness::start().await;
    h.server.mock(|when, then| {
        when.method(POST).path(TOKEN_PATH);
        then.status(200)
            .json_body(json!({"access_token": "h.p.s", "expires_in": i64::MAX}));
    });
    h.server.mock(|when, then| {
        when.method(GET).path(PROFILE_PATH);
        then.status(200).json_body(alice_profile());
    });

    let err = h.client.complete_login(&alice()).await.unwrap_err();
    assert!(matches!(err, AuthError::InvalidResponse(_)));
    assert!(h.backend.is_empty());
}

#[tokio::test]
async fn logout_during_refresh_leaves_no_user_behind() {
    let h = Harness::start().await;
    h.seed_session(&token_expiring_in(3600), alice_profile());
    h.server.mock(|when, then| {
        when.method(GET).path(PROFILE_PATH);
        then.status(200)
            .delay(Duration::from_secs(3))
            .json_body(bob_profile());
    });

    let client = h.client.clone();
    let refresh = tokio::spawn(async move { client.refresh_profile().await });
    tokio::time::sleep(Duration::from_millis(200)).await;
    h.client.logout();

    let result = tokio::time::timeout(Duration::from_secs(2), refresh)
        .await
        .expect("refresh resolves promptly after logout")
        .unwrap();
    assert!(matches!(result, Err(AuthError::Cancelled)));
    assert!(h.backend.is_empty());
    assert!(h.store.user().is_none());
}
