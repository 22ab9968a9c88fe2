//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use httpmock::MockServer;
use jsonwebtoken::{EncodingKey, Header, encode};
use serde_json::{Value, json};

use tcw_core::auth::client::AuthClient;
use tcw_core::config::AuthConfig;
use tcw_core::models::auth::{SessionRecord, User};
use tcw_core::profile;
use tcw_core::session::SessionController;
use tcw_core::storage::{MemoryStore, SessionStore};

pub const TOKEN_PATH: &str = "/connect/token";
pub const PROFILE_PATH: &str = "/api/user/current";

/// Signed token whose `exp` is `secs` from now.
pub fn token_expiring_in(secs: i64) -> String {
    let exp = (Utc::now() + chrono::Duration::seconds(secs)).timestamp();
    encode(
        &Header::default(),
        &json!({"sub": "1", "exp": exp, "client_id": "web_client"}),
        &EncodingKey::from_secret(b"test-secret"),
    )
    .unwrap()
}

/// Rich-shape profile for alice.
pub fn alice_profile() -> Value {
    json!({
        "id": 1,
        "fullName": "Alice Smith",
        "email": "alice@x.com",
        "roles": [1],
        "menuItems": [{
            "id": 1,
            "key": "home",
            "name": "Home",
            "menuType": 1,
            "isActive": true,
            "isAvailable": true,
            "order": 0
        }]
    })
}

/// Flat-shape profile for bob.
pub fn bob_profile() -> Value {
    json!({
        "id": "u-bob",
        "username": "bob",
        "email": "bob@example.com",
        "firstName": "Bob",
        "lastName": "Builder",
        "roles": ["admin"],
        "permissions": ["orders.read"]
    })
}

pub fn user_from(profile_json: Value) -> User {
    profile::transform(profile::parse_profile(profile_json).unwrap())
}

pub struct Harness {
    pub server: MockServer,
    pub backend: Arc<MemoryStore>,
    pub store: SessionStore,
    pub client: Arc<AuthClient>,
}

impl Harness {
    pub async fn start() -> Self {
        Self::start_with(|config| config).await
    }

    pub async fn start_with(customize: impl FnOnce(AuthConfig) -> AuthConfig) -> Self {
        let server = MockServer::start_async().await;
        let config = customize(AuthConfig::default().with_base_url(&server.base_url()));
        let backend = Arc::new(MemoryStore::new());
        let store = SessionStore::new(backend.clone(), &config.storage_namespace);
        let client = Arc::new(AuthClient::new(config, store.clone()).unwrap());
        Self {
            server,
            backend,
            store,
            client,
        }
    }

    /// Persist a session as a previous run would have.
    pub fn seed_session(&self, token: &str, profile_json: Value) {
        self.store.persist(&SessionRecord {
            token: token.to_string(),
            user: user_from(profile_json),
            token_expiry: Utc::now() + chrono::Duration::hours(1),
        });
    }

    pub fn controller(&self) -> SessionController {
        SessionController::new(self.client.clone())
    }
}

/// Fast validation interval for controller tests.
pub fn fast_revalidate(config: AuthConfig) -> AuthConfig {
    AuthConfig {
        revalidate_interval: Duration::from_millis(50),
        ..config
    }
}
