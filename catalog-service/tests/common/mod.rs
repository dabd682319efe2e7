#![allow(dead_code)]

use std::sync::Arc;

use auth::JwtHandler;
use catalog_service::domain::identity::models::Principal;
use catalog_service::domain::identity::ports::CredentialStore;
use catalog_service::domain::identity::service::AuthService;
use catalog_service::domain::identity::token::TokenProvider;
use catalog_service::domain::identity::users::UserService;
use catalog_service::inbound::http::router::create_router;
use catalog_service::outbound::repositories::InMemoryCredentialStore;
use chrono::Duration;
use serde_json::json;
use serde_json::Value;

pub const JWT_SECRET: &[u8] = b"test-secret-key-for-jwt-signing-at-least-32-bytes";

/// Test application that spawns a real server
pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub store: Arc<InMemoryCredentialStore>,
    pub api_client: reqwest::Client,
    pub token_provider: Arc<TokenProvider>,
}

impl TestApp {
    /// Spawn the application in a background task and return TestApp
    pub async fn spawn() -> Self {
        // Use random port (0 = OS assigns)
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind random port");
        let port = listener.local_addr().unwrap().port();
        let address = format!("http://127.0.0.1:{}", port);

        let store = Arc::new(InMemoryCredentialStore::new());
        let credential_store: Arc<dyn CredentialStore> = store.clone();

        let token_provider = Arc::new(TokenProvider::new(
            JwtHandler::new(JWT_SECRET).expect("Failed to build JWT handler"),
            Duration::hours(24),
        ));

        let auth_service = Arc::new(AuthService::new(
            Arc::clone(&credential_store),
            Arc::clone(&token_provider),
        ));
        let user_service = Arc::new(UserService::new(Arc::clone(&credential_store)));

        let router = create_router(auth_service, user_service, Arc::clone(&token_provider));

        // Spawn server in background
        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("Server error");
        });

        Self {
            address,
            port,
            store,
            api_client: reqwest::Client::new(),
            token_provider,
        }
    }

    pub fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client.get(format!("{}{}", self.address, path))
    }

    pub fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client.post(format!("{}{}", self.address, path))
    }

    pub fn get_authenticated(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.get(path).bearer_auth(token)
    }

    pub fn put_authenticated(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.api_client
            .put(format!("{}{}", self.address, path))
            .bearer_auth(token)
    }

    pub fn delete_authenticated(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.api_client
            .delete(format!("{}{}", self.address, path))
            .bearer_auth(token)
    }

    /// Register through the API and return the response body.
    pub async fn register(&self, username: &str, email: &str, password: &str, role: &str) -> Value {
        let response = self
            .post("/api/auth/register")
            .json(&json!({
                "username": username,
                "email": email,
                "password": password,
                "role": role,
            }))
            .send()
            .await
            .expect("Failed to execute request");
        assert_eq!(response.status(), reqwest::StatusCode::CREATED);
        response.json().await.expect("Failed to parse response")
    }

    /// Log in through the API and return the bearer token.
    pub async fn login(&self, identifier: &str, password: &str) -> String {
        let response = self
            .post("/api/auth/login")
            .json(&json!({ "identifier": identifier, "password": password }))
            .send()
            .await
            .expect("Failed to execute request");
        assert_eq!(response.status(), reqwest::StatusCode::OK);
        let body: Value = response.json().await.expect("Failed to parse response");
        body["data"]["token"]
            .as_str()
            .expect("token missing")
            .to_string()
    }

    /// Register and log in an account, returning its token.
    pub async fn signed_in(&self, username: &str, role: &str) -> String {
        let email = format!("{}@example.com", username);
        self.register(username, &email, "pass_word!", role).await;
        self.login(username, "pass_word!").await
    }

    /// Mint a token directly, bypassing login.
    pub fn token_for(&self, principal: &Principal, issued_at: i64) -> String {
        self.token_provider
            .issue_at(principal, issued_at)
            .expect("Failed to issue token")
            .token
    }
}
