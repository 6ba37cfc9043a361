/// Common test utilities for API tests
///
/// Builds the full router over the in-memory store and drives it through
/// `tower::Service` without binding a socket.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{json, Value};
use std::sync::Arc;
use taskboard_api::app::{build_router, AppState};
use taskboard_api::config::Config;
use taskboard_shared::store::MemoryStore;
use tower::Service as _;
use uuid::Uuid;

pub const TEST_JWT_SECRET: &str = "test-secret-that-is-long-enough-for-hs256";
pub const TEST_PASSWORD: &str = "Passw0rd";

/// Test context: a router over a fresh store
pub struct TestContext {
    pub app: axum::Router,
}

/// A user registered through the API
pub struct TestUser {
    pub id: String,
    pub email: String,
    pub access_token: String,
    pub refresh_token: String,
}

impl TestContext {
    pub fn new() -> Self {
        let state = AppState::new(
            Arc::new(MemoryStore::new()),
            Config::for_tests(TEST_JWT_SECRET),
        );

        Self {
            app: build_router(state),
        }
    }

    /// Sends a request and returns status plus JSON body (`Null` when empty)
    pub async fn send(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }

        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().call(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                panic!(
                    "{} {} returned non-JSON body ({}): {}",
                    method,
                    uri,
                    status,
                    String::from_utf8_lossy(&bytes)
                )
            })
        };

        (status, json)
    }

    /// Registers a user with a unique email
    pub async fn register(&self, name: &str) -> TestUser {
        let email = format!("{}-{}@example.com", name.to_lowercase(), Uuid::new_v4());
        let (status, body) = self
            .send(
                "POST",
                "/auth/register",
                None,
                Some(json!({ "email": email, "password": TEST_PASSWORD, "name": name })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {}", body);

        TestUser {
            id: body["user"]["id"].as_str().unwrap().to_string(),
            email,
            access_token: body["access_token"].as_str().unwrap().to_string(),
            refresh_token: body["refresh_token"].as_str().unwrap().to_string(),
        }
    }

    /// Creates a board and returns its id
    pub async fn create_board(&self, user: &TestUser, name: &str) -> String {
        let (status, body) = self
            .send(
                "POST",
                "/boards",
                Some(&user.access_token),
                Some(json!({ "name": name })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create board failed: {}", body);
        body["id"].as_str().unwrap().to_string()
    }

    /// Creates a column at the end of the board and returns its id
    pub async fn create_column(&self, user: &TestUser, board_id: &str, name: &str) -> String {
        let (status, body) = self
            .send(
                "POST",
                "/columns",
                Some(&user.access_token),
                Some(json!({ "name": name, "board_id": board_id })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create column failed: {}", body);
        body["id"].as_str().unwrap().to_string()
    }

    /// Creates a card at the end of the column and returns its id
    pub async fn create_card(&self, user: &TestUser, column_id: &str, title: &str) -> String {
        let (status, body) = self
            .send(
                "POST",
                "/cards",
                Some(&user.access_token),
                Some(json!({ "title": title, "column_id": column_id })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create card failed: {}", body);
        body["id"].as_str().unwrap().to_string()
    }

    /// Names of the items in a JSON array, by `order`
    pub fn ordered(items: &Value, field: &str) -> Vec<String> {
        let mut items: Vec<&Value> = items.as_array().unwrap().iter().collect();
        items.sort_by_key(|item| item["order"].as_i64().unwrap());
        items
            .iter()
            .map(|item| item[field].as_str().unwrap().to_string())
            .collect()
    }
}
