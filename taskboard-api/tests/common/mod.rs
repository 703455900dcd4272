#![allow(dead_code)]

/// Common test utilities for integration tests
///
/// This module provides shared infrastructure for integration tests:
/// - Router over a fresh in-memory store
/// - Request helpers returning status and parsed JSON body
/// - Fixture helpers for users and tasks

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{json, Value};
use std::sync::Arc;
use taskboard_api::app::{build_router, AppState};
use taskboard_api::config::Config;
use taskboard_shared::store::MemoryStore;
use tower::Service as _;

/// Test context containing all necessary resources
pub struct TestContext {
    pub store: Arc<MemoryStore>,
    pub app: axum::Router,
}

impl TestContext {
    /// Creates a new test context with an empty store
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let state = AppState::new(store.clone(), Config::default());
        let app = build_router(state);

        TestContext { store, app }
    }

    /// Sends a request and returns status plus JSON body
    pub async fn request(&self, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(value) => {
                builder = builder.header("content-type", "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };

        let response = self
            .app
            .clone()
            .call(builder.body(body).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| panic!("Non-JSON body: {}", String::from_utf8_lossy(&bytes)))
        };

        (status, json)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.request("GET", uri, None).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.request("POST", uri, Some(body)).await
    }

    pub async fn put(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.request("PUT", uri, Some(body)).await
    }

    pub async fn delete(&self, uri: &str) -> (StatusCode, Value) {
        self.request("DELETE", uri, None).await
    }

    /// Creates a user and returns its serialized form
    pub async fn create_user(&self, name: &str, email: &str, pending: Value) -> Value {
        let (status, body) = self
            .post(
                "/api/users",
                json!({ "name": name, "email": email, "pendingTasks": pending }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create user failed: {}", body);
        body["data"].clone()
    }

    /// Creates a task and returns its serialized form
    pub async fn create_task(&self, name: &str, assigned_user: &str) -> Value {
        let (status, body) = self
            .post(
                "/api/tasks",
                json!({ "name": name, "deadline": future_deadline(), "assignedUser": assigned_user }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create task failed: {}", body);
        body["data"].clone()
    }

    pub async fn fetch_user(&self, id: &Value) -> Value {
        let (status, body) = self.get(&format!("/api/users/{}", as_str(id))).await;
        assert_eq!(status, StatusCode::OK);
        body["data"].clone()
    }

    pub async fn fetch_task(&self, id: &Value) -> Value {
        let (status, body) = self.get(&format!("/api/tasks/{}", as_str(id))).await;
        assert_eq!(status, StatusCode::OK);
        body["data"].clone()
    }
}

/// A deadline a week from now, RFC 3339
pub fn future_deadline() -> String {
    (chrono::Utc::now() + chrono::Duration::days(7)).to_rfc3339()
}

pub fn as_str(value: &Value) -> &str {
    value.as_str().expect("expected a string id")
}
