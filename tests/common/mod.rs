//! Common helpers for integration tests.
//!
//! # Note
//!
//! `#![allow(dead_code)]` is needed because each integration test file is
//! compiled as its own crate and uses only part of these helpers.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::Value;
use tokio::net::TcpListener;
use tower::ServiceExt;

use task_master::api::{AppState, create_router};
use task_master::client::{ClientConfig, HttpTaskApi};
use task_master::domain::{NewTask, Task};
use task_master::infrastructure::{InMemoryTaskRepository, TaskRepository};

// =============================================================================
// Application Helpers
// =============================================================================

/// Router over a fresh in-memory store, together with the store.
pub fn create_test_app() -> (Router, InMemoryTaskRepository) {
    let repository = InMemoryTaskRepository::new();
    let state = AppState::new(Arc::new(repository.clone()));
    (create_router(state), repository)
}

/// Inserts a task directly into the store.
pub async fn seed_task(repository: &InMemoryTaskRepository, draft: NewTask) -> Task {
    repository.insert(draft).await.unwrap()
}

/// Sends one request through the router and decodes the JSON body, if any.
pub async fn send(
    router: &Router,
    method: &str,
    uri: &str,
    body: Option<&str>,
) -> (StatusCode, Option<Value>) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .unwrap();

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = (!bytes.is_empty()).then(|| serde_json::from_slice(&bytes).unwrap());
    (status, json)
}

// =============================================================================
// Live Server Helpers
// =============================================================================

/// Serves a fresh in-memory app on an ephemeral local port.
pub async fn spawn_server() -> (SocketAddr, InMemoryTaskRepository) {
    let (router, repository) = create_test_app();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    (address, repository)
}

/// HTTP client pointed at a spawned server.
pub fn client_for(address: SocketAddr) -> HttpTaskApi {
    let config = ClientConfig::new(format!("http://{address}/api")).unwrap();
    HttpTaskApi::new(config).unwrap()
}
