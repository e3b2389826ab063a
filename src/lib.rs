//! # task-master
//!
//! Task management over HTTP.
//!
//! ## Overview
//!
//! - **Domain**: the task record, its workflow status, priority and due date
//! - **Infrastructure**: the task store, in memory or as `PostgreSQL` JSONB documents
//! - **API**: the `/api/tasks` REST surface built on axum
//! - **Client**: an HTTP client with a local cache, filtered views and forms
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use task_master::api::{AppState, create_router};
//! use task_master::infrastructure::InMemoryTaskRepository;
//!
//! # async fn run() -> std::io::Result<()> {
//! let state = AppState::new(Arc::new(InMemoryTaskRepository::new()));
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:5000").await?;
//! axum::serve(listener, create_router(state)).await
//! # }
//! ```

#![forbid(unsafe_code)]

pub mod api;
pub mod client;
pub mod domain;
pub mod infrastructure;
