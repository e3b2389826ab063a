//! Router assembly.

use axum::Router;
use axum::routing::get;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::handlers::{
    AppState, create_task, delete_task, get_task, health_check, list_tasks, update_task,
};

/// Builds the application router with CORS and request tracing.
///
/// | Method | Path |
/// |---|---|
/// | GET, POST | `/api/tasks` |
/// | GET, PATCH, DELETE | `/api/tasks/{id}` |
/// | GET | `/health` |
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .route("/api/tasks", get(list_tasks).post(create_task))
        .route(
            "/api/tasks/{id}",
            get(get_task).patch(update_task).delete(delete_task),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
