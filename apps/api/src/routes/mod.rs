pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::jobs::handlers as jobs;
use crate::screening::handlers as screening;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/health", get(health::health_handler))
        // Jobs API
        .route(
            "/api/v1/jobs",
            post(jobs::handle_create_job).get(jobs::handle_list_jobs),
        )
        .route(
            "/api/v1/jobs/:id",
            get(jobs::handle_get_job).delete(jobs::handle_delete_job),
        )
        // Screening API
        .route(
            "/api/v1/jobs/:id/upload",
            post(screening::handle_upload_resume),
        )
        .route(
            "/api/v1/jobs/:id/candidates",
            get(screening::handle_list_candidates),
        )
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}
