//! Route definitions for the `/jobs` resource.
//!
//! All endpoints require authentication.

use axum::routing::{get, patch, post};
use axum::Router;

use crate::handlers::jobs;
use crate::state::AppState;

/// Routes mounted at `/jobs`.
///
/// ```text
/// POST   /create                  -> create_job
/// PATCH  /{id}                    -> update_job
/// POST   /{id}/dispatch           -> dispatch_job
/// GET    /{id}/status             -> job_status
/// GET    /{id}/backend-status     -> backend_status
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/create", post(jobs::create_job))
        .route("/{id}", patch(jobs::update_job))
        .route("/{id}/dispatch", post(jobs::dispatch_job))
        .route("/{id}/status", get(jobs::job_status))
        .route("/{id}/backend-status", get(jobs::backend_status))
}
