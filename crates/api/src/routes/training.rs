//! Route definitions for the `/training` resource.
//!
//! All endpoints require authentication.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::training;
use crate::state::AppState;

/// Routes mounted at `/training`.
///
/// ```text
/// GET    /                    -> list_training
/// POST   /create              -> create_training
/// GET    /{id}                -> get_training
/// POST   /{id}/upload-image   -> upload_image
/// POST   /{id}/start          -> start_training
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(training::list_training))
        .route("/create", post(training::create_training))
        .route("/{id}", get(training::get_training))
        .route("/{id}/upload-image", post(training::upload_image))
        .route("/{id}/start", post(training::start_training))
}
