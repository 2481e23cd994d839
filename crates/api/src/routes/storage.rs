//! Route definitions for the `/storage` resource.
//!
//! All endpoints require authentication.

use axum::routing::post;
use axum::Router;

use crate::handlers::storage;
use crate::state::AppState;

/// Routes mounted at `/storage`.
///
/// ```text
/// POST   /upload-url    -> upload_url
/// POST   /download-url  -> download_url
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/upload-url", post(storage::upload_url))
        .route("/download-url", post(storage::download_url))
}
