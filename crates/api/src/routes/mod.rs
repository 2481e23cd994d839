pub mod catalog;
pub mod health;
pub mod jobs;
pub mod storage;
pub mod training;

use axum::Router;

use crate::state::AppState;

/// Build the API route tree.
///
/// Route hierarchy:
///
/// ```text
/// /jobs/create                 create job (POST, auth)
/// /jobs/{id}                   update job (PATCH, auth)
/// /jobs/{id}/dispatch          submit to compute backend (POST, auth)
/// /jobs/{id}/status            job record (GET, auth)
/// /jobs/{id}/backend-status    poll backend + reconcile (GET, auth)
///
/// /storage/upload-url          presigned input upload (POST, auth)
/// /storage/download-url        presigned download (POST, auth)
///
/// /training/create             create training job (POST, auth)
/// /training                    list training jobs (GET, auth)
/// /training/{id}               get training job (GET, auth)
/// /training/{id}/upload-image  register training image (POST, auth)
/// /training/{id}/start         start training (POST, auth)
///
/// /loras                       list adapters (GET, public)
/// /loras/categories            category vocabulary (GET, public)
/// /loras/{slug}                get adapter (GET, public)
/// /loras/{slug}/download       download adapter (POST, auth)
///
/// /models                      list base models (GET, public)
/// /models/{slug}               get base model (GET, public)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/jobs", jobs::router())
        .nest("/storage", storage::router())
        .nest("/training", training::router())
        .merge(catalog::router())
}
