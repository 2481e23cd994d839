//! Route definitions for the public catalogs (`/loras`, `/models`).
//!
//! Listing and detail are public; adapter download requires auth.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::catalog;
use crate::state::AppState;

/// Routes mounted at the API root.
///
/// ```text
/// GET    /loras                   -> list_loras
/// GET    /loras/categories        -> list_categories
/// GET    /loras/{slug}            -> get_lora
/// POST   /loras/{slug}/download   -> download_lora
/// GET    /models                  -> list_models
/// GET    /models/{slug}           -> get_model
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/loras", get(catalog::list_loras))
        .route("/loras/categories", get(catalog::list_categories))
        .route("/loras/{slug}", get(catalog::get_lora))
        .route("/loras/{slug}/download", post(catalog::download_lora))
        .route("/models", get(catalog::list_models))
        .route("/models/{slug}", get(catalog::get_model))
}
