//! Handlers for the public catalogs: LoRA adapters and base models.
//!
//! Listing and detail endpoints are public. Downloading adapter weights
//! requires authentication and bumps the download counter.

use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

use atelier_db::models::base_model::BaseModelListQuery;
use atelier_db::models::lora::LoraListQuery;
use atelier_db::repositories::{BaseModelRepo, LoraRepo};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// LoRA adapters
// ---------------------------------------------------------------------------

/// GET /loras
///
/// Public adapter catalog, most downloaded first. Supports `category`,
/// `search`, `limit`, and `offset` query parameters.
pub async fn list_loras(
    State(state): State<AppState>,
    Query(params): Query<LoraListQuery>,
) -> AppResult<impl IntoResponse> {
    let loras = LoraRepo::list(&state.pool, &params).await?;
    Ok(Json(loras))
}

/// One entry of the fixed category vocabulary.
#[derive(Serialize)]
pub struct LoraCategory {
    pub slug: &'static str,
    pub name: &'static str,
    pub description: &'static str,
}

/// The vocabulary backing the listing's `category` filter.
const CATEGORIES: &[LoraCategory] = &[
    LoraCategory {
        slug: "realistic",
        name: "Realistic",
        description: "Photorealistic styles",
    },
    LoraCategory {
        slug: "anime",
        name: "Anime",
        description: "Anime and manga styles",
    },
    LoraCategory {
        slug: "celebrity",
        name: "Celebrity",
        description: "Celebrity likenesses",
    },
    LoraCategory {
        slug: "character",
        name: "Character",
        description: "Fictional characters",
    },
    LoraCategory {
        slug: "style",
        name: "Style",
        description: "Art styles and aesthetics",
    },
    LoraCategory {
        slug: "clothing",
        name: "Clothing",
        description: "Outfits and fashion",
    },
    LoraCategory {
        slug: "pose",
        name: "Pose",
        description: "Specific poses and positions",
    },
];

/// GET /loras/categories
pub async fn list_categories() -> Json<&'static [LoraCategory]> {
    Json(CATEGORIES)
}

/// GET /loras/{slug}
pub async fn get_lora(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> AppResult<impl IntoResponse> {
    let lora = LoraRepo::find_by_slug(&state.pool, &slug)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("LoRA '{slug}' not found")))?;
    Ok(Json(lora))
}

#[derive(Serialize)]
pub struct LoraDownloadResponse {
    pub storage_key: String,
    pub download_count: i64,
}

/// POST /loras/{slug}/download
///
/// Hand out the adapter's object-store key and bump the download
/// counter (atomically, so concurrent downloads all count).
pub async fn download_lora(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> AppResult<Json<LoraDownloadResponse>> {
    let lora = LoraRepo::record_download(&state.pool, &slug)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("LoRA '{slug}' not found")))?;

    Ok(Json(LoraDownloadResponse {
        storage_key: lora.storage_key,
        download_count: lora.download_count,
    }))
}

// ---------------------------------------------------------------------------
// Base models
// ---------------------------------------------------------------------------

/// GET /models
///
/// Base model catalog, alphabetical. Supports a `model_type` filter.
pub async fn list_models(
    State(state): State<AppState>,
    Query(params): Query<BaseModelListQuery>,
) -> AppResult<impl IntoResponse> {
    let models = BaseModelRepo::list(&state.pool, &params).await?;
    Ok(Json(models))
}

/// GET /models/{slug}
pub async fn get_model(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> AppResult<impl IntoResponse> {
    let model = BaseModelRepo::find_by_slug(&state.pool, &slug)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Model '{slug}' not found")))?;
    Ok(Json(model))
}
