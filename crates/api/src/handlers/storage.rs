//! Handlers for the `/storage` resource: presigned upload and download
//! URLs.
//!
//! The service never proxies file bytes. Uploads and downloads go
//! straight to the object store through short-lived presigned URLs; the
//! handlers only validate, mint the URL, and record the key.

use std::time::Duration;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use atelier_core::job::{InputAsset, JobStatus};
use atelier_core::storage as storage_rules;
use atelier_core::types::DbId;
use atelier_db::repositories::JobRepo;

use crate::error::{AppError, AppResult};
use crate::handlers::jobs::resolve_owned;
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

use atelier_core::error::CoreError;

// ---------------------------------------------------------------------------
// Upload URL
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct UploadUrlRequest {
    pub job_id: DbId,
    /// Client-side filename; recorded in logs only, never in the key.
    pub filename: String,
    pub mime: String,
    pub bytes: i64,
}

#[derive(Serialize)]
pub struct UploadUrlResponse {
    pub key: String,
    pub put_url: String,
}

/// POST /storage/upload-url
///
/// Validate a declared input upload, mint a presigned PUT URL, and
/// register the key on the job's input list.
///
/// Only `queued` jobs accept new inputs; the key layout confines the
/// upload to the caller's namespace regardless of what the client sends.
pub async fn upload_url(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(req): Json<UploadUrlRequest>,
) -> AppResult<Json<UploadUrlResponse>> {
    let job = resolve_owned(&state.pool, req.job_id, &auth).await?;

    if job.status()? != JobStatus::Queued {
        return Err(AppError::Core(CoreError::InvalidState(format!(
            "Job status is {}, expected 'queued'",
            job.status
        ))));
    }

    let ext = storage_rules::validate_upload(&req.mime, req.bytes)?;
    let key = storage_rules::make_input_key(auth.user_id, req.job_id, ext);

    let put_url = state
        .storage
        .presign_put(
            &key,
            &req.mime,
            Duration::from_secs(storage_rules::UPLOAD_URL_TTL_SECS),
        )
        .await?;

    let entry = InputAsset {
        key: key.clone(),
        mime: req.mime.clone(),
        bytes: req.bytes,
    };
    JobRepo::append_input(&state.pool, req.job_id, auth.user_id, &entry)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Job",
            id: req.job_id,
        }))?;

    tracing::info!(
        job_id = %req.job_id,
        key = %key,
        filename = %req.filename,
        bytes = req.bytes,
        "Input upload registered",
    );

    Ok(Json(UploadUrlResponse { key, put_url }))
}

// ---------------------------------------------------------------------------
// Download URL
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct DownloadUrlRequest {
    pub key: String,
}

#[derive(Serialize)]
pub struct DownloadUrlResponse {
    pub get_url: String,
}

/// POST /storage/download-url
///
/// Mint a presigned GET URL for a key inside the caller's namespace.
/// Keys outside `users/{caller}/` are rejected whether or not they
/// exist.
pub async fn download_url(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(req): Json<DownloadUrlRequest>,
) -> AppResult<Json<DownloadUrlResponse>> {
    storage_rules::check_download_scope(auth.user_id, &req.key)?;

    let get_url = state
        .storage
        .presign_get(
            &req.key,
            Duration::from_secs(storage_rules::DOWNLOAD_URL_TTL_SECS),
        )
        .await?;

    Ok(Json(DownloadUrlResponse { get_url }))
}
