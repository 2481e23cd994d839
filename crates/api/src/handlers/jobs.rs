//! Handlers for the `/jobs` resource: the generation-job lifecycle.
//!
//! All endpoints require authentication via [`AuthUser`]. Every lookup
//! goes through `JobRepo::find_owned`, so a job that exists but belongs
//! to someone else is indistinguishable from one that does not exist.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use base64::Engine;
use serde::{Deserialize, Serialize};

use atelier_core::dispatch;
use atelier_core::error::CoreError;
use atelier_core::job::{JobStatus, JobType, OutputAsset};
use atelier_core::reconcile::{self, BackendOutcome, OutputEntry};
use atelier_core::storage as storage_rules;
use atelier_core::types::DbId;
use atelier_db::models::job::{Job, NewJob, UpdateJobFields};
use atelier_db::repositories::JobRepo;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Fetch a job through the ownership guard.
///
/// Missing and not-owned collapse into the same `NotFound`, so a caller
/// probing foreign job ids learns nothing from the response. Shared with
/// the storage handlers.
pub(crate) async fn resolve_owned(
    pool: &sqlx::PgPool,
    job_id: DbId,
    auth: &AuthUser,
) -> AppResult<Job> {
    JobRepo::find_owned(pool, job_id, auth.user_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Job",
            id: job_id,
        }))
}

// ---------------------------------------------------------------------------
// Create
// ---------------------------------------------------------------------------

/// Default generation model when the caller does not pick one.
const DEFAULT_MODEL: &str = "realistic-vision-v5";

#[derive(Debug, Deserialize)]
pub struct CreateJobRequest {
    #[serde(default)]
    pub prompt: String,
    #[serde(default = "default_job_type")]
    pub job_type: String,
    #[serde(default = "default_model")]
    pub model_name: String,
    #[serde(default)]
    pub lora_names: Vec<String>,
    #[serde(default = "default_params")]
    pub params: serde_json::Value,
}

fn default_job_type() -> String {
    "img2img".to_string()
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_params() -> serde_json::Value {
    serde_json::json!({})
}

#[derive(Serialize)]
pub struct CreateJobResponse {
    pub job_id: DbId,
    pub status: String,
    pub job_type: String,
}

/// POST /jobs/create
///
/// Create a new job in `queued` status. Returns 201 with the job id.
pub async fn create_job(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateJobRequest>,
) -> AppResult<impl IntoResponse> {
    let job_type = JobType::parse(&input.job_type)?;

    if !input.params.is_object() {
        return Err(AppError::Core(CoreError::Validation(
            "params must be a JSON object".to_string(),
        )));
    }

    let new_job = NewJob {
        job_type,
        model_name: input.model_name,
        prompt: input.prompt,
        lora_names: input.lora_names,
        params: input.params,
    };
    let job = JobRepo::create(&state.pool, auth.user_id, &new_job).await?;

    tracing::info!(
        job_id = %job.id,
        job_type = %job.job_type,
        user_id = %auth.user_id,
        "Job created",
    );

    Ok((
        StatusCode::CREATED,
        Json(CreateJobResponse {
            job_id: job.id,
            status: job.status,
            job_type: job.job_type,
        }),
    ))
}

// ---------------------------------------------------------------------------
// Update
// ---------------------------------------------------------------------------

/// PATCH /jobs/{id}
///
/// Partial update of the caller-mutable fields. Only allowed while the
/// job is still `queued`; after dispatch the record is what the backend
/// was given.
pub async fn update_job(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(job_id): Path<DbId>,
    Json(fields): Json<UpdateJobFields>,
) -> AppResult<impl IntoResponse> {
    let job = resolve_owned(&state.pool, job_id, &auth).await?;

    if job.status()? != JobStatus::Queued {
        return Err(AppError::Core(CoreError::InvalidState(format!(
            "Job status is {}, expected 'queued'",
            job.status
        ))));
    }

    if let Some(ref params) = fields.params {
        if !params.is_object() {
            return Err(AppError::Core(CoreError::Validation(
                "params must be a JSON object".to_string(),
            )));
        }
    }

    let updated = JobRepo::update_fields(&state.pool, job_id, auth.user_id, &fields)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Job",
            id: job_id,
        }))?;

    Ok(Json(updated))
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct DispatchResponse {
    pub backend_handle: String,
    pub status: &'static str,
}

/// POST /jobs/{id}/dispatch
///
/// Submit a queued job to the compute backend.
///
/// The job is claimed with a conditional `queued -> processing`
/// transition before the submission call, so two concurrent dispatches
/// of the same job produce exactly one submission. If the backend
/// rejects the submission, the claim is rolled back and the job stays
/// dispatchable.
pub async fn dispatch_job(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(job_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let job = resolve_owned(&state.pool, job_id, &auth).await?;

    dispatch::check_dispatchable(job.status()?, job.job_type()?, job.input_assets.0.len())?;

    let payload = dispatch::build_payload(
        job.id,
        job.owner_id,
        job.job_type()?,
        &job.model_name,
        &job.prompt,
        &job.lora_names.0,
        &job.params,
        &job.input_assets.0,
    )?;

    // Claim the job. Losing the race means another dispatch got here
    // between the precondition check and now.
    let claimed = JobRepo::transition(
        &state.pool,
        job_id,
        auth.user_id,
        JobStatus::Queued,
        JobStatus::Processing,
    )
    .await?;
    if claimed.is_none() {
        return Err(AppError::Core(CoreError::InvalidState(
            "Job status is processing, expected 'queued'".to_string(),
        )));
    }

    match state.compute.submit(&payload).await {
        Ok(handle) => {
            // The submission is already in flight; a failed handle write
            // must not turn it into an error response. The caller still
            // gets the handle and can poll with it explicitly.
            if let Err(err) =
                JobRepo::set_backend_handle(&state.pool, job_id, auth.user_id, &handle).await
            {
                tracing::error!(
                    job_id = %job_id,
                    backend_handle = %handle,
                    error = %err,
                    "Failed to record backend handle after submission",
                );
            }

            tracing::info!(
                job_id = %job_id,
                backend_handle = %handle,
                user_id = %auth.user_id,
                "Job dispatched",
            );

            Ok(Json(DispatchResponse {
                backend_handle: handle,
                status: "dispatched",
            }))
        }
        Err(err) => {
            // Compensate the claim so the job can be re-dispatched.
            if let Err(db_err) = JobRepo::transition(
                &state.pool,
                job_id,
                auth.user_id,
                JobStatus::Processing,
                JobStatus::Queued,
            )
            .await
            {
                tracing::error!(
                    job_id = %job_id,
                    error = %db_err,
                    "Failed to roll back dispatch claim after submission failure",
                );
            }

            tracing::warn!(job_id = %job_id, error = %err, "Dispatch submission failed");
            Err(err.into())
        }
    }
}

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// GET /jobs/{id}/status
///
/// The job record as this service knows it. No backend call is made;
/// use `backend-status` to reconcile against the compute backend.
pub async fn job_status(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(job_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let job = resolve_owned(&state.pool, job_id, &auth).await?;
    Ok(Json(job))
}

// ---------------------------------------------------------------------------
// Backend status (reconciliation)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct BackendStatusQuery {
    pub handle: Option<String>,
}

/// GET /jobs/{id}/backend-status?handle=
///
/// Poll the compute backend for the job's current state, fold any
/// terminal outcome into the job record, and return the raw backend
/// payload. The handle recorded at dispatch is used when present;
/// otherwise the caller-supplied `handle` query parameter.
///
/// Persistence failures are logged but never surfaced: the poll result
/// itself is still useful to the caller, and the next poll retries the
/// write. A repeated completed-poll is a no-op thanks to the guarded
/// update in the repo.
pub async fn backend_status(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(job_id): Path<DbId>,
    Query(query): Query<BackendStatusQuery>,
) -> AppResult<impl IntoResponse> {
    let job = resolve_owned(&state.pool, job_id, &auth).await?;

    let Some(handle) = job.backend_job_id.as_deref().or(query.handle.as_deref()) else {
        return Err(AppError::Core(CoreError::InvalidState(
            "Job has not been dispatched".to_string(),
        )));
    };

    let payload = state.compute.status(handle).await?;

    match reconcile::classify(&payload) {
        BackendOutcome::Completed(entries) => {
            let outputs = persist_inline_outputs(&state, &job, entries).await;
            match JobRepo::complete_with_outputs(&state.pool, job_id, auth.user_id, &outputs)
                .await
            {
                Ok(true) => {
                    tracing::info!(
                        job_id = %job_id,
                        output_count = outputs.len(),
                        "Job completed",
                    );
                }
                Ok(false) => {} // already completed; nothing to write
                Err(err) => {
                    tracing::error!(
                        job_id = %job_id,
                        error = %err,
                        "Failed to persist job completion; will retry on next poll",
                    );
                }
            }
        }
        BackendOutcome::Failed(message) => {
            match JobRepo::fail(&state.pool, job_id, auth.user_id, message.as_deref()).await {
                Ok(true) => {
                    tracing::info!(job_id = %job_id, error = ?message, "Job failed");
                }
                Ok(false) => {}
                Err(err) => {
                    tracing::error!(
                        job_id = %job_id,
                        error = %err,
                        "Failed to persist job failure; will retry on next poll",
                    );
                }
            }
        }
        BackendOutcome::Pending => {}
    }

    Ok(Json(payload))
}

/// Turn backend output entries into recordable assets, uploading inline
/// content to the object store first.
///
/// An entry that cannot be decoded or uploaded is dropped with an error
/// log rather than blocking the rest of the batch.
async fn persist_inline_outputs(
    state: &AppState,
    job: &Job,
    entries: Vec<OutputEntry>,
) -> Vec<OutputAsset> {
    let mut outputs = Vec::with_capacity(entries.len());

    for entry in entries {
        match entry {
            OutputEntry::Keyed(asset) => outputs.push(asset),
            OutputEntry::Inline { data_base64, kind } => {
                let bytes = match base64::engine::general_purpose::STANDARD.decode(&data_base64)
                {
                    Ok(bytes) => bytes,
                    Err(err) => {
                        tracing::error!(
                            job_id = %job.id,
                            error = %err,
                            "Skipping inline output with invalid base64",
                        );
                        continue;
                    }
                };

                let ext = reconcile::extension_for_kind(&kind);
                let content_type = match kind.as_str() {
                    "video" => "video/mp4",
                    _ => "image/png",
                };
                let key = storage_rules::make_output_key(job.owner_id, job.id, ext);

                match state.storage.put_object(&key, content_type, bytes).await {
                    Ok(()) => outputs.push(OutputAsset { key, kind }),
                    Err(err) => {
                        tracing::error!(
                            job_id = %job.id,
                            error = %err,
                            "Skipping inline output that failed to upload",
                        );
                    }
                }
            }
        }
    }

    outputs
}
