//! Handlers for the `/training` resource: LoRA training jobs.
//!
//! Training jobs reuse the generation-job lifecycle (owner-scoped,
//! `queued -> processing` via conditional transition) with their own
//! preconditions: a minimum image set before starting.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use atelier_core::error::CoreError;
use atelier_core::job::JobStatus;
use atelier_core::training::{self, TrainingImage, TrainingType};
use atelier_core::types::DbId;
use atelier_db::models::training_job::{NewTrainingJob, TrainingJob};
use atelier_db::repositories::TrainingJobRepo;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

/// Fetch a training job through the ownership guard.
async fn resolve_owned(
    pool: &sqlx::PgPool,
    job_id: DbId,
    auth: &AuthUser,
) -> AppResult<TrainingJob> {
    TrainingJobRepo::find_owned(pool, job_id, auth.user_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Training job",
            id: job_id,
        }))
}

// ---------------------------------------------------------------------------
// Create
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct CreateTrainingRequest {
    #[serde(default = "default_training_type")]
    pub training_type: String,
    #[serde(default = "default_base_model")]
    pub base_model: String,
    pub lora_name: String,
    pub trigger_word: String,
    #[serde(default = "default_config")]
    pub config: Value,
}

fn default_training_type() -> String {
    "lora".to_string()
}

fn default_base_model() -> String {
    "sd15".to_string()
}

fn default_config() -> Value {
    serde_json::json!({})
}

/// POST /training/create
///
/// Create a training job in `queued` status. `lora_name` and
/// `trigger_word` are folded into the config; caller-supplied config
/// keys of the same name win.
pub async fn create_training(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(req): Json<CreateTrainingRequest>,
) -> AppResult<impl IntoResponse> {
    let training_type = TrainingType::parse(&req.training_type)?;

    let caller_config = match req.config {
        Value::Object(map) => map,
        Value::Null => Map::new(),
        _ => {
            return Err(AppError::Core(CoreError::Validation(
                "config must be a JSON object".to_string(),
            )));
        }
    };

    let mut config = Map::new();
    config.insert("lora_name".to_string(), Value::String(req.lora_name));
    config.insert("trigger_word".to_string(), Value::String(req.trigger_word));
    config.extend(caller_config);

    let new_job = NewTrainingJob {
        training_type,
        base_model: req.base_model,
        config: Value::Object(config),
    };
    let job = TrainingJobRepo::create(&state.pool, auth.user_id, &new_job).await?;

    tracing::info!(
        training_job_id = %job.id,
        training_type = %job.training_type,
        user_id = %auth.user_id,
        "Training job created",
    );

    Ok((StatusCode::CREATED, Json(job)))
}

// ---------------------------------------------------------------------------
// List / get
// ---------------------------------------------------------------------------

/// GET /training
///
/// The caller's training jobs, newest first.
pub async fn list_training(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let jobs = TrainingJobRepo::list_by_owner(&state.pool, auth.user_id).await?;
    Ok(Json(jobs))
}

/// GET /training/{id}
pub async fn get_training(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(job_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let job = resolve_owned(&state.pool, job_id, &auth).await?;
    Ok(Json(job))
}

// ---------------------------------------------------------------------------
// Upload image
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct UploadImageRequest {
    /// Object-store key of an already-uploaded training image.
    pub image_key: String,
}

#[derive(Serialize)]
pub struct UploadImageResponse {
    pub image_count: usize,
}

/// POST /training/{id}/upload-image
///
/// Register one training image on the job. Only `queued` jobs accept
/// new images.
pub async fn upload_image(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(job_id): Path<DbId>,
    Json(req): Json<UploadImageRequest>,
) -> AppResult<Json<UploadImageResponse>> {
    let job = resolve_owned(&state.pool, job_id, &auth).await?;

    if job.status()? != JobStatus::Queued {
        return Err(AppError::Core(CoreError::InvalidState(format!(
            "Training job status is {}, expected 'queued'",
            job.status
        ))));
    }

    let entry = TrainingImage { key: req.image_key };
    let job = TrainingJobRepo::append_image(&state.pool, job_id, auth.user_id, &entry)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Training job",
            id: job_id,
        }))?;

    Ok(Json(UploadImageResponse {
        image_count: job.input_images.0.len(),
    }))
}

// ---------------------------------------------------------------------------
// Start
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct StartTrainingResponse {
    pub status: String,
    pub message: String,
}

/// POST /training/{id}/start
///
/// Start a queued training job once it has enough images. The claim is
/// the same conditional `queued -> processing` transition generation
/// jobs use for dispatch.
pub async fn start_training(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(job_id): Path<DbId>,
) -> AppResult<Json<StartTrainingResponse>> {
    let job = resolve_owned(&state.pool, job_id, &auth).await?;

    training::check_startable(job.status()?, job.input_images.0.len())?;

    let claimed = TrainingJobRepo::transition(
        &state.pool,
        job_id,
        auth.user_id,
        JobStatus::Queued,
        JobStatus::Processing,
    )
    .await?;
    let job = claimed.ok_or_else(|| {
        AppError::Core(CoreError::InvalidState(
            "Training job status is processing, expected 'queued'".to_string(),
        ))
    })?;

    // TODO: submit to the training endpoint once the worker exposes one;
    // until then jobs are picked up by the trainer polling the table.
    tracing::info!(
        training_job_id = %job_id,
        image_count = job.input_images.0.len(),
        "Training started",
    );

    Ok(Json(StartTrainingResponse {
        status: job.status,
        message: "Training started".to_string(),
    }))
}
