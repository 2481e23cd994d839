//! Generation job row model and write DTOs.

use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;

use atelier_core::error::CoreError;
use atelier_core::job::{InputAsset, JobStatus, JobType, OutputAsset};
use atelier_core::types::{DbId, Timestamp};

/// A row from the `jobs` table.
///
/// `status` and `job_type` are stored as text; use [`Job::status`] and
/// [`Job::job_type`] for the typed views.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Job {
    pub id: DbId,
    pub owner_id: DbId,
    pub status: String,
    pub job_type: String,
    pub model_name: String,
    pub prompt: String,
    pub lora_names: Json<Vec<String>>,
    pub params: serde_json::Value,
    pub input_assets: Json<Vec<InputAsset>>,
    pub output_assets: Json<Vec<OutputAsset>>,
    pub error: Option<String>,
    /// Opaque handle from the compute backend, set on successful dispatch.
    pub backend_job_id: Option<String>,
    /// Monotonic row version backing conditional (CAS) appends.
    pub version: i64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Job {
    /// Typed view of the `status` column.
    pub fn status(&self) -> Result<JobStatus, CoreError> {
        JobStatus::parse(&self.status)
    }

    /// Typed view of the `job_type` column.
    pub fn job_type(&self) -> Result<JobType, CoreError> {
        JobType::parse(&self.job_type)
    }
}

/// Validated input for creating a job. Construction happens in the API
/// layer after `job_type` has been parsed.
#[derive(Debug)]
pub struct NewJob {
    pub job_type: JobType,
    pub model_name: String,
    pub prompt: String,
    pub lora_names: Vec<String>,
    pub params: serde_json::Value,
}

/// Partial update of the caller-mutable job fields. `None` leaves the
/// field unchanged.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateJobFields {
    pub model_name: Option<String>,
    pub prompt: Option<String>,
    pub lora_names: Option<Vec<String>>,
    pub params: Option<serde_json::Value>,
}
