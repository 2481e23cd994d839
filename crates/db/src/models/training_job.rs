//! Training job row model.

use serde::Serialize;
use sqlx::types::Json;
use sqlx::FromRow;

use atelier_core::error::CoreError;
use atelier_core::job::JobStatus;
use atelier_core::training::{TrainingImage, TrainingType};
use atelier_core::types::{DbId, Timestamp};

/// A row from the `training_jobs` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct TrainingJob {
    pub id: DbId,
    pub owner_id: DbId,
    pub status: String,
    pub training_type: String,
    pub base_model: String,
    pub config: serde_json::Value,
    pub input_images: Json<Vec<TrainingImage>>,
    pub progress: i32,
    pub error: Option<String>,
    pub version: i64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl TrainingJob {
    pub fn status(&self) -> Result<JobStatus, CoreError> {
        JobStatus::parse(&self.status)
    }
}

/// Validated input for creating a training job.
#[derive(Debug)]
pub struct NewTrainingJob {
    pub training_type: TrainingType,
    pub base_model: String,
    /// Full training config with `lora_name` / `trigger_word` folded in.
    pub config: serde_json::Value,
}
