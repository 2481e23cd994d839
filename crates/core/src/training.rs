//! Training-job rules. Training jobs follow the same owner-scoped,
//! append-only, status-progressing pattern as generation jobs; this
//! module holds what is specific to them.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::job::JobStatus;

/// Minimum number of uploaded images required before training can start.
pub const MIN_TRAINING_IMAGES: usize = 5;

/// Supported training methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrainingType {
    Lora,
    Dreambooth,
}

impl TrainingType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Lora => "lora",
            Self::Dreambooth => "dreambooth",
        }
    }

    pub fn parse(s: &str) -> Result<Self, CoreError> {
        match s {
            "lora" => Ok(Self::Lora),
            "dreambooth" => Ok(Self::Dreambooth),
            other => Err(CoreError::Validation(format!(
                "Unknown training type '{other}'. Must be one of: lora, dreambooth"
            ))),
        }
    }
}

/// One image registered for a training job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingImage {
    pub key: String,
}

/// Check the preconditions for starting a training job, in order:
/// status must still be `queued`, then the image set must be large
/// enough.
pub fn check_startable(status: JobStatus, image_count: usize) -> Result<(), CoreError> {
    if status != JobStatus::Queued {
        return Err(CoreError::InvalidState(format!(
            "Training job status is {status}, expected 'queued'"
        )));
    }

    if image_count < MIN_TRAINING_IMAGES {
        return Err(CoreError::Validation(format!(
            "Need at least {MIN_TRAINING_IMAGES} training images, have {image_count}"
        )));
    }

    Ok(())
}
