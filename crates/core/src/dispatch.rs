//! Dispatch preconditions and compute-backend payload construction.
//!
//! The payload is built deterministically from the job record; the
//! coordinator in the api crate submits it and owns the status
//! transition around the submission.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::CoreError;
use crate::job::{InputAsset, JobStatus, JobType};
use crate::storage;
use crate::types::DbId;

/// Payload submitted to the compute backend for one job.
///
/// `params` is the job's open parameter mapping with `prompt` and
/// `lora_names` merged in -- the worker contract reads both from there.
#[derive(Debug, Clone, Serialize)]
pub struct DispatchPayload {
    pub job_id: DbId,
    pub user_id: DbId,
    pub input_keys: Vec<String>,
    pub output_prefix: String,
    pub job_type: JobType,
    pub model_name: String,
    pub params: Value,
}

/// Check the dispatch preconditions, in order.
///
/// 1. `status == queued`, else `InvalidState` naming the current status.
/// 2. For asset-driven job types, at least one registered input, else
///    `MissingInput`.
///
/// Ownership resolution happens before this (the caller fetches the job
/// through the ownership guard).
pub fn check_dispatchable(
    status: JobStatus,
    job_type: JobType,
    input_count: usize,
) -> Result<(), CoreError> {
    if status != JobStatus::Queued {
        return Err(CoreError::InvalidState(format!(
            "Job status is {status}, expected 'queued'"
        )));
    }

    if job_type.requires_input() && input_count == 0 {
        return Err(CoreError::MissingInput(
            "No input files uploaded".to_string(),
        ));
    }

    Ok(())
}

/// Build the submission payload for a job.
///
/// `params` must be a JSON object (or null, treated as empty); `prompt`
/// and `lora_names` are merged into it, overwriting any caller-supplied
/// keys of the same name.
#[allow(clippy::too_many_arguments)]
pub fn build_payload(
    job_id: DbId,
    owner_id: DbId,
    job_type: JobType,
    model_name: &str,
    prompt: &str,
    lora_names: &[String],
    params: &Value,
    input_assets: &[InputAsset],
) -> Result<DispatchPayload, CoreError> {
    let mut merged: Map<String, Value> = match params {
        Value::Object(map) => map.clone(),
        Value::Null => Map::new(),
        other => {
            return Err(CoreError::Validation(format!(
                "Job params must be a JSON object, got {other}"
            )));
        }
    };
    merged.insert("prompt".to_string(), Value::String(prompt.to_string()));
    merged.insert(
        "lora_names".to_string(),
        Value::Array(
            lora_names
                .iter()
                .map(|n| Value::String(n.clone()))
                .collect(),
        ),
    );

    Ok(DispatchPayload {
        job_id,
        user_id: owner_id,
        input_keys: input_assets.iter().map(|a| a.key.clone()).collect(),
        output_prefix: storage::output_prefix(owner_id, job_id),
        job_type,
        model_name: model_name.to_string(),
        params: Value::Object(merged),
    })
}
