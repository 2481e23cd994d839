//! Classification of compute-backend status payloads.
//!
//! The backend's response shape varies by job type and worker version, so
//! classification is defensive: anything that is neither clearly
//! completed nor clearly failed is left alone ([`BackendOutcome::Pending`])
//! and the raw payload flows back to the caller unmodified.
//!
//! Known shapes:
//!
//! - top-level `status` with `"COMPLETED"` / `"FAILED"` sentinels, which
//!   may also hide under `execution.status`;
//! - a nested `output` object carrying a worker-level `status` of
//!   `"success"` / `"completed"` / `"failed"`, an `outputs` array of
//!   `{key, type}` entries, and an `error` message on failure;
//! - output entries with inline base64 content instead of a key
//!   (`{data_base64, type}`) -- a fallback some worker versions emit when
//!   they cannot reach the object store themselves.

use serde_json::Value;

use crate::job::OutputAsset;

/// Completion sentinel on the top-level backend envelope.
const BACKEND_COMPLETED: &str = "COMPLETED";

/// Failure sentinel on the top-level backend envelope.
const BACKEND_FAILED: &str = "FAILED";

/// One output reported by the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputEntry {
    /// Already uploaded by the worker; only the key needs recording.
    Keyed(OutputAsset),
    /// Inline content; must be uploaded before a key can be recorded.
    Inline { data_base64: String, kind: String },
}

/// What a backend status payload means for the job record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendOutcome {
    /// The job finished; append these outputs and mark `completed`.
    Completed(Vec<OutputEntry>),
    /// The job failed, with an optional worker-supplied message.
    Failed(Option<String>),
    /// Still running, queued, or unrecognisable -- write nothing.
    Pending,
}

/// Classify a raw backend status payload.
pub fn classify(payload: &Value) -> BackendOutcome {
    let status = top_level_status(payload);
    let output = payload.get("output");
    let worker_status = output
        .and_then(|o| o.get("status"))
        .and_then(Value::as_str);

    let completed = status == Some(BACKEND_COMPLETED)
        || matches!(worker_status, Some("success") | Some("completed"));
    let failed =
        status == Some(BACKEND_FAILED) || worker_status == Some("failed");

    if completed {
        BackendOutcome::Completed(collect_outputs(output))
    } else if failed {
        let message = output
            .and_then(|o| o.get("error"))
            .and_then(Value::as_str)
            .map(str::to_string);
        BackendOutcome::Failed(message)
    } else {
        BackendOutcome::Pending
    }
}

/// File extension for an output kind, used when the reconciler has to
/// upload inline content itself.
pub fn extension_for_kind(kind: &str) -> &'static str {
    match kind {
        "video" => "mp4",
        _ => "png",
    }
}

/// The envelope status, checking `status` then `execution.status`.
fn top_level_status(payload: &Value) -> Option<&str> {
    payload
        .get("status")
        .and_then(Value::as_str)
        .or_else(|| {
            payload
                .get("execution")
                .and_then(|e| e.get("status"))
                .and_then(Value::as_str)
        })
}

/// Pull output entries out of the nested `output` object, tolerating a
/// missing or malformed array (a completed job may legitimately report
/// no outputs).
fn collect_outputs(output: Option<&Value>) -> Vec<OutputEntry> {
    let Some(items) = output
        .and_then(|o| o.get("outputs"))
        .and_then(Value::as_array)
    else {
        return Vec::new();
    };

    items.iter().filter_map(parse_entry).collect()
}

fn parse_entry(item: &Value) -> Option<OutputEntry> {
    let kind = item
        .get("type")
        .and_then(Value::as_str)
        .unwrap_or("image")
        .to_string();

    if let Some(key) = item.get("key").and_then(Value::as_str) {
        return Some(OutputEntry::Keyed(OutputAsset {
            key: key.to_string(),
            kind,
        }));
    }

    if let Some(data) = item.get("data_base64").and_then(Value::as_str) {
        return Some(OutputEntry::Inline {
            data_base64: data.to_string(),
            kind,
        });
    }

    // Unrecognisable entry; skip rather than poison the whole batch.
    None
}
