//! Object-store rules enforced by the control plane: upload whitelist,
//! size cap, key naming, and per-user namespace scoping.
//!
//! The gateway itself (presigning, bucket access) lives in
//! `atelier-storage`; everything here is pure validation.

use uuid::Uuid;

use crate::error::CoreError;
use crate::types::DbId;

/// Maximum accepted upload size (25 MiB).
pub const MAX_UPLOAD_BYTES: i64 = 25 * 1024 * 1024;

/// Presign TTL for input uploads, in seconds.
pub const UPLOAD_URL_TTL_SECS: u64 = 600;

/// Presign TTL for downloads, in seconds.
pub const DOWNLOAD_URL_TTL_SECS: u64 = 1800;

/// Accepted upload MIME types and the file extension each maps to.
const ALLOWED_MIME: &[(&str, &str)] = &[
    ("image/png", "png"),
    ("image/jpeg", "jpg"),
    ("image/webp", "webp"),
];

/// Validate a declared upload and return the file extension for its key.
///
/// Rejects non-positive or oversized byte counts and any MIME type
/// outside the whitelist. Runs before any object-store call.
pub fn validate_upload(mime: &str, bytes: i64) -> Result<&'static str, CoreError> {
    if bytes <= 0 || bytes > MAX_UPLOAD_BYTES {
        return Err(CoreError::Validation(format!(
            "File size {bytes} not allowed (must be 1..={MAX_UPLOAD_BYTES} bytes)"
        )));
    }

    ALLOWED_MIME
        .iter()
        .find(|(m, _)| *m == mime)
        .map(|(_, ext)| *ext)
        .ok_or_else(|| {
            CoreError::Validation(format!("MIME type '{mime}' not allowed"))
        })
}

/// Build the object key for a new input upload.
///
/// Layout: `users/{owner}/jobs/{job}/inputs/{uuid}.{ext}`.
pub fn make_input_key(owner_id: DbId, job_id: DbId, ext: &str) -> String {
    let file_id = Uuid::new_v4();
    format!("users/{owner_id}/jobs/{job_id}/inputs/{file_id}.{ext}")
}

/// Object-key prefix the compute backend writes job outputs under.
///
/// Layout: `users/{owner}/jobs/{job}/outputs/`.
pub fn output_prefix(owner_id: DbId, job_id: DbId) -> String {
    format!("users/{owner_id}/jobs/{job_id}/outputs/")
}

/// Build the object key for an output uploaded by the reconciler
/// (inline-content fallback, see the reconcile module).
pub fn make_output_key(owner_id: DbId, job_id: DbId, ext: &str) -> String {
    let file_id = Uuid::new_v4();
    format!("{}{file_id}.{ext}", output_prefix(owner_id, job_id))
}

/// Reject download requests for keys outside the caller's namespace.
///
/// Enforced here, not by the gateway: a key must start with
/// `users/{caller}/` regardless of whether it exists in the store.
pub fn check_download_scope(owner_id: DbId, key: &str) -> Result<(), CoreError> {
    let prefix = format!("users/{owner_id}/");
    if key.starts_with(&prefix) {
        Ok(())
    } else {
        Err(CoreError::Forbidden("Not allowed".to_string()))
    }
}
