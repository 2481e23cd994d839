//! Job lifecycle types: status lattice, job kinds, asset entries.
//!
//! The status vocabulary is stored as text in the database and surfaced
//! verbatim on the wire, so every variant round-trips through
//! [`JobStatus::as_str`] / [`JobStatus::parse`].

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Lifecycle state of a generation job.
///
/// Allowed transitions:
///
/// ```text
/// queued -----> processing --> completed
///    \              \--------> failed
///     \-----------------------> completed | failed
/// ```
///
/// `completed` and `failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    /// Database / wire representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// Parse the database / wire representation.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        match s {
            "queued" => Ok(Self::Queued),
            "processing" => Ok(Self::Processing),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            other => Err(CoreError::Internal(format!(
                "Unknown job status '{other}' in record store"
            ))),
        }
    }

    /// Whether `self -> to` is a legal lifecycle transition.
    pub fn can_transition(self, to: JobStatus) -> bool {
        match self {
            Self::Queued => matches!(
                to,
                Self::Processing | Self::Completed | Self::Failed
            ),
            Self::Processing => matches!(to, Self::Completed | Self::Failed),
            // Terminal states.
            Self::Completed | Self::Failed => false,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of generative work a job performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobType {
    #[serde(rename = "img2img")]
    Img2Img,
    #[serde(rename = "img2vid")]
    Img2Vid,
    #[serde(rename = "txt2img")]
    Txt2Img,
    #[serde(rename = "txt2vid")]
    Txt2Vid,
}

impl JobType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Img2Img => "img2img",
            Self::Img2Vid => "img2vid",
            Self::Txt2Img => "txt2img",
            Self::Txt2Vid => "txt2vid",
        }
    }

    pub fn parse(s: &str) -> Result<Self, CoreError> {
        match s {
            "img2img" => Ok(Self::Img2Img),
            "img2vid" => Ok(Self::Img2Vid),
            "txt2img" => Ok(Self::Txt2Img),
            "txt2vid" => Ok(Self::Txt2Vid),
            other => Err(CoreError::Validation(format!(
                "Unknown job type '{other}'. Must be one of: img2img, img2vid, txt2img, txt2vid"
            ))),
        }
    }

    /// Image-driven job types cannot be dispatched without at least one
    /// uploaded input asset. Text-driven types may dispatch with none.
    pub fn requires_input(self) -> bool {
        matches!(self, Self::Img2Img | Self::Img2Vid)
    }
}

impl std::fmt::Display for JobType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One registered input upload. Appended while the job is `queued`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputAsset {
    /// Object-store key (`users/{owner}/jobs/{job}/inputs/{uuid}.{ext}`).
    pub key: String,
    /// Declared MIME type, validated against the upload whitelist.
    pub mime: String,
    /// Declared size in bytes, validated against the upload cap.
    pub bytes: i64,
}

/// One produced output. Appended only on the transition into `completed`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputAsset {
    /// Object-store key under the job's output prefix.
    pub key: String,
    /// Output kind as reported by the worker (e.g. `"image"`, `"video"`).
    #[serde(rename = "type", default = "default_output_kind")]
    pub kind: String,
}

fn default_output_kind() -> String {
    "image".to_string()
}
