//! Repository layer. One module per table; all job/training-job access
//! is scoped by `(id, owner_id)` so a row owned by someone else is
//! indistinguishable from a missing row.

mod base_model_repo;
mod job_repo;
mod lora_repo;
mod training_job_repo;

pub use base_model_repo::BaseModelRepo;
pub use job_repo::JobRepo;
pub use lora_repo::LoraRepo;
pub use training_job_repo::TrainingJobRepo;

/// Attempts made by a conditional (version-guarded) append before
/// giving up with [`RepoError::Conflict`].
pub const MAX_CAS_ATTEMPTS: u32 = 3;

/// Errors from repository operations.
///
/// Conditional appends re-read and retry on a version mismatch; a
/// `Conflict` means every attempt lost the race and the caller should
/// retry the whole request.
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),

    #[error("Concurrent update conflict after {0} attempts")]
    Conflict(u32),
}
