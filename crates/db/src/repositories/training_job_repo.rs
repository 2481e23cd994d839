//! Repository for the `training_jobs` table. Same owner-scoped,
//! version-guarded pattern as `JobRepo`.

use sqlx::types::Json;
use sqlx::PgPool;

use atelier_core::job::JobStatus;
use atelier_core::training::TrainingImage;
use atelier_core::types::DbId;

use crate::models::training_job::{NewTrainingJob, TrainingJob};
use crate::repositories::{RepoError, MAX_CAS_ATTEMPTS};

/// Column list for `training_jobs` queries.
const COLUMNS: &str = "\
    id, owner_id, status, training_type, base_model, config, \
    input_images, progress, error, version, created_at, updated_at";

/// Provides owner-scoped CRUD for training jobs.
pub struct TrainingJobRepo;

impl TrainingJobRepo {
    /// Create a new training job in `queued` status.
    pub async fn create(
        pool: &PgPool,
        owner_id: DbId,
        input: &NewTrainingJob,
    ) -> Result<TrainingJob, sqlx::Error> {
        let query = format!(
            "INSERT INTO training_jobs (owner_id, status, training_type, base_model, config) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, TrainingJob>(&query)
            .bind(owner_id)
            .bind(JobStatus::Queued.as_str())
            .bind(input.training_type.as_str())
            .bind(&input.base_model)
            .bind(&input.config)
            .fetch_one(pool)
            .await
    }

    /// Ownership guard, same 404 policy as `JobRepo::find_owned`.
    pub async fn find_owned(
        pool: &PgPool,
        job_id: DbId,
        owner_id: DbId,
    ) -> Result<Option<TrainingJob>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM training_jobs WHERE id = $1 AND owner_id = $2");
        sqlx::query_as::<_, TrainingJob>(&query)
            .bind(job_id)
            .bind(owner_id)
            .fetch_optional(pool)
            .await
    }

    /// List the caller's training jobs, newest first.
    pub async fn list_by_owner(
        pool: &PgPool,
        owner_id: DbId,
    ) -> Result<Vec<TrainingJob>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM training_jobs \
             WHERE owner_id = $1 \
             ORDER BY created_at DESC"
        );
        sqlx::query_as::<_, TrainingJob>(&query)
            .bind(owner_id)
            .fetch_all(pool)
            .await
    }

    /// Append one training image entry (version-guarded).
    pub async fn append_image(
        pool: &PgPool,
        job_id: DbId,
        owner_id: DbId,
        entry: &TrainingImage,
    ) -> Result<Option<TrainingJob>, RepoError> {
        for _ in 0..MAX_CAS_ATTEMPTS {
            let Some(job) = Self::find_owned(pool, job_id, owner_id).await? else {
                return Ok(None);
            };

            let mut images = job.input_images.0;
            images.push(entry.clone());

            let query = format!(
                "UPDATE training_jobs \
                 SET input_images = $3, version = version + 1, updated_at = NOW() \
                 WHERE id = $1 AND owner_id = $2 AND version = $4 \
                 RETURNING {COLUMNS}"
            );
            let updated = sqlx::query_as::<_, TrainingJob>(&query)
                .bind(job_id)
                .bind(owner_id)
                .bind(Json(&images))
                .bind(job.version)
                .fetch_optional(pool)
                .await?;

            if let Some(job) = updated {
                return Ok(Some(job));
            }
        }

        Err(RepoError::Conflict(MAX_CAS_ATTEMPTS))
    }

    /// Conditional status transition, as `JobRepo::transition`.
    pub async fn transition(
        pool: &PgPool,
        job_id: DbId,
        owner_id: DbId,
        from: JobStatus,
        to: JobStatus,
    ) -> Result<Option<TrainingJob>, sqlx::Error> {
        let query = format!(
            "UPDATE training_jobs \
             SET status = $3, version = version + 1, updated_at = NOW() \
             WHERE id = $1 AND owner_id = $2 AND status = $4 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, TrainingJob>(&query)
            .bind(job_id)
            .bind(owner_id)
            .bind(to.as_str())
            .bind(from.as_str())
            .fetch_optional(pool)
            .await
    }
}
