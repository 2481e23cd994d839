//! Repository for the `jobs` table.
//!
//! Array appends are conditional writes keyed on the row `version`
//! column: read, extend, write back guarded by `version = <read>`, retry
//! on mismatch. A plain read-modify-write would silently lose one of two
//! concurrent appends.

use sqlx::types::Json;
use sqlx::PgPool;

use atelier_core::job::{InputAsset, JobStatus, OutputAsset};
use atelier_core::types::DbId;

use crate::models::job::{Job, NewJob, UpdateJobFields};
use crate::repositories::{RepoError, MAX_CAS_ATTEMPTS};

/// Column list for `jobs` queries.
const COLUMNS: &str = "\
    id, owner_id, status, job_type, model_name, prompt, \
    lora_names, params, input_assets, output_assets, \
    error, backend_job_id, version, created_at, updated_at";

/// Provides owner-scoped CRUD for generation jobs.
pub struct JobRepo;

impl JobRepo {
    /// Create a new job in `queued` status.
    pub async fn create(
        pool: &PgPool,
        owner_id: DbId,
        input: &NewJob,
    ) -> Result<Job, sqlx::Error> {
        let query = format!(
            "INSERT INTO jobs (owner_id, status, job_type, model_name, prompt, lora_names, params) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Job>(&query)
            .bind(owner_id)
            .bind(JobStatus::Queued.as_str())
            .bind(input.job_type.as_str())
            .bind(&input.model_name)
            .bind(&input.prompt)
            .bind(Json(&input.lora_names))
            .bind(&input.params)
            .fetch_one(pool)
            .await
    }

    /// Ownership guard: fetch a job only if it belongs to `owner_id`.
    ///
    /// Returns `None` both for a missing id and for a job owned by
    /// someone else. Every other operation on this repo goes through the
    /// same `(id, owner_id)` predicate.
    pub async fn find_owned(
        pool: &PgPool,
        job_id: DbId,
        owner_id: DbId,
    ) -> Result<Option<Job>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM jobs WHERE id = $1 AND owner_id = $2");
        sqlx::query_as::<_, Job>(&query)
            .bind(job_id)
            .bind(owner_id)
            .fetch_optional(pool)
            .await
    }

    /// Append one input asset entry (version-guarded).
    ///
    /// Returns `None` if the job does not exist or is not owned by the
    /// caller.
    pub async fn append_input(
        pool: &PgPool,
        job_id: DbId,
        owner_id: DbId,
        entry: &InputAsset,
    ) -> Result<Option<Job>, RepoError> {
        for _ in 0..MAX_CAS_ATTEMPTS {
            let Some(job) = Self::find_owned(pool, job_id, owner_id).await? else {
                return Ok(None);
            };

            let mut assets = job.input_assets.0;
            assets.push(entry.clone());

            let query = format!(
                "UPDATE jobs \
                 SET input_assets = $3, version = version + 1, updated_at = NOW() \
                 WHERE id = $1 AND owner_id = $2 AND version = $4 \
                 RETURNING {COLUMNS}"
            );
            let updated = sqlx::query_as::<_, Job>(&query)
                .bind(job_id)
                .bind(owner_id)
                .bind(Json(&assets))
                .bind(job.version)
                .fetch_optional(pool)
                .await?;

            if let Some(job) = updated {
                return Ok(Some(job));
            }
            // Version moved under us; re-read and retry.
        }

        Err(RepoError::Conflict(MAX_CAS_ATTEMPTS))
    }

    /// Append outputs and mark the job `completed` in one atomic write,
    /// guarded on the job not already being in a terminal status.
    ///
    /// The guard is what makes reconciliation idempotent: a repeated
    /// completed-poll affects zero rows and appends nothing, and a job
    /// that already failed stays failed.
    ///
    /// Returns `true` if the row was updated.
    pub async fn complete_with_outputs(
        pool: &PgPool,
        job_id: DbId,
        owner_id: DbId,
        outputs: &[OutputAsset],
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE jobs \
             SET output_assets = output_assets || $3, status = $4, error = NULL, \
                 version = version + 1, updated_at = NOW() \
             WHERE id = $1 AND owner_id = $2 AND status IN ($5, $6)",
        )
        .bind(job_id)
        .bind(owner_id)
        .bind(Json(outputs))
        .bind(JobStatus::Completed.as_str())
        .bind(JobStatus::Queued.as_str())
        .bind(JobStatus::Processing.as_str())
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Mark the job `failed` with an optional worker error message.
    ///
    /// Guarded on the job not already being in a terminal status: the
    /// first terminal outcome sticks, so neither the error message nor
    /// an earlier completion can be overwritten by later polls.
    ///
    /// Returns `true` if the row was updated.
    pub async fn fail(
        pool: &PgPool,
        job_id: DbId,
        owner_id: DbId,
        error: Option<&str>,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE jobs \
             SET status = $4, error = $3, version = version + 1, updated_at = NOW() \
             WHERE id = $1 AND owner_id = $2 AND status IN ($5, $6)",
        )
        .bind(job_id)
        .bind(owner_id)
        .bind(error)
        .bind(JobStatus::Failed.as_str())
        .bind(JobStatus::Queued.as_str())
        .bind(JobStatus::Processing.as_str())
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Conditional status transition: `from -> to`, succeeding only if
    /// the current status is still `from`.
    ///
    /// This is the dispatch claim (`queued -> processing`): of two
    /// concurrent dispatches, exactly one gets the row back. Also used
    /// for the compensating `processing -> queued` rollback when the
    /// backend rejects the submission.
    pub async fn transition(
        pool: &PgPool,
        job_id: DbId,
        owner_id: DbId,
        from: JobStatus,
        to: JobStatus,
    ) -> Result<Option<Job>, sqlx::Error> {
        let query = format!(
            "UPDATE jobs \
             SET status = $3, version = version + 1, updated_at = NOW() \
             WHERE id = $1 AND owner_id = $2 AND status = $4 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Job>(&query)
            .bind(job_id)
            .bind(owner_id)
            .bind(to.as_str())
            .bind(from.as_str())
            .fetch_optional(pool)
            .await
    }

    /// Record the compute backend's handle after a successful submission.
    pub async fn set_backend_handle(
        pool: &PgPool,
        job_id: DbId,
        owner_id: DbId,
        handle: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE jobs SET backend_job_id = $3, updated_at = NOW() \
             WHERE id = $1 AND owner_id = $2",
        )
        .bind(job_id)
        .bind(owner_id)
        .bind(handle)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Partial update of the caller-mutable fields. Unset fields keep
    /// their current value.
    pub async fn update_fields(
        pool: &PgPool,
        job_id: DbId,
        owner_id: DbId,
        fields: &UpdateJobFields,
    ) -> Result<Option<Job>, sqlx::Error> {
        let query = format!(
            "UPDATE jobs \
             SET model_name = COALESCE($3, model_name), \
                 prompt = COALESCE($4, prompt), \
                 lora_names = COALESCE($5, lora_names), \
                 params = COALESCE($6, params), \
                 version = version + 1, updated_at = NOW() \
             WHERE id = $1 AND owner_id = $2 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Job>(&query)
            .bind(job_id)
            .bind(owner_id)
            .bind(fields.model_name.as_deref())
            .bind(fields.prompt.as_deref())
            .bind(fields.lora_names.as_ref().map(Json))
            .bind(fields.params.as_ref())
            .fetch_optional(pool)
            .await
    }
}
