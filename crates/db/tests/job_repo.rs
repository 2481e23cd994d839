//! Repository-level tests for the conditional writes backing the job
//! lifecycle: the dispatch claim, idempotent completion/failure, and
//! version-guarded appends.

use assert_matches::assert_matches;
use sqlx::PgPool;
use uuid::Uuid;

use atelier_core::job::{InputAsset, JobStatus, JobType, OutputAsset};
use atelier_db::models::job::{NewJob, UpdateJobFields};
use atelier_db::repositories::JobRepo;

fn new_job(job_type: JobType) -> NewJob {
    NewJob {
        job_type,
        model_name: "m1".to_string(),
        prompt: "p".to_string(),
        lora_names: vec![],
        params: serde_json::json!({}),
    }
}

fn input(key: &str) -> InputAsset {
    InputAsset {
        key: key.to_string(),
        mime: "image/png".to_string(),
        bytes: 1024,
    }
}

fn output(key: &str) -> OutputAsset {
    OutputAsset {
        key: key.to_string(),
        kind: "image".to_string(),
    }
}

#[sqlx::test(migrations = "./migrations")]
async fn create_starts_queued_with_version_zero(pool: PgPool) {
    let owner = Uuid::new_v4();
    let job = JobRepo::create(&pool, owner, &new_job(JobType::Txt2Img))
        .await
        .unwrap();

    assert_eq!(job.status, "queued");
    assert_eq!(job.version, 0);
    assert!(job.input_assets.0.is_empty());
    assert!(job.backend_job_id.is_none());
}

#[sqlx::test(migrations = "./migrations")]
async fn find_owned_hides_foreign_rows(pool: PgPool) {
    let owner = Uuid::new_v4();
    let job = JobRepo::create(&pool, owner, &new_job(JobType::Txt2Img))
        .await
        .unwrap();

    assert!(JobRepo::find_owned(&pool, job.id, owner)
        .await
        .unwrap()
        .is_some());
    assert!(JobRepo::find_owned(&pool, job.id, Uuid::new_v4())
        .await
        .unwrap()
        .is_none());
    assert!(JobRepo::find_owned(&pool, Uuid::new_v4(), owner)
        .await
        .unwrap()
        .is_none());
}

#[sqlx::test(migrations = "./migrations")]
async fn append_input_bumps_version_and_preserves_order(pool: PgPool) {
    let owner = Uuid::new_v4();
    let job = JobRepo::create(&pool, owner, &new_job(JobType::Img2Img))
        .await
        .unwrap();

    JobRepo::append_input(&pool, job.id, owner, &input("k1"))
        .await
        .unwrap()
        .unwrap();
    let job = JobRepo::append_input(&pool, job.id, owner, &input("k2"))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(job.version, 2);
    let keys: Vec<_> = job.input_assets.0.iter().map(|a| a.key.as_str()).collect();
    assert_eq!(keys, vec!["k1", "k2"]);
}

#[sqlx::test(migrations = "./migrations")]
async fn append_input_returns_none_for_foreign_job(pool: PgPool) {
    let owner = Uuid::new_v4();
    let job = JobRepo::create(&pool, owner, &new_job(JobType::Img2Img))
        .await
        .unwrap();

    let result = JobRepo::append_input(&pool, job.id, Uuid::new_v4(), &input("k"))
        .await
        .unwrap();
    assert!(result.is_none());
}

#[sqlx::test(migrations = "./migrations")]
async fn transition_claims_exactly_once(pool: PgPool) {
    let owner = Uuid::new_v4();
    let job = JobRepo::create(&pool, owner, &new_job(JobType::Txt2Img))
        .await
        .unwrap();

    let first = JobRepo::transition(
        &pool,
        job.id,
        owner,
        JobStatus::Queued,
        JobStatus::Processing,
    )
    .await
    .unwrap();
    assert_matches!(first, Some(ref j) if j.status == "processing");

    // The second claim finds no queued row.
    let second = JobRepo::transition(
        &pool,
        job.id,
        owner,
        JobStatus::Queued,
        JobStatus::Processing,
    )
    .await
    .unwrap();
    assert!(second.is_none());

    // Rollback restores dispatchability.
    let rolled_back = JobRepo::transition(
        &pool,
        job.id,
        owner,
        JobStatus::Processing,
        JobStatus::Queued,
    )
    .await
    .unwrap();
    assert_matches!(rolled_back, Some(ref j) if j.status == "queued");
}

#[sqlx::test(migrations = "./migrations")]
async fn complete_with_outputs_is_idempotent(pool: PgPool) {
    let owner = Uuid::new_v4();
    let job = JobRepo::create(&pool, owner, &new_job(JobType::Txt2Img))
        .await
        .unwrap();

    let updated = JobRepo::complete_with_outputs(&pool, job.id, owner, &[output("o1")])
        .await
        .unwrap();
    assert!(updated);

    // A repeated completion affects zero rows and appends nothing.
    let updated = JobRepo::complete_with_outputs(&pool, job.id, owner, &[output("o1")])
        .await
        .unwrap();
    assert!(!updated);

    let job = JobRepo::find_owned(&pool, job.id, owner)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(job.status, "completed");
    assert_eq!(job.output_assets.0.len(), 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn completed_job_cannot_be_failed(pool: PgPool) {
    let owner = Uuid::new_v4();
    let job = JobRepo::create(&pool, owner, &new_job(JobType::Txt2Img))
        .await
        .unwrap();

    assert!(
        JobRepo::complete_with_outputs(&pool, job.id, owner, &[output("o1")])
            .await
            .unwrap()
    );

    // A failure report against a completed job writes nothing.
    assert!(!JobRepo::fail(&pool, job.id, owner, Some("late failure"))
        .await
        .unwrap());

    // And a subsequent completed poll still appends nothing.
    assert!(
        !JobRepo::complete_with_outputs(&pool, job.id, owner, &[output("o1")])
            .await
            .unwrap()
    );

    let job = JobRepo::find_owned(&pool, job.id, owner)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(job.status, "completed");
    assert!(job.error.is_none());
    assert_eq!(job.output_assets.0.len(), 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn failed_job_cannot_be_completed(pool: PgPool) {
    let owner = Uuid::new_v4();
    let job = JobRepo::create(&pool, owner, &new_job(JobType::Txt2Img))
        .await
        .unwrap();

    assert!(JobRepo::fail(&pool, job.id, owner, Some("worker crashed"))
        .await
        .unwrap());

    assert!(
        !JobRepo::complete_with_outputs(&pool, job.id, owner, &[output("o1")])
            .await
            .unwrap()
    );

    let job = JobRepo::find_owned(&pool, job.id, owner)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(job.status, "failed");
    assert_eq!(job.error.as_deref(), Some("worker crashed"));
    assert!(job.output_assets.0.is_empty());
}

#[sqlx::test(migrations = "./migrations")]
async fn fail_writes_once(pool: PgPool) {
    let owner = Uuid::new_v4();
    let job = JobRepo::create(&pool, owner, &new_job(JobType::Txt2Img))
        .await
        .unwrap();

    assert!(JobRepo::fail(&pool, job.id, owner, Some("first"))
        .await
        .unwrap());
    assert!(!JobRepo::fail(&pool, job.id, owner, Some("second"))
        .await
        .unwrap());

    let job = JobRepo::find_owned(&pool, job.id, owner)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(job.error.as_deref(), Some("first"));
}

#[sqlx::test(migrations = "./migrations")]
async fn set_backend_handle_records_handle(pool: PgPool) {
    let owner = Uuid::new_v4();
    let job = JobRepo::create(&pool, owner, &new_job(JobType::Txt2Img))
        .await
        .unwrap();

    JobRepo::set_backend_handle(&pool, job.id, owner, "h-1")
        .await
        .unwrap();

    let job = JobRepo::find_owned(&pool, job.id, owner)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(job.backend_job_id.as_deref(), Some("h-1"));
}

#[sqlx::test(migrations = "./migrations")]
async fn update_fields_leaves_unset_fields_alone(pool: PgPool) {
    let owner = Uuid::new_v4();
    let job = JobRepo::create(&pool, owner, &new_job(JobType::Txt2Img))
        .await
        .unwrap();

    let fields = UpdateJobFields {
        prompt: Some("updated".to_string()),
        ..Default::default()
    };
    let job = JobRepo::update_fields(&pool, job.id, owner, &fields)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(job.prompt, "updated");
    assert_eq!(job.model_name, "m1");
    assert_eq!(job.version, 1);
}
