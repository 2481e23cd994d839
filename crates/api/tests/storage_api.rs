//! HTTP-level integration tests for presigned upload/download URLs and
//! the object-store rules around them.

mod common;

use axum::http::StatusCode;
use axum::Router;
use common::{body_json, get_auth, post_json_auth};
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

use atelier_core::types::DbId;

/// Create a job via the API and return its id.
async fn create_job(app: Router, user_id: DbId) -> DbId {
    let response = post_json_auth(
        app,
        "/jobs/create",
        user_id,
        json!({ "job_type": "img2img" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    json["job_id"].as_str().unwrap().parse().unwrap()
}

// ---------------------------------------------------------------------------
// Upload URL
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn upload_url_mints_key_and_registers_input(pool: PgPool) {
    let app = common::build_test_app(pool);
    let user = Uuid::new_v4();
    let job_id = create_job(app.clone(), user).await;

    let response = post_json_auth(
        app.clone(),
        "/storage/upload-url",
        user,
        json!({ "job_id": job_id, "filename": "face.jpeg", "mime": "image/jpeg", "bytes": 4096 }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    let key = json["key"].as_str().unwrap();
    assert!(key.starts_with(&format!("users/{user}/jobs/{job_id}/inputs/")));
    assert!(key.ends_with(".jpg"));
    assert_eq!(
        json["put_url"],
        format!("https://store.test/put/{key}")
    );

    // The key is now on the job record.
    let status = get_auth(app, &format!("/jobs/{job_id}/status"), user).await;
    let json = body_json(status).await;
    assert_eq!(json["input_assets"][0]["key"], key);
    assert_eq!(json["input_assets"][0]["mime"], "image/jpeg");
    assert_eq!(json["input_assets"][0]["bytes"], 4096);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn upload_url_rejects_disallowed_mime(pool: PgPool) {
    let app = common::build_test_app(pool);
    let user = Uuid::new_v4();
    let job_id = create_job(app.clone(), user).await;

    let response = post_json_auth(
        app,
        "/storage/upload-url",
        user,
        json!({ "job_id": job_id, "filename": "a.gif", "mime": "image/gif", "bytes": 100 }),
    )
    .await;

    common::assert_error(response, StatusCode::BAD_REQUEST, "VALIDATION_ERROR").await;
}

#[sqlx::test(migrations = "../db/migrations")]
async fn upload_url_rejects_oversized_file(pool: PgPool) {
    let app = common::build_test_app(pool);
    let user = Uuid::new_v4();
    let job_id = create_job(app.clone(), user).await;

    let response = post_json_auth(
        app,
        "/storage/upload-url",
        user,
        json!({
            "job_id": job_id,
            "filename": "huge.png",
            "mime": "image/png",
            "bytes": 26 * 1024 * 1024,
        }),
    )
    .await;

    common::assert_error(response, StatusCode::BAD_REQUEST, "VALIDATION_ERROR").await;
}

#[sqlx::test(migrations = "../db/migrations")]
async fn upload_url_rejects_non_queued_job(pool: PgPool) {
    let app = common::build_test_app(pool);
    let user = Uuid::new_v4();

    // txt2img so it can be dispatched without inputs.
    let response = post_json_auth(
        app.clone(),
        "/jobs/create",
        user,
        json!({ "job_type": "txt2img" }),
    )
    .await;
    let job_id: DbId = body_json(response).await["job_id"]
        .as_str()
        .unwrap()
        .parse()
        .unwrap();
    let dispatched = common::post_auth(app.clone(), &format!("/jobs/{job_id}/dispatch"), user).await;
    assert_eq!(dispatched.status(), StatusCode::OK);

    let response = post_json_auth(
        app,
        "/storage/upload-url",
        user,
        json!({ "job_id": job_id, "filename": "late.png", "mime": "image/png", "bytes": 100 }),
    )
    .await;

    common::assert_error(response, StatusCode::BAD_REQUEST, "INVALID_STATE").await;
}

#[sqlx::test(migrations = "../db/migrations")]
async fn upload_url_hides_foreign_jobs(pool: PgPool) {
    let app = common::build_test_app(pool);
    let owner = Uuid::new_v4();
    let stranger = Uuid::new_v4();
    let job_id = create_job(app.clone(), owner).await;

    let response = post_json_auth(
        app,
        "/storage/upload-url",
        stranger,
        json!({ "job_id": job_id, "filename": "x.png", "mime": "image/png", "bytes": 100 }),
    )
    .await;

    common::assert_error(response, StatusCode::NOT_FOUND, "NOT_FOUND").await;
}

// ---------------------------------------------------------------------------
// Download URL
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn download_url_presigns_own_keys(pool: PgPool) {
    let app = common::build_test_app(pool);
    let user = Uuid::new_v4();
    let key = format!("users/{user}/jobs/{}/outputs/a.png", Uuid::new_v4());

    let response =
        post_json_auth(app, "/storage/download-url", user, json!({ "key": key })).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["get_url"], format!("https://store.test/get/{key}"));
}

#[sqlx::test(migrations = "../db/migrations")]
async fn download_url_rejects_foreign_namespace(pool: PgPool) {
    let app = common::build_test_app(pool);
    let user = Uuid::new_v4();
    let other = Uuid::new_v4();
    let key = format!("users/{other}/jobs/{}/outputs/a.png", Uuid::new_v4());

    let response =
        post_json_auth(app, "/storage/download-url", user, json!({ "key": key })).await;

    common::assert_error(response, StatusCode::FORBIDDEN, "FORBIDDEN").await;
}

#[sqlx::test(migrations = "../db/migrations")]
async fn download_url_rejects_unprefixed_keys(pool: PgPool) {
    let app = common::build_test_app(pool);

    let response = post_json_auth(
        app,
        "/storage/download-url",
        Uuid::new_v4(),
        json!({ "key": "loras/style.safetensors" }),
    )
    .await;

    common::assert_error(response, StatusCode::FORBIDDEN, "FORBIDDEN").await;
}
