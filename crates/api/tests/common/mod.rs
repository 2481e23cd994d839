//! Shared test harness: in-memory compute/storage fakes, router
//! construction, and HTTP helpers.
//!
//! The router is built through the same [`build_app_router`] the binary
//! uses, so every test exercises the production middleware stack.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Response, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use sqlx::PgPool;
use tower::ServiceExt;

use atelier_api::auth::jwt::{generate_access_token, JwtConfig};
use atelier_api::config::ServerConfig;
use atelier_api::router::build_app_router;
use atelier_api::state::AppState;
use atelier_compute::{ComputeBackend, ComputeError};
use atelier_core::dispatch::DispatchPayload;
use atelier_core::types::DbId;
use atelier_storage::{ObjectStore, StorageError};

// ---------------------------------------------------------------------------
// Fakes
// ---------------------------------------------------------------------------

/// In-memory compute backend. Records submissions and serves a
/// configurable status payload.
#[derive(Default)]
pub struct MockCompute {
    /// Every payload successfully submitted, in order.
    pub submissions: Mutex<Vec<DispatchPayload>>,
    /// When set, `submit` fails with this body as a backend 500.
    pub submit_error: Mutex<Option<String>>,
    /// Payload returned by `status`.
    pub status_payload: Mutex<Value>,
    /// Every handle polled through `status`, in order.
    pub polled: Mutex<Vec<String>>,
    handle_counter: AtomicUsize,
}

impl MockCompute {
    pub fn set_submit_error(&self, body: &str) {
        *self.submit_error.lock().unwrap() = Some(body.to_string());
    }

    pub fn clear_submit_error(&self) {
        *self.submit_error.lock().unwrap() = None;
    }

    pub fn set_status_payload(&self, payload: Value) {
        *self.status_payload.lock().unwrap() = payload;
    }

    pub fn submission_count(&self) -> usize {
        self.submissions.lock().unwrap().len()
    }
}

#[async_trait]
impl ComputeBackend for MockCompute {
    async fn submit(&self, payload: &DispatchPayload) -> Result<String, ComputeError> {
        if let Some(body) = self.submit_error.lock().unwrap().clone() {
            return Err(ComputeError::Api { status: 500, body });
        }
        self.submissions.lock().unwrap().push(payload.clone());
        let n = self.handle_counter.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(format!("handle-{n}"))
    }

    async fn status(&self, handle: &str) -> Result<Value, ComputeError> {
        self.polled.lock().unwrap().push(handle.to_string());
        Ok(self.status_payload.lock().unwrap().clone())
    }
}

/// In-memory object store. Presigned URLs are deterministic fakes;
/// direct puts are recorded.
#[derive(Default)]
pub struct MockStorage {
    /// Keys written through `put_object`, in order.
    pub uploaded: Mutex<Vec<String>>,
}

#[async_trait]
impl ObjectStore for MockStorage {
    async fn presign_put(
        &self,
        key: &str,
        _content_type: &str,
        _ttl: Duration,
    ) -> Result<String, StorageError> {
        Ok(format!("https://store.test/put/{key}"))
    }

    async fn presign_get(&self, key: &str, _ttl: Duration) -> Result<String, StorageError> {
        Ok(format!("https://store.test/get/{key}"))
    }

    async fn put_object(
        &self,
        key: &str,
        _content_type: &str,
        _bytes: Vec<u8>,
    ) -> Result<(), StorageError> {
        self.uploaded.lock().unwrap().push(key.to_string());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

/// JWT secret shared between the test config and the token helper.
const TEST_JWT_SECRET: &str = "test-secret-that-is-long-enough-for-hmac";

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:3000".to_string()],
        request_timeout_secs: 30,
        jwt: JwtConfig {
            secret: TEST_JWT_SECRET.to_string(),
            access_token_expiry_mins: 60,
        },
    }
}

/// The router plus handles to the fakes, for tests that need to steer
/// the backend or inspect what was submitted.
pub struct TestHarness {
    pub app: Router,
    pub compute: Arc<MockCompute>,
    pub storage: Arc<MockStorage>,
}

/// Build the full application with fake compute/storage backends.
pub fn build_test_harness(pool: PgPool) -> TestHarness {
    let config = test_config();
    let compute = Arc::new(MockCompute::default());
    let storage = Arc::new(MockStorage::default());

    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        compute: compute.clone(),
        storage: storage.clone(),
    };

    TestHarness {
        app: build_app_router(state, &config),
        compute,
        storage,
    }
}

/// Build just the router, for tests that never touch the fakes.
pub fn build_test_app(pool: PgPool) -> Router {
    build_test_harness(pool).app
}

/// Mint a Bearer token for `user_id` signed with the test secret.
pub fn bearer_token(user_id: DbId) -> String {
    let config = test_config();
    let token =
        generate_access_token(user_id, &config.jwt).expect("token generation should succeed");
    format!("Bearer {token}")
}

// ---------------------------------------------------------------------------
// HTTP helpers
// ---------------------------------------------------------------------------

#[allow(dead_code)]
pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

#[allow(dead_code)]
pub async fn get_auth(app: Router, uri: &str, user_id: DbId) -> Response<Body> {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .header("authorization", bearer_token(user_id))
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

#[allow(dead_code)]
pub async fn post_json(app: Router, uri: &str, body: Value) -> Response<Body> {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

#[allow(dead_code)]
pub async fn post_json_auth(
    app: Router,
    uri: &str,
    user_id: DbId,
    body: Value,
) -> Response<Body> {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .header("authorization", bearer_token(user_id))
        .body(Body::from(body.to_string()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

#[allow(dead_code)]
pub async fn post_auth(app: Router, uri: &str, user_id: DbId) -> Response<Body> {
    post_json_auth(app, uri, user_id, serde_json::json!({})).await
}

#[allow(dead_code)]
pub async fn patch_json_auth(
    app: Router,
    uri: &str,
    user_id: DbId,
    body: Value,
) -> Response<Body> {
    let request = Request::builder()
        .method("PATCH")
        .uri(uri)
        .header("content-type", "application/json")
        .header("authorization", bearer_token(user_id))
        .body(Body::from(body.to_string()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

/// Read the full response body and parse it as JSON.
pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body should be readable")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("body should be valid JSON")
}

/// Assert the response is an error with the given status and `code`
/// field, returning the parsed body.
#[allow(dead_code)]
pub async fn assert_error(
    response: Response<Body>,
    status: StatusCode,
    code: &str,
) -> Value {
    assert_eq!(response.status(), status);
    let json = body_json(response).await;
    assert_eq!(json["code"], code, "unexpected error code: {json}");
    json
}
