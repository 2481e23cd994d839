//! HTTP client for a serverless compute endpoint.
//!
//! Wire format: `POST {base}/{endpoint_id}/run` with `{"input": payload}`
//! submits a job and returns `{"id": "<handle>", ...}`;
//! `GET {base}/{endpoint_id}/status/{handle}` polls it. Both calls carry
//! a bearer API key and run under a bounded timeout.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use atelier_core::dispatch::DispatchPayload;

use crate::{ComputeBackend, ComputeError};

/// Default request timeout for backend calls, in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default API base URL.
const DEFAULT_API_BASE: &str = "https://api.runpod.ai/v2";

/// Connection settings for one serverless endpoint.
#[derive(Debug, Clone)]
pub struct ComputeConfig {
    /// API base URL (default: `https://api.runpod.ai/v2`).
    pub api_base: String,
    /// Endpoint identifier, appended to the base URL.
    pub endpoint_id: String,
    /// Bearer API key.
    pub api_key: String,
    /// Request timeout in seconds (default: `30`).
    pub timeout_secs: u64,
}

impl ComputeConfig {
    /// Load compute backend configuration from environment variables.
    ///
    /// | Env Var                | Required | Default                      |
    /// |------------------------|----------|------------------------------|
    /// | `COMPUTE_API_BASE`     | no       | `https://api.runpod.ai/v2`   |
    /// | `COMPUTE_ENDPOINT_ID`  | **yes**  | --                           |
    /// | `COMPUTE_API_KEY`      | **yes**  | --                           |
    /// | `COMPUTE_TIMEOUT_SECS` | no       | `30`                         |
    ///
    /// # Panics
    ///
    /// Panics if a required variable is missing.
    pub fn from_env() -> Self {
        let api_base =
            std::env::var("COMPUTE_API_BASE").unwrap_or_else(|_| DEFAULT_API_BASE.into());
        let endpoint_id =
            std::env::var("COMPUTE_ENDPOINT_ID").expect("COMPUTE_ENDPOINT_ID must be set");
        let api_key = std::env::var("COMPUTE_API_KEY").expect("COMPUTE_API_KEY must be set");
        let timeout_secs: u64 = std::env::var("COMPUTE_TIMEOUT_SECS")
            .unwrap_or_else(|_| DEFAULT_TIMEOUT_SECS.to_string())
            .parse()
            .expect("COMPUTE_TIMEOUT_SECS must be a valid u64");

        Self {
            api_base,
            endpoint_id,
            api_key,
            timeout_secs,
        }
    }
}

/// Client for one serverless compute endpoint.
pub struct EndpointClient {
    client: reqwest::Client,
    config: ComputeConfig,
}

impl EndpointClient {
    /// Build a client with a pooled connection and the configured timeout.
    pub fn new(config: ComputeConfig) -> Result<Self, ComputeError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { client, config })
    }

    fn run_url(&self) -> String {
        format!("{}/{}/run", self.config.api_base, self.config.endpoint_id)
    }

    fn status_url(&self, handle: &str) -> String {
        format!(
            "{}/{}/status/{handle}",
            self.config.api_base, self.config.endpoint_id
        )
    }

    /// Ensure the response has a success status code, otherwise capture
    /// the raw body into [`ComputeError::Api`].
    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, ComputeError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(ComputeError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl ComputeBackend for EndpointClient {
    async fn submit(&self, payload: &DispatchPayload) -> Result<String, ComputeError> {
        let body = serde_json::json!({ "input": payload });

        let response = self
            .client
            .post(self.run_url())
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await?;

        let data: Value = Self::ensure_success(response).await?.json().await?;

        let handle = data
            .get("id")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                ComputeError::Protocol(format!("Submission response missing 'id': {data}"))
            })?
            .to_string();

        tracing::debug!(job_id = %payload.job_id, handle = %handle, "Job submitted to compute backend");

        Ok(handle)
    }

    async fn status(&self, handle: &str) -> Result<Value, ComputeError> {
        let response = self
            .client
            .get(self.status_url(handle))
            .bearer_auth(&self.config.api_key)
            .send()
            .await?;

        Ok(Self::ensure_success(response).await?.json().await?)
    }
}
