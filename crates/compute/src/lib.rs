//! Compute backend contract and the serverless-endpoint HTTP client.
//!
//! The backend is an opaque, elastic executor: jobs are submitted with
//! one POST, progress is observed by polling a handle. Both calls are
//! bounded-latency and never retried here -- failures surface to the
//! caller, who may re-issue the request.

mod client;

pub use client::{ComputeConfig, EndpointClient};

use async_trait::async_trait;

use atelier_core::dispatch::DispatchPayload;

/// Errors from the compute backend layer.
#[derive(Debug, thiserror::Error)]
pub enum ComputeError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The backend returned a non-2xx status code.
    #[error("Compute backend error ({status}): {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Raw response body for the caller's 502 payload.
        body: String,
    },

    /// The backend replied 2xx but the body was not in the expected shape.
    #[error("Protocol error: {0}")]
    Protocol(String),
}

/// The two operations the control plane needs from a compute backend.
///
/// Object-safe so the API layer can hold an `Arc<dyn ComputeBackend>`
/// and tests can substitute a mock.
#[async_trait]
pub trait ComputeBackend: Send + Sync {
    /// Submit a job payload for asynchronous execution. Returns the
    /// backend's opaque handle for later polling.
    async fn submit(&self, payload: &DispatchPayload) -> Result<String, ComputeError>;

    /// Poll the status of a previously submitted job. The payload shape
    /// is backend-defined; classification happens in
    /// `atelier_core::reconcile`.
    async fn status(&self, handle: &str) -> Result<serde_json::Value, ComputeError>;
}
