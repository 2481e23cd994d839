//! Shared application state passed to all handlers.

use std::sync::Arc;

use atelier_compute::ComputeBackend;
use atelier_db::DbPool;
use atelier_storage::ObjectStore;

use crate::config::ServerConfig;

/// Shared application state.
///
/// Cheap to clone; the pool and the gateway handles are reference-counted.
/// The compute backend and object store are trait objects so integration
/// tests can substitute in-memory fakes for the real services.
#[derive(Clone)]
pub struct AppState {
    /// PostgreSQL connection pool.
    pub pool: DbPool,
    /// Server configuration (JWT settings, timeouts, CORS).
    pub config: Arc<ServerConfig>,
    /// Serverless compute backend for job dispatch and status polls.
    pub compute: Arc<dyn ComputeBackend>,
    /// Object store for presigned URLs and reconciler-side uploads.
    pub storage: Arc<dyn ObjectStore>,
}
