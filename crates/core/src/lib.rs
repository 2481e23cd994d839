//! Domain logic for the atelier control plane.
//!
//! Pure types and rules only -- no I/O. The db/api crates depend on this
//! crate for the job lifecycle state machine, dispatch preconditions and
//! payload construction, backend status classification, and storage
//! validation rules.

pub mod dispatch;
pub mod error;
pub mod job;
pub mod reconcile;
pub mod storage;
pub mod training;
pub mod types;
