//! Base model catalog models.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use atelier_core::types::{DbId, Timestamp};

/// A row from the `base_models` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct BaseModel {
    pub id: DbId,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    /// `"image"` or `"video"`.
    pub model_type: String,
    /// Object-store key of the model weights. Not serialized in catalog
    /// listings.
    #[serde(skip_serializing)]
    pub storage_key: String,
    pub created_at: Timestamp,
}

/// Query parameters for `GET /models`.
#[derive(Debug, Default, Deserialize)]
pub struct BaseModelListQuery {
    pub model_type: Option<String>,
}
