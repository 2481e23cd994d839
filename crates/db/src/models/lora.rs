//! LoRA adapter catalog models.

use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;

use atelier_core::types::{DbId, Timestamp};

/// A row from the `loras` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Lora {
    pub id: DbId,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub preview_url: Option<String>,
    pub category: String,
    pub tags: Json<Vec<String>>,
    pub trigger_words: Json<Vec<String>>,
    pub base_model: String,
    /// Object-store key of the adapter weights. Not serialized in
    /// catalog listings; handed out by the download endpoint only.
    #[serde(skip_serializing)]
    pub storage_key: String,
    pub is_public: bool,
    pub is_nsfw: bool,
    pub download_count: i64,
    pub created_at: Timestamp,
}

/// Query parameters for `GET /loras`.
#[derive(Debug, Default, Deserialize)]
pub struct LoraListQuery {
    pub category: Option<String>,
    /// When set, only adapters with a matching NSFW flag. Unset means
    /// no filtering either way.
    pub is_nsfw: Option<bool>,
    /// Case-insensitive substring match on the adapter name.
    pub search: Option<String>,
    /// Maximum number of results. Defaults to 50, capped at 100.
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}
