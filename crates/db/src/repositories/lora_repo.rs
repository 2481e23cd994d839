//! Repository for the public `loras` adapter catalog.

use sqlx::PgPool;

use crate::models::lora::{Lora, LoraListQuery};

/// Column list for `loras` queries.
const COLUMNS: &str = "\
    id, name, slug, description, preview_url, category, tags, \
    trigger_words, base_model, storage_key, is_public, is_nsfw, \
    download_count, created_at";

/// Maximum page size for catalog listing.
const MAX_LIMIT: i64 = 100;

/// Default page size for catalog listing.
const DEFAULT_LIMIT: i64 = 50;

/// Read access to the adapter catalog plus the download counter.
pub struct LoraRepo;

impl LoraRepo {
    /// List public adapters, most downloaded first, with optional
    /// category, NSFW-flag, and name-substring filters.
    pub async fn list(pool: &PgPool, params: &LoraListQuery) -> Result<Vec<Lora>, sqlx::Error> {
        let limit = params.limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT);
        let offset = params.offset.unwrap_or(0);

        // Build the WHERE clause and track the next bind parameter index.
        let mut conditions = vec!["is_public".to_string()];
        let mut bind_idx: u32 = 1;

        if params.category.is_some() {
            conditions.push(format!("category = ${bind_idx}"));
            bind_idx += 1;
        }

        if params.is_nsfw.is_some() {
            conditions.push(format!("is_nsfw = ${bind_idx}"));
            bind_idx += 1;
        }

        if params.search.is_some() {
            conditions.push(format!("name ILIKE ${bind_idx}"));
            bind_idx += 1;
        }

        let query = format!(
            "SELECT {COLUMNS} FROM loras \
             WHERE {} \
             ORDER BY download_count DESC \
             LIMIT ${bind_idx} OFFSET ${}",
            conditions.join(" AND "),
            bind_idx + 1,
        );

        let mut q = sqlx::query_as::<_, Lora>(&query);

        if let Some(ref category) = params.category {
            q = q.bind(category);
        }
        if let Some(is_nsfw) = params.is_nsfw {
            q = q.bind(is_nsfw);
        }
        if let Some(ref search) = params.search {
            q = q.bind(format!("%{search}%"));
        }

        q.bind(limit).bind(offset).fetch_all(pool).await
    }

    /// Fetch a single adapter by slug (public or not).
    pub async fn find_by_slug(pool: &PgPool, slug: &str) -> Result<Option<Lora>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM loras WHERE slug = $1");
        sqlx::query_as::<_, Lora>(&query)
            .bind(slug)
            .fetch_optional(pool)
            .await
    }

    /// Atomically increment the download counter, returning the updated
    /// row. A read-then-write here would drop concurrent increments.
    pub async fn record_download(
        pool: &PgPool,
        slug: &str,
    ) -> Result<Option<Lora>, sqlx::Error> {
        let query = format!(
            "UPDATE loras SET download_count = download_count + 1 \
             WHERE slug = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Lora>(&query)
            .bind(slug)
            .fetch_optional(pool)
            .await
    }
}
