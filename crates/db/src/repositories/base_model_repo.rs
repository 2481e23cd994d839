//! Repository for the `base_models` catalog.

use sqlx::PgPool;

use crate::models::base_model::{BaseModel, BaseModelListQuery};

/// Column list for `base_models` queries.
const COLUMNS: &str =
    "id, name, slug, description, model_type, storage_key, created_at";

/// Read access to the base model catalog.
pub struct BaseModelRepo;

impl BaseModelRepo {
    /// List base models alphabetically, optionally filtered by type.
    pub async fn list(
        pool: &PgPool,
        params: &BaseModelListQuery,
    ) -> Result<Vec<BaseModel>, sqlx::Error> {
        match &params.model_type {
            Some(model_type) => {
                let query = format!(
                    "SELECT {COLUMNS} FROM base_models WHERE model_type = $1 ORDER BY name ASC"
                );
                sqlx::query_as::<_, BaseModel>(&query)
                    .bind(model_type)
                    .fetch_all(pool)
                    .await
            }
            None => {
                let query = format!("SELECT {COLUMNS} FROM base_models ORDER BY name ASC");
                sqlx::query_as::<_, BaseModel>(&query).fetch_all(pool).await
            }
        }
    }

    /// Fetch a single base model by slug.
    pub async fn find_by_slug(
        pool: &PgPool,
        slug: &str,
    ) -> Result<Option<BaseModel>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM base_models WHERE slug = $1");
        sqlx::query_as::<_, BaseModel>(&query)
            .bind(slug)
            .fetch_optional(pool)
            .await
    }
}
