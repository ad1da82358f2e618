//! Product categories.

use sqlx::PgPool;

use storedesk_core::{CategoryId, build_slug};

use super::resource::{Filter, FilterKind, Resource, UniqueKey, Writable};
use super::{RepositoryError, map_write_error};
use crate::models::category::{Category, CategoryPayload};

pub struct Categories;

impl Resource for Categories {
    type Id = CategoryId;
    type Record = Category;

    const NAME: &'static str = "category";
    const COLLECTION: &'static str = "categories";
    const TABLE: &'static str = "shop.categories";
    const ALIAS: &'static str = "c";
    const SELECT: &'static str = "SELECT c.id, c.category_name, c.description, c.slug, c.level, \
                                  c.image_url, c.is_active, c.created_at, c.updated_at \
                                  FROM shop.categories c";
    const SEARCH: Option<&'static str> = Some("c.category_name");
    const SORTABLE: &'static [(&'static str, &'static str)] = &[
        ("category_name", "c.category_name"),
        ("level", "c.level"),
    ];
    const FILTERS: &'static [Filter] = &[
        Filter::new("category_name", "c.category_name", FilterKind::Contains),
        Filter::new("slug", "c.slug", FilterKind::Equals),
        Filter::new("isActive", "c.is_active", FilterKind::Bool),
    ];

    fn id(record: &Category) -> CategoryId {
        record.id
    }
}

impl Writable for Categories {
    type Payload = CategoryPayload;

    fn unique_keys(payload: &CategoryPayload) -> Vec<UniqueKey> {
        payload
            .category_name
            .iter()
            .map(|name| UniqueKey::new("category_name", "category_name", name.trim()))
            .collect()
    }

    async fn insert(pool: &PgPool, payload: CategoryPayload) -> Result<CategoryId, RepositoryError> {
        let name = payload.category_name.as_deref().unwrap_or_default().trim();

        let id: i32 = sqlx::query_scalar(
            r"
            INSERT INTO shop.categories (category_name, description, slug, level, image_url, is_active)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            ",
        )
        .bind(name)
        .bind(payload.description)
        .bind(build_slug(name))
        .bind(payload.level.unwrap_or(1))
        .bind(payload.image_url)
        .bind(payload.is_active.unwrap_or(true))
        .fetch_one(pool)
        .await
        .map_err(|e| map_write_error(e, "category"))?;

        Ok(CategoryId::new(id))
    }

    async fn update(
        pool: &PgPool,
        id: CategoryId,
        payload: CategoryPayload,
    ) -> Result<(), RepositoryError> {
        let name = payload.category_name.as_deref().map(str::trim);

        let result = sqlx::query(
            r"
            UPDATE shop.categories SET
                category_name = COALESCE($2, category_name),
                slug = COALESCE($3, slug),
                description = COALESCE($4, description),
                level = COALESCE($5, level),
                image_url = COALESCE($6, image_url),
                is_active = COALESCE($7, is_active)
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(name)
        .bind(name.map(build_slug))
        .bind(payload.description)
        .bind(payload.level)
        .bind(payload.image_url)
        .bind(payload.is_active)
        .execute(pool)
        .await
        .map_err(|e| map_write_error(e, "category"))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

/// Active top-level categories, alphabetically.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn roots(pool: &PgPool) -> Result<Vec<Category>, RepositoryError> {
    let sql = format!(
        "{} WHERE c.level = 1 AND c.is_active ORDER BY c.category_name ASC",
        Categories::SELECT
    );
    let categories = sqlx::query_as::<_, Category>(&sql).fetch_all(pool).await?;
    Ok(categories)
}
