//! Product brands.

use sqlx::PgPool;

use storedesk_core::{BrandId, build_slug};

use super::resource::{Filter, FilterKind, Resource, UniqueKey, Writable};
use super::{RepositoryError, map_write_error};
use crate::models::brand::{Brand, BrandPayload};

pub struct Brands;

impl Resource for Brands {
    type Id = BrandId;
    type Record = Brand;

    const NAME: &'static str = "brand";
    const COLLECTION: &'static str = "brands";
    const TABLE: &'static str = "shop.brands";
    const ALIAS: &'static str = "b";
    const SELECT: &'static str = "SELECT b.id, b.brand_name, b.description, b.slug, \
                                  b.created_at, b.updated_at FROM shop.brands b";
    const SEARCH: Option<&'static str> = Some("b.brand_name");
    const SORTABLE: &'static [(&'static str, &'static str)] = &[("brand_name", "b.brand_name")];
    const FILTERS: &'static [Filter] = &[
        Filter::new("brand_name", "b.brand_name", FilterKind::Contains),
        Filter::new("slug", "b.slug", FilterKind::Equals),
    ];

    fn id(record: &Brand) -> BrandId {
        record.id
    }
}

impl Writable for Brands {
    type Payload = BrandPayload;

    fn unique_keys(payload: &BrandPayload) -> Vec<UniqueKey> {
        payload
            .brand_name
            .iter()
            .map(|name| UniqueKey::new("brand_name", "brand_name", name.trim()))
            .collect()
    }

    async fn insert(pool: &PgPool, payload: BrandPayload) -> Result<BrandId, RepositoryError> {
        let name = payload.brand_name.as_deref().unwrap_or_default().trim();

        let id: i32 = sqlx::query_scalar(
            "INSERT INTO shop.brands (brand_name, description, slug) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(name)
        .bind(payload.description)
        .bind(build_slug(name))
        .fetch_one(pool)
        .await
        .map_err(|e| map_write_error(e, "brand"))?;

        Ok(BrandId::new(id))
    }

    async fn update(pool: &PgPool, id: BrandId, payload: BrandPayload) -> Result<(), RepositoryError> {
        let name = payload.brand_name.as_deref().map(str::trim);

        let result = sqlx::query(
            r"
            UPDATE shop.brands SET
                brand_name = COALESCE($2, brand_name),
                slug = COALESCE($3, slug),
                description = COALESCE($4, description)
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(name)
        .bind(name.map(build_slug))
        .bind(payload.description)
        .execute(pool)
        .await
        .map_err(|e| map_write_error(e, "brand"))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
