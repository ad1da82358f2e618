//! Attribute definitions.

use sqlx::PgPool;

use storedesk_core::{AttributeType, ProductAttributeId};

use super::resource::{self, Filter, FilterKind, Resource, UniqueKey, Writable};
use super::{RepositoryError, map_write_error};
use crate::models::product_attribute::{ProductAttribute, ProductAttributePayload, check_options};

pub struct ProductAttributes;

impl Resource for ProductAttributes {
    type Id = ProductAttributeId;
    type Record = ProductAttribute;

    const NAME: &'static str = "product attribute";
    const COLLECTION: &'static str = "productAttributes";
    const TABLE: &'static str = "shop.product_attributes";
    const ALIAS: &'static str = "a";
    const SELECT: &'static str = "SELECT a.id, a.name, a.display_name, a.description, a.type AS kind, \
                                  a.options, a.is_filterable, a.is_variant, a.is_required, \
                                  a.created_at, a.updated_at FROM shop.product_attributes a";
    const SEARCH: Option<&'static str> = Some("a.name");
    const SORTABLE: &'static [(&'static str, &'static str)] =
        &[("name", "a.name"), ("displayName", "a.display_name")];
    const FILTERS: &'static [Filter] = &[
        Filter::new("name", "a.name", FilterKind::Contains),
        Filter::new("type", "a.type", FilterKind::Enum),
        Filter::new("isFilterable", "a.is_filterable", FilterKind::Bool),
        Filter::new("isVariant", "a.is_variant", FilterKind::Bool),
    ];

    fn id(record: &ProductAttribute) -> ProductAttributeId {
        record.id
    }
}

impl Writable for ProductAttributes {
    type Payload = ProductAttributePayload;

    fn unique_keys(payload: &ProductAttributePayload) -> Vec<UniqueKey> {
        payload
            .name
            .iter()
            .map(|name| UniqueKey::new("name", "name", name.trim()))
            .collect()
    }

    async fn insert(
        pool: &PgPool,
        payload: ProductAttributePayload,
    ) -> Result<ProductAttributeId, RepositoryError> {
        let kind = payload.kind.unwrap_or(AttributeType::Text);
        let options = payload.options.unwrap_or_default();
        check_options(kind, &options)?;

        let id: i32 = sqlx::query_scalar(
            r"
            INSERT INTO shop.product_attributes
                (name, display_name, description, type, options, is_filterable, is_variant, is_required)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id
            ",
        )
        .bind(payload.name.as_deref().map(str::trim))
        .bind(payload.display_name)
        .bind(payload.description)
        .bind(kind)
        .bind(options)
        .bind(payload.is_filterable.unwrap_or(false))
        .bind(payload.is_variant.unwrap_or(false))
        .bind(payload.is_required.unwrap_or(false))
        .fetch_one(pool)
        .await
        .map_err(|e| map_write_error(e, "product attribute"))?;

        Ok(ProductAttributeId::new(id))
    }

    async fn update(
        pool: &PgPool,
        id: ProductAttributeId,
        payload: ProductAttributePayload,
    ) -> Result<(), RepositoryError> {
        let current = resource::get::<Self>(pool, id).await?;
        check_options(
            payload.kind.unwrap_or(current.kind),
            payload.options.as_deref().unwrap_or(&current.options),
        )?;

        sqlx::query(
            r"
            UPDATE shop.product_attributes SET
                name = COALESCE($2, name),
                display_name = COALESCE($3, display_name),
                description = COALESCE($4, description),
                type = COALESCE($5, type),
                options = COALESCE($6, options),
                is_filterable = COALESCE($7, is_filterable),
                is_variant = COALESCE($8, is_variant),
                is_required = COALESCE($9, is_required)
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(payload.name.as_deref().map(str::trim))
        .bind(payload.display_name)
        .bind(payload.description)
        .bind(payload.kind)
        .bind(payload.options)
        .bind(payload.is_filterable)
        .bind(payload.is_variant)
        .bind(payload.is_required)
        .execute(pool)
        .await
        .map_err(|e| map_write_error(e, "product attribute"))?;

        Ok(())
    }
}
