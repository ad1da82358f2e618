//! Product variants (SKUs).

use sqlx::PgPool;
use sqlx::types::Json;

use storedesk_core::VariantId;

use super::resource::{self, Filter, FilterKind, Resource, UniqueKey, Writable};
use super::{RepositoryError, map_write_error};
use crate::models::product::check_sale_price;
use crate::models::product_variant::{ProductVariant, ProductVariantPayload};

pub struct ProductVariants;

impl Resource for ProductVariants {
    type Id = VariantId;
    type Record = ProductVariant;

    const NAME: &'static str = "product variant";
    const COLLECTION: &'static str = "productVariants";
    const TABLE: &'static str = "shop.product_variants";
    const ALIAS: &'static str = "pv";
    const SELECT: &'static str = r"SELECT pv.id,
        CASE WHEN p.id IS NULL THEN NULL ELSE json_build_object(
            '_id', p.id, 'product_name', p.product_name, 'slug', p.slug, 'price', p.price
        ) END AS product,
        pv.sku, pv.variant_name, pv.attributes, pv.price, pv.sale_price, pv.stock, pv.images,
        pv.is_active, pv.created_at, pv.updated_at
        FROM shop.product_variants pv
        LEFT JOIN shop.products p ON p.id = pv.product_id";
    const SEARCH: Option<&'static str> = Some("pv.variant_name");
    const SORTABLE: &'static [(&'static str, &'static str)] = &[
        ("sku", "pv.sku"),
        ("variantName", "pv.variant_name"),
        ("price", "pv.price"),
        ("stock", "pv.stock"),
    ];
    const FILTERS: &'static [Filter] = &[
        Filter::new("sku", "pv.sku", FilterKind::Contains),
        Filter::new("variantName", "pv.variant_name", FilterKind::Contains),
        Filter::new("product", "pv.product_id", FilterKind::Id),
        Filter::new("isActive", "pv.is_active", FilterKind::Bool),
    ];

    fn id(record: &ProductVariant) -> VariantId {
        record.id
    }
}

impl Writable for ProductVariants {
    type Payload = ProductVariantPayload;

    fn unique_keys(payload: &ProductVariantPayload) -> Vec<UniqueKey> {
        payload
            .sku
            .iter()
            .map(|sku| UniqueKey::new("sku", "sku", sku.trim()))
            .collect()
    }

    async fn insert(
        pool: &PgPool,
        payload: ProductVariantPayload,
    ) -> Result<VariantId, RepositoryError> {
        let price = payload.price.unwrap_or_default();
        check_sale_price(price, payload.sale_price)?;

        let id: i32 = sqlx::query_scalar(
            r"
            INSERT INTO shop.product_variants
                (product_id, sku, variant_name, attributes, price, sale_price, stock, images, is_active)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id
            ",
        )
        .bind(payload.product)
        .bind(payload.sku.as_deref().map(str::trim))
        .bind(payload.variant_name)
        .bind(Json(payload.attributes.unwrap_or_default()))
        .bind(price)
        .bind(payload.sale_price)
        .bind(payload.stock.unwrap_or(0))
        .bind(payload.images.unwrap_or_default())
        .bind(payload.is_active.unwrap_or(true))
        .fetch_one(pool)
        .await
        .map_err(|e| map_write_error(e, "product variant"))?;

        Ok(VariantId::new(id))
    }

    async fn update(
        pool: &PgPool,
        id: VariantId,
        payload: ProductVariantPayload,
    ) -> Result<(), RepositoryError> {
        let current = resource::get::<Self>(pool, id).await?;
        check_sale_price(
            payload.price.unwrap_or(current.price),
            payload.sale_price.or(current.sale_price),
        )?;

        sqlx::query(
            r"
            UPDATE shop.product_variants SET
                product_id = COALESCE($2, product_id),
                sku = COALESCE($3, sku),
                variant_name = COALESCE($4, variant_name),
                attributes = COALESCE($5, attributes),
                price = COALESCE($6, price),
                sale_price = COALESCE($7, sale_price),
                stock = COALESCE($8, stock),
                images = COALESCE($9, images),
                is_active = COALESCE($10, is_active)
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(payload.product)
        .bind(payload.sku.as_deref().map(str::trim))
        .bind(payload.variant_name)
        .bind(payload.attributes.map(Json))
        .bind(payload.price)
        .bind(payload.sale_price)
        .bind(payload.stock)
        .bind(payload.images)
        .bind(payload.is_active)
        .execute(pool)
        .await
        .map_err(|e| map_write_error(e, "product variant"))?;

        Ok(())
    }
}
