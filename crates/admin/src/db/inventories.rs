//! Per-location stock.
//!
//! The `status` of a record (normal, low, out of stock) is derived on read
//! from quantity and threshold; it is not stored.

use sqlx::PgPool;

use storedesk_core::InventoryId;

use super::resource::{self, Filter, FilterKind, Resource, UniqueKey, Writable};
use super::{RepositoryError, map_write_error};
use crate::models::inventory::{
    DEFAULT_LOW_STOCK_THRESHOLD, Inventory, InventoryPayload, check_reserved,
};

pub struct Inventories;

impl Resource for Inventories {
    type Id = InventoryId;
    type Record = Inventory;

    const NAME: &'static str = "inventory";
    const COLLECTION: &'static str = "inventories";
    const TABLE: &'static str = "shop.product_inventories";
    const ALIAS: &'static str = "i";
    const SELECT: &'static str = r"SELECT i.id,
        CASE WHEN p.id IS NULL THEN NULL ELSE json_build_object(
            '_id', p.id, 'product_name', p.product_name, 'slug', p.slug, 'price', p.price
        ) END AS product,
        CASE WHEN pv.id IS NULL THEN NULL ELSE json_build_object(
            '_id', pv.id, 'sku', pv.sku, 'variantName', pv.variant_name
        ) END AS variant,
        CASE WHEN l.id IS NULL THEN NULL ELSE json_build_object(
            '_id', l.id, 'name', l.name
        ) END AS location,
        i.quantity, i.reserved_quantity, i.low_stock_threshold, i.last_restocked,
        i.created_at, i.updated_at
        FROM shop.product_inventories i
        LEFT JOIN shop.products p ON p.id = i.product_id
        LEFT JOIN shop.product_variants pv ON pv.id = i.variant_id
        LEFT JOIN shop.locations l ON l.id = i.location_id";
    const SEARCH: Option<&'static str> = None;
    const SORTABLE: &'static [(&'static str, &'static str)] = &[
        ("quantity", "i.quantity"),
        ("reservedQuantity", "i.reserved_quantity"),
        ("lastRestocked", "i.last_restocked"),
    ];
    const FILTERS: &'static [Filter] = &[
        Filter::new("product", "i.product_id", FilterKind::Id),
        Filter::new("variant", "i.variant_id", FilterKind::Id),
        Filter::new("location", "i.location_id", FilterKind::Id),
    ];

    fn id(record: &Inventory) -> InventoryId {
        record.id
    }

    fn present(record: Inventory) -> Inventory {
        record.with_status()
    }
}

impl Writable for Inventories {
    type Payload = InventoryPayload;

    fn unique_keys(_payload: &InventoryPayload) -> Vec<UniqueKey> {
        Vec::new()
    }

    async fn insert(pool: &PgPool, payload: InventoryPayload) -> Result<InventoryId, RepositoryError> {
        let quantity = payload.quantity.unwrap_or(0);
        let reserved = payload.reserved_quantity.unwrap_or(0);
        check_reserved(quantity, reserved)?;

        let id: i32 = sqlx::query_scalar(
            r"
            INSERT INTO shop.product_inventories
                (product_id, variant_id, location_id, quantity, reserved_quantity,
                 low_stock_threshold, last_restocked)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id
            ",
        )
        .bind(payload.product)
        .bind(payload.variant)
        .bind(payload.location)
        .bind(quantity)
        .bind(reserved)
        .bind(payload.low_stock_threshold.unwrap_or(DEFAULT_LOW_STOCK_THRESHOLD))
        .bind(payload.last_restocked)
        .fetch_one(pool)
        .await
        .map_err(|e| map_write_error(e, "inventory"))?;

        Ok(InventoryId::new(id))
    }

    async fn update(
        pool: &PgPool,
        id: InventoryId,
        payload: InventoryPayload,
    ) -> Result<(), RepositoryError> {
        let current = resource::get::<Self>(pool, id).await?;
        check_reserved(
            payload.quantity.unwrap_or(current.quantity),
            payload.reserved_quantity.unwrap_or(current.reserved_quantity),
        )?;

        sqlx::query(
            r"
            UPDATE shop.product_inventories SET
                product_id = COALESCE($2, product_id),
                variant_id = COALESCE($3, variant_id),
                location_id = COALESCE($4, location_id),
                quantity = COALESCE($5, quantity),
                reserved_quantity = COALESCE($6, reserved_quantity),
                low_stock_threshold = COALESCE($7, low_stock_threshold),
                last_restocked = COALESCE($8, last_restocked)
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(payload.product)
        .bind(payload.variant)
        .bind(payload.location)
        .bind(payload.quantity)
        .bind(payload.reserved_quantity)
        .bind(payload.low_stock_threshold)
        .bind(payload.last_restocked)
        .execute(pool)
        .await
        .map_err(|e| map_write_error(e, "inventory"))?;

        Ok(())
    }
}
