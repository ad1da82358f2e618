//! Products, populated with their category, brand and vendor.

use sqlx::PgPool;
use sqlx::types::Json;

use storedesk_core::{ProductId, build_slug};

use super::resource::{self, Filter, FilterKind, Resource, UniqueKey, Writable};
use super::{RepositoryError, map_write_error};
use crate::models::product::{Product, ProductPayload, check_sale_price};

pub struct Products;

impl Resource for Products {
    type Id = ProductId;
    type Record = Product;

    const NAME: &'static str = "product";
    const COLLECTION: &'static str = "products";
    const TABLE: &'static str = "shop.products";
    const ALIAS: &'static str = "p";
    const SELECT: &'static str = r"SELECT p.id, p.product_name, p.description, p.slug,
        p.price, p.sale_price, p.stock,
        CASE WHEN c.id IS NULL THEN NULL ELSE json_build_object(
            '_id', c.id, 'category_name', c.category_name, 'slug', c.slug
        ) END AS category,
        CASE WHEN b.id IS NULL THEN NULL ELSE json_build_object(
            '_id', b.id, 'brand_name', b.brand_name, 'slug', b.slug
        ) END AS brand,
        CASE WHEN v.id IS NULL THEN NULL ELSE json_build_object(
            '_id', v.id, 'companyName', v.company_name
        ) END AS vendor,
        p.images, p.attributes, p.rating, p.review_count, p.tags, p.is_active,
        p.created_at, p.updated_at
        FROM shop.products p
        LEFT JOIN shop.categories c ON c.id = p.category_id
        LEFT JOIN shop.brands b ON b.id = p.brand_id
        LEFT JOIN shop.vendors v ON v.id = p.vendor_id";
    const SEARCH: Option<&'static str> = Some("p.product_name");
    const SORTABLE: &'static [(&'static str, &'static str)] = &[
        ("product_name", "p.product_name"),
        ("price", "p.price"),
        ("stock", "p.stock"),
        ("rating", "p.rating"),
    ];
    const FILTERS: &'static [Filter] = &[
        Filter::new("product_name", "p.product_name", FilterKind::Contains),
        Filter::new("slug", "p.slug", FilterKind::Equals),
        Filter::new("category", "p.category_id", FilterKind::Id),
        Filter::new("brand", "p.brand_id", FilterKind::Id),
        Filter::new("vendor", "p.vendor_id", FilterKind::Id),
        Filter::new("isActive", "p.is_active", FilterKind::Bool),
    ];

    fn id(record: &Product) -> ProductId {
        record.id
    }
}

impl Writable for Products {
    type Payload = ProductPayload;

    fn unique_keys(payload: &ProductPayload) -> Vec<UniqueKey> {
        payload
            .product_name
            .iter()
            .map(|name| UniqueKey::new("product_name", "product_name", name.trim()))
            .collect()
    }

    async fn insert(pool: &PgPool, payload: ProductPayload) -> Result<ProductId, RepositoryError> {
        let name = payload.product_name.as_deref().unwrap_or_default().trim();
        let price = payload.price.unwrap_or_default();
        check_sale_price(price, payload.sale_price)?;

        let id: i32 = sqlx::query_scalar(
            r"
            INSERT INTO shop.products
                (product_name, description, slug, price, sale_price, stock, category_id,
                 brand_id, vendor_id, images, attributes, rating, review_count, tags, is_active)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            RETURNING id
            ",
        )
        .bind(name)
        .bind(payload.description)
        .bind(build_slug(name))
        .bind(price)
        .bind(payload.sale_price)
        .bind(payload.stock.unwrap_or(0))
        .bind(payload.category)
        .bind(payload.brand)
        .bind(payload.vendor)
        .bind(payload.images.unwrap_or_default())
        .bind(Json(payload.attributes.unwrap_or_default()))
        .bind(payload.rating.unwrap_or_default())
        .bind(payload.review_count.unwrap_or(0))
        .bind(payload.tags.unwrap_or_default())
        .bind(payload.is_active.unwrap_or(true))
        .fetch_one(pool)
        .await
        .map_err(|e| map_write_error(e, "product"))?;

        Ok(ProductId::new(id))
    }

    async fn update(pool: &PgPool, id: ProductId, payload: ProductPayload) -> Result<(), RepositoryError> {
        let current = resource::get::<Self>(pool, id).await?;
        check_sale_price(
            payload.price.unwrap_or(current.price),
            payload.sale_price.or(current.sale_price),
        )?;

        let name = payload.product_name.as_deref().map(str::trim);

        sqlx::query(
            r"
            UPDATE shop.products SET
                product_name = COALESCE($2, product_name),
                slug = COALESCE($3, slug),
                description = COALESCE($4, description),
                price = COALESCE($5, price),
                sale_price = COALESCE($6, sale_price),
                stock = COALESCE($7, stock),
                category_id = COALESCE($8, category_id),
                brand_id = COALESCE($9, brand_id),
                vendor_id = COALESCE($10, vendor_id),
                images = COALESCE($11, images),
                attributes = COALESCE($12, attributes),
                rating = COALESCE($13, rating),
                review_count = COALESCE($14, review_count),
                tags = COALESCE($15, tags),
                is_active = COALESCE($16, is_active)
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(name)
        .bind(name.map(build_slug))
        .bind(payload.description)
        .bind(payload.price)
        .bind(payload.sale_price)
        .bind(payload.stock)
        .bind(payload.category)
        .bind(payload.brand)
        .bind(payload.vendor)
        .bind(payload.images)
        .bind(payload.attributes.map(Json))
        .bind(payload.rating)
        .bind(payload.review_count)
        .bind(payload.tags)
        .bind(payload.is_active)
        .execute(pool)
        .await
        .map_err(|e| map_write_error(e, "product"))?;

        Ok(())
    }
}
