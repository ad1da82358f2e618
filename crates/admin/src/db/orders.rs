//! Orders.
//!
//! Amounts are recomputed from the line items on every write. Applying a
//! coupon and counting its use happen in the same transaction as the write.

use chrono::Utc;
use sqlx::PgPool;
use sqlx::types::Json;

use storedesk_core::{OrderId, OrderPaymentStatus, OrderStatus};

use super::coupons;
use super::resource::{self, Filter, FilterKind, Resource, UniqueKey, Writable};
use super::{RepositoryError, map_write_error};
use crate::models::coupon::normalize_code;
use crate::models::order::{
    Order, OrderPayload, generate_order_number, price_order, subtotal,
};

pub struct Orders;

impl Resource for Orders {
    type Id = OrderId;
    type Record = Order;

    const NAME: &'static str = "order";
    const COLLECTION: &'static str = "orders";
    const TABLE: &'static str = "shop.orders";
    const ALIAS: &'static str = "o";
    const SELECT: &'static str = r#"SELECT o.id,
        CASE WHEN u.id IS NULL THEN NULL ELSE json_build_object(
            '_id', u.id, 'userName', u.user_name, 'fullName', u.full_name, 'email', u.email
        ) END AS "user",
        o.order_number, o.products, o.subtotal, o.shipping_fee, o.tax, o.discount,
        o.total_amount, o.coupon_code, o.payment_method, o.payment_status, o.status,
        o.shipping_address, o.notes, o.created_at, o.updated_at
        FROM shop.orders o
        LEFT JOIN shop.users u ON u.id = o.user_id"#;
    const SEARCH: Option<&'static str> = Some("o.order_number");
    const SORTABLE: &'static [(&'static str, &'static str)] = &[
        ("orderNumber", "o.order_number"),
        ("totalAmount", "o.total_amount"),
        ("status", "o.status"),
    ];
    const FILTERS: &'static [Filter] = &[
        Filter::new("orderNumber", "o.order_number", FilterKind::Contains),
        Filter::new("status", "o.status", FilterKind::Enum),
        Filter::new("paymentStatus", "o.payment_status", FilterKind::Enum),
        Filter::new("paymentMethod", "o.payment_method", FilterKind::Enum),
        Filter::new("user", "o.user_id", FilterKind::Id),
    ];

    fn id(record: &Order) -> OrderId {
        record.id
    }
}

impl Writable for Orders {
    type Payload = OrderPayload;

    fn unique_keys(payload: &OrderPayload) -> Vec<UniqueKey> {
        payload
            .order_number
            .iter()
            .map(|number| UniqueKey::new("order_number", "orderNumber", number.trim()))
            .collect()
    }

    async fn insert(pool: &PgPool, payload: OrderPayload) -> Result<OrderId, RepositoryError> {
        let items = payload.products.unwrap_or_default();
        let shipping_fee = payload.shipping_fee.unwrap_or_default();
        let tax = payload.tax.unwrap_or_default();
        let coupon_code = payload.coupon_code.as_deref().map(normalize_code);

        let mut tx = pool.begin().await?;

        let (coupon, discount) = match &coupon_code {
            Some(code) => {
                let (coupon, discount) =
                    coupons::quote(&mut tx, code, subtotal(&items)?, true).await?;
                (Some(coupon), discount)
            }
            None => (None, payload.discount.unwrap_or_default()),
        };

        let totals = price_order(
            &items,
            shipping_fee,
            tax,
            discount,
            payload.subtotal,
            payload.total_amount,
        )?;

        let order_number = payload
            .order_number
            .map(|n| n.trim().to_owned())
            .unwrap_or_else(|| generate_order_number(Utc::now()));

        let id: i32 = sqlx::query_scalar(
            r"
            INSERT INTO shop.orders
                (user_id, order_number, products, subtotal, shipping_fee, tax, discount,
                 total_amount, coupon_code, payment_method, payment_status, status,
                 shipping_address, notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING id
            ",
        )
        .bind(payload.user)
        .bind(order_number)
        .bind(Json(items))
        .bind(totals.subtotal)
        .bind(totals.shipping_fee)
        .bind(totals.tax)
        .bind(totals.discount)
        .bind(totals.total)
        .bind(coupon_code)
        .bind(payload.payment_method)
        .bind(payload.payment_status.unwrap_or(OrderPaymentStatus::Pending))
        .bind(payload.status.unwrap_or(OrderStatus::Pending))
        .bind(payload.shipping_address.map(Json))
        .bind(payload.notes)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_write_error(e, "order"))?;

        if let Some(coupon) = coupon {
            coupons::increment_usage(&mut tx, coupon.id).await?;
        }

        tx.commit().await?;
        Ok(OrderId::new(id))
    }

    async fn update(pool: &PgPool, id: OrderId, payload: OrderPayload) -> Result<(), RepositoryError> {
        let current = resource::get::<Self>(pool, id).await?;

        let items = payload.products.unwrap_or_else(|| current.products.0.clone());
        let shipping_fee = payload.shipping_fee.unwrap_or(current.shipping_fee);
        let tax = payload.tax.unwrap_or(current.tax);
        let new_code = payload
            .coupon_code
            .as_deref()
            .map(normalize_code)
            .filter(|code| current.coupon_code.as_deref() != Some(code.as_str()));

        let mut tx = pool.begin().await?;

        let (coupon, discount) = match &new_code {
            Some(code) => {
                let (coupon, discount) =
                    coupons::quote(&mut tx, code, subtotal(&items)?, true).await?;
                (Some(coupon), discount)
            }
            None if current.coupon_code.is_some() => (None, current.discount),
            None => (None, payload.discount.unwrap_or(current.discount)),
        };

        let totals = price_order(
            &items,
            shipping_fee,
            tax,
            discount,
            payload.subtotal,
            payload.total_amount,
        )?;

        sqlx::query(
            r"
            UPDATE shop.orders SET
                user_id = COALESCE($2, user_id),
                order_number = COALESCE($3, order_number),
                products = $4,
                subtotal = $5,
                shipping_fee = $6,
                tax = $7,
                discount = $8,
                total_amount = $9,
                coupon_code = COALESCE($10, coupon_code),
                payment_method = COALESCE($11, payment_method),
                payment_status = COALESCE($12, payment_status),
                status = COALESCE($13, status),
                shipping_address = COALESCE($14, shipping_address),
                notes = COALESCE($15, notes)
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(payload.user)
        .bind(payload.order_number.as_deref().map(str::trim))
        .bind(Json(items))
        .bind(totals.subtotal)
        .bind(totals.shipping_fee)
        .bind(totals.tax)
        .bind(totals.discount)
        .bind(totals.total)
        .bind(new_code)
        .bind(payload.payment_method)
        .bind(payload.payment_status)
        .bind(payload.status)
        .bind(payload.shipping_address.map(Json))
        .bind(payload.notes)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_write_error(e, "order"))?;

        if let Some(coupon) = coupon {
            coupons::increment_usage(&mut tx, coupon.id).await?;
        }

        tx.commit().await?;
        Ok(())
    }
}
