//! Payment records.

use sqlx::PgPool;
use sqlx::types::Json;

use storedesk_core::{PaymentId, PaymentStatus};

use super::resource::{Filter, FilterKind, Resource, UniqueKey, Writable};
use super::{RepositoryError, map_write_error};
use crate::models::payment::{Payment, PaymentPayload};

pub struct Payments;

impl Resource for Payments {
    type Id = PaymentId;
    type Record = Payment;

    const NAME: &'static str = "payment";
    const COLLECTION: &'static str = "payments";
    const TABLE: &'static str = "shop.payments";
    const ALIAS: &'static str = "pay";
    const SELECT: &'static str = r#"SELECT pay.id,
        CASE WHEN o.id IS NULL THEN NULL ELSE json_build_object(
            '_id', o.id, 'orderNumber', o.order_number, 'totalAmount', o.total_amount
        ) END AS "order",
        CASE WHEN u.id IS NULL THEN NULL ELSE json_build_object(
            '_id', u.id, 'userName', u.user_name, 'fullName', u.full_name, 'email', u.email
        ) END AS "user",
        pay.amount, pay.method, pay.status, pay.transaction_id, pay.gateway, pay.metadata,
        pay.created_at, pay.updated_at
        FROM shop.payments pay
        LEFT JOIN shop.orders o ON o.id = pay.order_id
        LEFT JOIN shop.users u ON u.id = pay.user_id"#;
    const SEARCH: Option<&'static str> = Some("pay.transaction_id");
    const SORTABLE: &'static [(&'static str, &'static str)] = &[("amount", "pay.amount")];
    const FILTERS: &'static [Filter] = &[
        Filter::new("transactionId", "pay.transaction_id", FilterKind::Contains),
        Filter::new("method", "pay.method", FilterKind::Enum),
        Filter::new("status", "pay.status", FilterKind::Enum),
        Filter::new("order", "pay.order_id", FilterKind::Id),
        Filter::new("user", "pay.user_id", FilterKind::Id),
    ];

    fn id(record: &Payment) -> PaymentId {
        record.id
    }
}

impl Writable for Payments {
    type Payload = PaymentPayload;

    fn unique_keys(payload: &PaymentPayload) -> Vec<UniqueKey> {
        payload
            .transaction_id
            .iter()
            .map(|tx| UniqueKey::new("transaction_id", "transactionId", tx.trim()))
            .collect()
    }

    async fn insert(pool: &PgPool, payload: PaymentPayload) -> Result<PaymentId, RepositoryError> {
        let id: i32 = sqlx::query_scalar(
            r"
            INSERT INTO shop.payments
                (order_id, user_id, amount, method, status, transaction_id, gateway, metadata)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id
            ",
        )
        .bind(payload.order)
        .bind(payload.user)
        .bind(payload.amount)
        .bind(payload.method)
        .bind(payload.status.unwrap_or(PaymentStatus::Pending))
        .bind(payload.transaction_id.as_deref().map(str::trim))
        .bind(payload.gateway)
        .bind(payload.metadata.map(Json))
        .fetch_one(pool)
        .await
        .map_err(|e| map_write_error(e, "payment"))?;

        Ok(PaymentId::new(id))
    }

    async fn update(pool: &PgPool, id: PaymentId, payload: PaymentPayload) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE shop.payments SET
                order_id = COALESCE($2, order_id),
                user_id = COALESCE($3, user_id),
                amount = COALESCE($4, amount),
                method = COALESCE($5, method),
                status = COALESCE($6, status),
                transaction_id = COALESCE($7, transaction_id),
                gateway = COALESCE($8, gateway),
                metadata = COALESCE($9, metadata)
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(payload.order)
        .bind(payload.user)
        .bind(payload.amount)
        .bind(payload.method)
        .bind(payload.status)
        .bind(payload.transaction_id.as_deref().map(str::trim))
        .bind(payload.gateway)
        .bind(payload.metadata.map(Json))
        .execute(pool)
        .await
        .map_err(|e| map_write_error(e, "payment"))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
