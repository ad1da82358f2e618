//! Stored payment methods. A user has at most one default.

use sqlx::PgPool;
use sqlx::types::Json;

use storedesk_core::PaymentMethodId;

use super::resource::{self, Filter, FilterKind, Resource, UniqueKey, Writable};
use super::{RepositoryError, map_write_error};
use crate::models::payment_method::{PaymentMethod, PaymentMethodPayload, check_expiry};
use crate::models::ref_id;

pub struct PaymentMethods;

impl Resource for PaymentMethods {
    type Id = PaymentMethodId;
    type Record = PaymentMethod;

    const NAME: &'static str = "payment method";
    const COLLECTION: &'static str = "paymentMethods";
    const TABLE: &'static str = "shop.payment_methods";
    const ALIAS: &'static str = "pm";
    const SELECT: &'static str = r#"SELECT pm.id,
        CASE WHEN u.id IS NULL THEN NULL ELSE json_build_object(
            '_id', u.id, 'userName', u.user_name, 'fullName', u.full_name, 'email', u.email
        ) END AS "user",
        pm.type AS kind, pm.provider, pm.account_number, pm.expiry_date, pm.cardholder_name,
        pm.billing_address, pm.is_default, pm.created_at, pm.updated_at
        FROM shop.payment_methods pm
        LEFT JOIN shop.users u ON u.id = pm.user_id"#;
    const SEARCH: Option<&'static str> = Some("pm.provider");
    const SORTABLE: &'static [(&'static str, &'static str)] = &[("provider", "pm.provider")];
    const FILTERS: &'static [Filter] = &[
        Filter::new("provider", "pm.provider", FilterKind::Contains),
        Filter::new("type", "pm.type", FilterKind::Enum),
        Filter::new("isDefault", "pm.is_default", FilterKind::Bool),
        Filter::new("user", "pm.user_id", FilterKind::Id),
    ];

    fn id(record: &PaymentMethod) -> PaymentMethodId {
        record.id
    }
}

async fn clear_defaults(
    tx: &mut sqlx::PgConnection,
    user_id: i32,
    keep: Option<PaymentMethodId>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r"
        UPDATE shop.payment_methods SET is_default = FALSE
        WHERE user_id = $1 AND is_default AND ($2::int IS NULL OR id <> $2)
        ",
    )
    .bind(user_id)
    .bind(keep)
    .execute(tx)
    .await?;
    Ok(())
}

impl Writable for PaymentMethods {
    type Payload = PaymentMethodPayload;

    fn unique_keys(_payload: &PaymentMethodPayload) -> Vec<UniqueKey> {
        Vec::new()
    }

    async fn insert(
        pool: &PgPool,
        payload: PaymentMethodPayload,
    ) -> Result<PaymentMethodId, RepositoryError> {
        if let Some(kind) = payload.kind {
            check_expiry(kind, payload.expiry_date.as_deref())?;
        }
        let is_default = payload.is_default.unwrap_or(false);
        let mut tx = pool.begin().await?;

        if is_default && let Some(user) = payload.user {
            clear_defaults(&mut tx, user.into(), None).await?;
        }

        let id: i32 = sqlx::query_scalar(
            r"
            INSERT INTO shop.payment_methods
                (user_id, type, provider, account_number, expiry_date, cardholder_name,
                 billing_address, is_default)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id
            ",
        )
        .bind(payload.user)
        .bind(payload.kind)
        .bind(payload.provider)
        .bind(payload.account_number)
        .bind(payload.expiry_date)
        .bind(payload.cardholder_name)
        .bind(payload.billing_address.map(Json))
        .bind(is_default)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_write_error(e, "payment method"))?;

        tx.commit().await?;
        Ok(PaymentMethodId::new(id))
    }

    async fn update(
        pool: &PgPool,
        id: PaymentMethodId,
        payload: PaymentMethodPayload,
    ) -> Result<(), RepositoryError> {
        let current = resource::get::<Self>(pool, id).await?;
        check_expiry(
            payload.kind.unwrap_or(current.kind),
            payload.expiry_date.as_deref().or(current.expiry_date.as_deref()),
        )?;
        let user = payload.user.or_else(|| ref_id(&current.user));
        let is_default = payload.is_default.unwrap_or(current.is_default);
        let mut tx = pool.begin().await?;

        if is_default && let Some(user) = user {
            clear_defaults(&mut tx, user.into(), Some(id)).await?;
        }

        sqlx::query(
            r"
            UPDATE shop.payment_methods SET
                user_id = COALESCE($2, user_id),
                type = COALESCE($3, type),
                provider = COALESCE($4, provider),
                account_number = COALESCE($5, account_number),
                expiry_date = COALESCE($6, expiry_date),
                cardholder_name = COALESCE($7, cardholder_name),
                billing_address = COALESCE($8, billing_address),
                is_default = COALESCE($9, is_default)
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(payload.user)
        .bind(payload.kind)
        .bind(payload.provider)
        .bind(payload.account_number)
        .bind(payload.expiry_date)
        .bind(payload.cardholder_name)
        .bind(payload.billing_address.map(Json))
        .bind(payload.is_default)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_write_error(e, "payment method"))?;

        tx.commit().await?;
        Ok(())
    }
}
