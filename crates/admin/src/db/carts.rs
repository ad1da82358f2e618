//! Carts. Totals are priced server-side before every write.

use sqlx::PgPool;
use sqlx::types::Json;

use storedesk_core::CartId;

use super::resource::{Filter, FilterKind, Resource, UniqueKey, Writable};
use super::{RepositoryError, map_write_error};
use crate::models::cart::{Cart, CartPayload, price_cart};

pub struct Carts;

impl Resource for Carts {
    type Id = CartId;
    type Record = Cart;

    const NAME: &'static str = "cart";
    const COLLECTION: &'static str = "carts";
    const TABLE: &'static str = "shop.carts";
    const ALIAS: &'static str = "ct";
    const SELECT: &'static str = r#"SELECT ct.id,
        CASE WHEN u.id IS NULL THEN NULL ELSE json_build_object(
            '_id', u.id, 'userName', u.user_name, 'fullName', u.full_name, 'email', u.email
        ) END AS "user",
        ct.items, ct.total_amount, ct.created_at, ct.updated_at
        FROM shop.carts ct
        LEFT JOIN shop.users u ON u.id = ct.user_id"#;
    const SEARCH: Option<&'static str> = None;
    const SORTABLE: &'static [(&'static str, &'static str)] = &[("totalAmount", "ct.total_amount")];
    const FILTERS: &'static [Filter] = &[Filter::new("user", "ct.user_id", FilterKind::Id)];

    fn id(record: &Cart) -> CartId {
        record.id
    }
}

impl Writable for Carts {
    type Payload = CartPayload;

    fn unique_keys(_payload: &CartPayload) -> Vec<UniqueKey> {
        Vec::new()
    }

    async fn insert(pool: &PgPool, payload: CartPayload) -> Result<CartId, RepositoryError> {
        let priced = price_cart(payload.items.as_deref().unwrap_or_default(), payload.total_amount)?;

        let id: i32 = sqlx::query_scalar(
            "INSERT INTO shop.carts (user_id, items, total_amount) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(payload.user)
        .bind(Json(priced.items))
        .bind(priced.total_amount)
        .fetch_one(pool)
        .await
        .map_err(map_cart_error)?;

        Ok(CartId::new(id))
    }

    async fn update(pool: &PgPool, id: CartId, payload: CartPayload) -> Result<(), RepositoryError> {
        // Without new items the stored items stay and only a submitted total
        // is checked against them.
        let (items, total) = match payload.items.as_deref() {
            Some(items) => {
                let priced = price_cart(items, payload.total_amount)?;
                (Some(Json(priced.items)), Some(priced.total_amount))
            }
            None => {
                if let Some(submitted) = payload.total_amount {
                    let stored: rust_decimal::Decimal =
                        sqlx::query_scalar("SELECT total_amount FROM shop.carts WHERE id = $1")
                            .bind(id)
                            .fetch_optional(pool)
                            .await?
                            .ok_or(RepositoryError::NotFound)?;
                    storedesk_core::totals::reconcile(Some(submitted), stored).map_err(|e| {
                        crate::validation::ValidationErrors::single("totalAmount", e.to_string())
                    })?;
                }
                (None, None)
            }
        };

        let result = sqlx::query(
            r"
            UPDATE shop.carts SET
                user_id = COALESCE($2, user_id),
                items = COALESCE($3, items),
                total_amount = COALESCE($4, total_amount)
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(payload.user)
        .bind(items)
        .bind(total)
        .execute(pool)
        .await
        .map_err(map_cart_error)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

/// The only unique constraint on carts is one cart per user.
fn map_cart_error(err: sqlx::Error) -> RepositoryError {
    match map_write_error(err, "cart") {
        RepositoryError::Conflict(_) => {
            RepositoryError::Conflict("user already has a cart".to_owned())
        }
        other => other,
    }
}
