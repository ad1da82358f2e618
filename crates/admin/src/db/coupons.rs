//! Coupons. Codes are stored upper-case.

use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};

use storedesk_core::CouponId;
use storedesk_core::totals::CouponError;

use super::resource::{self, Filter, FilterKind, Resource, UniqueKey, Writable};
use super::{RepositoryError, map_write_error};
use crate::models::coupon::{Coupon, CouponPayload, check_terms, normalize_code};
use crate::validation::ValidationErrors;

pub struct Coupons;

impl Resource for Coupons {
    type Id = CouponId;
    type Record = Coupon;

    const NAME: &'static str = "coupon";
    const COLLECTION: &'static str = "coupons";
    const TABLE: &'static str = "shop.coupons";
    const ALIAS: &'static str = "cp";
    const SELECT: &'static str = "SELECT cp.id, cp.code, cp.type AS kind, cp.value, cp.min_purchase, \
                                  cp.start_date, cp.end_date, cp.usage_limit, cp.usage_count, \
                                  cp.is_active, cp.created_at, cp.updated_at FROM shop.coupons cp";
    const SEARCH: Option<&'static str> = Some("cp.code");
    const SORTABLE: &'static [(&'static str, &'static str)] = &[
        ("code", "cp.code"),
        ("value", "cp.value"),
        ("startDate", "cp.start_date"),
        ("endDate", "cp.end_date"),
    ];
    const FILTERS: &'static [Filter] = &[
        Filter::new("code", "cp.code", FilterKind::Contains),
        Filter::new("type", "cp.type", FilterKind::Enum),
        Filter::new("isActive", "cp.is_active", FilterKind::Bool),
    ];

    fn id(record: &Coupon) -> CouponId {
        record.id
    }
}

impl Writable for Coupons {
    type Payload = CouponPayload;

    fn unique_keys(payload: &CouponPayload) -> Vec<UniqueKey> {
        payload
            .code
            .iter()
            .map(|code| UniqueKey::new("code", "code", normalize_code(code)))
            .collect()
    }

    async fn insert(pool: &PgPool, payload: CouponPayload) -> Result<CouponId, RepositoryError> {
        let (Some(kind), Some(value), Some(start_date), Some(end_date)) =
            (payload.kind, payload.value, payload.start_date, payload.end_date)
        else {
            return Err(ValidationErrors::single("coupon", "coupon terms are incomplete").into());
        };
        check_terms(&storedesk_core::totals::CouponTerms {
            kind,
            value,
            min_purchase: payload.min_purchase.unwrap_or_default(),
            start_date,
            end_date,
            usage_limit: payload.usage_limit.unwrap_or(0),
            usage_count: payload.usage_count.unwrap_or(0),
            is_active: payload.is_active.unwrap_or(true),
        })?;

        let id: i32 = sqlx::query_scalar(
            r"
            INSERT INTO shop.coupons
                (code, type, value, min_purchase, start_date, end_date, usage_limit,
                 usage_count, is_active)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id
            ",
        )
        .bind(payload.code.as_deref().map(normalize_code))
        .bind(kind)
        .bind(value)
        .bind(payload.min_purchase.unwrap_or_default())
        .bind(start_date)
        .bind(end_date)
        .bind(payload.usage_limit.unwrap_or(0))
        .bind(payload.usage_count.unwrap_or(0))
        .bind(payload.is_active.unwrap_or(true))
        .fetch_one(pool)
        .await
        .map_err(|e| map_write_error(e, "coupon"))?;

        Ok(CouponId::new(id))
    }

    async fn update(pool: &PgPool, id: CouponId, payload: CouponPayload) -> Result<(), RepositoryError> {
        let current = resource::get::<Self>(pool, id).await?;
        let mut merged = current.terms();
        merged.kind = payload.kind.unwrap_or(merged.kind);
        merged.value = payload.value.unwrap_or(merged.value);
        merged.start_date = payload.start_date.unwrap_or(merged.start_date);
        merged.end_date = payload.end_date.unwrap_or(merged.end_date);
        check_terms(&merged)?;

        sqlx::query(
            r"
            UPDATE shop.coupons SET
                code = COALESCE($2, code),
                type = COALESCE($3, type),
                value = COALESCE($4, value),
                min_purchase = COALESCE($5, min_purchase),
                start_date = COALESCE($6, start_date),
                end_date = COALESCE($7, end_date),
                usage_limit = COALESCE($8, usage_limit),
                usage_count = COALESCE($9, usage_count),
                is_active = COALESCE($10, is_active)
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(payload.code.as_deref().map(normalize_code))
        .bind(payload.kind)
        .bind(payload.value)
        .bind(payload.min_purchase)
        .bind(payload.start_date)
        .bind(payload.end_date)
        .bind(payload.usage_limit)
        .bind(payload.usage_count)
        .bind(payload.is_active)
        .execute(pool)
        .await
        .map_err(|e| map_write_error(e, "coupon"))?;

        Ok(())
    }
}

/// Look up a coupon by code, case-insensitively.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn find_by_code(
    conn: &mut PgConnection,
    code: &str,
    for_update: bool,
) -> Result<Option<Coupon>, RepositoryError> {
    let lock = if for_update { " FOR UPDATE OF cp" } else { "" };
    let sql = format!("{} WHERE upper(cp.code) = $1{lock}", Coupons::SELECT);
    let coupon = sqlx::query_as::<_, Coupon>(&sql)
        .bind(normalize_code(code))
        .fetch_optional(conn)
        .await?;
    Ok(coupon)
}

/// Discount a coupon grants on `subtotal` right now.
///
/// # Errors
///
/// Returns `RepositoryError::Invalid` naming `couponCode` when the code is
/// unknown or the coupon cannot be applied.
pub async fn quote(
    conn: &mut PgConnection,
    code: &str,
    subtotal: Decimal,
    for_update: bool,
) -> Result<(Coupon, Decimal), RepositoryError> {
    let coupon = find_by_code(conn, code, for_update)
        .await?
        .ok_or_else(|| ValidationErrors::single("couponCode", "coupon not found"))?;
    let discount = coupon
        .terms()
        .discount_for(subtotal, chrono::Utc::now())
        .map_err(|e: CouponError| {
            let field = match e {
                CouponError::Overflow => "subtotal",
                _ => "couponCode",
            };
            ValidationErrors::single(field, e.to_string())
        })?;
    Ok((coupon, discount))
}

/// Count one more use of a coupon.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn increment_usage(conn: &mut PgConnection, id: CouponId) -> Result<(), RepositoryError> {
    sqlx::query("UPDATE shop.coupons SET usage_count = usage_count + 1 WHERE id = $1")
        .bind(id)
        .execute(conn)
        .await?;
    Ok(())
}
