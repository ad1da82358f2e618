//! User addresses. A user has at most one default address per type.

use sqlx::PgPool;

use storedesk_core::{AddressId, AddressType};

use super::resource::{self, Filter, FilterKind, Resource, UniqueKey, Writable};
use super::{RepositoryError, map_write_error};
use crate::models::address::{Address, AddressPayload};
use crate::models::ref_id;

pub struct Addresses;

impl Resource for Addresses {
    type Id = AddressId;
    type Record = Address;

    const NAME: &'static str = "address";
    const COLLECTION: &'static str = "addresses";
    const TABLE: &'static str = "shop.addresses";
    const ALIAS: &'static str = "ad";
    const SELECT: &'static str = r#"SELECT ad.id,
        CASE WHEN u.id IS NULL THEN NULL ELSE json_build_object(
            '_id', u.id, 'userName', u.user_name, 'fullName', u.full_name, 'email', u.email
        ) END AS "user",
        ad.type AS kind, ad.full_name, ad.phone_number, ad.address_line1, ad.address_line2,
        ad.city, ad.state, ad.postal_code, ad.country, ad.is_default,
        ad.created_at, ad.updated_at
        FROM shop.addresses ad
        LEFT JOIN shop.users u ON u.id = ad.user_id"#;
    const SEARCH: Option<&'static str> = Some("ad.full_name");
    const SORTABLE: &'static [(&'static str, &'static str)] =
        &[("fullName", "ad.full_name"), ("city", "ad.city")];
    const FILTERS: &'static [Filter] = &[
        Filter::new("fullName", "ad.full_name", FilterKind::Contains),
        Filter::new("phoneNumber", "ad.phone_number", FilterKind::Contains),
        Filter::new("city", "ad.city", FilterKind::Contains),
        Filter::new("type", "ad.type", FilterKind::Enum),
        Filter::new("isDefault", "ad.is_default", FilterKind::Bool),
        Filter::new("user", "ad.user_id", FilterKind::Id),
    ];

    fn id(record: &Address) -> AddressId {
        record.id
    }
}

/// Clear the default flag on the user's other addresses of this type.
async fn clear_defaults(
    tx: &mut sqlx::PgConnection,
    user_id: i32,
    kind: AddressType,
    keep: Option<AddressId>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r"
        UPDATE shop.addresses SET is_default = FALSE
        WHERE user_id = $1 AND type = $2 AND is_default AND ($3::int IS NULL OR id <> $3)
        ",
    )
    .bind(user_id)
    .bind(kind)
    .bind(keep)
    .execute(tx)
    .await?;
    Ok(())
}

impl Writable for Addresses {
    type Payload = AddressPayload;

    fn unique_keys(_payload: &AddressPayload) -> Vec<UniqueKey> {
        Vec::new()
    }

    async fn insert(pool: &PgPool, payload: AddressPayload) -> Result<AddressId, RepositoryError> {
        let kind = payload.kind.unwrap_or(AddressType::Shipping);
        let is_default = payload.is_default.unwrap_or(false);
        let mut tx = pool.begin().await?;

        if is_default && let Some(user) = payload.user {
            clear_defaults(&mut tx, user.into(), kind, None).await?;
        }

        let id: i32 = sqlx::query_scalar(
            r"
            INSERT INTO shop.addresses
                (user_id, type, full_name, phone_number, address_line1, address_line2,
                 city, state, postal_code, country, is_default)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING id
            ",
        )
        .bind(payload.user)
        .bind(kind)
        .bind(payload.full_name)
        .bind(payload.phone_number)
        .bind(payload.address_line1)
        .bind(payload.address_line2)
        .bind(payload.city)
        .bind(payload.state)
        .bind(payload.postal_code)
        .bind(payload.country)
        .bind(is_default)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_write_error(e, "address"))?;

        tx.commit().await?;
        Ok(AddressId::new(id))
    }

    async fn update(pool: &PgPool, id: AddressId, payload: AddressPayload) -> Result<(), RepositoryError> {
        let current = resource::get::<Self>(pool, id).await?;
        let user = payload.user.or_else(|| ref_id(&current.user));
        let kind = payload.kind.unwrap_or(current.kind);
        let is_default = payload.is_default.unwrap_or(current.is_default);
        let mut tx = pool.begin().await?;

        // A default address moved to another user or type displaces that
        // slot's default too.
        if is_default && let Some(user) = user {
            clear_defaults(&mut tx, user.into(), kind, Some(id)).await?;
        }

        sqlx::query(
            r"
            UPDATE shop.addresses SET
                user_id = COALESCE($2, user_id),
                type = COALESCE($3, type),
                full_name = COALESCE($4, full_name),
                phone_number = COALESCE($5, phone_number),
                address_line1 = COALESCE($6, address_line1),
                address_line2 = COALESCE($7, address_line2),
                city = COALESCE($8, city),
                state = COALESCE($9, state),
                postal_code = COALESCE($10, postal_code),
                country = COALESCE($11, country),
                is_default = COALESCE($12, is_default)
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(payload.user)
        .bind(payload.kind)
        .bind(payload.full_name)
        .bind(payload.phone_number)
        .bind(payload.address_line1)
        .bind(payload.address_line2)
        .bind(payload.city)
        .bind(payload.state)
        .bind(payload.postal_code)
        .bind(payload.country)
        .bind(payload.is_default)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_write_error(e, "address"))?;

        tx.commit().await?;
        Ok(())
    }
}
