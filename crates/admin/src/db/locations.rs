//! Stock locations.

use sqlx::PgPool;

use storedesk_core::LocationId;

use super::resource::{Filter, FilterKind, Resource, UniqueKey, Writable};
use super::{RepositoryError, map_write_error};
use crate::models::location::{Location, LocationPayload};

pub struct Locations;

impl Resource for Locations {
    type Id = LocationId;
    type Record = Location;

    const NAME: &'static str = "location";
    const COLLECTION: &'static str = "locations";
    const TABLE: &'static str = "shop.locations";
    const ALIAS: &'static str = "l";
    const SELECT: &'static str = "SELECT l.id, l.name, l.address_line1, l.address_line2, l.city, \
                                  l.state, l.postal_code, l.country, l.is_active, \
                                  l.created_at, l.updated_at FROM shop.locations l";
    const SEARCH: Option<&'static str> = Some("l.name");
    const SORTABLE: &'static [(&'static str, &'static str)] =
        &[("name", "l.name"), ("city", "l.city"), ("country", "l.country")];
    const FILTERS: &'static [Filter] = &[
        Filter::new("name", "l.name", FilterKind::Contains),
        Filter::new("city", "l.city", FilterKind::Contains),
        Filter::new("country", "l.country", FilterKind::Contains),
        Filter::new("isActive", "l.is_active", FilterKind::Bool),
    ];

    fn id(record: &Location) -> LocationId {
        record.id
    }
}

impl Writable for Locations {
    type Payload = LocationPayload;

    fn unique_keys(payload: &LocationPayload) -> Vec<UniqueKey> {
        payload
            .name
            .iter()
            .map(|name| UniqueKey::new("name", "name", name.trim()))
            .collect()
    }

    async fn insert(pool: &PgPool, payload: LocationPayload) -> Result<LocationId, RepositoryError> {
        let id: i32 = sqlx::query_scalar(
            r"
            INSERT INTO shop.locations
                (name, address_line1, address_line2, city, state, postal_code, country, is_active)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id
            ",
        )
        .bind(payload.name.as_deref().map(str::trim))
        .bind(payload.address_line1)
        .bind(payload.address_line2)
        .bind(payload.city)
        .bind(payload.state)
        .bind(payload.postal_code)
        .bind(payload.country)
        .bind(payload.is_active.unwrap_or(true))
        .fetch_one(pool)
        .await
        .map_err(|e| map_write_error(e, "location"))?;

        Ok(LocationId::new(id))
    }

    async fn update(
        pool: &PgPool,
        id: LocationId,
        payload: LocationPayload,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE shop.locations SET
                name = COALESCE($2, name),
                address_line1 = COALESCE($3, address_line1),
                address_line2 = COALESCE($4, address_line2),
                city = COALESCE($5, city),
                state = COALESCE($6, state),
                postal_code = COALESCE($7, postal_code),
                country = COALESCE($8, country),
                is_active = COALESCE($9, is_active)
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(payload.name.as_deref().map(str::trim))
        .bind(payload.address_line1)
        .bind(payload.address_line2)
        .bind(payload.city)
        .bind(payload.state)
        .bind(payload.postal_code)
        .bind(payload.country)
        .bind(payload.is_active)
        .execute(pool)
        .await
        .map_err(|e| map_write_error(e, "location"))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
