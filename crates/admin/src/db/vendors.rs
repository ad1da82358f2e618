//! Vendors.

use sqlx::PgPool;
use sqlx::types::Json;

use storedesk_core::VendorId;

use super::resource::{Filter, FilterKind, Resource, UniqueKey, Writable};
use super::{RepositoryError, map_write_error};
use crate::models::vendor::{Vendor, VendorPayload};

pub struct Vendors;

impl Resource for Vendors {
    type Id = VendorId;
    type Record = Vendor;

    const NAME: &'static str = "vendor";
    const COLLECTION: &'static str = "vendors";
    const TABLE: &'static str = "shop.vendors";
    const ALIAS: &'static str = "v";
    const SELECT: &'static str = r#"SELECT v.id,
        CASE WHEN u.id IS NULL THEN NULL ELSE json_build_object(
            '_id', u.id, 'userName', u.user_name, 'fullName', u.full_name, 'email', u.email
        ) END AS "user",
        v.company_name, v.description, v.logo_url, v.cover_image_url, v.address,
        v.contact_phone, v.contact_email, v.website, v.social_links, v.rating, v.status,
        v.created_at, v.updated_at
        FROM shop.vendors v
        LEFT JOIN shop.users u ON u.id = v.user_id"#;
    const SEARCH: Option<&'static str> = Some("v.company_name");
    const SORTABLE: &'static [(&'static str, &'static str)] =
        &[("companyName", "v.company_name"), ("rating", "v.rating")];
    const FILTERS: &'static [Filter] = &[
        Filter::new("companyName", "v.company_name", FilterKind::Contains),
        Filter::new("contactEmail", "v.contact_email", FilterKind::Contains),
        Filter::new("status", "v.status", FilterKind::Enum),
        Filter::new("user", "v.user_id", FilterKind::Id),
    ];

    fn id(record: &Vendor) -> VendorId {
        record.id
    }
}

impl Writable for Vendors {
    type Payload = VendorPayload;

    fn unique_keys(payload: &VendorPayload) -> Vec<UniqueKey> {
        payload
            .company_name
            .iter()
            .map(|name| UniqueKey::new("company_name", "companyName", name.trim()))
            .collect()
    }

    async fn insert(pool: &PgPool, payload: VendorPayload) -> Result<VendorId, RepositoryError> {
        let id: i32 = sqlx::query_scalar(
            r"
            INSERT INTO shop.vendors
                (user_id, company_name, description, logo_url, cover_image_url, address,
                 contact_phone, contact_email, website, social_links, rating, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, COALESCE($11, 0), $12)
            RETURNING id
            ",
        )
        .bind(payload.user)
        .bind(payload.company_name.as_deref().map(str::trim))
        .bind(payload.description)
        .bind(payload.logo_url)
        .bind(payload.cover_image_url)
        .bind(payload.address.map(Json))
        .bind(payload.contact_phone)
        .bind(payload.contact_email)
        .bind(payload.website)
        .bind(payload.social_links.map(Json))
        .bind(payload.rating)
        .bind(payload.status.unwrap_or_default())
        .fetch_one(pool)
        .await
        .map_err(|e| map_write_error(e, "vendor"))?;

        Ok(VendorId::new(id))
    }

    async fn update(pool: &PgPool, id: VendorId, payload: VendorPayload) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE shop.vendors SET
                user_id = COALESCE($2, user_id),
                company_name = COALESCE($3, company_name),
                description = COALESCE($4, description),
                logo_url = COALESCE($5, logo_url),
                cover_image_url = COALESCE($6, cover_image_url),
                address = COALESCE($7, address),
                contact_phone = COALESCE($8, contact_phone),
                contact_email = COALESCE($9, contact_email),
                website = COALESCE($10, website),
                social_links = COALESCE($11, social_links),
                rating = COALESCE($12, rating),
                status = COALESCE($13, status)
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(payload.user)
        .bind(payload.company_name.as_deref().map(str::trim))
        .bind(payload.description)
        .bind(payload.logo_url)
        .bind(payload.cover_image_url)
        .bind(payload.address.map(Json))
        .bind(payload.contact_phone)
        .bind(payload.contact_email)
        .bind(payload.website)
        .bind(payload.social_links.map(Json))
        .bind(payload.rating)
        .bind(payload.status)
        .execute(pool)
        .await
        .map_err(|e| map_write_error(e, "vendor"))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
