//! Vendors selling through the shop. Each belongs to a user account.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::types::Json;

use storedesk_core::{UserId, VendorId, VendorStatus};

use super::{EmbeddedAddress, Populated, UserRef};
use crate::validation::{Mode, Validate, ValidationErrors, Validator};

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Vendor {
    #[serde(rename = "_id")]
    pub id: VendorId,
    pub user: Populated<UserRef>,
    pub company_name: String,
    pub description: Option<String>,
    pub logo_url: Option<String>,
    pub cover_image_url: Option<String>,
    pub address: Option<Json<EmbeddedAddress>>,
    pub contact_phone: Option<String>,
    pub contact_email: Option<String>,
    pub website: Option<String>,
    pub social_links: Option<Json<serde_json::Map<String, serde_json::Value>>>,
    #[serde(with = "rust_decimal::serde::float")]
    pub rating: Decimal,
    pub status: VendorStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VendorPayload {
    pub user: Option<UserId>,
    pub company_name: Option<String>,
    pub description: Option<String>,
    pub logo_url: Option<String>,
    pub cover_image_url: Option<String>,
    pub address: Option<serde_json::Value>,
    pub contact_phone: Option<String>,
    pub contact_email: Option<String>,
    pub website: Option<String>,
    pub social_links: Option<serde_json::Value>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub rating: Option<Decimal>,
    pub status: Option<VendorStatus>,
}

impl Validate for VendorPayload {
    fn validate(&self, mode: Mode) -> Result<(), ValidationErrors> {
        let mut v = Validator::new(mode);
        v.required("user", self.user.as_ref());
        v.required_text("companyName", self.company_name.as_deref(), 1, 100);
        v.text("description", self.description.as_deref(), 0, 1000);
        v.url("logoUrl", self.logo_url.as_deref(), 255);
        v.url("coverImageUrl", self.cover_image_url.as_deref(), 255);
        v.object("address", self.address.as_ref());
        v.text("contactPhone", self.contact_phone.as_deref(), 0, 20);
        v.email("contactEmail", self.contact_email.as_deref());
        v.url("website", self.website.as_deref(), 255);
        v.object("socialLinks", self.social_links.as_ref());
        v.decimal_range("rating", self.rating, Decimal::ZERO, Decimal::from(5));
        v.finish()
    }
}
