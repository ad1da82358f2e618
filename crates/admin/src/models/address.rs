//! Saved shipping and billing addresses of a user.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use storedesk_core::{AddressId, AddressType, UserId};

use super::{Populated, UserRef};
use crate::validation::{Mode, Validate, ValidationErrors, Validator};

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    #[serde(rename = "_id")]
    pub id: AddressId,
    pub user: Populated<UserRef>,
    #[serde(rename = "type")]
    pub kind: AddressType,
    pub full_name: String,
    pub phone_number: String,
    pub address_line1: String,
    pub address_line2: Option<String>,
    pub city: String,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country: String,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressPayload {
    pub user: Option<UserId>,
    #[serde(rename = "type")]
    pub kind: Option<AddressType>,
    pub full_name: Option<String>,
    pub phone_number: Option<String>,
    pub address_line1: Option<String>,
    pub address_line2: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
    pub is_default: Option<bool>,
}

impl Validate for AddressPayload {
    fn validate(&self, mode: Mode) -> Result<(), ValidationErrors> {
        let mut v = Validator::new(mode);
        v.required("user", self.user.as_ref());
        v.required_text("fullName", self.full_name.as_deref(), 1, 100);
        v.required_text("phoneNumber", self.phone_number.as_deref(), 1, 20);
        v.required_text("addressLine1", self.address_line1.as_deref(), 1, 255);
        v.text("addressLine2", self.address_line2.as_deref(), 0, 255);
        v.required_text("city", self.city.as_deref(), 1, 100);
        v.text("state", self.state.as_deref(), 0, 100);
        v.text("postalCode", self.postal_code.as_deref(), 0, 20);
        v.required_text("country", self.country.as_deref(), 1, 100);
        v.finish()
    }
}
