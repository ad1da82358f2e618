//! Warehouses and stores that hold inventory.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use storedesk_core::LocationId;

use crate::validation::{Mode, Validate, ValidationErrors, Validator};

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    #[serde(rename = "_id")]
    pub id: LocationId,
    pub name: String,
    pub address_line1: String,
    pub address_line2: Option<String>,
    pub city: String,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationPayload {
    pub name: Option<String>,
    pub address_line1: Option<String>,
    pub address_line2: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
    pub is_active: Option<bool>,
}

impl Validate for LocationPayload {
    fn validate(&self, mode: Mode) -> Result<(), ValidationErrors> {
        let mut v = Validator::new(mode);
        v.required_text("name", self.name.as_deref(), 1, 100);
        v.required_text("addressLine1", self.address_line1.as_deref(), 1, 255);
        v.text("addressLine2", self.address_line2.as_deref(), 0, 255);
        v.required_text("city", self.city.as_deref(), 1, 100);
        v.text("state", self.state.as_deref(), 0, 100);
        v.text("postalCode", self.postal_code.as_deref(), 0, 20);
        v.required_text("country", self.country.as_deref(), 1, 100);
        v.finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_create_requires_address() {
        let payload = LocationPayload {
            name: Some("Main warehouse".into()),
            ..Default::default()
        };
        let errors = payload.validate(Mode::Create).unwrap_err();
        let fields: Vec<_> = errors.errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["addressLine1", "city", "country"]);
    }
}
