//! Product brands.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use storedesk_core::BrandId;

use crate::validation::{Mode, Validate, ValidationErrors, Validator};

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Brand {
    #[serde(rename = "_id")]
    pub id: BrandId,
    #[serde(rename = "brand_name")]
    pub brand_name: String,
    pub description: Option<String>,
    pub slug: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BrandPayload {
    pub brand_name: Option<String>,
    pub description: Option<String>,
}

impl Validate for BrandPayload {
    fn validate(&self, mode: Mode) -> Result<(), ValidationErrors> {
        let mut v = Validator::new(mode);
        v.required_text("brand_name", self.brand_name.as_deref(), 1, 50);
        v.text("description", self.description.as_deref(), 0, 500);
        v.finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_name_rejected() {
        let payload = BrandPayload {
            brand_name: Some("  ".into()),
            description: None,
        };
        let errors = payload.validate(Mode::Update).unwrap_err();
        assert_eq!(errors.to_string(), "brand_name must not be empty");
    }
}
