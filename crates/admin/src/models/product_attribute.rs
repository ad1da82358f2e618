//! Attribute definitions shared across products (size, color, material).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use storedesk_core::{AttributeType, ProductAttributeId};

use crate::validation::{Mode, Validate, ValidationErrors, Validator};

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ProductAttribute {
    #[serde(rename = "_id")]
    pub id: ProductAttributeId,
    pub name: String,
    pub display_name: String,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub kind: AttributeType,
    pub options: Vec<String>,
    pub is_filterable: bool,
    pub is_variant: bool,
    pub is_required: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductAttributePayload {
    pub name: Option<String>,
    pub display_name: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<AttributeType>,
    pub options: Option<Vec<String>>,
    pub is_filterable: Option<bool>,
    pub is_variant: Option<bool>,
    pub is_required: Option<bool>,
}

impl Validate for ProductAttributePayload {
    fn validate(&self, mode: Mode) -> Result<(), ValidationErrors> {
        let mut v = Validator::new(mode);
        v.required_text("name", self.name.as_deref(), 1, 50);
        v.required_text("displayName", self.display_name.as_deref(), 1, 100);
        v.text("description", self.description.as_deref(), 0, 255);
        v.required("type", self.kind.as_ref());
        v.each_text("options", self.options.as_deref(), 1, 100);
        v.finish()
    }
}

/// `select` attributes need at least one option; other types take none.
pub fn check_options(kind: AttributeType, options: &[String]) -> Result<(), ValidationErrors> {
    match (kind, options.is_empty()) {
        (AttributeType::Select, true) => Err(ValidationErrors::single(
            "options",
            "options are required for select attributes",
        )),
        (AttributeType::Select, false) | (_, true) => Ok(()),
        (_, false) => Err(ValidationErrors::single(
            "options",
            "options are only allowed for select attributes",
        )),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_type_key() {
        let payload: ProductAttributePayload = serde_json::from_value(serde_json::json!({
            "name": "color",
            "displayName": "Color",
            "type": "select",
            "options": ["red", "green"]
        }))
        .unwrap();
        assert_eq!(payload.kind, Some(AttributeType::Select));
        assert!(payload.validate(Mode::Create).is_ok());
    }

    #[test]
    fn test_options_rule() {
        assert!(check_options(AttributeType::Select, &["red".into()]).is_ok());
        assert!(check_options(AttributeType::Text, &[]).is_ok());
        assert_eq!(
            check_options(AttributeType::Select, &[]).unwrap_err().to_string(),
            "options are required for select attributes"
        );
        assert!(check_options(AttributeType::Number, &["1".into()]).is_err());
    }
}
