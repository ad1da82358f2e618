//! Product categories.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use storedesk_core::CategoryId;

use crate::validation::{Mode, Validate, ValidationErrors, Validator};

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    #[serde(rename = "_id")]
    pub id: CategoryId,
    #[serde(rename = "category_name")]
    pub category_name: String,
    pub description: Option<String>,
    pub slug: String,
    pub level: i32,
    pub image_url: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryPayload {
    #[serde(rename = "category_name")]
    pub category_name: Option<String>,
    pub description: Option<String>,
    pub level: Option<i32>,
    pub image_url: Option<String>,
    pub is_active: Option<bool>,
}

impl Validate for CategoryPayload {
    fn validate(&self, mode: Mode) -> Result<(), ValidationErrors> {
        let mut v = Validator::new(mode);
        v.required_text("category_name", self.category_name.as_deref(), 1, 50);
        v.text("description", self.description.as_deref(), 0, 500);
        v.int_min("level", self.level, 1);
        v.url("imageUrl", self.image_url.as_deref(), 255);
        v.finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_names() {
        let payload: CategoryPayload = serde_json::from_value(serde_json::json!({
            "category_name": "Tea",
            "imageUrl": "/uploads/categories/tea.png",
            "isActive": false
        }))
        .unwrap();
        assert_eq!(payload.category_name.as_deref(), Some("Tea"));
        assert_eq!(payload.is_active, Some(false));
        assert!(payload.validate(Mode::Create).is_ok());
    }

    #[test]
    fn test_validation() {
        let payload = CategoryPayload {
            category_name: Some("x".repeat(51)),
            level: Some(0),
            ..Default::default()
        };
        let errors = payload.validate(Mode::Update).unwrap_err();
        let fields: Vec<_> = errors.errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["category_name", "level"]);

        let errors = CategoryPayload::default().validate(Mode::Create).unwrap_err();
        assert_eq!(errors.to_string(), "category_name is required");
    }
}
