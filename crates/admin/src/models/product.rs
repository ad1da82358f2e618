//! Products in the catalog.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::types::Json;

use storedesk_core::{BrandId, CategoryId, ProductId, VendorId};

use super::{BrandRef, CategoryRef, Populated, VendorRef};
use crate::validation::{Mode, Validate, ValidationErrors, Validator};

/// A named product option and its values, e.g. `color: [red, blue]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductOption {
    pub name: String,
    #[serde(default)]
    pub values: Vec<String>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(rename = "_id")]
    pub id: ProductId,
    #[serde(rename = "product_name")]
    pub product_name: String,
    pub description: Option<String>,
    pub slug: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub sale_price: Option<Decimal>,
    pub stock: i32,
    pub category: Populated<CategoryRef>,
    pub brand: Populated<BrandRef>,
    pub vendor: Populated<VendorRef>,
    pub images: Vec<String>,
    pub attributes: Json<Vec<ProductOption>>,
    #[serde(with = "rust_decimal::serde::float")]
    pub rating: Decimal,
    pub review_count: i32,
    pub tags: Vec<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPayload {
    #[serde(rename = "product_name")]
    pub product_name: Option<String>,
    pub description: Option<String>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub price: Option<Decimal>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub sale_price: Option<Decimal>,
    pub stock: Option<i32>,
    pub category: Option<CategoryId>,
    pub brand: Option<BrandId>,
    pub vendor: Option<VendorId>,
    pub images: Option<Vec<String>>,
    pub attributes: Option<Vec<ProductOption>>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub rating: Option<Decimal>,
    pub review_count: Option<i32>,
    pub tags: Option<Vec<String>>,
    pub is_active: Option<bool>,
}

impl Validate for ProductPayload {
    fn validate(&self, mode: Mode) -> Result<(), ValidationErrors> {
        let mut v = Validator::new(mode);
        v.required_text("product_name", self.product_name.as_deref(), 1, 255);
        v.text("description", self.description.as_deref(), 0, 2000);
        v.required("price", self.price.as_ref());
        v.non_negative("price", self.price);
        v.non_negative("salePrice", self.sale_price);
        v.int_min("stock", self.stock, 0);
        v.each_text("images", self.images.as_deref(), 1, 255);
        for option in self.attributes.iter().flatten() {
            v.text("attributes", Some(&option.name), 1, 50);
        }
        v.decimal_range("rating", self.rating, Decimal::ZERO, Decimal::from(5));
        v.int_min("reviewCount", self.review_count, 0);
        v.each_text("tags", self.tags.as_deref(), 1, 50);
        v.finish()
    }
}

/// A sale price may not exceed the regular price.
///
/// Checked on the merged record, since an update may send only one of them.
pub fn check_sale_price(
    price: Decimal,
    sale_price: Option<Decimal>,
) -> Result<(), ValidationErrors> {
    match sale_price {
        Some(sale) if sale > price => Err(ValidationErrors::single(
            "salePrice",
            "salePrice must not exceed price",
        )),
        _ => Ok(()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_parses_references_and_money() {
        let payload: ProductPayload = serde_json::from_value(serde_json::json!({
            "product_name": "Oolong 100g",
            "price": 12.5,
            "salePrice": 9.99,
            "category": 2,
            "attributes": [{ "name": "weight", "values": ["100g", "250g"] }],
            "tags": ["tea"]
        }))
        .unwrap();
        assert_eq!(payload.price, Some(Decimal::new(125, 1)));
        assert_eq!(payload.sale_price, Some(Decimal::new(999, 2)));
        assert_eq!(payload.category, Some(CategoryId::new(2)));
        assert!(payload.validate(Mode::Create).is_ok());
    }

    #[test]
    fn test_create_requires_price() {
        let payload = ProductPayload {
            product_name: Some("Oolong".into()),
            ..Default::default()
        };
        let errors = payload.validate(Mode::Create).unwrap_err();
        assert_eq!(errors.to_string(), "price is required");
    }

    #[test]
    fn test_sale_price_rule() {
        assert!(check_sale_price(Decimal::from(10), Some(Decimal::from(8))).is_ok());
        assert!(check_sale_price(Decimal::from(10), Some(Decimal::from(10))).is_ok());
        assert!(check_sale_price(Decimal::from(10), None).is_ok());
        assert!(check_sale_price(Decimal::from(10), Some(Decimal::from(11))).is_err());
    }
}
