//! Sellable variants of a product, one per SKU.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::types::Json;

use storedesk_core::{ProductId, VariantId};

use super::{Populated, ProductRef};
use crate::validation::{Mode, Validate, ValidationErrors, Validator};

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ProductVariant {
    #[serde(rename = "_id")]
    pub id: VariantId,
    pub product: Populated<ProductRef>,
    pub sku: String,
    pub variant_name: String,
    pub attributes: Json<BTreeMap<String, String>>,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub sale_price: Option<Decimal>,
    pub stock: i32,
    pub images: Vec<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductVariantPayload {
    pub product: Option<ProductId>,
    pub sku: Option<String>,
    pub variant_name: Option<String>,
    pub attributes: Option<BTreeMap<String, String>>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub price: Option<Decimal>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub sale_price: Option<Decimal>,
    pub stock: Option<i32>,
    pub images: Option<Vec<String>>,
    pub is_active: Option<bool>,
}

impl Validate for ProductVariantPayload {
    fn validate(&self, mode: Mode) -> Result<(), ValidationErrors> {
        let mut v = Validator::new(mode);
        v.required("product", self.product.as_ref());
        v.required_text("sku", self.sku.as_deref(), 1, 100);
        v.required_text("variantName", self.variant_name.as_deref(), 1, 255);
        v.required("price", self.price.as_ref());
        v.non_negative("price", self.price);
        v.non_negative("salePrice", self.sale_price);
        v.int_min("stock", self.stock, 0);
        v.each_text("images", self.images.as_deref(), 1, 255);
        v.finish()
    }
}
