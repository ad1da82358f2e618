//! Shopping carts. Each user has at most one.
//!
//! Line totals and the cart total are always recomputed from the items; a
//! total sent by the client is only checked against the computed value.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::types::Json;

use storedesk_core::totals::{self, LineItem};
use storedesk_core::{CartId, ProductId, UserId, VariantId};

use super::{Populated, UserRef};
use crate::validation::{FieldError, Mode, Validate, ValidationErrors, Validator};

/// A priced line in a cart, as stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_id: Option<ProductId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_variant: Option<VariantId>,
    pub name: String,
    pub quantity: i32,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub sale_price: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_amount: Decimal,
}

/// A cart line as sent by the client.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItemInput {
    pub product_id: Option<ProductId>,
    pub product_variant: Option<VariantId>,
    #[serde(default)]
    pub name: String,
    pub quantity: i32,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub sale_price: Option<Decimal>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub total_amount: Option<Decimal>,
}

impl CartItemInput {
    fn line(&self) -> LineItem {
        LineItem::new(self.quantity, self.price).with_sale_price(self.sale_price)
    }
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    #[serde(rename = "_id")]
    pub id: CartId,
    pub user: Populated<UserRef>,
    pub items: Json<Vec<CartItem>>,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_amount: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartPayload {
    pub user: Option<UserId>,
    pub items: Option<Vec<CartItemInput>>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub total_amount: Option<Decimal>,
}

impl Validate for CartPayload {
    fn validate(&self, mode: Mode) -> Result<(), ValidationErrors> {
        let mut v = Validator::new(mode);
        v.required("user", self.user.as_ref());
        for (i, item) in self.items.iter().flatten().enumerate() {
            let field = format!("items[{i}]");
            v.text(&format!("{field}.name"), Some(&item.name), 1, 255);
            v.int_min(&format!("{field}.quantity"), Some(item.quantity), 1);
            v.non_negative(&format!("{field}.price"), Some(item.price));
            v.non_negative(&format!("{field}.salePrice"), item.sale_price);
        }
        v.non_negative("totalAmount", self.total_amount);
        v.finish()
    }
}

/// Items and total of a cart after server-side pricing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricedCart {
    pub items: Vec<CartItem>,
    pub total_amount: Decimal,
}

/// Price every line and the cart, reconciling any client-sent totals.
///
/// # Errors
///
/// Returns a field error for every submitted total that differs from the
/// computed one by more than a cent, and for any total too large to store.
pub fn price_cart(
    items: &[CartItemInput],
    submitted_total: Option<Decimal>,
) -> Result<PricedCart, ValidationErrors> {
    let mut errors = Vec::new();
    let mut priced = Vec::with_capacity(items.len());

    for (i, input) in items.iter().enumerate() {
        let computed = match input.line().line_total() {
            Ok(computed) => computed,
            Err(e) => {
                errors.push(FieldError {
                    field: format!("items[{i}].price"),
                    message: e.to_string(),
                });
                continue;
            }
        };
        if let Err(e) = totals::reconcile(input.total_amount, computed) {
            errors.push(FieldError {
                field: format!("items[{i}].totalAmount"),
                message: e.to_string(),
            });
        }
        priced.push(CartItem {
            product_id: input.product_id,
            product_variant: input.product_variant,
            name: input.name.trim().to_owned(),
            quantity: input.quantity,
            price: input.price,
            sale_price: input.sale_price,
            total_amount: computed,
        });
    }

    if priced.len() < items.len() {
        return Err(ValidationErrors { errors });
    }

    let lines: Vec<LineItem> = items.iter().map(CartItemInput::line).collect();
    let total_amount = match totals::cart_total(&lines)
        .and_then(|computed| totals::reconcile(submitted_total, computed))
    {
        Ok(total) => total,
        Err(e) => {
            errors.push(FieldError {
                field: "totalAmount".into(),
                message: e.to_string(),
            });
            Decimal::ZERO
        }
    };

    if !errors.is_empty() {
        return Err(ValidationErrors { errors });
    }
    Ok(PricedCart {
        items: priced,
        total_amount,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn items(json: serde_json::Value) -> Vec<CartItemInput> {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_recomputes_totals() {
        let items = items(serde_json::json!([
            { "name": "Oolong", "quantity": 2, "price": 12.5 },
            { "name": "Cup", "quantity": 3, "price": 10, "salePrice": 8 }
        ]));
        let cart = price_cart(&items, None).unwrap();
        assert_eq!(cart.items[0].total_amount, Decimal::from(25));
        assert_eq!(cart.items[1].total_amount, Decimal::from(24));
        assert_eq!(cart.total_amount, Decimal::from(49));
    }

    #[test]
    fn test_sale_price_above_price_is_ignored() {
        let items = items(serde_json::json!([
            { "name": "Cup", "quantity": 1, "price": 10, "salePrice": 12 }
        ]));
        let cart = price_cart(&items, Some(Decimal::from(10))).unwrap();
        assert_eq!(cart.total_amount, Decimal::from(10));
    }

    #[test]
    fn test_total_within_a_cent_is_accepted() {
        let items = items(serde_json::json!([
            { "name": "Tea", "quantity": 3, "price": 3.33 }
        ]));
        let cart = price_cart(&items, Some("9.995".parse().unwrap())).unwrap();
        assert_eq!(cart.total_amount, "9.99".parse::<Decimal>().unwrap());
    }

    #[test]
    fn test_mismatched_totals_rejected() {
        let items = items(serde_json::json!([
            { "name": "Tea", "quantity": 2, "price": 5, "totalAmount": 11 }
        ]));
        let errors = price_cart(&items, Some(Decimal::from(20))).unwrap_err();
        let fields: Vec<_> = errors.errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["items[0].totalAmount", "totalAmount"]);
    }

    #[test]
    fn test_oversized_amounts_are_field_errors() {
        let payload = CartPayload {
            user: Some(UserId::new(1)),
            items: Some(items(serde_json::json!([
                { "name": "Big", "quantity": 1000, "price": 1.0e20 }
            ]))),
            total_amount: None,
        };
        let errors = payload.validate(Mode::Create).unwrap_err();
        assert_eq!(errors.errors[0].field, "items[0].price");

        let line_overflow = items(serde_json::json!([
            { "name": "Big", "quantity": 1000, "price": 9_999_999_999.99 }
        ]));
        let errors = price_cart(&line_overflow, None).unwrap_err();
        let fields: Vec<_> = errors.errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["items[0].price"]);

        let sum_overflow = items(serde_json::json!([
            { "name": "A", "quantity": 1, "price": 9_000_000_000_i64 },
            { "name": "B", "quantity": 1, "price": 9_000_000_000_i64 }
        ]));
        let errors = price_cart(&sum_overflow, None).unwrap_err();
        let fields: Vec<_> = errors.errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["totalAmount"]);
    }

    #[test]
    fn test_empty_cart() {
        let cart = price_cart(&[], Some(Decimal::ZERO)).unwrap();
        assert!(cart.items.is_empty());
        assert_eq!(cart.total_amount, Decimal::ZERO);
    }

    #[test]
    fn test_item_validation() {
        let payload = CartPayload {
            user: None,
            items: Some(items(serde_json::json!([
                { "name": "Tea", "quantity": 0, "price": -1 }
            ]))),
            total_amount: None,
        };
        let errors = payload.validate(Mode::Update).unwrap_err();
        let fields: Vec<_> = errors.errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["items[0].quantity", "items[0].price"]);
    }
}
