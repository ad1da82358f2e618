//! Customer orders.
//!
//! The subtotal is the sum of the line items and
//! `totalAmount = subtotal + shippingFee + tax - discount`. When a coupon code
//! is given the discount comes from the coupon instead of the request.

use chrono::{DateTime, Utc};
use rand::Rng;
use rand::distr::Alphanumeric;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::types::Json;

use storedesk_core::totals::{self, LineItem, OrderTotals, TotalsError};
use storedesk_core::{OrderId, OrderPaymentStatus, OrderStatus, PaymentChannel, ProductId, UserId};

use super::{EmbeddedAddress, Populated, UserRef};
use crate::validation::{FieldError, Mode, Validate, ValidationErrors, Validator};

/// A purchased product line, as stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_id: Option<ProductId>,
    pub name: String,
    pub quantity: i32,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
}

impl OrderItem {
    fn line(&self) -> LineItem {
        LineItem::new(self.quantity, self.price)
    }
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(rename = "_id")]
    pub id: OrderId,
    pub user: Populated<UserRef>,
    pub order_number: String,
    pub products: Json<Vec<OrderItem>>,
    #[serde(with = "rust_decimal::serde::float")]
    pub subtotal: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub shipping_fee: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub tax: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub discount: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_amount: Decimal,
    pub coupon_code: Option<String>,
    pub payment_method: PaymentChannel,
    pub payment_status: OrderPaymentStatus,
    pub status: OrderStatus,
    pub shipping_address: Json<EmbeddedAddress>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderPayload {
    pub user: Option<UserId>,
    pub order_number: Option<String>,
    pub products: Option<Vec<OrderItem>>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub subtotal: Option<Decimal>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub shipping_fee: Option<Decimal>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub tax: Option<Decimal>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub discount: Option<Decimal>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub total_amount: Option<Decimal>,
    pub coupon_code: Option<String>,
    pub payment_method: Option<PaymentChannel>,
    pub payment_status: Option<OrderPaymentStatus>,
    pub status: Option<OrderStatus>,
    pub shipping_address: Option<serde_json::Value>,
    pub notes: Option<String>,
}

impl Validate for OrderPayload {
    fn validate(&self, mode: Mode) -> Result<(), ValidationErrors> {
        let mut v = Validator::new(mode);
        v.required("user", self.user.as_ref());
        v.text("orderNumber", self.order_number.as_deref(), 1, 50);
        v.required("products", self.products.as_ref());
        if let Some(products) = &self.products {
            v.check(!products.is_empty(), "products", "products must not be empty");
            for (i, item) in products.iter().enumerate() {
                v.text(&format!("products[{i}].name"), Some(&item.name), 1, 255);
                v.int_min(&format!("products[{i}].quantity"), Some(item.quantity), 1);
                v.non_negative(&format!("products[{i}].price"), Some(item.price));
            }
        }
        v.non_negative("shippingFee", self.shipping_fee);
        v.non_negative("tax", self.tax);
        v.non_negative("discount", self.discount);
        v.non_negative("totalAmount", self.total_amount);
        v.text("couponCode", self.coupon_code.as_deref(), 3, 30);
        v.required("paymentMethod", self.payment_method.as_ref());
        v.required("shippingAddress", self.shipping_address.as_ref());
        v.object("shippingAddress", self.shipping_address.as_ref());
        v.text("notes", self.notes.as_deref(), 0, 1000);
        v.finish()
    }
}

/// Sum of the order lines, before fees and discount.
///
/// # Errors
///
/// Returns a `products` field error when the sum is too large to store.
pub fn subtotal(items: &[OrderItem]) -> Result<Decimal, ValidationErrors> {
    let lines: Vec<LineItem> = items.iter().map(OrderItem::line).collect();
    totals::cart_total(&lines).map_err(|e| ValidationErrors::single("products", e.to_string()))
}

/// Compute an order's amounts and check the ones the client submitted.
///
/// # Errors
///
/// Returns field errors when the discount exceeds the order amount, an
/// amount is too large to store, or a submitted subtotal or total does not
/// reconcile.
pub fn price_order(
    items: &[OrderItem],
    shipping_fee: Decimal,
    tax: Decimal,
    discount: Decimal,
    submitted_subtotal: Option<Decimal>,
    submitted_total: Option<Decimal>,
) -> Result<OrderTotals, ValidationErrors> {
    let lines: Vec<LineItem> = items.iter().map(OrderItem::line).collect();
    let computed = totals::order_totals(&lines, shipping_fee, tax, discount).map_err(|e| {
        let field = match e {
            TotalsError::DiscountExceedsTotal { .. } => "discount",
            TotalsError::TotalMismatch { .. } | TotalsError::Overflow => "totalAmount",
        };
        ValidationErrors::single(field, e.to_string())
    })?;

    let mut errors = Vec::new();
    if let Err(e) = totals::reconcile(submitted_subtotal, computed.subtotal) {
        errors.push(FieldError {
            field: "subtotal".into(),
            message: e.to_string(),
        });
    }
    if let Err(e) = totals::reconcile(submitted_total, computed.total) {
        errors.push(FieldError {
            field: "totalAmount".into(),
            message: e.to_string(),
        });
    }
    if !errors.is_empty() {
        return Err(ValidationErrors { errors });
    }
    Ok(computed)
}

/// A fresh order number, `ORD-YYYYMMDD-XXXXXX`.
#[must_use]
pub fn generate_order_number(now: DateTime<Utc>) -> String {
    let suffix: String = rand::rng()
        .sample_iter(&Alphanumeric)
        .take(6)
        .map(|b| char::from(b).to_ascii_uppercase())
        .collect();
    format!("ORD-{}-{suffix}", now.format("%Y%m%d"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn items() -> Vec<OrderItem> {
        serde_json::from_value(serde_json::json!([
            { "productId": 1, "name": "Oolong", "quantity": 2, "price": 12.5 },
            { "name": "Cup", "quantity": 1, "price": 10 }
        ]))
        .unwrap()
    }

    #[test]
    fn test_price_order() {
        let totals = price_order(
            &items(),
            Decimal::from(5),
            Decimal::from(3),
            Decimal::from(8),
            None,
            Some(Decimal::from(35)),
        )
        .unwrap();
        assert_eq!(totals.subtotal, Decimal::from(35));
        assert_eq!(totals.total, Decimal::from(35));
    }

    #[test]
    fn test_price_order_rejects_mismatch() {
        let errors = price_order(
            &items(),
            Decimal::ZERO,
            Decimal::ZERO,
            Decimal::ZERO,
            Some(Decimal::from(30)),
            Some(Decimal::from(30)),
        )
        .unwrap_err();
        let fields: Vec<_> = errors.errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["subtotal", "totalAmount"]);
    }

    #[test]
    fn test_discount_larger_than_order() {
        let errors = price_order(
            &items(),
            Decimal::ZERO,
            Decimal::ZERO,
            Decimal::from(100),
            None,
            None,
        )
        .unwrap_err();
        assert_eq!(errors.errors[0].field, "discount");
    }

    #[test]
    fn test_oversized_order_is_a_field_error() {
        let big: Vec<OrderItem> = serde_json::from_value(serde_json::json!([
            { "name": "Crate", "quantity": 100_000, "price": 9_999_999_999.0 }
        ]))
        .unwrap();
        assert_eq!(subtotal(&big).unwrap_err().errors[0].field, "products");

        let errors = price_order(
            &items(),
            Decimal::from(9_999_999_999_i64),
            Decimal::from(9_999_999_999_i64),
            Decimal::ZERO,
            None,
            None,
        )
        .unwrap_err();
        assert_eq!(errors.errors[0].field, "totalAmount");
    }

    #[test]
    fn test_order_number_format() {
        let now = Utc.with_ymd_and_hms(2026, 3, 9, 10, 0, 0).unwrap();
        let number = generate_order_number(now);
        assert!(number.starts_with("ORD-20260309-"));
        let suffix = number.trim_start_matches("ORD-20260309-");
        assert_eq!(suffix.len(), 6);
        assert!(suffix.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    }

    #[test]
    fn test_create_requirements() {
        let payload = OrderPayload {
            user: Some(UserId::new(1)),
            products: Some(Vec::new()),
            ..Default::default()
        };
        let errors = payload.validate(Mode::Create).unwrap_err();
        let fields: Vec<_> = errors.errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["products", "paymentMethod", "shippingAddress"]);
    }
}
