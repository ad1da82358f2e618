//! Discount coupons.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use storedesk_core::totals::CouponTerms;
use storedesk_core::{CouponId, CouponType};

use crate::validation::{Mode, Validate, ValidationErrors, Validator};

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Coupon {
    #[serde(rename = "_id")]
    pub id: CouponId,
    pub code: String,
    #[serde(rename = "type")]
    pub kind: CouponType,
    #[serde(with = "rust_decimal::serde::float")]
    pub value: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub min_purchase: Decimal,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub usage_limit: i32,
    pub usage_count: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Coupon {
    #[must_use]
    pub const fn terms(&self) -> CouponTerms {
        CouponTerms {
            kind: self.kind,
            value: self.value,
            min_purchase: self.min_purchase,
            start_date: self.start_date,
            end_date: self.end_date,
            usage_limit: self.usage_limit,
            usage_count: self.usage_count,
            is_active: self.is_active,
        }
    }
}

/// Codes are matched and stored upper-case.
#[must_use]
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CouponPayload {
    pub code: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<CouponType>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub value: Option<Decimal>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub min_purchase: Option<Decimal>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub usage_limit: Option<i32>,
    pub usage_count: Option<i32>,
    pub is_active: Option<bool>,
}

impl Validate for CouponPayload {
    fn validate(&self, mode: Mode) -> Result<(), ValidationErrors> {
        let mut v = Validator::new(mode);
        v.required_text("code", self.code.as_deref(), 3, 30);
        v.required("type", self.kind.as_ref());
        v.required("value", self.value.as_ref());
        v.positive("value", self.value);
        v.non_negative("minPurchase", self.min_purchase);
        v.required("startDate", self.start_date.as_ref());
        v.required("endDate", self.end_date.as_ref());
        v.int_min("usageLimit", self.usage_limit, 0);
        v.int_min("usageCount", self.usage_count, 0);
        v.finish()
    }
}

/// Rules that span fields, checked on the merged record.
pub fn check_terms(terms: &CouponTerms) -> Result<(), ValidationErrors> {
    let mut v = Validator::new(Mode::Update);
    v.check(
        terms.start_date < terms.end_date,
        "endDate",
        "endDate must be after startDate",
    );
    if terms.kind == CouponType::Percentage {
        v.check(
            terms.value <= Decimal::ONE_HUNDRED,
            "value",
            "percentage value must not exceed 100",
        );
    }
    v.finish()
}

/// Body of `POST /coupons/validate`.
#[derive(Debug, Clone, Deserialize)]
pub struct CouponCheck {
    pub code: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub subtotal: Decimal,
}

/// Result of a successful coupon check.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CouponQuote {
    pub coupon: Coupon,
    #[serde(with = "rust_decimal::serde::float")]
    pub discount: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn terms(kind: CouponType, value: i64) -> CouponTerms {
        let start = Utc::now();
        CouponTerms {
            kind,
            value: Decimal::from(value),
            min_purchase: Decimal::ZERO,
            start_date: start,
            end_date: start + Duration::days(30),
            usage_limit: 0,
            usage_count: 0,
            is_active: true,
        }
    }

    #[test]
    fn test_normalize_code() {
        assert_eq!(normalize_code("  summer10 "), "SUMMER10");
    }

    #[test]
    fn test_cross_field_rules() {
        assert!(check_terms(&terms(CouponType::Percentage, 20)).is_ok());
        assert!(check_terms(&terms(CouponType::Fixed, 250)).is_ok());
        assert_eq!(
            check_terms(&terms(CouponType::Percentage, 120)).unwrap_err().to_string(),
            "percentage value must not exceed 100"
        );

        let mut reversed = terms(CouponType::Fixed, 5);
        reversed.end_date = reversed.start_date;
        assert_eq!(
            check_terms(&reversed).unwrap_err().to_string(),
            "endDate must be after startDate"
        );
    }

    #[test]
    fn test_create_requirements() {
        let payload: CouponPayload = serde_json::from_value(serde_json::json!({
            "code": "SUMMER10",
            "type": "percentage",
            "value": 10,
            "startDate": "2026-06-01T00:00:00Z",
            "endDate": "2026-09-01T00:00:00Z"
        }))
        .unwrap();
        assert!(payload.validate(Mode::Create).is_ok());

        let errors = CouponPayload::default().validate(Mode::Create).unwrap_err();
        assert_eq!(errors.errors.len(), 5);
    }
}
