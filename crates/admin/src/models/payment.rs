//! Payments recorded against orders. No gateway is contacted.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::types::Json;

use storedesk_core::{OrderId, PaymentChannel, PaymentId, PaymentStatus, UserId};

use super::{OrderRef, Populated, UserRef};
use crate::validation::{Mode, Validate, ValidationErrors, Validator};

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    #[serde(rename = "_id")]
    pub id: PaymentId,
    pub order: Populated<OrderRef>,
    pub user: Populated<UserRef>,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub method: PaymentChannel,
    pub status: PaymentStatus,
    pub transaction_id: Option<String>,
    pub gateway: Option<String>,
    pub metadata: Option<Json<serde_json::Value>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentPayload {
    pub order: Option<OrderId>,
    pub user: Option<UserId>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub amount: Option<Decimal>,
    pub method: Option<PaymentChannel>,
    pub status: Option<PaymentStatus>,
    pub transaction_id: Option<String>,
    pub gateway: Option<String>,
    pub metadata: Option<serde_json::Value>,
}

impl Validate for PaymentPayload {
    fn validate(&self, mode: Mode) -> Result<(), ValidationErrors> {
        let mut v = Validator::new(mode);
        v.required("order", self.order.as_ref());
        v.required("user", self.user.as_ref());
        v.required("amount", self.amount.as_ref());
        v.positive("amount", self.amount);
        v.required("method", self.method.as_ref());
        v.text("transactionId", self.transaction_id.as_deref(), 1, 100);
        v.text("gateway", self.gateway.as_deref(), 0, 50);
        v.object("metadata", self.metadata.as_ref());
        v.finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_amount_must_be_positive() {
        let payload: PaymentPayload = serde_json::from_value(serde_json::json!({
            "order": 1,
            "user": 1,
            "amount": 0,
            "method": "cod"
        }))
        .unwrap();
        let errors = payload.validate(Mode::Create).unwrap_err();
        assert_eq!(errors.to_string(), "amount must be greater than 0");
    }
}
