//! Stored payment instruments of a user.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use sqlx::types::Json;

use storedesk_core::{PaymentMethodId, PaymentMethodType, UserId};

use super::{EmbeddedAddress, Populated, UserRef};
use crate::validation::{Mode, Validate, ValidationErrors, Validator};

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PaymentMethod {
    #[serde(rename = "_id")]
    pub id: PaymentMethodId,
    pub user: Populated<UserRef>,
    #[serde(rename = "type")]
    pub kind: PaymentMethodType,
    pub provider: String,
    #[serde(serialize_with = "serialize_masked")]
    pub account_number: Option<String>,
    pub expiry_date: Option<String>,
    pub cardholder_name: Option<String>,
    pub billing_address: Option<Json<EmbeddedAddress>>,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Hide all but the last four characters: `•••• 1234`.
///
/// Numbers of four characters or fewer are hidden entirely.
#[must_use]
pub fn mask_account_number(number: &str) -> String {
    let digits: Vec<char> = number.chars().filter(|c| !c.is_whitespace()).collect();
    if digits.len() <= 4 {
        return "••••".to_owned();
    }
    let tail: String = digits.iter().skip(digits.len() - 4).collect();
    format!("•••• {tail}")
}

fn serialize_masked<S: Serializer>(value: &Option<String>, s: S) -> Result<S::Ok, S::Error> {
    match value {
        Some(number) => s.serialize_some(&mask_account_number(number)),
        None => s.serialize_none(),
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentMethodPayload {
    pub user: Option<UserId>,
    #[serde(rename = "type")]
    pub kind: Option<PaymentMethodType>,
    pub provider: Option<String>,
    pub account_number: Option<String>,
    pub expiry_date: Option<String>,
    pub cardholder_name: Option<String>,
    pub billing_address: Option<serde_json::Value>,
    pub is_default: Option<bool>,
}

impl Validate for PaymentMethodPayload {
    fn validate(&self, mode: Mode) -> Result<(), ValidationErrors> {
        let mut v = Validator::new(mode);
        v.required("user", self.user.as_ref());
        v.required("type", self.kind.as_ref());
        v.required_text("provider", self.provider.as_deref(), 1, 50);
        v.text("accountNumber", self.account_number.as_deref(), 4, 50);
        if let Some(expiry) = self.expiry_date.as_deref() {
            v.check(
                is_expiry_date(expiry),
                "expiryDate",
                "expiryDate must be in MM/YY format",
            );
        }
        v.text("cardholderName", self.cardholder_name.as_deref(), 0, 100);
        v.object("billingAddress", self.billing_address.as_ref());
        v.finish()
    }
}

/// `MM/YY` with a month between 01 and 12.
#[must_use]
pub fn is_expiry_date(value: &str) -> bool {
    let Some((month, year)) = value.split_once('/') else {
        return false;
    };
    month.len() == 2
        && year.len() == 2
        && year.chars().all(|c| c.is_ascii_digit())
        && month.parse::<u8>().is_ok_and(|m| (1..=12).contains(&m))
}

/// Credit cards must carry an expiry date.
pub fn check_expiry(
    kind: PaymentMethodType,
    expiry_date: Option<&str>,
) -> Result<(), ValidationErrors> {
    if kind == PaymentMethodType::CreditCard && expiry_date.is_none_or(str::is_empty) {
        return Err(ValidationErrors::single(
            "expiryDate",
            "expiryDate is required for credit cards",
        ));
    }
    Ok(())
}
