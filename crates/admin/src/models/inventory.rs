//! Stock held for a product (or one of its variants) at a location.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use storedesk_core::totals::{InventoryLevel, StockStatus};
use storedesk_core::{InventoryId, LocationId, ProductId, VariantId};

use super::{LocationRef, Populated, ProductRef, VariantRef};
use crate::validation::{Mode, Validate, ValidationErrors, Validator};

/// Threshold used when none is given.
pub const DEFAULT_LOW_STOCK_THRESHOLD: i32 = 10;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Inventory {
    #[serde(rename = "_id")]
    pub id: InventoryId,
    pub product: Populated<ProductRef>,
    pub variant: Populated<VariantRef>,
    pub location: Populated<LocationRef>,
    pub quantity: i32,
    pub reserved_quantity: i32,
    pub low_stock_threshold: i32,
    pub last_restocked: Option<DateTime<Utc>>,
    /// Derived from quantity and threshold; not stored.
    #[sqlx(skip)]
    pub status: StockStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Inventory {
    /// Fill in the derived stock status.
    #[must_use]
    pub fn with_status(mut self) -> Self {
        self.status = InventoryLevel {
            quantity: self.quantity,
            low_stock_threshold: self.low_stock_threshold,
        }
        .status();
        self
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryPayload {
    pub product: Option<ProductId>,
    pub variant: Option<VariantId>,
    pub location: Option<LocationId>,
    pub quantity: Option<i32>,
    pub reserved_quantity: Option<i32>,
    pub low_stock_threshold: Option<i32>,
    pub last_restocked: Option<DateTime<Utc>>,
}

impl Validate for InventoryPayload {
    fn validate(&self, mode: Mode) -> Result<(), ValidationErrors> {
        let mut v = Validator::new(mode);
        v.required("product", self.product.as_ref());
        v.required("location", self.location.as_ref());
        v.required("quantity", self.quantity.as_ref());
        v.int_min("quantity", self.quantity, 0);
        v.int_min("reservedQuantity", self.reserved_quantity, 0);
        v.int_min("lowStockThreshold", self.low_stock_threshold, 0);
        v.finish()
    }
}

/// Reserved units cannot exceed units on hand.
pub fn check_reserved(quantity: i32, reserved: i32) -> Result<(), ValidationErrors> {
    if reserved > quantity {
        return Err(ValidationErrors::single(
            "reservedQuantity",
            "reservedQuantity must not exceed quantity",
        ));
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_reserved_rule() {
        assert!(check_reserved(5, 5).is_ok());
        assert!(check_reserved(5, 0).is_ok());
        assert_eq!(
            check_reserved(5, 6).unwrap_err().to_string(),
            "reservedQuantity must not exceed quantity"
        );
    }

    #[test]
    fn test_create_requirements() {
        let payload: InventoryPayload = serde_json::from_value(serde_json::json!({
            "product": 1,
            "variant": 4,
            "quantity": -1
        }))
        .unwrap();
        let errors = payload.validate(Mode::Create).unwrap_err();
        let fields: Vec<_> = errors.errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["location", "quantity"]);
    }
}
