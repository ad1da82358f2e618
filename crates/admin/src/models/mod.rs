//! Domain models for the back-office API.
//!
//! Each entity module holds the record returned to clients and the payload
//! accepted on create and update. References to other records are returned
//! "populated": a small summary object in place of the bare id.

pub mod activity_log;
pub mod address;
pub mod brand;
pub mod cart;
pub mod category;
pub mod coupon;
pub mod inventory;
pub mod location;
pub mod notification;
pub mod order;
pub mod payment;
pub mod payment_method;
pub mod product;
pub mod product_attribute;
pub mod product_variant;
pub mod user;
pub mod vendor;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use storedesk_core::{
    BrandId, CategoryId, LocationId, OrderId, ProductId, UserId, VariantId, VendorId,
};

pub use user::{CurrentUser, User};

/// A populated reference column.
///
/// Built in SQL with `json_build_object` and `NULL` when the referenced row is
/// gone.
pub type Populated<T> = Option<sqlx::types::Json<T>>;

/// Id of a populated reference.
pub fn ref_id<T: HasId>(populated: &Populated<T>) -> Option<T::Id> {
    populated.as_ref().map(|json| json.0.id())
}

/// Summary objects that carry their record's id.
pub trait HasId {
    type Id: Copy;

    fn id(&self) -> Self::Id;
}

macro_rules! summary_id {
    ($ty:ident, $id:ty) => {
        impl HasId for $ty {
            type Id = $id;

            fn id(&self) -> $id {
                self.id
            }
        }
    };
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRef {
    #[serde(rename = "_id")]
    pub id: UserId,
    pub user_name: String,
    pub full_name: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRef {
    #[serde(rename = "_id")]
    pub id: CategoryId,
    pub category_name: String,
    pub slug: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrandRef {
    #[serde(rename = "_id")]
    pub id: BrandId,
    pub brand_name: String,
    pub slug: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VendorRef {
    #[serde(rename = "_id")]
    pub id: VendorId,
    pub company_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRef {
    #[serde(rename = "_id")]
    pub id: ProductId,
    pub product_name: String,
    pub slug: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantRef {
    #[serde(rename = "_id")]
    pub id: VariantId,
    pub sku: String,
    pub variant_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationRef {
    #[serde(rename = "_id")]
    pub id: LocationId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRef {
    #[serde(rename = "_id")]
    pub id: OrderId,
    pub order_number: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_amount: Decimal,
}

summary_id!(UserRef, UserId);
summary_id!(CategoryRef, CategoryId);
summary_id!(BrandRef, BrandId);
summary_id!(VendorRef, VendorId);
summary_id!(ProductRef, ProductId);
summary_id!(VariantRef, VariantId);
summary_id!(LocationRef, LocationId);
summary_id!(OrderRef, OrderId);

/// A postal address embedded in vendors, orders and payment methods.
///
/// Stored as JSONB. Unknown keys are kept.
pub type EmbeddedAddress = serde_json::Map<String, serde_json::Value>;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_user_ref_wire_format() {
        let json = serde_json::json!({
            "_id": 4,
            "userName": "mai",
            "fullName": "Mai Tran",
            "email": "mai@example.org"
        });
        let user: UserRef = serde_json::from_value(json.clone()).unwrap();
        assert_eq!(user.id, UserId::new(4));
        assert_eq!(serde_json::to_value(&user).unwrap(), json);
    }

    #[test]
    fn test_ref_id() {
        let populated: Populated<LocationRef> = Some(sqlx::types::Json(LocationRef {
            id: LocationId::new(9),
            name: "Main warehouse".into(),
        }));
        assert_eq!(ref_id(&populated), Some(LocationId::new(9)));
        assert_eq!(ref_id::<LocationRef>(&None), None);
    }

    #[test]
    fn test_product_ref_price_is_number() {
        let json = serde_json::json!({
            "_id": 1,
            "product_name": "Tea",
            "slug": "tea",
            "price": 12.5
        });
        let product: ProductRef = serde_json::from_value(json).unwrap();
        assert_eq!(product.price, Decimal::new(125, 1));
        assert_eq!(serde_json::to_value(&product).unwrap()["price"], 12.5);
    }
}
