//! Newtype IDs for type-safe entity references.
//!
//! Use the `define_id!` macro to create type-safe ID wrappers that prevent
//! accidentally mixing IDs from different entity types. Every record in the
//! back-office is keyed by a `SERIAL` column, so the wrappers are `i32`.

/// Declare an `i32` id newtype.
///
/// The type serializes as a bare number, converts to and from `i32`, parses
/// from a path segment (positive integers only, see [`InvalidId`]) and, with
/// the `postgres` feature, binds and decodes as `INTEGER`.
///
/// # Example
///
/// ```rust
/// # use storedesk_core::define_id;
/// define_id!(ShopperId);
/// define_id!(InvoiceId);
///
/// let shopper_id = ShopperId::new(1);
/// let invoice_id: InvoiceId = "7".parse().unwrap();
/// assert_eq!(invoice_id.as_i32(), 7);
///
/// // These are different types, so this won't compile:
/// // let _: ShopperId = invoice_id;
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            Hash,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(i32);

        impl $name {
            #[must_use]
            pub const fn new(id: i32) -> Self {
                Self(id)
            }

            #[must_use]
            pub const fn as_i32(&self) -> i32 {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                ::core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<i32> for $name {
            fn from(id: i32) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i32 {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = $crate::types::id::InvalidId;

            fn from_str(s: &str) -> ::core::result::Result<Self, Self::Err> {
                match s.trim().parse::<i32>() {
                    Ok(id) if id > 0 => Ok(Self(id)),
                    _ => Err($crate::types::id::InvalidId(s.to_owned())),
                }
            }
        }

        #[cfg(feature = "postgres")]
        impl ::sqlx::Type<::sqlx::Postgres> for $name {
            fn type_info() -> ::sqlx::postgres::PgTypeInfo {
                <i32 as ::sqlx::Type<::sqlx::Postgres>>::type_info()
            }

            fn compatible(ty: &::sqlx::postgres::PgTypeInfo) -> bool {
                <i32 as ::sqlx::Type<::sqlx::Postgres>>::compatible(ty)
            }
        }

        #[cfg(feature = "postgres")]
        impl<'r> ::sqlx::Decode<'r, ::sqlx::Postgres> for $name {
            fn decode(
                value: ::sqlx::postgres::PgValueRef<'r>,
            ) -> ::core::result::Result<Self, ::sqlx::error::BoxDynError> {
                <i32 as ::sqlx::Decode<::sqlx::Postgres>>::decode(value).map(Self)
            }
        }

        #[cfg(feature = "postgres")]
        impl ::sqlx::Encode<'_, ::sqlx::Postgres> for $name {
            fn encode_by_ref(
                &self,
                buf: &mut ::sqlx::postgres::PgArgumentBuffer,
            ) -> ::std::result::Result<::sqlx::encode::IsNull, ::sqlx::error::BoxDynError> {
                <i32 as ::sqlx::Encode<::sqlx::Postgres>>::encode_by_ref(&self.0, buf)
            }
        }
    };
}

/// Error returned when a string is not a valid entity identifier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("'{0}' is not a valid identifier")]
pub struct InvalidId(pub String);

// Identity & customers
define_id!(UserId);
define_id!(AddressId);
define_id!(NotificationId);
define_id!(ActivityLogId);

// Catalog
define_id!(CategoryId);
define_id!(BrandId);
define_id!(VendorId);
define_id!(ProductId);
define_id!(ProductAttributeId);
define_id!(VariantId);

// Stock
define_id!(LocationId);
define_id!(InventoryId);

// Checkout
define_id!(CartId);
define_id!(OrderId);
define_id!(PaymentId);
define_id!(PaymentMethodId);
define_id!(CouponId);
