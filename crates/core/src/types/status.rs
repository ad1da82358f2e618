//! Status and kind enums for back-office entities.
//!
//! Every enum here is a closed set of lowercase snake-case strings on the
//! wire and a `PostgreSQL` enum type in the `shop` schema.

use serde::{Deserialize, Serialize};

/// Error returned when a string is not a member of a status enum.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {kind} '{value}', expected one of: {allowed}")]
pub struct InvalidStatus {
    /// Name of the enum that rejected the value.
    pub kind: &'static str,
    /// The rejected input.
    pub value: String,
    /// Comma-separated list of accepted values.
    pub allowed: String,
}

/// Macro to define a string-backed status enum.
///
/// Creates an enum with:
/// - `Serialize`/`Deserialize` using the given wire strings
/// - `as_str()`, `ALL`, `Display` and `FromStr`
/// - `sqlx::Type` mapped to the named `PostgreSQL` enum (with `postgres` feature)
macro_rules! define_status {
    (
        $(#[$meta:meta])*
        $name:ident => $pg:tt, $label:tt {
            $( $(#[$vmeta:meta])* $variant:ident = $text:tt ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[cfg_attr(feature = "postgres", derive(sqlx::Type))]
        #[cfg_attr(feature = "postgres", sqlx(type_name = $pg))]
        pub enum $name {
            $(
                $(#[$vmeta])*
                #[serde(rename = $text)]
                #[cfg_attr(feature = "postgres", sqlx(rename = $text))]
                $variant,
            )+
        }

        impl $name {
            /// Every member, in declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// The wire/database representation.
            #[must_use]
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text,)+
                }
            }

            /// Comma-separated list of accepted values, for error messages.
            #[must_use]
            pub fn allowed() -> String {
                Self::ALL
                    .iter()
                    .map(Self::as_str)
                    .collect::<Vec<_>>()
                    .join(", ")
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = InvalidStatus;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    _ => Err(InvalidStatus {
                        kind: $label,
                        value: s.to_owned(),
                        allowed: Self::allowed(),
                    }),
                }
            }
        }
    };
}

define_status! {
    /// Back-office role of a user account.
    UserRole => "shop.user_role", "role" {
        /// Full access, including all mutations.
        Admin = "admin",
        /// Seller account attached to a vendor profile.
        Vendor = "vendor",
        /// Storefront customer.
        Customer = "customer",
    }
}

impl Default for UserRole {
    fn default() -> Self {
        Self::Customer
    }
}

define_status! {
    /// Account status of a user.
    UserStatus => "shop.user_status", "user status" {
        Active = "active",
        Inactive = "inactive",
        Banned = "banned",
    }
}

impl Default for UserStatus {
    fn default() -> Self {
        Self::Active
    }
}

define_status! {
    /// Approval status of a vendor.
    VendorStatus => "shop.vendor_status", "vendor status" {
        Pending = "pending",
        Active = "active",
        Suspended = "suspended",
    }
}

impl Default for VendorStatus {
    fn default() -> Self {
        Self::Pending
    }
}

define_status! {
    /// Value kind of a product attribute.
    AttributeType => "shop.attribute_type", "attribute type" {
        Text = "text",
        Number = "number",
        Boolean = "boolean",
        /// Constrained to the attribute's `options`.
        Select = "select",
    }
}

define_status! {
    /// Purpose of a customer address.
    AddressType => "shop.address_type", "address type" {
        Shipping = "shipping",
        Billing = "billing",
    }
}

define_status! {
    /// Fulfillment status of an order.
    OrderStatus => "shop.order_status", "order status" {
        Pending = "pending",
        Processing = "processing",
        Shipped = "shipped",
        Delivered = "delivered",
        Cancelled = "cancelled",
    }
}

impl Default for OrderStatus {
    fn default() -> Self {
        Self::Pending
    }
}

define_status! {
    /// Payment status as tracked on the order itself.
    OrderPaymentStatus => "shop.order_payment_status", "payment status" {
        Pending = "pending",
        Paid = "paid",
        Failed = "failed",
    }
}

impl Default for OrderPaymentStatus {
    fn default() -> Self {
        Self::Pending
    }
}

define_status! {
    /// Channel a payment is made through.
    PaymentChannel => "shop.payment_channel", "payment method" {
        CreditCard = "credit_card",
        Paypal = "paypal",
        /// Cash on delivery.
        Cod = "cod",
    }
}

define_status! {
    /// Status of a payment record.
    PaymentStatus => "shop.payment_status", "payment status" {
        Pending = "pending",
        Completed = "completed",
        Failed = "failed",
        Refunded = "refunded",
    }
}

impl Default for PaymentStatus {
    fn default() -> Self {
        Self::Pending
    }
}

define_status! {
    /// Kind of a saved payment method.
    PaymentMethodType => "shop.payment_method_type", "payment method type" {
        CreditCard = "credit_card",
        Paypal = "paypal",
        BankAccount = "bank_account",
    }
}

define_status! {
    /// How a coupon's value is applied.
    CouponType => "shop.coupon_type", "coupon type" {
        /// `value` is a percentage of the subtotal.
        Percentage = "percentage",
        /// `value` is a fixed amount off the subtotal.
        Fixed = "fixed",
    }
}

define_status! {
    NotificationType => "shop.notification_type", "notification type" {
        Order = "order",
        Payment = "payment",
        Account = "account",
        Promotion = "promotion",
    }
}

define_status! {
    /// Kind of change recorded in the activity log.
    ActivityAction => "shop.activity_action", "activity action" {
        Create = "create",
        Update = "update",
        Delete = "delete",
        Login = "login",
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_through_str() {
        for channel in PaymentChannel::ALL {
            let parsed: PaymentChannel = channel.as_str().parse().unwrap();
            assert_eq!(parsed, *channel);
        }
    }

    #[test]
    fn test_serde_uses_wire_names() {
        let json = serde_json::to_string(&PaymentMethodType::BankAccount).unwrap();
        assert_eq!(json, "\"bank_account\"");
        let status: OrderStatus = serde_json::from_str("\"cancelled\"").unwrap();
        assert_eq!(status, OrderStatus::Cancelled);
    }

    #[test]
    fn test_invalid_value_lists_allowed() {
        let err = "deleted".parse::<UserStatus>().unwrap_err();
        assert_eq!(err.kind, "user status");
        assert_eq!(err.allowed, "active, inactive, banned");
        assert_eq!(
            err.to_string(),
            "invalid user status 'deleted', expected one of: active, inactive, banned"
        );
    }

    #[test]
    fn test_defaults() {
        assert_eq!(UserRole::default(), UserRole::Customer);
        assert_eq!(UserStatus::default(), UserStatus::Active);
        assert_eq!(OrderStatus::default(), OrderStatus::Pending);
        assert_eq!(PaymentStatus::default(), PaymentStatus::Pending);
    }

    #[test]
    fn test_display_matches_as_str() {
        assert_eq!(ActivityAction::Login.to_string(), "login");
        assert_eq!(CouponType::Percentage.to_string(), "percentage");
    }
}
