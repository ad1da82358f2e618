//! Cart and order total arithmetic.
//!
//! Clients submit line items together with the totals they computed. The API
//! recomputes every total from the line items and only accepts a submitted
//! total when it matches the computed one within [`MONEY_TOLERANCE`](crate::types::MONEY_TOLERANCE).

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{CouponType, MAX_MONEY, fit_money, money_eq, round_money};

/// Errors from total computation and reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TotalsError {
    /// A client-submitted total disagrees with the computed one.
    #[error("submitted total {submitted} does not match computed total {computed}")]
    TotalMismatch {
        /// The value the client sent.
        submitted: Decimal,
        /// The value computed from the line items.
        computed: Decimal,
    },
    /// The discount would make the order total negative.
    #[error("discount {discount} exceeds order amount {gross}")]
    DiscountExceedsTotal {
        /// Requested discount.
        discount: Decimal,
        /// Subtotal plus shipping and tax.
        gross: Decimal,
    },
    /// An amount does not fit in a stored money column.
    #[error("amount exceeds the maximum of {}", MAX_MONEY)]
    Overflow,
}

/// One priced line of a cart or order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineItem {
    /// Number of units.
    pub quantity: i32,
    /// Regular unit price.
    pub unit_price: Decimal,
    /// Discounted unit price, if the product is on sale.
    pub sale_price: Option<Decimal>,
}

impl LineItem {
    /// Create a line item without a sale price.
    #[must_use]
    pub const fn new(quantity: i32, unit_price: Decimal) -> Self {
        Self {
            quantity,
            unit_price,
            sale_price: None,
        }
    }

    /// Attach a sale price.
    #[must_use]
    pub const fn with_sale_price(mut self, sale_price: Option<Decimal>) -> Self {
        self.sale_price = sale_price;
        self
    }

    /// The price actually charged per unit.
    ///
    /// A sale price only applies when it is lower than the regular price.
    #[must_use]
    pub fn effective_price(&self) -> Decimal {
        match self.sale_price {
            Some(sale) if sale < self.unit_price => sale,
            _ => self.unit_price,
        }
    }

    /// Effective unit price times quantity, rounded to cents.
    ///
    /// # Errors
    ///
    /// Returns [`TotalsError::Overflow`] when the result exceeds [`MAX_MONEY`].
    pub fn line_total(&self) -> Result<Decimal, TotalsError> {
        self.effective_price()
            .checked_mul(Decimal::from(self.quantity))
            .and_then(fit_money)
            .ok_or(TotalsError::Overflow)
    }
}

/// Sum of all line totals.
///
/// # Errors
///
/// Returns [`TotalsError::Overflow`] when a line or the sum exceeds
/// [`MAX_MONEY`].
pub fn cart_total(items: &[LineItem]) -> Result<Decimal, TotalsError> {
    items.iter().try_fold(Decimal::ZERO, |sum, item| {
        sum.checked_add(item.line_total()?)
            .and_then(fit_money)
            .ok_or(TotalsError::Overflow)
    })
}

/// Computed amounts of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderTotals {
    pub subtotal: Decimal,
    pub shipping_fee: Decimal,
    pub tax: Decimal,
    pub discount: Decimal,
    pub total: Decimal,
}

/// Compute an order's subtotal and grand total.
///
/// `total = subtotal + shipping_fee + tax - discount`.
///
/// # Errors
///
/// Returns [`TotalsError::DiscountExceedsTotal`] when the discount is larger
/// than subtotal plus fees, and [`TotalsError::Overflow`] when an amount
/// exceeds [`MAX_MONEY`].
pub fn order_totals(
    items: &[LineItem],
    shipping_fee: Decimal,
    tax: Decimal,
    discount: Decimal,
) -> Result<OrderTotals, TotalsError> {
    let subtotal = cart_total(items)?;
    let gross = subtotal
        .checked_add(shipping_fee)
        .and_then(|sum| sum.checked_add(tax))
        .and_then(fit_money)
        .ok_or(TotalsError::Overflow)?;
    if discount > gross {
        return Err(TotalsError::DiscountExceedsTotal { discount, gross });
    }

    Ok(OrderTotals {
        subtotal,
        shipping_fee,
        tax,
        discount,
        total: round_money(gross - discount),
    })
}

/// Check a client-submitted total against the computed one.
///
/// Returns the computed total when nothing was submitted or when the two
/// agree within one cent.
///
/// # Errors
///
/// Returns [`TotalsError::TotalMismatch`] when they differ by more than
/// [`MONEY_TOLERANCE`](crate::types::MONEY_TOLERANCE).
pub fn reconcile(submitted: Option<Decimal>, computed: Decimal) -> Result<Decimal, TotalsError> {
    match submitted {
        Some(submitted) if !money_eq(submitted, computed) => {
            Err(TotalsError::TotalMismatch { submitted, computed })
        }
        _ => Ok(computed),
    }
}

/// Reasons a coupon cannot be applied.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CouponError {
    #[error("coupon is not active")]
    Inactive,
    #[error("coupon is not valid until {0}")]
    NotStarted(DateTime<Utc>),
    #[error("coupon expired on {0}")]
    Expired(DateTime<Utc>),
    #[error("coupon usage limit reached")]
    Exhausted,
    #[error("order subtotal must be at least {0} to use this coupon")]
    BelowMinimum(Decimal),
    #[error("subtotal exceeds the maximum of {}", MAX_MONEY)]
    Overflow,
}

/// The parts of a coupon that decide its discount.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CouponTerms {
    pub kind: CouponType,
    /// Percentage (0-100] or fixed amount, depending on `kind`.
    pub value: Decimal,
    pub min_purchase: Decimal,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    /// Zero means unlimited.
    pub usage_limit: i32,
    pub usage_count: i32,
    pub is_active: bool,
}

impl CouponTerms {
    /// Discount this coupon grants on `subtotal` at time `now`.
    ///
    /// The discount never exceeds the subtotal.
    ///
    /// # Errors
    ///
    /// Returns a [`CouponError`] if the coupon is inactive, outside its
    /// validity window, used up, or the subtotal is below `min_purchase` or
    /// above [`MAX_MONEY`].
    pub fn discount_for(&self, subtotal: Decimal, now: DateTime<Utc>) -> Result<Decimal, CouponError> {
        if !self.is_active {
            return Err(CouponError::Inactive);
        }
        if now < self.start_date {
            return Err(CouponError::NotStarted(self.start_date));
        }
        if now > self.end_date {
            return Err(CouponError::Expired(self.end_date));
        }
        if self.usage_limit > 0 && self.usage_count >= self.usage_limit {
            return Err(CouponError::Exhausted);
        }
        if subtotal < self.min_purchase {
            return Err(CouponError::BelowMinimum(self.min_purchase));
        }
        if subtotal > MAX_MONEY {
            return Err(CouponError::Overflow);
        }

        let raw = match self.kind {
            CouponType::Percentage => subtotal
                .checked_mul(self.value)
                .and_then(|amount| amount.checked_div(Decimal::ONE_HUNDRED))
                .ok_or(CouponError::Overflow)?,
            CouponType::Fixed => self.value,
        };
        Ok(round_money(raw.min(subtotal)))
    }
}

/// Stock level classification of an inventory record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockStatus {
    #[default]
    Normal,
    Low,
    OutOfStock,
}

impl StockStatus {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Low => "low",
            Self::OutOfStock => "out_of_stock",
        }
    }
}

/// Quantity and threshold of an inventory record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InventoryLevel {
    pub quantity: i32,
    pub low_stock_threshold: i32,
}

impl InventoryLevel {
    /// Out of stock at zero, low at or below the threshold.
    #[must_use]
    pub const fn status(&self) -> StockStatus {
        if self.quantity <= 0 {
            StockStatus::OutOfStock
        } else if self.quantity <= self.low_stock_threshold {
            StockStatus::Low
        } else {
            StockStatus::Normal
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn test_sale_price_applies_only_when_lower() {
        let on_sale = LineItem::new(2, dec("100")).with_sale_price(Some(dec("80")));
        assert_eq!(on_sale.line_total().unwrap(), dec("160"));

        let bogus_sale = LineItem::new(2, dec("100")).with_sale_price(Some(dec("120")));
        assert_eq!(bogus_sale.line_total().unwrap(), dec("200"));
    }

    #[test]
    fn test_cart_total_sums_lines() {
        let items = [
            LineItem::new(3, dec("19.99")),
            LineItem::new(1, dec("5.00")).with_sale_price(Some(dec("4.50"))),
        ];
        assert_eq!(cart_total(&items).unwrap(), dec("64.47"));
        assert_eq!(cart_total(&[]).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn test_huge_amounts_are_errors_not_panics() {
        let huge = LineItem::new(1000, Decimal::MAX);
        assert_eq!(huge.line_total(), Err(TotalsError::Overflow));
        assert_eq!(cart_total(&[huge]), Err(TotalsError::Overflow));

        let at_limit = LineItem::new(1, MAX_MONEY);
        assert_eq!(at_limit.line_total().unwrap(), MAX_MONEY);
        assert_eq!(cart_total(&[at_limit, LineItem::new(1, dec("0.01"))]), Err(TotalsError::Overflow));
        assert_eq!(
            order_totals(&[at_limit], dec("1"), Decimal::ZERO, Decimal::ZERO),
            Err(TotalsError::Overflow)
        );
        assert_eq!(
            order_totals(&[LineItem::new(1, dec("10"))], Decimal::MAX, Decimal::MAX, Decimal::ZERO),
            Err(TotalsError::Overflow)
        );
    }

    #[test]
    fn test_order_totals() {
        let items = [LineItem::new(2, dec("50"))];
        let totals = order_totals(&items, dec("10"), dec("8.5"), dec("20")).unwrap();
        assert_eq!(totals.subtotal, dec("100"));
        assert_eq!(totals.total, dec("98.5"));
    }

    #[test]
    fn test_order_discount_cannot_exceed_gross() {
        let items = [LineItem::new(1, dec("10"))];
        let err = order_totals(&items, dec("2"), Decimal::ZERO, dec("12.01")).unwrap_err();
        assert_eq!(
            err,
            TotalsError::DiscountExceedsTotal {
                discount: dec("12.01"),
                gross: dec("12"),
            }
        );
        assert!(order_totals(&items, dec("2"), Decimal::ZERO, dec("12")).is_ok());
    }

    #[test]
    fn test_reconcile_within_one_cent() {
        assert_eq!(reconcile(None, dec("10")).unwrap(), dec("10"));
        assert_eq!(reconcile(Some(dec("10.01")), dec("10")).unwrap(), dec("10"));
        assert!(matches!(
            reconcile(Some(dec("10.02")), dec("10")),
            Err(TotalsError::TotalMismatch { .. })
        ));
    }

    fn coupon(kind: CouponType, value: &str) -> CouponTerms {
        let start = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        CouponTerms {
            kind,
            value: dec(value),
            min_purchase: dec("50"),
            start_date: start,
            end_date: start + Duration::days(30),
            usage_limit: 5,
            usage_count: 0,
            is_active: true,
        }
    }

    fn mid_january() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 15, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_percentage_coupon() {
        let terms = coupon(CouponType::Percentage, "15");
        assert_eq!(terms.discount_for(dec("200"), mid_january()).unwrap(), dec("30"));
    }

    #[test]
    fn test_percentage_coupon_on_huge_subtotal() {
        let terms = coupon(CouponType::Percentage, "50");
        assert_eq!(
            terms.discount_for(Decimal::MAX, mid_january()),
            Err(CouponError::Overflow)
        );
        assert_eq!(
            terms.discount_for(MAX_MONEY, mid_january()).unwrap(),
            dec("5000000000.00")
        );
    }

    #[test]
    fn test_fixed_coupon_capped_at_subtotal() {
        let terms = CouponTerms {
            min_purchase: Decimal::ZERO,
            ..coupon(CouponType::Fixed, "75")
        };
        assert_eq!(terms.discount_for(dec("60"), mid_january()).unwrap(), dec("60"));
    }

    #[test]
    fn test_coupon_rejections() {
        let now = mid_january();
        let inactive = CouponTerms {
            is_active: false,
            ..coupon(CouponType::Fixed, "5")
        };
        assert_eq!(inactive.discount_for(dec("100"), now), Err(CouponError::Inactive));

        let used_up = CouponTerms {
            usage_count: 5,
            ..coupon(CouponType::Fixed, "5")
        };
        assert_eq!(used_up.discount_for(dec("100"), now), Err(CouponError::Exhausted));

        let unlimited = CouponTerms {
            usage_limit: 0,
            usage_count: 500,
            ..coupon(CouponType::Fixed, "5")
        };
        assert!(unlimited.discount_for(dec("100"), now).is_ok());

        let terms = coupon(CouponType::Fixed, "5");
        assert_eq!(
            terms.discount_for(dec("49.99"), now),
            Err(CouponError::BelowMinimum(dec("50")))
        );
        assert!(matches!(
            terms.discount_for(dec("100"), now - Duration::days(30)),
            Err(CouponError::NotStarted(_))
        ));
        assert!(matches!(
            terms.discount_for(dec("100"), now + Duration::days(30)),
            Err(CouponError::Expired(_))
        ));
    }

    #[test]
    fn test_inventory_status() {
        let level = |quantity| InventoryLevel {
            quantity,
            low_stock_threshold: 10,
        };
        assert_eq!(level(0).status(), StockStatus::OutOfStock);
        assert_eq!(level(-3).status(), StockStatus::OutOfStock);
        assert_eq!(level(10).status(), StockStatus::Low);
        assert_eq!(level(11).status(), StockStatus::Normal);
        assert_eq!(StockStatus::OutOfStock.as_str(), "out_of_stock");
    }
}
