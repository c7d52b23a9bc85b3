//! # Pricing Engine
//!
//! Line and cart pricing: base amounts, item discounts, the cart-level
//! discount and the grand total.
//!
//! ## Computation Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Pricing Computation                               │
//! │                                                                         │
//! │  CartLine ──► compute_line ──► { base, item_discount, net_total }      │
//! │                                                                         │
//! │  base          = unit_price × qty      (free qty excluded)             │
//! │  item_discount = amount: min(v, base)                                  │
//! │                  percent: round(base × clamp(v,0,100) / 100)           │
//! │  net_total     = max(0, base - item_discount)                          │
//! │                                                                         │
//! │  [CartLine] ──► compute_cart ──► { subtotal, cart_discount,            │
//! │                                    grand_total, free_items }           │
//! │                                                                         │
//! │  subtotal    = Σ net_total          (already net of item discounts)    │
//! │  grand_total = max(0, subtotal - cart_discount)                        │
//! │                                                                         │
//! │  Recomputed fresh from the full line list on every mutation.           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every function here is a total, pure function of its input: invalid
//! numeric values coerce to 0 via [`crate::money`], nothing raises.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::{clamp, round_money, sanitize};
use crate::types::{CartLine, DiscountKind};

// =============================================================================
// Discount Rule
// =============================================================================

/// Computes a discount amount against a base.
///
/// Shared by line-level and cart-level discounts:
/// - `none` → 0
/// - `amount` → clamped to `[0, base]` (never exceeds what it discounts)
/// - `percent` → clamped to `[0, 100]`, rounded to a whole currency unit
pub fn discount_amount(base: f64, kind: DiscountKind, value: f64) -> f64 {
    match kind {
        DiscountKind::None => 0.0,
        DiscountKind::Amount => clamp(value, 0.0, base.max(0.0)),
        DiscountKind::Percent => {
            let pct = clamp(value, 0.0, 100.0);
            round_money(base * pct / 100.0) as f64
        }
    }
}

// =============================================================================
// Line Pricing
// =============================================================================

/// Totals for a single cart line.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct LineTotals {
    /// `unit_price × qty`, free quantity excluded.
    pub base: f64,
    /// Item-level discount, clamped per the discount rule.
    pub item_discount: f64,
    /// `max(0, base - item_discount)`.
    pub net_total: f64,
}

/// Computes one line's base, item discount and net total.
///
/// ## Example
/// ```rust
/// use apex_core::pricing::compute_line;
/// use apex_core::types::{CartLine, DiscountKind};
///
/// let line = CartLine {
///     barcode: "111".into(),
///     unit_price: 100.0,
///     qty: 3,
///     item_discount_type: DiscountKind::Percent,
///     item_discount_value: 10.0,
///     ..CartLine::default()
/// };
/// let totals = compute_line(&line);
/// assert_eq!(totals.base, 300.0);
/// assert_eq!(totals.item_discount, 30.0);
/// assert_eq!(totals.net_total, 270.0);
/// ```
pub fn compute_line(line: &CartLine) -> LineTotals {
    let base = sanitize(line.unit_price) * line.qty.max(0) as f64;
    let item_discount = discount_amount(base, line.item_discount_type, line.item_discount_value);
    LineTotals {
        base,
        item_discount,
        net_total: (base - item_discount).max(0.0),
    }
}

// =============================================================================
// Cart Pricing
// =============================================================================

/// One entry of the free-items manifest disclosed on receipts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct FreeItem {
    pub name: String,
    pub qty: i64,
}

/// Aggregated totals for the whole cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CartTotals {
    /// Sum of line net totals (already net of item discounts).
    pub subtotal: f64,
    /// Sum of item-level discounts, reported separately for receipts.
    pub total_item_discount: f64,
    /// Cart-level discount applied to the subtotal.
    pub cart_discount: f64,
    /// `max(0, subtotal - cart_discount)`.
    pub grand_total: f64,
    /// Lines with free quantity, in line order. Free items take part in
    /// no discount math; they are an informational addendum.
    pub free_items: Vec<FreeItem>,
}

/// Aggregates line totals and applies the cart-level discount.
///
/// Deterministic and idempotent: recomputed fresh from the full line list
/// on every invocation, and order-independent except that `free_items`
/// preserves line order.
pub fn compute_cart(lines: &[CartLine], discount_type: DiscountKind, discount_value: f64) -> CartTotals {
    let mut subtotal = 0.0;
    let mut total_item_discount = 0.0;
    let mut free_items = Vec::new();

    for line in lines {
        let totals = compute_line(line);
        subtotal += totals.net_total;
        total_item_discount += totals.item_discount;
        if line.free_qty > 0 {
            free_items.push(FreeItem {
                name: line.name.clone(),
                qty: line.free_qty,
            });
        }
    }

    let cart_discount = discount_amount(subtotal, discount_type, discount_value);

    CartTotals {
        subtotal,
        total_item_discount,
        cart_discount,
        grand_total: (subtotal - cart_discount).max(0.0),
        free_items,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn line(price: f64, qty: i64, kind: DiscountKind, value: f64) -> CartLine {
        CartLine {
            barcode: format!("b-{price}-{qty}"),
            name: "Item".to_string(),
            unit_price: price,
            qty,
            item_discount_type: kind,
            item_discount_value: value,
            ..CartLine::default()
        }
    }

    #[test]
    fn test_percent_line_discount() {
        // 100 × 3 at 10% off → 300 / 30 / 270
        let totals = compute_line(&line(100.0, 3, DiscountKind::Percent, 10.0));
        assert_eq!(totals.base, 300.0);
        assert_eq!(totals.item_discount, 30.0);
        assert_eq!(totals.net_total, 270.0);
    }

    #[test]
    fn test_amount_discount_never_exceeds_base() {
        let totals = compute_line(&line(50.0, 2, DiscountKind::Amount, 500.0));
        assert_eq!(totals.base, 100.0);
        assert_eq!(totals.item_discount, 100.0);
        assert_eq!(totals.net_total, 0.0);
    }

    #[test]
    fn test_percent_clamped_to_hundred() {
        let totals = compute_line(&line(100.0, 1, DiscountKind::Percent, 250.0));
        assert_eq!(totals.item_discount, 100.0);
        assert_eq!(totals.net_total, 0.0);
    }

    #[test]
    fn test_percent_discount_rounds_to_whole_unit() {
        // 333 at 10% = 33.3 → 33
        let totals = compute_line(&line(333.0, 1, DiscountKind::Percent, 10.0));
        assert_eq!(totals.item_discount, 33.0);

        // 335 at 10% = 33.5 → 34 (half up)
        let totals = compute_line(&line(335.0, 1, DiscountKind::Percent, 10.0));
        assert_eq!(totals.item_discount, 34.0);
    }

    #[test]
    fn test_free_qty_excluded_from_base() {
        let mut l = line(100.0, 2, DiscountKind::None, 0.0);
        l.free_qty = 5;
        let totals = compute_line(&l);
        assert_eq!(totals.base, 200.0);
    }

    #[test]
    fn test_negative_discount_value_ignored() {
        let totals = compute_line(&line(100.0, 1, DiscountKind::Amount, -40.0));
        assert_eq!(totals.item_discount, 0.0);
        assert_eq!(totals.net_total, 100.0);
    }

    #[test]
    fn test_invalid_price_coerces_to_zero() {
        let totals = compute_line(&line(f64::NAN, 3, DiscountKind::None, 0.0));
        assert_eq!(totals.base, 0.0);
        assert_eq!(totals.net_total, 0.0);
    }

    #[test]
    fn test_cart_amount_discount_clamped_to_subtotal() {
        // Subtotal 1000, cart discount amount 1500 → clamped to 1000,
        // grand total floors at zero.
        let lines = vec![line(500.0, 2, DiscountKind::None, 0.0)];
        let totals = compute_cart(&lines, DiscountKind::Amount, 1500.0);
        assert_eq!(totals.subtotal, 1000.0);
        assert_eq!(totals.cart_discount, 1000.0);
        assert_eq!(totals.grand_total, 0.0);
    }

    #[test]
    fn test_cart_subtotal_is_net_of_item_discounts() {
        let lines = vec![
            line(100.0, 3, DiscountKind::Percent, 10.0), // net 270
            line(50.0, 1, DiscountKind::Amount, 20.0),   // net 30
        ];
        let totals = compute_cart(&lines, DiscountKind::None, 0.0);
        assert_eq!(totals.subtotal, 300.0);
        assert_eq!(totals.total_item_discount, 50.0);
        assert_eq!(totals.grand_total, 300.0);
    }

    #[test]
    fn test_cart_percent_discount_on_subtotal() {
        let lines = vec![line(400.0, 1, DiscountKind::None, 0.0)];
        let totals = compute_cart(&lines, DiscountKind::Percent, 12.5);
        assert_eq!(totals.cart_discount, 50.0);
        assert_eq!(totals.grand_total, 350.0);
    }

    #[test]
    fn test_free_items_manifest_preserves_line_order() {
        let mut a = line(10.0, 1, DiscountKind::None, 0.0);
        a.name = "Rice".to_string();
        a.free_qty = 2;
        let b = line(20.0, 1, DiscountKind::None, 0.0);
        let mut c = line(30.0, 1, DiscountKind::None, 0.0);
        c.name = "Flour".to_string();
        c.free_qty = 1;

        let totals = compute_cart(&[a, b, c], DiscountKind::None, 0.0);
        assert_eq!(
            totals.free_items,
            vec![
                FreeItem { name: "Rice".into(), qty: 2 },
                FreeItem { name: "Flour".into(), qty: 1 },
            ]
        );
    }

    #[test]
    fn test_compute_cart_is_idempotent() {
        let lines = vec![
            line(100.0, 3, DiscountKind::Percent, 10.0),
            line(75.0, 2, DiscountKind::Amount, 25.0),
        ];
        let first = compute_cart(&lines, DiscountKind::Percent, 5.0);
        let second = compute_cart(&lines, DiscountKind::Percent, 5.0);
        assert_eq!(first, second);
    }

    #[test]
    fn test_empty_cart_totals() {
        let totals = compute_cart(&[], DiscountKind::Amount, 100.0);
        assert_eq!(totals.subtotal, 0.0);
        assert_eq!(totals.cart_discount, 0.0);
        assert_eq!(totals.grand_total, 0.0);
        assert!(totals.free_items.is_empty());
    }
}
