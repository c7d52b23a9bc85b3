//! # Stock Availability Guard
//!
//! Computes, for a product and the current cart contents, how much paid
//! and free quantity may still be added or edited without exceeding
//! on-hand stock.
//!
//! ## Advisory Only
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Guard (this module)          │  Backend (/sales)                       │
//! │  ───────────────────          │  ─────────────────                      │
//! │  • Fast-fail UX check         │  • Authority of record                  │
//! │  • Works from the last        │  • Re-checks stock inside the           │
//! │    fetched stock figure       │    finalization transaction             │
//! │  • May be stale when two      │  • Its rejection is authoritative       │
//! │    cashiers sell in parallel  │    and surfaced verbatim                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A guard approval is never treated as proof the sale will finalize.

use crate::error::{CoreError, CoreResult};
use crate::types::CartLine;

// =============================================================================
// Per-Barcode Sums
// =============================================================================

/// Paid units already in the cart for a barcode.
pub fn paid_qty_in_cart(lines: &[CartLine], barcode: &str) -> i64 {
    lines
        .iter()
        .filter(|l| l.barcode == barcode)
        .map(|l| l.qty)
        .sum()
}

/// Free-issue units already in the cart for a barcode.
pub fn free_qty_in_cart(lines: &[CartLine], barcode: &str) -> i64 {
    lines
        .iter()
        .filter(|l| l.barcode == barcode)
        .map(|l| l.free_qty)
        .sum()
}

// =============================================================================
// Availability
// =============================================================================

/// Units still available to add (paid or free), shown in the product
/// picker and used when deciding whether an item may be added at all.
///
/// Never negative; `0` exactly when `paid + free == stock`.
pub fn remaining_for_display(stock: i64, lines: &[CartLine], barcode: &str) -> i64 {
    (stock - paid_qty_in_cart(lines, barcode) - free_qty_in_cart(lines, barcode)).max(0)
}

/// Ceiling for editing an existing line's paid quantity in place.
///
/// The line's own current quantity is excluded so it is not
/// double-counted against itself.
pub fn available_for_edit(
    stock: i64,
    lines: &[CartLine],
    barcode: &str,
    excluding_line_qty: i64,
) -> i64 {
    (stock - (paid_qty_in_cart(lines, barcode) - excluding_line_qty)).max(0)
}

/// Ceiling for a line's free-issue quantity: stock net of paid units.
pub fn available_for_free_issue(stock: i64, lines: &[CartLine], barcode: &str) -> i64 {
    (stock - paid_qty_in_cart(lines, barcode)).max(0)
}

// =============================================================================
// Checked Mutations
// =============================================================================

/// Checks whether `qty` more paid units of `barcode` may be added.
///
/// Rejects (never silently truncates) with the exact remaining count in
/// the error when the request exceeds it.
pub fn check_add(stock: i64, lines: &[CartLine], barcode: &str, qty: i64) -> CoreResult<()> {
    let remaining = remaining_for_display(stock, lines, barcode);
    if remaining <= 0 {
        return Err(CoreError::OutOfStock {
            barcode: barcode.to_string(),
        });
    }
    if qty > remaining {
        return Err(CoreError::InsufficientStock {
            barcode: barcode.to_string(),
            available: remaining,
        });
    }
    Ok(())
}

/// Checks an in-place paid-quantity edit against [`available_for_edit`].
pub fn check_qty_edit(
    stock: i64,
    lines: &[CartLine],
    barcode: &str,
    new_qty: i64,
    current_qty: i64,
) -> CoreResult<()> {
    let available = available_for_edit(stock, lines, barcode, current_qty);
    if new_qty > available {
        return Err(CoreError::InsufficientStock {
            barcode: barcode.to_string(),
            available,
        });
    }
    Ok(())
}

/// Checks a free-issue quantity edit against [`available_for_free_issue`].
pub fn check_free_qty(
    stock: i64,
    lines: &[CartLine],
    barcode: &str,
    new_free_qty: i64,
) -> CoreResult<()> {
    let available = available_for_free_issue(stock, lines, barcode);
    if new_free_qty > available {
        return Err(CoreError::FreeIssueExceedsStock {
            barcode: barcode.to_string(),
            available,
        });
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn cart_line(barcode: &str, qty: i64, free_qty: i64) -> CartLine {
        CartLine {
            barcode: barcode.to_string(),
            qty,
            free_qty,
            ..CartLine::default()
        }
    }

    #[test]
    fn test_remaining_counts_paid_and_free() {
        // stock 5, cart holds paid 3 + free 1 → remaining 1
        let lines = vec![cart_line("111", 3, 1)];
        assert_eq!(remaining_for_display(5, &lines, "111"), 1);
    }

    #[test]
    fn test_remaining_is_zero_at_exact_exhaustion() {
        let lines = vec![cart_line("111", 4, 1)];
        assert_eq!(remaining_for_display(5, &lines, "111"), 0);
        // And never negative.
        let lines = vec![cart_line("111", 9, 0)];
        assert_eq!(remaining_for_display(5, &lines, "111"), 0);
    }

    #[test]
    fn test_remaining_ignores_other_barcodes() {
        let lines = vec![cart_line("222", 5, 0)];
        assert_eq!(remaining_for_display(5, &lines, "111"), 5);
    }

    #[test]
    fn test_add_rejected_with_exact_remaining_count() {
        let lines = vec![cart_line("111", 3, 1)];
        let err = check_add(5, &lines, "111", 2).unwrap_err();
        assert_eq!(err.to_string(), "Only 1 available for 111");
    }

    #[test]
    fn test_add_rejected_when_exhausted() {
        let lines = vec![cart_line("111", 5, 0)];
        let err = check_add(5, &lines, "111", 1).unwrap_err();
        assert!(matches!(err, CoreError::OutOfStock { .. }));
    }

    #[test]
    fn test_add_allowed_within_remaining() {
        let lines = vec![cart_line("111", 3, 1)];
        assert!(check_add(5, &lines, "111", 1).is_ok());
    }

    #[test]
    fn test_edit_excludes_own_line_quantity() {
        // stock 5, line holds 3 paid: raising that same line to 5 is fine.
        let lines = vec![cart_line("111", 3, 0)];
        assert_eq!(available_for_edit(5, &lines, "111", 3), 5);
        assert!(check_qty_edit(5, &lines, "111", 5, 3).is_ok());
        assert!(check_qty_edit(5, &lines, "111", 6, 3).is_err());
    }

    #[test]
    fn test_free_issue_capped_by_stock_net_of_paid() {
        let lines = vec![cart_line("111", 3, 0)];
        assert_eq!(available_for_free_issue(5, &lines, "111"), 2);
        assert!(check_free_qty(5, &lines, "111", 2).is_ok());
        let err = check_free_qty(5, &lines, "111", 3).unwrap_err();
        assert_eq!(err.to_string(), "Only 2 available for free issue");
    }
}
