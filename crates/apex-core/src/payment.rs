//! # Payment & Outstanding Calculator
//!
//! Given a grand total, payment method, raw cash-received text and the
//! customer's prior outstanding balance, computes the cash balance/change
//! and the outstanding deltas.
//!
//! ## Settlement Rules
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Method  │ Requirement                │ Sale outstanding                │
//! │  ──────  │ ─────────────────────────  │ ─────────────────────────────   │
//! │  cash    │ received ≥ total (ε=1e-9)  │ max(0, total - received)        │
//! │  card    │ -                          │ 0 (fully settled)               │
//! │  credit  │ -                          │ total                           │
//! │  cheque  │ due date YYYY-MM-DD        │ max(0, total - received)        │
//! │                                                                         │
//! │  new customer outstanding = max(0, prior + sale outstanding)            │
//! │  (a running balance - each sale adds its uncollected remainder)         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Any non-card method may carry a partial cash receipt contributing to
//! outstanding; `cash` itself demands full tender. Persisting the new
//! customer outstanding is the caller's (external) responsibility.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreResult, ValidationError};
use crate::money::{parse_money, parse_money_strict, MONEY_EPSILON};
use crate::types::PaymentMethod;
use crate::validation::is_cheque_date_format;

// =============================================================================
// Payment Breakdown
// =============================================================================

/// Result of settling a grand total against a payment method.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PaymentBreakdown {
    /// Cash received, parsed. Zero for methods with no cash component.
    pub received: f64,
    /// `received - grand_total` for cash (change due when positive);
    /// 0 for every other method, where it is not meaningful.
    pub balance: f64,
    /// The uncollected remainder of this sale.
    pub sale_outstanding: f64,
    /// Running customer balance after this sale:
    /// `max(0, prior + sale_outstanding)`.
    pub new_customer_outstanding: f64,
}

// =============================================================================
// Calculator
// =============================================================================

/// Validates payment input and computes the settlement breakdown.
///
/// ## Errors
/// - cash with an empty/unparseable received amount → "Please enter cash
///   received"
/// - cash with `received + 1e-9 < grand_total` → "Cash received is not
///   enough" (exact equality is accepted)
/// - cheque without a well-formed `YYYY-MM-DD` due date → "Cheque date is
///   required (YYYY-MM-DD)"
pub fn compute_payment(
    grand_total: f64,
    method: PaymentMethod,
    cash_received_raw: &str,
    cheque_date: Option<&str>,
    prior_outstanding: f64,
) -> CoreResult<PaymentBreakdown> {
    let (received, balance, sale_outstanding) = match method {
        PaymentMethod::Cash => {
            let received =
                parse_money_strict(cash_received_raw).ok_or(ValidationError::CashRequired)?;
            if received + MONEY_EPSILON < grand_total {
                return Err(ValidationError::CashNotEnough.into());
            }
            (
                received,
                received - grand_total,
                (grand_total - received).max(0.0),
            )
        }
        PaymentMethod::Card => (parse_money(cash_received_raw), 0.0, 0.0),
        PaymentMethod::Credit => (parse_money(cash_received_raw), 0.0, grand_total),
        PaymentMethod::Cheque => {
            let date = cheque_date.map(str::trim).unwrap_or("");
            if !is_cheque_date_format(date) {
                return Err(ValidationError::ChequeDateRequired.into());
            }
            let received = parse_money(cash_received_raw);
            (received, 0.0, (grand_total - received).max(0.0))
        }
    };

    Ok(PaymentBreakdown {
        received,
        balance,
        sale_outstanding,
        new_customer_outstanding: (prior_outstanding + sale_outstanding).max(0.0),
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
