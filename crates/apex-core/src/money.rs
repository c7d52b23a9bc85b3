//! # Money & Quantity Utilities
//!
//! Safe numeric parsing and rounding for currency and quantity values.
//!
//! ## Why Lenient Parsing?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  WHAT THE BACKEND ACTUALLY STORES                                       │
//! │                                                                         │
//! │  The cashier surfaces keep raw field edits, so stored payloads carry   │
//! │  whatever the operator typed:                                          │
//! │                                                                         │
//! │    price:          "1,250.50"   (thousands separators)                 │
//! │    discountValue:  ""           (cleared field)                        │
//! │    cashReceived:   5000         (number from the mobile client)        │
//! │    cashReceived:   "5000"       (string from the web client)           │
//! │                                                                         │
//! │  Every pricing function must be total over this input space.           │
//! │  Invalid numeric input coerces to 0 - it never raises.                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The one place where "absent" must be distinguished from "zero" is the
//! cash-received check on a cash sale; [`parse_money_strict`] exists for
//! that single call site.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

// =============================================================================
// Constants
// =============================================================================

/// Tolerance for cash-sufficiency comparison.
///
/// Float noise from repeated discount arithmetic can leave a grand total a
/// few ulps above the tendered amount. A tender equal to the total must be
/// accepted, so the comparison is `received + MONEY_EPSILON < grand_total`.
pub const MONEY_EPSILON: f64 = 1e-9;

// =============================================================================
// Parsing
// =============================================================================

/// Parses a raw money value leniently.
///
/// Strips thousands separators (commas) and surrounding whitespace, then
/// parses as a float. Returns `0.0` for empty, unparseable, or non-finite
/// input. Never fails.
///
/// ## Example
/// ```rust
/// use apex_core::money::parse_money;
///
/// assert_eq!(parse_money("1,250.50"), 1250.5);
/// assert_eq!(parse_money("  42 "), 42.0);
/// assert_eq!(parse_money(""), 0.0);
/// assert_eq!(parse_money("abc"), 0.0);
/// ```
pub fn parse_money(raw: &str) -> f64 {
    parse_money_strict(raw).unwrap_or(0.0)
}

/// Parses a raw money value, distinguishing "absent" from "zero".
///
/// Returns `None` when the input is empty or does not parse to a finite
/// number. Used for the cash-received check, where an empty field is a
/// validation error rather than a tender of 0.
pub fn parse_money_strict(raw: &str) -> Option<f64> {
    let cleaned = raw.trim().replace(',', "");
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parses a raw quantity leniently (truncating any fractional part).
///
/// Returns `0` for empty or unparseable input.
pub fn parse_qty(raw: &str) -> i64 {
    parse_money(raw) as i64
}

// =============================================================================
// Rounding & Clamping
// =============================================================================

/// Coerces a non-finite value to zero.
#[inline]
pub fn sanitize(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// Clamps `value` into `[min, max]`, coercing non-finite input to `min`.
///
/// Deliberately not `f64::clamp`, which panics when the bounds are
/// inverted or NaN; discount bases flow straight from user input.
pub fn clamp(value: f64, min: f64, max: f64) -> f64 {
    if !value.is_finite() {
        return min;
    }
    value.max(min).min(max)
}

/// Rounds a money value to the nearest whole currency unit, half up.
///
/// Percent-discount amounts are disclosed on receipts as whole currency
/// units, not fractions. All call sites operate on non-negative amounts,
/// where half-up and half-away-from-zero coincide.
///
/// ## Example
/// ```rust
/// use apex_core::money::round_money;
///
/// assert_eq!(round_money(2.5), 3);
/// assert_eq!(round_money(2.4), 2);
/// assert_eq!(round_money(30.0), 30);
/// ```
#[inline]
pub fn round_money(value: f64) -> i64 {
    sanitize(value).round() as i64
}

// =============================================================================
// Loose-Wire Serde Adapters
// =============================================================================

/// Serde adapters for the backend's loose number encoding.
///
/// Stored payloads mix numbers, numeric strings, empty strings and nulls
/// for the same field depending on which client wrote them. These
/// deserializers fold all of that onto the plain numeric domain the
/// pricing functions expect.
pub mod de {
    use super::*;

    fn money_from_value(value: Option<&Value>) -> Option<f64> {
        match value {
            Some(Value::Number(n)) => n.as_f64().filter(|v| v.is_finite()),
            Some(Value::String(s)) => parse_money_strict(s),
            _ => None,
        }
    }

    /// number | numeric string | "" | null | absent -> f64 (default 0)
    pub fn flexible_money<'de, D>(deserializer: D) -> Result<f64, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(money_from_value(value.as_ref()).unwrap_or(0.0))
    }

    /// number | numeric string | "" | null | absent -> Option<f64>
    pub fn flexible_opt_money<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(money_from_value(value.as_ref()))
    }

    /// number | numeric string | "" | null | absent -> i64 (default 0)
    pub fn flexible_qty<'de, D>(deserializer: D) -> Result<i64, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(money_from_value(value.as_ref()).unwrap_or(0.0) as i64)
    }

    /// number | numeric string | "" | null | absent -> Option<i64>
    pub fn flexible_opt_qty<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(money_from_value(value.as_ref()).map(|v| v as i64))
    }

    /// number | string | null | absent -> String, preserving raw text.
    ///
    /// `cashReceived` is kept as the raw field text so that rehydrating a
    /// pending request re-validates from exactly what the cashier typed.
    pub fn flexible_raw_string<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(match value {
            Some(Value::String(s)) => s,
            Some(Value::Number(n)) => n.to_string(),
            _ => String::new(),
        })
    }

    /// number | numeric string | null | absent -> Option<i64> entity id.
    pub fn flexible_opt_id<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(match value {
            Some(Value::Number(n)) => n.as_i64(),
            Some(Value::String(s)) => s.trim().parse::<i64>().ok(),
            _ => None,
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
