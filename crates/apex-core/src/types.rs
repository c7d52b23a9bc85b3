//! # Domain Types
//!
//! Core domain types used throughout Apex POS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │    CartLine     │   │   SaleRequest   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  barcode (key)  │   │  barcode (key)  │   │  items[]        │       │
//! │  │  price          │──►│  unit_price     │──►│  paymentMethod  │       │
//! │  │  stock          │   │  qty / free_qty │   │  discount       │       │
//! │  └─────────────────┘   │  item discount  │   │  customer       │       │
//! │                        └─────────────────┘   └────────┬────────┘       │
//! │                                                       │                 │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌────────▼────────┐       │
//! │  │    Customer     │   │  DiscountKind   │   │PendingSaleRecord│       │
//! │  │  walk-in ok     │   │  PaymentMethod  │   │  (pending.rs)   │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Wire Compatibility
//! Field casing is camelCase to match the existing backend, and numeric
//! fields of stored payloads deserialize through the lenient adapters in
//! [`crate::money::de`] because the legacy clients wrote numbers, numeric
//! strings and empty strings interchangeably.

use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::money::de;

// =============================================================================
// Discount Kind
// =============================================================================

/// The kind of a discount, applied per line or per cart.
///
/// `amount` discounts are clamped to the base they discount from;
/// `percent` discounts are clamped to [0, 100] and rounded to whole
/// currency units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum DiscountKind {
    /// No discount.
    #[default]
    None,
    /// Fixed currency amount off the base.
    Amount,
    /// Percentage of the base, 0-100.
    Percent,
}

// =============================================================================
// Payment Method
// =============================================================================

/// How a sale is settled.
///
/// The wire spelling for cheques is `"check"` (the form every legacy
/// surface sends); `"cheque"` is accepted as an alias on input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    /// Physical cash; requires sufficient tender at completion.
    #[default]
    Cash,
    /// Card terminal; treated as fully settled.
    Card,
    /// Entire total goes onto the customer's outstanding balance.
    Credit,
    /// Cheque with a due date; settles like credit net of any partial cash.
    #[serde(rename = "check", alias = "cheque")]
    Cheque,
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentMethod::Cash => write!(f, "cash"),
            PaymentMethod::Card => write!(f, "card"),
            PaymentMethod::Credit => write!(f, "credit"),
            PaymentMethod::Cheque => write!(f, "check"),
        }
    }
}

// =============================================================================
// Pending Status
// =============================================================================

/// Status of a cashier's pending sale request.
///
/// `pending` may be edited or re-submitted any number of times;
/// `approved` and `deleted` are terminal and immutable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum PendingStatus {
    /// Submitted by a cashier, awaiting admin action.
    #[default]
    Pending,
    /// Finalized into a sale by an admin. Terminal.
    Approved,
    /// Rejected/withdrawn. Terminal.
    Deleted,
}

impl fmt::Display for PendingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PendingStatus::Pending => write!(f, "pending"),
            PendingStatus::Approved => write!(f, "approved"),
            PendingStatus::Deleted => write!(f, "deleted"),
        }
    }
}

// =============================================================================
// Product
// =============================================================================

/// A product as seen by the billing engine.
///
/// Sourced from the backend catalog; `stock` and `price` are only as
/// fresh as the last fetch. The backend remains the authority of record
/// for both.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Backend-assigned id, when known.
    #[serde(default, deserialize_with = "de::flexible_opt_id")]
    pub id: Option<i64>,

    /// Business key; every cart and payload line references this.
    pub barcode: String,

    #[serde(default)]
    pub name: String,

    /// Billing price per unit.
    #[serde(default, deserialize_with = "de::flexible_money")]
    pub price: f64,

    /// On-hand stock at fetch time.
    #[serde(default, deserialize_with = "de::flexible_qty")]
    pub stock: i64,

    /// Optional automatic percent discount applied when the product is
    /// first added to a cart (0 = none).
    #[serde(default, deserialize_with = "de::flexible_money")]
    pub default_discount_percent: f64,
}

// =============================================================================
// Customer
// =============================================================================

/// A customer record. `id` is `None` for walk-in customers that have not
/// been persisted yet.
///
/// `notes` is a free-text blob the legacy schema also uses for typed
/// markers (outstanding balance, cheque due dates); see
/// [`crate::annotations`] for the structured view.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    #[serde(default, deserialize_with = "de::flexible_opt_id")]
    pub id: Option<i64>,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub phone: Option<String>,

    #[serde(default)]
    pub address: Option<String>,

    #[serde(default)]
    pub notes: Option<String>,
}

/// Denormalized customer fields carried inside a [`SaleRequest`].
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CustomerRef {
    #[serde(default, deserialize_with = "de::flexible_opt_id")]
    pub id: Option<i64>,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub phone: Option<String>,

    #[serde(default)]
    pub address: Option<String>,
}

// =============================================================================
// Cart Line
// =============================================================================

/// One product line in an in-progress sale.
///
/// ## Invariant
/// `qty + free_qty` summed per barcode across the cart must never exceed
/// the product's on-hand stock. The [`crate::stock`] guard enforces this
/// advisorily; the backend re-checks on finalization and its rejection is
/// authoritative.
///
/// ## Wire Shape
/// Serialized with the legacy cart-line field names (`price`, `stock`) so
/// drafts written by the old web client restore unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub barcode: String,

    #[serde(default)]
    pub name: String,

    /// Price per paid unit, frozen when the line was created.
    #[serde(rename = "price", default, deserialize_with = "de::flexible_money")]
    pub unit_price: f64,

    /// Paid units (>= 1).
    #[serde(default, deserialize_with = "de::flexible_qty")]
    pub qty: i64,

    /// Free-issue units (>= 0). Excluded from all discount math and
    /// disclosed separately on receipts.
    #[serde(default, deserialize_with = "de::flexible_qty")]
    pub free_qty: i64,

    #[serde(default)]
    pub item_discount_type: DiscountKind,

    #[serde(default, deserialize_with = "de::flexible_money")]
    pub item_discount_value: f64,

    /// On-hand stock snapshot taken when the line was added, used as a
    /// fallback for availability checks when no fresher catalog entry is
    /// cached.
    #[serde(rename = "stock", default, deserialize_with = "de::flexible_qty")]
    pub stock_at_add: i64,
}

impl CartLine {
    /// Creates a line from a catalog product, freezing price and stock.
    pub fn from_product(product: &Product, qty: i64) -> Self {
        CartLine {
            barcode: product.barcode.clone(),
            name: product.name.clone(),
            unit_price: product.price,
            qty,
            free_qty: 0,
            item_discount_type: DiscountKind::None,
            item_discount_value: 0.0,
            stock_at_add: product.stock,
        }
    }
}

// =============================================================================
// Cart
// =============================================================================

/// Ordered collection of cart lines plus the cart-level discount and the
/// selected payment method.
///
/// Owned exclusively by one billing session; never shared and never
/// persisted directly (it serializes into a [`SaleRequest`] or a draft).
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    pub lines: Vec<CartLine>,

    #[serde(default)]
    pub discount_type: DiscountKind,

    #[serde(default, deserialize_with = "de::flexible_money")]
    pub discount_value: f64,

    #[serde(default)]
    pub payment_method: PaymentMethod,
}

impl Cart {
    pub fn new() -> Self {
        Cart::default()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Finds the line for a barcode, if present.
    pub fn line(&self, barcode: &str) -> Option<&CartLine> {
        self.lines.iter().find(|l| l.barcode == barcode)
    }

    pub fn line_mut(&mut self, barcode: &str) -> Option<&mut CartLine> {
        self.lines.iter_mut().find(|l| l.barcode == barcode)
    }

    /// Removes the line for a barcode. Returns whether a line was removed.
    pub fn remove_line(&mut self, barcode: &str) -> bool {
        let before = self.lines.len();
        self.lines.retain(|l| l.barcode != barcode);
        self.lines.len() != before
    }

    /// Total paid + free units across all lines.
    pub fn total_quantity(&self) -> i64 {
        self.lines.iter().map(|l| l.qty + l.free_qty).sum()
    }

    pub fn clear(&mut self) {
        self.lines.clear();
        self.discount_type = DiscountKind::None;
        self.discount_value = 0.0;
        self.payment_method = PaymentMethod::Cash;
    }
}

// =============================================================================
// Sale Request
// =============================================================================

/// One line of a [`SaleRequest`].
///
/// The `name`/`price`/`stock` echoes are not written by this engine, but
/// some historical payloads carry them; they are kept only as last-resort
/// display fallbacks during rehydration (price and stock always come from
/// the current catalog).
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SaleRequestItem {
    pub barcode: String,

    #[serde(default, deserialize_with = "de::flexible_qty")]
    pub qty: i64,

    #[serde(default, deserialize_with = "de::flexible_qty")]
    pub free_qty: i64,

    #[serde(default)]
    pub item_discount_type: DiscountKind,

    #[serde(default, deserialize_with = "de::flexible_money")]
    pub item_discount_value: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "de::flexible_opt_money"
    )]
    pub price: Option<f64>,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "de::flexible_opt_qty"
    )]
    pub stock: Option<i64>,
}

/// The finalized submission handed to `POST /sales`, and the payload
/// stored inside a pending sale record.
///
/// Immutable once constructed. `cash_received` is kept as the raw field
/// text (see [`crate::money::de::flexible_raw_string`]).
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SaleRequest {
    pub items: Vec<SaleRequestItem>,

    #[serde(default)]
    pub payment_method: PaymentMethod,

    #[serde(default)]
    pub discount_type: DiscountKind,

    #[serde(default, deserialize_with = "de::flexible_money")]
    pub discount_value: f64,

    #[serde(default, deserialize_with = "de::flexible_raw_string")]
    pub cash_received: String,

    /// Required iff `payment_method` is cheque; `None` otherwise.
    #[serde(default)]
    pub cheque_date: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer: Option<CustomerRef>,
}

// =============================================================================
// Draft Payload
// =============================================================================

/// A saved (or auto-saved) billing session snapshot.
///
/// Unlike a pending payload, a draft restores verbatim - full cart lines
/// included - with no catalog re-join. `name` is `None` for the
/// navigate-away auto-draft.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DraftPayload {
    pub name: Option<String>,

    #[serde(default)]
    pub cart: Vec<CartLine>,

    #[serde(default = "default_true")]
    pub customer_enabled: bool,

    #[serde(default, deserialize_with = "de::flexible_opt_id")]
    pub customer_id: Option<i64>,

    #[serde(default)]
    pub customer_name: String,

    #[serde(default)]
    pub customer_phone: String,

    #[serde(default)]
    pub customer_address: String,

    #[serde(default)]
    pub discount_type: DiscountKind,

    #[serde(default, deserialize_with = "de::flexible_money")]
    pub discount_value: f64,

    #[serde(default)]
    pub payment_method: PaymentMethod,

    #[serde(default, deserialize_with = "de::flexible_raw_string")]
    pub cash_received: String,

    #[serde(default, deserialize_with = "de::flexible_raw_string")]
    pub cheque_date: String,
}

fn default_true() -> bool {
    true
}

// =============================================================================
// Session Context
// =============================================================================

/// Who is operating the billing session.
///
/// Passed explicitly to checkout and lifecycle functions; nothing in this
/// workspace reads role or username from ambient storage.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SessionContext {
    pub username: String,
    pub role: Role,
}

impl SessionContext {
    pub fn new(username: impl Into<String>, role: Role) -> Self {
        SessionContext {
            username: username.into(),
            role,
        }
    }
}

/// Operator role. Only admins may finalize sales directly; cashiers
/// submit pending requests instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Cashier,
}

impl Role {
    /// Whether this role may submit directly to the sale-finalization
    /// endpoint (and approve pending requests).
    pub fn can_finalize(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
