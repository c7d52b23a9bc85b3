//! # apex-billing: Billing Session & Pending-Sale Lifecycle
//!
//! The orchestration layer every UI shell binds to. One [`BillingSession`]
//! holds an in-progress sale; the checkout, lifecycle and drafts modules
//! bind its pure apex-core computations to apex-client calls.
//!
//! ## One Engine, Three Shells
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │   Web cashier      Desktop cashier      Mobile cashier                  │
//! │        │                  │                   │                          │
//! │        └──────────────────┼───────────────────┘                          │
//! │                           ▼                                              │
//! │                  ★ apex-billing ★                                        │
//! │                                                                          │
//! │   session    cart + catalog cache + tender/customer fields              │
//! │   checkout   validate → route (cashier: pending, admin: finalize)       │
//! │   lifecycle  pending list / load-for-edit / approve / delete            │
//! │   drafts     named snapshots + the navigate-away auto-draft             │
//! │                                                                          │
//! │   The same billing rules used to live three times, one per shell,       │
//! │   and disagreed in the corners. They live here once now.                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Error Surfaces
//! Everything returns [`BillingResult`]; the message inside is the exact
//! operator-facing text, whether it came from a local validation rule or
//! verbatim from the backend.

// =============================================================================
// Module Declarations
// =============================================================================

pub mod checkout;
pub mod drafts;
pub mod error;
pub mod lifecycle;
pub mod session;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use checkout::{
    complete_sale, prepare_checkout, reconciled_outstanding, CheckoutOutcome, PreparedCheckout,
    ReceiptSummary,
};
pub use error::{BillingError, BillingResult};
pub use lifecycle::{approve, load_for_edit, pending_requests, ApprovalOutcome};
pub use session::{BillingSession, AUTO_DRAFT_MIN_LINES};
