//! # Error Types
//!
//! Domain-specific error types for apex-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  apex-core errors (this file)                                          │
//! │  ├── CoreError        - Business-rule violations                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  apex-client errors (separate crate)                                   │
//! │  └── ClientError      - Backend/transport failures                     │
//! │                                                                         │
//! │  apex-billing errors                                                   │
//! │  └── BillingError     - Composes the two above                         │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → BillingError → UI message         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Every variant's message is the exact text shown to the operator
//! 3. Errors are enum variants, never String
//! 4. Pricing functions never error; only checks and transitions do

use thiserror::Error;

use crate::types::PendingStatus;

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Recovered locally: the action is blocked, the message is surfaced, and
/// no state is mutated.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Cart is empty")]
    CartEmpty,

    /// Cash sale submitted with an empty or unparseable received amount.
    #[error("Please enter cash received")]
    CashRequired,

    /// Cash sale where tender is below the grand total (beyond epsilon).
    #[error("Cash received is not enough")]
    CashNotEnough,

    /// Cheque sale without a well-formed `YYYY-MM-DD` due date.
    #[error("Cheque date is required (YYYY-MM-DD)")]
    ChequeDateRequired,

    #[error("Customer name is required")]
    CustomerNameRequired,

    #[error("Customer name must contain only letters and spaces")]
    CustomerNameInvalid,

    /// A phone number was supplied but is not exactly 10 digits.
    #[error("Customer phone must be exactly 10 digits")]
    CustomerPhoneInvalid,
}

// =============================================================================
// Core Error
// =============================================================================

/// Business-rule violations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    /// Adding an item whose remaining stock (net of the cart) is zero.
    #[error("Item is out of stock")]
    OutOfStock { barcode: String },

    /// A quantity add/edit would exceed what is still available.
    ///
    /// The message states the exact ceiling so the operator can correct
    /// the entry without guessing.
    #[error("Only {available} available for {barcode}")]
    InsufficientStock { barcode: String, available: i64 },

    /// A free-issue quantity would exceed stock net of paid units.
    #[error("Only {available} available for free issue")]
    FreeIssueExceedsStock { barcode: String, available: i64 },

    /// Free-issue units require an existing paid line for the barcode.
    #[error("Add paid qty first")]
    FreeIssueWithoutPaidLine { barcode: String },

    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Editing a line that is not in the cart.
    #[error("Item {0} is not in the cart")]
    LineNotFound(String),

    /// Edit/approve/delete attempted on a record that is no longer
    /// pending. Terminal states are immutable; this is never a no-op.
    #[error("Pending sale {id} is {status}, not pending")]
    NotPending { id: i64, status: PendingStatus },

    /// A stored pending payload with no usable items.
    #[error("Pending sale payload is invalid")]
    InvalidPendingPayload,

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Convenience alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

/// Convenience alias for validation-only paths.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_are_operator_facing() {
        let err = CoreError::InsufficientStock {
            barcode: "4796001".to_string(),
            available: 1,
        };
        assert_eq!(err.to_string(), "Only 1 available for 4796001");

        let err = CoreError::NotPending {
            id: 7,
            status: PendingStatus::Approved,
        };
        assert_eq!(err.to_string(), "Pending sale 7 is approved, not pending");
    }

    #[test]
    fn test_validation_error_passes_through_transparently() {
        let core: CoreError = ValidationError::CashNotEnough.into();
        assert_eq!(core.to_string(), "Cash received is not enough");
    }
}
