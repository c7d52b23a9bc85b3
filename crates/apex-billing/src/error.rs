//! Billing error type, composing core and client failures.
//!
//! Both sides already carry operator-facing messages, so this wrapper is
//! transparent: whatever text a validation rule or the backend produced
//! is what the UI shows.

use thiserror::Error;

use apex_client::ClientError;
use apex_core::{CoreError, ValidationError};

/// Error type for billing-session and lifecycle operations.
#[derive(Debug, Error)]
pub enum BillingError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Client(#[from] ClientError),
}

impl From<ValidationError> for BillingError {
    fn from(error: ValidationError) -> Self {
        BillingError::Core(CoreError::Validation(error))
    }
}

/// Result type for billing operations.
pub type BillingResult<T> = Result<T, BillingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_pass_through() {
        let err: BillingError = ValidationError::CashNotEnough.into();
        assert_eq!(err.to_string(), "Cash received is not enough");

        let err: BillingError = ClientError::Rejected("Insufficient stock".into()).into();
        assert_eq!(err.to_string(), "Insufficient stock");
    }
}
