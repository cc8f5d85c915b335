//! # Error Types
//!
//! Domain-specific error types for kirana-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  kirana-core errors (this file)                                        │
//! │  ├── CoreError        - General domain errors                          │
//! │  ├── ValidationError  - Input validation failures                      │
//! │  └── NumberingError   - Invoice number source failures                 │
//! │                                                                         │
//! │  kirana-db errors (separate crate)                                     │
//! │  └── DbError          - Storage operation failures                     │
//! │                                                                         │
//! │  Counter app errors                                                    │
//! │  └── ApiError         - What the caller sees (serialized)              │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → ApiError → Caller                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A draft line item id does not exist.
    #[error("Line item not found: {0}")]
    LineItemNotFound(String),

    /// Invoice has exceeded the maximum allowed line items.
    #[error("Invoice cannot have more than {max} line items")]
    TooManyLineItems { max: usize },

    /// Stored totals disagree with a recomputation from the line items.
    ///
    /// ## When This Occurs
    /// - A stored invoice was edited outside the calculator
    /// - A renderer was handed hand-built totals
    #[error("Totals of invoice {invoice_number} do not match its line items")]
    TotalsMismatch { invoice_number: String },

    /// Invoice numbering failed.
    #[error(transparent)]
    Numbering(#[from] NumberingError),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// Reported immediately; nothing is committed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange {
        field: String,
        min: String,
        max: String,
    },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Invalid format (e.g., invalid phone, invalid GSTIN).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

impl ValidationError {
    /// Creates a Required error for a field.
    pub fn required(field: impl Into<String>) -> Self {
        ValidationError::Required {
            field: field.into(),
        }
    }

    /// A figure that does not fit the decimal range.
    pub fn overflow(field: impl Into<String>) -> Self {
        ValidationError::OutOfRange {
            field: field.into(),
            min: "0".to_string(),
            max: rust_decimal::Decimal::MAX.to_string(),
        }
    }
}

// =============================================================================
// Numbering Error
// =============================================================================

/// Invoice numbering errors.
///
/// Kept apart from storage errors so the save flow can decide between
/// failing and issuing a provisional number.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NumberingError {
    /// Existing invoice numbers could not be read.
    #[error("Invoice number source unavailable: {reason}")]
    SourceUnavailable { reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::required("description");
        assert_eq!(err.to_string(), "description is required");

        let err = ValidationError::OutOfRange {
            field: "discount".to_string(),
            min: "0".to_string(),
            max: "100".to_string(),
        };
        assert_eq!(err.to_string(), "discount must be between 0 and 100");
    }

    #[test]
    fn test_numbering_error_is_transparent() {
        let err: CoreError = NumberingError::SourceUnavailable {
            reason: "connection refused".to_string(),
        }
        .into();
        assert_eq!(
            err.to_string(),
            "Invoice number source unavailable: connection refused"
        );
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let core_err: CoreError = ValidationError::required("phone").into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
