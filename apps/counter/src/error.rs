//! # API Error Type
//!
//! Unified error type for counter commands.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Kirana Billing                         │
//! │                                                                         │
//! │  Caller                      Rust Backend                               │
//! │  ──────                      ────────────                               │
//! │                                                                         │
//! │  {"command":"save_invoice"}                                             │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  Command Function                                                │  │
//! │  │  Result<T, ApiError>                                             │  │
//! │  │         │                                                        │  │
//! │  │         ▼                                                        │  │
//! │  │  Validation? ──── ValidationError ─────────────┐                 │  │
//! │  │         │                                      │                 │  │
//! │  │         ▼                                      ▼                 │  │
//! │  │  Storage? ─────── DbError / NumberingError ── ApiError ────────►│  │
//! │  │         │                                      ▲                 │  │
//! │  │         ▼                                      │                 │  │
//! │  │  Render? ──────── RenderError ─────────────────┘                 │  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! │                                                                         │
//! │  ◄── {"ok":false,"error":{"code":"PERSISTENCE_ERROR","message":...}}   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every collaborator error is converted here, at the boundary, into one of
//! the codes below.

use serde::Serialize;
use tracing::error;

use kirana_core::{CoreError, NumberingError, ValidationError};
use kirana_db::DbError;

use crate::render::RenderError;

/// API error returned from commands.
///
/// ## Serialization
/// ```json
/// {
///   "code": "NOT_FOUND",
///   "message": "Invoice not found: 2401150004"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code
    pub code: ErrorCode,

    /// Human-readable error message
    pub message: String,
}

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Bad line item, missing customer field, malformed arguments
    ValidationError,

    /// Store read or write failed; nothing was rendered
    PersistenceError,

    /// Print or export failed; any saved invoice stays saved
    RenderingError,

    /// Resource not found
    NotFound,

    /// Unknown command or a bug
    Internal,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    /// Creates a not found error.
    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    /// Creates a persistence error.
    pub fn persistence(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::PersistenceError, message)
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }
}

/// Converts storage errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, &id),
            DbError::UniqueViolation { field, value } => ApiError::new(
                ErrorCode::ValidationError,
                format!("{} '{}' already exists", field, value),
            ),
            DbError::ForeignKeyViolation { message } => {
                error!("Foreign key violation: {}", message);
                ApiError::validation("Invalid reference")
            }
            DbError::CorruptRow { entity, reason } => {
                error!(entity = %entity, "Corrupt row: {}", reason);
                ApiError::persistence(format!("Stored {} is unreadable", entity))
            }
            DbError::ConnectionFailed(e) => {
                error!("Store connection failed: {}", e);
                ApiError::persistence("Storage unavailable")
            }
            DbError::MigrationFailed(_) => ApiError::persistence("Database migration failed"),
            DbError::QueryFailed(e) => {
                // Log the actual error but return a generic message
                error!("Database query failed: {}", e);
                ApiError::persistence("Database operation failed")
            }
            DbError::TransactionFailed(e) => {
                error!("Transaction failed: {}", e);
                ApiError::persistence("Database transaction failed")
            }
            DbError::PoolExhausted => ApiError::persistence("Database pool exhausted"),
            DbError::Internal(e) => {
                error!("Internal database error: {}", e);
                ApiError::persistence("Database operation failed")
            }
        }
    }
}

/// Converts core errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::LineItemNotFound(id) => ApiError::not_found("Line item", &id),
            CoreError::TooManyLineItems { max } => ApiError::validation(format!(
                "Invoice cannot have more than {} line items",
                max
            )),
            CoreError::TotalsMismatch { invoice_number } => {
                error!(invoice_number = %invoice_number, "Stored totals disagree with line items");
                ApiError::new(
                    ErrorCode::RenderingError,
                    format!("Invoice {} has inconsistent totals", invoice_number),
                )
            }
            CoreError::Numbering(e) => e.into(),
            CoreError::Validation(e) => e.into(),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::validation(err.to_string())
    }
}

/// Numbering only fails when the invoice store cannot be read.
impl From<NumberingError> for ApiError {
    fn from(err: NumberingError) -> Self {
        ApiError::persistence(err.to_string())
    }
}

impl From<RenderError> for ApiError {
    fn from(err: RenderError) -> Self {
        error!("Render failed: {}", err);
        ApiError::new(ErrorCode::RenderingError, err.to_string())
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}
