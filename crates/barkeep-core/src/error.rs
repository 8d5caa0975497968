//! # Error Types
//!
//! Domain-specific error types for barkeep-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  barkeep-core errors (this file)                                       │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  barkeep-db errors (separate crate)                                    │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  barkeep-service errors                                                │
//! │  └── ServiceError / ApiError - What the HTTP layer sees                │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → ServiceError → ApiError → client  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (entity, id, amounts)
//! 3. Errors are enum variants, never String
//! 4. Conflicts carry a machine-readable `code` the UI can branch on

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These errors represent business rule violations or domain logic failures.
/// They are translated to API responses at the service boundary.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Entity id does not exist (or is inactive where an active one is required).
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// A state-based conflict with a machine-readable code.
    ///
    /// ## When This Occurs
    /// - Duplicate normalized name on create/rename (`DUPLICATE_NAME`)
    /// - A second open sale requested for the same bartable/employee
    ///   (`SALE_ALREADY_OPEN`)
    /// - A swap whose records are already in the requested states
    ///   (`SWAP_STATE`)
    #[error("Conflict {code}: {message}")]
    Conflict { code: String, message: String },

    /// Caller picked a resolution strategy the conflict report did not offer.
    #[error("Strategy '{strategy}' is not applicable to {kind}")]
    UnsupportedStrategy { kind: String, strategy: String },

    /// The sale is closed; line/payment mutations are no longer allowed.
    ///
    /// Closed is terminal: there is no transition back to open.
    #[error("Sale {sale_id} is closed")]
    SaleClosed { sale_id: i64 },

    /// `close_sale` was attempted before payments cover the total.
    #[error("Insufficient payment for sale {sale_id}: required {required_cents}, paid {paid_cents}")]
    InsufficientPayment {
        sale_id: i64,
        required_cents: i64,
        paid_cents: i64,
    },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Creates a NotFound error.
    pub fn not_found(entity: impl Into<String>, id: impl std::fmt::Display) -> Self {
        CoreError::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    /// Creates a Conflict error with a machine-readable code.
    pub fn conflict(code: impl Into<String>, message: impl Into<String>) -> Self {
        CoreError::Conflict {
            code: code.into(),
            message: message.into(),
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when input doesn't meet requirements.
/// Used for early validation before business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
