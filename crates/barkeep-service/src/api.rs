//! # API Boundary Error Mapping
//!
//! The HTTP layer lives outside this workspace; what it consumes from here
//! is [`ApiError`], a status-coded, JSON-ready rendering of everything the
//! services can fail with.
//!
//! ## Status Mapping
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ValidationError                          → 400                        │
//! │  NotFound (core or db)                    → 404                        │
//! │  Conflict (duplicate name, sale state,    → 409  + code               │
//! │            swap state, deactivation)             + details             │
//! │  UnsupportedStrategy                      → 409  UNSUPPORTED_STRATEGY  │
//! │  SaleClosed                               → 409  SALE_CLOSED           │
//! │  InsufficientPayment                      → 409  INSUFFICIENT_PAYMENT  │
//! │  Storage (everything else from sqlx)      → 500                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;
use serde_json::json;

use crate::error::ServiceError;
use barkeep_core::{ConflictReport, CoreError};
use barkeep_db::DbError;

/// Broad error category, for client-side branching before reading `code`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKind {
    Validation,
    NotFound,
    Conflict,
    Storage,
}

/// The error body handed to the HTTP layer.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    pub kind: ErrorKind,
    /// Human-readable message; safe to show to the operator.
    pub message: String,
    /// HTTP status the boundary should respond with.
    #[serde(skip)]
    pub status: u16,
    /// Machine-readable code for 409s (e.g. `BRAND_IN_USE`, `SALE_CLOSED`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Structured extras: dependent counts, offered strategies, amounts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    fn new(kind: ErrorKind, status: u16, message: impl Into<String>) -> Self {
        ApiError {
            kind,
            message: message.into(),
            status,
            code: None,
            details: None,
        }
    }

    fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Renders an unresolved deactivation conflict as a 409 body.
    ///
    /// This is for callers that treat `DeactivationOutcome::Conflict` as a
    /// response rather than an error; the report itself is not a
    /// `ServiceError`.
    pub fn from_conflict(report: &ConflictReport) -> Self {
        ApiError::new(
            ErrorKind::Conflict,
            409,
            format!("Deactivation conflict: {} dependents", report.count),
        )
        .with_code(report.code.clone())
        .with_details(json!({
            "count": report.count,
            "strategies": report.strategies,
            "blocking": report.blocking,
        }))
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Core(core) => match core {
                CoreError::Validation(v) => {
                    ApiError::new(ErrorKind::Validation, 400, v.to_string())
                }
                CoreError::NotFound { .. } => {
                    ApiError::new(ErrorKind::NotFound, 404, core.to_string())
                }
                CoreError::Conflict { code, message } => {
                    ApiError::new(ErrorKind::Conflict, 409, message).with_code(code)
                }
                CoreError::UnsupportedStrategy { .. } => {
                    ApiError::new(ErrorKind::Conflict, 409, core.to_string())
                        .with_code("UNSUPPORTED_STRATEGY")
                }
                CoreError::SaleClosed { .. } => {
                    ApiError::new(ErrorKind::Conflict, 409, core.to_string())
                        .with_code("SALE_CLOSED")
                }
                CoreError::InsufficientPayment {
                    required_cents,
                    paid_cents,
                    ..
                } => ApiError::new(ErrorKind::Conflict, 409, core.to_string())
                    .with_code("INSUFFICIENT_PAYMENT")
                    .with_details(json!({
                        "required": required_cents,
                        "paid": paid_cents,
                    })),
            },
            ServiceError::Db(db) => match db {
                DbError::NotFound { .. } => {
                    ApiError::new(ErrorKind::NotFound, 404, db.to_string())
                }
                DbError::UniqueViolation { .. } => {
                    ApiError::new(ErrorKind::Conflict, 409, db.to_string())
                        .with_code("DUPLICATE_NAME")
                }
                other => ApiError::new(ErrorKind::Storage, 500, other.to_string()),
            },
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
