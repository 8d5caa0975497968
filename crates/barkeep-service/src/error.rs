//! # Service Error Types
//!
//! The union of what the layers below can fail with. The API boundary
//! ([`crate::api`]) turns these into status-coded responses.

use thiserror::Error;

use barkeep_core::CoreError;
use barkeep_db::DbError;

/// Errors surfaced by the service layer.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Business rule violation from barkeep-core.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Storage failure from barkeep-db.
    #[error(transparent)]
    Db(#[from] DbError),
}

impl From<barkeep_core::ValidationError> for ServiceError {
    fn from(err: barkeep_core::ValidationError) -> Self {
        ServiceError::Core(CoreError::Validation(err))
    }
}

/// Result type for service operations.
pub type ServiceResult<T> = Result<T, ServiceError>;
