//! # Request Context
//!
//! Identity of the caller, passed explicitly into every state-changing
//! service operation. There is no ambient session here: the HTTP layer
//! authenticates however it wants and hands the resolved user id down.

use serde::{Deserialize, Serialize};

/// Who is performing the operation.
///
/// Stamped into `created_by` columns and audit rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestContext {
    pub user_id: String,
}

impl RequestContext {
    pub fn new(user_id: impl Into<String>) -> Self {
        RequestContext {
            user_id: user_id.into(),
        }
    }
}
