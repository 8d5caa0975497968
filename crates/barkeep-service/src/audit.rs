//! # Audit Recorder
//!
//! Thin service-side wrapper over the append-only audit log. The recorder
//! writes on the caller's connection, so the audit row commits or rolls
//! back together with the change it describes. Write failures propagate;
//! an operation without its audit row must not commit.

use sqlx::SqliteConnection;
use serde::Serialize;

use crate::context::RequestContext;
use crate::error::ServiceResult;
use barkeep_core::AuditAction;
use barkeep_db::repository::audit;

/// Appends one audit row inside the caller's transaction.
pub async fn record(
    conn: &mut SqliteConnection,
    ctx: &RequestContext,
    entity: &str,
    entity_id: i64,
    action: AuditAction,
    payload: Option<&str>,
) -> ServiceResult<()> {
    audit::insert_entry_on(conn, &ctx.user_id, entity, entity_id, action, payload).await?;
    Ok(())
}

/// Like [`record`], but serializes a structured payload to JSON first.
pub async fn record_with<T: Serialize>(
    conn: &mut SqliteConnection,
    ctx: &RequestContext,
    entity: &str,
    entity_id: i64,
    action: AuditAction,
    payload: &T,
) -> ServiceResult<()> {
    // serde_json only fails on non-string map keys / custom Serialize
    // errors, neither of which our payload shapes produce
    let json = serde_json::to_string(payload)
        .map_err(|e| barkeep_db::DbError::Internal(e.to_string()))?;
    record(conn, ctx, entity, entity_id, action, Some(&json)).await
}
