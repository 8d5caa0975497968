//! # Audit Repository
//!
//! Append-only audit trail. Rows are written by the services inside the
//! same transaction as the change they describe, so a committed change
//! always has its audit row and a rolled-back one never does.
//!
//! There is no update or delete here on purpose.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};

use crate::error::DbResult;
use barkeep_core::{AuditAction, AuditEntry};

const COLUMNS: &str = "id, created_at, user_id, entity, entity_id, action, payload";

#[derive(Debug, Clone)]
pub struct AuditRepository {
    pool: SqlitePool,
}

impl AuditRepository {
    pub fn new(pool: SqlitePool) -> Self {
        AuditRepository { pool }
    }

    /// Lists the newest entries first.
    pub async fn list_recent(&self, limit: i64) -> DbResult<Vec<AuditEntry>> {
        let entries = sqlx::query_as::<_, AuditEntry>(&format!(
            "SELECT {} FROM audit_log ORDER BY id DESC LIMIT ?1",
            COLUMNS
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    /// Lists every entry recorded against one entity, oldest first.
    pub async fn list_for_entity(&self, entity: &str, entity_id: i64) -> DbResult<Vec<AuditEntry>> {
        let entries = sqlx::query_as::<_, AuditEntry>(&format!(
            "SELECT {} FROM audit_log WHERE entity = ?1 AND entity_id = ?2 ORDER BY id ASC",
            COLUMNS
        ))
        .bind(entity)
        .bind(entity_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }
}

/// Appends one audit row on the caller's connection.
///
/// `payload` is an optional JSON document with operation details
/// (strategy used, cascade counts, totals...).
pub async fn insert_entry_on(
    conn: &mut SqliteConnection,
    user_id: &str,
    entity: &str,
    entity_id: i64,
    action: AuditAction,
    payload: Option<&str>,
) -> DbResult<i64> {
    let now = Utc::now();
    let result = sqlx::query(
        "INSERT INTO audit_log (created_at, user_id, entity, entity_id, action, payload) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    )
    .bind(now)
    .bind(user_id)
    .bind(entity)
    .bind(entity_id)
    .bind(action.as_str())
    .bind(payload)
    .execute(conn)
    .await?;

    Ok(result.last_insert_rowid())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    #[tokio::test]
    async fn test_append_and_list() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let mut conn = db.pool().acquire().await.unwrap();
        insert_entry_on(&mut conn, "u1", "brand", 7, AuditAction::Create, None)
            .await
            .unwrap();
        insert_entry_on(
            &mut conn,
            "u1",
            "brand",
            7,
            AuditAction::Deactivate,
            Some(r#"{"strategy":"cascade-dependents","affected":3}"#),
        )
        .await
        .unwrap();
        drop(conn);

        let trail = db.audit().list_for_entity("brand", 7).await.unwrap();
        assert_eq!(trail.len(), 2);
        assert_eq!(trail[0].action, "CREATE");
        assert_eq!(trail[1].action, "DEACTIVATE");
        assert!(trail[1].payload.as_deref().unwrap().contains("cascade"));

        let recent = db.audit().list_recent(1).await.unwrap();
        assert_eq!(recent[0].action, "DEACTIVATE");
    }
}
