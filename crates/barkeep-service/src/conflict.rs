//! # Conflict Detector
//!
//! Answers one question: can this entity be deactivated right now, and if
//! not, why? The per-kind rule tables live in `barkeep-core::lifecycle`;
//! this module maps each [`Dependent`] to its counting query and walks the
//! rules in order (blocking first), so the first fired rule wins.
//!
//! Detection never mutates: a probe with conflicts returns the report and
//! leaves the database untouched.

use sqlx::SqliteConnection;
use tracing::debug;

use barkeep_core::lifecycle::Dependent;
use barkeep_core::{ConflictReport, EntityKind};
use barkeep_db::repository::{catalog, product, sale};
use barkeep_db::{Database, DbResult};

/// Counts the dependents one rule cares about.
async fn count_dependents_on(
    conn: &mut SqliteConnection,
    kind: EntityKind,
    id: i64,
    dependent: Dependent,
) -> DbResult<i64> {
    match dependent {
        Dependent::ActiveProducts => product::count_active_referencing_on(conn, kind, id).await,
        Dependent::ActivePaymentMethods => {
            catalog::count_active_payment_methods_on(conn, id).await
        }
        Dependent::OpenSales => match kind {
            EntityKind::Bartable => sale::count_open_by_bartable_on(conn, id).await,
            EntityKind::Employee => sale::count_open_by_employee_on(conn, id).await,
            _ => Ok(0),
        },
        Dependent::SystemFlag => Ok(catalog::account_is_system_on(conn, id).await? as i64),
    }
}

/// Probes an entity's deactivation conflicts on the caller's connection.
///
/// Returns `None` when every rule counts zero dependents, otherwise the
/// report for the first fired rule. Rule order puts blocking rules first,
/// so a hard block shadows any resolvable conflict behind it.
pub async fn detect_on(
    conn: &mut SqliteConnection,
    kind: EntityKind,
    id: i64,
) -> DbResult<Option<ConflictReport>> {
    for rule in kind.rules() {
        let count = count_dependents_on(conn, kind, id, rule.dependent).await?;
        if count > 0 {
            debug!(kind = %kind, id = %id, code = %rule.code, count = %count, "Deactivation conflict");
            return Ok(Some(ConflictReport::from_rule(rule, count)));
        }
    }
    Ok(None)
}

/// Pool-backed detector for read-only conflict probes (the "can I delete
/// this?" preview the UI shows before asking for a strategy).
#[derive(Debug, Clone)]
pub struct ConflictDetector {
    db: Database,
}

impl ConflictDetector {
    pub fn new(db: Database) -> Self {
        ConflictDetector { db }
    }

    pub async fn detect(&self, kind: EntityKind, id: i64) -> DbResult<Option<ConflictReport>> {
        let mut conn = self.db.pool().acquire().await?;
        detect_on(&mut conn, kind, id).await
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
