//! # Entity Lifecycle Service
//!
//! Deactivation, reactivation and swap-reactivation of catalog entities.
//!
//! ## Deactivation Protocol
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  deactivate(ctx, kind, id, strategy?)                                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  BEGIN ── load flag ── already inactive? ──► Deactivated (no-op)        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  detect conflicts                                                       │
//! │       ├── none ─────────────► flip flag + audit ──► COMMIT              │
//! │       ├── no strategy ──────► Conflict(report), nothing written         │
//! │       ├── blocking ─────────► Conflict(report), nothing written         │
//! │       ├── wrong strategy ───► Err(UnsupportedStrategy)                  │
//! │       └── valid strategy ───► side effect + flip + audit ──► COMMIT     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! One multi-step operation writes exactly one audit entry, inside the same
//! transaction as the flag flips.

use serde::Serialize;
use serde_json::json;
use tracing::info;

use crate::audit;
use crate::conflict::detect_on;
use crate::context::RequestContext;
use crate::error::{ServiceError, ServiceResult};
use barkeep_core::{AuditAction, ConflictReport, CoreError, EntityKind, Strategy};
use barkeep_db::repository::{catalog, product};
use barkeep_db::{Database, DbError};

/// Result of a deactivation attempt.
///
/// A conflict is a *response*, not an error: the caller renders the report
/// and may re-invoke with one of the offered strategies.
#[derive(Debug, Serialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum DeactivationOutcome {
    Deactivated,
    Conflict(ConflictReport),
}

#[derive(Debug, Clone)]
pub struct LifecycleService {
    db: Database,
}

impl LifecycleService {
    pub fn new(db: Database) -> Self {
        LifecycleService { db }
    }

    /// Deactivates an entity, resolving dependents with `strategy` if one
    /// is both supplied and offered by the conflict report.
    pub async fn deactivate(
        &self,
        ctx: &RequestContext,
        kind: EntityKind,
        id: i64,
        strategy: Option<Strategy>,
    ) -> ServiceResult<DeactivationOutcome> {
        let mut tx = self.db.pool().begin().await.map_err(DbError::from)?;

        let active = catalog::find_active_flag_on(&mut tx, kind, id)
            .await?
            .ok_or_else(|| CoreError::not_found(kind.display_name(), id))?;
        if !active {
            // Re-applying a deactivation is a no-op, not an error
            return Ok(DeactivationOutcome::Deactivated);
        }

        let Some(report) = detect_on(&mut tx, kind, id).await? else {
            catalog::set_active_on(&mut tx, kind, id, false).await?;
            audit::record(&mut tx, ctx, kind.as_str(), id, AuditAction::Deactivate, None).await?;
            tx.commit().await.map_err(DbError::from)?;
            info!(kind = %kind, id = %id, "Entity deactivated");
            return Ok(DeactivationOutcome::Deactivated);
        };

        // Hard blocks refuse the deactivation no matter what was supplied;
        // without a strategy the report goes back as-is. Neither path has
        // written anything, so dropping the transaction is enough.
        if report.blocking {
            return Ok(DeactivationOutcome::Conflict(report));
        }
        let Some(strategy) = strategy else {
            return Ok(DeactivationOutcome::Conflict(report));
        };
        if !report.allows(strategy) {
            return Err(ServiceError::Core(CoreError::UnsupportedStrategy {
                kind: kind.as_str().to_string(),
                strategy: strategy.as_str().to_string(),
            }));
        }

        let affected = match strategy {
            Strategy::ClearReferences => product::clear_references_on(&mut tx, kind, id).await?,
            Strategy::CascadeDependents => product::cascade_deactivate_on(&mut tx, kind, id).await?,
            Strategy::CascadePayments => {
                catalog::cascade_deactivate_payment_methods_on(&mut tx, id).await?
            }
        };
        catalog::set_active_on(&mut tx, kind, id, false).await?;
        audit::record_with(
            &mut tx,
            ctx,
            kind.as_str(),
            id,
            AuditAction::Deactivate,
            &json!({ "strategy": strategy, "affected": affected }),
        )
        .await?;
        tx.commit().await.map_err(DbError::from)?;

        info!(kind = %kind, id = %id, strategy = %strategy, affected = %affected, "Entity deactivated with strategy");
        Ok(DeactivationOutcome::Deactivated)
    }

    /// Reactivates an entity. Unconditional: dependents cleared or
    /// deactivated earlier are *not* resurrected.
    pub async fn reactivate(
        &self,
        ctx: &RequestContext,
        kind: EntityKind,
        id: i64,
    ) -> ServiceResult<()> {
        let mut tx = self.db.pool().begin().await.map_err(DbError::from)?;

        let active = catalog::find_active_flag_on(&mut tx, kind, id)
            .await?
            .ok_or_else(|| CoreError::not_found(kind.display_name(), id))?;
        if active {
            return Ok(());
        }

        catalog::set_active_on(&mut tx, kind, id, true).await?;
        audit::record(&mut tx, ctx, kind.as_str(), id, AuditAction::Reactivate, None).await?;
        tx.commit().await.map_err(DbError::from)?;

        info!(kind = %kind, id = %id, "Entity reactivated");
        Ok(())
    }

    /// Atomically reactivates `inactive_id` and deactivates `current_id`,
    /// preserving the one-active-slot invariant of the kinds that declare
    /// it. Involutive: swapping back restores the original assignment.
    ///
    /// ## Failure
    /// - `Conflict(SWAP_UNSUPPORTED)` for kinds without the invariant
    /// - `NotFound` when either id is absent
    /// - `Conflict(SWAP_STATE)` when the records are not in the expected
    ///   inactive/active states
    /// - `Conflict(<blocking code>)` when a hard block (e.g. an open sale
    ///   on the outgoing bartable) refuses the deactivation half
    pub async fn reactivate_swap(
        &self,
        ctx: &RequestContext,
        kind: EntityKind,
        inactive_id: i64,
        current_id: i64,
    ) -> ServiceResult<()> {
        if !kind.supports_swap() {
            return Err(ServiceError::Core(CoreError::conflict(
                "SWAP_UNSUPPORTED",
                format!("{} does not support swap reactivation", kind.display_name()),
            )));
        }

        let mut tx = self.db.pool().begin().await.map_err(DbError::from)?;

        let inactive_flag = catalog::find_active_flag_on(&mut tx, kind, inactive_id)
            .await?
            .ok_or_else(|| CoreError::not_found(kind.display_name(), inactive_id))?;
        let current_flag = catalog::find_active_flag_on(&mut tx, kind, current_id)
            .await?
            .ok_or_else(|| CoreError::not_found(kind.display_name(), current_id))?;

        if inactive_flag || !current_flag {
            return Err(ServiceError::Core(CoreError::conflict(
                "SWAP_STATE",
                format!(
                    "swap expects {} {} inactive and {} active",
                    kind.display_name(),
                    inactive_id,
                    current_id
                ),
            )));
        }

        // The deactivation half still honors hard blocks; resolvable
        // conflicts do not stop a swap.
        if let Some(report) = detect_on(&mut tx, kind, current_id).await? {
            if report.blocking {
                return Err(ServiceError::Core(CoreError::conflict(
                    report.code,
                    format!("{} {} cannot be deactivated", kind.display_name(), current_id),
                )));
            }
        }

        catalog::set_active_on(&mut tx, kind, inactive_id, true).await?;
        catalog::set_active_on(&mut tx, kind, current_id, false).await?;
        audit::record_with(
            &mut tx,
            ctx,
            kind.as_str(),
            inactive_id,
            AuditAction::SwapReactivate,
            &json!({ "reactivated": inactive_id, "deactivated": current_id }),
        )
        .await?;
        tx.commit().await.map_err(DbError::from)?;

        info!(kind = %kind, reactivated = %inactive_id, deactivated = %current_id, "Swap reactivation");
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use barkeep_core::Money;
    use barkeep_db::repository::product::ProductInput;
    use barkeep_db::repository::sale::insert_sale_on;
    use barkeep_db::DbConfig;

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn ctx() -> RequestContext {
        RequestContext::new("u1")
    }

    async fn seed_branded_product(db: &Database, name: &str, brand_id: i64) -> i64 {
        db.products()
            .insert(ProductInput {
                name: name.to_string(),
                price: Money::from_cents(300),
                category_id: None,
                brand_id: Some(brand_id),
                provider_id: None,
            })
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn test_deactivate_without_dependents_needs_no_strategy() {
        let db = test_db().await;
        let brand = db.brands().insert("Victoria").await.unwrap();

        let service = LifecycleService::new(db.clone());
        let outcome = service
            .deactivate(&ctx(), EntityKind::Brand, brand.id, None)
            .await
            .unwrap();
        assert!(matches!(outcome, DeactivationOutcome::Deactivated));
        assert!(!db.brands().find_by_id(brand.id).await.unwrap().unwrap().active);

        let trail = db.audit().list_for_entity("brand", brand.id).await.unwrap();
        assert_eq!(trail.len(), 1);
        assert_eq!(trail[0].action, "DEACTIVATE");
    }

    #[tokio::test]
    async fn test_conflict_probe_mutates_nothing() {
        let db = test_db().await;
        let brand = db.brands().insert("Stella").await.unwrap();
        let p1 = seed_branded_product(&db, "Stella 33cl", brand.id).await;
        let p2 = seed_branded_product(&db, "Stella 25cl", brand.id).await;

        let service = LifecycleService::new(db.clone());
        let outcome = service
            .deactivate(&ctx(), EntityKind::Brand, brand.id, None)
            .await
            .unwrap();
        let DeactivationOutcome::Conflict(report) = outcome else {
            panic!("expected a conflict report");
        };
        assert_eq!(report.code, "BRAND_IN_USE");
        assert_eq!(report.count, 2);

        // Nothing moved and nothing was audited
        assert!(db.brands().find_by_id(brand.id).await.unwrap().unwrap().active);
        assert!(db.products().find_by_id(p1).await.unwrap().unwrap().active);
        assert!(db.products().find_by_id(p2).await.unwrap().unwrap().active);
        assert!(db
            .audit()
            .list_for_entity("brand", brand.id)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_cascade_deactivates_brand_and_products_with_one_audit_entry() {
        let db = test_db().await;
        let brand = db.brands().insert("Stella").await.unwrap();
        let p1 = seed_branded_product(&db, "Stella 33cl", brand.id).await;
        let p2 = seed_branded_product(&db, "Stella 25cl", brand.id).await;

        let service = LifecycleService::new(db.clone());
        let outcome = service
            .deactivate(
                &ctx(),
                EntityKind::Brand,
                brand.id,
                Some(Strategy::CascadeDependents),
            )
            .await
            .unwrap();
        assert!(matches!(outcome, DeactivationOutcome::Deactivated));

        assert!(!db.brands().find_by_id(brand.id).await.unwrap().unwrap().active);
        for pid in [p1, p2] {
            let p = db.products().find_by_id(pid).await.unwrap().unwrap();
            assert!(!p.active);
            assert_eq!(p.brand_id, Some(brand.id));
        }

        let trail = db.audit().list_for_entity("brand", brand.id).await.unwrap();
        assert_eq!(trail.len(), 1);
        let payload = trail[0].payload.as_deref().unwrap();
        assert!(payload.contains("cascade-dependents"));
        assert!(payload.contains("\"affected\":2"));
    }

    #[tokio::test]
    async fn test_clear_references_keeps_products_selling() {
        let db = test_db().await;
        let provider = db.providers().insert("Disbesa").await.unwrap();
        let pid = db
            .products()
            .insert(ProductInput {
                name: "Vermut".to_string(),
                price: Money::from_cents(350),
                category_id: None,
                brand_id: None,
                provider_id: Some(provider.id),
            })
            .await
            .unwrap()
            .id;

        let service = LifecycleService::new(db.clone());
        service
            .deactivate(
                &ctx(),
                EntityKind::Provider,
                provider.id,
                Some(Strategy::ClearReferences),
            )
            .await
            .unwrap();

        let p = db.products().find_by_id(pid).await.unwrap().unwrap();
        assert!(p.active);
        assert_eq!(p.provider_id, None);
    }

    #[tokio::test]
    async fn test_redeactivation_is_idempotent() {
        let db = test_db().await;
        let brand = db.brands().insert("Stella").await.unwrap();
        seed_branded_product(&db, "Stella 33cl", brand.id).await;

        let service = LifecycleService::new(db.clone());
        service
            .deactivate(
                &ctx(),
                EntityKind::Brand,
                brand.id,
                Some(Strategy::CascadeDependents),
            )
            .await
            .unwrap();
        // Second apply: already inactive, succeeds without a second audit row
        let outcome = service
            .deactivate(
                &ctx(),
                EntityKind::Brand,
                brand.id,
                Some(Strategy::CascadeDependents),
            )
            .await
            .unwrap();
        assert!(matches!(outcome, DeactivationOutcome::Deactivated));
        assert_eq!(
            db.audit()
                .list_for_entity("brand", brand.id)
                .await
                .unwrap()
                .len(),
            1
        );
    }

    #[tokio::test]
    async fn test_strategy_outside_report_is_rejected() {
        let db = test_db().await;
        let account = db.accounts().insert("Banco").await.unwrap();
        db.payment_methods()
            .insert("Tarjeta", account.id)
            .await
            .unwrap();

        let service = LifecycleService::new(db.clone());
        // Accounts only offer cascade-payments
        let err = service
            .deactivate(
                &ctx(),
                EntityKind::Account,
                account.id,
                Some(Strategy::ClearReferences),
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Core(CoreError::UnsupportedStrategy { .. })
        ));
        assert!(db
            .accounts()
            .find_by_id(account.id)
            .await
            .unwrap()
            .unwrap()
            .active);
    }

    #[tokio::test]
    async fn test_system_account_refused_even_with_strategy() {
        let db = test_db().await;
        let caja = db.accounts().find_system().await.unwrap().unwrap();

        let service = LifecycleService::new(db.clone());
        let outcome = service
            .deactivate(
                &ctx(),
                EntityKind::Account,
                caja.id,
                Some(Strategy::CascadePayments),
            )
            .await
            .unwrap();
        let DeactivationOutcome::Conflict(report) = outcome else {
            panic!("expected the SYSTEM_ACCOUNT block");
        };
        assert_eq!(report.code, "SYSTEM_ACCOUNT");
        assert!(report.blocking);
        assert!(db.accounts().find_system().await.unwrap().unwrap().active);
    }

    #[tokio::test]
    async fn test_account_cascade_payments() {
        let db = test_db().await;
        let account = db.accounts().insert("Banco").await.unwrap();
        let m1 = db.payment_methods().insert("Tarjeta", account.id).await.unwrap();
        let m2 = db.payment_methods().insert("Bizum", account.id).await.unwrap();

        let service = LifecycleService::new(db.clone());
        service
            .deactivate(
                &ctx(),
                EntityKind::Account,
                account.id,
                Some(Strategy::CascadePayments),
            )
            .await
            .unwrap();

        assert!(!db.accounts().find_by_id(account.id).await.unwrap().unwrap().active);
        for mid in [m1.id, m2.id] {
            assert!(!db
                .payment_methods()
                .find_by_id(mid)
                .await
                .unwrap()
                .unwrap()
                .active);
        }
    }

    #[tokio::test]
    async fn test_deactivate_missing_entity_is_not_found() {
        let db = test_db().await;
        let service = LifecycleService::new(db);
        let err = service
            .deactivate(&ctx(), EntityKind::Category, 404, None)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Core(CoreError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_reactivate_round_trip() {
        let db = test_db().await;
        let employee = db.employees().insert("Marta").await.unwrap();

        let service = LifecycleService::new(db.clone());
        service
            .deactivate(&ctx(), EntityKind::Employee, employee.id, None)
            .await
            .unwrap();
        service
            .reactivate(&ctx(), EntityKind::Employee, employee.id)
            .await
            .unwrap();

        assert!(db
            .employees()
            .find_by_id(employee.id)
            .await
            .unwrap()
            .unwrap()
            .active);
        let trail = db
            .audit()
            .list_for_entity("employee", employee.id)
            .await
            .unwrap();
        assert_eq!(trail.len(), 2);
        assert_eq!(trail[1].action, "REACTIVATE");
    }

    #[tokio::test]
    async fn test_swap_round_trip_restores_state() {
        let db = test_db().await;
        let t1 = db.bartables().insert(1).await.unwrap();
        let t2 = db.bartables().insert(2).await.unwrap();

        let service = LifecycleService::new(db.clone());
        service
            .deactivate(&ctx(), EntityKind::Bartable, t2.id, None)
            .await
            .unwrap();

        // t2 comes back, t1 goes away
        service
            .reactivate_swap(&ctx(), EntityKind::Bartable, t2.id, t1.id)
            .await
            .unwrap();
        assert!(db.bartables().find_by_id(t2.id).await.unwrap().unwrap().active);
        assert!(!db.bartables().find_by_id(t1.id).await.unwrap().unwrap().active);

        // Swapping back restores the original assignment
        service
            .reactivate_swap(&ctx(), EntityKind::Bartable, t1.id, t2.id)
            .await
            .unwrap();
        assert!(db.bartables().find_by_id(t1.id).await.unwrap().unwrap().active);
        assert!(!db.bartables().find_by_id(t2.id).await.unwrap().unwrap().active);
    }

    #[tokio::test]
    async fn test_swap_rejects_wrong_states_and_kinds() {
        let db = test_db().await;
        let t1 = db.bartables().insert(1).await.unwrap();
        let t2 = db.bartables().insert(2).await.unwrap();

        let service = LifecycleService::new(db.clone());
        // Both active: SWAP_STATE
        let err = service
            .reactivate_swap(&ctx(), EntityKind::Bartable, t1.id, t2.id)
            .await
            .unwrap_err();
        assert!(
            matches!(&err, ServiceError::Core(CoreError::Conflict { code, .. }) if code == "SWAP_STATE")
        );

        // Brands never swap
        let brand = db.brands().insert("Stella").await.unwrap();
        let err = service
            .reactivate_swap(&ctx(), EntityKind::Brand, brand.id, brand.id)
            .await
            .unwrap_err();
        assert!(
            matches!(&err, ServiceError::Core(CoreError::Conflict { code, .. }) if code == "SWAP_UNSUPPORTED")
        );
    }

    #[tokio::test]
    async fn test_swap_honors_open_sale_block() {
        let db = test_db().await;
        let busy = db.bartables().insert(1).await.unwrap();
        let spare = db.bartables().insert(2).await.unwrap();

        let service = LifecycleService::new(db.clone());
        service
            .deactivate(&ctx(), EntityKind::Bartable, spare.id, None)
            .await
            .unwrap();
        {
            let mut conn = db.pool().acquire().await.unwrap();
            insert_sale_on(&mut conn, "u1", Some(busy.id), None)
                .await
                .unwrap();
        }

        let err = service
            .reactivate_swap(&ctx(), EntityKind::Bartable, spare.id, busy.id)
            .await
            .unwrap_err();
        assert!(
            matches!(&err, ServiceError::Core(CoreError::Conflict { code, .. }) if code == "BARTABLE_IN_USE")
        );
        assert!(db.bartables().find_by_id(busy.id).await.unwrap().unwrap().active);
    }
}
