//! # Sale Service
//!
//! The sale workflow: open a sale against a bartable (or at the counter),
//! mutate its lines, apply split payments, close once fully paid.
//!
//! ## State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   create_sale ──► OPEN ◄──┐                                             │
//! │                    │      │ add_or_update_line / remove_line            │
//! │                    │      │ set_discount / apply_payment                │
//! │                    │──────┘                                             │
//! │                    │                                                    │
//! │                    │ close_sale (paid ≥ total)                          │
//! │                    ▼                                                    │
//! │                 CLOSED ──── terminal, no reopen                         │
//! │                                                                         │
//! │   delete_sale: allowed from either state, irreversible                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every mutation runs in one transaction: guard reads, the write, the
//! total recompute and the audit row commit together. The stored total
//! therefore always equals the discounted sum of the line snapshots.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use crate::audit;
use crate::context::RequestContext;
use crate::error::{ServiceError, ServiceResult};
use barkeep_core::{
    AuditAction, CoreError, EntityKind, Money, Sale, SaleLine, SalePayment, ValidationError,
    MAX_LINE_QUANTITY, TRANSACTION_ORIGIN_SALE,
};
use barkeep_db::repository::{catalog, product, sale as sale_repo};
use barkeep_db::{Database, DbError};

/// Audit entity tag for sales (sales are not an [`EntityKind`]).
const SALE_ENTITY: &str = "sale";

/// Parameters for opening a sale. At least one of the two ids is required;
/// a sale without a bartable is a counter sale.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateSale {
    pub bartable_id: Option<i64>,
    pub employee_id: Option<i64>,
}

/// Read view of a full sale aggregate.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleDetail {
    pub sale: Sale,
    pub lines: Vec<SaleLine>,
    pub payments: Vec<SalePayment>,
}

#[derive(Debug, Clone)]
pub struct SaleService {
    db: Database,
}

impl SaleService {
    pub fn new(db: Database) -> Self {
        SaleService { db }
    }

    /// Opens a new sale.
    ///
    /// ## Failure
    /// - `Validation` when neither bartable nor employee is given
    /// - `NotFound` when the bartable/employee is missing or inactive
    /// - `Conflict(SALE_ALREADY_OPEN)` when the bartable already has an
    ///   open sale, or (counter mode) the employee already has one
    pub async fn create_sale(&self, ctx: &RequestContext, req: CreateSale) -> ServiceResult<Sale> {
        if req.bartable_id.is_none() && req.employee_id.is_none() {
            return Err(ValidationError::Required {
                field: "bartable_id or employee_id".to_string(),
            }
            .into());
        }

        let mut tx = self.db.pool().begin().await.map_err(DbError::from)?;

        if let Some(bartable_id) = req.bartable_id {
            let active = catalog::find_active_flag_on(&mut tx, EntityKind::Bartable, bartable_id)
                .await?
                .unwrap_or(false);
            if !active {
                return Err(CoreError::not_found("Bartable", bartable_id).into());
            }
            if sale_repo::count_open_by_bartable_on(&mut tx, bartable_id).await? > 0 {
                return Err(CoreError::conflict(
                    "SALE_ALREADY_OPEN",
                    format!("bartable {bartable_id} already has an open sale"),
                )
                .into());
            }
        }

        if let Some(employee_id) = req.employee_id {
            let active = catalog::find_active_flag_on(&mut tx, EntityKind::Employee, employee_id)
                .await?
                .unwrap_or(false);
            if !active {
                return Err(CoreError::not_found("Employee", employee_id).into());
            }
            // Counter mode: the employee is the slot, one open sale each
            if req.bartable_id.is_none()
                && sale_repo::count_open_counter_by_employee_on(&mut tx, employee_id).await? > 0
            {
                return Err(CoreError::conflict(
                    "SALE_ALREADY_OPEN",
                    format!("employee {employee_id} already has an open counter sale"),
                )
                .into());
            }
        }

        let sale =
            sale_repo::insert_sale_on(&mut tx, &ctx.user_id, req.bartable_id, req.employee_id)
                .await?;
        audit::record(&mut tx, ctx, SALE_ENTITY, sale.id, AuditAction::SaleOpen, None).await?;
        tx.commit().await.map_err(DbError::from)?;

        info!(sale_id = %sale.id, bartable_id = ?req.bartable_id, employee_id = ?req.employee_id, "Sale opened");
        Ok(sale)
    }

    /// Adds a product to the sale, or replaces its quantity if already
    /// present. The subtotal snapshots the product's current price;
    /// later price changes never touch existing lines.
    ///
    /// Returns the recomputed sale total.
    pub async fn add_or_update_line(
        &self,
        ctx: &RequestContext,
        sale_id: i64,
        product_id: i64,
        quantity: i64,
    ) -> ServiceResult<Money> {
        if quantity <= 0 {
            return Err(ValidationError::MustBePositive {
                field: "quantity".to_string(),
            }
            .into());
        }
        if quantity > MAX_LINE_QUANTITY {
            return Err(ValidationError::OutOfRange {
                field: "quantity".to_string(),
                min: 1,
                max: MAX_LINE_QUANTITY,
            }
            .into());
        }

        let mut tx = self.db.pool().begin().await.map_err(DbError::from)?;

        let sale = require_open_sale(&mut tx, sale_id).await?;
        let product = product::find_active_product_on(&mut tx, product_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Product", product_id))?;

        let subtotal = product.price().multiply_quantity(quantity);
        sale_repo::upsert_line_on(&mut tx, sale_id, product_id, quantity, subtotal).await?;
        let total = recompute_total_on(&mut tx, &sale).await?;
        audit::record_with(
            &mut tx,
            ctx,
            SALE_ENTITY,
            sale_id,
            AuditAction::SaleLineUpsert,
            &json!({
                "product_id": product_id,
                "quantity": quantity,
                "subtotal": subtotal.cents(),
            }),
        )
        .await?;
        tx.commit().await.map_err(DbError::from)?;

        Ok(total)
    }

    /// Removes a product's line from the sale and recomputes the total.
    pub async fn remove_line(
        &self,
        ctx: &RequestContext,
        sale_id: i64,
        product_id: i64,
    ) -> ServiceResult<Money> {
        let mut tx = self.db.pool().begin().await.map_err(DbError::from)?;

        let sale = require_open_sale(&mut tx, sale_id).await?;
        sale_repo::remove_line_on(&mut tx, sale_id, product_id).await?;
        let total = recompute_total_on(&mut tx, &sale).await?;
        audit::record_with(
            &mut tx,
            ctx,
            SALE_ENTITY,
            sale_id,
            AuditAction::SaleLineRemove,
            &json!({ "product_id": product_id }),
        )
        .await?;
        tx.commit().await.map_err(DbError::from)?;

        Ok(total)
    }

    /// Sets or clears the whole-percent discount and recomputes the total.
    pub async fn set_discount(
        &self,
        ctx: &RequestContext,
        sale_id: i64,
        discount: Option<i64>,
    ) -> ServiceResult<Money> {
        if let Some(pct) = discount {
            if !(0..=100).contains(&pct) {
                return Err(ValidationError::OutOfRange {
                    field: "discount".to_string(),
                    min: 0,
                    max: 100,
                }
                .into());
            }
        }

        let mut tx = self.db.pool().begin().await.map_err(DbError::from)?;

        let mut sale = require_open_sale(&mut tx, sale_id).await?;
        sale_repo::set_discount_on(&mut tx, sale_id, discount).await?;
        sale.discount = discount;
        let total = recompute_total_on(&mut tx, &sale).await?;
        audit::record_with(
            &mut tx,
            ctx,
            SALE_ENTITY,
            sale_id,
            AuditAction::SaleDiscount,
            &json!({ "discount": discount }),
        )
        .await?;
        tx.commit().await.map_err(DbError::from)?;

        Ok(total)
    }

    /// Records a payment towards the sale. Split tender is the norm;
    /// payments accumulate and closing checks the sum. Never auto-closes.
    pub async fn apply_payment(
        &self,
        ctx: &RequestContext,
        sale_id: i64,
        payment_method_id: i64,
        amount: Money,
    ) -> ServiceResult<SalePayment> {
        if !amount.is_positive() {
            return Err(ValidationError::MustBePositive {
                field: "amount".to_string(),
            }
            .into());
        }

        let mut tx = self.db.pool().begin().await.map_err(DbError::from)?;

        require_open_sale(&mut tx, sale_id).await?;
        let method_active =
            catalog::find_active_flag_on(&mut tx, EntityKind::PaymentMethod, payment_method_id)
                .await?
                .unwrap_or(false);
        if !method_active {
            return Err(CoreError::not_found("Payment method", payment_method_id).into());
        }

        let payment =
            sale_repo::insert_payment_on(&mut tx, sale_id, payment_method_id, amount, &ctx.user_id)
                .await?;
        audit::record_with(
            &mut tx,
            ctx,
            SALE_ENTITY,
            sale_id,
            AuditAction::SalePayment,
            &json!({
                "payment_method_id": payment_method_id,
                "amount": amount.cents(),
            }),
        )
        .await?;
        tx.commit().await.map_err(DbError::from)?;

        Ok(payment)
    }

    /// Closes the sale once payments cover the total, and books one income
    /// transaction per distinct payment-method account.
    ///
    /// ## Failure
    /// - `InsufficientPayment` when `sum(payments) < total`
    /// - `SaleClosed` when already closed
    pub async fn close_sale(&self, ctx: &RequestContext, sale_id: i64) -> ServiceResult<()> {
        let mut tx = self.db.pool().begin().await.map_err(DbError::from)?;

        let sale = require_open_sale(&mut tx, sale_id).await?;
        let paid = sale_repo::sum_payments_on(&mut tx, sale_id).await?;
        if paid < sale.total() {
            return Err(CoreError::InsufficientPayment {
                sale_id,
                required_cents: sale.total_cents,
                paid_cents: paid.cents(),
            }
            .into());
        }

        sale_repo::close_sale_on(&mut tx, sale_id, Utc::now()).await?;
        // Income lands on each payment method's own account, not in one lump
        let grouped = sale_repo::payments_by_account_on(&mut tx, sale_id).await?;
        for (account_id, amount) in &grouped {
            sale_repo::insert_account_transaction_on(
                &mut tx,
                *account_id,
                Some(sale_id),
                *amount,
                TRANSACTION_ORIGIN_SALE,
                &ctx.user_id,
            )
            .await?;
        }
        audit::record_with(
            &mut tx,
            ctx,
            SALE_ENTITY,
            sale_id,
            AuditAction::SaleClose,
            &json!({
                "total": sale.total_cents,
                "paid": paid.cents(),
                "accounts": grouped.len(),
            }),
        )
        .await?;
        tx.commit().await.map_err(DbError::from)?;

        info!(sale_id = %sale_id, total = %sale.total(), paid = %paid, "Sale closed");
        Ok(())
    }

    /// Deletes a sale with its lines and payments, open or closed.
    /// Irreversible; the audit row keeps a snapshot of what was deleted.
    pub async fn delete_sale(&self, ctx: &RequestContext, sale_id: i64) -> ServiceResult<()> {
        let mut tx = self.db.pool().begin().await.map_err(DbError::from)?;

        let sale = sale_repo::find_sale_on(&mut tx, sale_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Sale", sale_id))?;
        let lines = sale_repo::lines_on(&mut tx, sale_id).await?;
        let payments = sale_repo::payments_on(&mut tx, sale_id).await?;

        sale_repo::delete_sale_on(&mut tx, sale_id).await?;
        audit::record_with(
            &mut tx,
            ctx,
            SALE_ENTITY,
            sale_id,
            AuditAction::SaleDelete,
            &json!({
                "total": sale.total_cents,
                "open": sale.open,
                "lines": lines.len(),
                "payments": payments.len(),
            }),
        )
        .await?;
        tx.commit().await.map_err(DbError::from)?;

        info!(sale_id = %sale_id, "Sale deleted");
        Ok(())
    }

    /// Reads the full sale aggregate.
    pub async fn get_sale(&self, sale_id: i64) -> ServiceResult<SaleDetail> {
        let sales = self.db.sales();
        let sale = sales
            .find_by_id(sale_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Sale", sale_id))?;
        let lines = sales.get_lines(sale_id).await?;
        let payments = sales.get_payments(sale_id).await?;

        Ok(SaleDetail {
            sale,
            lines,
            payments,
        })
    }
}

/// Loads a sale and enforces the open guard shared by every mutation.
async fn require_open_sale(
    conn: &mut sqlx::SqliteConnection,
    sale_id: i64,
) -> Result<Sale, ServiceError> {
    let sale = sale_repo::find_sale_on(conn, sale_id)
        .await?
        .ok_or_else(|| CoreError::not_found("Sale", sale_id))?;
    if !sale.open {
        return Err(CoreError::SaleClosed { sale_id }.into());
    }
    Ok(sale)
}

/// Recomputes and stores the sale total from the line rows visible inside
/// the caller's transaction.
async fn recompute_total_on(
    conn: &mut sqlx::SqliteConnection,
    sale: &Sale,
) -> Result<Money, ServiceError> {
    let sum = sale_repo::sum_line_subtotals_on(conn, sale.id).await?;
    let total = match sale.discount {
        Some(pct) => sum.apply_discount_percent(pct),
        None => sum,
    };
    sale_repo::set_total_on(conn, sale.id, total).await?;
    Ok(total)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use barkeep_db::repository::product::ProductInput;
    use barkeep_db::DbConfig;

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn ctx() -> RequestContext {
        RequestContext::new("u1")
    }

    async fn seed_product(db: &Database, name: &str, cents: i64) -> i64 {
        db.products()
            .insert(ProductInput {
                name: name.to_string(),
                price: Money::from_cents(cents),
                category_id: None,
                brand_id: None,
                provider_id: None,
            })
            .await
            .unwrap()
            .id
    }

    async fn seed_cash_method(db: &Database) -> i64 {
        let caja = db.accounts().find_system().await.unwrap().unwrap();
        db.payment_methods()
            .insert("Efectivo", caja.id)
            .await
            .unwrap()
            .id
    }

    fn counter_sale(employee_id: i64) -> CreateSale {
        CreateSale {
            bartable_id: None,
            employee_id: Some(employee_id),
        }
    }

    #[tokio::test]
    async fn test_create_sale_requires_a_slot() {
        let db = test_db().await;
        let service = SaleService::new(db);

        let err = service
            .create_sale(&ctx(), CreateSale::default())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Core(CoreError::Validation(ValidationError::Required { .. }))
        ));
    }

    #[tokio::test]
    async fn test_one_open_sale_per_bartable() {
        let db = test_db().await;
        let table = db.bartables().insert(7).await.unwrap();
        let service = SaleService::new(db);

        let req = CreateSale {
            bartable_id: Some(table.id),
            employee_id: None,
        };
        service.create_sale(&ctx(), req.clone()).await.unwrap();

        let err = service.create_sale(&ctx(), req).await.unwrap_err();
        assert!(
            matches!(&err, ServiceError::Core(CoreError::Conflict { code, .. }) if code == "SALE_ALREADY_OPEN")
        );
    }

    #[tokio::test]
    async fn test_one_open_counter_sale_per_employee() {
        let db = test_db().await;
        let employee = db.employees().insert("Marta").await.unwrap();
        let table = db.bartables().insert(1).await.unwrap();
        let service = SaleService::new(db);

        service
            .create_sale(&ctx(), counter_sale(employee.id))
            .await
            .unwrap();
        let err = service
            .create_sale(&ctx(), counter_sale(employee.id))
            .await
            .unwrap_err();
        assert!(
            matches!(&err, ServiceError::Core(CoreError::Conflict { code, .. }) if code == "SALE_ALREADY_OPEN")
        );

        // A table sale for the same employee is a different slot
        service
            .create_sale(
                &ctx(),
                CreateSale {
                    bartable_id: Some(table.id),
                    employee_id: Some(employee.id),
                },
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_inactive_bartable_is_not_found() {
        let db = test_db().await;
        let table = db.bartables().insert(2).await.unwrap();
        {
            let mut conn = db.pool().acquire().await.unwrap();
            catalog::set_active_on(&mut conn, EntityKind::Bartable, table.id, false)
                .await
                .unwrap();
        }

        let service = SaleService::new(db);
        let err = service
            .create_sale(
                &ctx(),
                CreateSale {
                    bartable_id: Some(table.id),
                    employee_id: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Core(CoreError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_line_upsert_keeps_total_invariant() {
        let db = test_db().await;
        let employee = db.employees().insert("Marta").await.unwrap();
        let cana = seed_product(&db, "Caña", 250).await;
        let tapa = seed_product(&db, "Tapa", 450).await;
        let service = SaleService::new(db.clone());

        let sale = service
            .create_sale(&ctx(), counter_sale(employee.id))
            .await
            .unwrap();

        let total = service
            .add_or_update_line(&ctx(), sale.id, cana, 2)
            .await
            .unwrap();
        assert_eq!(total, Money::from_cents(500));

        let total = service
            .add_or_update_line(&ctx(), sale.id, tapa, 1)
            .await
            .unwrap();
        assert_eq!(total, Money::from_cents(950));

        // Replacing a quantity re-snapshots, never stacks
        let total = service
            .add_or_update_line(&ctx(), sale.id, cana, 1)
            .await
            .unwrap();
        assert_eq!(total, Money::from_cents(700));

        let total = service.remove_line(&ctx(), sale.id, tapa).await.unwrap();
        assert_eq!(total, Money::from_cents(250));

        let detail = service.get_sale(sale.id).await.unwrap();
        assert_eq!(detail.sale.total_cents, 250);
        assert_eq!(detail.lines.len(), 1);
    }

    #[tokio::test]
    async fn test_discount_rounds_half_up() {
        let db = test_db().await;
        let employee = db.employees().insert("Marta").await.unwrap();
        let p = seed_product(&db, "Copa", 10101).await;
        let service = SaleService::new(db);

        let sale = service
            .create_sale(&ctx(), counter_sale(employee.id))
            .await
            .unwrap();
        service
            .add_or_update_line(&ctx(), sale.id, p, 1)
            .await
            .unwrap();

        // 10101 × 0.90 = 9090.9 → 9091
        let total = service
            .set_discount(&ctx(), sale.id, Some(10))
            .await
            .unwrap();
        assert_eq!(total, Money::from_cents(9091));

        let err = service
            .set_discount(&ctx(), sale.id, Some(101))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Core(CoreError::Validation(ValidationError::OutOfRange { .. }))
        ));
    }

    #[tokio::test]
    async fn test_price_change_leaves_snapshot_untouched() {
        let db = test_db().await;
        let employee = db.employees().insert("Marta").await.unwrap();
        let p = seed_product(&db, "Caña", 250).await;
        let service = SaleService::new(db.clone());

        let sale = service
            .create_sale(&ctx(), counter_sale(employee.id))
            .await
            .unwrap();
        service
            .add_or_update_line(&ctx(), sale.id, p, 2)
            .await
            .unwrap();

        db.products()
            .update(
                p,
                ProductInput {
                    name: "Caña".to_string(),
                    price: Money::from_cents(300),
                    category_id: None,
                    brand_id: None,
                    provider_id: None,
                },
            )
            .await
            .unwrap();

        let detail = service.get_sale(sale.id).await.unwrap();
        assert_eq!(detail.lines[0].subtotal_cents, 500);
        assert_eq!(detail.sale.total_cents, 500);
    }

    #[tokio::test]
    async fn test_close_requires_full_payment() {
        let db = test_db().await;
        let employee = db.employees().insert("Marta").await.unwrap();
        let p = seed_product(&db, "Menú", 1200).await;
        let method = seed_cash_method(&db).await;
        let service = SaleService::new(db.clone());

        let sale = service
            .create_sale(&ctx(), counter_sale(employee.id))
            .await
            .unwrap();
        service
            .add_or_update_line(&ctx(), sale.id, p, 1)
            .await
            .unwrap();
        service
            .apply_payment(&ctx(), sale.id, method, Money::from_cents(1000))
            .await
            .unwrap();

        let err = service.close_sale(&ctx(), sale.id).await.unwrap_err();
        let ServiceError::Core(CoreError::InsufficientPayment {
            required_cents,
            paid_cents,
            ..
        }) = err
        else {
            panic!("expected InsufficientPayment");
        };
        assert_eq!(required_cents, 1200);
        assert_eq!(paid_cents, 1000);
        assert!(db.sales().find_by_id(sale.id).await.unwrap().unwrap().open);

        // Top up and close; overpaying is allowed (change given in cash)
        service
            .apply_payment(&ctx(), sale.id, method, Money::from_cents(500))
            .await
            .unwrap();
        service.close_sale(&ctx(), sale.id).await.unwrap();

        let closed = db.sales().find_by_id(sale.id).await.unwrap().unwrap();
        assert!(!closed.open);
        assert!(closed.closed_at.is_some());

        // Closed is terminal for every mutation
        let err = service
            .add_or_update_line(&ctx(), sale.id, p, 1)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Core(CoreError::SaleClosed { .. })));
        let err = service.close_sale(&ctx(), sale.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::Core(CoreError::SaleClosed { .. })));
    }

    #[tokio::test]
    async fn test_close_books_income_per_account() {
        let db = test_db().await;
        let employee = db.employees().insert("Marta").await.unwrap();
        let p = seed_product(&db, "Menú", 3000).await;
        let caja = db.accounts().find_system().await.unwrap().unwrap();
        let banco = db.accounts().insert("Banco").await.unwrap();
        let cash = db.payment_methods().insert("Efectivo", caja.id).await.unwrap();
        let card = db.payment_methods().insert("Tarjeta", banco.id).await.unwrap();
        let service = SaleService::new(db.clone());

        let sale = service
            .create_sale(&ctx(), counter_sale(employee.id))
            .await
            .unwrap();
        service
            .add_or_update_line(&ctx(), sale.id, p, 1)
            .await
            .unwrap();
        service
            .apply_payment(&ctx(), sale.id, cash.id, Money::from_cents(1000))
            .await
            .unwrap();
        service
            .apply_payment(&ctx(), sale.id, card.id, Money::from_cents(2000))
            .await
            .unwrap();
        service.close_sale(&ctx(), sale.id).await.unwrap();

        let caja_txns = db.sales().get_account_transactions(caja.id).await.unwrap();
        assert_eq!(caja_txns.len(), 1);
        assert_eq!(caja_txns[0].amount_cents, 1000);
        assert_eq!(caja_txns[0].origin, TRANSACTION_ORIGIN_SALE);
        assert_eq!(caja_txns[0].sale_id, Some(sale.id));

        let banco_txns = db.sales().get_account_transactions(banco.id).await.unwrap();
        assert_eq!(banco_txns.len(), 1);
        assert_eq!(banco_txns[0].amount_cents, 2000);
    }

    #[tokio::test]
    async fn test_payment_validation_and_inactive_method() {
        let db = test_db().await;
        let employee = db.employees().insert("Marta").await.unwrap();
        let method = seed_cash_method(&db).await;
        let service = SaleService::new(db.clone());

        let sale = service
            .create_sale(&ctx(), counter_sale(employee.id))
            .await
            .unwrap();

        let err = service
            .apply_payment(&ctx(), sale.id, method, Money::zero())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Core(CoreError::Validation(ValidationError::MustBePositive { .. }))
        ));

        {
            let mut conn = db.pool().acquire().await.unwrap();
            catalog::set_active_on(&mut conn, EntityKind::PaymentMethod, method, false)
                .await
                .unwrap();
        }
        let err = service
            .apply_payment(&ctx(), sale.id, method, Money::from_cents(100))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Core(CoreError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_delete_sale_removes_children_and_audits_snapshot() {
        let db = test_db().await;
        let employee = db.employees().insert("Marta").await.unwrap();
        let p = seed_product(&db, "Caña", 250).await;
        let method = seed_cash_method(&db).await;
        let service = SaleService::new(db.clone());

        let sale = service
            .create_sale(&ctx(), counter_sale(employee.id))
            .await
            .unwrap();
        service
            .add_or_update_line(&ctx(), sale.id, p, 2)
            .await
            .unwrap();
        service
            .apply_payment(&ctx(), sale.id, method, Money::from_cents(500))
            .await
            .unwrap();

        service.delete_sale(&ctx(), sale.id).await.unwrap();

        assert!(db.sales().find_by_id(sale.id).await.unwrap().is_none());
        let err = service.get_sale(sale.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::Core(CoreError::NotFound { .. })));

        let trail = db.audit().list_for_entity(SALE_ENTITY, sale.id).await.unwrap();
        let delete_row = trail.last().unwrap();
        assert_eq!(delete_row.action, "SALE_DELETE");
        let payload: serde_json::Value =
            serde_json::from_str(delete_row.payload.as_deref().unwrap()).unwrap();
        assert_eq!(payload["total"], 500);
        assert_eq!(payload["lines"], 1);
        assert_eq!(payload["payments"], 1);
    }

    #[tokio::test]
    async fn test_every_mutation_leaves_one_audit_row() {
        let db = test_db().await;
        let employee = db.employees().insert("Marta").await.unwrap();
        let p = seed_product(&db, "Caña", 250).await;
        let method = seed_cash_method(&db).await;
        let service = SaleService::new(db.clone());

        let sale = service
            .create_sale(&ctx(), counter_sale(employee.id))
            .await
            .unwrap();
        service
            .add_or_update_line(&ctx(), sale.id, p, 1)
            .await
            .unwrap();
        service
            .apply_payment(&ctx(), sale.id, method, Money::from_cents(250))
            .await
            .unwrap();
        service.close_sale(&ctx(), sale.id).await.unwrap();

        let actions: Vec<String> = db
            .audit()
            .list_for_entity(SALE_ENTITY, sale.id)
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.action)
            .collect();
        assert_eq!(
            actions,
            vec!["SALE_OPEN", "SALE_LINE_UPSERT", "SALE_PAYMENT", "SALE_CLOSE"]
        );
    }
}
