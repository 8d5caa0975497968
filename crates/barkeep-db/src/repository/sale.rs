//! # Sale Repository
//!
//! Database operations for the sale aggregate: sales, their lines and
//! payments, plus the account transactions booked when a sale closes.
//!
//! ## Aggregate Writes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │            One transaction per state-changing operation                 │
//! │                                                                         │
//! │  upsert line ──┐                                                        │
//! │  remove line ──┼──► recompute total ──► audit row ──► COMMIT            │
//! │  set discount ─┘                                                        │
//! │                                                                         │
//! │  close ──► sum payments ──► group by account ──► book transactions      │
//! │        ──► flip open=0 ──► audit row ──► COMMIT                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The orchestration lives in barkeep-service; this module supplies the
//! `*_on` building blocks plus plain pool reads.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use barkeep_core::{AccountTransaction, Money, Sale, SaleLine, SalePayment};

const SALE_COLUMNS: &str = "id, created_by, total_cents, bartable_id, employee_id, open, \
     discount, created_at, updated_at, closed_at";

const LINE_COLUMNS: &str = "id, sale_id, product_id, quantity, subtotal_cents, created_at";

const PAYMENT_COLUMNS: &str =
    "id, sale_id, payment_method_id, amount_cents, created_by, created_at";

#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    pub async fn find_by_id(&self, id: i64) -> DbResult<Option<Sale>> {
        let mut conn = self.pool.acquire().await?;
        find_sale_on(&mut conn, id).await
    }

    /// Lists open sales, oldest first.
    pub async fn get_open(&self) -> DbResult<Vec<Sale>> {
        let sales = sqlx::query_as::<_, Sale>(&format!(
            "SELECT {} FROM sales WHERE open = 1 ORDER BY created_at ASC",
            SALE_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(sales)
    }

    pub async fn get_lines(&self, sale_id: i64) -> DbResult<Vec<SaleLine>> {
        let mut conn = self.pool.acquire().await?;
        lines_on(&mut conn, sale_id).await
    }

    pub async fn get_payments(&self, sale_id: i64) -> DbResult<Vec<SalePayment>> {
        let mut conn = self.pool.acquire().await?;
        payments_on(&mut conn, sale_id).await
    }

    /// Lists account transactions booked against an account, newest first.
    pub async fn get_account_transactions(
        &self,
        account_id: i64,
    ) -> DbResult<Vec<AccountTransaction>> {
        let txns = sqlx::query_as::<_, AccountTransaction>(
            "SELECT id, account_id, sale_id, amount_cents, origin, created_by, created_at \
             FROM account_transactions WHERE account_id = ?1 ORDER BY created_at DESC, id DESC",
        )
        .bind(account_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(txns)
    }
}

// =============================================================================
// Sale Rows
// =============================================================================

/// Gets a sale by id on the caller's connection.
pub async fn find_sale_on(conn: &mut SqliteConnection, id: i64) -> DbResult<Option<Sale>> {
    let sale = sqlx::query_as::<_, Sale>(&format!(
        "SELECT {} FROM sales WHERE id = ?1",
        SALE_COLUMNS
    ))
    .bind(id)
    .fetch_optional(conn)
    .await?;

    Ok(sale)
}

/// Inserts a new open sale with zero total and no discount.
pub async fn insert_sale_on(
    conn: &mut SqliteConnection,
    created_by: &str,
    bartable_id: Option<i64>,
    employee_id: Option<i64>,
) -> DbResult<Sale> {
    debug!(created_by = %created_by, ?bartable_id, ?employee_id, "Opening sale");

    let now = Utc::now();
    let result = sqlx::query(
        "INSERT INTO sales (created_by, total_cents, bartable_id, employee_id, open, discount, created_at, updated_at) \
         VALUES (?1, 0, ?2, ?3, 1, NULL, ?4, ?4)",
    )
    .bind(created_by)
    .bind(bartable_id)
    .bind(employee_id)
    .bind(now)
    .execute(conn)
    .await?;

    Ok(Sale {
        id: result.last_insert_rowid(),
        created_by: created_by.to_string(),
        total_cents: 0,
        bartable_id,
        employee_id,
        open: true,
        discount: None,
        created_at: now,
        updated_at: now,
        closed_at: None,
    })
}

/// Counts open sales parked on a bartable.
///
/// Feeds the one-open-sale-per-table check and the `BARTABLE_IN_USE`
/// conflict rule.
pub async fn count_open_by_bartable_on(
    conn: &mut SqliteConnection,
    bartable_id: i64,
) -> DbResult<i64> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM sales WHERE bartable_id = ?1 AND open = 1")
            .bind(bartable_id)
            .fetch_one(conn)
            .await?;

    Ok(count)
}

/// Counts open counter-mode sales attributed to an employee.
pub async fn count_open_counter_by_employee_on(
    conn: &mut SqliteConnection,
    employee_id: i64,
) -> DbResult<i64> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM sales \
         WHERE employee_id = ?1 AND bartable_id IS NULL AND open = 1",
    )
    .bind(employee_id)
    .fetch_one(conn)
    .await?;

    Ok(count)
}

/// Counts open sales touching an employee in either mode (table sales the
/// employee serves, or counter sales attributed to them).
///
/// Feeds the `EMPLOYEE_IN_USE` conflict rule.
pub async fn count_open_by_employee_on(
    conn: &mut SqliteConnection,
    employee_id: i64,
) -> DbResult<i64> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM sales WHERE employee_id = ?1 AND open = 1")
            .bind(employee_id)
            .fetch_one(conn)
            .await?;

    Ok(count)
}

/// Stores the recomputed total.
pub async fn set_total_on(conn: &mut SqliteConnection, sale_id: i64, total: Money) -> DbResult<()> {
    let now = Utc::now();
    let result = sqlx::query("UPDATE sales SET total_cents = ?2, updated_at = ?3 WHERE id = ?1")
        .bind(sale_id)
        .bind(total.cents())
        .bind(now)
        .execute(conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Sale", sale_id));
    }

    Ok(())
}

/// Stores the discount percentage (`None` removes it).
pub async fn set_discount_on(
    conn: &mut SqliteConnection,
    sale_id: i64,
    discount: Option<i64>,
) -> DbResult<()> {
    let now = Utc::now();
    let result = sqlx::query("UPDATE sales SET discount = ?2, updated_at = ?3 WHERE id = ?1")
        .bind(sale_id)
        .bind(discount)
        .bind(now)
        .execute(conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Sale", sale_id));
    }

    Ok(())
}

/// Marks the sale closed. Closed is terminal.
pub async fn close_sale_on(
    conn: &mut SqliteConnection,
    sale_id: i64,
    closed_at: DateTime<Utc>,
) -> DbResult<()> {
    debug!(sale_id = %sale_id, "Closing sale");

    let result = sqlx::query(
        "UPDATE sales SET open = 0, closed_at = ?2, updated_at = ?2 WHERE id = ?1 AND open = 1",
    )
    .bind(sale_id)
    .bind(closed_at)
    .execute(conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Sale", sale_id));
    }

    Ok(())
}

/// Hard-deletes a sale with its lines and payments. The deletes are
/// explicit (`ON DELETE CASCADE` stays as schema backstop); account
/// transactions keep their amount with `sale_id` nulled.
pub async fn delete_sale_on(conn: &mut SqliteConnection, sale_id: i64) -> DbResult<()> {
    debug!(sale_id = %sale_id, "Deleting sale");

    sqlx::query("DELETE FROM sale_lines WHERE sale_id = ?1")
        .bind(sale_id)
        .execute(&mut *conn)
        .await?;
    sqlx::query("DELETE FROM sale_payments WHERE sale_id = ?1")
        .bind(sale_id)
        .execute(&mut *conn)
        .await?;
    let result = sqlx::query("DELETE FROM sales WHERE id = ?1")
        .bind(sale_id)
        .execute(conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Sale", sale_id));
    }

    Ok(())
}

// =============================================================================
// Sale Lines
// =============================================================================

/// Lists a sale's lines in insertion order.
pub async fn lines_on(conn: &mut SqliteConnection, sale_id: i64) -> DbResult<Vec<SaleLine>> {
    let lines = sqlx::query_as::<_, SaleLine>(&format!(
        "SELECT {} FROM sale_lines WHERE sale_id = ?1 ORDER BY id ASC",
        LINE_COLUMNS
    ))
    .bind(sale_id)
    .fetch_all(conn)
    .await?;

    Ok(lines)
}

/// Inserts or replaces the line for `(sale_id, product_id)`.
///
/// A sale holds at most one line per product; re-adding a product replaces
/// its quantity and snapshot subtotal rather than stacking a second line.
pub async fn upsert_line_on(
    conn: &mut SqliteConnection,
    sale_id: i64,
    product_id: i64,
    quantity: i64,
    subtotal: Money,
) -> DbResult<()> {
    debug!(sale_id = %sale_id, product_id = %product_id, quantity = %quantity, "Upserting sale line");

    let now = Utc::now();
    sqlx::query(
        "INSERT INTO sale_lines (sale_id, product_id, quantity, subtotal_cents, created_at) \
         VALUES (?1, ?2, ?3, ?4, ?5) \
         ON CONFLICT(sale_id, product_id) \
         DO UPDATE SET quantity = excluded.quantity, subtotal_cents = excluded.subtotal_cents",
    )
    .bind(sale_id)
    .bind(product_id)
    .bind(quantity)
    .bind(subtotal.cents())
    .bind(now)
    .execute(conn)
    .await?;

    Ok(())
}

/// Removes the line for `(sale_id, product_id)`.
///
/// `DbError::NotFound` when the sale has no line for that product.
pub async fn remove_line_on(
    conn: &mut SqliteConnection,
    sale_id: i64,
    product_id: i64,
) -> DbResult<()> {
    let result = sqlx::query("DELETE FROM sale_lines WHERE sale_id = ?1 AND product_id = ?2")
        .bind(sale_id)
        .bind(product_id)
        .execute(conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("SaleLine", product_id));
    }

    Ok(())
}

/// Sums the line subtotals of a sale (0 for an empty sale).
pub async fn sum_line_subtotals_on(conn: &mut SqliteConnection, sale_id: i64) -> DbResult<Money> {
    let cents: i64 = sqlx::query_scalar(
        "SELECT COALESCE(SUM(subtotal_cents), 0) FROM sale_lines WHERE sale_id = ?1",
    )
    .bind(sale_id)
    .fetch_one(conn)
    .await?;

    Ok(Money::from_cents(cents))
}

// =============================================================================
// Sale Payments
// =============================================================================

/// Lists a sale's payments in insertion order.
pub async fn payments_on(conn: &mut SqliteConnection, sale_id: i64) -> DbResult<Vec<SalePayment>> {
    let payments = sqlx::query_as::<_, SalePayment>(&format!(
        "SELECT {} FROM sale_payments WHERE sale_id = ?1 ORDER BY id ASC",
        PAYMENT_COLUMNS
    ))
    .bind(sale_id)
    .fetch_all(conn)
    .await?;

    Ok(payments)
}

/// Records a payment towards a sale.
pub async fn insert_payment_on(
    conn: &mut SqliteConnection,
    sale_id: i64,
    payment_method_id: i64,
    amount: Money,
    created_by: &str,
) -> DbResult<SalePayment> {
    debug!(sale_id = %sale_id, payment_method_id = %payment_method_id, amount = %amount, "Recording payment");

    let now = Utc::now();
    let result = sqlx::query(
        "INSERT INTO sale_payments (sale_id, payment_method_id, amount_cents, created_by, created_at) \
         VALUES (?1, ?2, ?3, ?4, ?5)",
    )
    .bind(sale_id)
    .bind(payment_method_id)
    .bind(amount.cents())
    .bind(created_by)
    .bind(now)
    .execute(conn)
    .await?;

    Ok(SalePayment {
        id: result.last_insert_rowid(),
        sale_id,
        payment_method_id,
        amount_cents: amount.cents(),
        created_by: created_by.to_string(),
        created_at: now,
    })
}

/// Sums the payments applied to a sale (0 when none).
pub async fn sum_payments_on(conn: &mut SqliteConnection, sale_id: i64) -> DbResult<Money> {
    let cents: i64 = sqlx::query_scalar(
        "SELECT COALESCE(SUM(amount_cents), 0) FROM sale_payments WHERE sale_id = ?1",
    )
    .bind(sale_id)
    .fetch_one(conn)
    .await?;

    Ok(Money::from_cents(cents))
}

/// Sums a sale's payments per owning account, joining through the payment
/// method. One row per distinct account, ready to book as income.
pub async fn payments_by_account_on(
    conn: &mut SqliteConnection,
    sale_id: i64,
) -> DbResult<Vec<(i64, Money)>> {
    let rows = sqlx::query_as::<_, (i64, i64)>(
        "SELECT pm.account_id, SUM(sp.amount_cents) \
         FROM sale_payments sp \
         JOIN payment_methods pm ON pm.id = sp.payment_method_id \
         WHERE sp.sale_id = ?1 \
         GROUP BY pm.account_id \
         ORDER BY pm.account_id ASC",
    )
    .bind(sale_id)
    .fetch_all(conn)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(account_id, cents)| (account_id, Money::from_cents(cents)))
        .collect())
}

// =============================================================================
// Account Transactions
// =============================================================================

/// Books an income row against an account.
pub async fn insert_account_transaction_on(
    conn: &mut SqliteConnection,
    account_id: i64,
    sale_id: Option<i64>,
    amount: Money,
    origin: &str,
    created_by: &str,
) -> DbResult<i64> {
    debug!(account_id = %account_id, ?sale_id, amount = %amount, origin = %origin, "Booking account transaction");

    let now = Utc::now();
    let result = sqlx::query(
        "INSERT INTO account_transactions (account_id, sale_id, amount_cents, origin, created_by, created_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    )
    .bind(account_id)
    .bind(sale_id)
    .bind(amount.cents())
    .bind(origin)
    .bind(created_by)
    .bind(now)
    .execute(conn)
    .await?;

    Ok(result.last_insert_rowid())
}

// =============================================================================
// Unit Tests
// =============================================================================
