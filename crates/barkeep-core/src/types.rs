//! # Domain Types
//!
//! Core domain types used throughout Barkeep.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  Catalog (soft-deletable, unique normalized name)                       │
//! │    CatalogEntity  Brand / Category / Provider / Employee                │
//! │    Account        + is_system flag                                      │
//! │    PaymentMethod  + account_id (required FK)                            │
//! │    Bartable       identified by number, not name                        │
//! │    Product        + price, nullable brand/category/provider refs        │
//! │                                                                         │
//! │  Sale aggregate (Sale exclusively owns its children)                    │
//! │    Sale ──┬── SaleLine     (price snapshot × quantity)                  │
//! │           └── SalePayment  (split tender across methods)                │
//! │                                                                         │
//! │  Bookkeeping                                                            │
//! │    AccountTransaction  income rows booked on close                      │
//! │    AuditEntry          append-only action trail                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! All ids are database-generated `i64`. All money is integer cents.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;

// =============================================================================
// Catalog Entities
// =============================================================================

/// Shared shape for name-keyed catalog entities: Brand, Category, Provider
/// and Employee all persist exactly these columns.
///
/// `normalized_name` is derived via [`crate::normalize`] and carries the
/// unique index that makes duplicate checks accent/case-insensitive.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct CatalogEntity {
    pub id: i64,
    pub name: String,
    pub normalized_name: String,
    /// Soft-delete flag; never hard-deleted.
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A payment account (cash drawer, bank account, ...).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Account {
    pub id: i64,
    pub name: String,
    pub normalized_name: String,
    /// Exactly one account is the system default ("Caja"), seeded at
    /// bootstrap and refused by the normal deactivation flow.
    pub is_system: bool,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A configured way of paying (cash, card terminal, voucher, ...).
/// Belongs to exactly one [`Account`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct PaymentMethod {
    pub id: i64,
    pub name: String,
    pub normalized_name: String,
    /// Required owning account; income from this method is booked here.
    pub account_id: i64,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A physical table/order slot that a sale can be opened against.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Bartable {
    pub id: i64,
    /// Table number, unique on the floor.
    pub number: i64,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A product available for sale.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub normalized_name: String,
    /// Price in cents. Snapshotted into sale lines at insertion time.
    pub price_cents: i64,
    pub category_id: Option<i64>,
    pub brand_id: Option<i64>,
    pub provider_id: Option<i64>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }
}

// =============================================================================
// Sale Aggregate
// =============================================================================

/// A sale: the aggregate root of the order workflow.
///
/// State machine: **open → (mutate lines / apply payments)\* → closed**.
/// Closed is terminal; there is no transition back to open.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Sale {
    pub id: i64,
    /// User id of whoever opened the sale (from the request context).
    pub created_by: String,
    /// Always equals `sale_total(line subtotals, discount)`; recomputed
    /// inside the same transaction as every line mutation.
    pub total_cents: i64,
    pub bartable_id: Option<i64>,
    pub employee_id: Option<i64>,
    pub open: bool,
    /// Optional whole-percent discount (0..=100).
    pub discount: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
}

impl Sale {
    /// Returns the total as Money.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }

    /// Whether the sale was opened without a table (counter mode).
    #[inline]
    pub fn is_counter(&self) -> bool {
        self.bartable_id.is_none()
    }
}

/// A line item on a sale.
///
/// Uses the snapshot pattern: `subtotal_cents` is quantity × price at the
/// time of insertion and is never recomputed when the product price changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SaleLine {
    pub id: i64,
    pub sale_id: i64,
    pub product_id: i64,
    pub quantity: i64,
    pub subtotal_cents: i64,
    pub created_at: DateTime<Utc>,
}

impl SaleLine {
    /// Returns the subtotal as Money.
    #[inline]
    pub fn subtotal(&self) -> Money {
        Money::from_cents(self.subtotal_cents)
    }
}

/// A payment towards a sale.
/// A sale can have multiple payments for split tender scenarios.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SalePayment {
    pub id: i64,
    pub sale_id: i64,
    pub payment_method_id: i64,
    pub amount_cents: i64,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

impl SalePayment {
    /// Returns the payment amount as Money.
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }
}

// =============================================================================
// Bookkeeping
// =============================================================================

/// Origin tag for account transactions.
pub const TRANSACTION_ORIGIN_SALE: &str = "sale";

/// An income/expense row against an account.
///
/// Closing a sale books one income row per distinct payment-method account,
/// distributing amounts per method rather than lumping into one account.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct AccountTransaction {
    pub id: i64,
    pub account_id: i64,
    pub sale_id: Option<i64>,
    pub amount_cents: i64,
    /// Where the money came from; `"sale"` for close-sale bookings.
    pub origin: String,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

/// One append-only audit row. Never mutated or deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct AuditEntry {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub user_id: String,
    /// Entity tag: an [`crate::EntityKind`] string, `"product"` or `"sale"`.
    pub entity: String,
    pub entity_id: i64,
    pub action: String,
    /// Optional JSON payload with operation details.
    pub payload: Option<String>,
}

/// Every state-changing action the audit trail records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    Create,
    Update,
    Deactivate,
    Reactivate,
    SwapReactivate,
    SaleOpen,
    SaleLineUpsert,
    SaleLineRemove,
    SaleDiscount,
    SalePayment,
    SaleClose,
    SaleDelete,
}

impl AuditAction {
    /// Stable tag stored in the `action` column.
    pub const fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Create => "CREATE",
            AuditAction::Update => "UPDATE",
            AuditAction::Deactivate => "DEACTIVATE",
            AuditAction::Reactivate => "REACTIVATE",
            AuditAction::SwapReactivate => "SWAP_REACTIVATE",
            AuditAction::SaleOpen => "SALE_OPEN",
            AuditAction::SaleLineUpsert => "SALE_LINE_UPSERT",
            AuditAction::SaleLineRemove => "SALE_LINE_REMOVE",
            AuditAction::SaleDiscount => "SALE_DISCOUNT",
            AuditAction::SalePayment => "SALE_PAYMENT",
            AuditAction::SaleClose => "SALE_CLOSE",
            AuditAction::SaleDelete => "SALE_DELETE",
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sale_counter_mode() {
        let sale = Sale {
            id: 1,
            created_by: "u1".to_string(),
            total_cents: 0,
            bartable_id: None,
            employee_id: Some(4),
            open: true,
            discount: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            closed_at: None,
        };
        assert!(sale.is_counter());
    }

    #[test]
    fn test_audit_action_tags() {
        assert_eq!(AuditAction::Deactivate.as_str(), "DEACTIVATE");
        assert_eq!(AuditAction::SwapReactivate.as_str(), "SWAP_REACTIVATE");
        // serde representation matches the stored tag
        let json = serde_json::to_string(&AuditAction::SaleLineUpsert).unwrap();
        assert_eq!(json, "\"SALE_LINE_UPSERT\"");
    }
}
