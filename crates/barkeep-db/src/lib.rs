//! # barkeep-db: Database Layer for Barkeep
//!
//! SQLite persistence for the bar back-office core.
//!
//! ## Responsibilities
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          barkeep-db                                     │
//! │                                                                         │
//! │  ✅ RESPONSIBILITIES                   ❌ NOT RESPONSIBLE FOR           │
//! │  ──────────────────────                ─────────────────────────        │
//! │  • Connection pool management          • Business rules (barkeep-core)  │
//! │  • SQL query execution                 • Conflict decisions             │
//! │  • Schema migrations + seed            • API formatting                 │
//! │  • Repository implementations          • Transactions spanning          │
//! │  • Tx-scoped write helpers               services (barkeep-service)     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Key Features
//! - Runtime sqlx query API with `FromRow` row mapping
//! - Embedded migrations (no runtime SQL files)
//! - Connection pooling with SqlitePool, WAL mode, foreign keys ON
//! - Every repository also exposes `*_on(conn, ...)` helpers taking a
//!   `&mut SqliteConnection` so barkeep-service can compose them into one
//!   transaction

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use repository::catalog::{
    AccountRepository, BartableRepository, CatalogRepository, ListOptions,
    PaymentMethodRepository, SortDirection, SortField,
};
pub use repository::product::ProductRepository;
pub use repository::sale::SaleRepository;
pub use repository::audit::AuditRepository;
