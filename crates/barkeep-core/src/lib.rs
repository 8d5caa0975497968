//! # barkeep-core: Pure Business Logic for Barkeep
//!
//! This crate is the **heart** of the bar back-office core. It contains all
//! business rules as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Barkeep Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              HTTP Layer (external collaborator)                 │   │
//! │  │    request parsing ──► role guard ──► controller               │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    barkeep-service                              │   │
//! │  │    SaleService, LifecycleService, ConflictDetector, Audit      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ barkeep-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │ lifecycle │  │ normalize │  │   │
//! │  │   │  Sale     │  │   Money   │  │ EntityKind│  │  keys     │  │   │
//! │  │   │  Product  │  │ discount  │  │ Conflict  │  │           │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    barkeep-db (Database Layer)                  │   │
//! │  │              SQLite queries, migrations, repositories           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Sale, SaleLine, Product, catalog entities)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`normalize`] - Accent/case-insensitive key derivation
//! - [`lifecycle`] - Entity kinds, deactivation rules, conflict reports
//! - [`error`] - Domain error types
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - same input = same output
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: All monetary values are in cents (i64) to avoid float errors
//! 4. **Explicit Errors**: All errors are typed, never strings or panics

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod lifecycle;
pub mod money;
pub mod normalize;
pub mod types;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use barkeep_core::Money` instead of
// `use barkeep_core::money::Money`

pub use error::{CoreError, CoreResult, ValidationError};
pub use lifecycle::{ConflictReport, EntityKind, Strategy};
pub use money::Money;
pub use normalize::normalize;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum quantity of a single product on one sale line.
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g., typing 1000 instead of 10).
pub const MAX_LINE_QUANTITY: i64 = 999;

/// Name of the system cash account seeded at bootstrap.
///
/// Exactly one account carries `is_system = true`. It is created by the
/// initial migration and refused by the normal deactivation flow.
pub const SYSTEM_ACCOUNT_NAME: &str = "Caja";
