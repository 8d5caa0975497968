//! # barkeep-service: Orchestration Layer for Barkeep
//!
//! Composes the pure rules in `barkeep-core` with the repositories in
//! `barkeep-db` into the operations an HTTP layer calls.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       barkeep-service                                   │
//! │                                                                         │
//! │   ┌──────────────┐   ┌──────────────────┐   ┌───────────────────────┐  │
//! │   │  SaleService │   │ LifecycleService │   │   ConflictDetector    │  │
//! │   │  open/lines/ │   │  deactivate /    │◄──│  rule tables (core)   │  │
//! │   │  pay/close   │   │  reactivate/swap │   │  + counting queries   │  │
//! │   └──────┬───────┘   └────────┬─────────┘   └───────────────────────┘  │
//! │          │                    │                                         │
//! │          └────────┬───────────┘                                         │
//! │                   ▼                                                     │
//! │        one sqlx transaction per operation                               │
//! │        (writes + total recompute + audit row)                           │
//! │                   │                                                     │
//! │                   ▼                                                     │
//! │             barkeep-db repositories                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every state-changing call takes a [`RequestContext`] naming the user;
//! failures map to status-coded [`ApiError`]s at the boundary.

pub mod api;
pub mod audit;
pub mod conflict;
pub mod context;
pub mod error;
pub mod lifecycle;
pub mod sale;

pub use api::{ApiError, ErrorKind};
pub use conflict::ConflictDetector;
pub use context::RequestContext;
pub use error::{ServiceError, ServiceResult};
pub use lifecycle::{DeactivationOutcome, LifecycleService};
pub use sale::{CreateSale, SaleDetail, SaleService};
