//! # Repository Modules
//!
//! One repository per aggregate:
//!
//! - [`catalog`] - the seven soft-deletable catalog kinds (uniform contract
//!   via a kind→table mapping, bespoke repositories where columns differ)
//! - [`product`] - products and their nullable catalog references
//! - [`sale`] - sales, lines, payments and account transactions
//! - [`audit`] - the append-only audit log
//!
//! ## Transaction convention
//! Methods taking `&self` use the pool and are single-statement operations.
//! Associated functions named `*_on` take `&mut SqliteConnection` and are
//! meant to be composed inside one transaction owned by barkeep-service:
//! the caller begins the transaction, passes `&mut *tx` to each helper,
//! then commits. Partial application is therefore never observable.

pub mod audit;
pub mod catalog;
pub mod product;
pub mod sale;
