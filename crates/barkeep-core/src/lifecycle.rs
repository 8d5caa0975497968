//! # Entity Lifecycle Rules
//!
//! The declarative side of the soft-delete-with-conflict-resolution
//! protocol: which dependents block a deactivation, which can be resolved,
//! and with which strategies.
//!
//! ## How Deactivation Decisions Are Made
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                 Deactivation Decision Flow                              │
//! │                                                                         │
//! │  deactivate(kind, id)                                                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  kind.rules() ← the static table in THIS module                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  For each rule (blocking rules first):                                 │
//! │       count dependents via the repositories                            │
//! │       │                                                                 │
//! │       ├── count == 0 for all rules → deactivate directly               │
//! │       │                                                                 │
//! │       ├── blocking rule fired → ConflictReport, NO strategies,         │
//! │       │   resolvable conflicts are ignored (tie-break rule)            │
//! │       │                                                                 │
//! │       └── resolvable rule fired → ConflictReport with the rule's       │
//! │           strategy set; caller re-invokes with a chosen strategy       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Keeping the rules as data (instead of per-entity bespoke branches) means
//! the detector and orchestrator are written once and every entity kind is
//! a table row here.

use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Entity Kind
// =============================================================================

/// Every entity kind that participates in the deactivation protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Brand,
    Category,
    Provider,
    Account,
    Bartable,
    Employee,
    PaymentMethod,
}

impl EntityKind {
    /// All kinds, for iteration in tests and diagnostics.
    pub const ALL: [EntityKind; 7] = [
        EntityKind::Brand,
        EntityKind::Category,
        EntityKind::Provider,
        EntityKind::Account,
        EntityKind::Bartable,
        EntityKind::Employee,
        EntityKind::PaymentMethod,
    ];

    /// Stable tag used in audit rows and API bodies.
    pub const fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Brand => "brand",
            EntityKind::Category => "category",
            EntityKind::Provider => "provider",
            EntityKind::Account => "account",
            EntityKind::Bartable => "bartable",
            EntityKind::Employee => "employee",
            EntityKind::PaymentMethod => "payment_method",
        }
    }

    /// Human-facing entity name for error messages.
    pub const fn display_name(&self) -> &'static str {
        match self {
            EntityKind::Brand => "Brand",
            EntityKind::Category => "Category",
            EntityKind::Provider => "Provider",
            EntityKind::Account => "Account",
            EntityKind::Bartable => "Bartable",
            EntityKind::Employee => "Employee",
            EntityKind::PaymentMethod => "Payment method",
        }
    }

    /// Deactivation rules for this kind, blocking rules first.
    ///
    /// The ordering is load-bearing: the conflict detector walks the slice
    /// in order and the first rule whose dependent count is non-zero wins,
    /// which implements the block-takes-precedence tie-break.
    pub const fn rules(&self) -> &'static [DependencyRule] {
        match self {
            EntityKind::Brand => &[DependencyRule {
                code: "BRAND_IN_USE",
                dependent: Dependent::ActiveProducts,
                blocking: false,
                strategies: &[Strategy::ClearReferences, Strategy::CascadeDependents],
            }],
            EntityKind::Category => &[DependencyRule {
                code: "CATEGORY_IN_USE",
                dependent: Dependent::ActiveProducts,
                blocking: false,
                strategies: &[Strategy::ClearReferences, Strategy::CascadeDependents],
            }],
            EntityKind::Provider => &[DependencyRule {
                code: "PROVIDER_IN_USE",
                dependent: Dependent::ActiveProducts,
                blocking: false,
                strategies: &[Strategy::ClearReferences, Strategy::CascadeDependents],
            }],
            EntityKind::Account => &[
                DependencyRule {
                    code: "SYSTEM_ACCOUNT",
                    dependent: Dependent::SystemFlag,
                    blocking: true,
                    strategies: &[],
                },
                DependencyRule {
                    code: "ACCOUNT_IN_USE",
                    dependent: Dependent::ActivePaymentMethods,
                    blocking: false,
                    strategies: &[Strategy::CascadePayments],
                },
            ],
            EntityKind::Bartable => &[DependencyRule {
                code: "BARTABLE_IN_USE",
                dependent: Dependent::OpenSales,
                blocking: true,
                strategies: &[],
            }],
            EntityKind::Employee => &[DependencyRule {
                code: "EMPLOYEE_IN_USE",
                dependent: Dependent::OpenSales,
                blocking: true,
                strategies: &[],
            }],
            // Historical payments reference a method but never dangle;
            // deactivation only blocks future use.
            EntityKind::PaymentMethod => &[],
        }
    }

    /// Whether this kind declares the one-active-slot invariant that the
    /// swap-reactivate operation exists to preserve.
    ///
    /// Declared per kind rather than inferred: an account is a drawer
    /// position and a bartable is a floor slot, so swapping which record
    /// is active makes sense; the other kinds simply reactivate.
    pub const fn supports_swap(&self) -> bool {
        matches!(self, EntityKind::Account | EntityKind::Bartable)
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Dependents & Strategies
// =============================================================================

/// What gets counted when probing a deactivation.
///
/// The db layer maps each variant to a concrete counting query; this crate
/// only names the dependency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dependent {
    /// Active products whose nullable reference points at the target.
    ActiveProducts,
    /// Active payment methods belonging to the target account.
    ActivePaymentMethods,
    /// Open sales opened against the target bartable/employee.
    OpenSales,
    /// The account-level `is_system` flag (count is 0 or 1).
    SystemFlag,
}

/// A resolution strategy the caller may pick when a deactivation conflicts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    /// Null out the dependents' reference to the target (products keep
    /// selling, just without a brand/category/provider).
    ClearReferences,
    /// Deactivate the dependents along with the target.
    CascadeDependents,
    /// Deactivate the account's payment methods along with the account.
    CascadePayments,
}

impl Strategy {
    /// Wire name, matching the serde kebab-case representation.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Strategy::ClearReferences => "clear-references",
            Strategy::CascadeDependents => "cascade-dependents",
            Strategy::CascadePayments => "cascade-payments",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the per-kind rule table.
#[derive(Debug, Clone, Copy)]
pub struct DependencyRule {
    /// Machine-readable conflict code (e.g. `BRAND_IN_USE`).
    pub code: &'static str,
    /// The dependents to count.
    pub dependent: Dependent,
    /// Blocking conflicts refuse the deactivation outright.
    pub blocking: bool,
    /// Strategies the caller may pick; empty when blocking.
    pub strategies: &'static [Strategy],
}

// =============================================================================
// Conflict Report
// =============================================================================

/// Structured description of why a deactivation cannot proceed directly.
///
/// Returned to the caller *instead of* mutating anything, so the UI can
/// render a resolution choice. Serialized into 409 response bodies.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictReport {
    /// Machine-readable code (e.g. `BRAND_IN_USE`, `BARTABLE_IN_USE`).
    pub code: String,
    /// Number of dependents found.
    pub count: i64,
    /// Strategies the caller may re-invoke with; empty for hard blocks.
    pub strategies: Vec<Strategy>,
    /// Hard blocks cannot be resolved; the deactivation is refused.
    pub blocking: bool,
}

impl ConflictReport {
    /// Builds a report from a fired rule and its dependent count.
    pub fn from_rule(rule: &DependencyRule, count: i64) -> Self {
        ConflictReport {
            code: rule.code.to_string(),
            count,
            strategies: rule.strategies.to_vec(),
            blocking: rule.blocking,
        }
    }

    /// Whether the given strategy is among the resolvable set.
    pub fn allows(&self, strategy: Strategy) -> bool {
        !self.blocking && self.strategies.contains(&strategy)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
