//! Core business logic module
//!
//! This module contains the settlement components, leaf to root:
//! - `registry` - Name to id bijection
//! - `debt_ledger` - Pairwise net debt keyed by canonical edges
//! - `traits` - Overlap query abstraction shared by the split engine and gap filler
//! - `interval_store` - Present and resident interval storage and indexing
//! - `split` - Sweep-line decomposition into constant-owner sub-intervals
//! - `gap_fill` - Residency fallback over uncovered parts of a billing window
//! - `engine` - Operation dispatch and proration

pub mod debt_ledger;
pub mod engine;
pub mod gap_fill;
pub mod interval_store;
pub mod registry;
pub mod split;
pub mod traits;

pub use debt_ledger::{DebtLedger, Edge};
pub use engine::{BillingConfig, BillingEngine, LedgerState};
pub use interval_store::IntervalStore;
pub use registry::IdentityRegistry;
pub use traits::IntervalQuery;
