//! Rust Settlement Engine Library
//! # Overview
//!
//! This library replays an append-only log of shared-living operations
//! (moving in and out, absences, direct transfers, period bills and one-off
//! purchases) and computes who owes whom, with a sync and an async reading
//! strategy.
//!
//! # Architecture
//!
//! The system is organized into several key components:
//!
//! - [`types`] - Core data types (Timestamp, Interval, OperationRecord, etc.)
//! - [`cli`] - CLI arguments parsing
//! - [`core`] - Business logic components:
//!   - [`core::registry`] - Name to participant id bijection
//!   - [`core::debt_ledger`] - Pairwise net debt
//!   - [`core::interval_store`] - Present and resident interval storage
//!   - [`core::split`] - Sweep-line split of overlapping intervals
//!   - [`core::gap_fill`] - Residency fallback for uncovered bill spans
//!   - [`core::engine`] - Operation dispatch and proration
//! - [`io`] - Log parsing, chronological insertion and report output
//! - [`strategy`] - Complete replay pipelines
//!
//! # Operations
//!
//! - **START**: Move in; the participant becomes present and resident
//! - **STOP**: Move out; closes both intervals
//! - **PAUSE** / **RESUME**: Leave and come back while staying resident
//! - **TRANSFER**: Direct payment between two participants
//! - **PAY**: Period bill split by presence, falling back to residency
//! - **BUY**: One-off purchase split among the residents at that instant
//!
//! # Amounts
//!
//! All money is held as integer cents. Per-participant charges are rounded
//! down and carry a small payer tip, so a payer never ends up short.

// Module declarations
pub mod cli;
pub mod core;
pub mod io;
pub mod strategy;
pub mod types;

pub use core::{BillingConfig, BillingEngine, DebtLedger, IdentityRegistry, IntervalStore, LedgerState};
pub use io::{insert_operation, write_ledger_csv, write_ledger_text, write_presence};
pub use types::{
    Cents, Debt, Interval, IntervalKind, OpCode, OperationRecord, ParticipantId, PresenceEntry,
    SettlementError, Split, Timestamp,
};
