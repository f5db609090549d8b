//! Debt ledger module
//!
//! This module provides the `DebtLedger` struct which maintains the net debt
//! between every pair of participants.
//!
//! The DebtLedger is responsible for:
//! - Canonicalizing each unordered pair `{a, b}` as `(low, high)`
//! - Storing one signed value per pair: positive means `high` owes `low`,
//!   negative means `low` owes `high`
//! - Accumulating deltas with checked arithmetic
//! - Providing ordered edge listings for output
//!
//! Because every read and write goes through the same canonicalization,
//! `debt(x, y) == -debt(y, x)` holds for every pair at all times.

use crate::types::{Cents, ParticipantId, SettlementError};
use std::collections::BTreeMap;

/// Canonical key of an edge: `(min(a, b), max(a, b))`
pub type EdgeKey = (ParticipantId, ParticipantId);

/// Canonicalize an unordered pair
pub fn edge_key(a: ParticipantId, b: ParticipantId) -> EdgeKey {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// A canonical edge with its signed value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    /// Lower participant id of the pair
    pub low: ParticipantId,

    /// Higher participant id of the pair
    pub high: ParticipantId,

    /// Positive: `high` owes `low`. Negative: `low` owes `high`.
    pub value: Cents,
}

impl Edge {
    /// Split the edge into `(debtor, creditor, amount)` with a positive amount
    ///
    /// # Returns
    ///
    /// * `Some((debtor, creditor, cents))` - For a non-zero edge
    /// * `None` - When the pair is settled
    pub fn direction(&self) -> Option<(ParticipantId, ParticipantId, Cents)> {
        match self.value {
            0 => None,
            v if v > 0 => Some((self.high, self.low, v)),
            v => Some((self.low, self.high, v.checked_neg()?)),
        }
    }
}

/// Pairwise net debt store
///
/// Edges are created lazily on the first debt-affecting operation and
/// accumulated for the life of the run; they are never reset.
pub struct DebtLedger {
    /// Map of canonical pairs to signed net debt in cents
    edges: BTreeMap<EdgeKey, Cents>,
}

impl DebtLedger {
    /// Create a ledger with no edges
    pub fn new() -> Self {
        DebtLedger {
            edges: BTreeMap::new(),
        }
    }

    /// How much `debtor` owes `creditor`, in cents
    ///
    /// Negative when `creditor` actually owes `debtor`. Zero for unknown pairs.
    pub fn debt(&self, creditor: ParticipantId, debtor: ParticipantId) -> Cents {
        let stored = self
            .edges
            .get(&edge_key(creditor, debtor))
            .copied()
            .unwrap_or(0);

        if creditor <= debtor {
            stored
        } else {
            -stored
        }
    }

    /// Increase what `debtor` owes `creditor` by `amount`
    ///
    /// A delta between a participant and itself is ignored.
    ///
    /// # Arguments
    ///
    /// * `creditor` - The participant who is owed
    /// * `debtor` - The participant who owes
    /// * `amount` - Cents to add (may be negative)
    ///
    /// # Returns
    ///
    /// * `Ok(())` - If the edge was updated
    /// * `Err(SettlementError)` - If the accumulated value would overflow
    pub fn add_debt(
        &mut self,
        creditor: ParticipantId,
        debtor: ParticipantId,
        amount: Cents,
    ) -> Result<(), SettlementError> {
        if creditor == debtor {
            return Ok(());
        }

        let new_value = self.checked_value(creditor, debtor, amount)?;
        tracing::debug!(creditor, debtor, amount, "ledger delta");
        self.edges.insert(edge_key(creditor, debtor), new_value);

        Ok(())
    }

    /// Apply several deltas owed to one creditor, all or nothing
    ///
    /// Every delta is overflow-checked before any edge is modified, so a
    /// failing bill leaves the ledger untouched.
    ///
    /// # Arguments
    ///
    /// * `creditor` - The participant who is owed
    /// * `charges` - `(debtor, cents)` pairs; debtors must be distinct
    pub fn apply_charges(
        &mut self,
        creditor: ParticipantId,
        charges: &[(ParticipantId, Cents)],
    ) -> Result<(), SettlementError> {
        let mut updates = Vec::with_capacity(charges.len());

        for &(debtor, amount) in charges {
            if debtor == creditor {
                continue;
            }
            let value = self.checked_value(creditor, debtor, amount)?;
            updates.push((debtor, amount, value));
        }

        for (debtor, amount, value) in updates {
            tracing::debug!(creditor, debtor, amount, "ledger delta");
            self.edges.insert(edge_key(creditor, debtor), value);
        }

        Ok(())
    }

    /// Every edge in ascending `(low, high)` order, including settled ones
    pub fn edges(&self) -> impl Iterator<Item = Edge> + '_ {
        self.edges.iter().map(|(&(low, high), &value)| Edge { low, high, value })
    }

    /// Value the canonical edge would hold after adding `amount`
    fn checked_value(
        &self,
        creditor: ParticipantId,
        debtor: ParticipantId,
        amount: Cents,
    ) -> Result<Cents, SettlementError> {
        let key = edge_key(creditor, debtor);
        let current = self.edges.get(&key).copied().unwrap_or(0);

        let new_value = if creditor < debtor {
            current.checked_add(amount)
        } else {
            current.checked_sub(amount)
        };

        // Cents::MIN has no negation, which debt() needs for the reverse view
        new_value
            .filter(|value| *value != Cents::MIN)
            .ok_or_else(|| SettlementError::overflow("ledger update"))
    }
}

impl Default for DebtLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::ascending(0, 1, 250)]
    #[case::descending(5, 2, 250)]
    #[case::negative(3, 1, -40)]
    fn test_antisymmetry(
        #[case] creditor: ParticipantId,
        #[case] debtor: ParticipantId,
        #[case] amount: Cents,
    ) {
        let mut ledger = DebtLedger::new();
        ledger.add_debt(creditor, debtor, amount).unwrap();

        assert_eq!(ledger.debt(creditor, debtor), amount);
        assert_eq!(ledger.debt(debtor, creditor), -amount);
    }

    #[test]
    fn test_additivity() {
        let mut ledger = DebtLedger::new();
        ledger.add_debt(0, 1, 1050).unwrap();
        ledger.add_debt(0, 1, 225).unwrap();

        assert_eq!(ledger.debt(0, 1), 1275);
    }

    #[test]
    fn test_opposite_deltas_net_out() {
        let mut ledger = DebtLedger::new();
        ledger.add_debt(0, 1, 1275).unwrap();
        ledger.add_debt(1, 0, 100).unwrap();

        assert_eq!(ledger.debt(0, 1), 1175);
        assert_eq!(ledger.debt(1, 0), -1175);
    }

    #[test]
    fn test_stored_sign_convention() {
        let mut ledger = DebtLedger::new();
        // 2 owes 7
        ledger.add_debt(7, 2, 30).unwrap();

        let edge = ledger.edges().next().unwrap();
        assert_eq!((edge.low, edge.high, edge.value), (2, 7, -30));
        assert_eq!(edge.direction(), Some((2, 7, 30)));
    }

    #[test]
    fn test_zero_delta_is_idempotent() {
        let mut ledger = DebtLedger::new();
        ledger.add_debt(0, 1, 500).unwrap();
        ledger.add_debt(0, 1, 0).unwrap();

        assert_eq!(ledger.debt(0, 1), 500);
    }

    #[test]
    fn test_self_debt_is_ignored() {
        let mut ledger = DebtLedger::new();
        ledger.add_debt(3, 3, 500).unwrap();

        assert_eq!(ledger.debt(3, 3), 0);
        assert_eq!(ledger.edges().count(), 0);
    }

    #[test]
    fn test_unknown_pair_owes_nothing() {
        let ledger = DebtLedger::new();
        assert_eq!(ledger.debt(4, 9), 0);
    }

    #[test]
    fn test_overflow_is_reported() {
        let mut ledger = DebtLedger::new();
        ledger.add_debt(0, 1, Cents::MAX).unwrap();

        let result = ledger.add_debt(0, 1, 1);

        assert!(matches!(result, Err(SettlementError::Overflow { .. })));
        assert_eq!(ledger.debt(0, 1), Cents::MAX);
    }

    #[test]
    fn test_apply_charges_is_all_or_nothing() {
        let mut ledger = DebtLedger::new();
        ledger.add_debt(0, 2, Cents::MAX).unwrap();

        let result = ledger.apply_charges(0, &[(1, 100), (2, 1)]);

        assert!(matches!(result, Err(SettlementError::Overflow { .. })));
        assert_eq!(ledger.debt(0, 1), 0);
        assert_eq!(ledger.debt(0, 2), Cents::MAX);
    }

    #[test]
    fn test_apply_charges_skips_creditor() {
        let mut ledger = DebtLedger::new();
        ledger.apply_charges(1, &[(0, 10), (1, 10), (2, 10)]).unwrap();

        assert_eq!(ledger.debt(1, 0), 10);
        assert_eq!(ledger.debt(1, 2), 10);
        assert_eq!(ledger.edges().count(), 2);
    }

    #[test]
    fn test_edges_are_ordered_by_key() {
        let mut ledger = DebtLedger::new();
        ledger.add_debt(2, 3, 1).unwrap();
        ledger.add_debt(0, 4, 1).unwrap();
        ledger.add_debt(1, 0, 1).unwrap();

        let keys: Vec<_> = ledger.edges().map(|e| (e.low, e.high)).collect();
        assert_eq!(keys, vec![(0, 1), (0, 4), (2, 3)]);
    }

    #[test]
    fn test_direction_of_settled_edge() {
        let edge = Edge {
            low: 0,
            high: 1,
            value: 0,
        };
        assert_eq!(edge.direction(), None);
    }
}
