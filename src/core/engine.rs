//! Billing engine
//!
//! This module provides the BillingEngine that replays operation records
//! against a `LedgerState`, the explicit owner of every piece of mutable state:
//! the identity registry, the present and resident interval stores, and the
//! debt ledger.
//!
//! The engine enforces the rules of the log:
//! - Each participant has at most one open interval per store
//! - Intervals are never closed before they start
//! - Bills are only prorated over windows someone is present or resident for
//! - Every operation is applied atomically; a failing operation leaves the
//!   state untouched

use crate::core::debt_ledger::DebtLedger;
use crate::core::gap_fill::fill_gaps;
use crate::core::interval_store::IntervalStore;
use crate::core::registry::IdentityRegistry;
use crate::core::split::split_intervals;
use crate::core::traits::IntervalQuery;
use crate::types::{
    Cents, Debt, Interval, IntervalKind, OpCode, OperationRecord, ParticipantId, PresenceEntry,
    PresenceStatus, SettlementError, Timestamp,
};
use std::collections::{BTreeMap, BTreeSet};

/// Surcharge per charged participant, in cents, absorbing rounding loss
pub const DEFAULT_PAYER_TIP: Cents = 1;

/// Billing configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BillingConfig {
    /// Cents added to every per-participant charge of a PAY split or a BUY
    pub payer_tip: Cents,
}

impl Default for BillingConfig {
    fn default() -> Self {
        BillingConfig {
            payer_tip: DEFAULT_PAYER_TIP,
        }
    }
}

/// Everything a replay mutates, owned in one place
pub struct LedgerState {
    /// Name to id bijection
    pub registry: IdentityRegistry,

    /// Spans during which participants are physically there
    pub present: IntervalStore,

    /// Spans during which participants hold residency
    pub resident: IntervalStore,

    /// Pairwise net debt
    pub ledger: DebtLedger,
}

impl LedgerState {
    /// Create an empty state
    pub fn new() -> Self {
        LedgerState {
            registry: IdentityRegistry::new(),
            present: IntervalStore::new(IntervalKind::Present),
            resident: IntervalStore::new(IntervalKind::Resident),
            ledger: DebtLedger::new(),
        }
    }

    /// Every non-zero debt with resolved names, in canonical edge order
    ///
    /// # Errors
    ///
    /// Returns an error if an edge references an id the registry never allocated.
    pub fn debts(&self) -> Result<Vec<Debt>, SettlementError> {
        let mut debts = Vec::new();

        for edge in self.ledger.edges() {
            if let Some((debtor, creditor, amount)) = edge.direction() {
                debts.push(Debt {
                    debtor: self.registry.resolve(debtor)?.to_string(),
                    creditor: self.registry.resolve(creditor)?.to_string(),
                    amount,
                });
            }
        }

        Ok(debts)
    }

    /// Presence status of every participant who has not moved out, in id order
    pub fn presence(&self) -> Vec<PresenceEntry> {
        self.registry
            .participants()
            .iter()
            .filter_map(|participant| {
                let status = if self.present.is_open(participant.id) {
                    PresenceStatus::Present
                } else if self.resident.is_open(participant.id) {
                    PresenceStatus::Absent
                } else {
                    return None;
                };

                Some(PresenceEntry {
                    name: participant.name.clone(),
                    status,
                })
            })
            .collect()
    }

    fn participant(&self, name: &str) -> Result<ParticipantId, SettlementError> {
        self.registry
            .find(name)
            .ok_or_else(|| SettlementError::unknown_participant(name))
    }
}

impl Default for LedgerState {
    fn default() -> Self {
        Self::new()
    }
}

/// Share of a bill owed by each participant of one split
///
/// `tip + floor(interval * amount / (headcount * bill_interval))`, computed in
/// 128-bit arithmetic and floored towards negative infinity.
///
/// # Arguments
///
/// * `interval` - Length of the split in seconds
/// * `amount` - The whole bill in cents
/// * `headcount` - Number of participants sharing the split (> 0)
/// * `bill_interval` - Length of the billing window in seconds (> 0)
/// * `tip` - Surcharge per participant
///
/// # Errors
///
/// Returns `Overflow` if the share does not fit in `Cents`.
pub fn prorate(
    interval: i64,
    amount: Cents,
    headcount: usize,
    bill_interval: i64,
    tip: Cents,
) -> Result<Cents, SettlementError> {
    let divisor = (headcount as i128) * i128::from(bill_interval);
    if divisor <= 0 {
        return Err(SettlementError::overflow("proration"));
    }

    let share = (i128::from(interval) * i128::from(amount)).div_euclid(divisor) + i128::from(tip);
    Cents::try_from(share).map_err(|_| SettlementError::overflow("proration"))
}

/// Replays operation records against a `LedgerState`
pub struct BillingEngine {
    state: LedgerState,
    config: BillingConfig,
}

impl BillingEngine {
    /// Create an engine with the default configuration
    pub fn new() -> Self {
        Self::with_config(BillingConfig::default())
    }

    /// Create an engine with an explicit configuration
    pub fn with_config(config: BillingConfig) -> Self {
        BillingEngine {
            state: LedgerState::new(),
            config,
        }
    }

    /// The state built so far
    pub fn state(&self) -> &LedgerState {
        &self.state
    }

    /// The configuration in use
    pub fn config(&self) -> BillingConfig {
        self.config
    }

    /// Consume the engine, keeping its state
    pub fn into_state(self) -> LedgerState {
        self.state
    }

    /// Apply a single operation record
    ///
    /// Dispatches on the operation kind. Errors are tagged with the record's
    /// log line.
    ///
    /// # Arguments
    ///
    /// * `record` - The parsed operation
    ///
    /// # Returns
    ///
    /// * `Ok(())` if the operation was applied
    /// * `Err(SettlementError)` if it was rejected; the state is unchanged
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - A referenced participant is not registered
    /// - The operation conflicts with the open intervals of a participant
    /// - A billing window is empty or has no present or resident participant
    /// - Ledger arithmetic would overflow
    pub fn process(&mut self, record: OperationRecord) -> Result<(), SettlementError> {
        let OperationRecord {
            line,
            timestamp: ts,
            op,
        } = record;
        tracing::debug!(line, %ts, %op, "applying operation");

        let result = match op {
            OpCode::Start { name } => self.process_start(ts, &name),
            OpCode::Stop { name } => self.process_stop(ts, &name),
            OpCode::Pause { who } => self.process_pause(ts, &who),
            OpCode::Resume { who } => self.process_resume(ts, &who),
            OpCode::Transfer { from, to, amount } => self.process_transfer(&from, &to, amount),
            OpCode::Pay {
                payer,
                amount,
                window_start,
                window_end,
            } => self.process_pay(&payer, amount, window_start, window_end),
            OpCode::Buy {
                buyer,
                amount,
                description,
            } => self.process_buy(ts, &buyer, amount, description.as_deref()),
        };

        result.map_err(|error| error.at_line(line))
    }

    /// Move in: open a present and a resident interval at `ts`
    ///
    /// A known name reuses its id, provided it has no open interval left.
    /// A freshly registered id never has one.
    fn process_start(&mut self, ts: Timestamp, name: &str) -> Result<(), SettlementError> {
        let id = self.state.registry.find_or_insert(name)?;

        for store in [&self.state.present, &self.state.resident] {
            if store.is_open(id) {
                return Err(SettlementError::IntervalAlreadyOpen {
                    participant: id,
                    kind: store.kind(),
                });
            }
        }

        self.state.present.insert(id, ts, Timestamp::PlusInfinity)?;
        self.state.resident.insert(id, ts, Timestamp::PlusInfinity)?;
        Ok(())
    }

    /// Move out at `ts`
    ///
    /// For a known participant the open resident interval is closed, along
    /// with the present one unless they are paused. An unseen name is
    /// registered with a stay that began before the log.
    fn process_stop(&mut self, ts: Timestamp, name: &str) -> Result<(), SettlementError> {
        let Some(id) = self.state.registry.find(name) else {
            let id = self.state.registry.insert(name)?;
            tracing::debug!(name, id, "moved out before the log began");
            self.state.present.insert(id, Timestamp::MinusInfinity, ts)?;
            self.state.resident.insert(id, Timestamp::MinusInfinity, ts)?;
            return Ok(());
        };

        let resident = self
            .state
            .resident
            .open_interval(id)
            .copied()
            .ok_or(SettlementError::NoOpenInterval {
                participant: id,
                kind: IntervalKind::Resident,
            })?;
        let present = self.state.present.open_interval(id).copied();

        for interval in present.iter().chain(std::iter::once(&resident)) {
            if ts < interval.min {
                return Err(SettlementError::InvalidInterval {
                    participant: id,
                    min: interval.min,
                    max: ts,
                });
            }
        }

        if present.is_some() {
            self.state.present.finish_last(id, ts)?;
        }
        self.state.resident.finish_last(id, ts)?;
        Ok(())
    }

    /// Leave temporarily: close the present interval, keep residency
    fn process_pause(&mut self, ts: Timestamp, who: &str) -> Result<(), SettlementError> {
        let id = self.state.registry.lookup(who)?;
        self.state.present.finish_last(id, ts)?;
        Ok(())
    }

    /// Come back: open a new present interval
    ///
    /// Only residents can come back; a participant who moved out must START.
    fn process_resume(&mut self, ts: Timestamp, who: &str) -> Result<(), SettlementError> {
        let id = self.state.registry.lookup(who)?;
        if !self.state.resident.is_open(id) {
            return Err(SettlementError::NoOpenInterval {
                participant: id,
                kind: IntervalKind::Resident,
            });
        }
        self.state.present.insert(id, ts, Timestamp::PlusInfinity)?;
        Ok(())
    }

    /// `to` now owes `from` an extra `amount`
    fn process_transfer(&mut self, from: &str, to: &str, amount: Cents) -> Result<(), SettlementError> {
        let from_id = self.state.participant(from)?;
        let to_id = self.state.participant(to)?;
        self.state.ledger.add_debt(from_id, to_id, amount)
    }

    /// Prorate a period bill over `[win_min, win_max]`
    ///
    /// Present intervals are clipped to the window and split, gaps are filled
    /// from residency, and every participant of each split other than the
    /// payer is charged that split's share.
    fn process_pay(
        &mut self,
        payer: &str,
        amount: Cents,
        win_min: Timestamp,
        win_max: Timestamp,
    ) -> Result<(), SettlementError> {
        let payer_id = self.state.participant(payer)?;

        let bill_interval = win_max
            .seconds_since(win_min)
            .filter(|seconds| *seconds > 0)
            .ok_or(SettlementError::InvalidWindow {
                min: win_min,
                max: win_max,
            })?;

        let clipped: Vec<Interval> = self
            .state
            .present
            .intersect(win_min, win_max)
            .iter()
            .map(|interval| interval.clamp(win_min, win_max))
            .collect();
        tracing::debug!(matches = clipped.len(), "present intervals in window");

        let splits = fill_gaps(
            split_intervals(&clipped),
            win_min,
            win_max,
            &self.state.resident,
        )?;

        let mut charges: BTreeMap<ParticipantId, Cents> = BTreeMap::new();
        for split in &splits {
            let interval = split
                .max
                .seconds_since(split.min)
                .ok_or_else(|| SettlementError::overflow("split length"))?;
            let cost = prorate(
                interval,
                amount,
                split.present.len(),
                bill_interval,
                self.config.payer_tip,
            )?;
            tracing::debug!(min = %split.min, max = %split.max, headcount = split.present.len(), cost, "split cost");

            for &participant in split.present.iter().filter(|&&id| id != payer_id) {
                let total = charges.entry(participant).or_insert(0);
                *total = total
                    .checked_add(cost)
                    .ok_or_else(|| SettlementError::overflow("pay"))?;
            }
        }

        let charges: Vec<_> = charges.into_iter().collect();
        self.state.ledger.apply_charges(payer_id, &charges)
    }

    /// Split a purchase among everyone resident at `ts`
    fn process_buy(
        &mut self,
        ts: Timestamp,
        buyer: &str,
        amount: Cents,
        description: Option<&str>,
    ) -> Result<(), SettlementError> {
        let buyer_id = self.state.participant(buyer)?;

        let residents: BTreeSet<ParticipantId> = self
            .state
            .resident
            .intersect(ts, ts)
            .iter()
            .map(|interval| interval.owner)
            .collect();

        if residents.is_empty() {
            return Err(SettlementError::no_coverage(ts, ts));
        }

        let headcount = Cents::try_from(residents.len())
            .map_err(|_| SettlementError::overflow("buy"))?;
        let cost = amount
            .div_euclid(headcount)
            .checked_add(self.config.payer_tip)
            .ok_or_else(|| SettlementError::overflow("buy"))?;
        tracing::debug!(buyer, headcount, cost, description = description.unwrap_or(""), "purchase split");

        let charges: Vec<_> = residents
            .into_iter()
            .filter(|&id| id != buyer_id)
            .map(|id| (id, cost))
            .collect();
        self.state.ledger.apply_charges(buyer_id, &charges)
    }
}

impl Default for BillingEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ErrorKind;
    use rstest::rstest;

    fn day(date: &str) -> Timestamp {
        Timestamp::parse(date).unwrap()
    }

    fn start(line: u64, ts: Timestamp, name: &str) -> OperationRecord {
        OperationRecord::new(line, ts, OpCode::Start { name: name.to_string() })
    }

    fn stop(line: u64, ts: Timestamp, name: &str) -> OperationRecord {
        OperationRecord::new(line, ts, OpCode::Stop { name: name.to_string() })
    }

    fn pause(line: u64, ts: Timestamp, who: &str) -> OperationRecord {
        OperationRecord::new(line, ts, OpCode::Pause { who: who.to_string() })
    }

    fn resume(line: u64, ts: Timestamp, who: &str) -> OperationRecord {
        OperationRecord::new(line, ts, OpCode::Resume { who: who.to_string() })
    }

    fn transfer(line: u64, from: &str, to: &str, amount: Cents) -> OperationRecord {
        OperationRecord::new(
            line,
            Timestamp::At(0),
            OpCode::Transfer {
                from: from.to_string(),
                to: to.to_string(),
                amount,
            },
        )
    }

    fn pay(line: u64, payer: &str, amount: Cents, min: Timestamp, max: Timestamp) -> OperationRecord {
        OperationRecord::new(
            line,
            max,
            OpCode::Pay {
                payer: payer.to_string(),
                amount,
                window_start: min,
                window_end: max,
            },
        )
    }

    fn buy(line: u64, ts: Timestamp, buyer: &str, amount: Cents) -> OperationRecord {
        OperationRecord::new(
            line,
            ts,
            OpCode::Buy {
                buyer: buyer.to_string(),
                amount,
                description: None,
            },
        )
    }

    fn replay(engine: &mut BillingEngine, records: Vec<OperationRecord>) {
        for record in records {
            engine.process(record).unwrap();
        }
    }

    fn id(engine: &BillingEngine, name: &str) -> ParticipantId {
        engine.state().registry.find(name).unwrap()
    }

    fn debt(engine: &BillingEngine, creditor: &str, debtor: &str) -> Cents {
        engine
            .state()
            .ledger
            .debt(id(engine, creditor), id(engine, debtor))
    }

    #[test]
    fn test_pay_splits_on_departure() {
        let mut engine = BillingEngine::new();
        replay(
            &mut engine,
            vec![
                start(1, day("2023-12-01"), "p"),
                pause(2, day("2023-12-15"), "p"),
                start(3, day("2024-01-01"), "l"),
                start(4, day("2024-01-01"), "el"),
                start(5, day("2024-01-01"), "q"),
                stop(6, day("2024-01-11"), "l"),
                pay(7, "p", 30000, day("2024-01-01"), day("2024-01-31")),
            ],
        );

        // [x, w] split three ways, [w, y] split two ways
        assert_eq!(debt(&engine, "p", "l"), 3334);
        assert_eq!(debt(&engine, "p", "el"), 3334 + 10001);
        assert_eq!(debt(&engine, "p", "q"), 3334 + 10001);
    }

    #[test]
    fn test_proration_is_conserved_without_tip() {
        let mut engine = BillingEngine::with_config(BillingConfig { payer_tip: 0 });
        let t = Timestamp::At;
        replay(
            &mut engine,
            vec![
                stop(1, t(0), "p"),
                start(2, t(100), "a"),
                start(3, t(250), "b"),
                pause(4, t(400), "a"),
                start(5, t(500), "c"),
                resume(6, t(700), "a"),
                pay(7, "p", 100_000, t(100), t(1000)),
            ],
        );

        let charged: Cents = ["a", "b", "c"]
            .iter()
            .map(|name| debt(&engine, "p", name))
            .sum();

        // Five splits, each losing less than a cent per participant
        assert_eq!(charged, 99_998);
        assert!(100_000 - charged <= 5);
    }

    #[test]
    fn test_pay_falls_back_to_residents() {
        let mut engine = BillingEngine::new();
        let t = Timestamp::At;
        replay(
            &mut engine,
            vec![
                start(1, t(0), "payer"),
                start(2, t(0), "away"),
                pause(3, t(0), "away"),
                pause(4, t(0), "payer"),
                pay(5, "payer", 1000, t(0), t(100)),
            ],
        );

        // Nobody present: both residents share the whole window
        assert_eq!(debt(&engine, "payer", "away"), 501);
    }

    #[test]
    fn test_payer_is_never_charged() {
        let mut engine = BillingEngine::new();
        let t = Timestamp::At;
        replay(
            &mut engine,
            vec![
                start(1, t(0), "solo"),
                pay(2, "solo", 1000, t(0), t(100)),
            ],
        );

        assert_eq!(engine.state().ledger.edges().count(), 0);
    }

    #[test]
    fn test_buy_splits_among_residents() {
        let mut engine = BillingEngine::new();
        let t = Timestamp::At;
        replay(
            &mut engine,
            vec![
                start(1, t(0), "a"),
                start(2, t(0), "b"),
                start(3, t(0), "c"),
                pause(4, t(10), "c"),
                stop(5, t(10), "gone"),
                buy(6, t(20), "a", 1000),
            ],
        );

        assert_eq!(debt(&engine, "a", "b"), 334);
        assert_eq!(debt(&engine, "a", "c"), 334);
        assert_eq!(debt(&engine, "a", "gone"), 0);
    }

    #[test]
    fn test_buy_excludes_resident_starting_at_purchase() {
        let mut engine = BillingEngine::new();
        let t = Timestamp::At;
        replay(
            &mut engine,
            vec![
                start(1, t(0), "a"),
                start(2, t(20), "late"),
                buy(3, t(20), "a", 1000),
            ],
        );

        assert_eq!(debt(&engine, "a", "late"), 0);
    }

    #[test]
    fn test_transfers_accumulate() {
        let mut engine = BillingEngine::new();
        let t = Timestamp::At;
        replay(
            &mut engine,
            vec![
                start(1, t(0), "alice"),
                start(2, t(0), "bob"),
                transfer(3, "alice", "bob", 1050),
                transfer(4, "alice", "bob", 225),
                transfer(5, "bob", "alice", 100),
            ],
        );

        assert_eq!(debt(&engine, "alice", "bob"), 1175);
        assert_eq!(debt(&engine, "bob", "alice"), -1175);
    }

    #[test]
    fn test_zero_transfer_is_idempotent() {
        let mut engine = BillingEngine::new();
        let t = Timestamp::At;
        replay(
            &mut engine,
            vec![
                start(1, t(0), "alice"),
                start(2, t(0), "bob"),
                transfer(3, "alice", "bob", 500),
            ],
        );
        let before = debt(&engine, "alice", "bob");

        engine.process(transfer(4, "alice", "bob", 0)).unwrap();

        assert_eq!(debt(&engine, "alice", "bob"), before);
    }

    #[test]
    fn test_uncovered_charges_leave_ledger_untouched() {
        let mut engine = BillingEngine::new();
        let t = Timestamp::At;
        replay(
            &mut engine,
            vec![
                start(1, t(0), "alice"),
                start(2, t(0), "bob"),
                transfer(3, "alice", "bob", 500),
            ],
        );
        let before = debt(&engine, "alice", "bob");
        let edges_before: Vec<_> = engine.state().ledger.edges().collect();

        let buy_error = engine.process(buy(4, t(-10), "alice", 900)).unwrap_err();
        let pay_error = engine
            .process(pay(5, "alice", 900, t(-100), t(-10)))
            .unwrap_err();

        assert_eq!(buy_error.kind(), ErrorKind::NoCoverage);
        assert_eq!(pay_error.kind(), ErrorKind::NoCoverage);
        assert_eq!(debt(&engine, "alice", "bob"), before);
        assert_eq!(engine.state().ledger.edges().collect::<Vec<_>>(), edges_before);
    }

    #[test]
    fn test_resume_after_moving_out_fails() {
        let mut engine = BillingEngine::new();
        let t = Timestamp::At;
        replay(&mut engine, vec![start(1, t(0), "a"), stop(2, t(10), "a")]);

        let error = engine.process(resume(3, t(20), "a")).unwrap_err();

        assert!(matches!(
            error,
            SettlementError::AtLine { line: 3, source }
                if matches!(*source, SettlementError::NoOpenInterval { participant: 0, kind: IntervalKind::Resident })
        ));
        assert!(!engine.state().present.is_open(0));
        assert!(engine.state().presence().is_empty());
    }

    #[test]
    fn test_stop_of_unknown_name_records_earlier_stay() {
        let mut engine = BillingEngine::new();
        replay(
            &mut engine,
            vec![
                start(1, day("2024-01-01"), "a"),
                stop(2, day("2024-01-16"), "b"),
                pay(3, "a", 6200, day("2024-01-01"), day("2024-01-31")),
            ],
        );

        assert_eq!(debt(&engine, "a", "b"), 1551);
    }

    #[test]
    fn test_restart_reuses_id() {
        let mut engine = BillingEngine::new();
        let t = Timestamp::At;
        replay(
            &mut engine,
            vec![
                start(1, t(0), "a"),
                stop(2, t(10), "a"),
                start(3, t(20), "a"),
            ],
        );

        assert_eq!(engine.state().registry.len(), 1);
        assert!(engine.state().present.is_open(0));
        assert_eq!(
            engine
                .state()
                .present
                .intersect(Timestamp::MinusInfinity, Timestamp::PlusInfinity)
                .len(),
            2
        );
    }

    #[test]
    fn test_stop_while_paused_closes_residency() {
        let mut engine = BillingEngine::new();
        let t = Timestamp::At;
        replay(
            &mut engine,
            vec![
                start(1, t(0), "a"),
                pause(2, t(5), "a"),
                stop(3, t(10), "a"),
            ],
        );

        assert!(!engine.state().resident.is_open(0));
        assert!(engine.state().presence().is_empty());
    }

    #[test]
    fn test_pause_and_resume_by_id() {
        let mut engine = BillingEngine::new();
        let t = Timestamp::At;
        replay(
            &mut engine,
            vec![
                start(1, t(0), "a"),
                start(2, t(0), "b"),
                pause(3, t(5), "1"),
            ],
        );
        assert!(!engine.state().present.is_open(1));

        engine.process(resume(4, t(8), "1")).unwrap();
        assert!(engine.state().present.is_open(1));
    }

    #[test]
    fn test_presence_report_entries() {
        let mut engine = BillingEngine::new();
        let t = Timestamp::At;
        replay(
            &mut engine,
            vec![
                start(1, t(0), "here"),
                start(2, t(0), "away"),
                start(3, t(0), "gone"),
                pause(4, t(5), "away"),
                stop(5, t(6), "gone"),
            ],
        );

        let presence = engine.state().presence();

        assert_eq!(
            presence,
            vec![
                PresenceEntry {
                    name: "here".to_string(),
                    status: PresenceStatus::Present,
                },
                PresenceEntry {
                    name: "away".to_string(),
                    status: PresenceStatus::Absent,
                },
            ]
        );
    }

    #[test]
    fn test_debts_resolve_names() {
        let mut engine = BillingEngine::new();
        let t = Timestamp::At;
        replay(
            &mut engine,
            vec![
                start(1, t(0), "alice"),
                start(2, t(0), "bob"),
                transfer(3, "alice", "bob", 1175),
            ],
        );

        let debts = engine.state().debts().unwrap();

        assert_eq!(
            debts,
            vec![Debt {
                debtor: "bob".to_string(),
                creditor: "alice".to_string(),
                amount: 1175,
            }]
        );
    }

    #[rstest]
    #[case::unknown_transfer(transfer(2, "a", "mallory", 100), ErrorKind::UnknownParticipant)]
    #[case::unknown_pause(pause(2, Timestamp::At(5), "mallory"), ErrorKind::UnknownParticipant)]
    #[case::unknown_payer(pay(2, "mallory", 100, Timestamp::At(0), Timestamp::At(10)), ErrorKind::UnknownParticipant)]
    #[case::double_start(start(2, Timestamp::At(5), "a"), ErrorKind::InvalidState)]
    #[case::double_resume(resume(2, Timestamp::At(5), "a"), ErrorKind::InvalidState)]
    #[case::stop_before_start(stop(2, Timestamp::At(-5), "a"), ErrorKind::InvalidState)]
    #[case::empty_window(pay(2, "a", 100, Timestamp::At(10), Timestamp::At(10)), ErrorKind::Malformed)]
    #[case::window_before_anyone(pay(2, "a", 100, Timestamp::At(-20), Timestamp::At(-10)), ErrorKind::NoCoverage)]
    #[case::buy_before_anyone(buy(2, Timestamp::At(-1), "a", 100), ErrorKind::NoCoverage)]
    fn test_rejected_operations(#[case] record: OperationRecord, #[case] expected: ErrorKind) {
        let mut engine = BillingEngine::new();
        engine.process(start(1, Timestamp::At(0), "a")).unwrap();

        let error = engine.process(record).unwrap_err();

        assert_eq!(error.kind(), expected);
        assert!(matches!(error, SettlementError::AtLine { line: 2, .. }));
    }

    #[test]
    fn test_pause_twice_fails() {
        let mut engine = BillingEngine::new();
        let t = Timestamp::At;
        replay(&mut engine, vec![start(1, t(0), "a"), pause(2, t(5), "a")]);

        let error = engine.process(pause(3, t(6), "a")).unwrap_err();

        assert!(matches!(
            error,
            SettlementError::AtLine { source, .. }
                if matches!(*source, SettlementError::NoOpenInterval { participant: 0, kind: IntervalKind::Present })
        ));
    }

    #[test]
    fn test_failed_stop_leaves_state_untouched() {
        let mut engine = BillingEngine::new();
        let t = Timestamp::At;
        replay(&mut engine, vec![start(1, t(0), "a"), pause(2, t(5), "a"), resume(3, t(20), "a")]);

        // The present interval opened at 20 cannot end at 10
        assert!(engine.process(stop(4, t(10), "a")).is_err());

        assert!(engine.state().present.is_open(0));
        assert!(engine.state().resident.is_open(0));
    }

    #[test]
    fn test_overflowing_pay_leaves_ledger_untouched() {
        let mut engine = BillingEngine::new();
        let t = Timestamp::At;
        replay(
            &mut engine,
            vec![
                start(1, t(0), "payer"),
                start(2, t(0), "a"),
                start(3, t(0), "b"),
                transfer(4, "payer", "b", Cents::MAX - 10),
            ],
        );

        let result = engine.process(pay(5, "payer", 1000, t(0), t(10)));

        assert_eq!(result.map_err(|e| e.kind()), Err(ErrorKind::Overflow));
        assert_eq!(debt(&engine, "payer", "a"), 0);
        assert_eq!(debt(&engine, "payer", "b"), Cents::MAX - 10);
    }

    #[rstest]
    #[case::even(100, 1000, 2, 100, 0, 500)]
    #[case::truncated(10, 30000, 3, 30, 1, 3334)]
    #[case::negative_floors_down(1, -10, 3, 1, 0, -4)]
    fn test_prorate(
        #[case] interval: i64,
        #[case] amount: Cents,
        #[case] headcount: usize,
        #[case] bill_interval: i64,
        #[case] tip: Cents,
        #[case] expected: Cents,
    ) {
        assert_eq!(prorate(interval, amount, headcount, bill_interval, tip), Ok(expected));
    }
}
