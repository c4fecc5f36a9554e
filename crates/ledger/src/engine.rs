//! The ledger engine: sole owner of the account x unit balance table.
//!
//! `execute` is a single critical section. The idempotency check, validation
//! and application all run under the state write lock, so no reader ever sees
//! a half-applied transaction and the per-unit sum of balances stays zero.
//!
//! Transactions are staged before anything is written: every move is checked
//! against the registry and every resulting balance is computed (with overflow
//! checks) into a scratch table. Only when the whole transaction has staged
//! cleanly are the new balances written back. A rejected transaction leaves
//! the state exactly as it was.
//!
//! The engine performs no IO. Persisting an applied transaction is the
//! caller's job, after `execute` returns.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::RwLock;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use posttrade_core::{AccountId, TransactionId, Unit};

use crate::account::Account;
use crate::error::{LedgerError, LedgerResult, MoveSide, MoveViolation};
use crate::registry::{AccountRegistry, Registration};
use crate::snapshot::BalanceSnapshot;
use crate::transaction::Transaction;

type BalanceKey = (AccountId, Unit);

/// Successful result of [`LedgerEngine::execute`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutionOutcome {
    Applied,
    /// The id was applied earlier; nothing was validated or touched.
    AlreadyApplied,
}

#[derive(Debug, Default)]
struct LedgerState {
    balances: BTreeMap<BalanceKey, Decimal>,
    /// Never pruned: an id stays deduplicated for the engine's lifetime.
    applied: HashSet<TransactionId>,
}

/// Double-entry engine over registered accounts and opaque units.
#[derive(Debug, Default)]
pub struct LedgerEngine {
    registry: AccountRegistry,
    state: RwLock<LedgerState>,
}

impl LedgerEngine {
    pub fn new(registry: AccountRegistry) -> Self {
        Self {
            registry,
            state: RwLock::new(LedgerState::default()),
        }
    }

    pub fn registry(&self) -> &AccountRegistry {
        &self.registry
    }

    pub fn register_account(&self, account: Account) -> LedgerResult<Registration> {
        self.registry.register(account)
    }

    /// Apply a transaction atomically, at most once per id.
    pub fn execute(&self, transaction: &Transaction) -> LedgerResult<ExecutionOutcome> {
        let mut state = self.state.write().map_err(|_| LedgerError::Poisoned)?;

        if state.applied.contains(transaction.id()) {
            tracing::debug!(transaction_id = %transaction.id(), "transaction already applied");
            return Ok(ExecutionOutcome::AlreadyApplied);
        }

        let staged = match self.stage(&state, transaction) {
            Ok(staged) => staged,
            Err(err) => {
                tracing::warn!(transaction_id = %transaction.id(), error = %err, "transaction rejected");
                return Err(err);
            }
        };

        state.balances.extend(staged);
        state.applied.insert(transaction.id().clone());

        tracing::debug!(
            transaction_id = %transaction.id(),
            moves = transaction.moves().len(),
            "transaction applied"
        );
        Ok(ExecutionOutcome::Applied)
    }

    /// Validate every move, then compute the post-transaction balance of every
    /// touched key without writing anything.
    fn stage(
        &self,
        state: &LedgerState,
        transaction: &Transaction,
    ) -> LedgerResult<BTreeMap<BalanceKey, Decimal>> {
        for (index, mv) in transaction.moves().iter().enumerate() {
            self.validate_move(mv.source(), mv.destination())
                .map_err(|violation| LedgerError::InvalidMove {
                    transaction_id: transaction.id().clone(),
                    index,
                    violation,
                })?;
        }

        let mut staged: BTreeMap<BalanceKey, Decimal> = BTreeMap::new();
        for mv in transaction.moves() {
            let quantity = mv.quantity().value();
            Self::adjust(state, &mut staged, transaction.id(), mv.source(), mv.unit(), -quantity)?;
            Self::adjust(
                state,
                &mut staged,
                transaction.id(),
                mv.destination(),
                mv.unit(),
                quantity,
            )?;
        }
        Ok(staged)
    }

    fn validate_move(
        &self,
        source: &AccountId,
        destination: &AccountId,
    ) -> Result<(), MoveViolation> {
        if source == destination {
            return Err(MoveViolation::SelfTransfer {
                account: source.clone(),
            });
        }
        if !self.registry.exists(source) {
            return Err(MoveViolation::UnknownAccount {
                side: MoveSide::Source,
                account: source.clone(),
            });
        }
        if !self.registry.exists(destination) {
            return Err(MoveViolation::UnknownAccount {
                side: MoveSide::Destination,
                account: destination.clone(),
            });
        }
        Ok(())
    }

    fn adjust(
        state: &LedgerState,
        staged: &mut BTreeMap<BalanceKey, Decimal>,
        transaction_id: &TransactionId,
        account: &AccountId,
        unit: &Unit,
        delta: Decimal,
    ) -> LedgerResult<()> {
        let key = (account.clone(), unit.clone());
        let current = staged
            .get(&key)
            .or_else(|| state.balances.get(&key))
            .copied()
            .unwrap_or(Decimal::ZERO);

        let next = current
            .checked_add(delta)
            .ok_or_else(|| LedgerError::Overflow {
                transaction_id: transaction_id.clone(),
                account: account.clone(),
                unit: unit.clone(),
            })?;
        staged.insert(key, next);
        Ok(())
    }

    /// Current signed balance; zero if the pair was never touched.
    pub fn get_balance(&self, account: &AccountId, unit: &Unit) -> LedgerResult<Decimal> {
        let state = self.state.read().map_err(|_| LedgerError::Poisoned)?;
        Ok(state
            .balances
            .get(&(account.clone(), unit.clone()))
            .copied()
            .unwrap_or(Decimal::ZERO))
    }

    /// Sum of one unit's balances across every account.
    ///
    /// Zero whenever the unit has only been touched by moves between known
    /// accounts; anything else is a conservation violation.
    pub fn total_supply(&self, unit: &Unit) -> LedgerResult<Decimal> {
        let state = self.state.read().map_err(|_| LedgerError::Poisoned)?;
        Self::supply_of(&state, unit)
    }

    fn supply_of(state: &LedgerState, unit: &Unit) -> LedgerResult<Decimal> {
        state
            .balances
            .iter()
            .filter(|((_, u), _)| u == unit)
            .try_fold(Decimal::ZERO, |acc, (_, balance)| acc.checked_add(*balance))
            .ok_or_else(|| LedgerError::SupplyOverflow { unit: unit.clone() })
    }

    /// Every unit that has a balance row.
    pub fn units(&self) -> LedgerResult<BTreeSet<Unit>> {
        let state = self.state.read().map_err(|_| LedgerError::Poisoned)?;
        Ok(state.balances.keys().map(|(_, unit)| unit.clone()).collect())
    }

    /// Reconciliation: check every touched unit sums to zero.
    pub fn verify_conservation(&self) -> LedgerResult<()> {
        let state = self.state.read().map_err(|_| LedgerError::Poisoned)?;
        let units: BTreeSet<&Unit> = state.balances.keys().map(|(_, unit)| unit).collect();

        for unit in units {
            let total = Self::supply_of(&state, unit)?;
            if !total.is_zero() {
                tracing::error!(unit = %unit, total = %total, "conservation violated");
                return Err(LedgerError::ConservationViolation {
                    unit: unit.clone(),
                    total,
                });
            }
        }
        Ok(())
    }

    pub fn is_applied(&self, id: &TransactionId) -> LedgerResult<bool> {
        let state = self.state.read().map_err(|_| LedgerError::Poisoned)?;
        Ok(state.applied.contains(id))
    }

    pub fn applied_count(&self) -> LedgerResult<u64> {
        let state = self.state.read().map_err(|_| LedgerError::Poisoned)?;
        Ok(state.applied.len() as u64)
    }

    /// Consistent copy of the whole balance table.
    pub fn snapshot(&self) -> LedgerResult<BalanceSnapshot> {
        let state = self.state.read().map_err(|_| LedgerError::Poisoned)?;
        Ok(BalanceSnapshot::from_table(
            state.applied.len() as u64,
            &state.balances,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use posttrade_core::{ContractId, DomainError};
    use rust_decimal_macros::dec;

    use crate::account::AccountType;
    use crate::movement::{Move, Quantity};

    fn id(s: &str) -> AccountId {
        AccountId::new(s).unwrap()
    }

    fn unit(s: &str) -> Unit {
        Unit::new(s).unwrap()
    }

    fn mv(from: &str, to: &str, u: &str, q: Decimal) -> Move {
        Move::new(
            id(from),
            id(to),
            unit(u),
            Quantity::new(q).unwrap(),
            ContractId::new("contract-1").unwrap(),
        )
    }

    fn tx(tx_id: &str, moves: Vec<Move>) -> Transaction {
        Transaction::new(
            TransactionId::new(tx_id).unwrap(),
            Utc.with_ymd_and_hms(2024, 1, 2, 9, 30, 0).unwrap(),
            moves,
        )
        .unwrap()
    }

    fn engine_with(accounts: &[&str]) -> LedgerEngine {
        let registry = AccountRegistry::with_accounts(
            accounts
                .iter()
                .map(|a| Account::new(id(a), AccountType::Cash)),
        )
        .unwrap();
        LedgerEngine::new(registry)
    }

    #[test]
    fn transfer_scenario() {
        let engine = engine_with(&["A", "B"]);
        let usd = unit("USD");

        let t1 = tx("T1", vec![mv("A", "B", "USD", dec!(100))]);
        assert_eq!(engine.execute(&t1).unwrap(), ExecutionOutcome::Applied);
        assert_eq!(engine.get_balance(&id("A"), &usd).unwrap(), dec!(-100));
        assert_eq!(engine.get_balance(&id("B"), &usd).unwrap(), dec!(100));
        assert_eq!(engine.total_supply(&usd).unwrap(), Decimal::ZERO);

        assert_eq!(engine.execute(&t1).unwrap(), ExecutionOutcome::AlreadyApplied);
        assert_eq!(engine.get_balance(&id("A"), &usd).unwrap(), dec!(-100));
        assert_eq!(engine.get_balance(&id("B"), &usd).unwrap(), dec!(100));

        // The second leg of T2 carries a negative quantity, which cannot be built.
        let bad_leg = Quantity::new(dec!(-5));
        assert!(matches!(bad_leg, Err(DomainError::NonPositive { .. })));
        assert_eq!(engine.get_balance(&id("A"), &usd).unwrap(), dec!(-100));
    }

    #[test]
    fn invalid_move_leaves_state_untouched() {
        let engine = engine_with(&["A", "B"]);
        engine
            .execute(&tx("T1", vec![mv("A", "B", "USD", dec!(100))]))
            .unwrap();
        let before = engine.snapshot().unwrap();

        let t2 = tx(
            "T2",
            vec![
                mv("A", "B", "USD", dec!(50)),
                mv("B", "ghost", "EUR", dec!(5)),
            ],
        );
        let err = engine.execute(&t2).unwrap_err();
        assert_eq!(
            err,
            LedgerError::InvalidMove {
                transaction_id: TransactionId::new("T2").unwrap(),
                index: 1,
                violation: MoveViolation::UnknownAccount {
                    side: MoveSide::Destination,
                    account: id("ghost"),
                },
            }
        );
        assert!(err.is_validation());
        assert_eq!(engine.snapshot().unwrap(), before);
        assert!(!engine.is_applied(&TransactionId::new("T2").unwrap()).unwrap());
    }

    #[test]
    fn rejected_transaction_can_be_fixed_and_resubmitted_under_same_id() {
        let engine = engine_with(&["A", "B"]);
        let bad = tx("T9", vec![mv("A", "C", "USD", dec!(1))]);
        assert!(engine.execute(&bad).is_err());

        engine.register_account(Account::new(id("C"), AccountType::Cash)).unwrap();
        assert_eq!(engine.execute(&bad).unwrap(), ExecutionOutcome::Applied);
    }

    #[test]
    fn self_moves_are_rejected() {
        let engine = engine_with(&["A"]);
        let err = engine
            .execute(&tx("T1", vec![mv("A", "A", "USD", dec!(1))]))
            .unwrap_err();
        assert!(matches!(
            err,
            LedgerError::InvalidMove {
                index: 0,
                violation: MoveViolation::SelfTransfer { .. },
                ..
            }
        ));
    }

    #[test]
    fn overflow_is_rejected_before_mutation() {
        let engine = engine_with(&["A", "B"]);
        engine
            .execute(&tx("T1", vec![mv("A", "B", "USD", Decimal::MAX)]))
            .unwrap();

        let err = engine
            .execute(&tx("T2", vec![mv("A", "B", "USD", dec!(1))]))
            .unwrap_err();
        assert!(matches!(err, LedgerError::Overflow { .. }));
        assert_eq!(engine.get_balance(&id("B"), &unit("USD")).unwrap(), Decimal::MAX);
    }

    #[test]
    fn moves_within_one_transaction_net_against_each_other() {
        let engine = engine_with(&["A", "B", "C"]);
        let t = tx(
            "T1",
            vec![
                mv("A", "B", "USD", dec!(10)),
                mv("B", "C", "USD", dec!(10)),
                mv("C", "A", "XYZ-TOKEN", dec!(1)),
            ],
        );
        engine.execute(&t).unwrap();

        assert_eq!(engine.get_balance(&id("B"), &unit("USD")).unwrap(), Decimal::ZERO);
        assert_eq!(engine.get_balance(&id("C"), &unit("USD")).unwrap(), dec!(10));
        assert_eq!(engine.get_balance(&id("A"), &unit("XYZ-TOKEN")).unwrap(), dec!(1));
        engine.verify_conservation().unwrap();
        assert_eq!(
            engine.units().unwrap(),
            BTreeSet::from([unit("USD"), unit("XYZ-TOKEN")])
        );
    }

    #[test]
    fn untouched_balances_read_as_zero() {
        let engine = engine_with(&["A"]);
        assert_eq!(engine.get_balance(&id("A"), &unit("JPY")).unwrap(), Decimal::ZERO);
        assert_eq!(engine.total_supply(&unit("JPY")).unwrap(), Decimal::ZERO);
        assert_eq!(engine.applied_count().unwrap(), 0);
    }
}
