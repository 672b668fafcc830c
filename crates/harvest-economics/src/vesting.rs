// crates/harvest-economics/src/vesting.rs
//
// Weekly-bucketed lock and vesting ledger.
//
// Every account holds three kinds of balance:
//
// - `unlocked`: freely withdrawable stake.
// - `locks`: principal locked until an epoch-aligned maturity.
// - `earnings`: minted grants that vest at an epoch-aligned maturity and can
//   be withdrawn early at a 50% penalty.
//
// Locks and earnings are `VestingQueue`s: append-only sequences ordered by
// maturity with a head index marking the oldest live entry. Entries created
// in the same epoch share a bucket. Sweeping matured entries advances the
// head instead of shifting the vector.
//
// Withdrawals are split into a pure `plan_*` step that does all validation
// and an `apply_withdrawal` step that cannot fail for a fresh plan, so callers
// can perform external transfers in between and keep the whole operation
// all-or-nothing.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use harvest_core::math::add;
use harvest_core::{maturity_after, Address, HarvestError, Timestamp};

/// Default number of epochs a lock or grant runs before maturing.
pub const DEFAULT_LOCK_EPOCHS: u64 = 13;

/// Consumed entries below this count are never compacted away.
const COMPACT_THRESHOLD: usize = 16;

/// One bucket of locked or vesting tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VestingEntry {
    pub amount: u128,
    pub maturity: Timestamp,
}

/// Maturity-ordered queue of vesting entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VestingQueue {
    entries: Vec<VestingEntry>,
    /// Index of the oldest entry that has not been consumed.
    head: usize,
    /// Sum of all live entries.
    total: u128,
}

impl VestingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Live entries, oldest first.
    pub fn entries(&self) -> &[VestingEntry] {
        &self.entries[self.head..]
    }

    pub fn total(&self) -> u128 {
        self.total
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    /// Add `amount` maturing at `maturity`.
    ///
    /// Merged into the tail bucket when the tail matures no earlier than
    /// `maturity`, otherwise appended.
    pub fn push(&mut self, amount: u128, maturity: Timestamp) -> Result<(), HarvestError> {
        let total = add(self.total, amount, "vesting queue total")?;
        match self.entries[self.head..].last_mut() {
            Some(tail) if tail.maturity >= maturity => {
                tail.amount = add(tail.amount, amount, "vesting entry")?;
            }
            _ => self.entries.push(VestingEntry { amount, maturity }),
        }
        self.total = total;
        Ok(())
    }

    /// Number of leading live entries with `maturity <= now`.
    fn matured_len(&self, now: Timestamp) -> usize {
        self.entries().partition_point(|e| e.maturity <= now)
    }

    /// Sum of entries that have matured by `now`.
    pub fn matured_total(&self, now: Timestamp) -> u128 {
        self.entries()[..self.matured_len(now)]
            .iter()
            .map(|e| e.amount)
            .sum()
    }

    /// Sum of entries still maturing at `now`.
    pub fn unmatured_total(&self, now: Timestamp) -> u128 {
        self.total - self.matured_total(now)
    }

    /// Entries still maturing at `now`, oldest first.
    pub fn unmatured(&self, now: Timestamp) -> &[VestingEntry] {
        let entries = self.entries();
        &entries[self.matured_len(now)..]
    }

    /// Remove every matured entry and return their sum.
    pub fn pop_matured(&mut self, now: Timestamp) -> u128 {
        let count = self.matured_len(now);
        let swept: u128 = self.entries()[..count].iter().map(|e| e.amount).sum();
        self.head += count;
        self.total -= swept;
        self.compact();
        swept
    }

    /// Remove `amount` from the front of the queue, splitting the last
    /// touched entry if needed.
    pub fn consume_front(&mut self, amount: u128) -> Result<(), HarvestError> {
        if amount > self.total {
            return Err(HarvestError::InvalidState(format!(
                "cannot consume {} from vesting queue holding {}",
                amount, self.total
            )));
        }
        let mut remaining = amount;
        while remaining > 0 {
            let entry = &mut self.entries[self.head];
            if remaining < entry.amount {
                entry.amount -= remaining;
                break;
            }
            remaining -= entry.amount;
            self.head += 1;
        }
        self.total -= amount;
        self.compact();
        Ok(())
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.head = 0;
        self.total = 0;
    }

    fn compact(&mut self) {
        if self.head == self.entries.len() {
            self.clear();
        } else if self.head >= COMPACT_THRESHOLD && self.head * 2 >= self.entries.len() {
            self.entries.drain(..self.head);
            self.head = 0;
        }
    }
}

/// Balance record of one staker.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountBalances {
    pub unlocked: u128,
    pub locks: VestingQueue,
    pub earnings: VestingQueue,
}

impl AccountBalances {
    /// `unlocked + locked + earned`: the weight of non-native reward tokens.
    pub fn total(&self) -> u128 {
        self.unlocked + self.locks.total() + self.earnings.total()
    }

    /// Locked principal, matured or not, until it is swept.
    pub fn locked(&self) -> u128 {
        self.locks.total()
    }
}

/// Result of `VestingLedger::locked_balances`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockedBalances {
    /// All locked principal, matured or not.
    pub total: u128,
    /// Matured locks awaiting `withdraw_expired_locks`.
    pub unlockable: u128,
    /// Locks still maturing.
    pub locked: u128,
    /// Entries still maturing, oldest first.
    pub entries: Vec<VestingEntry>,
}

/// Result of `VestingLedger::earned_balances`. Vested earnings are reported
/// by `unlocked_balance` instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EarnedBalances {
    pub total: u128,
    pub entries: Vec<VestingEntry>,
}

/// Result of `VestingLedger::withdrawable_balance`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawableBalance {
    /// Withdrawable without penalty: unlocked stake plus vested earnings.
    pub unlocked: u128,
    /// Withdrawable by taking unvested earnings at the penalty. This is what
    /// `exit` pays.
    pub max: u128,
    /// Forfeited when withdrawing `max`.
    pub penalty: u128,
}

/// A validated withdrawal, produced by `plan_withdraw` or `plan_exit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Withdrawal {
    /// Paid out to the account.
    pub amount: u128,
    /// Forfeited to locked stakers.
    pub penalty: u128,
    from_unlocked: u128,
    from_earnings: u128,
}

impl Withdrawal {
    /// Total removed from the account's staked balance.
    pub fn consumed(&self) -> u128 {
        self.from_unlocked + self.from_earnings
    }
}

/// Per-account balance records plus supply totals.
///
/// `total_supply == Σ (unlocked + locked + earned)` and
/// `locked_supply == Σ locked` hold after every call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VestingLedger {
    accounts: BTreeMap<Address, AccountBalances>,
    total_supply: u128,
    locked_supply: u128,
    lock_epochs: u64,
}

impl Default for VestingLedger {
    fn default() -> Self {
        Self::new(DEFAULT_LOCK_EPOCHS)
    }
}

impl VestingLedger {
    pub fn new(lock_epochs: u64) -> Self {
        Self {
            accounts: BTreeMap::new(),
            total_supply: 0,
            locked_supply: 0,
            lock_epochs,
        }
    }

    pub fn total_supply(&self) -> u128 {
        self.total_supply
    }

    pub fn locked_supply(&self) -> u128 {
        self.locked_supply
    }

    pub fn lock_epochs(&self) -> u64 {
        self.lock_epochs
    }

    /// Maturity of a lock or grant created at `now`.
    pub fn maturity_for(&self, now: Timestamp) -> Timestamp {
        maturity_after(now, self.lock_epochs)
    }

    pub fn account(&self, account: &Address) -> Option<&AccountBalances> {
        self.accounts.get(account)
    }

    pub fn accounts(&self) -> impl Iterator<Item = (&Address, &AccountBalances)> {
        self.accounts.iter()
    }

    /// Weight for non-native reward tokens.
    pub fn total_balance(&self, account: &Address) -> u128 {
        self.accounts.get(account).map_or(0, AccountBalances::total)
    }

    /// Weight for the native reward token.
    pub fn locked_balance(&self, account: &Address) -> u128 {
        self.accounts.get(account).map_or(0, AccountBalances::locked)
    }

    /// Add freely withdrawable stake.
    pub fn deposit_unlocked(&mut self, account: Address, amount: u128) -> Result<(), HarvestError> {
        let total_supply = add(self.total_supply, amount, "total supply")?;
        let balances = self.accounts.entry(account).or_default();
        balances.unlocked = add(balances.unlocked, amount, "unlocked balance")?;
        self.total_supply = total_supply;
        Ok(())
    }

    /// Lock `amount` until `maturity_for(now)`. Returns the maturity.
    pub fn lock(&mut self, account: Address, amount: u128, now: Timestamp) -> Result<Timestamp, HarvestError> {
        let maturity = self.maturity_for(now);
        let total_supply = add(self.total_supply, amount, "total supply")?;
        let locked_supply = add(self.locked_supply, amount, "locked supply")?;
        self.accounts
            .entry(account)
            .or_default()
            .locks
            .push(amount, maturity)?;
        self.total_supply = total_supply;
        self.locked_supply = locked_supply;
        Ok(maturity)
    }

    /// Grant `amount` of vesting earnings maturing at `maturity_for(now)`.
    /// Returns the maturity.
    pub fn grant(&mut self, account: Address, amount: u128, now: Timestamp) -> Result<Timestamp, HarvestError> {
        let maturity = self.maturity_for(now);
        let total_supply = add(self.total_supply, amount, "total supply")?;
        self.accounts
            .entry(account)
            .or_default()
            .earnings
            .push(amount, maturity)?;
        self.total_supply = total_supply;
        Ok(maturity)
    }

    /// Move every matured lock into `unlocked`. Returns the swept amount.
    pub fn sweep_expired_locks(&mut self, account: &Address, now: Timestamp) -> u128 {
        let Some(balances) = self.accounts.get_mut(account) else {
            return 0;
        };
        let swept = balances.locks.pop_matured(now);
        balances.unlocked += swept;
        self.locked_supply -= swept;
        swept
    }

    /// Remove `amount` of unlocked stake that is being paid out.
    pub fn release_unlocked(&mut self, account: &Address, amount: u128) -> Result<(), HarvestError> {
        let available = self.accounts.get(account).map_or(0, |b| b.unlocked);
        if amount > available {
            return Err(HarvestError::InsufficientUnlockedBalance {
                requested: amount,
                available,
            });
        }
        if let Some(balances) = self.accounts.get_mut(account) {
            balances.unlocked -= amount;
        }
        self.total_supply -= amount;
        Ok(())
    }

    /// Unlocked stake plus vested earnings.
    pub fn unlocked_balance(&self, account: &Address, now: Timestamp) -> u128 {
        self.accounts
            .get(account)
            .map_or(0, |b| b.unlocked + b.earnings.matured_total(now))
    }

    pub fn locked_balances(&self, account: &Address, now: Timestamp) -> LockedBalances {
        let Some(balances) = self.accounts.get(account) else {
            return LockedBalances {
                total: 0,
                unlockable: 0,
                locked: 0,
                entries: Vec::new(),
            };
        };
        let unlockable = balances.locks.matured_total(now);
        LockedBalances {
            total: balances.locks.total(),
            unlockable,
            locked: balances.locks.total() - unlockable,
            entries: balances.locks.unmatured(now).to_vec(),
        }
    }

    pub fn earned_balances(&self, account: &Address, now: Timestamp) -> EarnedBalances {
        match self.accounts.get(account) {
            Some(balances) => EarnedBalances {
                total: balances.earnings.unmatured_total(now),
                entries: balances.earnings.unmatured(now).to_vec(),
            },
            None => EarnedBalances {
                total: 0,
                entries: Vec::new(),
            },
        }
    }

    pub fn withdrawable_balance(&self, account: &Address, now: Timestamp) -> WithdrawableBalance {
        let Some(balances) = self.accounts.get(account) else {
            return WithdrawableBalance {
                unlocked: 0,
                max: 0,
                penalty: 0,
            };
        };
        let vested = balances.earnings.matured_total(now);
        let unvested = balances.earnings.total() - vested;
        let penalty = unvested / 2;
        let unlocked = balances.unlocked + vested;
        WithdrawableBalance {
            unlocked,
            max: unlocked + unvested - penalty,
            penalty,
        }
    }

    /// Validate a withdrawal of `amount` and work out what it consumes.
    ///
    /// Unlocked stake is used first, then vested earnings at full value, then
    /// unvested earnings oldest-first at two units consumed per unit paid.
    /// With an odd unvested total the last unit paid consumes only one, so
    /// withdrawing `withdrawable_balance().max` drains exactly what `exit` does.
    pub fn plan_withdraw(&self, account: &Address, amount: u128, now: Timestamp) -> Result<Withdrawal, HarvestError> {
        let empty = AccountBalances::default();
        let balances = self.accounts.get(account).unwrap_or(&empty);

        if amount <= balances.unlocked {
            return Ok(Withdrawal {
                amount,
                penalty: 0,
                from_unlocked: amount,
                from_earnings: 0,
            });
        }

        let shortfall = amount - balances.unlocked;
        let vested = balances.earnings.matured_total(now);
        let unvested = balances.earnings.total() - vested;

        if shortfall <= vested {
            return Ok(Withdrawal {
                amount,
                penalty: 0,
                from_unlocked: balances.unlocked,
                from_earnings: shortfall,
            });
        }
        if unvested == 0 {
            return Err(HarvestError::InsufficientUnlockedBalance {
                requested: amount,
                available: balances.unlocked + vested,
            });
        }

        // Paid out of unvested earnings; at most what `exit` would pay.
        let from_unvested = shortfall - vested;
        let payable = unvested - unvested / 2;
        if from_unvested > payable {
            return Err(HarvestError::InsufficientBalanceAfterPenalty {
                requested: amount,
                available: balances.unlocked + vested + payable,
            });
        }
        let consumed = from_unvested.saturating_mul(2).min(unvested);
        Ok(Withdrawal {
            amount,
            penalty: consumed - from_unvested,
            from_unlocked: balances.unlocked,
            from_earnings: vested + consumed,
        })
    }

    /// Drain unlocked stake and all earnings, unvested ones at the penalty.
    /// Locks are untouched.
    pub fn plan_exit(&self, account: &Address, now: Timestamp) -> Withdrawal {
        let Some(balances) = self.accounts.get(account) else {
            return Withdrawal {
                amount: 0,
                penalty: 0,
                from_unlocked: 0,
                from_earnings: 0,
            };
        };
        let unvested = balances.earnings.unmatured_total(now);
        let penalty = unvested / 2;
        Withdrawal {
            amount: balances.unlocked + balances.earnings.total() - penalty,
            penalty,
            from_unlocked: balances.unlocked,
            from_earnings: balances.earnings.total(),
        }
    }

    /// Apply a withdrawal produced by `plan_withdraw` or `plan_exit` against
    /// the current state.
    pub fn apply_withdrawal(&mut self, account: &Address, withdrawal: &Withdrawal) -> Result<(), HarvestError> {
        if withdrawal.consumed() == 0 {
            return Ok(());
        }
        let balances = self
            .accounts
            .get_mut(account)
            .ok_or_else(|| HarvestError::InvalidState("withdrawal from unknown account".to_string()))?;
        if balances.unlocked < withdrawal.from_unlocked {
            return Err(HarvestError::InvalidState(
                "withdrawal plan is stale".to_string(),
            ));
        }
        balances.earnings.consume_front(withdrawal.from_earnings)?;
        balances.unlocked -= withdrawal.from_unlocked;
        self.total_supply -= withdrawal.consumed();
        Ok(())
    }

    /// Recompute both supply totals from the account records.
    pub fn supplies_from_accounts(&self) -> (u128, u128) {
        self.accounts.values().fold((0, 0), |(total, locked), b| {
            (total + b.total(), locked + b.locked())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use harvest_core::EPOCH_SECONDS;

    const WEEK: u64 = EPOCH_SECONDS;
    // Mid-epoch start so ceil and floor differ.
    const T0: Timestamp = WEEK * 2_800 + 3_600;

    fn alice() -> Address {
        Address::from_label("alice")
    }

    fn assert_supplies(ledger: &VestingLedger) {
        assert_eq!(
            ledger.supplies_from_accounts(),
            (ledger.total_supply(), ledger.locked_supply())
        );
    }

    #[test]
    fn test_queue_merges_same_maturity() {
        let mut queue = VestingQueue::new();
        queue.push(10, 100).unwrap();
        queue.push(5, 100).unwrap();
        queue.push(7, 200).unwrap();
        assert_eq!(
            queue.entries(),
            &[
                VestingEntry { amount: 15, maturity: 100 },
                VestingEntry { amount: 7, maturity: 200 }
            ]
        );
        assert_eq!(queue.total(), 22);
    }

    #[test]
    fn test_queue_pop_matured_advances_head() {
        let mut queue = VestingQueue::new();
        queue.push(10, 100).unwrap();
        queue.push(20, 200).unwrap();
        queue.push(30, 300).unwrap();
        assert_eq!(queue.pop_matured(99), 0);
        assert_eq!(queue.pop_matured(200), 30);
        assert_eq!(queue.entries(), &[VestingEntry { amount: 30, maturity: 300 }]);
        assert_eq!(queue.pop_matured(1_000), 30);
        assert!(queue.is_empty());
        assert!(queue.entries().is_empty());
    }

    #[test]
    fn test_queue_consume_front_splits_entry() {
        let mut queue = VestingQueue::new();
        queue.push(10, 100).unwrap();
        queue.push(20, 200).unwrap();
        queue.consume_front(15).unwrap();
        assert_eq!(queue.entries(), &[VestingEntry { amount: 15, maturity: 200 }]);
        assert!(queue.consume_front(16).is_err());
        queue.consume_front(15).unwrap();
        assert!(queue.is_empty());
    }

    #[test]
    fn test_queue_compacts_long_histories() {
        let mut queue = VestingQueue::new();
        for i in 0..100u64 {
            queue.push(1, i).unwrap();
        }
        queue.pop_matured(80);
        assert_eq!(queue.entries().len(), 19);
        assert_eq!(queue.total(), 19);
        queue.push(1, 1_000).unwrap();
        assert_eq!(queue.entries().last().map(|e| e.maturity), Some(1_000));
    }

    #[test]
    fn test_lock_view() {
        let mut ledger = VestingLedger::default();
        let maturity = ledger.lock(alice(), 10_000, T0).unwrap();
        assert_eq!(maturity, WEEK * 2_814);
        assert_eq!(
            ledger.locked_balances(&alice(), T0),
            LockedBalances {
                total: 10_000,
                unlockable: 0,
                locked: 10_000,
                entries: vec![VestingEntry { amount: 10_000, maturity }],
            }
        );
        assert_eq!(ledger.locked_supply(), 10_000);
        assert_supplies(&ledger);
    }

    #[test]
    fn test_sweep_moves_locks_to_unlocked() {
        let mut ledger = VestingLedger::default();
        let maturity = ledger.lock(alice(), 10_000, T0).unwrap();
        assert_eq!(ledger.sweep_expired_locks(&alice(), maturity - 1), 0);
        assert_eq!(ledger.sweep_expired_locks(&alice(), maturity), 10_000);
        assert_eq!(ledger.locked_supply(), 0);
        assert_eq!(ledger.total_supply(), 10_000);
        assert_eq!(ledger.unlocked_balance(&alice(), maturity), 10_000);
        assert_supplies(&ledger);
    }

    #[test]
    fn test_grants_bucket_by_epoch() {
        let mut ledger = VestingLedger::default();
        let m = ledger.grant(alice(), 30_000, T0).unwrap();
        ledger.grant(alice(), 50_000, T0 + WEEK).unwrap();
        ledger.grant(alice(), 40_000, T0 + WEEK).unwrap();
        ledger.grant(alice(), 20_000, T0 + WEEK * 3).unwrap();
        assert_eq!(
            ledger.earned_balances(&alice(), T0 + WEEK * 3),
            EarnedBalances {
                total: 140_000,
                entries: vec![
                    VestingEntry { amount: 30_000, maturity: m },
                    VestingEntry { amount: 90_000, maturity: m + WEEK },
                    VestingEntry { amount: 20_000, maturity: m + WEEK * 3 },
                ],
            }
        );
        assert_eq!(ledger.locked_supply(), 0);
        let withdrawable = ledger.withdrawable_balance(&alice(), T0 + WEEK * 3);
        assert_eq!(withdrawable.max, 70_000);
        assert_eq!(withdrawable.penalty, 70_000);
    }

    #[test]
    fn test_withdraw_penalty_boundary() {
        let mut ledger = VestingLedger::default();
        ledger.deposit_unlocked(alice(), 10_000).unwrap();
        ledger.grant(alice(), 30_000, T0).unwrap();

        assert!(matches!(
            ledger.plan_withdraw(&alice(), 25_001, T0),
            Err(HarvestError::InsufficientBalanceAfterPenalty { .. })
        ));
        let plan = ledger.plan_withdraw(&alice(), 25_000, T0).unwrap();
        assert_eq!(plan.amount, 25_000);
        assert_eq!(plan.penalty, 15_000);
        ledger.apply_withdrawal(&alice(), &plan).unwrap();
        assert_eq!(ledger.total_supply(), 0);
        assert_eq!(ledger.earned_balances(&alice(), T0).total, 0);
        assert_supplies(&ledger);
    }

    #[test]
    fn test_withdraw_max_with_odd_unvested_matches_exit() {
        let mut ledger = VestingLedger::default();
        ledger.deposit_unlocked(alice(), 10).unwrap();
        ledger.grant(alice(), 3, T0).unwrap();

        let max = ledger.withdrawable_balance(&alice(), T0).max;
        assert_eq!(max, 12);
        assert_eq!(
            ledger.plan_withdraw(&alice(), max + 1, T0),
            Err(HarvestError::InsufficientBalanceAfterPenalty { requested: 13, available: 12 })
        );
        let plan = ledger.plan_withdraw(&alice(), max, T0).unwrap();
        assert_eq!(plan, ledger.plan_exit(&alice(), T0));
        assert_eq!(plan.penalty, 1);
        assert_eq!(plan.consumed(), 13);

        // Below the ceiling every paid unit still costs two.
        assert_eq!(ledger.plan_withdraw(&alice(), 11, T0).unwrap().penalty, 1);

        ledger.apply_withdrawal(&alice(), &plan).unwrap();
        assert_eq!(ledger.total_supply(), 0);
        assert_supplies(&ledger);
    }

    #[test]
    fn test_withdraw_without_earnings_fails_unlocked() {
        let mut ledger = VestingLedger::default();
        ledger.deposit_unlocked(alice(), 100).unwrap();
        assert!(matches!(
            ledger.plan_withdraw(&alice(), 101, T0),
            Err(HarvestError::InsufficientUnlockedBalance { requested: 101, available: 100 })
        ));
    }

    #[test]
    fn test_withdraw_uses_vested_before_unvested() {
        let mut ledger = VestingLedger::default();
        let m = ledger.grant(alice(), 30_000, T0).unwrap();
        ledger.grant(alice(), 60_000, T0 + WEEK).unwrap();
        let now = m + 1;
        assert_eq!(ledger.unlocked_balance(&alice(), now), 30_000);

        assert!(ledger.plan_withdraw(&alice(), 60_001, now).is_err());
        let plan = ledger.plan_withdraw(&alice(), 60_000, now).unwrap();
        assert_eq!(plan.penalty, 30_000);
        ledger.apply_withdrawal(&alice(), &plan).unwrap();
        assert_eq!(ledger.total_supply(), 0);
    }

    #[test]
    fn test_exit_forfeits_half_of_unvested() {
        let mut ledger = VestingLedger::default();
        ledger.deposit_unlocked(alice(), 10_000).unwrap();
        ledger.lock(alice(), 5_000, T0).unwrap();
        ledger.grant(alice(), 30_000, T0).unwrap();
        ledger.grant(alice(), 60_000, T0 + WEEK).unwrap();

        let plan = ledger.plan_exit(&alice(), T0 + WEEK);
        assert_eq!(plan.amount, 55_000);
        assert_eq!(plan.penalty, 45_000);
        ledger.apply_withdrawal(&alice(), &plan).unwrap();
        assert_eq!(ledger.total_balance(&alice()), 5_000);
        assert_eq!(ledger.locked_supply(), 5_000);
        assert_supplies(&ledger);
    }

    #[test]
    fn test_unknown_account_views_are_empty() {
        let ledger = VestingLedger::default();
        assert_eq!(ledger.total_balance(&alice()), 0);
        assert_eq!(ledger.plan_exit(&alice(), T0).amount, 0);
        assert_eq!(ledger.withdrawable_balance(&alice(), T0).max, 0);
    }
}
