// crates/harvest-economics/src/distributor.rs
//
// Reward distributor: staking, vesting grants, and multi-token reward streaming.
//
// Stakers deposit the native token either unlocked or locked for 13 epochs.
// Registered minters (the pool allocator, an airdrop claimer, the owner)
// grant vesting native tokens through `mint`. Any number of reward tokens can
// be registered and streamed to stakers over one epoch per notification.
//
// Reward weights:
//   - native token: locked balance only, fed exclusively by early-withdrawal
//     penalties
//   - every other token: total balance (unlocked + locked + earned)
//
// Every entry point that changes a weighted balance or pays rewards settles
// the caller's checkpoint for all reward tokens, in registration order,
// before touching balances. Operations validate first, then move tokens on
// the ledger, then commit state, so a failing call leaves nothing changed
// apart from value-preserving checkpoint settlement.

use std::collections::{BTreeMap, BTreeSet};

use harvest_core::math::add;
use harvest_core::{Address, HarvestError, RewardMinter, Timestamp, TokenLedger};

use crate::accumulator::{RewardCheckpoint, RewardStream};
use crate::config::DistributorConfig;
use crate::vesting::{
    EarnedBalances, LockedBalances, VestingLedger, WithdrawableBalance, Withdrawal,
};

/// Index of the native token in the reward registry.
const NATIVE: usize = 0;

/// A registered reward token and its stream.
#[derive(Debug, Clone)]
pub struct RewardToken {
    pub token: Address,
    pub stream: RewardStream,
    /// Accounts allowed to notify new rewards for this token.
    distributors: BTreeSet<Address>,
}

impl RewardToken {
    pub fn is_distributor(&self, account: &Address) -> bool {
        self.distributors.contains(account)
    }
}

/// Reward amount owed or paid for one token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenAmount {
    pub token: Address,
    pub amount: u128,
}

/// Multi-token staking reward distributor.
#[derive(Debug, Clone)]
pub struct RewardDistributor {
    /// Custody account on the token ledger.
    address: Address,
    owner: Address,
    native_token: Address,
    reward_duration: u64,
    balances: VestingLedger,
    /// Registration order; the native token is always first.
    rewards: Vec<RewardToken>,
    minters: BTreeSet<Address>,
    /// (token, account) -> checkpoint.
    checkpoints: BTreeMap<(Address, Address), RewardCheckpoint>,
}

impl RewardDistributor {
    /// Create a distributor with custody at `address` and the native token
    /// pre-registered as reward token 0.
    pub fn new(
        address: Address,
        owner: Address,
        native_token: Address,
        minters: impl IntoIterator<Item = Address>,
        config: &DistributorConfig,
        now: Timestamp,
    ) -> Self {
        let native = RewardToken {
            token: native_token,
            stream: RewardStream::new(config.reward_duration_secs, now),
            distributors: BTreeSet::new(),
        };
        Self {
            address,
            owner,
            native_token,
            reward_duration: config.reward_duration_secs,
            balances: VestingLedger::new(config.lock_epochs),
            rewards: vec![native],
            minters: minters.into_iter().collect(),
            checkpoints: BTreeMap::new(),
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    pub fn native_token(&self) -> Address {
        self.native_token
    }

    pub fn is_minter(&self, account: &Address) -> bool {
        self.minters.contains(account)
    }

    /// Underlying balance records.
    pub fn vesting(&self) -> &VestingLedger {
        &self.balances
    }

    // ------------------------------------------------------------------
    // Administration
    // ------------------------------------------------------------------

    /// Register `token` as a reward token notifiable by `distributor`.
    ///
    /// # Errors
    /// - `UnauthorizedCaller` if `caller` is not the owner.
    /// - `DuplicateRewardToken` if `token` is already registered (the native
    ///   token always is).
    pub fn add_reward(
        &mut self,
        caller: Address,
        token: Address,
        distributor: Address,
        now: Timestamp,
    ) -> Result<(), HarvestError> {
        self.require_owner(caller, "add reward token")?;
        if self.reward_index(&token).is_some() {
            return Err(HarvestError::DuplicateRewardToken(token));
        }
        self.rewards.push(RewardToken {
            token,
            stream: RewardStream::new(self.reward_duration, now),
            distributors: BTreeSet::from([distributor]),
        });
        tracing::info!(
            "Registered reward token {} (distributor {})",
            token.short(),
            distributor.short()
        );
        Ok(())
    }

    /// Grant or revoke `distributor`'s right to notify rewards for `token`.
    pub fn approve_reward_distributor(
        &mut self,
        caller: Address,
        token: Address,
        distributor: Address,
        approved: bool,
    ) -> Result<(), HarvestError> {
        self.require_owner(caller, "approve reward distributor")?;
        let index = self.require_reward_index(&token)?;
        if index == NATIVE {
            return Err(HarvestError::unauthorized(
                caller,
                "native rewards are funded by penalties only",
            ));
        }
        let distributors = &mut self.rewards[index].distributors;
        if approved {
            distributors.insert(distributor);
        } else {
            distributors.remove(&distributor);
        }
        Ok(())
    }

    /// Send `amount` of a token that is neither staked nor a reward back to the owner.
    pub fn recover_token(
        &mut self,
        caller: Address,
        ledger: &mut dyn TokenLedger,
        token: Address,
        amount: u128,
    ) -> Result<(), HarvestError> {
        self.require_owner(caller, "recover token")?;
        if self.reward_index(&token).is_some() {
            return Err(HarvestError::InvalidState(format!(
                "cannot recover reward or staking token {}",
                token
            )));
        }
        ledger.transfer(&token, &self.address, &self.owner, amount)?;
        tracing::info!("Recovered {} of token {}", amount, token.short());
        Ok(())
    }

    // ------------------------------------------------------------------
    // Reward funding
    // ------------------------------------------------------------------

    /// Pull `amount` of `token` from `caller` and stream it to stakers over
    /// the next reward duration.
    ///
    /// # Errors
    /// - `UnknownRewardToken` if `token` was never registered.
    /// - `UnauthorizedCaller` for the native token, or if `caller` is not an
    ///   approved distributor of `token`.
    /// - `InvalidAmount` for a zero amount.
    pub fn notify_reward_amount(
        &mut self,
        caller: Address,
        ledger: &mut dyn TokenLedger,
        token: Address,
        amount: u128,
        now: Timestamp,
    ) -> Result<(), HarvestError> {
        let index = self.require_reward_index(&token)?;
        if index == NATIVE || !self.rewards[index].is_distributor(&caller) {
            return Err(HarvestError::unauthorized(caller, "notify reward amount"));
        }
        if amount == 0 {
            return Err(HarvestError::InvalidAmount(
                "reward notification must be non-zero".to_string(),
            ));
        }

        let mut stream = self.rewards[index].stream.clone();
        stream.notify(amount, self.total_weight(index), now)?;
        ledger.transfer_from(&token, &self.address, &caller, &self.address, amount)?;
        self.rewards[index].stream = stream;

        tracing::info!(
            "Notified {} of reward token {} (rate {}/s until {})",
            amount,
            token.short(),
            self.rewards[index].stream.rate(),
            self.rewards[index].stream.period_finish()
        );
        Ok(())
    }

    // ------------------------------------------------------------------
    // Staking
    // ------------------------------------------------------------------

    /// Pull `amount` of the native token from `caller` and stake it, locked
    /// for the lock period if `lock` is set.
    pub fn stake(
        &mut self,
        caller: Address,
        ledger: &mut dyn TokenLedger,
        amount: u128,
        lock: bool,
        now: Timestamp,
    ) -> Result<(), HarvestError> {
        if amount == 0 {
            return Err(HarvestError::InvalidAmount("cannot stake 0".to_string()));
        }
        add(self.balances.total_supply(), amount, "total supply")?;

        self.settle_account(caller, now)?;
        ledger.transfer_from(
            &self.native_token,
            &self.address,
            &caller,
            &self.address,
            amount,
        )?;
        if lock {
            let maturity = self.balances.lock(caller, amount, now)?;
            tracing::info!(
                "Staked {} locked for {} until {}",
                amount,
                caller.short(),
                maturity
            );
        } else {
            self.balances.deposit_unlocked(caller, amount)?;
            tracing::info!("Staked {} unlocked for {}", amount, caller.short());
        }
        Ok(())
    }

    /// Mint `amount` of the native token into custody as a vesting grant for
    /// `account`. Minting zero succeeds without effect.
    ///
    /// # Errors
    /// Returns `UnauthorizedCaller` if `caller` is not a registered minter.
    pub fn mint(
        &mut self,
        caller: Address,
        ledger: &mut dyn TokenLedger,
        account: Address,
        amount: u128,
        now: Timestamp,
    ) -> Result<(), HarvestError> {
        if !self.is_minter(&caller) {
            return Err(HarvestError::unauthorized(caller, "mint vesting rewards"));
        }
        if amount == 0 {
            return Ok(());
        }
        add(self.balances.total_supply(), amount, "total supply")?;

        self.settle_account(account, now)?;
        ledger.mint(&self.native_token, &self.address, &self.address, amount)?;
        let maturity = self.balances.grant(account, amount, now)?;
        tracing::info!(
            "Minted {} vesting to {} until {}",
            amount,
            account.short(),
            maturity
        );
        Ok(())
    }

    /// Withdraw `amount`, drawing on vested and then unvested earnings if the
    /// unlocked balance is short. Penalties are streamed to locked stakers.
    ///
    /// # Errors
    /// - `InvalidAmount` for a zero amount.
    /// - `InsufficientUnlockedBalance` if the shortfall exceeds vested
    ///   earnings and nothing is unvested.
    /// - `InsufficientBalanceAfterPenalty` if even all unvested earnings at
    ///   the penalty cannot cover the shortfall.
    pub fn withdraw(
        &mut self,
        caller: Address,
        ledger: &mut dyn TokenLedger,
        amount: u128,
        now: Timestamp,
    ) -> Result<Withdrawal, HarvestError> {
        if amount == 0 {
            return Err(HarvestError::InvalidAmount("cannot withdraw 0".to_string()));
        }
        let plan = self.balances.plan_withdraw(&caller, amount, now)?;
        self.execute_withdrawal(caller, ledger, plan, now)?;
        tracing::info!(
            "Withdrew {} for {} (penalty {})",
            plan.amount,
            caller.short(),
            plan.penalty
        );
        Ok(plan)
    }

    /// Withdraw all unlocked stake and all earnings, unvested earnings at the
    /// penalty. Locked stake is untouched.
    pub fn exit(
        &mut self,
        caller: Address,
        ledger: &mut dyn TokenLedger,
        now: Timestamp,
    ) -> Result<Withdrawal, HarvestError> {
        let plan = self.balances.plan_exit(&caller, now);
        self.execute_withdrawal(caller, ledger, plan, now)?;
        tracing::info!(
            "Exited {}: paid {}, penalty {}",
            caller.short(),
            plan.amount,
            plan.penalty
        );
        Ok(plan)
    }

    /// Pay out every matured lock of `caller`. Returns the amount paid.
    pub fn withdraw_expired_locks(
        &mut self,
        caller: Address,
        ledger: &mut dyn TokenLedger,
        now: Timestamp,
    ) -> Result<u128, HarvestError> {
        let amount = self.balances.locked_balances(&caller, now).unlockable;
        if amount == 0 {
            return Ok(0);
        }

        self.settle_account(caller, now)?;
        ledger.transfer(&self.native_token, &self.address, &caller, amount)?;
        let swept = self.balances.sweep_expired_locks(&caller, now);
        self.balances.release_unlocked(&caller, swept)?;

        tracing::info!("Withdrew {} of expired locks for {}", swept, caller.short());
        Ok(swept)
    }

    /// Pay `caller` everything earned on every reward token. Tokens with
    /// nothing owed are skipped.
    pub fn get_reward(
        &mut self,
        caller: Address,
        ledger: &mut dyn TokenLedger,
        now: Timestamp,
    ) -> Result<Vec<TokenAmount>, HarvestError> {
        self.settle_account(caller, now)?;

        let owed: Vec<TokenAmount> = self
            .rewards
            .iter()
            .map(|reward| TokenAmount {
                token: reward.token,
                amount: self.checkpoint(&reward.token, &caller).pending,
            })
            .collect();

        for entry in owed.iter().filter(|e| e.amount > 0) {
            let available = ledger.balance_of(&entry.token, &self.address);
            if available < entry.amount {
                return Err(HarvestError::InsufficientFunds {
                    token: entry.token,
                    account: self.address,
                    requested: entry.amount,
                    available,
                });
            }
        }

        for entry in owed.iter().filter(|e| e.amount > 0) {
            ledger.transfer(&entry.token, &self.address, &caller, entry.amount)?;
            if let Some(checkpoint) = self.checkpoints.get_mut(&(entry.token, caller)) {
                checkpoint.pending = 0;
            }
            tracing::info!(
                "Paid {} of reward token {} to {}",
                entry.amount,
                entry.token.short(),
                caller.short()
            );
        }
        Ok(owed)
    }

    // ------------------------------------------------------------------
    // Views
    // ------------------------------------------------------------------

    /// What `get_reward` would pay `account` at `now`, for every registered
    /// token in registration order.
    pub fn claimable_rewards(
        &self,
        account: &Address,
        now: Timestamp,
    ) -> Result<Vec<TokenAmount>, HarvestError> {
        self.rewards
            .iter()
            .enumerate()
            .map(|(index, reward)| {
                let amount = reward.stream.earned(
                    &self.checkpoint(&reward.token, account),
                    self.weight(index, account),
                    self.total_weight(index),
                    now,
                )?;
                Ok(TokenAmount {
                    token: reward.token,
                    amount,
                })
            })
            .collect()
    }

    pub fn reward_tokens(&self) -> Vec<Address> {
        self.rewards.iter().map(|r| r.token).collect()
    }

    pub fn reward_data(&self, token: &Address) -> Option<&RewardToken> {
        self.rewards.iter().find(|r| r.token == *token)
    }

    pub fn reward_per_token(&self, token: &Address, now: Timestamp) -> Result<u128, HarvestError> {
        let index = self.require_reward_index(token)?;
        self.rewards[index]
            .stream
            .reward_per_token(self.total_weight(index), now)
    }

    pub fn last_time_reward_applicable(&self, token: &Address, now: Timestamp) -> Result<Timestamp, HarvestError> {
        let index = self.require_reward_index(token)?;
        Ok(self.rewards[index].stream.last_time_applicable(now))
    }

    pub fn reward_for_duration(&self, token: &Address) -> Result<u128, HarvestError> {
        let index = self.require_reward_index(token)?;
        Ok(self.rewards[index].stream.reward_for_duration())
    }

    pub fn total_supply(&self) -> u128 {
        self.balances.total_supply()
    }

    pub fn locked_supply(&self) -> u128 {
        self.balances.locked_supply()
    }

    pub fn total_balance(&self, account: &Address) -> u128 {
        self.balances.total_balance(account)
    }

    pub fn unlocked_balance(&self, account: &Address, now: Timestamp) -> u128 {
        self.balances.unlocked_balance(account, now)
    }

    pub fn locked_balances(&self, account: &Address, now: Timestamp) -> LockedBalances {
        self.balances.locked_balances(account, now)
    }

    pub fn earned_balances(&self, account: &Address, now: Timestamp) -> EarnedBalances {
        self.balances.earned_balances(account, now)
    }

    pub fn withdrawable_balance(&self, account: &Address, now: Timestamp) -> WithdrawableBalance {
        self.balances.withdrawable_balance(account, now)
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn require_owner(&self, caller: Address, action: &str) -> Result<(), HarvestError> {
        if caller != self.owner {
            return Err(HarvestError::unauthorized(caller, action));
        }
        Ok(())
    }

    fn reward_index(&self, token: &Address) -> Option<usize> {
        self.rewards.iter().position(|r| r.token == *token)
    }

    fn require_reward_index(&self, token: &Address) -> Result<usize, HarvestError> {
        self.reward_index(token)
            .ok_or(HarvestError::UnknownRewardToken(*token))
    }

    fn weight(&self, index: usize, account: &Address) -> u128 {
        if index == NATIVE {
            self.balances.locked_balance(account)
        } else {
            self.balances.total_balance(account)
        }
    }

    fn total_weight(&self, index: usize) -> u128 {
        if index == NATIVE {
            self.balances.locked_supply()
        } else {
            self.balances.total_supply()
        }
    }

    fn checkpoint(&self, token: &Address, account: &Address) -> RewardCheckpoint {
        self.checkpoints
            .get(&(*token, *account))
            .copied()
            .unwrap_or_default()
    }

    /// Bring every stream forward to `now` and settle `account` against each,
    /// in registration order.
    fn settle_account(&mut self, account: Address, now: Timestamp) -> Result<(), HarvestError> {
        for index in 0..self.rewards.len() {
            let total_weight = self.total_weight(index);
            let weight = self.weight(index, &account);
            let reward = &mut self.rewards[index];
            reward.stream.update(total_weight, now)?;
            let checkpoint = self
                .checkpoints
                .entry((reward.token, account))
                .or_default();
            reward.stream.settle(checkpoint, weight)?;
            tracing::debug!(
                "Settled {} on token {}: pending {}",
                account.short(),
                reward.token.short(),
                checkpoint.pending
            );
        }
        Ok(())
    }

    /// Settle, stage the penalty notification, pay out, then commit.
    fn execute_withdrawal(
        &mut self,
        caller: Address,
        ledger: &mut dyn TokenLedger,
        plan: Withdrawal,
        now: Timestamp,
    ) -> Result<(), HarvestError> {
        if plan.consumed() == 0 {
            return Ok(());
        }
        self.settle_account(caller, now)?;

        let native_stream = if plan.penalty > 0 {
            let mut stream = self.rewards[NATIVE].stream.clone();
            stream.notify(plan.penalty, self.balances.locked_supply(), now)?;
            Some(stream)
        } else {
            None
        };

        if plan.amount > 0 {
            ledger.transfer(&self.native_token, &self.address, &caller, plan.amount)?;
        }
        self.balances.apply_withdrawal(&caller, &plan)?;
        if let Some(stream) = native_stream {
            self.rewards[NATIVE].stream = stream;
            tracing::info!("Redistributing penalty {} to locked stakers", plan.penalty);
        }
        Ok(())
    }
}

impl RewardMinter for RewardDistributor {
    fn mint(
        &mut self,
        caller: Address,
        ledger: &mut dyn TokenLedger,
        account: Address,
        amount: u128,
        now: Timestamp,
    ) -> Result<(), HarvestError> {
        RewardDistributor::mint(self, caller, ledger, account, amount, now)
    }
}
