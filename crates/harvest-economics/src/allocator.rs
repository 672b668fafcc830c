// crates/harvest-economics/src/allocator.rs
//
// Pool allocator: streams scheduled emissions to liquidity-pool depositors.
//
// Emission per second follows an `EmissionSchedule` measured from `start`.
// Pool 0 is the reserved pool and receives a fixed share of every second's
// emission (`reserved_pool_share_bps`). The remainder is split across pools
// 1.. in proportion to their derived weight:
//
//   weight = deposited balance                          (no oracle)
//   weight = deposited balance * answer / 10^decimals   (oracle attached)
//
// The deposited balance is always read from the token ledger; weights are
// never stored. Each pool keeps a masterchef accumulator
// `acc_reward_per_share` (scaled by 1e12) and each depositor a reward debt.
// Earned rewards are delivered by minting vesting grants through a
// `RewardMinter`.
//
// Every mutating call first settles all pools with one weight snapshot taken
// before the call changes any balance.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use harvest_core::math::{add, mul_div};
use harvest_core::{
    Address, HarvestError, PriceOracle, RewardMinter, Timestamp, TokenLedger, BPS_DENOMINATOR,
};

use crate::config::AllocatorConfig;
use crate::emission::EmissionSchedule;

/// Fixed-point scale of `acc_reward_per_share`.
pub const ACC_PRECISION: u128 = 1_000_000_000_000;

/// Id of the reserved pool created at construction.
pub const RESERVED_POOL: usize = 0;

#[derive(Debug, Clone)]
struct Pool {
    token: Address,
    oracle: Option<usize>,
    acc_reward_per_share: u128,
    last_reward_time: Timestamp,
}

/// Snapshot of one pool, with its weight derived at the time of the call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolInfo {
    pub token: Address,
    pub alloc_weight: u128,
    pub acc_reward_per_share: u128,
    pub last_reward_time: Timestamp,
    pub oracle: Option<usize>,
}

/// A depositor's position in one pool.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    pub amount: u128,
    pub reward_debt: u128,
    /// Reward settled on earlier deposits or withdrawals and not yet claimed.
    pub claimable: u128,
}

/// Emission allocator over a set of deposit pools.
pub struct PoolAllocator {
    /// Custody account on the token ledger and identity towards the minter.
    address: Address,
    owner: Address,
    schedule: EmissionSchedule,
    start_time: Option<Timestamp>,
    pools: Vec<Pool>,
    /// (pool id, account) -> position.
    users: BTreeMap<(usize, Address), UserInfo>,
    oracles: Vec<Arc<dyn PriceOracle>>,
    reserved_share_bps: u128,
    oracle_denominator: u128,
    max_mintable: Option<u128>,
    minted: u128,
}

impl fmt::Debug for PoolAllocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PoolAllocator")
            .field("address", &self.address)
            .field("start_time", &self.start_time)
            .field("pools", &self.pools)
            .field("oracles", &self.oracles.len())
            .field("minted", &self.minted)
            .finish()
    }
}

impl PoolAllocator {
    /// Create an allocator with custody at `address` and the reserved pool
    /// for `reserved_token` as pool 0.
    ///
    /// # Errors
    /// Returns `HarvestError::Config` if the configured schedule or oracle
    /// decimals are invalid.
    pub fn new(
        address: Address,
        owner: Address,
        reserved_token: Address,
        config: &AllocatorConfig,
        now: Timestamp,
    ) -> Result<Self, HarvestError> {
        let reserved_share_bps = config.reserved_pool_share_bps as u128;
        if reserved_share_bps > BPS_DENOMINATOR {
            return Err(HarvestError::Config(format!(
                "reserved_pool_share_bps {} exceeds {}",
                reserved_share_bps, BPS_DENOMINATOR
            )));
        }
        Ok(Self {
            address,
            owner,
            schedule: config.emission_schedule()?,
            start_time: None,
            pools: vec![Pool {
                token: reserved_token,
                oracle: None,
                acc_reward_per_share: 0,
                last_reward_time: now,
            }],
            users: BTreeMap::new(),
            oracles: Vec::new(),
            reserved_share_bps,
            oracle_denominator: config.oracle_denominator()?,
            max_mintable: config.max_mintable_tokens,
            minted: 0,
        })
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn start_time(&self) -> Option<Timestamp> {
        self.start_time
    }

    pub fn pool_length(&self) -> usize {
        self.pools.len()
    }

    pub fn minted_tokens(&self) -> u128 {
        self.minted
    }

    pub fn schedule(&self) -> &EmissionSchedule {
        &self.schedule
    }

    // ------------------------------------------------------------------
    // Administration
    // ------------------------------------------------------------------

    /// Register a pool for `token`. Returns the new pool id.
    ///
    /// `init_weight` is accepted for interface compatibility only; the weight
    /// of a pool is always derived from its deposits.
    pub fn add_pool(
        &mut self,
        caller: Address,
        ledger: &dyn TokenLedger,
        token: Address,
        init_weight: u128,
        now: Timestamp,
    ) -> Result<usize, HarvestError> {
        self.require_owner(caller, "add pool")?;
        if self.pools.iter().any(|p| p.token == token) {
            return Err(HarvestError::InvalidState(format!(
                "pool for token {} already exists",
                token
            )));
        }
        self.settle_pools(ledger, None, now)?;
        self.pools.push(Pool {
            token,
            oracle: None,
            acc_reward_per_share: 0,
            last_reward_time: now,
        });
        let pid = self.pools.len() - 1;
        tracing::info!(
            "Added pool {} for token {} (initial weight {} ignored)",
            pid,
            token.short(),
            init_weight
        );
        Ok(pid)
    }

    /// Register a price oracle. Returns its id.
    pub fn add_oracle(&mut self, caller: Address, oracle: Arc<dyn PriceOracle>) -> Result<usize, HarvestError> {
        self.require_owner(caller, "add oracle")?;
        self.oracles.push(oracle);
        Ok(self.oracles.len() - 1)
    }

    /// Attach an oracle to a pool, or detach with `None`. The reserved pool
    /// has a fixed share and takes no oracle.
    pub fn set_pool_oracle(
        &mut self,
        caller: Address,
        ledger: &dyn TokenLedger,
        pid: usize,
        oracle: Option<usize>,
        now: Timestamp,
    ) -> Result<(), HarvestError> {
        self.require_owner(caller, "set pool oracle")?;
        self.require_pool(pid)?;
        if pid == RESERVED_POOL {
            return Err(HarvestError::InvalidState(
                "reserved pool has a fixed share".to_string(),
            ));
        }
        if let Some(id) = oracle {
            if id >= self.oracles.len() {
                return Err(HarvestError::OracleNotFound(id));
            }
        }
        self.settle_pools(ledger, None, now)?;
        self.pools[pid].oracle = oracle;
        Ok(())
    }

    /// Begin emissions. May only be called once.
    pub fn start(&mut self, caller: Address, now: Timestamp) -> Result<(), HarvestError> {
        self.require_owner(caller, "start emissions")?;
        if let Some(started) = self.start_time {
            return Err(HarvestError::InvalidState(format!(
                "emissions already started at {}",
                started
            )));
        }
        self.start_time = Some(now);
        for pool in &mut self.pools {
            pool.last_reward_time = now;
        }
        tracing::info!("Emissions started at {}", now);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Depositor operations
    // ------------------------------------------------------------------

    /// Deposit `amount` of the pool's token from `caller`.
    pub fn deposit(
        &mut self,
        caller: Address,
        ledger: &mut dyn TokenLedger,
        pid: usize,
        amount: u128,
        now: Timestamp,
    ) -> Result<(), HarvestError> {
        self.require_pool(pid)?;
        if amount == 0 {
            return Err(HarvestError::InvalidAmount("cannot deposit 0".to_string()));
        }
        self.settle_pools(&*ledger, None, now)?;
        let mut user = self.settled_user(pid, &caller)?;
        let token = self.pools[pid].token;

        ledger.transfer_from(&token, &self.address, &caller, &self.address, amount)?;
        user.amount = add(user.amount, amount, "pool deposit")?;
        user.reward_debt = mul_div(user.amount, self.pools[pid].acc_reward_per_share, ACC_PRECISION)?;
        self.users.insert((pid, caller), user);

        tracing::info!("Deposited {} into pool {} for {}", amount, pid, caller.short());
        Ok(())
    }

    /// Withdraw `amount` of the pool's token back to `caller`. Earned rewards
    /// stay claimable.
    pub fn withdraw(
        &mut self,
        caller: Address,
        ledger: &mut dyn TokenLedger,
        pid: usize,
        amount: u128,
        now: Timestamp,
    ) -> Result<(), HarvestError> {
        self.require_pool(pid)?;
        if amount == 0 {
            return Err(HarvestError::InvalidAmount("cannot withdraw 0".to_string()));
        }
        let token = self.pools[pid].token;
        let deposited = self.user_info(pid, &caller).amount;
        if amount > deposited {
            return Err(HarvestError::InsufficientFunds {
                token,
                account: caller,
                requested: amount,
                available: deposited,
            });
        }

        self.settle_pools(&*ledger, None, now)?;
        let mut user = self.settled_user(pid, &caller)?;
        ledger.transfer(&token, &self.address, &caller, amount)?;
        user.amount -= amount;
        user.reward_debt = mul_div(user.amount, self.pools[pid].acc_reward_per_share, ACC_PRECISION)?;
        self.users.insert((pid, caller), user);

        tracing::info!("Withdrew {} from pool {} for {}", amount, pid, caller.short());
        Ok(())
    }

    /// Mint everything `caller` has earned in `pids` as a vesting grant.
    /// Repeated ids add nothing. Returns the amount minted.
    pub fn claim(
        &mut self,
        caller: Address,
        ledger: &mut dyn TokenLedger,
        minter: &mut dyn RewardMinter,
        pids: &[usize],
        now: Timestamp,
    ) -> Result<u128, HarvestError> {
        for pid in pids {
            self.require_pool(*pid)?;
        }
        self.settle_pools(&*ledger, None, now)?;

        let mut settled: BTreeMap<usize, UserInfo> = BTreeMap::new();
        let mut total: u128 = 0;
        for &pid in pids {
            if settled.contains_key(&pid) {
                continue;
            }
            let mut user = self.settled_user(pid, &caller)?;
            total = add(total, user.claimable, "claimed reward")?;
            user.claimable = 0;
            settled.insert(pid, user);
        }

        let amount = self.apply_mint_cap(total);
        if amount > 0 {
            minter.mint(self.address, ledger, caller, amount, now)?;
        }
        self.minted = add(self.minted, amount, "minted tokens")?;
        for (pid, user) in settled {
            self.users.insert((pid, caller), user);
        }

        tracing::info!("Claimed {} for {} from pools {:?}", amount, caller.short(), pids);
        Ok(amount)
    }

    /// Return `caller`'s whole deposit in `pid` without settling that pool.
    ///
    /// Reward pending in the pool accumulator is forfeited and left to the
    /// remaining depositors; reward already settled into `claimable` can
    /// still be claimed. Returns the amount returned.
    pub fn emergency_withdraw(
        &mut self,
        caller: Address,
        ledger: &mut dyn TokenLedger,
        pid: usize,
        now: Timestamp,
    ) -> Result<u128, HarvestError> {
        self.require_pool(pid)?;
        self.settle_pools(&*ledger, Some(pid), now)?;

        let mut user = self.user_info(pid, &caller);
        let amount = user.amount;
        if amount > 0 {
            let token = self.pools[pid].token;
            ledger.transfer(&token, &self.address, &caller, amount)?;
        }
        // Reward settled by earlier deposits or withdrawals stays claimable.
        user.amount = 0;
        user.reward_debt = 0;
        self.users.insert((pid, caller), user);

        tracing::info!(
            "Emergency withdrawal of {} from pool {} for {}",
            amount,
            pid,
            caller.short()
        );
        Ok(amount)
    }

    // ------------------------------------------------------------------
    // Views
    // ------------------------------------------------------------------

    /// Emission rate in effect at `now`; zero before `start`.
    pub fn rewards_per_second(&self, now: Timestamp) -> u128 {
        match self.start_time {
            Some(start) => self.schedule.rate_at(now.saturating_sub(start)),
            None => 0,
        }
    }

    /// Sum of derived weights of pools 1.. at the time of the call.
    pub fn total_alloc_point(&self, ledger: &dyn TokenLedger) -> Result<u128, HarvestError> {
        let weights = self.weights(ledger)?;
        Ok(Self::shared_weight(&weights))
    }

    pub fn pool_info(&self, ledger: &dyn TokenLedger, pid: usize) -> Result<PoolInfo, HarvestError> {
        self.require_pool(pid)?;
        let pool = &self.pools[pid];
        Ok(PoolInfo {
            token: pool.token,
            alloc_weight: self.pool_weight(ledger, pool)?,
            acc_reward_per_share: pool.acc_reward_per_share,
            last_reward_time: pool.last_reward_time,
            oracle: pool.oracle,
        })
    }

    pub fn user_info(&self, pid: usize, account: &Address) -> UserInfo {
        self.users
            .get(&(pid, *account))
            .copied()
            .unwrap_or_default()
    }

    /// What `claim(&[pid])` would mint for `account` at `now`, before any
    /// mint cap.
    pub fn claimable_reward(
        &self,
        ledger: &dyn TokenLedger,
        pid: usize,
        account: &Address,
        now: Timestamp,
    ) -> Result<u128, HarvestError> {
        self.require_pool(pid)?;
        let weights = self.weights(ledger)?;
        let acc = self.accrued_acc(ledger, pid, &weights, now)?;
        let user = self.user_info(pid, account);
        let accumulated = mul_div(user.amount, acc, ACC_PRECISION)?;
        add(
            accumulated.saturating_sub(user.reward_debt),
            user.claimable,
            "claimable reward",
        )
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

    fn require_pool(&self, pid: usize) -> Result<(), HarvestError> {
        if pid >= self.pools.len() {
            return Err(HarvestError::PoolNotFound(pid));
        }
        Ok(())
    }

    fn deposited(&self, ledger: &dyn TokenLedger, pool: &Pool) -> u128 {
        ledger.balance_of(&pool.token, &self.address)
    }

    fn pool_weight(&self, ledger: &dyn TokenLedger, pool: &Pool) -> Result<u128, HarvestError> {
        let deposited = self.deposited(ledger, pool);
        match pool.oracle {
            None => Ok(deposited),
            Some(id) => {
                let oracle = self.oracles.get(id).ok_or(HarvestError::OracleNotFound(id))?;
                let answer = u128::try_from(oracle.latest_answer().max(0)).unwrap_or(0);
                mul_div(deposited, answer, self.oracle_denominator)
            }
        }
    }

    fn weights(&self, ledger: &dyn TokenLedger) -> Result<Vec<u128>, HarvestError> {
        self.pools
            .iter()
            .map(|pool| self.pool_weight(ledger, pool))
            .collect()
    }

    fn shared_weight(weights: &[u128]) -> u128 {
        weights.iter().skip(1).sum()
    }

    /// Share of `emission` that belongs to `pid` under `weights`.
    fn pool_share(&self, pid: usize, emission: u128, weights: &[u128]) -> Result<u128, HarvestError> {
        if pid == RESERVED_POOL {
            return mul_div(emission, self.reserved_share_bps, BPS_DENOMINATOR);
        }
        let total = Self::shared_weight(weights);
        if total == 0 {
            return Ok(0);
        }
        let shared = mul_div(emission, BPS_DENOMINATOR - self.reserved_share_bps, BPS_DENOMINATOR)?;
        mul_div(shared, weights[pid], total)
    }

    /// `acc_reward_per_share` of `pid` brought forward to `now`.
    fn accrued_acc(
        &self,
        ledger: &dyn TokenLedger,
        pid: usize,
        weights: &[u128],
        now: Timestamp,
    ) -> Result<u128, HarvestError> {
        let pool = &self.pools[pid];
        let Some(start) = self.start_time else {
            return Ok(pool.acc_reward_per_share);
        };
        if now <= pool.last_reward_time {
            return Ok(pool.acc_reward_per_share);
        }
        let deposited = self.deposited(ledger, pool);
        if deposited == 0 {
            return Ok(pool.acc_reward_per_share);
        }
        let emission = self.schedule.emission_between(
            pool.last_reward_time.saturating_sub(start),
            now - start,
        )?;
        let reward = self.pool_share(pid, emission, weights)?;
        add(
            pool.acc_reward_per_share,
            mul_div(reward, ACC_PRECISION, deposited)?,
            "acc reward per share",
        )
    }

    /// Settle every pool except `skip` up to `now` using one weight snapshot.
    fn settle_pools(
        &mut self,
        ledger: &dyn TokenLedger,
        skip: Option<usize>,
        now: Timestamp,
    ) -> Result<(), HarvestError> {
        if self.start_time.is_none() {
            return Ok(());
        }
        let weights = self.weights(ledger)?;
        let mut accs = Vec::with_capacity(self.pools.len());
        for pid in 0..self.pools.len() {
            accs.push(self.accrued_acc(ledger, pid, &weights, now)?);
        }
        for (pid, (pool, acc)) in self.pools.iter_mut().zip(accs).enumerate() {
            if Some(pid) == skip || now <= pool.last_reward_time {
                continue;
            }
            pool.acc_reward_per_share = acc;
            pool.last_reward_time = now;
            tracing::debug!(
                "Settled pool {}: weight {}, acc {}",
                pid,
                weights[pid],
                acc
            );
        }
        Ok(())
    }

    /// `account`'s position in `pid` with pending reward moved into
    /// `claimable`. Pools must already be settled.
    fn settled_user(&self, pid: usize, account: &Address) -> Result<UserInfo, HarvestError> {
        let mut user = self.user_info(pid, account);
        let acc = self.pools[pid].acc_reward_per_share;
        let accumulated = mul_div(user.amount, acc, ACC_PRECISION)?;
        user.claimable = add(
            user.claimable,
            accumulated.saturating_sub(user.reward_debt),
            "claimable reward",
        )?;
        user.reward_debt = accumulated;
        Ok(user)
    }

    fn apply_mint_cap(&self, amount: u128) -> u128 {
        let Some(cap) = self.max_mintable else {
            return amount;
        };
        let remaining = cap.saturating_sub(self.minted);
        if amount > remaining {
            tracing::warn!(
                "Mint cap reached: truncating claim of {} to {}",
                amount,
                remaining
            );
            return remaining;
        }
        amount
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScheduleStep;
    use harvest_core::{FixedPriceOracle, InMemoryLedger};

    const T0: Timestamp = 1_700_000_000;
    const RATE: u128 = 10_000_000_000_000;
    const DEPOSIT: u128 = 10_000 * 1_000_000_000_000_000_000;

    fn custody() -> Address {
        Address::from_label("allocator")
    }

    fn owner() -> Address {
        Address::from_label("owner")
    }

    fn alice() -> Address {
        Address::from_label("alice")
    }

    fn lp() -> Address {
        Address::from_label("lp")
    }

    fn config() -> AllocatorConfig {
        AllocatorConfig {
            schedule: vec![
                ScheduleStep { start_offset: 1_000, rewards_per_second: RATE as u64 },
                ScheduleStep { start_offset: 2_000, rewards_per_second: (RATE / 2) as u64 },
                ScheduleStep { start_offset: 3_000, rewards_per_second: 0 },
            ],
            ..AllocatorConfig::default()
        }
    }

    fn setup() -> (PoolAllocator, InMemoryLedger) {
        let mut ledger = InMemoryLedger::new();
        ledger.credit(lp(), alice(), DEPOSIT * 10);
        ledger.approve(lp(), alice(), custody(), u128::MAX);
        let mut allocator =
            PoolAllocator::new(custody(), owner(), Address::from_label("pool2"), &config(), T0).unwrap();
        allocator.add_pool(owner(), &ledger, lp(), 0, T0).unwrap();
        (allocator, ledger)
    }

    #[test]
    fn test_reserved_pool_exists() {
        let (allocator, ledger) = setup();
        assert_eq!(allocator.pool_length(), 2);
        assert_eq!(allocator.pool_info(&ledger, 0).unwrap().token, Address::from_label("pool2"));
        assert!(matches!(
            allocator.pool_info(&ledger, 2),
            Err(HarvestError::PoolNotFound(2))
        ));
    }

    #[test]
    fn test_rate_zero_before_start() {
        let (allocator, _) = setup();
        assert_eq!(allocator.rewards_per_second(T0 + 5_000), 0);
    }

    #[test]
    fn test_start_once() {
        let (mut allocator, _) = setup();
        allocator.start(owner(), T0).unwrap();
        assert!(matches!(
            allocator.start(owner(), T0 + 1),
            Err(HarvestError::InvalidState(_))
        ));
        assert!(allocator.start(alice(), T0).is_err());
    }

    #[test]
    fn test_duplicate_pool_token_rejected() {
        let (mut allocator, ledger) = setup();
        assert!(allocator.add_pool(owner(), &ledger, lp(), 0, T0).is_err());
        assert!(allocator.add_pool(alice(), &ledger, Address::from_label("x"), 0, T0).is_err());
    }

    #[test]
    fn test_deposit_accrues_shared_share() {
        let (mut allocator, mut ledger) = setup();
        allocator.start(owner(), T0).unwrap();
        let t = T0 + 1_001;
        allocator.deposit(alice(), &mut ledger, 1, DEPOSIT, t).unwrap();
        let claimable = allocator.claimable_reward(&ledger, 1, &alice(), t + 100).unwrap();
        assert_eq!(claimable, RATE * 100 * 8 / 10);
    }

    #[test]
    fn test_withdraw_more_than_deposited() {
        let (mut allocator, mut ledger) = setup();
        allocator.deposit(alice(), &mut ledger, 1, 100, T0).unwrap();
        assert!(matches!(
            allocator.withdraw(alice(), &mut ledger, 1, 101, T0),
            Err(HarvestError::InsufficientFunds { requested: 101, available: 100, .. })
        ));
        allocator.withdraw(alice(), &mut ledger, 1, 100, T0).unwrap();
        assert_eq!(ledger.balance_of(&lp(), &alice()), DEPOSIT * 10);
    }

    #[test]
    fn test_oracle_scales_weight() {
        let (mut allocator, mut ledger) = setup();
        let oracle = Arc::new(FixedPriceOracle::new(1_200_000_000));
        let id = allocator.add_oracle(owner(), oracle).unwrap();
        allocator.set_pool_oracle(owner(), &ledger, 1, Some(id), T0).unwrap();
        allocator.deposit(alice(), &mut ledger, 1, 1_000, T0).unwrap();
        assert_eq!(allocator.pool_info(&ledger, 1).unwrap().alloc_weight, 12_000);
        assert_eq!(
            allocator.set_pool_oracle(owner(), &ledger, 1, Some(7), T0),
            Err(HarvestError::OracleNotFound(7))
        );
    }
}
