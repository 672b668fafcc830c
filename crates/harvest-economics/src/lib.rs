// crates/harvest-economics/src/lib.rs
//
// harvest-economics: staking rewards, vesting, and emission allocation for
// the Harvest staking protocol.
//
// The reward distributor streams any number of reward tokens to stakers and
// turns minted emissions into 13-epoch vesting grants; early withdrawal of a
// grant forfeits half of it to locked stakers. The pool allocator streams a
// stepped emission schedule to liquidity-pool depositors and delivers their
// earnings as grants through the distributor.
//
// All amounts are u128 token base units; all timestamps are u64 seconds.

pub mod accumulator;
pub mod allocator;
pub mod config;
pub mod distributor;
pub mod emission;
pub mod vesting;

// Re-export key types for ergonomic access from downstream crates.
pub use accumulator::{RewardCheckpoint, RewardStream, REWARD_PRECISION};
pub use allocator::{PoolAllocator, PoolInfo, UserInfo, ACC_PRECISION, RESERVED_POOL};
pub use config::{AllocatorConfig, DistributorConfig, HarvestConfig, ScheduleStep};
pub use distributor::{RewardDistributor, RewardToken, TokenAmount};
pub use emission::{EmissionPoint, EmissionSchedule};
pub use vesting::{
    AccountBalances, EarnedBalances, LockedBalances, VestingEntry, VestingLedger, VestingQueue,
    WithdrawableBalance, Withdrawal, DEFAULT_LOCK_EPOCHS,
};
