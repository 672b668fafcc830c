// crates/harvest-core/src/traits.rs

use crate::address::Address;
use crate::error::HarvestError;
use crate::time::Timestamp;

/// Fungible-token ledger holding balances for every token the protocol touches.
///
/// Implemented by the execution environment; `InMemoryLedger` is the
/// reference implementation. Calls fail only on insufficient balance,
/// insufficient allowance, or an unauthorized mint.
pub trait TokenLedger {
    /// Balance of `account` in `token`.
    fn balance_of(&self, token: &Address, account: &Address) -> u128;

    /// Move `amount` of `token` from `from` to `to`, authorized by `from`.
    fn transfer(
        &mut self,
        token: &Address,
        from: &Address,
        to: &Address,
        amount: u128,
    ) -> Result<(), HarvestError>;

    /// Move `amount` of `token` from `from` to `to` on behalf of `spender`,
    /// consuming `spender`'s allowance.
    fn transfer_from(
        &mut self,
        token: &Address,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: u128,
    ) -> Result<(), HarvestError>;

    /// Create `amount` new units of `token` for `to`. Only the token's
    /// registered minter may call this.
    fn mint(
        &mut self,
        token: &Address,
        minter: &Address,
        to: &Address,
        amount: u128,
    ) -> Result<(), HarvestError>;
}

/// Price feed attached to an allocator pool.
///
/// No staleness checking is performed by the protocol.
pub trait PriceOracle: Send + Sync {
    /// Latest integer price answer, scaled by the feed's decimals.
    fn latest_answer(&self) -> i128;
}

/// Inbound interface for anything that converts earned emissions into
/// vesting grants (the pool allocator and the airdrop claimer both call it).
///
/// Implemented by the reward distributor.
pub trait RewardMinter {
    /// Grant `amount` of freshly minted, vesting native tokens to `account`.
    fn mint(
        &mut self,
        caller: Address,
        ledger: &mut dyn TokenLedger,
        account: Address,
        amount: u128,
        now: Timestamp,
    ) -> Result<(), HarvestError>;
}
