// crates/harvest-core/src/ledger.rs
//
// In-memory fungible-token ledger.
//
// Reference implementation of `TokenLedger` for embedders that keep all
// state in process, and for tests. Tracks balances, allowances, total supply
// and the single authorized minter of each token. An allowance of
// `u128::MAX` is treated as unlimited and never decremented.

use std::collections::HashMap;

use crate::address::Address;
use crate::error::HarvestError;
use crate::traits::TokenLedger;

/// Multi-token balance ledger.
#[derive(Debug, Clone, Default)]
pub struct InMemoryLedger {
    /// (token, account) -> balance.
    balances: HashMap<(Address, Address), u128>,
    /// (token, owner, spender) -> remaining allowance.
    allowances: HashMap<(Address, Address, Address), u128>,
    /// token -> total supply.
    supplies: HashMap<Address, u128>,
    /// token -> account allowed to mint it.
    minters: HashMap<Address, Address>,
}

impl InMemoryLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit a genesis allocation. Bypasses minter checks.
    pub fn credit(&mut self, token: Address, account: Address, amount: u128) {
        let balance = self.balances.entry((token, account)).or_insert(0);
        *balance = balance.saturating_add(amount);
        let supply = self.supplies.entry(token).or_insert(0);
        *supply = supply.saturating_add(amount);
    }

    /// Set the account allowed to mint `token`.
    pub fn set_minter(&mut self, token: Address, minter: Address) {
        self.minters.insert(token, minter);
    }

    /// Allow `spender` to move up to `amount` of `owner`'s `token`.
    pub fn approve(&mut self, token: Address, owner: Address, spender: Address, amount: u128) {
        self.allowances.insert((token, owner, spender), amount);
    }

    /// Remaining allowance of `spender` over `owner`'s `token`.
    pub fn allowance(&self, token: &Address, owner: &Address, spender: &Address) -> u128 {
        self.allowances
            .get(&(*token, *owner, *spender))
            .copied()
            .unwrap_or(0)
    }

    /// Total supply of `token`.
    pub fn total_supply(&self, token: &Address) -> u128 {
        self.supplies.get(token).copied().unwrap_or(0)
    }

    fn debit(&mut self, token: &Address, account: &Address, amount: u128) -> Result<(), HarvestError> {
        let available = self.balance_of(token, account);
        if amount > available {
            return Err(HarvestError::InsufficientFunds {
                token: *token,
                account: *account,
                requested: amount,
                available,
            });
        }
        self.balances.insert((*token, *account), available - amount);
        Ok(())
    }

    fn deposit(&mut self, token: &Address, account: &Address, amount: u128) -> Result<(), HarvestError> {
        let balance = self.balances.entry((*token, *account)).or_insert(0);
        *balance = balance
            .checked_add(amount)
            .ok_or(HarvestError::Overflow("ledger balance"))?;
        Ok(())
    }
}

impl TokenLedger for InMemoryLedger {
    fn balance_of(&self, token: &Address, account: &Address) -> u128 {
        self.balances.get(&(*token, *account)).copied().unwrap_or(0)
    }

    fn transfer(
        &mut self,
        token: &Address,
        from: &Address,
        to: &Address,
        amount: u128,
    ) -> Result<(), HarvestError> {
        if from == to {
            // Self-transfer still requires the balance to exist.
            let available = self.balance_of(token, from);
            if amount > available {
                return Err(HarvestError::InsufficientFunds {
                    token: *token,
                    account: *from,
                    requested: amount,
                    available,
                });
            }
            return Ok(());
        }
        self.debit(token, from, amount)?;
        self.deposit(token, to, amount)
    }

    fn transfer_from(
        &mut self,
        token: &Address,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: u128,
    ) -> Result<(), HarvestError> {
        let allowance = self.allowance(token, from, spender);
        if amount > allowance {
            return Err(HarvestError::InsufficientFunds {
                token: *token,
                account: *spender,
                requested: amount,
                available: allowance,
            });
        }
        self.transfer(token, from, to, amount)?;
        if allowance != u128::MAX {
            self.allowances
                .insert((*token, *from, *spender), allowance - amount);
        }
        Ok(())
    }

    fn mint(
        &mut self,
        token: &Address,
        minter: &Address,
        to: &Address,
        amount: u128,
    ) -> Result<(), HarvestError> {
        if self.minters.get(token) != Some(minter) {
            return Err(HarvestError::unauthorized(*minter, "mint token"));
        }
        let supply = self
            .total_supply(token)
            .checked_add(amount)
            .ok_or(HarvestError::Overflow("token supply"))?;
        self.deposit(token, to, amount)?;
        self.supplies.insert(*token, supply);
        Ok(())
    }
}
