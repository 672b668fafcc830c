use thiserror::Error;

use crate::address::Address;

/// Protocol-wide error types for the Harvest staking protocol.
///
/// Every variant is a local validation failure: nothing is retried or
/// recovered internally, and the operation that produced it has not mutated
/// any state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HarvestError {
    /// Withdrawal exceeds the unlocked balance and there are no unvested
    /// earnings to draw from at a penalty.
    #[error("Insufficient unlocked balance: requested {requested}, available {available}")]
    InsufficientUnlockedBalance { requested: u128, available: u128 },

    /// Withdrawal exceeds unlocked + vested + half of all unvested earnings.
    #[error("Insufficient balance after penalty: requested {requested}, available {available}")]
    InsufficientBalanceAfterPenalty { requested: u128, available: u128 },

    /// Caller lacks the role required for the operation.
    #[error("Unauthorized caller {caller}: {action}")]
    UnauthorizedCaller { caller: Address, action: String },

    /// A reward token was registered twice.
    #[error("Duplicate reward token: {0}")]
    DuplicateRewardToken(Address),

    /// Operation referenced a reward token that was never registered.
    #[error("Unknown reward token: {0}")]
    UnknownRewardToken(Address),

    /// Operation referenced a pool id that does not exist.
    #[error("Pool not found: {0}")]
    PoolNotFound(usize),

    /// Operation referenced an oracle id that does not exist.
    #[error("Oracle not found: {0}")]
    OracleNotFound(usize),

    /// Collaborator ledger refused a transfer (balance or allowance too low).
    #[error("Insufficient funds of token {token} for {account}: requested {requested}, available {available}")]
    InsufficientFunds {
        token: Address,
        account: Address,
        requested: u128,
        available: u128,
    },

    /// Zero or otherwise meaningless amount.
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Invalid state transition.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Checked arithmetic overflowed.
    #[error("Arithmetic overflow in {0}")]
    Overflow(&'static str),

    /// Configuration could not be parsed or failed validation.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl HarvestError {
    /// Shorthand for building an `UnauthorizedCaller` error.
    pub fn unauthorized(caller: Address, action: impl Into<String>) -> Self {
        HarvestError::UnauthorizedCaller {
            caller,
            action: action.into(),
        }
    }
}
