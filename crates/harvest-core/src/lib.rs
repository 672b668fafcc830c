// crates/harvest-core/src/lib.rs
//
// harvest-core: Core types, collaborator traits, and fixed-point helpers for
// the Harvest staking protocol.
//
// This is the leaf crate of the workspace. It defines addresses, timestamps
// and epoch arithmetic, the protocol-wide error type, and the interfaces of
// the external collaborators (token ledger, price oracle, reward minter),
// together with in-memory implementations of the collaborators.

pub mod address;
pub mod error;
pub mod ledger;
pub mod math;
pub mod oracle;
pub mod time;
pub mod traits;

// Re-export key types for ergonomic access from downstream crates.
pub use address::Address;
pub use error::HarvestError;
pub use ledger::InMemoryLedger;
pub use math::{mul_div, BPS_DENOMINATOR};
pub use oracle::FixedPriceOracle;
pub use time::{epoch_ceil, maturity_after, Timestamp, EPOCH_SECONDS};
pub use traits::{PriceOracle, RewardMinter, TokenLedger};
