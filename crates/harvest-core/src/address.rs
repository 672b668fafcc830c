// crates/harvest-core/src/address.rs
//
// 32-byte account / token / contract identifiers.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// An opaque 32-byte identifier for an account, a token, or a protocol
/// component that holds custody of tokens.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Address(pub [u8; 32]);

impl Address {
    /// Derive a deterministic address from a human-readable label
    /// (SHA-256 of the label bytes).
    ///
    /// # Example
    /// ```
    /// use harvest_core::Address;
    /// assert_eq!(Address::from_label("alice"), Address::from_label("alice"));
    /// assert_ne!(Address::from_label("alice"), Address::from_label("bob"));
    /// ```
    pub fn from_label(label: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(label.as_bytes());
        Address(hasher.finalize().into())
    }

    /// Raw bytes of the address.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Short form used in log lines: first 6 bytes as hex.
    pub fn short(&self) -> String {
        hex::encode(&self.0[..6])
    }
}

impl From<[u8; 32]> for Address {
    fn from(bytes: [u8; 32]) -> Self {
        Address(bytes)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address(0x{})", self.short())
    }
}
