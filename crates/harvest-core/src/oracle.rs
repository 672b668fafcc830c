// crates/harvest-core/src/oracle.rs
//
// Settable price feed. Shared behind an `Arc` so the owner of the feed can
// publish new answers while an allocator holds a read handle.

use std::sync::atomic::{AtomicI64, Ordering};

use crate::traits::PriceOracle;

/// A price oracle whose answer is set explicitly.
#[derive(Debug, Default)]
pub struct FixedPriceOracle {
    answer: AtomicI64,
}

impl FixedPriceOracle {
    /// Create an oracle reporting `answer`.
    pub fn new(answer: i64) -> Self {
        Self {
            answer: AtomicI64::new(answer),
        }
    }

    /// Publish a new answer.
    pub fn set_answer(&self, answer: i64) {
        self.answer.store(answer, Ordering::SeqCst);
    }
}

impl PriceOracle for FixedPriceOracle {
    fn latest_answer(&self) -> i128 {
        self.answer.load(Ordering::SeqCst) as i128
    }
}
