// crates/harvest-core/src/time.rs
//
// Timestamps and epoch arithmetic.
//
// The protocol settles on a fixed one-week epoch. Lock and vesting maturities
// are always aligned to an epoch boundary so that entries created during the
// same epoch share a bucket.

/// Seconds since the Unix epoch.
pub type Timestamp = u64;

/// Length of one settlement epoch: one week.
pub const EPOCH_SECONDS: u64 = 7 * 86_400;

/// Round `t` up to the next epoch boundary. A timestamp already on a
/// boundary is returned unchanged.
pub fn epoch_ceil(t: Timestamp) -> Timestamp {
    t.div_ceil(EPOCH_SECONDS).saturating_mul(EPOCH_SECONDS)
}

/// Maturity of a lock or grant created at `now` that must run for
/// `epochs` whole epochs: `epoch_ceil(now) + epochs * EPOCH_SECONDS`.
pub fn maturity_after(now: Timestamp, epochs: u64) -> Timestamp {
    epoch_ceil(now).saturating_add(epochs.saturating_mul(EPOCH_SECONDS))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_epoch_ceil() {
        assert_eq!(epoch_ceil(0), 0);
        assert_eq!(epoch_ceil(1), EPOCH_SECONDS);
        assert_eq!(epoch_ceil(EPOCH_SECONDS), EPOCH_SECONDS);
        assert_eq!(epoch_ceil(EPOCH_SECONDS + 1), EPOCH_SECONDS * 2);
    }

    #[test]
    fn test_maturity_after() {
        let now = EPOCH_SECONDS * 100 + 3_600;
        assert_eq!(maturity_after(now, 13), EPOCH_SECONDS * 114);
        assert_eq!(maturity_after(EPOCH_SECONDS * 100, 13), EPOCH_SECONDS * 113);
    }

    #[test]
    fn test_maturity_saturates() {
        assert_eq!(maturity_after(u64::MAX - 1, 13), u64::MAX);
    }
}
