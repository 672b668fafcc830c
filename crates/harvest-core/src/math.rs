// crates/harvest-core/src/math.rs
//
// Fixed-point helpers. All division floors, so rounding loss always stays in
// the protocol's custody rather than being over-paid.

use alloy_primitives::U256;

use crate::error::HarvestError;

/// Basis-point denominator (100% = 10_000 bps).
pub const BPS_DENOMINATOR: u128 = 10_000;

/// Compute `floor(a * b / denominator)` with a 256-bit intermediate product.
///
/// # Errors
/// Returns `HarvestError::InvalidState` on a zero denominator and
/// `HarvestError::Overflow` if the quotient does not fit in a `u128`.
pub fn mul_div(a: u128, b: u128, denominator: u128) -> Result<u128, HarvestError> {
    if denominator == 0 {
        return Err(HarvestError::InvalidState(
            "mul_div denominator is zero".to_string(),
        ));
    }
    if let Some(product) = a.checked_mul(b) {
        return Ok(product / denominator);
    }
    let wide = U256::from(a) * U256::from(b) / U256::from(denominator);
    u128::try_from(wide).map_err(|_| HarvestError::Overflow("mul_div"))
}

/// Checked addition tagged with the name of the quantity being updated.
pub fn add(a: u128, b: u128, what: &'static str) -> Result<u128, HarvestError> {
    a.checked_add(b).ok_or(HarvestError::Overflow(what))
}
