//! Checked 256-bit arithmetic helpers.
//!
//! Products of amounts and weights are taken in 512 bits, so `a * b / c`
//! never overflows as long as the quotient fits in 256 bits.

use crate::config::TOTAL_PPM;
use crate::error::{RewardError, RewardResult};
use shared_types::{U256, U512};

/// `floor(a * b / c)`.
pub fn mul_div(a: U256, b: U256, c: U256) -> RewardResult<U256> {
    if c.is_zero() {
        return Err(RewardError::critical("division by zero weight"));
    }
    let quotient = a.full_mul(b) / U512::from(c);
    U256::try_from(quotient).map_err(|_| RewardError::critical("mul_div result exceeds U256"))
}

/// `floor(amount * ppm / 1_000_000)`.
pub fn ppm_of(amount: U256, ppm: u32) -> RewardResult<U256> {
    mul_div(amount, U256::from(ppm), U256::from(TOTAL_PPM))
}

/// Sum with overflow reported as a critical invariant.
pub fn checked_sum<I: IntoIterator<Item = U256>>(values: I) -> RewardResult<U256> {
    values.into_iter().try_fold(U256::zero(), |acc, value| {
        acc.checked_add(value)
            .ok_or_else(|| RewardError::critical("sum exceeds U256"))
    })
}
