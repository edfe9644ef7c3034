#![allow(clippy::assign_op_pattern)]

use uint::construct_uint;

construct_uint! {
    /// 256-bit unsigned integer.
    pub(crate) struct U256(4);
}

/// Denominator for parts-per-million numerators (quorum, basis)
pub const PPM_DENOMINATOR: u128 = 1_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum MathError {
    #[error("division by zero")]
    DivByZero,

    #[error("result does not fit in 128 bits")]
    Overflow,
}

/// `x * y / denominator` rounded down, with a 256-bit intermediate product
pub fn mul_div_down(x: u128, y: u128, denominator: u128) -> Result<u128, MathError> {
    if denominator == 0 {
        return Err(MathError::DivByZero);
    }

    if x == 0 || y == 0 {
        return Ok(0);
    }

    // two 128-bit factors always fit in 256 bits
    let (product, _) = U256::from(x).overflowing_mul(U256::from(y));
    let result = product / U256::from(denominator);

    if result.bits() > 128 {
        return Err(MathError::Overflow);
    }

    Ok(result.low_u128())
}

/// `value * numerator / 1_000_000`, rounded down
pub fn ppm_of(value: u128, numerator: u128) -> Result<u128, MathError> {
    mul_div_down(value, numerator, PPM_DENOMINATOR)
}
