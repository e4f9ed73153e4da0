//! 128-bit fixed-point helpers shared by every price and conversion formula.
//!
//! All consensus arithmetic runs in unsigned 128-bit integers (signed for the
//! post-trade reserve guard). Division truncates toward zero. A result that
//! does not fit a `u64` is clamped to zero and logged; downstream checks
//! treat the zero as a failed rate. Floating point never enters these paths.
//!
//! Reference: zephyr/src/cryptonote_core/cryptonote_tx_utils.cpp

use zephyr_types::constants::COIN;

/// Per-unit rates are truncated to a multiple of this before being applied
/// to an amount, keeping them stable against rounding in the low four
/// decimal digits. Consensus-critical.
pub const RATE_QUANTUM: u128 = 10_000;

/// Zero the low four decimal digits of a computed rate.
pub fn quantize(rate: u128) -> u128 {
    rate - (rate % RATE_QUANTUM)
}

/// Clamp a 128-bit result into a `u64` amount. Overflow degrades to zero
/// rather than aborting; the caller's rate/price checks catch the zero.
pub fn clamp_u64(value: u128, context: &str) -> u64 {
    match u64::try_from(value) {
        Ok(v) => v,
        Err(_) => {
            log::warn!("overflow detected in {} calculation", context);
            0
        }
    }
}

/// Apply a quantized per-COIN rate to an amount: `amount * rate / COIN`.
pub fn apply_rate(amount: u64, rate: u128, context: &str) -> u64 {
    let Some(product) = (amount as u128).checked_mul(rate) else {
        log::warn!("overflow detected in {} calculation", context);
        return 0;
    };
    clamp_u64(product / COIN as u128, context)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quantize() {
        assert_eq!(quantize(0), 0);
        assert_eq!(quantize(9_999), 0);
        assert_eq!(quantize(10_000), 10_000);
        assert_eq!(quantize(123_456_789), 123_450_000);
        assert_eq!(quantize(66_666_666_666), 66_666_660_000);
    }

    #[test]
    fn test_clamp_u64() {
        assert_eq!(clamp_u64(0, "test"), 0);
        assert_eq!(clamp_u64(u64::MAX as u128, "test"), u64::MAX);
        assert_eq!(clamp_u64(u64::MAX as u128 + 1, "test"), 0);
    }

    #[test]
    fn test_apply_rate() {
        // 1 COIN at rate 1 COIN is identity
        assert_eq!(apply_rate(COIN, COIN as u128, "test"), COIN);
        // 120 COIN at rate 0.05 COIN
        assert_eq!(apply_rate(120 * COIN, 50_000_000_000, "test"), 6 * COIN);
        // division truncates
        assert_eq!(apply_rate(1, 1, "test"), 0);
    }
}
