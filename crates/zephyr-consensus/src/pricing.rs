//! Derived pricing: stablecoin and reserve coin quotes, moving averages,
//! and reserve ratios.
//!
//! Every price here is an atomic-unit rate such that
//! `amount_source * rate / COIN` yields destination atomic units. Rates are
//! quantized (low four digits zeroed) before use; see [`crate::math`].
//!
//! Reference: zephyr/src/cryptonote_core/cryptonote_tx_utils.cpp
//!            get_stable_coin_price(), get_reserve_coin_price(),
//!            get_moving_average_*(), get_reserve_ratio()

use crate::math::{clamp_u64, quantize};
use crate::oracle::PricingRecord;
use crate::supply::CirculatingSupply;
use zephyr_types::constants::{COIN, MOVING_AVERAGE_WINDOW, PRICE_R_MIN};

// =============================================================================
// Coin Prices
// =============================================================================

/// Price of ZEPHUSD in ZEPH atomic units.
///
/// The pegged rate is `COIN^2 / oracle_price` (one USD worth of ZEPH). When
/// the protocol is undercollateralised (spot reserve ratio below 1.0) the
/// peg is abandoned for the worst-case pro-rata rate
/// `zeph_reserve * COIN / num_stables`, guaranteeing every holder the same
/// share of what remains.
pub fn get_stable_coin_price(supply: &CirculatingSupply, oracle_price: u64) -> u64 {
    if oracle_price == 0 {
        return 0;
    }

    let rate = quantize(COIN as u128 * COIN as u128 / oracle_price as u128);
    let rate = clamp_u64(rate, "stable coin price");

    if supply.num_stables == 0 {
        return rate;
    }

    // Branch test only; the returned rates stay integer.
    let reserve_ratio = supply.zeph_reserve as f64 * oracle_price as f64
        / supply.num_stables as f64
        / COIN as f64;

    if reserve_ratio < 1.0 {
        let Some(scaled) = supply.zeph_reserve.checked_mul(COIN as u128) else {
            log::warn!("overflow detected in stablecoin worst-case price calculation");
            return 0;
        };
        let worst_case_rate = quantize(scaled / supply.num_stables);
        return clamp_u64(worst_case_rate, "stablecoin worst-case price");
    }

    rate
}

/// Price of ZEPHRSV in ZEPH atomic units.
///
/// Equity per reserve coin: `(zeph_reserve - num_stables/exchange_rate)` ZEPH
/// spread over the issued reserve coins, floored at [`PRICE_R_MIN`]
/// (0.5 ZEPH). The floor also applies before any reserve coins exist and
/// whenever equity is exhausted.
pub fn get_reserve_coin_price(supply: &CirculatingSupply, exchange_rate: u64) -> u64 {
    if exchange_rate == 0 {
        return 0;
    }

    if supply.num_reserves == 0 {
        log::debug!("no reserve coins in circulation, using price_r_min");
        return PRICE_R_MIN;
    }

    let Some(scaled_liabilities) = supply.num_stables.checked_mul(COIN as u128) else {
        log::warn!("overflow detected in reserve coin price calculation");
        return 0;
    };
    let liabilities = scaled_liabilities / exchange_rate as u128;
    let equity = supply.zeph_reserve.saturating_sub(liabilities);
    if equity == 0 {
        return PRICE_R_MIN;
    }

    let Some(scaled_equity) = equity.checked_mul(COIN as u128) else {
        log::warn!("overflow detected in reserve coin price calculation");
        return 0;
    };
    let price = quantize(scaled_equity / supply.num_reserves);
    match u64::try_from(price) {
        Ok(p) => p.max(PRICE_R_MIN),
        Err(_) => {
            log::warn!("overflow detected in reserve coin price calculation");
            0
        }
    }
}

// =============================================================================
// Moving Averages
// =============================================================================

/// Average of the trailing window of a record field plus the current value.
///
/// Returns 0 until enough history has accumulated; the caller treats that as
/// "no MA yet" and the rate is rejected downstream.
fn trailing_average(
    history: &[PricingRecord],
    field: fn(&PricingRecord) -> u64,
    current: u64,
) -> u64 {
    let window = (MOVING_AVERAGE_WINDOW - 1) as usize;
    if history.len() < window {
        return 0;
    }

    let sum: u128 = history[history.len() - window..]
        .iter()
        .map(|pr| field(pr) as u128)
        .sum();
    let moving_average = (sum + current as u128) / MOVING_AVERAGE_WINDOW as u128;
    quantize(moving_average) as u64
}

/// Moving average of the ZEPH spot price over the trailing 720-block window.
pub fn get_moving_average_price(history: &[PricingRecord], spot_price: u64) -> u64 {
    trailing_average(history, |pr| pr.spot, spot_price)
}

/// Moving average of the stablecoin price.
pub fn get_moving_average_stable_coin_price(
    history: &[PricingRecord],
    stable_price: u64,
) -> u64 {
    trailing_average(history, |pr| pr.stable, stable_price)
}

/// Moving average of the reserve coin price.
pub fn get_moving_average_reserve_coin_price(
    history: &[PricingRecord],
    reserve_price: u64,
) -> u64 {
    trailing_average(history, |pr| pr.reserve, reserve_price)
}

/// Moving average of the reserve ratio.
pub fn get_moving_average_reserve_ratio(history: &[PricingRecord], reserve_ratio: u64) -> u64 {
    trailing_average(history, |pr| pr.reserve_ratio, reserve_ratio)
}

// =============================================================================
// Reserve Ratios
// =============================================================================

/// Reserve ratio at the record's spot price, as a dimensionless float.
///
/// Telemetry only; consensus decisions use the integer forms.
pub fn get_spot_reserve_ratio(supply: &CirculatingSupply, pr: &PricingRecord) -> f64 {
    get_reserve_ratio(supply, pr.spot)
}

/// Reserve ratio at the record's moving-average price.
pub fn get_ma_reserve_ratio(supply: &CirculatingSupply, pr: &PricingRecord) -> f64 {
    get_reserve_ratio(supply, pr.moving_average)
}

/// `assets / liabilities` with assets valued at `oracle_price`.
///
/// With no stablecoins in circulation the ratio is infinite; with nothing on
/// either side it is 0.
pub fn get_reserve_ratio(supply: &CirculatingSupply, oracle_price: u64) -> f64 {
    let assets = supply.zeph_reserve as f64 * oracle_price as f64;
    let liabilities = supply.num_stables as f64;
    if assets == 0.0 && liabilities == 0.0 {
        return 0.0;
    }
    assets / liabilities / COIN as f64
}

/// COIN-scaled, quantized reserve ratio as echoed in the pricing record.
pub fn get_pr_reserve_ratio(supply: &CirculatingSupply, oracle_price: u64) -> u64 {
    if supply.num_stables == 0 {
        return 0;
    }

    let Some(assets) = supply.zeph_reserve.checked_mul(oracle_price as u128) else {
        log::warn!("overflow detected in reserve ratio calculation");
        return 0;
    };
    let reserve_ratio = quantize(assets / supply.num_stables);
    clamp_u64(reserve_ratio, "reserve ratio")
}
