//! Conversion rates between the three protocol assets.
//!
//! Each conversion picks the rate less favourable to the user out of the
//! spot and moving-average quotes, deducts the fork-dependent conversion
//! fee, quantizes, and applies the rate to the burnt amount. Fee-asset
//! equivalence reuses the same rate plumbing without a conversion fee so
//! that transaction fees can be denominated in any asset.
//!
//! Reference: zephyr/src/cryptonote_core/cryptonote_tx_utils.cpp
//!            zeph_to_zephusd() .. zephrsv_to_zeph(),
//!            zeph_to_asset_fee(), asset_to_zeph_fee()

use crate::math::{apply_rate, clamp_u64, quantize};
use crate::oracle::PricingRecord;
use zephyr_types::constants::{Asset, HfVersion, COIN};

// =============================================================================
// Conversions
// =============================================================================

/// ZEPH -> ZEPHUSD (mint stable).
///
/// Rate `COIN^2 / max(stable, stable_ma)` minus the conversion fee
/// (2% before V5, 0.1% from V5).
pub fn zeph_to_zephusd(amount: u64, pr: &PricingRecord, hf_version: u8) -> u64 {
    let exchange = pr.stable.max(pr.stable_ma) as u128;
    if exchange == 0 {
        return 0;
    }

    let mut rate = COIN as u128 * COIN as u128 / exchange;
    let conversion_fee = if hf_version >= HfVersion::V5 {
        rate / 1000 // 0.1% fee
    } else {
        (rate * 2) / 100 // 2% fee
    };
    rate -= conversion_fee;
    rate = quantize(rate);

    apply_rate(amount, rate, "stable amount")
}

/// ZEPHUSD -> ZEPH (redeem stable).
///
/// Rate `min(stable, stable_ma)` minus the conversion fee (2% before V5,
/// 0.1% from V5).
pub fn zephusd_to_zeph(amount: u64, pr: &PricingRecord, hf_version: u8) -> u64 {
    let mut exchange = pr.stable.min(pr.stable_ma) as u128;
    let conversion_fee = if hf_version >= HfVersion::V5 {
        exchange / 1000 // 0.1% fee
    } else {
        (exchange * 2) / 100 // 2% fee
    };
    exchange -= conversion_fee;
    exchange = quantize(exchange);

    apply_rate(amount, exchange, "zeph amount")
}

/// ZEPH -> ZEPHRSV (mint reserve).
///
/// Rate `COIN^2 / max(reserve, reserve_ma)`; free before V5, 1% from V5.
pub fn zeph_to_zephrsv(amount: u64, pr: &PricingRecord, hf_version: u8) -> u64 {
    let reserve_coin_price = pr.reserve.max(pr.reserve_ma) as u128;
    if reserve_coin_price == 0 {
        return 0;
    }

    let mut rate = COIN as u128 * COIN as u128 / reserve_coin_price;
    let conversion_fee = if hf_version >= HfVersion::V5 {
        rate / 100 // 1% fee
    } else {
        0 // no fee
    };
    rate -= conversion_fee;
    rate = quantize(rate);

    apply_rate(amount, rate, "reserve amount")
}

/// ZEPHRSV -> ZEPH (redeem reserve).
///
/// Rate `min(reserve, reserve_ma)` minus the conversion fee (2% before V5,
/// 1% from V5).
pub fn zephrsv_to_zeph(amount: u64, pr: &PricingRecord, hf_version: u8) -> u64 {
    let mut reserve_coin_price = pr.reserve.min(pr.reserve_ma) as u128;
    let conversion_fee = if hf_version >= HfVersion::V5 {
        reserve_coin_price / 100 // 1% fee
    } else {
        (reserve_coin_price * 2) / 100 // 2% fee
    };
    reserve_coin_price -= conversion_fee;
    reserve_coin_price = quantize(reserve_coin_price);

    apply_rate(amount, reserve_coin_price, "zeph amount from reserve")
}

// =============================================================================
// Fee-Asset Equivalence
// =============================================================================

/// Convert a ZEPH-denominated fee into an asset-denominated one at
/// `exchange_rate` (ZEPH atomic units per asset coin), fee-free.
pub fn zeph_to_asset_fee(zeph_fee: u64, exchange_rate: u64) -> u64 {
    if exchange_rate == 0 {
        return 0;
    }
    let rate = quantize(COIN as u128 * COIN as u128 / exchange_rate as u128);
    apply_rate(zeph_fee, rate, "zeph_to_asset_fee")
}

/// Convert an asset-denominated fee back into ZEPH at `exchange_rate`.
pub fn asset_to_zeph_fee(asset_fee: u64, exchange_rate: u64) -> u64 {
    let zeph_fee = asset_fee as u128 * exchange_rate as u128 / COIN as u128;
    clamp_u64(zeph_fee, "asset_to_zeph_fee")
}

/// A fee paid in `fee_asset`, expressed in ZEPH atomic units via the
/// moving-average rate. Falls back to the raw amount when the record cannot
/// price the pair.
pub fn get_fee_in_zeph_equivalent(
    fee_asset: Asset,
    fee_amount: u64,
    pr: &PricingRecord,
    hf_version: u8,
) -> u64 {
    if fee_asset == Asset::Zeph || pr.has_missing_rates(hf_version) {
        return fee_amount;
    }
    match fee_asset {
        Asset::ZephUsd => asset_to_zeph_fee(fee_amount, pr.stable_ma),
        Asset::ZephRsv => asset_to_zeph_fee(fee_amount, pr.reserve_ma),
        Asset::Zeph => fee_amount,
    }
}

/// A ZEPH-denominated fee expressed in `to_asset` via the moving-average
/// rate.
pub fn get_fee_in_asset_equivalent(
    to_asset: Asset,
    fee_amount: u64,
    pr: &PricingRecord,
    hf_version: u8,
) -> u64 {
    if to_asset == Asset::Zeph || pr.has_missing_rates(hf_version) {
        return fee_amount;
    }
    match to_asset {
        Asset::ZephUsd => zeph_to_asset_fee(fee_amount, pr.stable_ma),
        Asset::ZephRsv => zeph_to_asset_fee(fee_amount, pr.reserve_ma),
        Asset::Zeph => fee_amount,
    }
}
