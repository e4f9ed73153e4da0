//! The reserve-ratio guard.
//!
//! Every mint or redeem is summarised as a signed tally of how it would
//! move the circulating supplies, and the post-trade state must keep the
//! reserve ratio inside the allowed band: stable mints and reserve redeems
//! need at least 400%, reserve mints must stay below 800%, and stable
//! redeems are always honoured while any reserve remains so holders can
//! exit an undercollateralised system.
//!
//! All arithmetic is signed 128-bit with ratios scaled by COIN. The
//! moving-average ratio comes from the trailing record window from V5 and
//! from the record's own moving-average price before that.
//!
//! Reference: zephyr/src/cryptonote_core/cryptonote_tx_utils.cpp
//!            reserve_ratio_satisfied()

use thiserror::Error;
use zephyr_types::constants::{
    format_amount, HfVersion, TransactionType, RESERVE_RATIO_MAX, RESERVE_RATIO_MIN,
    RESERVE_RATIO_UNRESTRICTED_STABLE_THRESHOLD,
};

use crate::oracle::PricingRecord;
use crate::pricing::get_moving_average_reserve_ratio;
use crate::supply::CirculatingSupply;

// =============================================================================
// Error Type
// =============================================================================

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReserveError {
    #[error("reserve ratio cannot be calculated: pricing record is missing rates")]
    MissingRates,

    #[error("reserve ratio not satisfied: no ZEPH in the reserve")]
    EmptyReserve,

    #[error("reserve ratio not satisfied: ZEPH reserve would be negative")]
    NegativeReserve,

    #[error("reserve ratio not satisfied: liabilities would be negative")]
    NegativeLiabilities,

    #[error("reserve ratio not satisfied: total reserve coins would be negative")]
    NegativeReserveCoins,

    #[error("reserve ratio not satisfied: assets and liabilities are both zero")]
    DegenerateState,

    #[error("reserve ratio not satisfied: error calculating assets")]
    AssetValueError,

    #[error("reserve ratio not satisfied: reserve ratio would be negative")]
    NegativeRatio,

    #[error(
        "spot reserve ratio not satisfied: new reserve ratio would be {} (MA {}), less than the minimum 4.0",
        format_amount(*.ratio_spot),
        format_amount(*.ratio_ma)
    )]
    SpotRatioBelowMinimum { ratio_spot: u64, ratio_ma: u64 },

    #[error(
        "MA reserve ratio not satisfied: new reserve ratio would be {} (spot {}), less than the minimum 4.0",
        format_amount(*.ratio_ma),
        format_amount(*.ratio_spot)
    )]
    MaRatioBelowMinimum { ratio_spot: u64, ratio_ma: u64 },

    #[error(
        "spot reserve ratio not satisfied: new reserve ratio would be {} (MA {}), above the maximum 8.0",
        format_amount(*.ratio_spot),
        format_amount(*.ratio_ma)
    )]
    SpotRatioAboveMaximum { ratio_spot: u64, ratio_ma: u64 },

    #[error(
        "MA reserve ratio not satisfied: new reserve ratio would be {} (spot {}), above the maximum 8.0",
        format_amount(*.ratio_ma),
        format_amount(*.ratio_spot)
    )]
    MaRatioAboveMaximum { ratio_spot: u64, ratio_ma: u64 },

    #[error("reserve ratio not satisfied: assets are zero")]
    ZeroAssets,

    #[error(
        "reserve ratios not satisfied: spot {} | MA {}",
        format_amount(*.ratio_spot),
        format_amount(*.ratio_ma)
    )]
    NotAConversion { ratio_spot: u64, ratio_ma: u64 },
}

// =============================================================================
// Conversion Tally
// =============================================================================

/// Net change a candidate conversion applies to the circulating supplies,
/// positive for mint and negative for redeem.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConversionTally {
    pub zeph: i128,
    pub stables: i128,
    pub reserves: i128,
}

impl ConversionTally {
    pub fn new(zeph: i128, stables: i128, reserves: i128) -> Self {
        Self {
            zeph,
            stables,
            reserves,
        }
    }
}

// =============================================================================
// The Guard
// =============================================================================

/// Ratios are compared COIN-scaled; a state with no liabilities is treated
/// as infinitely collateralised.
const RATIO_INFINITE: i128 = i128::MAX;

/// Decide whether the post-trade reserve state admits the conversion.
///
/// Errors carry the user-visible reason, including both post-trade ratios
/// where a threshold was broken.
pub fn reserve_ratio_satisfied(
    supply: &CirculatingSupply,
    history: &[PricingRecord],
    pr: &PricingRecord,
    tx_type: TransactionType,
    tally: ConversionTally,
    hf_version: u8,
) -> Result<(), ReserveError> {
    if pr.has_missing_rates(hf_version) {
        log::error!("reserve ratio cannot be calculated, pricing record is missing rates");
        return Err(ReserveError::MissingRates);
    }

    // Bootstrap: with an empty reserve only reserve-coin minting can bring
    // the system to life.
    if supply.zeph_reserve == 0 {
        if tx_type == TransactionType::MintReserve {
            return Ok(());
        }
        log::error!("reserve ratio not satisfied, no ZEPH in the reserve");
        return Err(ReserveError::EmptyReserve);
    }

    let assets = supply.zeph_reserve as i128 + tally.zeph;
    if assets < 0 {
        return Err(ReserveError::NegativeReserve);
    }

    let liabilities = supply.num_stables as i128 + tally.stables;
    if liabilities < 0 {
        return Err(ReserveError::NegativeLiabilities);
    }

    let total_reserve_coins = supply.num_reserves as i128 + tally.reserves;
    if total_reserve_coins < 0 {
        return Err(ReserveError::NegativeReserveCoins);
    }

    if assets == 0 && liabilities == 0 {
        return Err(ReserveError::DegenerateState);
    }

    let assets_spot = assets
        .checked_mul(pr.spot as i128)
        .ok_or(ReserveError::AssetValueError)?;
    if assets != 0 && assets_spot == 0 {
        return Err(ReserveError::AssetValueError);
    }

    let (reserve_ratio_spot, reserve_ratio_ma) = if liabilities == 0 {
        (RATIO_INFINITE, RATIO_INFINITE)
    } else {
        let reserve_ratio_spot = assets_spot / liabilities;
        let reserve_ratio_ma = if hf_version >= HfVersion::V5 {
            let spot_ratio_u64 = u64::try_from(reserve_ratio_spot).unwrap_or(u64::MAX);
            get_moving_average_reserve_ratio(history, spot_ratio_u64) as i128
        } else {
            let assets_ma = assets
                .checked_mul(pr.moving_average as i128)
                .ok_or(ReserveError::AssetValueError)?;
            if assets != 0 && assets_ma == 0 {
                return Err(ReserveError::AssetValueError);
            }
            assets_ma / liabilities
        };
        (reserve_ratio_spot, reserve_ratio_ma)
    };

    if reserve_ratio_spot < 0 || reserve_ratio_ma < 0 {
        return Err(ReserveError::NegativeRatio);
    }

    let ratio_spot = u64::try_from(reserve_ratio_spot).unwrap_or(u64::MAX);
    let ratio_ma = u64::try_from(reserve_ratio_ma).unwrap_or(u64::MAX);

    match tx_type {
        TransactionType::MintStable => {
            if reserve_ratio_spot < RESERVE_RATIO_MIN as i128 {
                let err = ReserveError::SpotRatioBelowMinimum { ratio_spot, ratio_ma };
                log::error!("{}", err);
                return Err(err);
            }
            if reserve_ratio_ma < RESERVE_RATIO_MIN as i128 {
                let err = ReserveError::MaRatioBelowMinimum { ratio_spot, ratio_ma };
                log::error!("{}", err);
                return Err(err);
            }
            Ok(())
        }
        TransactionType::RedeemStable => {
            // Holders may always exit while anything remains to exit into.
            if assets == 0 {
                return Err(ReserveError::ZeroAssets);
            }
            Ok(())
        }
        TransactionType::MintReserve => {
            // Below the stablecoin threshold the corridor is open no matter
            // the ratio.
            if liabilities < RESERVE_RATIO_UNRESTRICTED_STABLE_THRESHOLD as i128 {
                return Ok(());
            }
            if reserve_ratio_spot >= RESERVE_RATIO_MAX as i128 {
                let err = ReserveError::SpotRatioAboveMaximum { ratio_spot, ratio_ma };
                log::error!("{}", err);
                return Err(err);
            }
            if reserve_ratio_ma >= RESERVE_RATIO_MAX as i128 {
                let err = ReserveError::MaRatioAboveMaximum { ratio_spot, ratio_ma };
                log::error!("{}", err);
                return Err(err);
            }
            Ok(())
        }
        TransactionType::RedeemReserve => {
            if reserve_ratio_spot < RESERVE_RATIO_MIN as i128 {
                let err = ReserveError::SpotRatioBelowMinimum { ratio_spot, ratio_ma };
                log::error!("{}", err);
                return Err(err);
            }
            if reserve_ratio_ma < RESERVE_RATIO_MIN as i128 {
                let err = ReserveError::MaRatioBelowMinimum { ratio_spot, ratio_ma };
                log::error!("{}", err);
                return Err(err);
            }
            Ok(())
        }
        _ => {
            let err = ReserveError::NotAConversion { ratio_spot, ratio_ma };
            log::error!("{}", err);
            Err(err)
        }
    }
}
