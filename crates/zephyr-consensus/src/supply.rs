//! Circulating-supply snapshot.
//!
//! The storage engine tracks per-asset circulating totals block by block and
//! hands them to the policy core as `(asset_tag, decimal_string)` pairs.
//! This module parses that shape into the three 128-bit scalars the pricing
//! and guard formulas consume. Read-only; nothing here mutates chain state.
//!
//! Reference: zephyr/src/blockchain_db/blockchain_db.cpp get_circulating_supply()
//!            zephyr/src/cryptonote_core/cryptonote_tx_utils.cpp
//!            get_circulating_asset_amounts()

use thiserror::Error;
use zephyr_types::constants::Asset;

#[derive(Debug, Error)]
pub enum SupplyError {
    #[error("malformed circulating amount for {asset}: {value:?}")]
    InvalidAmount { asset: String, value: String },
}

/// In-circulation totals at a given height, atomic units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CirculatingSupply {
    /// ZEPH held by the protocol reserve.
    pub zeph_reserve: u128,
    /// Circulating ZEPHUSD.
    pub num_stables: u128,
    /// Circulating ZEPHRSV.
    pub num_reserves: u128,
}

impl CirculatingSupply {
    pub fn new(zeph_reserve: u128, num_stables: u128, num_reserves: u128) -> Self {
        Self {
            zeph_reserve,
            num_stables,
            num_reserves,
        }
    }

    /// Build a snapshot from the storage engine's tag/amount pairs.
    ///
    /// Tags outside the asset set are ignored (the reserved ZYIELD rows of
    /// newer databases among them); the first occurrence of a tag wins.
    pub fn from_pairs(pairs: &[(String, String)]) -> Result<Self, SupplyError> {
        let mut supply = CirculatingSupply::default();
        let mut seen = [false; 3];

        for (tag, amount) in pairs {
            let Some(asset) = Asset::from_tag(tag) else {
                continue;
            };
            let idx = asset as usize;
            if seen[idx] {
                continue;
            }
            seen[idx] = true;

            let value: u128 =
                amount
                    .parse()
                    .map_err(|_| SupplyError::InvalidAmount {
                        asset: tag.clone(),
                        value: amount.clone(),
                    })?;
            match asset {
                Asset::Zeph => supply.zeph_reserve = value,
                Asset::ZephUsd => supply.num_stables = value,
                Asset::ZephRsv => supply.num_reserves = value,
            }
        }

        Ok(supply)
    }
}
