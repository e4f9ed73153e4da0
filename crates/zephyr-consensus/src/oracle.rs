//! Oracle pricing records for Zephyr.
//!
//! Each block carries a pricing record emitted by the off-chain oracle: the
//! ZEPH spot price, its moving average, the derived stablecoin and reserve
//! coin quotes, and (from the PR_UPDATE fork) the protocol reserve ratio.
//! The record is signed by the network's oracle key; a record that fails
//! validation makes the enclosing block invalid.
//!
//! Reference: zephyr/src/oracle/pricing_record.h, pricing_record.cpp
//!            zephyr/src/serialization/pricing_record.h

use rsa::{pkcs8::DecodePublicKey, Pkcs1v15Sign, RsaPublicKey};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use zephyr_types::constants::{
    Asset, HfVersion, NetworkConfig, COIN, PRICING_RECORD_VALID_BLOCKS,
    PRICING_RECORD_VALID_TIME_DIFF_FROM_BLOCK,
};

// =============================================================================
// Constants
// =============================================================================

/// Detached signature size over the canonical record message.
pub const SIGNATURE_SIZE: usize = 64;

/// Wire size of the pre-Djed record: three u64 fields, no signature.
pub const PRICING_RECORD_V1_SIZE: usize = 24;

/// Wire size of the Djed-era record: seven u64 fields plus signature.
pub const PRICING_RECORD_V2_SIZE: usize = 7 * 8 + SIGNATURE_SIZE;

/// Wire size of the current record: ten u64 fields plus signature.
pub const PRICING_RECORD_SIZE: usize = 10 * 8 + SIGNATURE_SIZE;

// =============================================================================
// Error Type
// =============================================================================

#[derive(Debug, Error)]
pub enum OracleError {
    #[error("pricing records not allowed before the Djed hard fork")]
    NotEnabled,

    #[error("malformed oracle public key")]
    InvalidOracleKey,

    #[error("invalid pricing record signature")]
    InvalidSignature,

    #[error("pricing record timestamp {timestamp} is too far ahead of block timestamp {block_timestamp}")]
    TimestampFuture { timestamp: u64, block_timestamp: u64 },

    #[error("pricing record timestamp {timestamp} is not newer than previous block timestamp {last_block_timestamp}")]
    TimestampStale { timestamp: u64, last_block_timestamp: u64 },

    #[error("pricing record is missing required rates")]
    MissingRates,

    #[error("pricing record blob too short: need {needed} bytes, got {got}")]
    TruncatedRecord { needed: usize, got: usize },
}

// =============================================================================
// Pricing Record
// =============================================================================

/// Oracle-signed quote carried by each block.
///
/// All prices are atomic units: `spot` and `moving_average` quote ZEPH in
/// USD atomic units per whole ZEPH; `stable`/`reserve` (and their MAs) quote
/// ZEPHUSD/ZEPHRSV in ZEPH atomic units. Zero means "not quoted"; which
/// fields must be non-zero depends on the hard-fork version
/// (see [`PricingRecord::has_missing_rates`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingRecord {
    pub spot: u64,
    pub moving_average: u64,
    pub stable: u64,
    pub stable_ma: u64,
    pub reserve: u64,
    pub reserve_ma: u64,
    pub reserve_ratio: u64,
    pub reserve_ratio_ma: u64,
    pub timestamp: u64,
    #[serde(with = "sig_serde")]
    pub signature: [u8; SIGNATURE_SIZE],
}

/// Hex serialization for the fixed-size signature.
mod sig_serde {
    use super::SIGNATURE_SIZE;
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(bytes: &[u8; SIGNATURE_SIZE], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<[u8; SIGNATURE_SIZE], D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let bytes = hex::decode(&s).map_err(serde::de::Error::custom)?;
        bytes
            .try_into()
            .map_err(|_| serde::de::Error::custom("signature must be 64 bytes"))
    }
}

impl Default for PricingRecord {
    fn default() -> Self {
        Self {
            spot: 0,
            moving_average: 0,
            stable: 0,
            stable_ma: 0,
            reserve: 0,
            reserve_ma: 0,
            reserve_ratio: 0,
            reserve_ratio_ma: 0,
            timestamp: 0,
            signature: [0u8; SIGNATURE_SIZE],
        }
    }
}

impl PricingRecord {
    /// Check if every numeric field is zero and the signature is all zero.
    pub fn is_empty(&self) -> bool {
        *self == PricingRecord::default()
    }

    /// Spot price of an asset in the record's quote terms: ZEPH in USD
    /// atomic units, ZEPHUSD at par, ZEPHRSV in ZEPH atomic units.
    pub fn price_of(&self, asset: Asset) -> u64 {
        match asset {
            Asset::Zeph => self.spot,
            Asset::ZephUsd => COIN,
            Asset::ZephRsv => self.reserve,
        }
    }

    /// Returns true if any rate required at the given fork version is zero.
    ///
    /// The required set grows monotonically: the six price fields from Djed,
    /// `reserve_ratio` from PR_UPDATE, `reserve_ratio_ma` from V5.
    pub fn has_missing_rates(&self, hf_version: u8) -> bool {
        let mut missing = self.spot == 0
            || self.moving_average == 0
            || self.stable == 0
            || self.stable_ma == 0
            || self.reserve == 0
            || self.reserve_ma == 0;
        if hf_version >= HfVersion::PR_UPDATE {
            missing = missing || self.reserve_ratio == 0;
        }
        if hf_version >= HfVersion::V5 {
            missing = missing || self.reserve_ratio_ma == 0;
        }
        missing
    }

    /// The canonical JSON the oracle signed, byte-exact.
    ///
    /// The moving average was dropped from the message at PR_UPDATE.
    pub fn signature_message(&self, hf_version: u8) -> String {
        if hf_version >= HfVersion::PR_UPDATE {
            format!("{{\"spot\":{},\"timestamp\":{}}}", self.spot, self.timestamp)
        } else {
            format!(
                "{{\"spot\":{},\"moving_average\":{},\"timestamp\":{}}}",
                self.spot, self.moving_average, self.timestamp
            )
        }
    }

    /// Verify the record signature against a PEM-encoded oracle public key.
    ///
    /// The oracle signs the SHA-256 digest of the canonical message with its
    /// RSA key (PKCS#1 v1.5). The legacy 512-bit key is preserved bit-exact;
    /// do not substitute a different scheme.
    pub fn verify_signature(
        &self,
        oracle_public_key: &str,
        hf_version: u8,
    ) -> Result<(), OracleError> {
        let key = RsaPublicKey::from_public_key_pem(oracle_public_key)
            .map_err(|_| OracleError::InvalidOracleKey)?;
        let digest = Sha256::digest(self.signature_message(hf_version).as_bytes());
        key.verify(Pkcs1v15Sign::new::<Sha256>(), &digest, &self.signature)
            .map_err(|_| OracleError::InvalidSignature)
    }

    /// Validate the record for inclusion in a block.
    ///
    /// Before the Djed fork only empty records are allowed, and an empty
    /// record is always acceptable (conversions against it fail the
    /// missing-rates check instead). A populated record must be signed,
    /// strictly newer than the previous block, at most
    /// [`PRICING_RECORD_VALID_TIME_DIFF_FROM_BLOCK`] seconds ahead of the
    /// enclosing block, and complete for the fork version.
    pub fn valid(
        &self,
        config: &NetworkConfig,
        hf_version: u8,
        block_timestamp: u64,
        last_block_timestamp: u64,
    ) -> Result<(), OracleError> {
        if hf_version < HfVersion::DJED && !self.is_empty() {
            return Err(OracleError::NotEnabled);
        }
        if self.is_empty() {
            return Ok(());
        }

        self.verify_signature(config.oracle_public_key, hf_version)?;

        if self.timestamp > block_timestamp + PRICING_RECORD_VALID_TIME_DIFF_FROM_BLOCK {
            log::error!(
                "pricing record timestamp {} too far in the future of block {}",
                self.timestamp,
                block_timestamp
            );
            return Err(OracleError::TimestampFuture {
                timestamp: self.timestamp,
                block_timestamp,
            });
        }

        if self.timestamp <= last_block_timestamp {
            log::error!(
                "pricing record timestamp {} not newer than previous block {}",
                self.timestamp,
                last_block_timestamp
            );
            return Err(OracleError::TimestampStale {
                timestamp: self.timestamp,
                last_block_timestamp,
            });
        }

        if self.has_missing_rates(hf_version) {
            return Err(OracleError::MissingRates);
        }

        Ok(())
    }

    // =========================================================================
    // Wire Format
    // =========================================================================

    /// Decode a record from its versioned wire form.
    ///
    /// Layouts are little-endian and keyed on the fork version of the
    /// enclosing block:
    /// - pre-Djed: 24-byte legacy blob, field values ignored, maps to the
    ///   empty record
    /// - Djed..PR_UPDATE: seven u64 fields + signature (120 bytes)
    /// - PR_UPDATE and later: ten u64 fields + signature (144 bytes); the
    ///   ninth field is the reserved yield price slot
    pub fn from_bytes(bytes: &[u8], hf_version: u8) -> Result<Self, OracleError> {
        if hf_version >= HfVersion::PR_UPDATE {
            if bytes.len() < PRICING_RECORD_SIZE {
                return Err(OracleError::TruncatedRecord {
                    needed: PRICING_RECORD_SIZE,
                    got: bytes.len(),
                });
            }
            let mut r = Reader::new(bytes);
            let mut pr = PricingRecord {
                spot: r.u64(),
                moving_average: r.u64(),
                stable: r.u64(),
                stable_ma: r.u64(),
                reserve: r.u64(),
                reserve_ma: r.u64(),
                reserve_ratio: r.u64(),
                reserve_ratio_ma: r.u64(),
                ..Default::default()
            };
            let _yield_price = r.u64();
            pr.timestamp = r.u64();
            pr.signature = r.signature();
            Ok(pr)
        } else if hf_version >= HfVersion::DJED {
            if bytes.len() < PRICING_RECORD_V2_SIZE {
                return Err(OracleError::TruncatedRecord {
                    needed: PRICING_RECORD_V2_SIZE,
                    got: bytes.len(),
                });
            }
            let mut r = Reader::new(bytes);
            let mut pr = PricingRecord {
                spot: r.u64(),
                moving_average: r.u64(),
                stable: r.u64(),
                stable_ma: r.u64(),
                reserve: r.u64(),
                reserve_ma: r.u64(),
                timestamp: r.u64(),
                ..Default::default()
            };
            pr.signature = r.signature();
            Ok(pr)
        } else {
            if bytes.len() < PRICING_RECORD_V1_SIZE {
                return Err(OracleError::TruncatedRecord {
                    needed: PRICING_RECORD_V1_SIZE,
                    got: bytes.len(),
                });
            }
            // Legacy three-field records predate the reserve; their values
            // are ignored and the record reads back empty.
            Ok(PricingRecord::default())
        }
    }

    /// Encode the record in the wire form of the given fork version.
    pub fn to_bytes(&self, hf_version: u8) -> Vec<u8> {
        if hf_version >= HfVersion::PR_UPDATE {
            let mut out = Vec::with_capacity(PRICING_RECORD_SIZE);
            for field in [
                self.spot,
                self.moving_average,
                self.stable,
                self.stable_ma,
                self.reserve,
                self.reserve_ma,
                self.reserve_ratio,
                self.reserve_ratio_ma,
                0u64, // reserved yield price slot
                self.timestamp,
            ] {
                out.extend_from_slice(&field.to_le_bytes());
            }
            out.extend_from_slice(&self.signature);
            out
        } else if hf_version >= HfVersion::DJED {
            let mut out = Vec::with_capacity(PRICING_RECORD_V2_SIZE);
            for field in [
                self.spot,
                self.moving_average,
                self.stable,
                self.stable_ma,
                self.reserve,
                self.reserve_ma,
                self.timestamp,
            ] {
                out.extend_from_slice(&field.to_le_bytes());
            }
            out.extend_from_slice(&self.signature);
            out
        } else {
            vec![0u8; PRICING_RECORD_V1_SIZE]
        }
    }
}

/// Little-endian field reader over a length-checked blob.
struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn u64(&mut self) -> u64 {
        let mut buf = [0u8; 8];
        buf.copy_from_slice(&self.bytes[self.pos..self.pos + 8]);
        self.pos += 8;
        u64::from_le_bytes(buf)
    }

    fn signature(&mut self) -> [u8; SIGNATURE_SIZE] {
        let mut buf = [0u8; SIGNATURE_SIZE];
        buf.copy_from_slice(&self.bytes[self.pos..self.pos + SIGNATURE_SIZE]);
        self.pos += SIGNATURE_SIZE;
        buf
    }
}

// =============================================================================
// Record / Height Pairing
// =============================================================================

/// Check that a conversion quoting the pricing record at `pr_height` is
/// acceptable in a block at `current_height`: the record must come from an
/// earlier block and be at most [`PRICING_RECORD_VALID_BLOCKS`] blocks old.
pub fn tx_pr_height_valid(current_height: u64, pr_height: u64) -> bool {
    if pr_height >= current_height {
        return false;
    }
    if current_height - PRICING_RECORD_VALID_BLOCKS > pr_height {
        return false;
    }
    true
}
