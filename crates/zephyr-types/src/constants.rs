//! Zephyr network constants, asset types, and hard-fork schedules.
//!
//! Reference: zephyr/src/cryptonote_config.h, hardforks.cpp, oracle/asset_types.h

use serde::{Deserialize, Serialize};

// =============================================================================
// Network Types
// =============================================================================

/// Network type identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Network {
    Mainnet,
    Testnet,
    Stagenet,
}

// =============================================================================
// Amounts
// =============================================================================

/// Atomic units per coin (10^12).
pub const COIN: u64 = 1_000_000_000_000;

/// Number of decimal places for display.
pub const DISPLAY_DECIMAL_POINT: u32 = 12;

/// Format an atomic amount as a human-readable string (e.g., 1.234).
pub fn format_amount(atomic: u64) -> String {
    let whole = atomic / COIN;
    let frac = atomic % COIN;
    if frac == 0 {
        format!("{}.0", whole)
    } else {
        let frac_str = format!("{:012}", frac);
        let trimmed = frac_str.trim_end_matches('0');
        format!("{}.{}", whole, trimmed)
    }
}

/// Parse a human-readable amount string to atomic units.
pub fn parse_amount(s: &str) -> Option<u64> {
    let s = s.trim();
    let (whole_str, frac_str) = if let Some(dot_pos) = s.find('.') {
        (&s[..dot_pos], &s[dot_pos + 1..])
    } else {
        (s, "")
    };

    let whole: u64 = whole_str.parse().ok()?;
    let frac: u64 = if frac_str.is_empty() {
        0
    } else {
        if frac_str.len() > 12 {
            return None;
        }
        let padded = format!("{:0<12}", frac_str);
        padded.parse().ok()?
    };

    whole.checked_mul(COIN)?.checked_add(frac)
}

// =============================================================================
// Asset Types
// =============================================================================

/// Protocol asset identifier.
///
/// The closed set of assets the monetary policy operates on. String tags
/// exist only at the serialization boundary; a tag outside this set (such as
/// the reserved `ZYIELD`) is rejected wherever tags are parsed.
///
/// Reference: zephyr/src/oracle/asset_types.h
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Asset {
    /// Native coin, backs the reserve.
    Zeph,
    /// USD-pegged stablecoin.
    ZephUsd,
    /// Equity-like reserve coin.
    ZephRsv,
}

impl Asset {
    /// The tag written into transactions.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Zeph => "ZEPH",
            Self::ZephUsd => "ZEPHUSD",
            Self::ZephRsv => "ZEPHRSV",
        }
    }

    /// Parse from the on-chain string tag.
    pub fn from_tag(s: &str) -> Option<Self> {
        match s {
            "ZEPH" => Some(Self::Zeph),
            "ZEPHUSD" => Some(Self::ZephUsd),
            "ZEPHRSV" => Some(Self::ZephRsv),
            _ => None,
        }
    }
}

impl std::fmt::Display for Asset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

// =============================================================================
// Transaction Types
// =============================================================================

/// Zephyr transaction type, derived from the (source, destination) asset pair.
///
/// Transfers preserve the asset type; the four conversions trade one asset
/// for another through the protocol reserve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionType {
    /// ZEPH -> ZEPH
    Transfer,
    /// ZEPHUSD -> ZEPHUSD
    StableTransfer,
    /// ZEPHRSV -> ZEPHRSV
    ReserveTransfer,
    /// ZEPH -> ZEPHUSD
    MintStable,
    /// ZEPHUSD -> ZEPH
    RedeemStable,
    /// ZEPH -> ZEPHRSV
    MintReserve,
    /// ZEPHRSV -> ZEPH
    RedeemReserve,
}

impl TransactionType {
    /// Whether this type mints or redeems through the reserve.
    pub fn is_conversion(&self) -> bool {
        matches!(
            self,
            Self::MintStable | Self::RedeemStable | Self::MintReserve | Self::RedeemReserve
        )
    }
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transfer => write!(f, "TRANSFER"),
            Self::StableTransfer => write!(f, "STABLE_TRANSFER"),
            Self::ReserveTransfer => write!(f, "RESERVE_TRANSFER"),
            Self::MintStable => write!(f, "MINT_STABLE"),
            Self::RedeemStable => write!(f, "REDEEM_STABLE"),
            Self::MintReserve => write!(f, "MINT_RESERVE"),
            Self::RedeemReserve => write!(f, "REDEEM_RESERVE"),
        }
    }
}

// =============================================================================
// Hard Fork Versions
// =============================================================================

/// Hard fork version constants for feature gating.
///
/// Reference: zephyr/src/cryptonote_config.h HF_VERSION_* defines
pub struct HfVersion;

impl HfVersion {
    /// Djed launch: pricing records become mandatory, conversions enabled.
    pub const DJED: u8 = 3;
    /// Pricing record update: extended record layout, reserve_ratio carried
    /// in-record, two-field signature message.
    pub const PR_UPDATE: u8 = 4;
    /// Consensus hardening: integer reserve-ratio math, revised conversion
    /// fees, reserve_ratio_ma carried in-record.
    pub const V5: u8 = 5;
}

// =============================================================================
// Monetary Policy Constants
// =============================================================================

/// A conversion must quote a pricing record at most this many blocks old.
pub const PRICING_RECORD_VALID_BLOCKS: u64 = 10;

/// Maximum seconds a pricing record timestamp may lead the block timestamp.
pub const PRICING_RECORD_VALID_TIME_DIFF_FROM_BLOCK: u64 = 120;

/// Trailing window (blocks) for oracle moving averages.
pub const MOVING_AVERAGE_WINDOW: u64 = 720;

/// Minimum reserve ratio (400%, COIN-scaled) gating stable mints and
/// reserve redeems.
pub const RESERVE_RATIO_MIN: u64 = 4 * COIN;

/// Maximum reserve ratio (800%, COIN-scaled) gating reserve mints.
pub const RESERVE_RATIO_MAX: u64 = 8 * COIN;

/// Below this many circulating stablecoins, reserve-coin minting is
/// unrestricted (bootstrap corridor).
pub const RESERVE_RATIO_UNRESTRICTED_STABLE_THRESHOLD: u64 = 100 * COIN;

/// Reserve coin price floor: 0.5 ZEPH.
pub const PRICE_R_MIN: u64 = 500_000_000_000;

// =============================================================================
// Network Configuration
// =============================================================================

/// Hard fork activation: (version, height, time).
#[derive(Debug, Clone, Copy)]
pub struct HardFork {
    pub version: u8,
    pub height: u64,
    pub time: u64,
}

/// Network-specific configuration.
///
/// Passed explicitly to every function that consumes oracle keys or
/// activation heights; there is no process-wide singleton.
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    pub network: Network,
    pub p2p_port: u16,
    pub rpc_port: u16,
    pub zmq_rpc_port: u16,
    pub governance_wallet_address: &'static str,
    pub oracle_urls: [&'static str; 3],
    /// PEM-encoded RSA public key the oracle signs pricing records with.
    pub oracle_public_key: &'static str,
    pub hard_forks: &'static [HardFork],
}

impl NetworkConfig {
    /// Get the hard fork version active at a given block height.
    pub fn hf_version_for_height(&self, height: u64) -> u8 {
        let mut active_version = 1u8;
        for hf in self.hard_forks {
            if height >= hf.height && hf.version > active_version {
                active_version = hf.version;
            }
        }
        active_version
    }

    /// Check if a specific hard fork is active at a given height.
    pub fn is_hf_active(&self, hf_version: u8, height: u64) -> bool {
        self.hf_version_for_height(height) >= hf_version
    }
}

static MAINNET_HARD_FORKS: [HardFork; 10] = [
    HardFork { version: 1, height: 1, time: 1685318400 },
    HardFork { version: 2, height: 2000, time: 1685509200 },
    HardFork { version: 3, height: 89300, time: 1696150800 },
    HardFork { version: 4, height: 294000, time: 1720882800 },
    HardFork { version: 5, height: 295000, time: 1721001600 },
    HardFork { version: 6, height: 360000, time: 1728817200 },
    HardFork { version: 7, height: 433000, time: 1737590400 },
    HardFork { version: 8, height: 481500, time: 1743447600 },
    HardFork { version: 9, height: 508000, time: 1746644400 },
    HardFork { version: 10, height: 511000, time: 1746984600 },
];

static TESTNET_HARD_FORKS: [HardFork; 3] = [
    HardFork { version: 1, height: 1, time: 1685318400 },
    HardFork { version: 2, height: 20, time: 1685509200 },
    HardFork { version: 3, height: 100, time: 1688814599 },
];

static STAGENET_HARD_FORKS: [HardFork; 3] = [
    HardFork { version: 1, height: 1, time: 1685318400 },
    HardFork { version: 2, height: 20, time: 1685509200 },
    HardFork { version: 3, height: 100, time: 1688814599 },
];

pub static MAINNET_CONFIG: NetworkConfig = NetworkConfig {
    network: Network::Mainnet,
    p2p_port: 17766,
    rpc_port: 17767,
    zmq_rpc_port: 17768,
    governance_wallet_address: "ZEPHYR2jZrZXenfKejCcCmEkRzUYwXjgWfJF4yzdCznKQ8yQ3g3PsWUbZjzfzHbeTPMgXVmEuDKQUB9rPkgtVwyWRh9knU4EpfJ57",
    oracle_urls: [
        "oracle.zephyrprotocol.com:443",
        "oracle-02.zephyrprotocol.com:443",
        "oracle-03.zephyrprotocol.com:443",
    ],
    oracle_public_key: "-----BEGIN PUBLIC KEY-----\n\
        MFwwDQYJKoZIhvcNAQEBBQADSwAwSAJBAO5hVuc6ylYMbj3WhqOMoAcJ0SD4e3zW\n\
        edsUmhQeYwBkelAaFyxhX4ZotP+b/cFr2mX5iuND1znEnMZkyg+YmtkCAwEAAQ==\n\
        -----END PUBLIC KEY-----\n",
    hard_forks: &MAINNET_HARD_FORKS,
};

pub static TESTNET_CONFIG: NetworkConfig = NetworkConfig {
    network: Network::Testnet,
    p2p_port: 27766,
    rpc_port: 27767,
    zmq_rpc_port: 27768,
    governance_wallet_address: "ZPHTjbspy3MQWHUVsnRVWUhcWEKnaEiK3FBpsuwPzcCN1zDAuWGjFskcHC9jo6e8fF4UDzFbe5LGnU4ychM48E8D8ukYphLM6qu",
    oracle_urls: [
        "testnet-oracle.zephyrprotocol.com:443",
        "testnet-oracle-02.zephyrprotocol.com:443",
        "testnet-oracle-03.zephyrprotocol.com:443",
    ],
    oracle_public_key: "-----BEGIN PUBLIC KEY-----\n\
        MFwwDQYJKoZIhvcNAQEBBQADSwAwSAJBAMdjZLVtXH/nK3L+fXyaquZFrkHpKimc\n\
        681dPqESb8CCZrckTyd3O0xGegU8dVIFUWM8mzylv09zlgrzigkfedECAwEAAQ==\n\
        -----END PUBLIC KEY-----\n",
    hard_forks: &TESTNET_HARD_FORKS,
};

pub static STAGENET_CONFIG: NetworkConfig = NetworkConfig {
    network: Network::Stagenet,
    p2p_port: 37766,
    rpc_port: 37767,
    zmq_rpc_port: 37768,
    governance_wallet_address: "ZPHSjoq9e8pB41HgzKLJ94HPWN9eKhZhqYdFrvf51KUjcevE8SUhh8CYw65g5KYDBqaUsZZLu1NhnL3CvGikQGFEjdGV1hNzVL5",
    oracle_urls: [
        "testnet-oracle.zephyrprotocol.com:443",
        "testnet-oracle-02.zephyrprotocol.com:443",
        "testnet-oracle-03.zephyrprotocol.com:443",
    ],
    oracle_public_key: "-----BEGIN PUBLIC KEY-----\n\
        MFwwDQYJKoZIhvcNAQEBBQADSwAwSAJBAMdjZLVtXH/nK3L+fXyaquZFrkHpKimc\n\
        681dPqESb8CCZrckTyd3O0xGegU8dVIFUWM8mzylv09zlgrzigkfedECAwEAAQ==\n\
        -----END PUBLIC KEY-----\n",
    hard_forks: &STAGENET_HARD_FORKS,
};

/// Get the network configuration for a given network.
pub fn network_config(network: Network) -> &'static NetworkConfig {
    match network {
        Network::Mainnet => &MAINNET_CONFIG,
        Network::Testnet => &TESTNET_CONFIG,
        Network::Stagenet => &STAGENET_CONFIG,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(0), "0.0");
        assert_eq!(format_amount(COIN), "1.0");
        assert_eq!(format_amount(1_234_000_000_000), "1.234");
        assert_eq!(format_amount(COIN + 1), "1.000000000001");
        assert_eq!(format_amount(500_000_000_000), "0.5");
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("0"), Some(0));
        assert_eq!(parse_amount("1.0"), Some(COIN));
        assert_eq!(parse_amount("1.234"), Some(1_234_000_000_000));
        assert_eq!(parse_amount("0.5"), Some(500_000_000_000));
        assert_eq!(parse_amount("100"), Some(100 * COIN));
        assert_eq!(parse_amount("0.0000000000001"), None);
    }

    #[test]
    fn test_asset_tag_roundtrip() {
        for asset in [Asset::Zeph, Asset::ZephUsd, Asset::ZephRsv] {
            assert_eq!(Asset::from_tag(asset.tag()), Some(asset));
        }
        assert_eq!(Asset::from_tag("ZYIELD"), None);
        assert_eq!(Asset::from_tag("XMR"), None);
        assert_eq!(Asset::from_tag("zeph"), None);
    }

    #[test]
    fn test_conversion_flag() {
        assert!(!TransactionType::Transfer.is_conversion());
        assert!(!TransactionType::StableTransfer.is_conversion());
        assert!(!TransactionType::ReserveTransfer.is_conversion());
        assert!(TransactionType::MintStable.is_conversion());
        assert!(TransactionType::RedeemStable.is_conversion());
        assert!(TransactionType::MintReserve.is_conversion());
        assert!(TransactionType::RedeemReserve.is_conversion());
    }

    #[test]
    fn test_hf_version_mainnet() {
        let config = network_config(Network::Mainnet);
        assert_eq!(config.hf_version_for_height(0), 1);
        assert_eq!(config.hf_version_for_height(1), 1);
        assert_eq!(config.hf_version_for_height(1999), 1);
        assert_eq!(config.hf_version_for_height(2000), 2);
        assert_eq!(config.hf_version_for_height(89299), 2);
        assert_eq!(config.hf_version_for_height(89300), HfVersion::DJED);
        assert_eq!(config.hf_version_for_height(293999), HfVersion::DJED);
        assert_eq!(config.hf_version_for_height(294000), HfVersion::PR_UPDATE);
        assert_eq!(config.hf_version_for_height(294999), HfVersion::PR_UPDATE);
        assert_eq!(config.hf_version_for_height(295000), HfVersion::V5);
        assert_eq!(config.hf_version_for_height(360000), 6);
        assert_eq!(config.hf_version_for_height(433000), 7);
        assert_eq!(config.hf_version_for_height(481500), 8);
        assert_eq!(config.hf_version_for_height(508000), 9);
        assert_eq!(config.hf_version_for_height(511000), 10);
        assert_eq!(config.hf_version_for_height(1_000_000), 10);
    }

    #[test]
    fn test_hf_version_testnet() {
        let config = network_config(Network::Testnet);
        assert_eq!(config.hf_version_for_height(0), 1);
        assert_eq!(config.hf_version_for_height(19), 1);
        assert_eq!(config.hf_version_for_height(20), 2);
        assert_eq!(config.hf_version_for_height(99), 2);
        assert_eq!(config.hf_version_for_height(100), HfVersion::DJED);
        assert_eq!(config.hf_version_for_height(10_000), HfVersion::DJED);
    }

    #[test]
    fn test_is_hf_active() {
        let config = network_config(Network::Mainnet);
        assert!(!config.is_hf_active(HfVersion::DJED, 89299));
        assert!(config.is_hf_active(HfVersion::DJED, 89300));
        assert!(!config.is_hf_active(HfVersion::V5, 294999));
        assert!(config.is_hf_active(HfVersion::V5, 295000));
    }

    #[test]
    fn test_stagenet_matches_testnet_schedule() {
        let testnet = network_config(Network::Testnet);
        let stagenet = network_config(Network::Stagenet);
        for h in [0u64, 1, 19, 20, 99, 100, 5000] {
            assert_eq!(
                testnet.hf_version_for_height(h),
                stagenet.hf_version_for_height(h),
                "HF mismatch at height {}",
                h
            );
        }
    }
}
