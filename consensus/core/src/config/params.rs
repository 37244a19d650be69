use primitive_types::U256;

use crate::constants::MAGIC_SIZE;
use crate::errors::ConsensusError;

/// Consensus parameters consulted by the miner and the difficulty retarget.
///
/// Heights named `*_height` are fork activation points; the regime they
/// introduce applies to blocks strictly above them, except for the one-shot
/// big-jump height which applies to exactly that block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Params {
    /// The name of the network (e.g. "mainnet", "testnet", "regtest")
    pub network: String,
    /// Network magic; prefixes the persisted beat cache
    pub magic: [u8; MAGIC_SIZE],
    /// Easiest allowed target
    pub pow_limit: U256,
    pub pow_target_timespan: i64,
    pub pow_target_spacing: i64,
    pub pow_allow_min_difficulty_blocks: bool,
    pub pow_no_retargeting: bool,

    /// Beat-relative retarget sampling every 32nd block above this height
    pub hf2_height: u64,
    /// One-shot difficulty step at exactly this height
    pub hf3_height: u64,
    /// Beat-relative retarget sampling every block above this height
    pub hf4_height: u64,

    pub miner_confirmation_window: u64,
    pub miner_confirmation_window_hf4: u64,
    pub le_adjustment_interval: u64,
    pub hf4_adjustment_interval: u64,
    pub pow_target_mining_spacing: i64,
    pub pow_target_mining_spacing_hf4: i64,

    pub genesis_time: u32,
}

impl Params {
    pub fn mainnet() -> Self {
        Self {
            network: "mainnet".to_string(),
            magic: [0xf1, 0xcf, 0xa6, 0xd3],
            pow_limit: U256::from(0xffffu64) << 208,
            pow_target_timespan: 14 * 24 * 60 * 60,
            pow_target_spacing: 10 * 60,
            pow_allow_min_difficulty_blocks: false,
            pow_no_retargeting: false,
            hf2_height: 71_850,
            hf3_height: 81_150,
            hf4_height: 87_000,
            miner_confirmation_window: 2016,
            miner_confirmation_window_hf4: 144,
            le_adjustment_interval: 144,
            hf4_adjustment_interval: 1,
            pow_target_mining_spacing: 60,
            pow_target_mining_spacing_hf4: 60,
            genesis_time: 1_231_006_505,
        }
    }

    pub fn testnet() -> Self {
        Self {
            network: "testnet".to_string(),
            magic: [0x0d, 0x12, 0x0b, 0x07],
            pow_allow_min_difficulty_blocks: true,
            hf2_height: 2_100,
            hf3_height: 2_200,
            hf4_height: 2_300,
            genesis_time: 1_296_688_602,
            ..Self::mainnet()
        }
    }

    pub fn regtest() -> Self {
        Self {
            network: "regtest".to_string(),
            magic: [0xfa, 0xbf, 0xb5, 0xda],
            pow_limit: U256::from(0x7fffffu64) << 232,
            pow_allow_min_difficulty_blocks: true,
            pow_no_retargeting: true,
            genesis_time: 1_296_688_602,
            ..Self::testnet()
        }
    }

    pub fn for_network(network: &str) -> Result<Self, ConsensusError> {
        match network {
            "mainnet" => Ok(Self::mainnet()),
            "testnet" => Ok(Self::testnet()),
            "regtest" => Ok(Self::regtest()),
            other => Err(ConsensusError::UnknownNetwork(other.to_string())),
        }
    }

    /// Blocks between legacy retargets
    pub fn difficulty_adjustment_interval(&self) -> u64 {
        (self.pow_target_timespan / self.pow_target_spacing) as u64
    }
}

impl Default for Params {
    fn default() -> Self {
        Self::mainnet()
    }
}
