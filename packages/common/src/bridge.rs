//! Bridge definitions and canonical bridge key computation.
//!
//! A bridge is identified by its locking side (where assets are escrowed) and
//! its issuing side (where the wrapped representation lives). The bridge key
//! is a keccak256 digest over both sides so that both doors, and every
//! witness, derive the same 32-byte identifier.
//!
//! # Byte Layout
//! Each field is encoded as a dynamic ABI `bytes` value:
//! - 32 bytes: field length (uint256, big-endian, left-padded)
//! - N bytes:  field data, right-padded with zeroes to a multiple of 32
//!
//! Field order: locking door, locking issuer, locking currency,
//! issuing door, issuing issuer, issuing currency.

use cosmwasm_schema::cw_serde;
use cosmwasm_std::Uint128;
use tiny_keccak::{Hasher, Keccak};

use crate::asset::AssetInfo;

/// Token description on one side of a bridge.
///
/// An empty `issuer` denotes the chain's native asset, in which case
/// `currency` is the bank denomination. Otherwise `issuer` is the CW20
/// contract address and `currency` is its symbol.
#[cw_serde]
pub struct Issue {
    pub issuer: String,
    pub currency: String,
}

impl Issue {
    pub fn native(denom: impl Into<String>) -> Self {
        Self {
            issuer: String::new(),
            currency: denom.into(),
        }
    }

    pub fn cw20(contract_addr: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self {
            issuer: contract_addr.into(),
            currency: symbol.into(),
        }
    }

    pub fn is_native(&self) -> bool {
        self.issuer.is_empty()
    }

    /// Token identifier used for registration lookups.
    pub fn token_id(&self) -> &str {
        if self.is_native() {
            &self.currency
        } else {
            &self.issuer
        }
    }

    pub fn asset_info(&self) -> AssetInfo {
        if self.is_native() {
            AssetInfo::Native {
                denom: self.currency.clone(),
            }
        } else {
            AssetInfo::Cw20 {
                contract_addr: self.issuer.clone(),
            }
        }
    }
}

/// Which side of a bridge a door plays.
#[cw_serde]
#[derive(Copy, Eq, Hash)]
pub enum ChainSide {
    Locking,
    Issuing,
}

impl ChainSide {
    pub fn opposite(self) -> Self {
        match self {
            ChainSide::Locking => ChainSide::Issuing,
            ChainSide::Issuing => ChainSide::Locking,
        }
    }
}

/// Full description of a bridge between two doors.
#[cw_serde]
pub struct BridgeConfig {
    pub locking_chain_door: String,
    pub locking_chain_issue: Issue,
    pub issuing_chain_door: String,
    pub issuing_chain_issue: Issue,
}

impl BridgeConfig {
    pub fn key(&self) -> [u8; 32] {
        bridge_key(self)
    }

    /// Side played by `door`, if it is one of the two doors of this bridge.
    pub fn side_of(&self, door: &str) -> Option<ChainSide> {
        if self.locking_chain_door == door {
            Some(ChainSide::Locking)
        } else if self.issuing_chain_door == door {
            Some(ChainSide::Issuing)
        } else {
            None
        }
    }

    pub fn door_for(&self, side: ChainSide) -> &str {
        match side {
            ChainSide::Locking => &self.locking_chain_door,
            ChainSide::Issuing => &self.issuing_chain_door,
        }
    }

    pub fn issue_for(&self, side: ChainSide) -> &Issue {
        match side {
            ChainSide::Locking => &self.locking_chain_issue,
            ChainSide::Issuing => &self.issuing_chain_issue,
        }
    }
}

/// Economic parameters of a bridge.
#[cw_serde]
pub struct BridgeParams {
    /// Minimum amount a create-account commit must carry
    pub min_create_amount: Uint128,
    /// Reward posted with every claim id, split among witnesses on success
    pub signature_reward: Uint128,
}

/// Compute keccak256 hash of arbitrary data
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak::v256();
    hasher.update(data);
    let mut output = [0u8; 32];
    hasher.finalize(&mut output);
    output
}

fn encode_bytes(out: &mut Vec<u8>, data: &[u8]) {
    let mut len = [0u8; 32];
    len[24..].copy_from_slice(&(data.len() as u64).to_be_bytes());
    out.extend_from_slice(&len);
    out.extend_from_slice(data);
    let pad = (32 - data.len() % 32) % 32;
    out.extend(std::iter::repeat(0u8).take(pad));
}

/// Compute the canonical bridge key of a bridge configuration.
pub fn bridge_key(config: &BridgeConfig) -> [u8; 32] {
    let fields: [&str; 6] = [
        &config.locking_chain_door,
        &config.locking_chain_issue.issuer,
        &config.locking_chain_issue.currency,
        &config.issuing_chain_door,
        &config.issuing_chain_issue.issuer,
        &config.issuing_chain_issue.currency,
    ];

    let mut data = Vec::with_capacity(fields.len() * 96);
    for field in fields {
        encode_bytes(&mut data, field.as_bytes());
    }
    keccak256(&data)
}

/// Convert bytes32 to a 0x-prefixed hex string
pub fn bytes32_to_hex(bytes: &[u8; 32]) -> String {
    format!("0x{}", hex::encode(bytes))
}
