//! Asset identifiers for native denominations and CW20 tokens.

use cosmwasm_schema::cw_serde;
use std::fmt;

/// The kind of asset a door moves on its own chain.
#[cw_serde]
pub enum AssetInfo {
    /// Native bank denomination (e.g. "uluna")
    Native { denom: String },
    /// CW20 token contract
    Cw20 { contract_addr: String },
}

impl AssetInfo {
    pub fn is_native(&self) -> bool {
        matches!(self, AssetInfo::Native { .. })
    }

    /// Denom or contract address, whichever identifies the asset.
    pub fn id(&self) -> &str {
        match self {
            AssetInfo::Native { denom } => denom,
            AssetInfo::Cw20 { contract_addr } => contract_addr,
        }
    }
}

impl fmt::Display for AssetInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetInfo::Native { denom } => write!(f, "native:{}", denom),
            AssetInfo::Cw20 { contract_addr } => write!(f, "cw20:{}", contract_addr),
        }
    }
}
