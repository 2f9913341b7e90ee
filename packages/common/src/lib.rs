//! Common - Shared Types and Utilities for XChain Door
//!
//! This package provides the bridge definitions shared by the door contract
//! and the off-chain witness: asset identifiers, bridge configurations and
//! the canonical bridge key derivation both sides must agree on.

pub mod asset;
pub mod bridge;

pub use asset::AssetInfo;
pub use bridge::{
    bridge_key, bytes32_to_hex, keccak256, BridgeConfig, BridgeParams, ChainSide, Issue,
};
