//! State definitions for the XChain Door contract
//!
//! All bridge-scoped maps are keyed by the 32-byte bridge key so that both
//! doors and every witness address the same records.

use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Addr, Binary, Uint128};
use cw_storage_plus::{Item, Map};

use common::{AssetInfo, BridgeConfig, BridgeParams, ChainSide, Issue};

// ============================================================================
// Core Configuration
// ============================================================================

/// Contract configuration
#[cw_serde]
pub struct Config {
    /// Owner; `None` once ownership has been renounced
    pub owner: Option<Addr>,
    /// Multi-party authorized account allowed to use `Execute`
    pub safe: Addr,
    /// Whether the door is currently paused
    pub paused: bool,
    /// Denomination used for signature rewards and bridge request rewards
    pub native_denom: String,
    /// Lower bound for any bridge's signature reward
    pub min_signature_reward: Uint128,
    /// Reward required to file a bridge request
    pub min_create_bridge_reward: Uint128,
}

// ============================================================================
// Bridge Registry
// ============================================================================

/// Registered bridge
#[cw_serde]
pub struct Bridge {
    pub config: BridgeConfig,
    pub params: BridgeParams,
    /// Side this door plays in the bridge
    pub local_side: ChainSide,
    /// Position in registration order, used for pagination
    pub index: u64,
}

impl Bridge {
    pub fn local_issue(&self) -> &Issue {
        self.config.issue_for(self.local_side)
    }

    pub fn local_asset(&self) -> AssetInfo {
        self.local_issue().asset_info()
    }
}

/// Request for a new bridge, filed by anyone with a reward
#[cw_serde]
pub struct BridgeRequest {
    pub id: u64,
    pub token: String,
    pub requester: Addr,
    pub reward: Uint128,
}

// ============================================================================
// Claims & Attestations
// ============================================================================

/// A witness's current vote on a claim
#[cw_serde]
pub struct ClaimVote {
    pub amount: Uint128,
    /// Source-chain sender of the commit
    pub sender: String,
    /// Local destination, `None` for commits without address
    pub destination: Option<String>,
}

/// Claim id allocated on this door
#[cw_serde]
pub struct BridgeClaim {
    pub claim_id: u64,
    /// Account that allocated the claim id
    pub creator: Addr,
    /// Expected source-chain sender of the matching commit
    pub sender: String,
    /// Native reward posted by the creator
    pub signature_reward: Uint128,
    /// Value agreed by quorum, if currently reached
    pub attested: Option<ClaimVote>,
    pub resolved: bool,
}

/// A witness's current vote on an account creation
#[cw_serde]
pub struct CreateAccountVote {
    pub amount: Uint128,
    pub signature_reward: Uint128,
}

/// Account creation record on this door
#[cw_serde]
pub struct BridgeCreateAccount {
    pub destination: Addr,
    pub attested: Option<CreateAccountVote>,
    pub created: bool,
}

// ============================================================================
// Witnesses
// ============================================================================

/// Quorum rule applied to a witness set
#[cw_serde]
#[derive(Default)]
pub enum QuorumPolicy {
    /// Strictly more than half of the set
    #[default]
    SimpleMajority,
    /// Fixed number of votes, must exceed half of the set
    Threshold { count: u32 },
}

/// Versioned witness set
#[cw_serde]
pub struct WitnessSet {
    pub version: u64,
    pub witnesses: Vec<Addr>,
    pub quorum: QuorumPolicy,
}

// ============================================================================
// Storage
// ============================================================================

pub const CONTRACT_NAME: &str = "crates.io:xchain-door";
pub const CONTRACT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Fixed page size of `BridgesPaginated`
pub const BRIDGE_PAGE_SIZE: u64 = 20;
pub const DEFAULT_LIMIT: u32 = 10;
pub const MAX_LIMIT: u32 = 30;

pub const CONFIG: Item<Config> = Item::new("config");

/// bridge key -> bridge
pub const BRIDGES: Map<&[u8], Bridge> = Map::new("bridges");
/// registration index -> bridge key
pub const BRIDGE_INDEX: Map<u64, Binary> = Map::new("bridge_index");
pub const BRIDGE_COUNT: Item<u64> = Item::new("bridge_count");
/// local token id -> bridge key
pub const REGISTERED_TOKENS: Map<&str, Binary> = Map::new("registered_tokens");

pub const BRIDGE_REQUESTS: Map<u64, BridgeRequest> = Map::new("bridge_requests");
pub const BRIDGE_REQUEST_COUNT: Item<u64> = Item::new("bridge_request_count");

/// bridge key -> last allocated claim id
pub const CLAIM_COUNTERS: Map<&[u8], u64> = Map::new("claim_counters");
pub const CLAIMS: Map<(&[u8], u64), BridgeClaim> = Map::new("claims");
pub const CLAIM_VOTES: Map<(&[u8], u64, &Addr), ClaimVote> = Map::new("claim_votes");

pub const CREATE_ACCOUNTS: Map<(&[u8], &str), BridgeCreateAccount> = Map::new("create_accounts");
pub const CREATE_ACCOUNT_VOTES: Map<(&[u8], &str, &Addr), CreateAccountVote> =
    Map::new("create_account_votes");

pub const GLOBAL_WITNESSES: Item<WitnessSet> = Item::new("global_witnesses");
/// Per-bridge overrides of the global witness set
pub const BRIDGE_WITNESSES: Map<&[u8], WitnessSet> = Map::new("bridge_witnesses");

/// bridge key -> door-local asset held for releases
pub const ESCROW: Map<&[u8], Uint128> = Map::new("escrow");
