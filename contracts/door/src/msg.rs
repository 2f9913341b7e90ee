//! Message types for the XChain Door contract
//!
//! This module defines all messages for instantiation, execution, and queries.

use common::{AssetInfo, BridgeConfig, BridgeParams};
use cosmwasm_schema::{cw_serde, QueryResponses};
use cosmwasm_std::{Addr, Binary, Coin, Uint128};

use crate::state::{BridgeRequest, ClaimVote, CreateAccountVote, QuorumPolicy};

// ============================================================================
// Instantiate & Migrate
// ============================================================================

/// Migrate message
#[cw_serde]
pub struct MigrateMsg {}

/// Instantiate message
#[cw_serde]
pub struct InstantiateMsg {
    /// Owner address for registry and pause management
    pub owner: String,
    /// Multi-party authorized account allowed to call `Execute`
    pub safe: String,
    /// Denomination of signature and bridge request rewards (e.g. "uluna")
    pub native_denom: String,
    /// Lower bound for any bridge's signature reward
    pub min_signature_reward: Uint128,
    /// Reward required to file a bridge request
    pub min_create_bridge_reward: Uint128,
    /// Initial global witness set
    pub witnesses: Vec<String>,
    /// Quorum policy of the global set, simple majority when omitted
    pub quorum: Option<QuorumPolicy>,
}

// ============================================================================
// Execute Messages
// ============================================================================

/// Low-level operation performed by `Execute`
#[cw_serde]
pub enum OperationKind {
    /// Wasm execute on `target` with `data` and `value`
    Call,
    /// Bank send of `value` to `target`
    Send,
    /// `data` is an [`AdminMsg`] applied to this door
    SelfCall,
}

/// Execute messages
#[cw_serde]
pub enum ExecuteMsg {
    // ========================================================================
    // Bridge Registry
    // ========================================================================
    /// Register a bridge this door is part of (owner only)
    CreateBridge {
        config: BridgeConfig,
        params: BridgeParams,
    },

    /// Ask for a bridge to be created for `token`.
    /// Send at least `min_create_bridge_reward` of the native denom.
    CreateBridgeRequest { token: String },

    // ========================================================================
    // Claim Allocator
    // ========================================================================
    /// Reserve the next claim id of a bridge.
    /// Send at least the bridge's signature reward of the native denom.
    CreateClaimId {
        bridge_config: BridgeConfig,
        /// Source-chain account expected to commit for this claim
        sender: String,
    },

    // ========================================================================
    // Settlement
    // ========================================================================
    /// Commit native funds towards `claim_id` on the other chain.
    /// CW20 bridges commit through `Receive`.
    Commit {
        bridge_config: BridgeConfig,
        /// Destination on the other chain
        receiver: String,
        claim_id: u64,
        amount: Uint128,
    },

    /// Commit native funds leaving the destination to the claim's creator
    CommitWithoutAddress {
        bridge_config: BridgeConfig,
        claim_id: u64,
        amount: Uint128,
    },

    /// Commit funds that create and fund `destination` on the other chain.
    /// Send exactly `amount + signature_reward` of the native asset.
    CreateAccountCommit {
        bridge_config: BridgeConfig,
        destination: String,
        amount: Uint128,
        signature_reward: Uint128,
    },

    /// Pre-fund the door-local escrow of a bridge (owner only)
    FundEscrow { bridge_config: BridgeConfig },

    /// CW20 hook for commits and escrow funding of CW20 bridges
    Receive(cw20::Cw20ReceiveMsg),

    /// Release an attested claim to `destination`
    Claim {
        bridge_config: BridgeConfig,
        claim_id: u64,
        amount: Uint128,
        destination: String,
    },

    // ========================================================================
    // Attestations (witnesses only)
    // ========================================================================
    /// Vote on a commit observed on the other chain
    AddClaimAttestation {
        bridge_config: BridgeConfig,
        claim_id: u64,
        amount: Uint128,
        /// Source-chain sender of the commit
        sender: String,
        /// Local destination, omitted for commits without address
        destination: Option<String>,
    },

    /// Vote on an account creation commit observed on the other chain
    AddCreateAccountAttestation {
        bridge_config: BridgeConfig,
        destination: String,
        amount: Uint128,
        signature_reward: Uint128,
    },

    // ========================================================================
    // Access & Safety
    // ========================================================================
    /// Pause the door (owner only)
    Pause {},

    /// Unpause the door (owner only)
    Unpause {},

    /// Hand ownership to `new_owner` (owner only)
    TransferOwnership { new_owner: String },

    /// Give up ownership permanently (owner only)
    RenounceOwnership {},

    /// Privileged low-level execution (safe only)
    Execute {
        target: String,
        value: Vec<Coin>,
        data: Binary,
        operation: OperationKind,
    },
}

/// Messages carried in `Cw20ReceiveMsg::msg`
#[cw_serde]
pub enum ReceiveMsg {
    Commit {
        bridge_config: BridgeConfig,
        receiver: String,
        claim_id: u64,
    },
    CommitWithoutAddress {
        bridge_config: BridgeConfig,
        claim_id: u64,
    },
    FundEscrow {
        bridge_config: BridgeConfig,
    },
}

/// Administrative changes, reachable only via `Execute` with `SelfCall`
#[cw_serde]
pub enum AdminMsg {
    /// Change the global witness set, or a bridge's set when `bridge_config`
    /// is given (seeded from the global set on first override)
    UpdateWitnesses {
        bridge_config: Option<BridgeConfig>,
        add: Vec<String>,
        remove: Vec<String>,
        quorum: Option<QuorumPolicy>,
    },
    /// Move escrowed funds out of a bridge
    RecoverEscrow {
        bridge_config: BridgeConfig,
        recipient: String,
        amount: Uint128,
    },
}

// ============================================================================
// Query Messages
// ============================================================================

#[cw_serde]
#[derive(QueryResponses)]
pub enum QueryMsg {
    #[returns(ConfigResponse)]
    Config {},

    /// Bridge configuration by key
    #[returns(BridgeConfigResponse)]
    BridgeConfig { bridge_key: Binary },

    #[returns(BridgeParams)]
    BridgeParams { bridge_config: BridgeConfig },

    /// Door-local asset of a bridge
    #[returns(AssetInfo)]
    BridgeToken { bridge_config: BridgeConfig },

    /// Canonical key of a configuration; does not read state
    #[returns(BridgeKeyResponse)]
    BridgeKey { bridge_config: BridgeConfig },

    /// Registered bridges, 20 per page
    #[returns(BridgesPageResponse)]
    BridgesPaginated { page: u64 },

    #[returns(IsTokenRegisteredResponse)]
    IsTokenRegistered { token: String },

    #[returns(BridgeRequestsResponse)]
    BridgeRequests {
        start_after: Option<u64>,
        limit: Option<u32>,
    },

    #[returns(BridgeClaimResponse)]
    BridgeClaim {
        bridge_config: BridgeConfig,
        claim_id: u64,
    },

    /// Every recorded vote on a claim, flagged by current membership
    #[returns(ClaimAttestationsResponse)]
    ClaimAttestations {
        bridge_config: BridgeConfig,
        claim_id: u64,
    },

    #[returns(BridgeCreateAccountResponse)]
    BridgeCreateAccount {
        bridge_config: BridgeConfig,
        account: String,
    },

    #[returns(CreateAccountAttestationsResponse)]
    CreateAccountAttestations {
        bridge_config: BridgeConfig,
        account: String,
    },

    /// Witness set in force, globally or for a bridge
    #[returns(WitnessesResponse)]
    Witnesses { bridge_config: Option<BridgeConfig> },

    #[returns(EscrowResponse)]
    Escrow { bridge_config: BridgeConfig },
}

// ============================================================================
// Query Responses
// ============================================================================

#[cw_serde]
pub struct ConfigResponse {
    pub owner: Option<Addr>,
    pub safe: Addr,
    pub paused: bool,
    pub native_denom: String,
    pub min_signature_reward: Uint128,
    pub min_create_bridge_reward: Uint128,
    pub bridge_count: u64,
}

#[cw_serde]
pub struct BridgeConfigResponse {
    pub config: BridgeConfig,
    pub params: BridgeParams,
}

#[cw_serde]
pub struct BridgeKeyResponse {
    pub bridge_key: Binary,
    /// 0x-prefixed hex of `bridge_key`
    pub bridge_key_hex: String,
}

#[cw_serde]
pub struct BridgesPageResponse {
    pub configs: Vec<BridgeConfig>,
    /// Parallel to `configs`
    pub params: Vec<BridgeParams>,
}

#[cw_serde]
pub struct IsTokenRegisteredResponse {
    pub registered: bool,
    pub bridge_key: Option<Binary>,
}

#[cw_serde]
pub struct BridgeRequestsResponse {
    pub requests: Vec<BridgeRequest>,
}

#[cw_serde]
pub struct BridgeClaimResponse {
    pub exists: bool,
    pub claim_id: u64,
    pub creator: Option<Addr>,
    pub sender: Option<String>,
    pub signature_reward: Uint128,
    /// Value backed by a quorum of the current witness set, or the settled
    /// value once resolved
    pub attested: Option<ClaimVote>,
    /// Whether a quorum of the current witness set backs a value right now
    pub ready: bool,
    pub resolved: bool,
}

#[cw_serde]
pub struct ClaimAttestation {
    pub witness: Addr,
    pub vote: ClaimVote,
    /// Whether the witness belongs to the current set
    pub current: bool,
}

#[cw_serde]
pub struct ClaimAttestationsResponse {
    pub attestations: Vec<ClaimAttestation>,
}

#[cw_serde]
pub struct BridgeCreateAccountResponse {
    pub exists: bool,
    pub attested: Option<CreateAccountVote>,
    pub created: bool,
}

#[cw_serde]
pub struct CreateAccountAttestation {
    pub witness: Addr,
    pub vote: CreateAccountVote,
    pub current: bool,
}

#[cw_serde]
pub struct CreateAccountAttestationsResponse {
    pub attestations: Vec<CreateAccountAttestation>,
}

#[cw_serde]
pub struct WitnessesResponse {
    /// True when the bridge has its own set
    pub bridge_override: bool,
    pub version: u64,
    pub witnesses: Vec<Addr>,
    pub quorum: QuorumPolicy,
    /// Agreeing votes needed under `quorum`
    pub required: u32,
}

#[cw_serde]
pub struct EscrowResponse {
    pub bridge_key: Binary,
    pub asset: AssetInfo,
    pub amount: Uint128,
}
