//! Query handlers for the XChain Door contract.
//!
//! Lookups of claims and account creations report `exists: false` instead
//! of failing, so witnesses can check them before attesting.

use cosmwasm_std::{Binary, Deps, Order, StdError, StdResult};
use cw_storage_plus::Bound;

use common::{bytes32_to_hex, AssetInfo, BridgeConfig, BridgeParams};

use crate::msg::{
    BridgeClaimResponse, BridgeConfigResponse, BridgeCreateAccountResponse, BridgeKeyResponse,
    BridgeRequestsResponse, BridgesPageResponse, ClaimAttestation, ClaimAttestationsResponse,
    ConfigResponse, CreateAccountAttestation, CreateAccountAttestationsResponse, EscrowResponse,
    IsTokenRegisteredResponse, WitnessesResponse,
};
use crate::quorum::{current_claim_votes, find_quorum, witness_set_for};
use crate::state::{
    Bridge, BRIDGES, BRIDGE_COUNT, BRIDGE_INDEX, BRIDGE_PAGE_SIZE, BRIDGE_REQUESTS,
    BRIDGE_WITNESSES, CLAIMS, CLAIM_VOTES, CONFIG, CREATE_ACCOUNTS, CREATE_ACCOUNT_VOTES,
    DEFAULT_LIMIT, ESCROW, GLOBAL_WITNESSES, MAX_LIMIT, REGISTERED_TOKENS,
};

fn bridge_of(deps: Deps, bridge_config: &BridgeConfig) -> StdResult<([u8; 32], Bridge)> {
    let key = bridge_config.key();
    let bridge = BRIDGES
        .may_load(deps.storage, &key)?
        .ok_or_else(|| {
            StdError::generic_err(format!("Bridge not found: {}", bytes32_to_hex(&key)))
        })?;
    Ok((key, bridge))
}

// ============================================================================
// Registry Queries
// ============================================================================

/// Query contract configuration.
pub fn query_config(deps: Deps) -> StdResult<ConfigResponse> {
    let config = CONFIG.load(deps.storage)?;
    Ok(ConfigResponse {
        owner: config.owner,
        safe: config.safe,
        paused: config.paused,
        native_denom: config.native_denom,
        min_signature_reward: config.min_signature_reward,
        min_create_bridge_reward: config.min_create_bridge_reward,
        bridge_count: BRIDGE_COUNT.may_load(deps.storage)?.unwrap_or_default(),
    })
}

pub fn query_bridge_config(deps: Deps, bridge_key: Binary) -> StdResult<BridgeConfigResponse> {
    let bridge = BRIDGES
        .may_load(deps.storage, bridge_key.as_slice())?
        .ok_or_else(|| {
            StdError::generic_err(format!(
                "Bridge not found: 0x{}",
                hex::encode(bridge_key.as_slice())
            ))
        })?;
    Ok(BridgeConfigResponse {
        config: bridge.config,
        params: bridge.params,
    })
}

pub fn query_bridge_params(deps: Deps, bridge_config: BridgeConfig) -> StdResult<BridgeParams> {
    Ok(bridge_of(deps, &bridge_config)?.1.params)
}

/// Door-local asset of a bridge.
pub fn query_bridge_token(deps: Deps, bridge_config: BridgeConfig) -> StdResult<AssetInfo> {
    Ok(bridge_of(deps, &bridge_config)?.1.local_asset())
}

/// Canonical bridge key; reads no state.
pub fn query_bridge_key(bridge_config: BridgeConfig) -> StdResult<BridgeKeyResponse> {
    let key = bridge_config.key();
    Ok(BridgeKeyResponse {
        bridge_key: Binary::from(key.to_vec()),
        bridge_key_hex: bytes32_to_hex(&key),
    })
}

/// Registered bridges in registration order, `BRIDGE_PAGE_SIZE` per page.
pub fn query_bridges_paginated(deps: Deps, page: u64) -> StdResult<BridgesPageResponse> {
    let count = BRIDGE_COUNT.may_load(deps.storage)?.unwrap_or_default();
    let start = page.saturating_mul(BRIDGE_PAGE_SIZE);
    let end = start.saturating_add(BRIDGE_PAGE_SIZE).min(count);

    let mut configs = vec![];
    let mut params = vec![];
    for index in start..end {
        let key = BRIDGE_INDEX.load(deps.storage, index)?;
        let bridge = BRIDGES.load(deps.storage, key.as_slice())?;
        configs.push(bridge.config);
        params.push(bridge.params);
    }

    Ok(BridgesPageResponse { configs, params })
}

pub fn query_is_token_registered(
    deps: Deps,
    token: String,
) -> StdResult<IsTokenRegisteredResponse> {
    let bridge_key = REGISTERED_TOKENS.may_load(deps.storage, &token)?;
    Ok(IsTokenRegisteredResponse {
        registered: bridge_key.is_some(),
        bridge_key,
    })
}

/// Query paginated list of bridge requests.
pub fn query_bridge_requests(
    deps: Deps,
    start_after: Option<u64>,
    limit: Option<u32>,
) -> StdResult<BridgeRequestsResponse> {
    let limit = limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT) as usize;
    let start = start_after.map(Bound::exclusive);

    let requests = BRIDGE_REQUESTS
        .range(deps.storage, start, None, Order::Ascending)
        .take(limit)
        .map(|item| item.map(|(_, request)| request))
        .collect::<StdResult<Vec<_>>>()?;

    Ok(BridgeRequestsResponse { requests })
}

// ============================================================================
// Claim & Attestation Queries
// ============================================================================

pub fn query_bridge_claim(
    deps: Deps,
    bridge_config: BridgeConfig,
    claim_id: u64,
) -> StdResult<BridgeClaimResponse> {
    let key = bridge_config.key();
    let claim = match CLAIMS.may_load(deps.storage, (key.as_slice(), claim_id))? {
        Some(claim) => claim,
        None => {
            return Ok(BridgeClaimResponse {
                exists: false,
                claim_id,
                creator: None,
                sender: None,
                signature_reward: Default::default(),
                attested: None,
                ready: false,
                resolved: false,
            })
        }
    };

    // Open claims follow the current witness set; resolved claims keep the
    // value they were settled with.
    let attested = if claim.resolved {
        claim.attested
    } else {
        let set = witness_set_for(deps.storage, &key)?;
        let votes = current_claim_votes(deps.storage, &key, claim_id, &set)?;
        find_quorum(&votes, &set).map(|tally| tally.value)
    };
    let ready = !claim.resolved && attested.is_some();

    Ok(BridgeClaimResponse {
        exists: true,
        claim_id,
        creator: Some(claim.creator),
        sender: Some(claim.sender),
        signature_reward: claim.signature_reward,
        attested,
        ready,
        resolved: claim.resolved,
    })
}

/// Every recorded vote on a claim, including votes of removed witnesses.
pub fn query_claim_attestations(
    deps: Deps,
    bridge_config: BridgeConfig,
    claim_id: u64,
) -> StdResult<ClaimAttestationsResponse> {
    let key = bridge_config.key();
    let set = witness_set_for(deps.storage, &key)?;

    let attestations = CLAIM_VOTES
        .prefix((key.as_slice(), claim_id))
        .range(deps.storage, None, None, Order::Ascending)
        .map(|item| {
            let (witness, vote) = item?;
            Ok(ClaimAttestation {
                current: set.contains(&witness),
                witness,
                vote,
            })
        })
        .collect::<StdResult<Vec<_>>>()?;

    Ok(ClaimAttestationsResponse { attestations })
}

pub fn query_bridge_create_account(
    deps: Deps,
    bridge_config: BridgeConfig,
    account: String,
) -> StdResult<BridgeCreateAccountResponse> {
    let key = bridge_config.key();
    Ok(
        match CREATE_ACCOUNTS.may_load(deps.storage, (key.as_slice(), account.as_str()))? {
            Some(record) => BridgeCreateAccountResponse {
                exists: true,
                attested: record.attested,
                created: record.created,
            },
            None => BridgeCreateAccountResponse {
                exists: false,
                attested: None,
                created: false,
            },
        },
    )
}

pub fn query_create_account_attestations(
    deps: Deps,
    bridge_config: BridgeConfig,
    account: String,
) -> StdResult<CreateAccountAttestationsResponse> {
    let key = bridge_config.key();
    let set = witness_set_for(deps.storage, &key)?;

    let attestations = CREATE_ACCOUNT_VOTES
        .prefix((key.as_slice(), account.as_str()))
        .range(deps.storage, None, None, Order::Ascending)
        .map(|item| {
            let (witness, vote) = item?;
            Ok(CreateAccountAttestation {
                current: set.contains(&witness),
                witness,
                vote,
            })
        })
        .collect::<StdResult<Vec<_>>>()?;

    Ok(CreateAccountAttestationsResponse { attestations })
}

// ============================================================================
// Witness & Escrow Queries
// ============================================================================

pub fn query_witnesses(
    deps: Deps,
    bridge_config: Option<BridgeConfig>,
) -> StdResult<WitnessesResponse> {
    let (set, bridge_override) = match bridge_config {
        Some(bridge_config) => {
            let (key, _) = bridge_of(deps, &bridge_config)?;
            match BRIDGE_WITNESSES.may_load(deps.storage, &key)? {
                Some(set) => (set, true),
                None => (GLOBAL_WITNESSES.load(deps.storage)?, false),
            }
        }
        None => (GLOBAL_WITNESSES.load(deps.storage)?, false),
    };

    Ok(WitnessesResponse {
        bridge_override,
        version: set.version,
        required: set.required(),
        witnesses: set.witnesses,
        quorum: set.quorum,
    })
}

pub fn query_escrow(deps: Deps, bridge_config: BridgeConfig) -> StdResult<EscrowResponse> {
    let (key, bridge) = bridge_of(deps, &bridge_config)?;
    Ok(EscrowResponse {
        bridge_key: Binary::from(key.to_vec()),
        asset: bridge.local_asset(),
        amount: ESCROW.may_load(deps.storage, &key)?.unwrap_or_default(),
    })
}
