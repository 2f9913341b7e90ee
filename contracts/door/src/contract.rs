//! XChain Door Contract - Entry Points
//!
//! The implementation is modularized into:
//! - `execute/` - Execute message handlers
//! - `query` - Query message handlers

use cosmwasm_std::{
    entry_point, to_json_binary, Binary, Deps, DepsMut, Env, MessageInfo, Response, StdResult,
};
use cw2::set_contract_version;

use crate::error::ContractError;
use crate::execute::{
    execute_add_claim_attestation, execute_add_create_account_attestation, execute_claim,
    execute_commit, execute_commit_without_address, execute_create_account_commit,
    execute_create_bridge, execute_create_bridge_request, execute_create_claim_id,
    execute_fund_escrow, execute_pause, execute_privileged, execute_receive,
    execute_renounce_ownership, execute_transfer_ownership, execute_unpause,
};
use crate::msg::{ExecuteMsg, InstantiateMsg, MigrateMsg, QueryMsg};
use crate::query::{
    query_bridge_claim, query_bridge_config, query_bridge_create_account, query_bridge_key,
    query_bridge_params, query_bridge_requests, query_bridge_token, query_bridges_paginated,
    query_claim_attestations, query_config, query_create_account_attestations, query_escrow,
    query_is_token_registered, query_witnesses,
};
use crate::state::{
    Config, WitnessSet, BRIDGE_COUNT, BRIDGE_REQUEST_COUNT, CONFIG, CONTRACT_NAME,
    CONTRACT_VERSION, GLOBAL_WITNESSES,
};

// ============================================================================
// Instantiate
// ============================================================================

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn instantiate(
    deps: DepsMut,
    _env: Env,
    _info: MessageInfo,
    msg: InstantiateMsg,
) -> Result<Response, ContractError> {
    set_contract_version(deps.storage, CONTRACT_NAME, CONTRACT_VERSION)?;

    let owner = deps.api.addr_validate(&msg.owner)?;
    let safe = deps.api.addr_validate(&msg.safe)?;

    if msg.native_denom.is_empty() {
        return Err(ContractError::InvalidParams {
            reason: "native_denom must not be empty".to_string(),
        });
    }

    let config = Config {
        owner: Some(owner.clone()),
        safe: safe.clone(),
        paused: false,
        native_denom: msg.native_denom,
        min_signature_reward: msg.min_signature_reward,
        min_create_bridge_reward: msg.min_create_bridge_reward,
    };
    CONFIG.save(deps.storage, &config)?;

    let witnesses = msg
        .witnesses
        .iter()
        .map(|w| deps.api.addr_validate(w))
        .collect::<StdResult<Vec<_>>>()?;
    let set = WitnessSet {
        version: 1,
        witnesses,
        quorum: msg.quorum.unwrap_or_default(),
    };
    set.validate()?;
    GLOBAL_WITNESSES.save(deps.storage, &set)?;

    BRIDGE_COUNT.save(deps.storage, &0u64)?;
    BRIDGE_REQUEST_COUNT.save(deps.storage, &0u64)?;

    Ok(Response::new()
        .add_attribute("method", "instantiate")
        .add_attribute("owner", owner)
        .add_attribute("safe", safe)
        .add_attribute("witness_count", set.witnesses.len().to_string())
        .add_attribute("required", set.required().to_string()))
}

// ============================================================================
// Execute
// ============================================================================

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn execute(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    msg: ExecuteMsg,
) -> Result<Response, ContractError> {
    match msg {
        // Bridge registry
        ExecuteMsg::CreateBridge { config, params } => {
            execute_create_bridge(deps, env, info, config, params)
        }
        ExecuteMsg::CreateBridgeRequest { token } => {
            execute_create_bridge_request(deps, info, token)
        }

        // Claim ids
        ExecuteMsg::CreateClaimId {
            bridge_config,
            sender,
        } => execute_create_claim_id(deps, info, bridge_config, sender),

        // Settlement
        ExecuteMsg::Commit {
            bridge_config,
            receiver,
            claim_id,
            amount,
        } => execute_commit(deps, info, bridge_config, receiver, claim_id, amount),
        ExecuteMsg::CommitWithoutAddress {
            bridge_config,
            claim_id,
            amount,
        } => execute_commit_without_address(deps, info, bridge_config, claim_id, amount),
        ExecuteMsg::CreateAccountCommit {
            bridge_config,
            destination,
            amount,
            signature_reward,
        } => execute_create_account_commit(
            deps,
            info,
            bridge_config,
            destination,
            amount,
            signature_reward,
        ),
        ExecuteMsg::FundEscrow { bridge_config } => execute_fund_escrow(deps, info, bridge_config),
        ExecuteMsg::Receive(cw20_msg) => execute_receive(deps, info, cw20_msg),
        ExecuteMsg::Claim {
            bridge_config,
            claim_id,
            amount,
            destination,
        } => execute_claim(deps, info, bridge_config, claim_id, amount, destination),

        // Attestations
        ExecuteMsg::AddClaimAttestation {
            bridge_config,
            claim_id,
            amount,
            sender,
            destination,
        } => execute_add_claim_attestation(
            deps,
            info,
            bridge_config,
            claim_id,
            amount,
            sender,
            destination,
        ),
        ExecuteMsg::AddCreateAccountAttestation {
            bridge_config,
            destination,
            amount,
            signature_reward,
        } => execute_add_create_account_attestation(
            deps,
            info,
            bridge_config,
            destination,
            amount,
            signature_reward,
        ),

        // Access & safety
        ExecuteMsg::Pause {} => execute_pause(deps, info),
        ExecuteMsg::Unpause {} => execute_unpause(deps, info),
        ExecuteMsg::TransferOwnership { new_owner } => {
            execute_transfer_ownership(deps, info, new_owner)
        }
        ExecuteMsg::RenounceOwnership {} => execute_renounce_ownership(deps, info),
        ExecuteMsg::Execute {
            target,
            value,
            data,
            operation,
        } => execute_privileged(deps, env, info, target, value, data, operation),
    }
}

// ============================================================================
// Query
// ============================================================================

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn query(deps: Deps, _env: Env, msg: QueryMsg) -> StdResult<Binary> {
    match msg {
        QueryMsg::Config {} => to_json_binary(&query_config(deps)?),
        QueryMsg::BridgeConfig { bridge_key } => {
            to_json_binary(&query_bridge_config(deps, bridge_key)?)
        }
        QueryMsg::BridgeParams { bridge_config } => {
            to_json_binary(&query_bridge_params(deps, bridge_config)?)
        }
        QueryMsg::BridgeToken { bridge_config } => {
            to_json_binary(&query_bridge_token(deps, bridge_config)?)
        }
        QueryMsg::BridgeKey { bridge_config } => to_json_binary(&query_bridge_key(bridge_config)?),
        QueryMsg::BridgesPaginated { page } => {
            to_json_binary(&query_bridges_paginated(deps, page)?)
        }
        QueryMsg::IsTokenRegistered { token } => {
            to_json_binary(&query_is_token_registered(deps, token)?)
        }
        QueryMsg::BridgeRequests { start_after, limit } => {
            to_json_binary(&query_bridge_requests(deps, start_after, limit)?)
        }
        QueryMsg::BridgeClaim {
            bridge_config,
            claim_id,
        } => to_json_binary(&query_bridge_claim(deps, bridge_config, claim_id)?),
        QueryMsg::ClaimAttestations {
            bridge_config,
            claim_id,
        } => to_json_binary(&query_claim_attestations(deps, bridge_config, claim_id)?),
        QueryMsg::BridgeCreateAccount {
            bridge_config,
            account,
        } => to_json_binary(&query_bridge_create_account(deps, bridge_config, account)?),
        QueryMsg::CreateAccountAttestations {
            bridge_config,
            account,
        } => to_json_binary(&query_create_account_attestations(
            deps,
            bridge_config,
            account,
        )?),
        QueryMsg::Witnesses { bridge_config } => {
            to_json_binary(&query_witnesses(deps, bridge_config)?)
        }
        QueryMsg::Escrow { bridge_config } => to_json_binary(&query_escrow(deps, bridge_config)?),
    }
}

// ============================================================================
// Migrate
// ============================================================================

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn migrate(deps: DepsMut, _env: Env, _msg: MigrateMsg) -> Result<Response, ContractError> {
    set_contract_version(deps.storage, CONTRACT_NAME, CONTRACT_VERSION)?;
    Ok(Response::new()
        .add_attribute("method", "migrate")
        .add_attribute("version", CONTRACT_VERSION))
}
