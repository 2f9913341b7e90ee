//! Bridge registry handlers.

use cosmwasm_std::{Binary, DepsMut, Env, MessageInfo, Response, Storage};

use common::{bytes32_to_hex, BridgeConfig, BridgeParams, ChainSide};

use crate::error::ContractError;
use crate::payment::must_pay_reward;
use crate::state::{
    Bridge, BridgeRequest, Config, BRIDGES, BRIDGE_COUNT, BRIDGE_INDEX, BRIDGE_REQUESTS,
    BRIDGE_REQUEST_COUNT, CONFIG, REGISTERED_TOKENS,
};

/// Load a registered bridge together with its key.
pub(crate) fn load_bridge(
    storage: &dyn Storage,
    config: &BridgeConfig,
) -> Result<([u8; 32], Bridge), ContractError> {
    let key = config.key();
    let bridge = BRIDGES
        .may_load(storage, &key)?
        .ok_or(ContractError::BridgeNotFound {
            bridge_key: bytes32_to_hex(&key),
        })?;
    Ok((key, bridge))
}

pub(crate) fn ensure_owner(config: &Config, info: &MessageInfo) -> Result<(), ContractError> {
    match &config.owner {
        Some(owner) if *owner == info.sender => Ok(()),
        _ => Err(ContractError::Unauthorized),
    }
}

fn invalid(reason: &str) -> ContractError {
    ContractError::InvalidParams {
        reason: reason.to_string(),
    }
}

/// Register a bridge this door takes part in.
pub fn execute_create_bridge(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    bridge_config: BridgeConfig,
    params: BridgeParams,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    ensure_owner(&config, &info)?;

    let key = bridge_config.key();
    if BRIDGES.has(deps.storage, &key) {
        return Err(ContractError::DuplicateBridge {
            bridge_key: bytes32_to_hex(&key),
        });
    }

    if params.min_create_amount.is_zero() {
        return Err(invalid("min_create_amount must be greater than zero"));
    }
    if params.signature_reward < config.min_signature_reward {
        return Err(ContractError::InvalidParams {
            reason: format!(
                "signature_reward {} below minimum {}",
                params.signature_reward, config.min_signature_reward
            ),
        });
    }
    if bridge_config.locking_chain_door.is_empty() || bridge_config.issuing_chain_door.is_empty()
    {
        return Err(invalid("door addresses must not be empty"));
    }
    if bridge_config.locking_chain_door == bridge_config.issuing_chain_door {
        return Err(invalid("locking and issuing doors must differ"));
    }
    if bridge_config.locking_chain_issue.currency.is_empty()
        || bridge_config.issuing_chain_issue.currency.is_empty()
    {
        return Err(invalid("issue currency must not be empty"));
    }

    let local_side = bridge_config
        .side_of(env.contract.address.as_str())
        .ok_or_else(|| invalid("this door is neither the locking nor the issuing door"))?;

    let local_issue = bridge_config.issue_for(local_side);
    if !local_issue.is_native() {
        deps.api.addr_validate(&local_issue.issuer)?;
    }
    let token = local_issue.token_id().to_string();
    if REGISTERED_TOKENS.has(deps.storage, &token) {
        return Err(ContractError::TokenAlreadyRegistered { token });
    }

    let index = BRIDGE_COUNT.may_load(deps.storage)?.unwrap_or_default();
    let bridge = Bridge {
        config: bridge_config.clone(),
        params: params.clone(),
        local_side,
        index,
    };
    BRIDGES.save(deps.storage, &key, &bridge)?;
    BRIDGE_INDEX.save(deps.storage, index, &Binary::from(key.to_vec()))?;
    BRIDGE_COUNT.save(deps.storage, &(index + 1))?;
    REGISTERED_TOKENS.save(deps.storage, &token, &Binary::from(key.to_vec()))?;

    let side = match local_side {
        ChainSide::Locking => "locking",
        ChainSide::Issuing => "issuing",
    };

    Ok(Response::new()
        .add_attribute("method", "create_bridge")
        .add_attribute("bridge_key", bytes32_to_hex(&key))
        .add_attribute("locking_chain_door", bridge_config.locking_chain_door)
        .add_attribute("locking_issuer", bridge_config.locking_chain_issue.issuer)
        .add_attribute("locking_currency", bridge_config.locking_chain_issue.currency)
        .add_attribute("issuing_chain_door", bridge_config.issuing_chain_door)
        .add_attribute("issuing_issuer", bridge_config.issuing_chain_issue.issuer)
        .add_attribute("issuing_currency", bridge_config.issuing_chain_issue.currency)
        .add_attribute("min_create_amount", params.min_create_amount)
        .add_attribute("signature_reward", params.signature_reward)
        .add_attribute("local_side", side))
}

/// File a request for a bridge of `token`, paying the request reward.
pub fn execute_create_bridge_request(
    deps: DepsMut,
    info: MessageInfo,
    token: String,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    if config.paused {
        return Err(ContractError::Paused);
    }

    if token.is_empty() {
        return Err(invalid("token must not be empty"));
    }
    let reward = must_pay_reward(&info, &config.native_denom, config.min_create_bridge_reward)?;
    if REGISTERED_TOKENS.has(deps.storage, &token) {
        return Err(ContractError::TokenAlreadyRegistered { token });
    }

    let id = BRIDGE_REQUEST_COUNT.may_load(deps.storage)?.unwrap_or_default() + 1;
    let request = BridgeRequest {
        id,
        token: token.clone(),
        requester: info.sender.clone(),
        reward,
    };
    BRIDGE_REQUESTS.save(deps.storage, id, &request)?;
    BRIDGE_REQUEST_COUNT.save(deps.storage, &id)?;

    Ok(Response::new()
        .add_attribute("method", "create_bridge_request")
        .add_attribute("request_id", id.to_string())
        .add_attribute("token", token)
        .add_attribute("requester", info.sender)
        .add_attribute("reward", reward))
}
