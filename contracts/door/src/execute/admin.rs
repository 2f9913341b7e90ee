//! Access and safety handlers.
//!
//! This module handles:
//! - Pause/unpause
//! - Ownership transfer and renouncement
//! - Safe-gated privileged execution, including witness set updates and
//!   escrow recovery through `SelfCall`

use cosmwasm_std::{
    from_json, BankMsg, Binary, Coin, CosmosMsg, DepsMut, Env, MessageInfo, Response, Uint128,
    WasmMsg,
};

use common::{bytes32_to_hex, BridgeConfig};

use crate::error::ContractError;
use crate::execute::registry::{ensure_owner, load_bridge};
use crate::msg::{AdminMsg, OperationKind};
use crate::payment::{debit_escrow, transfer_msg};
use crate::quorum::witness_set_for;
use crate::state::{QuorumPolicy, BRIDGE_WITNESSES, CONFIG, GLOBAL_WITNESSES};

// ============================================================================
// Pause/Unpause
// ============================================================================

/// Pause the door (stops commits, attestations and claims).
pub fn execute_pause(deps: DepsMut, info: MessageInfo) -> Result<Response, ContractError> {
    let mut config = CONFIG.load(deps.storage)?;
    ensure_owner(&config, &info)?;

    config.paused = true;
    CONFIG.save(deps.storage, &config)?;

    Ok(Response::new().add_attribute("method", "pause"))
}

/// Unpause the door.
pub fn execute_unpause(deps: DepsMut, info: MessageInfo) -> Result<Response, ContractError> {
    let mut config = CONFIG.load(deps.storage)?;
    ensure_owner(&config, &info)?;

    config.paused = false;
    CONFIG.save(deps.storage, &config)?;

    Ok(Response::new().add_attribute("method", "unpause"))
}

// ============================================================================
// Ownership
// ============================================================================

pub fn execute_transfer_ownership(
    deps: DepsMut,
    info: MessageInfo,
    new_owner: String,
) -> Result<Response, ContractError> {
    let mut config = CONFIG.load(deps.storage)?;
    ensure_owner(&config, &info)?;

    let new_owner = deps.api.addr_validate(&new_owner)?;
    config.owner = Some(new_owner.clone());
    CONFIG.save(deps.storage, &config)?;

    Ok(Response::new()
        .add_attribute("method", "transfer_ownership")
        .add_attribute("previous_owner", info.sender)
        .add_attribute("new_owner", new_owner))
}

/// Drop the owner for good. Owner-only operations become unreachable.
pub fn execute_renounce_ownership(
    deps: DepsMut,
    info: MessageInfo,
) -> Result<Response, ContractError> {
    let mut config = CONFIG.load(deps.storage)?;
    ensure_owner(&config, &info)?;

    config.owner = None;
    CONFIG.save(deps.storage, &config)?;

    Ok(Response::new()
        .add_attribute("method", "renounce_ownership")
        .add_attribute("previous_owner", info.sender))
}

// ============================================================================
// Privileged Execution
// ============================================================================

/// Perform a low-level operation on behalf of the safe.
pub fn execute_privileged(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    target: String,
    value: Vec<Coin>,
    data: Binary,
    operation: OperationKind,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    if info.sender != config.safe {
        return Err(ContractError::Unauthorized);
    }

    match operation {
        OperationKind::Call => {
            let target = deps.api.addr_validate(&target)?;
            Ok(Response::new()
                .add_message(CosmosMsg::Wasm(WasmMsg::Execute {
                    contract_addr: target.to_string(),
                    msg: data,
                    funds: value,
                }))
                .add_attribute("method", "execute")
                .add_attribute("operation", "call")
                .add_attribute("target", target))
        }
        OperationKind::Send => {
            let target = deps.api.addr_validate(&target)?;
            if value.is_empty() {
                return Err(ContractError::InvalidOperation {
                    reason: "send requires value".to_string(),
                });
            }
            Ok(Response::new()
                .add_message(CosmosMsg::Bank(BankMsg::Send {
                    to_address: target.to_string(),
                    amount: value,
                }))
                .add_attribute("method", "execute")
                .add_attribute("operation", "send")
                .add_attribute("target", target))
        }
        OperationKind::SelfCall => {
            if target != env.contract.address.as_str() {
                return Err(ContractError::InvalidOperation {
                    reason: format!("self call must target {}", env.contract.address),
                });
            }
            if !value.is_empty() {
                return Err(ContractError::InvalidOperation {
                    reason: "self call cannot carry value".to_string(),
                });
            }
            let admin_msg: AdminMsg = from_json(&data)?;
            let response = match admin_msg {
                AdminMsg::UpdateWitnesses {
                    bridge_config,
                    add,
                    remove,
                    quorum,
                } => update_witnesses(deps, bridge_config, add, remove, quorum)?,
                AdminMsg::RecoverEscrow {
                    bridge_config,
                    recipient,
                    amount,
                } => recover_escrow(deps, bridge_config, recipient, amount)?,
            };
            // The inner handler names the method
            Ok(response.add_attribute("operation", "self_call"))
        }
    }
}

fn update_witnesses(
    deps: DepsMut,
    bridge_config: Option<BridgeConfig>,
    add: Vec<String>,
    remove: Vec<String>,
    quorum: Option<QuorumPolicy>,
) -> Result<Response, ContractError> {
    let bridge_key = match &bridge_config {
        Some(bridge_config) => Some(load_bridge(deps.storage, bridge_config)?.0),
        None => None,
    };
    let mut set = match &bridge_key {
        Some(key) => witness_set_for(deps.storage, key)?,
        None => GLOBAL_WITNESSES.load(deps.storage)?,
    };

    for witness in &remove {
        let witness = deps.api.addr_validate(witness)?;
        set.witnesses.retain(|w| *w != witness);
    }
    for witness in &add {
        let witness = deps.api.addr_validate(witness)?;
        if !set.contains(&witness) {
            set.witnesses.push(witness);
        }
    }
    if let Some(quorum) = quorum {
        set.quorum = quorum;
    }
    set.validate()?;
    set.version += 1;

    let scope = match &bridge_key {
        Some(key) => {
            BRIDGE_WITNESSES.save(deps.storage, key, &set)?;
            bytes32_to_hex(key)
        }
        None => {
            GLOBAL_WITNESSES.save(deps.storage, &set)?;
            "global".to_string()
        }
    };

    Ok(Response::new()
        .add_attribute("method", "update_witnesses")
        .add_attribute("scope", scope)
        .add_attribute("version", set.version.to_string())
        .add_attribute("witness_count", set.witnesses.len().to_string())
        .add_attribute("required", set.required().to_string()))
}

fn recover_escrow(
    deps: DepsMut,
    bridge_config: BridgeConfig,
    recipient: String,
    amount: Uint128,
) -> Result<Response, ContractError> {
    let (key, bridge) = load_bridge(deps.storage, &bridge_config)?;
    let recipient = deps.api.addr_validate(&recipient)?;
    if amount.is_zero() {
        return Err(ContractError::InvalidAmount {
            reason: "amount must be greater than zero".to_string(),
        });
    }
    let remaining = debit_escrow(deps.storage, &key, amount)?;

    Ok(Response::new()
        .add_message(transfer_msg(&bridge.local_asset(), &recipient, amount)?)
        .add_attribute("method", "recover_escrow")
        .add_attribute("bridge_key", bytes32_to_hex(&key))
        .add_attribute("recipient", recipient)
        .add_attribute("amount", amount)
        .add_attribute("escrow", remaining))
}
