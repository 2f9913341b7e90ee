//! Settlement handlers: commits on the source door, claims on the
//! destination door, escrow funding and the CW20 receive hook.

use cosmwasm_std::{from_json, Addr, DepsMut, MessageInfo, Response, Uint128};
use cw20::Cw20ReceiveMsg;

use common::{bytes32_to_hex, AssetInfo, BridgeConfig};

use crate::error::ContractError;
use crate::execute::registry::{ensure_owner, load_bridge};
use crate::msg::ReceiveMsg;
use crate::payment::{
    credit_escrow, debit_escrow, must_pay_exact, paid_in, reward_msgs, transfer_msg,
};
use crate::quorum::{current_claim_votes, find_quorum, witness_set_for};
use crate::state::{Bridge, CLAIMS, CONFIG};

fn native_denom_of(bridge: &Bridge) -> Result<String, ContractError> {
    match bridge.local_asset() {
        AssetInfo::Native { denom } => Ok(denom),
        AssetInfo::Cw20 { contract_addr } => Err(ContractError::TransferFailed {
            reason: format!("asset is CW20 {}, send it through the token contract", contract_addr),
        }),
    }
}

fn ensure_cw20_of(bridge: &Bridge, token: &Addr) -> Result<(), ContractError> {
    match bridge.local_asset() {
        AssetInfo::Cw20 { contract_addr } if contract_addr == token.as_str() => Ok(()),
        other => Err(ContractError::TransferFailed {
            reason: format!("received {}, bridge asset is {}", token, other),
        }),
    }
}

/// Credit escrow and build the commit response shared by every commit path.
fn record_commit(
    deps: DepsMut,
    key: &[u8; 32],
    method: &str,
    sender: &Addr,
    claim_id: u64,
    amount: Uint128,
    receiver: Option<String>,
) -> Result<Response, ContractError> {
    if let Some(receiver) = &receiver {
        if receiver.is_empty() {
            return Err(ContractError::InvalidParams {
                reason: "receiver must not be empty".to_string(),
            });
        }
    }
    if amount.is_zero() {
        return Err(ContractError::InvalidAmount {
            reason: "amount must be greater than zero".to_string(),
        });
    }

    let escrow = credit_escrow(deps.storage, key, amount)?;

    let mut response = Response::new()
        .add_attribute("method", method)
        .add_attribute("bridge_key", bytes32_to_hex(key))
        .add_attribute("claim_id", claim_id.to_string())
        .add_attribute("sender", sender.as_str())
        .add_attribute("amount", amount);
    if let Some(receiver) = receiver {
        response = response.add_attribute("receiver", receiver);
    }
    Ok(response.add_attribute("escrow", escrow))
}

// ============================================================================
// Commits
// ============================================================================

/// Commit native funds towards a claim on the other chain.
pub fn execute_commit(
    deps: DepsMut,
    info: MessageInfo,
    bridge_config: BridgeConfig,
    receiver: String,
    claim_id: u64,
    amount: Uint128,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    if config.paused {
        return Err(ContractError::Paused);
    }

    let (key, bridge) = load_bridge(deps.storage, &bridge_config)?;
    let denom = native_denom_of(&bridge)?;
    must_pay_exact(&info, &denom, amount)?;

    record_commit(
        deps,
        &key,
        "commit",
        &info.sender,
        claim_id,
        amount,
        Some(receiver),
    )
}

/// Commit native funds; the claim's creator picks the destination.
pub fn execute_commit_without_address(
    deps: DepsMut,
    info: MessageInfo,
    bridge_config: BridgeConfig,
    claim_id: u64,
    amount: Uint128,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    if config.paused {
        return Err(ContractError::Paused);
    }

    let (key, bridge) = load_bridge(deps.storage, &bridge_config)?;
    let denom = native_denom_of(&bridge)?;
    must_pay_exact(&info, &denom, amount)?;

    record_commit(
        deps,
        &key,
        "commit_without_address",
        &info.sender,
        claim_id,
        amount,
        None,
    )
}

/// Commit funds that create `destination` on the other chain.
pub fn execute_create_account_commit(
    deps: DepsMut,
    info: MessageInfo,
    bridge_config: BridgeConfig,
    destination: String,
    amount: Uint128,
    signature_reward: Uint128,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    if config.paused {
        return Err(ContractError::Paused);
    }

    let (key, bridge) = load_bridge(deps.storage, &bridge_config)?;
    let denom = match bridge.local_asset() {
        AssetInfo::Native { denom } => denom,
        AssetInfo::Cw20 { .. } => return Err(ContractError::CreateAccountUnsupported),
    };
    if destination.is_empty() {
        return Err(ContractError::InvalidParams {
            reason: "destination must not be empty".to_string(),
        });
    }
    if amount < bridge.params.min_create_amount {
        return Err(ContractError::BelowMinimum {
            amount,
            min_create_amount: bridge.params.min_create_amount,
        });
    }
    if signature_reward < bridge.params.signature_reward {
        return Err(ContractError::InsufficientReward {
            expected: bridge.params.signature_reward,
            got: signature_reward,
        });
    }

    let total = amount
        .checked_add(signature_reward)
        .map_err(cosmwasm_std::StdError::from)?;
    must_pay_exact(&info, &denom, total)?;
    let escrow = credit_escrow(deps.storage, &key, total)?;

    Ok(Response::new()
        .add_attribute("method", "create_account_commit")
        .add_attribute("bridge_key", bytes32_to_hex(&key))
        .add_attribute("sender", info.sender)
        .add_attribute("destination", destination)
        .add_attribute("amount", amount)
        .add_attribute("signature_reward", signature_reward)
        .add_attribute("escrow", escrow))
}

// ============================================================================
// Escrow Funding
// ============================================================================

/// Pre-fund a native bridge's escrow (owner only).
pub fn execute_fund_escrow(
    deps: DepsMut,
    info: MessageInfo,
    bridge_config: BridgeConfig,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    ensure_owner(&config, &info)?;

    let (key, bridge) = load_bridge(deps.storage, &bridge_config)?;
    let denom = native_denom_of(&bridge)?;
    let amount = paid_in(&info, &denom)?;
    fund_escrow(deps, &key, amount)
}

fn fund_escrow(deps: DepsMut, key: &[u8; 32], amount: Uint128) -> Result<Response, ContractError> {
    if amount.is_zero() {
        return Err(ContractError::InvalidAmount {
            reason: "no funds sent".to_string(),
        });
    }
    let escrow = credit_escrow(deps.storage, key, amount)?;

    Ok(Response::new()
        .add_attribute("method", "fund_escrow")
        .add_attribute("bridge_key", bytes32_to_hex(key))
        .add_attribute("amount", amount)
        .add_attribute("escrow", escrow))
}

// ============================================================================
// CW20 Hook
// ============================================================================

/// Handle CW20 `Send` into the door (commits and escrow funding).
pub fn execute_receive(
    deps: DepsMut,
    info: MessageInfo,
    cw20_msg: Cw20ReceiveMsg,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    let sender = deps.api.addr_validate(&cw20_msg.sender)?;
    let amount = cw20_msg.amount;

    let receive_msg: ReceiveMsg = from_json(&cw20_msg.msg)?;

    match receive_msg {
        ReceiveMsg::Commit {
            bridge_config,
            receiver,
            claim_id,
        } => {
            if config.paused {
                return Err(ContractError::Paused);
            }
            let (key, bridge) = load_bridge(deps.storage, &bridge_config)?;
            ensure_cw20_of(&bridge, &info.sender)?;
            record_commit(deps, &key, "commit", &sender, claim_id, amount, Some(receiver))
        }
        ReceiveMsg::CommitWithoutAddress {
            bridge_config,
            claim_id,
        } => {
            if config.paused {
                return Err(ContractError::Paused);
            }
            let (key, bridge) = load_bridge(deps.storage, &bridge_config)?;
            ensure_cw20_of(&bridge, &info.sender)?;
            record_commit(
                deps,
                &key,
                "commit_without_address",
                &sender,
                claim_id,
                amount,
                None,
            )
        }
        ReceiveMsg::FundEscrow { bridge_config } => {
            if config.owner.as_ref() != Some(&sender) {
                return Err(ContractError::Unauthorized);
            }
            let (key, bridge) = load_bridge(deps.storage, &bridge_config)?;
            ensure_cw20_of(&bridge, &info.sender)?;
            fund_escrow(deps, &key, amount)
        }
    }
}

// ============================================================================
// Claim
// ============================================================================

/// Release an attested claim from escrow.
///
/// The requested `(amount, destination)` must equal the value currently
/// agreed by quorum. When the agreed value carries no destination, only the
/// claim's creator may choose one.
pub fn execute_claim(
    deps: DepsMut,
    info: MessageInfo,
    bridge_config: BridgeConfig,
    claim_id: u64,
    amount: Uint128,
    destination: String,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    if config.paused {
        return Err(ContractError::Paused);
    }

    let (key, bridge) = load_bridge(deps.storage, &bridge_config)?;
    let mut claim = CLAIMS
        .may_load(deps.storage, (key.as_slice(), claim_id))?
        .ok_or(ContractError::ClaimNotFound { claim_id })?;
    if claim.resolved {
        return Err(ContractError::AlreadyResolved { claim_id });
    }

    let set = witness_set_for(deps.storage, &key)?;
    let votes = current_claim_votes(deps.storage, &key, claim_id, &set)?;
    let tally = find_quorum(&votes, &set).ok_or(ContractError::NotReady { claim_id })?;

    if tally.value.amount != amount {
        return Err(ContractError::AttestationMismatch {
            reason: format!("amount {} differs from attested {}", amount, tally.value.amount),
        });
    }
    let destination = deps.api.addr_validate(&destination)?;
    match &tally.value.destination {
        Some(attested) if attested != destination.as_str() => {
            return Err(ContractError::AttestationMismatch {
                reason: format!(
                    "destination {} differs from attested {}",
                    destination, attested
                ),
            });
        }
        Some(_) => {}
        None => {
            if info.sender != claim.creator {
                return Err(ContractError::Unauthorized);
            }
        }
    }

    debit_escrow(deps.storage, &key, amount)?;

    let payout = transfer_msg(&bridge.local_asset(), &destination, amount)?;
    let rewards = reward_msgs(
        &config.native_denom,
        claim.signature_reward,
        &tally.witnesses,
    );

    claim.attested = Some(tally.value);
    claim.resolved = true;
    CLAIMS.save(deps.storage, (key.as_slice(), claim_id), &claim)?;

    Ok(Response::new()
        .add_message(payout)
        .add_messages(rewards)
        .add_attribute("method", "claim")
        .add_attribute("bridge_key", bytes32_to_hex(&key))
        .add_attribute("claim_id", claim_id.to_string())
        .add_attribute("destination", destination)
        .add_attribute("amount", amount)
        .add_attribute("rewarded_witnesses", tally.witnesses.len().to_string()))
}
