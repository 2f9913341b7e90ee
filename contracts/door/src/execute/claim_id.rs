//! Claim id allocation.

use cosmwasm_std::{DepsMut, MessageInfo, Response};

use common::{bytes32_to_hex, BridgeConfig};

use crate::error::ContractError;
use crate::execute::registry::load_bridge;
use crate::payment::must_pay_reward;
use crate::state::{BridgeClaim, CLAIMS, CLAIM_COUNTERS, CONFIG};

/// Reserve the next claim id of a bridge for `sender`'s commit.
///
/// Ids come from one counter per bridge starting at 1 and are never reused.
/// The attached native reward is held until the claim settles.
pub fn execute_create_claim_id(
    deps: DepsMut,
    info: MessageInfo,
    bridge_config: BridgeConfig,
    sender: String,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    if config.paused {
        return Err(ContractError::Paused);
    }

    let (key, bridge) = load_bridge(deps.storage, &bridge_config)?;
    if sender.is_empty() {
        return Err(ContractError::InvalidParams {
            reason: "sender must not be empty".to_string(),
        });
    }
    let signature_reward =
        must_pay_reward(&info, &config.native_denom, bridge.params.signature_reward)?;

    let claim_id = CLAIM_COUNTERS.may_load(deps.storage, &key)?.unwrap_or_default() + 1;
    CLAIM_COUNTERS.save(deps.storage, &key, &claim_id)?;

    let claim = BridgeClaim {
        claim_id,
        creator: info.sender.clone(),
        sender: sender.clone(),
        signature_reward,
        attested: None,
        resolved: false,
    };
    CLAIMS.save(deps.storage, (key.as_slice(), claim_id), &claim)?;

    Ok(Response::new()
        .set_data(cosmwasm_std::to_json_binary(&claim_id)?)
        .add_attribute("method", "create_claim")
        .add_attribute("bridge_key", bytes32_to_hex(&key))
        .add_attribute("claim_id", claim_id.to_string())
        .add_attribute("creator", info.sender)
        .add_attribute("sender", sender)
        .add_attribute("signature_reward", signature_reward))
}
