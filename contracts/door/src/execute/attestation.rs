//! Witness attestation handlers.
//!
//! Each witness holds at most one current vote per claim (and per account
//! creation). Quorum is re-evaluated against the current witness set on every
//! vote, so votes from removed witnesses stop counting immediately.

use cosmwasm_std::{DepsMut, Event, MessageInfo, Response, Uint128};

use common::{bytes32_to_hex, BridgeConfig};

use crate::error::ContractError;
use crate::execute::registry::load_bridge;
use crate::payment::{debit_escrow, reward_msgs, transfer_msg};
use crate::quorum::{
    current_claim_votes, current_create_account_votes, find_quorum, witness_set_for,
};
use crate::state::{
    BridgeCreateAccount, ClaimVote, CreateAccountVote, CLAIMS, CLAIM_VOTES, CONFIG,
    CREATE_ACCOUNTS, CREATE_ACCOUNT_VOTES,
};

/// Outcome of recording a vote
fn vote_status<T: PartialEq>(previous: Option<&T>, vote: &T) -> &'static str {
    match previous {
        Some(prev) if prev == vote => "duplicate",
        Some(_) => "replaced",
        None => "recorded",
    }
}

/// Record a witness's vote on a commit observed on the other chain.
pub fn execute_add_claim_attestation(
    deps: DepsMut,
    info: MessageInfo,
    bridge_config: BridgeConfig,
    claim_id: u64,
    amount: Uint128,
    sender: String,
    destination: Option<String>,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    if config.paused {
        return Err(ContractError::Paused);
    }

    let (key, _bridge) = load_bridge(deps.storage, &bridge_config)?;
    let set = witness_set_for(deps.storage, &key)?;
    if !set.contains(&info.sender) {
        return Err(ContractError::UnauthorizedWitness {
            witness: info.sender.to_string(),
        });
    }

    let mut claim = CLAIMS
        .may_load(deps.storage, (key.as_slice(), claim_id))?
        .ok_or(ContractError::ClaimNotFound { claim_id })?;
    if claim.sender != sender {
        return Err(ContractError::AttestationMismatch {
            reason: format!(
                "sender {} does not match claim sender {}",
                sender, claim.sender
            ),
        });
    }
    if amount.is_zero() {
        return Err(ContractError::InvalidAmount {
            reason: "attested amount must be greater than zero".to_string(),
        });
    }
    let destination = destination
        .map(|d| deps.api.addr_validate(&d).map(|a| a.to_string()))
        .transpose()?;

    let vote = ClaimVote {
        amount,
        sender,
        destination,
    };
    let vote_key = (key.as_slice(), claim_id, &info.sender);
    let previous = CLAIM_VOTES.may_load(deps.storage, vote_key)?;
    let status = vote_status(previous.as_ref(), &vote);
    if previous.as_ref() != Some(&vote) {
        CLAIM_VOTES.save(deps.storage, vote_key, &vote)?;
    }

    let mut response = Response::new()
        .add_attribute("method", "add_claim_attestation")
        .add_attribute("bridge_key", bytes32_to_hex(&key))
        .add_attribute("claim_id", claim_id.to_string())
        .add_attribute("witness", info.sender.as_str())
        .add_attribute("amount", amount)
        .add_attribute("status", status);

    if claim.resolved {
        return Ok(response.add_attribute("already_resolved", "true"));
    }

    let votes = current_claim_votes(deps.storage, &key, claim_id, &set)?;
    let tally = find_quorum(&votes, &set);
    let attested = tally.as_ref().map(|t| t.value.clone());

    if attested != claim.attested {
        if let Some(tally) = &tally {
            response = response.add_event(
                Event::new("credit")
                    .add_attribute("bridge_key", bytes32_to_hex(&key))
                    .add_attribute("claim_id", claim_id.to_string())
                    .add_attribute("amount", tally.value.amount)
                    .add_attribute("sender", tally.value.sender.clone())
                    .add_attribute(
                        "destination",
                        tally.value.destination.clone().unwrap_or_default(),
                    )
                    .add_attribute("witnesses", tally.witnesses.len().to_string()),
            );
        }
        claim.attested = attested;
        CLAIMS.save(deps.storage, (key.as_slice(), claim_id), &claim)?;
    }

    Ok(response.add_attribute("attested", claim.attested.is_some().to_string()))
}

/// Record a witness's vote on an account creation observed on the other
/// chain. The first quorum settles it: escrow funds the destination and pays
/// the agreeing witnesses.
pub fn execute_add_create_account_attestation(
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
    let set = witness_set_for(deps.storage, &key)?;
    if !set.contains(&info.sender) {
        return Err(ContractError::UnauthorizedWitness {
            witness: info.sender.to_string(),
        });
    }

    let asset = bridge.local_asset();
    if !asset.is_native() {
        return Err(ContractError::CreateAccountUnsupported);
    }
    if amount < bridge.params.min_create_amount {
        return Err(ContractError::BelowMinimum {
            amount,
            min_create_amount: bridge.params.min_create_amount,
        });
    }
    let destination = deps.api.addr_validate(&destination)?;

    let vote = CreateAccountVote {
        amount,
        signature_reward,
    };
    let vote_key = (key.as_slice(), destination.as_str(), &info.sender);
    let previous = CREATE_ACCOUNT_VOTES.may_load(deps.storage, vote_key)?;
    let status = vote_status(previous.as_ref(), &vote);
    if previous.as_ref() != Some(&vote) {
        CREATE_ACCOUNT_VOTES.save(deps.storage, vote_key, &vote)?;
    }

    let mut response = Response::new()
        .add_attribute("method", "add_create_account_attestation")
        .add_attribute("bridge_key", bytes32_to_hex(&key))
        .add_attribute("destination", destination.as_str())
        .add_attribute("witness", info.sender.as_str())
        .add_attribute("amount", amount)
        .add_attribute("status", status);

    let mut record = CREATE_ACCOUNTS
        .may_load(deps.storage, (key.as_slice(), destination.as_str()))?
        .unwrap_or(BridgeCreateAccount {
            destination: destination.clone(),
            attested: None,
            created: false,
        });
    if record.created {
        return Ok(response.add_attribute("already_created", "true"));
    }

    let votes = current_create_account_votes(deps.storage, &key, destination.as_str(), &set)?;
    if let Some(tally) = find_quorum(&votes, &set) {
        let total = tally
            .value
            .amount
            .checked_add(tally.value.signature_reward)
            .map_err(cosmwasm_std::StdError::from)?;
        debit_escrow(deps.storage, &key, total)?;

        response = response
            .add_message(transfer_msg(&asset, &destination, tally.value.amount)?)
            .add_messages(reward_msgs(
                asset.id(),
                tally.value.signature_reward,
                &tally.witnesses,
            ))
            .add_event(
                Event::new("create_account")
                    .add_attribute("bridge_key", bytes32_to_hex(&key))
                    .add_attribute("destination", destination.as_str())
                    .add_attribute("amount", tally.value.amount)
                    .add_attribute("signature_reward", tally.value.signature_reward)
                    .add_attribute("witnesses", tally.witnesses.len().to_string()),
            );
        record.attested = Some(tally.value);
        record.created = true;
    }
    CREATE_ACCOUNTS.save(
        deps.storage,
        (key.as_slice(), destination.as_str()),
        &record,
    )?;

    Ok(response.add_attribute("created", record.created.to_string()))
}
