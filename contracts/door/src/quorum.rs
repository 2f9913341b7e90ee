//! Witness set rules and quorum evaluation.
//!
//! Quorum always requires strictly more than half of the current set, so at
//! most one value can be agreed on at a time. Votes from addresses outside
//! the current set are ignored.

use cosmwasm_std::{Addr, StdResult, Storage};

use crate::error::ContractError;
use crate::state::{
    ClaimVote, CreateAccountVote, QuorumPolicy, WitnessSet, BRIDGE_WITNESSES, CLAIM_VOTES,
    CREATE_ACCOUNT_VOTES, GLOBAL_WITNESSES,
};

/// Value agreed by quorum together with the witnesses that voted for it.
#[derive(Debug, Clone, PartialEq)]
pub struct Tally<T> {
    pub value: T,
    pub witnesses: Vec<Addr>,
}

impl WitnessSet {
    pub fn contains(&self, addr: &Addr) -> bool {
        self.witnesses.iter().any(|w| w == addr)
    }

    /// Number of agreeing votes needed to reach quorum.
    pub fn required(&self) -> u32 {
        let size = self.witnesses.len() as u32;
        match self.quorum {
            QuorumPolicy::SimpleMajority => size / 2 + 1,
            QuorumPolicy::Threshold { count } => count,
        }
    }

    pub fn validate(&self) -> Result<(), ContractError> {
        if self.witnesses.is_empty() {
            return Err(ContractError::InvalidWitnessSet {
                reason: "at least one witness required".to_string(),
            });
        }
        for (i, w) in self.witnesses.iter().enumerate() {
            if self.witnesses[..i].contains(w) {
                return Err(ContractError::InvalidWitnessSet {
                    reason: format!("duplicate witness {}", w),
                });
            }
        }
        if let QuorumPolicy::Threshold { count } = self.quorum {
            let size = self.witnesses.len() as u32;
            if count <= size / 2 || count > size {
                return Err(ContractError::InvalidWitnessSet {
                    reason: format!(
                        "threshold {} must exceed half of {} witnesses and not exceed it",
                        count, size
                    ),
                });
            }
        }
        Ok(())
    }
}

/// Witness set in force for a bridge: its override if any, else the global set.
pub fn witness_set_for(storage: &dyn Storage, bridge_key: &[u8]) -> StdResult<WitnessSet> {
    match BRIDGE_WITNESSES.may_load(storage, bridge_key)? {
        Some(set) => Ok(set),
        None => GLOBAL_WITNESSES.load(storage),
    }
}

/// Current votes of the members of `set` on a claim.
pub fn current_claim_votes(
    storage: &dyn Storage,
    bridge_key: &[u8],
    claim_id: u64,
    set: &WitnessSet,
) -> StdResult<Vec<(Addr, ClaimVote)>> {
    let mut votes = Vec::with_capacity(set.witnesses.len());
    for witness in &set.witnesses {
        if let Some(vote) = CLAIM_VOTES.may_load(storage, (bridge_key, claim_id, witness))? {
            votes.push((witness.clone(), vote));
        }
    }
    Ok(votes)
}

/// Current votes of the members of `set` on an account creation.
pub fn current_create_account_votes(
    storage: &dyn Storage,
    bridge_key: &[u8],
    destination: &str,
    set: &WitnessSet,
) -> StdResult<Vec<(Addr, CreateAccountVote)>> {
    let mut votes = Vec::with_capacity(set.witnesses.len());
    for witness in &set.witnesses {
        if let Some(vote) =
            CREATE_ACCOUNT_VOTES.may_load(storage, (bridge_key, destination, witness))?
        {
            votes.push((witness.clone(), vote));
        }
    }
    Ok(votes)
}

/// Find the value backed by a quorum of current witnesses.
///
/// `votes` holds each witness's current vote; entries from non-members are
/// skipped.
pub fn find_quorum<T: PartialEq + Clone>(
    votes: &[(Addr, T)],
    set: &WitnessSet,
) -> Option<Tally<T>> {
    let mut groups: Vec<Tally<T>> = vec![];
    for (witness, value) in votes {
        if !set.contains(witness) {
            continue;
        }
        match groups.iter_mut().find(|g| g.value == *value) {
            Some(group) => {
                if !group.witnesses.contains(witness) {
                    group.witnesses.push(witness.clone());
                }
            }
            None => groups.push(Tally {
                value: value.clone(),
                witnesses: vec![witness.clone()],
            }),
        }
    }

    let required = set.required() as usize;
    groups.into_iter().find(|g| g.witnesses.len() >= required)
}
