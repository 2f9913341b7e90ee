//! XChain Door Contract - Witness-Attested Cross-Chain Bridging
//!
//! One door is deployed on each of the two chains of a bridge. Value moves
//! between them with a claim/commit protocol that needs no trusted operator.
//!
//! # Flow
//! 1. The recipient reserves a claim id on the destination door with
//!    `CreateClaimId`, posting the signature reward
//! 2. The sender commits value on the source door with `Commit`
//!    (or `CommitWithoutAddress`), naming the claim id
//! 3. Witnesses observe the commit and call `AddClaimAttestation` on the
//!    destination door
//! 4. Once a quorum of the current witness set agrees, anyone may `Claim`
//!    with matching parameters; escrow pays the destination and the reward
//!    is split among the agreeing witnesses
//!
//! Accounts that need first-time funding use `CreateAccountCommit` and
//! `AddCreateAccountAttestation`, which settle automatically at quorum.
//!
//! # Security
//! - Quorum counted over current witnesses only; conflicting values can
//!   never both reach quorum
//! - Each claim resolves at most once
//! - Emergency pause, owner-managed registry, safe-gated privileged execution

pub mod contract;
pub mod error;
mod execute;
pub mod msg;
mod payment;
mod query;
pub mod quorum;
pub mod state;

pub use crate::error::ContractError;
pub use common::{bridge_key, BridgeConfig, BridgeParams, Issue};
