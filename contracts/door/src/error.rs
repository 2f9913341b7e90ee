//! Error types for the XChain Door contract

use cosmwasm_std::{StdError, Uint128};
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum ContractError {
    #[error("{0}")]
    Std(#[from] StdError),

    // ========================================================================
    // Registration Errors
    // ========================================================================

    #[error("Bridge already exists: {bridge_key}")]
    DuplicateBridge { bridge_key: String },

    #[error("Invalid bridge parameters: {reason}")]
    InvalidParams { reason: String },

    #[error("Token already registered: {token}")]
    TokenAlreadyRegistered { token: String },

    #[error("Insufficient reward: expected at least {expected}, got {got}")]
    InsufficientReward { expected: Uint128, got: Uint128 },

    // ========================================================================
    // Authorization Errors
    // ========================================================================

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Unauthorized witness: {witness}")]
    UnauthorizedWitness { witness: String },

    // ========================================================================
    // State Errors
    // ========================================================================

    #[error("Bridge not found: {bridge_key}")]
    BridgeNotFound { bridge_key: String },

    #[error("Claim not found: {claim_id}")]
    ClaimNotFound { claim_id: u64 },

    #[error("Claim already resolved: {claim_id}")]
    AlreadyResolved { claim_id: u64 },

    #[error("Claim not ready: {claim_id} has no quorum")]
    NotReady { claim_id: u64 },

    // ========================================================================
    // Consistency Errors
    // ========================================================================

    #[error("Attestation mismatch: {reason}")]
    AttestationMismatch { reason: String },

    // ========================================================================
    // Resource Errors
    // ========================================================================

    #[error("Insufficient funds: expected {expected}, got {got}")]
    InsufficientFunds { expected: Uint128, got: Uint128 },

    #[error("Transfer failed: {reason}")]
    TransferFailed { reason: String },

    #[error("Invalid amount: {reason}")]
    InvalidAmount { reason: String },

    #[error("Amount {amount} below minimum create amount {min_create_amount}")]
    BelowMinimum {
        amount: Uint128,
        min_create_amount: Uint128,
    },

    #[error("Account creation is only supported for native assets")]
    CreateAccountUnsupported,

    // ========================================================================
    // Safety Errors
    // ========================================================================

    #[error("Door is paused")]
    Paused,

    #[error("Invalid witness set: {reason}")]
    InvalidWitnessSet { reason: String },

    #[error("Invalid operation: {reason}")]
    InvalidOperation { reason: String },
}
