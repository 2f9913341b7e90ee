//! Execute handlers for the XChain Door contract.
//!
//! This module contains all execute message handlers, organized by category:
//! - `registry` - Bridge registration and bridge requests
//! - `claim_id` - Claim id allocation
//! - `attestation` - Witness attestations and quorum tracking
//! - `settlement` - Commits, escrow funding, claims and the CW20 hook
//! - `admin` - Pause, ownership and safe-gated privileged execution

mod admin;
mod attestation;
mod claim_id;
mod registry;
mod settlement;

pub use admin::*;
pub use attestation::*;
pub use claim_id::*;
pub use registry::*;
pub use settlement::*;
