//! XChain Door Witness - Library interface
//!
//! Re-exports internal modules for use in integration tests.

pub mod attestor;
pub mod bounded_cache;
pub mod config;
pub mod door_client;
pub mod events;
pub mod queue;
pub mod retry;
pub mod watcher;
