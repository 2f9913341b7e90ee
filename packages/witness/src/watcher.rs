//! Source door watcher
//!
//! Polls the source chain block by block, turns every door commit into an
//! attestation job and pushes it onto the queue.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use eyre::Result;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use common::{bytes32_to_hex, BridgeConfig};

use crate::door_client::SourceDoor;
use crate::queue::{AttestationJob, JobQueue};

pub struct Watcher<S> {
    source: Arc<S>,
    queue: JobQueue,
    /// Door address attestations are sent to
    target_door: String,
    next_height: u64,
    poll_interval: Duration,
    bridges: HashMap<[u8; 32], BridgeConfig>,
}

impl<S: SourceDoor> Watcher<S> {
    pub fn new(
        source: Arc<S>,
        queue: JobQueue,
        target_door: impl Into<String>,
        start_height: u64,
        poll_interval: Duration,
    ) -> Self {
        Self {
            source,
            queue,
            target_door: target_door.into(),
            next_height: start_height,
            poll_interval,
            bridges: HashMap::new(),
        }
    }

    /// First height not yet scanned
    pub fn next_height(&self) -> u64 {
        self.next_height
    }

    /// Poll until shutdown is signalled
    pub async fn run(&mut self, mut shutdown: watch::Receiver<bool>) -> Result<()> {
        info!(
            start_height = self.next_height,
            target_door = %self.target_door,
            "Watcher started"
        );

        loop {
            if *shutdown.borrow() {
                break;
            }

            match self.poll_once(&mut shutdown).await {
                Ok(0) => {}
                Ok(published) => debug!(published, "Published attestation jobs"),
                Err(e) => warn!(
                    error = %e,
                    height = self.next_height,
                    "Watcher poll failed, retrying next interval"
                ),
            }

            tokio::select! {
                _ = tokio::time::sleep(self.poll_interval) => {}
                _ = shutdown.changed() => {}
            }
        }

        info!(next_height = self.next_height, "Watcher stopped");
        Ok(())
    }

    /// Scan every block up to the source tip once.
    ///
    /// Returns the number of jobs published. The cursor only advances past
    /// a block once all of its commits are queued, so a failure rescans it.
    /// Waiting for queue space gives up as soon as shutdown is signalled.
    pub async fn poll_once(&mut self, shutdown: &mut watch::Receiver<bool>) -> Result<usize> {
        let latest = self.source.latest_height().await?;
        let mut published = 0;

        while self.next_height <= latest {
            let height = self.next_height;
            for observation in self.source.commits_at(height).await? {
                let bridge = self.bridge_config(observation.bridge_key()).await?;

                if bridge.side_of(&self.target_door).is_none() {
                    debug!(
                        bridge_key = %bytes32_to_hex(observation.bridge_key()),
                        target_door = %self.target_door,
                        "Commit is for a bridge that does not involve the target door"
                    );
                    continue;
                }

                info!(
                    tx_hash = %observation.tx_hash,
                    height,
                    commit = %observation.label(),
                    "Observed door commit"
                );
                let job = AttestationJob::new(bridge, observation);
                tokio::select! {
                    res = self.queue.push(job) => res?,
                    _ = shutdown.changed() => {
                        info!(height, "Shutdown while waiting for queue space");
                        return Ok(published);
                    }
                }
                published += 1;
            }
            self.next_height = height + 1;
        }

        Ok(published)
    }

    async fn bridge_config(&mut self, bridge_key: &[u8; 32]) -> Result<BridgeConfig> {
        if let Some(config) = self.bridges.get(bridge_key) {
            return Ok(config.clone());
        }
        let config = self.source.bridge_config(bridge_key).await?;
        self.bridges.insert(*bridge_key, config.clone());
        Ok(config)
    }
}
