//! Attestor worker pool
//!
//! Workers pull jobs from the shared queue, check the target door for the
//! claim's progress, and submit this witness's attestation when it is still
//! needed. Transient failures are re-enqueued with exponential backoff.

use std::sync::Arc;

use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use common::bytes32_to_hex;

use crate::bounded_cache::BoundedCache;
use crate::door_client::{AttestationMsg, Progress, TargetDoor};
use crate::events::CommitKind;
use crate::queue::{AttestationJob, JobQueue, JobReceiver};
use crate::retry::{RetryConfig, SubmitError};

/// What happened to a job
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Attestation broadcast in the given transaction
    Submitted(String),
    /// Nothing to do: settled, already attested, or seen before
    Skipped(&'static str),
    /// Re-enqueued as attempt `n`
    Retrying(u32),
    /// Given up on
    Dropped,
}

pub struct Attestor<T> {
    door: Arc<T>,
    queue: JobQueue,
    retry: RetryConfig,
    done: Mutex<BoundedCache<[u8; 32]>>,
}

impl<T: TargetDoor + 'static> Attestor<T> {
    pub fn new(
        door: Arc<T>,
        queue: JobQueue,
        retry: RetryConfig,
        done: BoundedCache<[u8; 32]>,
    ) -> Self {
        Self {
            door,
            queue,
            retry,
            done: Mutex::new(done),
        }
    }

    /// Handle one job end to end.
    pub async fn process(&self, job: AttestationJob) -> Outcome {
        let id = job.id();
        if self.done.lock().await.contains(&id) {
            debug!(commit = %job.observation.label(), "Attestation already handled");
            return Outcome::Skipped("cached");
        }

        let progress = match &job.observation.kind {
            CommitKind::Claim(commit) => self.door.claim_progress(&job.bridge, commit).await,
            CommitKind::CreateAccount(commit) => {
                self.door.create_account_progress(&job.bridge, commit).await
            }
        };

        match progress {
            Ok(Progress::Settled) => {
                self.done.lock().await.insert(id);
                return Outcome::Skipped("settled");
            }
            Ok(Progress::AttestedByUs) => {
                self.done.lock().await.insert(id);
                return Outcome::Skipped("attested");
            }
            Ok(Progress::Missing) => {
                return self.retry_or_drop(job, "claim id not allocated on target door");
            }
            Ok(Progress::Pending) => {}
            Err(e) => {
                return self.retry_or_drop(job, &format!("progress query failed: {:#}", e));
            }
        }

        let msg = match &job.observation.kind {
            CommitKind::Claim(commit) => AttestationMsg::claim(&job.bridge, commit),
            CommitKind::CreateAccount(commit) => AttestationMsg::create_account(&job.bridge, commit),
        };

        match self.door.submit(&msg).await {
            Ok(tx_hash) => {
                info!(
                    tx_hash = %tx_hash,
                    bridge_key = %bytes32_to_hex(job.observation.bridge_key()),
                    commit = %job.observation.label(),
                    attempt = job.attempt,
                    "Attestation submitted"
                );
                self.done.lock().await.insert(id);
                Outcome::Submitted(tx_hash)
            }
            Err(SubmitError::AlreadyDone(reason)) => {
                debug!(commit = %job.observation.label(), reason = %reason, "Already settled");
                self.done.lock().await.insert(id);
                Outcome::Skipped("settled")
            }
            Err(SubmitError::Permanent(reason)) => {
                error!(
                    commit = %job.observation.label(),
                    source_tx = %job.observation.tx_hash,
                    reason = %reason,
                    "Attestation rejected by target door, dropping"
                );
                Outcome::Dropped
            }
            Err(SubmitError::Transient(reason)) => self.retry_or_drop(job, &reason),
        }
    }

    fn retry_or_drop(&self, mut job: AttestationJob, reason: &str) -> Outcome {
        if !self.retry.should_retry(job.attempt) {
            error!(
                commit = %job.observation.label(),
                source_tx = %job.observation.tx_hash,
                attempts = job.attempt + 1,
                reason,
                "Retries exhausted, dropping attestation"
            );
            return Outcome::Dropped;
        }

        let delay = self.retry.backoff_for_attempt(job.attempt);
        job.attempt += 1;
        let attempt = job.attempt;
        warn!(
            commit = %job.observation.label(),
            attempt,
            delay_ms = delay.as_millis() as u64,
            reason,
            "Attestation failed, re-enqueueing"
        );
        self.queue.requeue_after(job, delay);
        Outcome::Retrying(attempt)
    }

    /// Worker loop: process jobs until shutdown or the queue closes.
    pub async fn run_worker(
        self: Arc<Self>,
        worker_id: usize,
        jobs: JobReceiver,
        mut shutdown: watch::Receiver<bool>,
    ) {
        debug!(worker_id, "Attestor worker started");
        loop {
            let job = tokio::select! {
                job = jobs.next() => job,
                _ = shutdown.changed() => None,
            };
            let Some(job) = job else { break };
            let outcome = self.process(job).await;
            debug!(worker_id, ?outcome, "Job finished");
        }
        debug!(worker_id, "Attestor worker stopped");
    }

    /// Spawn `count` workers sharing `jobs`.
    pub fn spawn_pool(
        self: &Arc<Self>,
        count: usize,
        jobs: JobReceiver,
        shutdown: watch::Receiver<bool>,
    ) -> Vec<JoinHandle<()>> {
        (0..count)
            .map(|worker_id| {
                let attestor = Arc::clone(self);
                tokio::spawn(attestor.run_worker(worker_id, jobs.clone(), shutdown.clone()))
            })
            .collect()
    }
}
