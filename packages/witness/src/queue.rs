//! Bounded attestation job queue shared by the watcher and the attestor pool.
//!
//! Delivery is at-least-once: a job that failed transiently is pushed back
//! after its backoff elapses, and the attestor's cache absorbs duplicates.

use std::sync::Arc;
use std::time::Duration;

use eyre::{eyre, Result};
use tokio::sync::{mpsc, Mutex};

use common::{keccak256, BridgeConfig};

use crate::events::{CommitKind, Observation};

/// One attestation to deliver to the target door.
#[derive(Debug, Clone, PartialEq)]
pub struct AttestationJob {
    pub bridge: BridgeConfig,
    pub observation: Observation,
    /// Delivery attempts already made
    pub attempt: u32,
}

impl AttestationJob {
    pub fn new(bridge: BridgeConfig, observation: Observation) -> Self {
        Self {
            bridge,
            observation,
            attempt: 0,
        }
    }

    /// Identity of the vote this job casts.
    ///
    /// Two commits that would produce the same attestation share an id;
    /// the transaction they were seen in does not matter.
    pub fn id(&self) -> [u8; 32] {
        let mut data = Vec::with_capacity(128);
        data.extend_from_slice(self.observation.bridge_key());
        match &self.observation.kind {
            CommitKind::Claim(c) => {
                data.push(0);
                data.extend_from_slice(&c.claim_id.to_be_bytes());
                data.extend_from_slice(&c.amount.u128().to_be_bytes());
                push_str(&mut data, &c.sender);
                match &c.receiver {
                    Some(receiver) => {
                        data.push(1);
                        push_str(&mut data, receiver);
                    }
                    None => data.push(0),
                }
            }
            CommitKind::CreateAccount(c) => {
                data.push(1);
                push_str(&mut data, &c.destination);
                data.extend_from_slice(&c.amount.u128().to_be_bytes());
                data.extend_from_slice(&c.signature_reward.u128().to_be_bytes());
            }
        }
        keccak256(&data)
    }
}

fn push_str(data: &mut Vec<u8>, s: &str) {
    data.extend_from_slice(&(s.len() as u32).to_be_bytes());
    data.extend_from_slice(s.as_bytes());
}

/// Producer half of the queue.
#[derive(Clone)]
pub struct JobQueue {
    sender: mpsc::Sender<AttestationJob>,
}

/// Consumer half, shared by every attestor worker.
#[derive(Clone)]
pub struct JobReceiver {
    receiver: Arc<Mutex<mpsc::Receiver<AttestationJob>>>,
}

/// Create a queue holding at most `capacity` pending jobs.
pub fn job_queue(capacity: usize) -> (JobQueue, JobReceiver) {
    let (sender, receiver) = mpsc::channel(capacity.max(1));
    (
        JobQueue { sender },
        JobReceiver {
            receiver: Arc::new(Mutex::new(receiver)),
        },
    )
}

impl JobQueue {
    /// Enqueue a job, waiting while the queue is full.
    pub async fn push(&self, job: AttestationJob) -> Result<()> {
        self.sender
            .send(job)
            .await
            .map_err(|_| eyre!("Attestation queue closed"))
    }

    /// Enqueue `job` again once `delay` has elapsed.
    pub fn requeue_after(&self, job: AttestationJob, delay: Duration) {
        let sender = self.sender.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if sender.send(job).await.is_err() {
                tracing::warn!("Attestation queue closed, dropping retried job");
            }
        });
    }

    /// Jobs that can still be enqueued without waiting.
    pub fn available(&self) -> usize {
        self.sender.capacity()
    }
}

impl JobReceiver {
    /// Next job, or `None` once every producer is gone.
    pub async fn next(&self) -> Option<AttestationJob> {
        self.receiver.lock().await.recv().await
    }
}
