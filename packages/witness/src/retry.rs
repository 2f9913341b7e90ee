//! Retry policy and error classification for attestation submission

use std::time::Duration;
use thiserror::Error;

/// Attestation retry configuration
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retry attempts
    pub max_retries: u32,
    /// Initial backoff duration
    pub initial_backoff: Duration,
    /// Maximum backoff duration
    pub max_backoff: Duration,
    /// Backoff multiplier for exponential growth
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 8,
            initial_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(60),
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    /// Calculate backoff duration for a given attempt (0-indexed)
    pub fn backoff_for_attempt(&self, attempt: u32) -> Duration {
        let backoff_secs =
            self.initial_backoff.as_secs_f64() * self.backoff_multiplier.powi(attempt as i32);
        let capped = backoff_secs.min(self.max_backoff.as_secs_f64());
        Duration::from_secs_f64(capped)
    }

    /// Check if we should retry based on attempt count
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_retries
    }
}

/// Classifies errors for retry decisions
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorClass {
    /// Temporary failure, retry (LCD timeout, paused door, sequence race,
    /// escrow not yet funded)
    Transient,
    /// The door already settled what we were attesting
    AlreadyDone,
    /// The door rejected the attestation, do not retry
    Permanent,
    /// Unknown error, retried with backoff
    Unknown,
}

/// Classify an error message for retry decisions
pub fn classify_error(error: &str) -> ErrorClass {
    let error_lower = error.to_lowercase();

    if error_lower.contains("already resolved") || error_lower.contains("already created") {
        return ErrorClass::AlreadyDone;
    }

    // Transient errors
    if error_lower.contains("timeout")
        || error_lower.contains("timed out")
        || error_lower.contains("connection")
        || error_lower.contains("network")
        || error_lower.contains("rate limit")
        || error_lower.contains("too many requests")
        || error_lower.contains("503")
        || error_lower.contains("502")
        || error_lower.contains("temporarily unavailable")
        || error_lower.contains("account sequence mismatch")
        || error_lower.contains("mempool is full")
        || error_lower.contains("door is paused")
        || error_lower.contains("insufficient funds")
    {
        return ErrorClass::Transient;
    }

    // Door rejections
    if error_lower.contains("unauthorized")
        || error_lower.contains("attestation mismatch")
        || error_lower.contains("claim not found")
        || error_lower.contains("bridge not found")
        || error_lower.contains("invalid")
        || error_lower.contains("below minimum")
        || error_lower.contains("only supported")
        || error_lower.contains("insufficient fee")
        || error_lower.contains("out of gas")
    {
        return ErrorClass::Permanent;
    }

    ErrorClass::Unknown
}

/// Failure of a single attestation submission
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SubmitError {
    #[error("transient submission failure: {0}")]
    Transient(String),

    #[error("attestation rejected: {0}")]
    Permanent(String),

    #[error("already settled: {0}")]
    AlreadyDone(String),
}

impl SubmitError {
    /// Map a raw error message onto a submission failure.
    pub fn from_message(message: impl Into<String>) -> Self {
        let message = message.into();
        match classify_error(&message) {
            ErrorClass::AlreadyDone => SubmitError::AlreadyDone(message),
            ErrorClass::Permanent => SubmitError::Permanent(message),
            ErrorClass::Transient | ErrorClass::Unknown => SubmitError::Transient(message),
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, SubmitError::Transient(_))
    }
}
