//! Witness configuration

use eyre::{eyre, Result};
use std::env;
use std::fmt;
use std::time::Duration;

use crate::retry::RetryConfig;

/// Connection settings for one door.
#[derive(Debug, Clone)]
pub struct ChainConfig {
    /// LCD endpoint of the chain
    pub lcd_url: String,
    pub chain_id: String,
    /// Door contract address on this chain
    pub door_address: String,
}

/// Witness configuration
#[derive(Clone)]
pub struct Config {
    /// Instance label attached to every log line
    pub witness_id: String,

    /// Chain observed for commit events
    pub source: ChainConfig,
    /// Chain receiving the attestations
    pub target: ChainConfig,

    /// Signing key for attestation transactions on the target chain
    pub mnemonic: String,
    pub address_prefix: String,
    pub gas_denom: String,
    pub gas_price: f64,
    pub gas_limit: u64,

    /// First source height to scan
    pub start_height: u64,
    /// Poll interval in milliseconds
    pub poll_interval_ms: u64,

    pub worker_count: usize,
    pub queue_capacity: usize,

    pub retry_max_attempts: u32,
    pub retry_initial_backoff_ms: u64,
    pub retry_max_backoff_ms: u64,

    pub cache_max_size: usize,
    pub cache_ttl_secs: u64,

    /// Emit JSON log lines instead of the human readable format
    pub log_json: bool,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("witness_id", &self.witness_id)
            .field("source", &self.source)
            .field("target", &self.target)
            .field("mnemonic", &"<redacted>")
            .field("address_prefix", &self.address_prefix)
            .field("gas_denom", &self.gas_denom)
            .field("gas_price", &self.gas_price)
            .field("gas_limit", &self.gas_limit)
            .field("start_height", &self.start_height)
            .field("poll_interval_ms", &self.poll_interval_ms)
            .field("worker_count", &self.worker_count)
            .field("queue_capacity", &self.queue_capacity)
            .field("retry_max_attempts", &self.retry_max_attempts)
            .field("retry_initial_backoff_ms", &self.retry_initial_backoff_ms)
            .field("retry_max_backoff_ms", &self.retry_max_backoff_ms)
            .field("cache_max_size", &self.cache_max_size)
            .field("cache_ttl_secs", &self.cache_ttl_secs)
            .field("log_json", &self.log_json)
            .finish()
    }
}

impl Config {
    /// Load configuration from environment
    pub fn load() -> Result<Self> {
        // Try to load .env file
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!("Loaded .env from {:?}", path);
        }

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from any key lookup (environment, map in tests).
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| lookup(key).ok_or_else(|| eyre!("{} required", key));

        let default_id = hostname::get()
            .map(|h| h.to_string_lossy().to_string())
            .unwrap_or_else(|_| format!("witness-{}", std::process::id()));

        let config = Self {
            witness_id: lookup("WITNESS_ID").unwrap_or(default_id),

            source: ChainConfig {
                lcd_url: required("SOURCE_LCD_URL")?,
                chain_id: required("SOURCE_CHAIN_ID")?,
                door_address: required("SOURCE_DOOR_ADDRESS")?,
            },
            target: ChainConfig {
                lcd_url: required("TARGET_LCD_URL")?,
                chain_id: required("TARGET_CHAIN_ID")?,
                door_address: required("TARGET_DOOR_ADDRESS")?,
            },

            mnemonic: required("WITNESS_MNEMONIC")?,
            address_prefix: lookup("ADDRESS_PREFIX").unwrap_or_else(|| "terra".to_string()),
            gas_denom: lookup("GAS_DENOM").unwrap_or_else(|| "uluna".to_string()),
            gas_price: parse_or(&lookup, "GAS_PRICE", 0.015),
            gas_limit: parse_or(&lookup, "GAS_LIMIT", 400_000),

            start_height: parse_or(&lookup, "START_HEIGHT", 1),
            poll_interval_ms: parse_or(&lookup, "POLL_INTERVAL_MS", 5000),

            worker_count: parse_or(&lookup, "WORKER_COUNT", 2),
            queue_capacity: parse_or(&lookup, "QUEUE_CAPACITY", 1024),

            retry_max_attempts: parse_or(&lookup, "RETRY_MAX_ATTEMPTS", 8),
            retry_initial_backoff_ms: parse_or(&lookup, "RETRY_INITIAL_BACKOFF_MS", 1000),
            retry_max_backoff_ms: parse_or(&lookup, "RETRY_MAX_BACKOFF_MS", 60_000),

            cache_max_size: parse_or(&lookup, "CACHE_MAX_SIZE", 10_000),
            cache_ttl_secs: parse_or(&lookup, "CACHE_TTL_SECS", 86_400),

            log_json: lookup("LOG_FORMAT")
                .map(|v| v.eq_ignore_ascii_case("json"))
                .unwrap_or(false),
        };

        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        for (name, chain) in [("source", &self.source), ("target", &self.target)] {
            if chain.lcd_url.is_empty() {
                return Err(eyre!("{} LCD URL is required", name));
            }
            if !chain.lcd_url.starts_with("http://") && !chain.lcd_url.starts_with("https://") {
                return Err(eyre!("{} LCD URL must be http(s): {}", name, chain.lcd_url));
            }
            if chain.chain_id.is_empty() {
                return Err(eyre!("{} chain ID is required", name));
            }
            if chain.door_address.is_empty() {
                return Err(eyre!("{} door address is required", name));
            }
        }

        if self.source.chain_id == self.target.chain_id
            && self.source.door_address == self.target.door_address
        {
            return Err(eyre!("Source and target door must differ"));
        }

        let words = self.mnemonic.split_whitespace().count();
        if words < 12 {
            return Err(eyre!("Mnemonic must have at least 12 words, got {}", words));
        }

        if self.gas_price <= 0.0 {
            return Err(eyre!("Gas price must be positive"));
        }
        if self.gas_limit == 0 {
            return Err(eyre!("Gas limit must be positive"));
        }
        if self.poll_interval_ms == 0 {
            return Err(eyre!("Poll interval must be positive"));
        }
        if self.worker_count == 0 {
            return Err(eyre!("Worker count must be at least 1"));
        }
        if self.queue_capacity == 0 {
            return Err(eyre!("Queue capacity must be at least 1"));
        }
        if self.cache_max_size == 0 {
            return Err(eyre!("Cache max size must be at least 1"));
        }
        if self.retry_initial_backoff_ms > self.retry_max_backoff_ms {
            return Err(eyre!(
                "Initial backoff {}ms exceeds max backoff {}ms",
                self.retry_initial_backoff_ms,
                self.retry_max_backoff_ms
            ));
        }

        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig {
            max_retries: self.retry_max_attempts,
            initial_backoff: Duration::from_millis(self.retry_initial_backoff_ms),
            max_backoff: Duration::from_millis(self.retry_max_backoff_ms),
            ..RetryConfig::default()
        }
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    lookup(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}
