//! Commit events emitted by a door, as returned by the LCD tx search.

use cosmwasm_std::Uint128;
use eyre::{eyre, Result, WrapErr};
use serde::{de, Deserialize, Deserializer};

use common::bytes32_to_hex;

/// Response types for LCD API calls
#[derive(Debug, Deserialize)]
pub struct TxSearchResponse {
    #[serde(default)]
    pub tx_responses: Vec<TxResponse>,
}

#[derive(Debug, Deserialize)]
pub struct TxResponse {
    pub txhash: String,
    #[serde(deserialize_with = "deserialize_string_to_u64")]
    pub height: u64,
    #[serde(default)]
    pub code: u32,
    #[serde(default)]
    pub events: Vec<Event>,
}

#[derive(Debug, Deserialize)]
pub struct Event {
    #[serde(rename = "type")]
    pub type_str: String,
    pub attributes: Vec<Attribute>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Attribute {
    pub key: String,
    pub value: String,
}

/// A value commit observed on the source door.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimCommit {
    pub bridge_key: [u8; 32],
    pub claim_id: u64,
    pub sender: String,
    pub amount: Uint128,
    /// `None` for `commit_without_address`
    pub receiver: Option<String>,
}

/// An account-creation commit observed on the source door.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountCommit {
    pub bridge_key: [u8; 32],
    pub destination: String,
    pub amount: Uint128,
    pub signature_reward: Uint128,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitKind {
    Claim(ClaimCommit),
    CreateAccount(AccountCommit),
}

/// A commit together with where it was seen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Observation {
    pub tx_hash: String,
    pub height: u64,
    pub kind: CommitKind,
}

impl Observation {
    pub fn bridge_key(&self) -> &[u8; 32] {
        match &self.kind {
            CommitKind::Claim(c) => &c.bridge_key,
            CommitKind::CreateAccount(c) => &c.bridge_key,
        }
    }

    /// Short label for logs: `claim:<id>` or `account:<destination>`.
    pub fn label(&self) -> String {
        match &self.kind {
            CommitKind::Claim(c) => format!("claim:{}", c.claim_id),
            CommitKind::CreateAccount(c) => format!("account:{}", c.destination),
        }
    }
}

/// Extract every commit the door emitted in a transaction.
///
/// Failed transactions (non-zero `code`) and events from other contracts
/// are ignored. A commit event with missing or malformed attributes is an
/// error: the door always emits them.
pub fn parse_commits(tx: &TxResponse, door_address: &str) -> Result<Vec<Observation>> {
    if tx.code != 0 {
        return Ok(Vec::new());
    }

    let mut observations = Vec::new();
    for event in &tx.events {
        if event.type_str != "wasm" {
            continue;
        }

        if find(&event.attributes, "_contract_address") != Some(door_address) {
            continue;
        }

        let kind = match find(&event.attributes, "method") {
            Some("commit") => CommitKind::Claim(ClaimCommit {
                bridge_key: extract_key(&event.attributes)?,
                claim_id: extract_u64(&event.attributes, "claim_id")?,
                sender: extract_string(&event.attributes, "sender")?,
                amount: extract_amount(&event.attributes, "amount")?,
                receiver: Some(extract_string(&event.attributes, "receiver")?),
            }),
            Some("commit_without_address") => CommitKind::Claim(ClaimCommit {
                bridge_key: extract_key(&event.attributes)?,
                claim_id: extract_u64(&event.attributes, "claim_id")?,
                sender: extract_string(&event.attributes, "sender")?,
                amount: extract_amount(&event.attributes, "amount")?,
                receiver: None,
            }),
            Some("create_account_commit") => CommitKind::CreateAccount(AccountCommit {
                bridge_key: extract_key(&event.attributes)?,
                destination: extract_string(&event.attributes, "destination")?,
                amount: extract_amount(&event.attributes, "amount")?,
                signature_reward: extract_amount(&event.attributes, "signature_reward")?,
            }),
            _ => continue,
        };

        let observation = Observation {
            tx_hash: tx.txhash.clone(),
            height: tx.height,
            kind,
        };
        tracing::debug!(
            tx_hash = %observation.tx_hash,
            height = observation.height,
            bridge_key = %bytes32_to_hex(observation.bridge_key()),
            commit = %observation.label(),
            "Parsed door commit"
        );
        observations.push(observation);
    }

    Ok(observations)
}

fn find<'a>(attrs: &'a [Attribute], key: &str) -> Option<&'a str> {
    attrs
        .iter()
        .find(|a| a.key == key)
        .map(|a| a.value.as_str())
}

/// Helper function to extract string attribute
fn extract_string(attrs: &[Attribute], key: &str) -> Result<String> {
    find(attrs, key)
        .map(str::to_string)
        .ok_or_else(|| eyre!("Missing attribute: {}", key))
}

/// Helper function to extract u64 attribute
fn extract_u64(attrs: &[Attribute], key: &str) -> Result<u64> {
    extract_string(attrs, key)?
        .parse()
        .wrap_err_with(|| format!("Invalid u64 for {}", key))
}

fn extract_amount(attrs: &[Attribute], key: &str) -> Result<Uint128> {
    let raw = extract_string(attrs, key)?;
    raw.parse::<u128>()
        .map(Uint128::new)
        .wrap_err_with(|| format!("Invalid amount for {}: {}", key, raw))
}

/// Decode the `0x`-prefixed `bridge_key` attribute.
fn extract_key(attrs: &[Attribute]) -> Result<[u8; 32]> {
    let raw = extract_string(attrs, "bridge_key")?;
    let bytes = hex::decode(raw.trim_start_matches("0x"))
        .wrap_err_with(|| format!("Invalid bridge_key hex: {}", raw))?;
    bytes
        .try_into()
        .map_err(|b: Vec<u8>| eyre!("bridge_key must be 32 bytes, got {}", b.len()))
}

/// Custom deserializer for Cosmos API responses that return numbers as strings.
/// Handles both string "123" and numeric 123 formats.
fn deserialize_string_to_u64<'de, D>(deserializer: D) -> std::result::Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    struct StringOrU64Visitor;

    impl de::Visitor<'_> for StringOrU64Visitor {
        type Value = u64;

        fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
            formatter.write_str("a string or integer")
        }

        fn visit_u64<E>(self, value: u64) -> std::result::Result<u64, E>
        where
            E: de::Error,
        {
            Ok(value)
        }

        fn visit_i64<E>(self, value: i64) -> std::result::Result<u64, E>
        where
            E: de::Error,
        {
            u64::try_from(value).map_err(|_| E::custom(format!("negative height {}", value)))
        }

        fn visit_str<E>(self, value: &str) -> std::result::Result<u64, E>
        where
            E: de::Error,
        {
            value.parse().map_err(E::custom)
        }
    }

    deserializer.deserialize_any(StringOrU64Visitor)
}
