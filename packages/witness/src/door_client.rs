//! LCD client for XChain Door contracts.
//!
//! Reads commit events and claim state through the chain's LCD REST API and
//! signs attestation transactions with the witness key.

use std::time::Duration;

use async_trait::async_trait;
use bip39::Mnemonic;
use cosmrs::{
    bip32::DerivationPath,
    crypto::secp256k1::SigningKey,
    tx::{self, Fee, Msg, SignDoc, SignerInfo},
    AccountId, Coin,
};
use cosmwasm_std::Uint128;
use eyre::{eyre, Result, WrapErr};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use common::{bytes32_to_hex, BridgeConfig};

use crate::events::{parse_commits, AccountCommit, ClaimCommit, Observation, TxSearchResponse};
use crate::retry::SubmitError;

/// Terra derivation path
const TERRA_DERIVATION_PATH: &str = "m/44'/330'/0'/0/0";

/// Where a claim or account creation stands on the target door, from this
/// witness's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    /// Claim id not allocated on the target door (yet)
    Missing,
    /// Open and lacking our current vote
    Pending,
    /// Open and our current vote already matches
    AttestedByUs,
    /// Claimed or account created
    Settled,
}

/// Read side of the door a witness watches.
#[async_trait]
pub trait SourceDoor: Send + Sync {
    async fn latest_height(&self) -> Result<u64>;

    /// Commits the door emitted in the block at `height`.
    async fn commits_at(&self, height: u64) -> Result<Vec<Observation>>;

    async fn bridge_config(&self, bridge_key: &[u8; 32]) -> Result<BridgeConfig>;
}

/// Door that receives this witness's attestations.
#[async_trait]
pub trait TargetDoor: Send + Sync {
    /// Door address, used to check that a bridge involves it.
    fn door_address(&self) -> &str;

    async fn claim_progress(&self, bridge: &BridgeConfig, commit: &ClaimCommit)
        -> Result<Progress>;

    async fn create_account_progress(
        &self,
        bridge: &BridgeConfig,
        commit: &AccountCommit,
    ) -> Result<Progress>;

    /// Broadcast an attestation and return the transaction hash.
    async fn submit(&self, msg: &AttestationMsg) -> std::result::Result<String, SubmitError>;
}

/// Attestation messages, serialized exactly like the door's `ExecuteMsg`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttestationMsg {
    AddClaimAttestation {
        bridge_config: BridgeConfig,
        claim_id: u64,
        amount: Uint128,
        sender: String,
        destination: Option<String>,
    },
    AddCreateAccountAttestation {
        bridge_config: BridgeConfig,
        destination: String,
        amount: Uint128,
        signature_reward: Uint128,
    },
}

impl AttestationMsg {
    pub fn claim(bridge: &BridgeConfig, commit: &ClaimCommit) -> Self {
        AttestationMsg::AddClaimAttestation {
            bridge_config: bridge.clone(),
            claim_id: commit.claim_id,
            amount: commit.amount,
            sender: commit.sender.clone(),
            destination: commit.receiver.clone(),
        }
    }

    pub fn create_account(bridge: &BridgeConfig, commit: &AccountCommit) -> Self {
        AttestationMsg::AddCreateAccountAttestation {
            bridge_config: bridge.clone(),
            destination: commit.destination.clone(),
            amount: commit.amount,
            signature_reward: commit.signature_reward,
        }
    }
}

// ============================================================================
// Smart query responses (subset of the door's query responses)
// ============================================================================

#[derive(Debug, Deserialize)]
struct SmartQueryResponse<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct BridgeConfigResponse {
    config: BridgeConfig,
}

#[derive(Debug, Deserialize)]
struct BridgeClaimResponse {
    exists: bool,
    resolved: bool,
}

#[derive(Debug, Deserialize, PartialEq)]
struct ClaimVote {
    amount: Uint128,
    sender: String,
    destination: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ClaimAttestation {
    witness: String,
    vote: ClaimVote,
    current: bool,
}

#[derive(Debug, Deserialize)]
struct ClaimAttestationsResponse {
    attestations: Vec<ClaimAttestation>,
}

#[derive(Debug, Deserialize)]
struct BridgeCreateAccountResponse {
    created: bool,
}

#[derive(Debug, Deserialize, PartialEq)]
struct CreateAccountVote {
    amount: Uint128,
    signature_reward: Uint128,
}

#[derive(Debug, Deserialize)]
struct CreateAccountAttestation {
    witness: String,
    vote: CreateAccountVote,
    current: bool,
}

#[derive(Debug, Deserialize)]
struct CreateAccountAttestationsResponse {
    attestations: Vec<CreateAccountAttestation>,
}

/// Account info from LCD
#[derive(Debug, Clone, Deserialize)]
pub struct AccountInfo {
    pub sequence: u64,
    pub account_number: u64,
}

/// Gas settings for attestation transactions
#[derive(Debug, Clone)]
pub struct GasSettings {
    pub denom: String,
    pub price: f64,
    pub limit: u64,
}

impl GasSettings {
    pub fn fee_amount(&self) -> u128 {
        ((self.limit as f64) * self.price).ceil() as u128
    }
}

struct Signer {
    signing_key: SigningKey,
    address: AccountId,
    gas: GasSettings,
    /// Next sequence to use; `None` forces a refresh from the LCD
    next_sequence: Mutex<Option<u64>>,
}

/// Door client backed by a chain's LCD endpoint
pub struct LcdDoor {
    lcd_url: String,
    chain_id: String,
    door_address: String,
    client: Client,
    signer: Option<Signer>,
}

impl LcdDoor {
    /// Create a read-only client
    pub fn new(lcd_url: &str, chain_id: &str, door_address: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .wrap_err("Failed to create HTTP client")?;

        Ok(Self {
            lcd_url: lcd_url.trim_end_matches('/').to_string(),
            chain_id: chain_id.to_string(),
            door_address: door_address.to_string(),
            client,
            signer: None,
        })
    }

    /// Attach the witness signing key derived from `mnemonic`.
    pub fn with_signer(
        mut self,
        mnemonic: &str,
        address_prefix: &str,
        gas: GasSettings,
    ) -> Result<Self> {
        let mnemonic = Mnemonic::parse(mnemonic).map_err(|e| eyre!("Invalid mnemonic: {}", e))?;

        let seed = mnemonic.to_seed("");
        let path: DerivationPath = TERRA_DERIVATION_PATH
            .parse()
            .map_err(|e| eyre!("Invalid derivation path: {:?}", e))?;

        let signing_key = SigningKey::derive_from_path(seed, &path)
            .map_err(|e| eyre!("Failed to derive signing key: {}", e))?;

        let address = signing_key
            .public_key()
            .account_id(address_prefix)
            .map_err(|e| eyre!("Failed to get account ID: {}", e))?;

        info!(
            witness_address = %address,
            door = %self.door_address,
            chain_id = %self.chain_id,
            "Door client signer initialized"
        );

        self.signer = Some(Signer {
            signing_key,
            address,
            gas,
            next_sequence: Mutex::new(None),
        });
        Ok(self)
    }

    /// Address of the attached signer
    pub fn witness_address(&self) -> Option<String> {
        self.signer.as_ref().map(|s| s.address.to_string())
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .wrap_err_with(|| format!("Request failed: {}", url))?;

        if !response.status().is_success() {
            return Err(eyre!(
                "LCD request failed: {} - {}",
                response.status(),
                response.text().await.unwrap_or_default()
            ));
        }

        response
            .json()
            .await
            .wrap_err_with(|| format!("Failed to parse response from {}", url))
    }

    /// Run a smart query against the door
    async fn smart_query<T: DeserializeOwned>(&self, query: serde_json::Value) -> Result<T> {
        let query_b64 = base64::Engine::encode(
            &base64::engine::general_purpose::STANDARD,
            serde_json::to_string(&query)?,
        );

        let url = format!(
            "{}/cosmwasm/wasm/v1/contract/{}/smart/{}",
            self.lcd_url, self.door_address, query_b64
        );

        debug!(door = %self.door_address, query = %query, "Querying door");

        let response: SmartQueryResponse<T> = self.get_json(&url).await?;
        Ok(response.data)
    }

    /// Get account info (sequence and account number)
    async fn get_account_info(&self, address: &AccountId) -> Result<AccountInfo> {
        let url = format!("{}/cosmos/auth/v1beta1/accounts/{}", self.lcd_url, address);
        let data: serde_json::Value = self.get_json(&url).await?;

        let account = data
            .get("account")
            .ok_or_else(|| eyre!("Missing 'account' field in response"))?;

        let field = |name: &str| -> u64 {
            account
                .get(name)
                .or_else(|| account.get("base_account").and_then(|b| b.get(name)))
                .and_then(|v| v.as_str())
                .and_then(|v| v.parse().ok())
                .unwrap_or(0)
        };

        Ok(AccountInfo {
            sequence: field("sequence"),
            account_number: field("account_number"),
        })
    }

    /// Sign and broadcast a door execute message
    async fn execute(&self, signer: &Signer, msg_json: Vec<u8>) -> Result<String> {
        // One broadcast at a time per signer keeps sequences ordered
        let mut next_sequence = signer.next_sequence.lock().await;

        let account_info = self.get_account_info(&signer.address).await?;
        let sequence = match *next_sequence {
            Some(seq) if seq > account_info.sequence => seq,
            _ => account_info.sequence,
        };

        let execute_msg = cosmrs::cosmwasm::MsgExecuteContract {
            sender: signer.address.clone(),
            contract: self
                .door_address
                .parse()
                .map_err(|e| eyre!("Invalid door address: {:?}", e))?,
            msg: msg_json,
            funds: vec![],
        };

        let body = tx::Body::new(
            vec![execute_msg
                .to_any()
                .map_err(|e| eyre!("Failed to convert message: {}", e))?],
            "",
            0u32,
        );

        let signer_info = SignerInfo::single_direct(Some(signer.signing_key.public_key()), sequence);

        let fee = Fee::from_amount_and_gas(
            Coin {
                denom: signer
                    .gas
                    .denom
                    .parse()
                    .map_err(|e| eyre!("Invalid gas denom: {:?}", e))?,
                amount: signer.gas.fee_amount(),
            },
            signer.gas.limit,
        );

        let auth_info = signer_info.auth_info(fee);

        let chain_id = self
            .chain_id
            .parse()
            .map_err(|_| eyre!("Invalid chain ID"))?;

        let sign_doc = SignDoc::new(&body, &auth_info, &chain_id, account_info.account_number)
            .map_err(|e| eyre!("Failed to create sign doc: {}", e))?;

        let tx_raw = sign_doc
            .sign(&signer.signing_key)
            .map_err(|e| eyre!("Failed to sign transaction: {}", e))?;

        let tx_bytes = tx_raw
            .to_bytes()
            .map_err(|e| eyre!("Failed to serialize transaction: {}", e))?;

        match self.broadcast_tx(&tx_bytes).await {
            Ok(tx_hash) => {
                *next_sequence = Some(sequence + 1);
                Ok(tx_hash)
            }
            Err(e) => {
                *next_sequence = None;
                Err(e)
            }
        }
    }

    /// Broadcast a signed transaction
    async fn broadcast_tx(&self, tx_bytes: &[u8]) -> Result<String> {
        let tx_b64 = base64::Engine::encode(&base64::engine::general_purpose::STANDARD, tx_bytes);

        let broadcast_request = serde_json::json!({
            "tx_bytes": tx_b64,
            "mode": "BROADCAST_MODE_SYNC"
        });

        let broadcast_url = format!("{}/cosmos/tx/v1beta1/txs", self.lcd_url);

        debug!(url = %broadcast_url, "Broadcasting transaction");

        let response = self
            .client
            .post(&broadcast_url)
            .json(&broadcast_request)
            .send()
            .await
            .map_err(|e| eyre!("Failed to broadcast: {}", e))?;

        let status = response.status();
        let body: serde_json::Value = response
            .json()
            .await
            .unwrap_or_else(|_| serde_json::json!({"error": "Failed to parse response"}));

        if status.is_success() {
            if let Some(tx_response) = body.get("tx_response") {
                let code = tx_response
                    .get("code")
                    .and_then(|v| v.as_u64())
                    .unwrap_or(0);

                if code == 0 {
                    let txhash = tx_response
                        .get("txhash")
                        .and_then(|v| v.as_str())
                        .unwrap_or("")
                        .to_string();

                    return Ok(txhash);
                }

                let raw_log = tx_response
                    .get("raw_log")
                    .and_then(|v| v.as_str())
                    .unwrap_or("Unknown error");

                return Err(eyre!("Transaction failed (code {}): {}", code, raw_log));
            }
        }

        Err(eyre!("Broadcast failed ({}): {}", status, body))
    }
}

#[async_trait]
impl SourceDoor for LcdDoor {
    async fn latest_height(&self) -> Result<u64> {
        let url = format!("{}/cosmos/base/tendermint/v1beta1/blocks/latest", self.lcd_url);
        let data: serde_json::Value = self.get_json(&url).await?;

        data["block"]["header"]["height"]
            .as_str()
            .ok_or_else(|| eyre!("Missing block height in response"))?
            .parse()
            .wrap_err("Invalid block height")
    }

    async fn commits_at(&self, height: u64) -> Result<Vec<Observation>> {
        let url = format!(
            "{}/cosmos/tx/v1beta1/txs?events=wasm._contract_address='{}'&events=tx.height={}",
            self.lcd_url, self.door_address, height
        );

        let response: TxSearchResponse = self
            .get_json(&url)
            .await
            .wrap_err("Failed to query transactions")?;

        let mut observations = Vec::new();
        for tx in &response.tx_responses {
            observations.extend(parse_commits(tx, &self.door_address)?);
        }
        Ok(observations)
    }

    async fn bridge_config(&self, bridge_key: &[u8; 32]) -> Result<BridgeConfig> {
        let query = serde_json::json!({
            "bridge_config": {
                "bridge_key": base64::Engine::encode(
                    &base64::engine::general_purpose::STANDARD,
                    bridge_key,
                )
            }
        });

        let response: BridgeConfigResponse = self
            .smart_query(query)
            .await
            .wrap_err_with(|| format!("Bridge {} lookup failed", bytes32_to_hex(bridge_key)))?;
        Ok(response.config)
    }
}

#[async_trait]
impl TargetDoor for LcdDoor {
    fn door_address(&self) -> &str {
        &self.door_address
    }

    async fn claim_progress(
        &self,
        bridge: &BridgeConfig,
        commit: &ClaimCommit,
    ) -> Result<Progress> {
        let claim: BridgeClaimResponse = self
            .smart_query(serde_json::json!({
                "bridge_claim": { "bridge_config": bridge, "claim_id": commit.claim_id }
            }))
            .await?;

        if !claim.exists {
            return Ok(Progress::Missing);
        }
        if claim.resolved {
            return Ok(Progress::Settled);
        }

        let Some(me) = self.witness_address() else {
            return Ok(Progress::Pending);
        };

        let ours = ClaimVote {
            amount: commit.amount,
            sender: commit.sender.clone(),
            destination: commit.receiver.clone(),
        };
        let attestations: ClaimAttestationsResponse = self
            .smart_query(serde_json::json!({
                "claim_attestations": { "bridge_config": bridge, "claim_id": commit.claim_id }
            }))
            .await?;

        let attested = attestations
            .attestations
            .iter()
            .any(|a| a.current && a.witness == me && a.vote == ours);

        Ok(if attested {
            Progress::AttestedByUs
        } else {
            Progress::Pending
        })
    }

    async fn create_account_progress(
        &self,
        bridge: &BridgeConfig,
        commit: &AccountCommit,
    ) -> Result<Progress> {
        let record: BridgeCreateAccountResponse = self
            .smart_query(serde_json::json!({
                "bridge_create_account": {
                    "bridge_config": bridge,
                    "account": commit.destination,
                }
            }))
            .await?;

        if record.created {
            return Ok(Progress::Settled);
        }

        let Some(me) = self.witness_address() else {
            return Ok(Progress::Pending);
        };

        let ours = CreateAccountVote {
            amount: commit.amount,
            signature_reward: commit.signature_reward,
        };
        let attestations: CreateAccountAttestationsResponse = self
            .smart_query(serde_json::json!({
                "create_account_attestations": {
                    "bridge_config": bridge,
                    "account": commit.destination,
                }
            }))
            .await?;

        let attested = attestations
            .attestations
            .iter()
            .any(|a| a.current && a.witness == me && a.vote == ours);

        Ok(if attested {
            Progress::AttestedByUs
        } else {
            Progress::Pending
        })
    }

    async fn submit(&self, msg: &AttestationMsg) -> std::result::Result<String, SubmitError> {
        let signer = self
            .signer
            .as_ref()
            .ok_or_else(|| SubmitError::Permanent("door client has no signer".to_string()))?;

        let msg_json = serde_json::to_vec(msg)
            .map_err(|e| SubmitError::Permanent(format!("Failed to encode message: {}", e)))?;

        match self.execute(signer, msg_json).await {
            Ok(tx_hash) => Ok(tx_hash),
            Err(e) => {
                let message = format!("{:#}", e);
                warn!(door = %self.door_address, error = %message, "Attestation broadcast failed");
                Err(SubmitError::from_message(message))
            }
        }
    }
}
