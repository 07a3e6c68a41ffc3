use std::time::{Duration, Instant};

use async_trait::async_trait;
use borsh::BorshSerialize;
use serde::Deserialize;
use serde_json::json;
use sha2::{Digest, Sha256};
use tokio::time;
use tracing::info;

use super::client::{LedgerClient, Receipt};
use crate::error::{AppResult, LedgerError};
use crate::signer::SenderIdentity;

#[derive(Debug, Clone)]
pub struct LedgerConfig {
    pub rpc_url: String,
    pub token_address: String,
    pub confirmation_timeout: Duration,
    pub confirmation_poll_interval: Duration,
}

impl LedgerConfig {
    pub fn new(rpc_url: String, token_address: String) -> Self {
        Self {
            rpc_url,
            token_address,
            confirmation_timeout: Duration::from_secs(60),
            confirmation_poll_interval: Duration::from_secs(2),
        }
    }
}

/// Production ledger client speaking JSON-RPC 2.0 to the configured node.
pub struct JsonRpcLedger {
    config: LedgerConfig,
    http: reqwest::Client,
}

/// Canonical signing payload for a token transfer. The node verifies the
/// ed25519 signature over the SHA-256 digest of these borsh bytes.
#[derive(BorshSerialize)]
struct TransferPayload {
    token: String,
    sender: String,
    recipient: String,
    amount: u128,
    gas_limit: u64,
    fee_rate: u64,
    sequence: u64,
}

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    hash: String,
}

#[derive(Debug, Deserialize)]
struct TransactionStatus {
    status: String,
    #[serde(default)]
    block_height: Option<u64>,
}

impl JsonRpcLedger {
    pub fn new(config: LedgerConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }

    async fn call(&self, method: &str, params: serde_json::Value) -> Result<serde_json::Value, LedgerError> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });

        let response = self.http.post(&self.config.rpc_url).json(&body).send().await?;
        if !response.status().is_success() {
            return Err(LedgerError::Rpc(format!(
                "{} returned HTTP {}",
                method,
                response.status()
            )));
        }

        let payload: serde_json::Value = response
            .json()
            .await
            .map_err(|e| LedgerError::Rpc(format!("{}: unparseable response: {}", method, e)))?;

        if let Some(error) = payload.get("error").filter(|e| !e.is_null()) {
            return Err(LedgerError::Rejected(format!("{}: {}", method, error)));
        }

        payload
            .get("result")
            .cloned()
            .ok_or_else(|| LedgerError::Rpc(format!("{}: response carried no result", method)))
    }
}

fn payload_digest(payload: &TransferPayload) -> Result<[u8; 32], LedgerError> {
    let bytes = borsh::to_vec(payload)
        .map_err(|e| LedgerError::Rpc(format!("failed to encode transfer payload: {}", e)))?;
    Ok(Sha256::digest(&bytes).into())
}

#[async_trait]
impl LedgerClient for JsonRpcLedger {
    async fn get_sequence_number(&self, address: &str) -> AppResult<u64> {
        let result = self
            .call("account_sequence", json!([address, "pending"]))
            .await?;
        let sequence = result.as_u64().ok_or_else(|| {
            LedgerError::Rpc(format!("account_sequence for {}: non-integer result", address))
        })?;
        Ok(sequence)
    }

    async fn get_fee_rate(&self) -> AppResult<u64> {
        let result = self.call("fee_rate", json!([])).await?;
        let fee_rate = result
            .as_u64()
            .ok_or_else(|| LedgerError::Rpc("fee_rate: non-integer result".to_string()))?;
        Ok(fee_rate)
    }

    async fn submit_transfer(
        &self,
        sender: &SenderIdentity,
        recipient: &str,
        amount: u128,
        gas_limit: u64,
        fee_rate: u64,
        sequence: u64,
    ) -> AppResult<String> {
        let payload = TransferPayload {
            token: self.config.token_address.clone(),
            sender: sender.address().to_string(),
            recipient: recipient.to_string(),
            amount,
            gas_limit,
            fee_rate,
            sequence,
        };

        let digest = payload_digest(&payload)?;
        let signature = sender.sign(&digest);

        let transaction = json!({
            "transfer": {
                "token": payload.token,
                "sender": payload.sender,
                "recipient": payload.recipient,
                "amount": payload.amount.to_string(),
                "gas_limit": payload.gas_limit,
                "fee_rate": payload.fee_rate,
                "sequence": payload.sequence,
            },
            "public_key": sender.public_key_hex(),
            "signature": hex::encode(signature.to_bytes()),
        });

        let result = self.call("submit_transaction", json!([transaction])).await?;
        let submitted: SubmitResponse = serde_json::from_value(result).map_err(|e| {
            LedgerError::Rpc(format!("submit_transaction: malformed result: {}", e))
        })?;

        info!("Transaction submitted: {}", submitted.hash);
        Ok(submitted.hash)
    }

    async fn wait_for_confirmation(&self, tx_hash: &str) -> AppResult<Receipt> {
        let started = Instant::now();

        while started.elapsed() < self.config.confirmation_timeout {
            match self.call("transaction_status", json!([tx_hash])).await {
                Ok(result) => {
                    let status: TransactionStatus =
                        serde_json::from_value(result).map_err(|e| {
                            LedgerError::Rpc(format!("transaction_status: malformed result: {}", e))
                        })?;

                    match status.status.as_str() {
                        "included" | "finalized" => {
                            return Ok(Receipt {
                                tx_hash: tx_hash.to_string(),
                                block_height: status.block_height,
                            });
                        }
                        "rejected" => {
                            return Err(LedgerError::Rejected(format!(
                                "transaction {} rejected by the network",
                                tx_hash
                            ))
                            .into());
                        }
                        _ => {}
                    }
                }
                // A flaky status endpoint is retried while the clock runs.
                Err(_) => {}
            }

            time::sleep(self.config.confirmation_poll_interval).await;
        }

        Err(LedgerError::ConfirmationTimeout(self.config.confirmation_timeout.as_secs()).into())
    }
}
