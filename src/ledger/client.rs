use crate::error::AppResult;
use crate::signer::SenderIdentity;
use async_trait::async_trait;
use ed25519_dalek::SigningKey;
use rand::Rng;

/// Confirmation record for a transfer the ledger reports as durably included.
#[derive(Debug, Clone)]
pub struct Receipt {
    pub tx_hash: String,
    pub block_height: Option<u64>,
}

/// Connection to the remote ledger node.
///
/// The node itself is the platform; this trait is the exact surface the
/// dispatch loop consumes, so tests can substitute a mock implementation.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Pending-inclusive transaction sequence number for `address`.
    async fn get_sequence_number(&self, address: &str) -> AppResult<u64>;

    /// Current network fee rate, in the smallest gas-token unit per compute
    /// unit.
    async fn get_fee_rate(&self) -> AppResult<u64>;

    /// Signs and submits a transfer of `amount` smallest units of the
    /// configured token contract to `recipient`. Returns the transaction
    /// hash.
    async fn submit_transfer(
        &self,
        sender: &SenderIdentity,
        recipient: &str,
        amount: u128,
        gas_limit: u64,
        fee_rate: u64,
        sequence: u64,
    ) -> AppResult<String>;

    /// Blocks until the ledger reports the transaction included, the node
    /// rejects it, or the client-side confirmation timeout expires.
    async fn wait_for_confirmation(&self, tx_hash: &str) -> AppResult<Receipt>;

    /// The ledger's address-format predicate.
    fn is_valid_address(&self, address: &str) -> bool {
        super::is_valid_address(address)
    }

    /// Synthesizes a fresh destination-only address. The signing material is
    /// discarded; nothing can ever spend from these accounts.
    fn generate_fresh_address(&self) -> String {
        let seed: [u8; 32] = rand::rng().random();
        let key = SigningKey::from_bytes(&seed);
        super::address_from_public_key(&key.verifying_key())
    }
}
