pub mod client;
pub mod rpc;

pub use client::{LedgerClient, Receipt};
pub use rpc::{JsonRpcLedger, LedgerConfig};

use ed25519_dalek::VerifyingKey;

/// Ledger address grammar: `0x` followed by the hex encoding of a 32-byte
/// public key.
pub fn is_valid_address(address: &str) -> bool {
    match address.strip_prefix("0x") {
        Some(body) => body.len() == 64 && body.chars().all(|c| c.is_ascii_hexdigit()),
        None => false,
    }
}

pub fn address_from_public_key(key: &VerifyingKey) -> String {
    format!("0x{}", hex::encode(key.to_bytes()))
}
