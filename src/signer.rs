use std::fs;
use std::path::Path;

use ed25519_dalek::{Signature, Signer, SigningKey};
use tracing::info;

use crate::error::{AppError, AppResult};
use crate::ledger;

/// A sender account: signing key plus its derived ledger address. The key
/// never leaves this type; collaborators get addresses and signatures.
pub struct SenderIdentity {
    key: SigningKey,
    address: String,
}

impl SenderIdentity {
    /// Parses one line of key material: the hex encoding of a 32-byte ed25519
    /// secret key, with or without a `0x` prefix.
    pub fn from_secret_hex(raw: &str) -> AppResult<Self> {
        let body = raw.trim().trim_start_matches("0x");
        let bytes = hex::decode(body)
            .map_err(|_| AppError::Config("signing key is not valid hex".to_string()))?;
        let seed: [u8; 32] = bytes
            .try_into()
            .map_err(|_| AppError::Config("signing key must be exactly 32 bytes".to_string()))?;

        let key = SigningKey::from_bytes(&seed);
        let address = ledger::address_from_public_key(&key.verifying_key());
        Ok(Self { key, address })
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn public_key_hex(&self) -> String {
        hex::encode(self.key.verifying_key().to_bytes())
    }

    pub fn sign(&self, message: &[u8]) -> Signature {
        self.key.sign(message)
    }
}

/// Ordered, non-empty pool of sender identities. Senders are assigned to
/// recipients round-robin by list index, so submission order per sender is
/// strictly increasing and sequence numbers never race.
pub struct SignerPool {
    senders: Vec<SenderIdentity>,
}

impl SignerPool {
    pub fn load(raw_keys: &[String]) -> AppResult<Self> {
        let mut senders = Vec::with_capacity(raw_keys.len());
        for (line, raw) in raw_keys.iter().enumerate() {
            let sender = SenderIdentity::from_secret_hex(raw).map_err(|e| match e {
                AppError::Config(msg) => {
                    AppError::Config(format!("signing key on line {}: {}", line + 1, msg))
                }
                other => other,
            })?;
            senders.push(sender);
        }

        if senders.is_empty() {
            return Err(AppError::Config(
                "no signing keys provided; the pool must hold at least one sender".to_string(),
            ));
        }

        Ok(Self { senders })
    }

    /// Reads one hex key per line, trimming whitespace and dropping blanks.
    pub fn from_file(path: &Path) -> AppResult<Self> {
        let raw = fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("failed to read key file {}: {}", path.display(), e))
        })?;

        let keys: Vec<String> = raw
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();

        let pool = Self::load(&keys)?;
        info!("Loaded {} sender wallets from {}", pool.len(), path.display());
        Ok(pool)
    }

    pub fn len(&self) -> usize {
        self.senders.len()
    }

    /// Round-robin assignment; total for any index because the pool is
    /// non-empty by construction.
    pub fn sender_for(&self, index: usize) -> &SenderIdentity {
        &self.senders[index % self.senders.len()]
    }
}
