use crate::error::{AppError, AppResult};
use crate::ledger;

#[derive(Debug, Clone)]
pub struct Config {
    pub token_address: String,
    pub rpc_url: String,
    pub gas_token: String,
}

impl Config {
    /// Reads operator configuration from the environment. `TOKEN_ADDRESS` and
    /// `RPC_URL` are required; `GAS_TOKEN` is a cosmetic display label.
    pub fn from_env() -> AppResult<Self> {
        let token_address = std::env::var("TOKEN_ADDRESS")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| AppError::Config("TOKEN_ADDRESS is not set in the environment".to_string()))?;

        if !ledger::is_valid_address(&token_address) {
            return Err(AppError::Config(format!(
                "TOKEN_ADDRESS {} is not a valid ledger address",
                token_address
            )));
        }

        let rpc_url = std::env::var("RPC_URL")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| AppError::Config("RPC_URL is not set or empty in the environment".to_string()))?;

        let gas_token = std::env::var("GAS_TOKEN").unwrap_or_else(|_| "GAS".to_string());

        Ok(Self {
            token_address,
            rpc_url,
            gas_token,
        })
    }
}
