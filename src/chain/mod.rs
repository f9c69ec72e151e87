//! EVM chain access: the LoanLedger contract and the achievement NFT
//!
//! Contract calls go through the [`LoanLedgerContract`] and
//! [`AchievementContract`] traits so services never touch a provider
//! directly. The alloy-backed adapters live next to in-memory ones.

pub mod achievement;
pub mod contracts;
pub mod custody;
pub mod ledger;
pub mod memory;
pub mod metadata;
pub mod rate;

use std::future::Future;
use std::str::FromStr;
use std::time::Duration;

use alloy::primitives::{Address, B256};
use thiserror::Error;

use crate::identity::normalize_wallet;

pub use achievement::{AchievementContract, AchievementMinter, MintOutcome, OnchainAchievementContract};
pub use custody::{KeyCustody, LocalKeyCustody};
pub use ledger::{LedgerLoanRecord, LoanLedgerContract, OnchainLoanLedger};
pub use memory::{MemoryAchievementContract, MemoryLoanLedger};
pub use metadata::{AchievementMetadata, MetadataService};
pub use rate::ExchangeRate;

#[derive(Debug, Error)]
pub enum ChainError {
    #[error("{0}")]
    NotConfigured(String),

    #[error("{0}")]
    InvalidInput(String),

    #[error("RPC error: {0}")]
    Rpc(String),

    #[error("Transaction failed: {0}")]
    Reverted(String),

    #[error("Chain call timed out after {0}s")]
    Timeout(u64),
}

pub(crate) fn rpc_error(err: impl std::fmt::Display) -> ChainError {
    ChainError::Rpc(err.to_string())
}

/// Bounds a chain call by `limit`
pub(crate) async fn bounded<T, F>(limit: Duration, fut: F) -> Result<T, ChainError>
where
    F: Future<Output = Result<T, ChainError>>,
{
    tokio::time::timeout(limit, fut)
        .await
        .map_err(|_| ChainError::Timeout(limit.as_secs()))?
}

/// "0x" followed by exactly 64 hex characters
pub fn is_bytes32_hex(value: &str) -> bool {
    value
        .strip_prefix("0x")
        .map(|hex| hex.len() == 64 && hex.chars().all(|c| c.is_ascii_hexdigit()))
        .unwrap_or(false)
}

/// Accepts the id with or without its "0x" prefix
pub fn parse_bytes32(raw: &str) -> Result<B256, ChainError> {
    let trimmed = raw.trim();
    let prefixed = if trimmed.starts_with("0x") {
        trimmed.to_string()
    } else {
        format!("0x{}", trimmed)
    };
    if !is_bytes32_hex(&prefixed) {
        return Err(ChainError::InvalidInput(format!(
            "'{}' is not a 32-byte hex value",
            raw
        )));
    }
    B256::from_str(&prefixed).map_err(|e| ChainError::InvalidInput(e.to_string()))
}

pub fn parse_address(raw: &str) -> Result<Address, ChainError> {
    Address::from_str(&normalize_wallet(raw))
        .map_err(|e| ChainError::InvalidInput(format!("Invalid address '{}': {}", raw, e)))
}
