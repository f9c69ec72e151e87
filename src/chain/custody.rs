//! Custody of the server-held minting key

use std::fmt;
use std::str::FromStr;

use alloy::network::EthereumWallet;
use alloy::primitives::Address;
use alloy::signers::local::PrivateKeySigner;

use super::ChainError;

/// Source of the wallet that signs achievement mints
pub trait KeyCustody: Send + Sync {
    fn address(&self) -> Address;

    fn wallet(&self) -> EthereumWallet;
}

/// Key held in process memory, loaded from configuration
pub struct LocalKeyCustody {
    signer: PrivateKeySigner,
}

impl LocalKeyCustody {
    pub fn from_private_key(raw: &str) -> Result<Self, ChainError> {
        let key = normalize_private_key(raw)?;
        let signer = PrivateKeySigner::from_str(&key)
            .map_err(|e| ChainError::InvalidInput(format!("Invalid private key: {}", e)))?;
        Ok(Self { signer })
    }
}

impl KeyCustody for LocalKeyCustody {
    fn address(&self) -> Address {
        self.signer.address()
    }

    fn wallet(&self) -> EthereumWallet {
        EthereumWallet::from(self.signer.clone())
    }
}

impl fmt::Debug for LocalKeyCustody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalKeyCustody")
            .field("address", &self.signer.address())
            .finish_non_exhaustive()
    }
}

/// Trim and ensure a "0x" prefix; the result must be 66 characters long
fn normalize_private_key(raw: &str) -> Result<String, ChainError> {
    let trimmed = raw.trim();
    let key = if trimmed.starts_with("0x") {
        trimmed.to_string()
    } else {
        format!("0x{}", trimmed)
    };

    if key.len() != 66 {
        return Err(ChainError::InvalidInput(
            "Private key must be 64 hex characters (with or without 0x prefix)".to_string(),
        ));
    }

    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    // Well-known anvil test key #0
    const TEST_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    #[test]
    fn test_normalize_private_key() {
        assert_eq!(
            normalize_private_key(&format!("  {}  ", TEST_KEY)).unwrap(),
            format!("0x{}", TEST_KEY)
        );
        assert!(normalize_private_key("0x1234").is_err());
    }

    #[test]
    fn test_custody_derives_address() {
        let custody = LocalKeyCustody::from_private_key(TEST_KEY).unwrap();
        assert_eq!(
            custody.address(),
            Address::from_str("0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266").unwrap()
        );
        assert!(!format!("{:?}", custody).contains(TEST_KEY));
    }
}
