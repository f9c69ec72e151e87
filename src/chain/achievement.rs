//! Achievement NFT minted when a loan is paid back

use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::{Address, B256, U256};
use alloy::providers::ProviderBuilder;
use alloy::transports::http::reqwest::Url;
use async_trait::async_trait;
use serde::Serialize;

use super::contracts::IAchievementNFT;
use super::custody::KeyCustody;
use super::{bounded, parse_address, parse_bytes32, rpc_error, ChainError};

#[async_trait]
pub trait AchievementContract: Send + Sync {
    async fn has_achievement(&self, loan_id: B256) -> Result<bool, ChainError>;

    async fn token_id_for_loan(&self, loan_id: B256) -> Result<U256, ChainError>;

    /// Submits `mintAchievement` and waits for the receipt. Returns the
    /// transaction hash; a failed receipt is `ChainError::Reverted`.
    async fn mint_achievement(
        &self,
        recipient: Address,
        loan_id: B256,
        amount: U256,
    ) -> Result<B256, ChainError>;

    /// Zero when the token does not exist
    async fn loan_for_token(&self, token_id: U256) -> Result<B256, ChainError>;

    async fn owner_of(&self, token_id: U256) -> Result<Address, ChainError>;
}

/// alloy adapter over a deployed achievement contract
pub struct OnchainAchievementContract {
    rpc_url: Url,
    address: Address,
    custody: Option<Arc<dyn KeyCustody>>,
}

impl OnchainAchievementContract {
    pub fn new(
        rpc_url: &str,
        address: &str,
        custody: Option<Arc<dyn KeyCustody>>,
    ) -> Result<Self, ChainError> {
        let rpc_url = rpc_url
            .parse::<Url>()
            .map_err(|e| ChainError::InvalidInput(format!("Invalid RPC URL: {}", e)))?;
        Ok(Self {
            rpc_url,
            address: parse_address(address)?,
            custody,
        })
    }
}

#[async_trait]
impl AchievementContract for OnchainAchievementContract {
    async fn has_achievement(&self, loan_id: B256) -> Result<bool, ChainError> {
        let provider = ProviderBuilder::new().connect_http(self.rpc_url.clone());
        let contract = IAchievementNFT::new(self.address, &provider);

        contract.hasAchievement(loan_id).call().await.map_err(rpc_error)
    }

    async fn token_id_for_loan(&self, loan_id: B256) -> Result<U256, ChainError> {
        let provider = ProviderBuilder::new().connect_http(self.rpc_url.clone());
        let contract = IAchievementNFT::new(self.address, &provider);

        contract
            .getTokenIdForLoan(loan_id)
            .call()
            .await
            .map_err(rpc_error)
    }

    async fn mint_achievement(
        &self,
        recipient: Address,
        loan_id: B256,
        amount: U256,
    ) -> Result<B256, ChainError> {
        let custody = self.custody.as_ref().ok_or_else(|| {
            ChainError::NotConfigured(
                "NFT_MINTER_PRIVATE_KEY not configured. Cannot mint NFTs server-side.".to_string(),
            )
        })?;

        let provider = ProviderBuilder::new()
            .wallet(custody.wallet())
            .connect_http(self.rpc_url.clone());
        let contract = IAchievementNFT::new(self.address, &provider);

        let pending_tx = contract
            .mintAchievement(recipient, loan_id, amount)
            .send()
            .await
            .map_err(rpc_error)?;

        let tx_hash = *pending_tx.tx_hash();
        tracing::info!(tx_hash = %tx_hash, loan_id = %loan_id, "Mint transaction sent");

        let receipt = pending_tx.get_receipt().await.map_err(rpc_error)?;
        if !receipt.status() {
            return Err(ChainError::Reverted(format!(
                "mintAchievement {} reverted",
                tx_hash
            )));
        }

        Ok(tx_hash)
    }

    async fn loan_for_token(&self, token_id: U256) -> Result<B256, ChainError> {
        let provider = ProviderBuilder::new().connect_http(self.rpc_url.clone());
        let contract = IAchievementNFT::new(self.address, &provider);

        contract.tokenIdToLoan(token_id).call().await.map_err(rpc_error)
    }

    async fn owner_of(&self, token_id: U256) -> Result<Address, ChainError> {
        let provider = ProviderBuilder::new().connect_http(self.rpc_url.clone());
        let contract = IAchievementNFT::new(self.address, &provider);

        contract.ownerOf(token_id).call().await.map_err(rpc_error)
    }
}

/// Result of a mint request
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MintOutcome {
    pub token_id: String,
    /// Empty when the achievement already existed
    pub transaction_hash: String,
    pub already_minted: bool,
    pub message: String,
}

/// Idempotent minting on top of an [`AchievementContract`]
#[derive(Clone)]
pub struct AchievementMinter {
    contract: Option<Arc<dyn AchievementContract>>,
    timeout: Duration,
}

impl AchievementMinter {
    pub fn new(contract: Option<Arc<dyn AchievementContract>>, timeout: Duration) -> Self {
        Self { contract, timeout }
    }

    pub fn is_configured(&self) -> bool {
        self.contract.is_some()
    }

    /// Mints the achievement for `loan_id` unless one exists already, in which
    /// case the existing token is returned with `already_minted = true`.
    pub async fn mint(
        &self,
        recipient: &str,
        loan_id: &str,
        amount: U256,
    ) -> Result<MintOutcome, ChainError> {
        let contract = self.contract.as_ref().ok_or_else(|| {
            ChainError::NotConfigured(
                "NFT contract not configured. Please set NFT_CONTRACT_ADDRESS".to_string(),
            )
        })?;

        let recipient = parse_address(recipient)?;
        let loan_id = parse_bytes32(loan_id)?;

        bounded(self.timeout, async {
            if contract.has_achievement(loan_id).await? {
                let token_id = contract.token_id_for_loan(loan_id).await?;
                tracing::info!(loan_id = %loan_id, token_id = %token_id, "Achievement already minted");
                return Ok(MintOutcome {
                    token_id: token_id.to_string(),
                    transaction_hash: String::new(),
                    already_minted: true,
                    message: "NFT already minted for this loan".to_string(),
                });
            }

            let tx_hash = contract.mint_achievement(recipient, loan_id, amount).await?;
            let token_id = contract.token_id_for_loan(loan_id).await?;

            tracing::info!(
                loan_id = %loan_id,
                token_id = %token_id,
                recipient = %recipient,
                tx_hash = %tx_hash,
                "Achievement NFT minted"
            );

            Ok(MintOutcome {
                token_id: token_id.to_string(),
                transaction_hash: tx_hash.to_string(),
                already_minted: false,
                message: "Achievement NFT minted successfully!".to_string(),
            })
        })
        .await
    }
}
