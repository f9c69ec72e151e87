use std::sync::Arc;

use validator::Validate;

use crate::error::ApiError;
use crate::identity::model::{NewUser, SignupRequest, User};
use crate::store::LedgerStore;

/// Trim, lowercase and ensure a "0x" prefix
pub fn normalize_wallet(address: &str) -> String {
    let lowered = address.trim().to_lowercase();
    if lowered.starts_with("0x") {
        lowered
    } else {
        format!("0x{}", lowered)
    }
}

/// A normalized address: "0x" followed by exactly 40 hex characters
pub fn is_valid_wallet(normalized: &str) -> bool {
    normalized
        .strip_prefix("0x")
        .map(|hex| hex.len() == 40 && hex.chars().all(|c| c.is_ascii_hexdigit()))
        .unwrap_or(false)
}

/// Returns the trimmed value or a 400 naming the missing field
pub(crate) fn required(value: Option<&str>, field: &str) -> Result<String, ApiError> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or_else(|| ApiError::BadRequest(format!("{} is required", field)))
}

#[derive(Clone)]
pub struct IdentityService {
    store: Arc<dyn LedgerStore>,
}

impl IdentityService {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    pub async fn find_by_wallet(&self, address: &str) -> Result<Option<User>, ApiError> {
        let wallet = normalize_wallet(address);
        Ok(self.store.find_user_by_wallet(&wallet).await?)
    }

    /// 404 with `not_found` as the message when no user owns the wallet
    pub async fn resolve_user_by_wallet(
        &self,
        address: &str,
        not_found: &str,
    ) -> Result<User, ApiError> {
        self.find_by_wallet(address)
            .await?
            .ok_or_else(|| ApiError::NotFound(not_found.to_string()))
    }

    pub async fn get_user(&self, wallet_address: Option<&str>) -> Result<User, ApiError> {
        let wallet = required(wallet_address, "walletAddress")?;
        self.resolve_user_by_wallet(&wallet, "User not found").await
    }

    pub async fn signup(&self, request: SignupRequest) -> Result<User, ApiError> {
        let name = required(request.name.as_deref(), "name")?;
        let store_name = required(request.store_name.as_deref(), "storeName")?;
        let username = required(request.username.as_deref(), "username")?;
        let email = required(request.email.as_deref(), "email")?;
        let raw_wallet = required(request.wallet_address.as_deref(), "walletAddress")?;

        request.validate()?;

        let wallet_address = normalize_wallet(&raw_wallet);
        if !is_valid_wallet(&wallet_address) {
            return Err(ApiError::BadRequest(
                "walletAddress must be 40 hex characters".to_string(),
            ));
        }

        if self.store.find_user_by_wallet(&wallet_address).await?.is_some() {
            return Err(ApiError::Conflict(
                "Wallet address already registered".to_string(),
            ));
        }
        if self.store.find_user_by_username(&username).await?.is_some() {
            return Err(ApiError::Conflict("Username already taken".to_string()));
        }

        let user = self
            .store
            .insert_user(NewUser {
                name,
                store_name,
                username,
                email,
                wallet_address,
            })
            .await?;

        tracing::info!(user_id = %user.id, username = %user.username, "User registered");

        Ok(user)
    }
}
