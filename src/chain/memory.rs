//! In-process stand-ins for the deployed contracts

use std::collections::HashMap;

use alloy::primitives::{keccak256, Address, B256, U256};
use async_trait::async_trait;
use tokio::sync::Mutex;

use super::achievement::AchievementContract;
use super::ledger::{LedgerLoanRecord, LoanLedgerContract};
use super::ChainError;

#[derive(Default)]
struct NftState {
    next_token_id: u64,
    token_by_loan: HashMap<B256, U256>,
    loan_by_token: HashMap<U256, B256>,
    owners: HashMap<U256, Address>,
    mints: usize,
    /// When set, every mint reverts with this reason
    revert_reason: Option<String>,
}

/// Achievement contract whose token ids start at 1, one token per loan
#[derive(Default)]
pub struct MemoryAchievementContract {
    state: Mutex<NftState>,
}

impl MemoryAchievementContract {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful `mint_achievement` calls
    pub async fn mint_count(&self) -> usize {
        self.state.lock().await.mints
    }

    /// Make every later mint revert, as a paused or misconfigured contract would
    pub async fn revert_mints(&self, reason: impl Into<String>) {
        self.state.lock().await.revert_reason = Some(reason.into());
    }
}

#[async_trait]
impl AchievementContract for MemoryAchievementContract {
    async fn has_achievement(&self, loan_id: B256) -> Result<bool, ChainError> {
        Ok(self.state.lock().await.token_by_loan.contains_key(&loan_id))
    }

    async fn token_id_for_loan(&self, loan_id: B256) -> Result<U256, ChainError> {
        Ok(self
            .state
            .lock()
            .await
            .token_by_loan
            .get(&loan_id)
            .copied()
            .unwrap_or(U256::ZERO))
    }

    async fn mint_achievement(
        &self,
        recipient: Address,
        loan_id: B256,
        _amount: U256,
    ) -> Result<B256, ChainError> {
        let mut state = self.state.lock().await;
        if let Some(reason) = &state.revert_reason {
            return Err(ChainError::Reverted(reason.clone()));
        }
        if state.token_by_loan.contains_key(&loan_id) {
            return Err(ChainError::Reverted("Achievement already minted".to_string()));
        }

        state.next_token_id += 1;
        let token_id = U256::from(state.next_token_id);
        state.token_by_loan.insert(loan_id, token_id);
        state.loan_by_token.insert(token_id, loan_id);
        state.owners.insert(token_id, recipient);
        state.mints += 1;

        Ok(keccak256(token_id.to_be_bytes::<32>()))
    }

    async fn loan_for_token(&self, token_id: U256) -> Result<B256, ChainError> {
        Ok(self
            .state
            .lock()
            .await
            .loan_by_token
            .get(&token_id)
            .copied()
            .unwrap_or(B256::ZERO))
    }

    async fn owner_of(&self, token_id: U256) -> Result<Address, ChainError> {
        self.state
            .lock()
            .await
            .owners
            .get(&token_id)
            .copied()
            .ok_or_else(|| ChainError::Reverted(format!("ERC721: invalid token ID {}", token_id)))
    }
}

/// Ledger contract backed by a map of pre-seeded records
#[derive(Default)]
pub struct MemoryLoanLedger {
    loans: Mutex<HashMap<B256, LedgerLoanRecord>>,
}

impl MemoryLoanLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, loan_id: B256, record: LedgerLoanRecord) {
        self.loans.lock().await.insert(loan_id, record);
    }
}

#[async_trait]
impl LoanLedgerContract for MemoryLoanLedger {
    async fn get_loan(&self, loan_id: B256) -> Result<LedgerLoanRecord, ChainError> {
        self.loans
            .lock()
            .await
            .get(&loan_id)
            .cloned()
            .ok_or_else(|| ChainError::Reverted(format!("Loan {} not recorded", loan_id)))
    }
}
