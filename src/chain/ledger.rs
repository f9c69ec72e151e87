//! The LoanLedger contract: recorded loans and their repayment

use alloy::primitives::{Address, B256, U256};
use alloy::providers::ProviderBuilder;
use alloy::sol_types::SolCall;
use alloy::transports::http::reqwest::Url;
use async_trait::async_trait;

use super::contracts::ILoanLedger;
use super::{parse_address, rpc_error, ChainError};

/// A loan as the ledger contract stores it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerLoanRecord {
    pub owner: Address,
    pub partner: Address,
    /// Wei
    pub amount: U256,
    pub timestamp: U256,
    pub description: String,
    pub loan_date: U256,
    pub expected_return_date: U256,
}

#[async_trait]
pub trait LoanLedgerContract: Send + Sync {
    async fn get_loan(&self, loan_id: B256) -> Result<LedgerLoanRecord, ChainError>;
}

pub struct OnchainLoanLedger {
    rpc_url: Url,
    address: Address,
}

impl OnchainLoanLedger {
    pub fn new(rpc_url: &str, address: &str) -> Result<Self, ChainError> {
        let rpc_url = rpc_url
            .parse::<Url>()
            .map_err(|e| ChainError::InvalidInput(format!("Invalid RPC URL: {}", e)))?;
        Ok(Self {
            rpc_url,
            address: parse_address(address)?,
        })
    }
}

#[async_trait]
impl LoanLedgerContract for OnchainLoanLedger {
    async fn get_loan(&self, loan_id: B256) -> Result<LedgerLoanRecord, ChainError> {
        let provider = ProviderBuilder::new().connect_http(self.rpc_url.clone());
        let contract = ILoanLedger::new(self.address, &provider);

        let record = contract.getLoan(loan_id).call().await.map_err(rpc_error)?;

        Ok(LedgerLoanRecord {
            owner: record.owner,
            partner: record.partner,
            amount: record.amount,
            timestamp: record.timestamp,
            description: record.description,
            loan_date: record.loanDate,
            expected_return_date: record.expectedReturnDate,
        })
    }
}

/// ABI-encoded `recordLoan` call for the owner's wallet to submit
pub fn record_loan_calldata(
    partner: Address,
    amount: U256,
    description: &str,
    loan_date: u64,
    expected_return_date: u64,
) -> String {
    let call = ILoanLedger::recordLoanCall {
        partner,
        amount,
        description: description.to_string(),
        loanDate: U256::from(loan_date),
        expectedReturnDate: U256::from(expected_return_date),
    };
    format!("0x{}", hex::encode(call.abi_encode()))
}

/// ABI-encoded `payLoan` call; the transaction must carry the loan amount as value
pub fn pay_loan_calldata(loan_id: B256) -> String {
    let call = ILoanLedger::payLoanCall { loanId: loan_id };
    format!("0x{}", hex::encode(call.abi_encode()))
}
