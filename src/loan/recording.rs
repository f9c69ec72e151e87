//! Bridge between accepted loans and the LoanLedger contract
//!
//! The owner's wallet signs `recordLoan` client-side. This side hands out the
//! call parameters and afterwards persists the transaction hash and the
//! ledger's bytes32 loan id.

use std::sync::Arc;

use chrono::{NaiveDate, TimeZone, Utc};

use crate::chain::ledger::record_loan_calldata;
use crate::chain::{is_bytes32_hex, parse_address, ExchangeRate};
use crate::error::ApiError;
use crate::identity::service::required;
use crate::identity::IdentityService;
use crate::loan::model::{Loan, LoanStatus, RecordRequest, RecordingParams, StatusPatch, UpdateTxRequest};
use crate::loan::service::parse_loan_id;
use crate::store::LedgerStore;

pub(crate) fn unix_seconds(date: NaiveDate) -> i64 {
    Utc.from_utc_datetime(&date.and_time(chrono::NaiveTime::MIN))
        .timestamp()
}

/// Lowercased 0x-prefixed bytes32, or a 400 naming the field
pub(crate) fn bytes32_field(value: &str, field: &str) -> Result<String, ApiError> {
    let value = value.trim().to_lowercase();
    if !is_bytes32_hex(&value) {
        return Err(ApiError::BadRequest(format!(
            "{} must be a 0x-prefixed 32-byte hex string",
            field
        )));
    }
    Ok(value)
}

#[derive(Clone)]
pub struct RecordingService {
    store: Arc<dyn LedgerStore>,
    identity: IdentityService,
    rate: ExchangeRate,
    ledger_contract: Option<String>,
}

impl RecordingService {
    pub fn new(
        store: Arc<dyn LedgerStore>,
        identity: IdentityService,
        rate: ExchangeRate,
        ledger_contract: Option<String>,
    ) -> Self {
        Self {
            store,
            identity,
            rate,
            ledger_contract,
        }
    }

    /// Parameters for `recordLoan`. Any ownership or status mismatch is a 404.
    pub async fn prepare_recording(
        &self,
        request: RecordRequest,
    ) -> Result<RecordingParams, ApiError> {
        let loan_id = parse_loan_id(request.loan_id.as_deref())?;
        let owner_wallet = required(request.owner_wallet.as_deref(), "ownerWallet")?;

        let owner = self
            .identity
            .resolve_user_by_wallet(&owner_wallet, "Owner user not found")
            .await?;

        let loan = self
            .store
            .find_loan(loan_id)
            .await?
            .filter(|l| l.owner_user_id == owner.id && l.status == LoanStatus::Accepted)
            .ok_or_else(|| ApiError::NotFound("Loan not found or not accepted".to_string()))?;

        let partner = self
            .store
            .find_users(&[loan.partner_user_id])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| ApiError::NotFound("Partner user not found".to_string()))?;

        let amount_wei = self.rate.to_native(loan.amount)?;
        let description = loan.description.clone().unwrap_or_default();
        let loan_date = loan
            .loan_date
            .map(unix_seconds)
            .unwrap_or_else(|| Utc::now().timestamp());
        let expected_return_date = loan.expected_return_date.map(unix_seconds).unwrap_or(0);

        let calldata = record_loan_calldata(
            parse_address(&partner.wallet_address)?,
            amount_wei,
            &description,
            loan_date.max(0) as u64,
            expected_return_date.max(0) as u64,
        );

        tracing::info!(loan_id = %loan.id, amount_wei = %amount_wei, "Prepared on-chain recording");

        Ok(RecordingParams {
            id: loan.id,
            owner_wallet: owner.wallet_address,
            partner_wallet: partner.wallet_address,
            amount: loan.amount,
            amount_wei: amount_wei.to_string(),
            description,
            loan_date,
            expected_return_date,
            contract_address: self.ledger_contract.clone(),
            calldata,
        })
    }

    /// Persists the recording transaction; only an `accepted` loan moves on
    pub async fn confirm_recording(&self, request: UpdateTxRequest) -> Result<Loan, ApiError> {
        let loan_id = parse_loan_id(request.loan_id.as_deref())?;
        let tx_hash = required(request.tx_hash.as_deref(), "txHash")?;
        let tx_hash = bytes32_field(&tx_hash, "txHash")?;
        let onchain_loan_id = request
            .onchain_loan_id
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|id| bytes32_field(id, "onchainLoanId"))
            .transpose()?;

        let loan = self
            .store
            .transition_loan(
                loan_id,
                LoanStatus::Accepted,
                LoanStatus::WaitingOnPayment,
                StatusPatch {
                    tx_hash: Some(tx_hash),
                    onchain_loan_id,
                    ..Default::default()
                },
            )
            .await?
            .ok_or_else(|| {
                ApiError::NotFound("Loan not found or not in accepted status".to_string())
            })?;

        tracing::info!(
            loan_id = %loan.id,
            tx_hash = ?loan.tx_hash,
            onchain_loan_id = ?loan.onchain_loan_id,
            "Loan recorded on-chain"
        );

        Ok(loan)
    }
}
