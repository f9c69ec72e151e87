//! Repayment confirmation and the achievement side effect

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;

use crate::chain::ledger::pay_loan_calldata;
use crate::chain::{parse_bytes32, AchievementMinter, ExchangeRate, MintOutcome};
use crate::error::ApiError;
use crate::identity::service::required;
use crate::identity::{IdentityService, User};
use crate::loan::model::{
    Loan, LoanStatus, PayQuery, PayRequest, PaymentConfirmation, PaymentDetails, StatusPatch,
};
use crate::loan::recording::bytes32_field;
use crate::loan::service::parse_loan_id;
use crate::store::LedgerStore;

#[derive(Clone)]
pub struct PaymentService {
    store: Arc<dyn LedgerStore>,
    identity: IdentityService,
    rate: ExchangeRate,
    ledger_contract: Option<String>,
    minter: AchievementMinter,
}

impl PaymentService {
    pub fn new(
        store: Arc<dyn LedgerStore>,
        identity: IdentityService,
        rate: ExchangeRate,
        ledger_contract: Option<String>,
        minter: AchievementMinter,
    ) -> Self {
        Self {
            store,
            identity,
            rate,
            ledger_contract,
            minter,
        }
    }

    async fn awaiting_payment(&self, loan_id: uuid::Uuid, partner: &User) -> Result<Loan, ApiError> {
        self.store
            .find_loan(loan_id)
            .await?
            .filter(|l| l.partner_user_id == partner.id && l.status == LoanStatus::WaitingOnPayment)
            .ok_or_else(|| {
                ApiError::NotFound("Loan not found or not in waiting on payment status".to_string())
            })
    }

    /// What the partner's wallet needs to call `payLoan`
    pub async fn payment_details(&self, query: PayQuery) -> Result<PaymentDetails, ApiError> {
        let loan_id = parse_loan_id(query.loan_id.as_deref())?;
        let partner_wallet = required(query.partner_wallet.as_deref(), "partnerWallet")?;

        let partner = self
            .identity
            .resolve_user_by_wallet(&partner_wallet, "Partner user not found")
            .await?;
        let loan = self.awaiting_payment(loan_id, &partner).await?;

        let onchain_loan_id = loan.onchain_loan_id.clone().ok_or_else(|| {
            ApiError::BadRequest("Loan has not been recorded on-chain yet".to_string())
        })?;

        let users: HashMap<_, _> = self
            .store
            .find_users(&[loan.owner_user_id, loan.partner_user_id])
            .await?
            .into_iter()
            .map(|u| (u.id, u.wallet_address))
            .collect();

        let owner_wallet = loan
            .owner_wallet_address
            .clone()
            .or_else(|| users.get(&loan.owner_user_id).cloned());
        let partner_wallet = loan
            .partner_wallet_address
            .clone()
            .or_else(|| users.get(&loan.partner_user_id).cloned());

        let amount_wei = self.rate.to_native(loan.amount)?;
        let calldata = pay_loan_calldata(parse_bytes32(&onchain_loan_id)?);

        Ok(PaymentDetails {
            id: loan.id,
            onchain_loan_id,
            amount: loan.amount,
            amount_wei: amount_wei.to_string(),
            owner_wallet,
            partner_wallet,
            description: loan.description.unwrap_or_default(),
            contract_address: self.ledger_contract.clone(),
            calldata,
        })
    }

    /// Marks the loan paid back, then mints the achievement best-effort
    pub async fn confirm_payment(&self, request: PayRequest) -> Result<PaymentConfirmation, ApiError> {
        let loan_id = parse_loan_id(request.loan_id.as_deref())?;
        let partner_wallet = required(request.partner_wallet.as_deref(), "partnerWallet")?;
        let tx_hash = required(request.tx_hash.as_deref(), "txHash")?;
        let tx_hash = bytes32_field(&tx_hash, "txHash")?;

        let partner = self
            .identity
            .resolve_user_by_wallet(&partner_wallet, "Partner user not found")
            .await?;
        let loan = self.awaiting_payment(loan_id, &partner).await?;

        let updated = self
            .store
            .transition_loan(
                loan.id,
                LoanStatus::WaitingOnPayment,
                LoanStatus::PaidBack,
                StatusPatch {
                    paid_back_date: Some(Utc::now()),
                    payment_tx_hash: Some(tx_hash),
                    ..Default::default()
                },
            )
            .await?
            .ok_or_else(|| {
                ApiError::NotFound("Loan not found or not in waiting on payment status".to_string())
            })?;

        tracing::info!(
            loan_id = %updated.id,
            from = %partner.wallet_address,
            to = ?updated.owner_wallet_address,
            amount_pkr = updated.amount,
            payment_tx_hash = ?updated.payment_tx_hash,
            "Loan paid back"
        );

        let nft = self.mint_achievement(&updated, &partner).await;

        Ok(PaymentConfirmation {
            success: true,
            loan: updated,
            nft,
        })
    }

    /// Never fails the payment; problems are logged and yield `None`
    async fn mint_achievement(&self, loan: &Loan, partner: &User) -> Option<MintOutcome> {
        let Some(onchain_loan_id) = loan.onchain_loan_id.as_deref() else {
            tracing::warn!(loan_id = %loan.id, "Skipping achievement mint: loan has no on-chain id");
            return None;
        };

        if !self.minter.is_configured() {
            tracing::warn!(loan_id = %loan.id, "Skipping achievement mint: NFT contract not configured");
            return None;
        }

        let amount = match self.rate.to_native(loan.amount) {
            Ok(amount) => amount,
            Err(e) => {
                tracing::warn!(loan_id = %loan.id, error = %e, "Skipping achievement mint");
                return None;
            }
        };

        match self
            .minter
            .mint(&partner.wallet_address, onchain_loan_id, amount)
            .await
        {
            Ok(outcome) => Some(outcome),
            Err(e) => {
                tracing::warn!(loan_id = %loan.id, error = %e, "Failed to mint achievement NFT");
                None
            }
        }
    }
}
