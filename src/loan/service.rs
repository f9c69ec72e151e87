//! Loan lifecycle: creation, the partner's decision, and the ledger views

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate};
use uuid::Uuid;

use crate::chain::ExchangeRate;
use crate::error::ApiError;
use crate::identity::service::required;
use crate::identity::{IdentityService, User};
use crate::loan::model::{
    CreateLoanRequest, DecideRequest, Decision, DecisionAction, LoanLedgerSummary, LoanListQuery,
    LoanStatus, LoanType, LoanView, NewLoan, Party, StatusPatch,
};
use crate::store::LedgerStore;

/// Loan ids that are not UUIDs cannot exist, so they are reported as missing
pub(crate) fn parse_loan_id(raw: Option<&str>) -> Result<Uuid, ApiError> {
    let raw = required(raw, "loanId")?;
    Uuid::parse_str(&raw).map_err(|_| ApiError::NotFound("Loan not found".to_string()))
}

/// Positive, finite, whole PKR
pub(crate) fn parse_amount(amount: Option<f64>) -> Result<i64, ApiError> {
    let amount = amount.ok_or_else(|| ApiError::BadRequest("amount is required".to_string()))?;
    if !amount.is_finite() || amount <= 0.0 || amount.fract() != 0.0 || amount >= i64::MAX as f64
    {
        return Err(ApiError::BadRequest(
            "amount must be a positive whole number".to_string(),
        ));
    }
    Ok(amount as i64)
}

/// Accepts YYYY-MM-DD or an RFC 3339 timestamp; blank means absent
pub(crate) fn parse_date(raw: Option<&str>, field: &str) -> Result<Option<NaiveDate>, ApiError> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| DateTime::parse_from_rfc3339(raw).map(|dt| dt.date_naive()))
        .map(Some)
        .map_err(|_| ApiError::BadRequest(format!("{} must be a date (YYYY-MM-DD)", field)))
}

#[derive(Clone)]
pub struct LoanService {
    store: Arc<dyn LedgerStore>,
    identity: IdentityService,
    rate: ExchangeRate,
}

impl LoanService {
    pub fn new(store: Arc<dyn LedgerStore>, identity: IdentityService, rate: ExchangeRate) -> Self {
        Self {
            store,
            identity,
            rate,
        }
    }

    async fn users_by_id(&self, ids: Vec<Uuid>) -> Result<HashMap<Uuid, User>, ApiError> {
        let mut ids = ids;
        ids.sort();
        ids.dedup();
        Ok(self
            .store
            .find_users(&ids)
            .await?
            .into_iter()
            .map(|u| (u.id, u))
            .collect())
    }

    pub async fn create_loan(&self, request: CreateLoanRequest) -> Result<LoanView, ApiError> {
        let owner_wallet = required(request.owner_wallet.as_deref(), "ownerWallet")?;
        let partner_id = required(request.partner_id.as_deref(), "partnerId")?;
        let amount = parse_amount(request.amount)?;
        // a loan that cannot be expressed in wei could never be recorded
        self.rate.to_native(amount).map_err(|_| {
            ApiError::BadRequest("amount is too large to record on-chain".to_string())
        })?;
        let loan_date = parse_date(request.loan_date.as_deref(), "loanDate")?;
        let expected_return_date =
            parse_date(request.expected_return_date.as_deref(), "expectedReturnDate")?;

        let owner = self
            .identity
            .resolve_user_by_wallet(&owner_wallet, "Owner user not found")
            .await?;

        let partner_not_found = || ApiError::NotFound("Partner not found for this owner".to_string());
        let link_id = Uuid::parse_str(&partner_id).map_err(|_| partner_not_found())?;
        let link = self
            .store
            .find_partner_link(link_id, owner.id)
            .await?
            .ok_or_else(partner_not_found)?;

        let partner = self
            .users_by_id(vec![link.partner_user_id])
            .await?
            .remove(&link.partner_user_id)
            .ok_or_else(partner_not_found)?;

        let description = request
            .description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());

        let loan = self
            .store
            .insert_loan(NewLoan {
                owner_user_id: owner.id,
                partner_user_id: partner.id,
                owner_wallet_address: Some(owner.wallet_address.clone()),
                partner_wallet_address: Some(partner.wallet_address.clone()),
                amount,
                description,
                loan_date,
                expected_return_date,
            })
            .await?;

        tracing::info!(
            loan_id = %loan.id,
            owner_id = %owner.id,
            partner_id = %partner.id,
            amount = loan.amount,
            "Loan created"
        );

        Ok(LoanView::new(&loan)
            .with_partner(Some(Party::from(&partner)))
            .with_type(LoanType::Given))
    }

    /// Partner accepts or rejects a pending loan
    pub async fn decide(&self, request: DecideRequest) -> Result<Decision, ApiError> {
        let loan_id = parse_loan_id(request.loan_id.as_deref())?;
        let partner_wallet = required(request.partner_wallet.as_deref(), "partnerWallet")?;
        let action = required(request.action.as_deref(), "action")?;
        let action = DecisionAction::parse(&action).ok_or_else(|| {
            ApiError::BadRequest("action must be 'accept' or 'reject'".to_string())
        })?;

        let partner = self
            .identity
            .resolve_user_by_wallet(&partner_wallet, "Partner user not found")
            .await?;

        let loan = self
            .store
            .find_loan(loan_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Loan not found".to_string()))?;

        if loan.partner_user_id != partner.id {
            return Err(ApiError::Forbidden(
                "Only the loan's partner can accept or reject it".to_string(),
            ));
        }
        if loan.status != LoanStatus::Pending {
            return Err(ApiError::BadRequest(format!("Loan already {}", loan.status)));
        }

        let mut users = self.users_by_id(vec![loan.owner_user_id]).await?;
        let owner = users
            .remove(&loan.owner_user_id)
            .ok_or_else(|| ApiError::NotFound("Owner user not found".to_string()))?;

        let patch = match action {
            DecisionAction::Accept => StatusPatch {
                owner_wallet_address: Some(owner.wallet_address.clone()),
                partner_wallet_address: Some(partner.wallet_address.clone()),
                ..Default::default()
            },
            DecisionAction::Reject => StatusPatch::default(),
        };

        let target = action.target_status();
        let updated = self
            .store
            .transition_loan(loan.id, LoanStatus::Pending, target, patch)
            .await?
            .ok_or_else(|| ApiError::BadRequest("Loan is no longer pending".to_string()))?;

        tracing::info!(loan_id = %updated.id, status = %updated.status, "Loan decided");

        Ok(Decision {
            success: true,
            loan: updated,
            owner: Party::from(&owner),
            needs_on_chain_recording: action == DecisionAction::Accept,
        })
    }

    /// Loans given by `ownerWallet` and taken by `partnerWallet`
    pub async fn list_loans(&self, query: LoanListQuery) -> Result<LoanLedgerSummary, ApiError> {
        let owner_wallet = query
            .owner_wallet
            .as_deref()
            .map(str::trim)
            .filter(|w| !w.is_empty());
        let partner_wallet = query
            .partner_wallet
            .as_deref()
            .map(str::trim)
            .filter(|w| !w.is_empty());

        if owner_wallet.is_none() && partner_wallet.is_none() {
            return Err(ApiError::BadRequest(
                "ownerWallet or partnerWallet is required".to_string(),
            ));
        }

        let mut loans_given = Vec::new();
        if let Some(wallet) = owner_wallet {
            if let Some(owner) = self.identity.find_by_wallet(wallet).await? {
                let loans = self.store.list_loans_by_owner(owner.id).await?;
                let partners = self
                    .users_by_id(loans.iter().map(|l| l.partner_user_id).collect())
                    .await?;
                loans_given = loans
                    .iter()
                    .map(|loan| {
                        LoanView::new(loan)
                            .with_partner(partners.get(&loan.partner_user_id).map(Party::from))
                            .with_type(LoanType::Given)
                    })
                    .collect();
            }
        }

        let mut loans_taken = Vec::new();
        if let Some(wallet) = partner_wallet {
            if let Some(partner) = self.identity.find_by_wallet(wallet).await? {
                loans_taken = self
                    .partner_views(partner.id, None)
                    .await?
                    .into_iter()
                    .map(|view| view.with_type(LoanType::Taken))
                    .collect();
            }
        }

        let total_loan_given = loans_given
            .iter()
            .filter(|l| l.status.counts_toward_given_total())
            .map(|l| l.amount)
            .sum();
        let total_loan_taken = loans_taken
            .iter()
            .filter(|l| l.status.counts_toward_taken_total())
            .map(|l| l.amount)
            .sum();

        Ok(LoanLedgerSummary {
            loans_given,
            loans_taken,
            total_loan_given,
            total_loan_taken,
        })
    }

    pub async fn list_pending(&self, partner_wallet: Option<&str>) -> Result<Vec<LoanView>, ApiError> {
        self.partner_scoped(partner_wallet, LoanStatus::Pending).await
    }

    pub async fn list_awaiting_payment(
        &self,
        partner_wallet: Option<&str>,
    ) -> Result<Vec<LoanView>, ApiError> {
        self.partner_scoped(partner_wallet, LoanStatus::WaitingOnPayment)
            .await
    }

    async fn partner_scoped(
        &self,
        partner_wallet: Option<&str>,
        status: LoanStatus,
    ) -> Result<Vec<LoanView>, ApiError> {
        let partner_wallet = required(partner_wallet, "partnerWallet")?;
        let partner = self
            .identity
            .resolve_user_by_wallet(&partner_wallet, "Partner user not found")
            .await?;

        self.partner_views(partner.id, Some(status)).await
    }

    async fn partner_views(
        &self,
        partner_id: Uuid,
        status: Option<LoanStatus>,
    ) -> Result<Vec<LoanView>, ApiError> {
        let loans = self.store.list_loans_by_partner(partner_id, status).await?;
        let owners = self
            .users_by_id(loans.iter().map(|l| l.owner_user_id).collect())
            .await?;

        Ok(loans
            .iter()
            .map(|loan| LoanView::new(loan).with_owner(owners.get(&loan.owner_user_id).map(Party::from)))
            .collect())
    }
}
