//! Loan entity, its status machine and the request/response shapes around it

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::chain::MintOutcome;
use crate::identity::User;

/// Loan lifecycle status, stored as the Postgres enum `loan_status`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "loan_status")]
pub enum LoanStatus {
    #[serde(rename = "pending")]
    #[sqlx(rename = "pending")]
    Pending,
    #[serde(rename = "accepted")]
    #[sqlx(rename = "accepted")]
    Accepted,
    #[serde(rename = "rejected")]
    #[sqlx(rename = "rejected")]
    Rejected,
    #[serde(rename = "waiting on payment")]
    #[sqlx(rename = "waiting on payment")]
    WaitingOnPayment,
    #[serde(rename = "paid back")]
    #[sqlx(rename = "paid back")]
    PaidBack,
}

impl LoanStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoanStatus::Pending => "pending",
            LoanStatus::Accepted => "accepted",
            LoanStatus::Rejected => "rejected",
            LoanStatus::WaitingOnPayment => "waiting on payment",
            LoanStatus::PaidBack => "paid back",
        }
    }

    /// The only edges of the lifecycle graph
    pub fn can_transition_to(&self, next: LoanStatus) -> bool {
        matches!(
            (self, next),
            (LoanStatus::Pending, LoanStatus::Accepted)
                | (LoanStatus::Pending, LoanStatus::Rejected)
                | (LoanStatus::Accepted, LoanStatus::WaitingOnPayment)
                | (LoanStatus::WaitingOnPayment, LoanStatus::PaidBack)
        )
    }

    pub fn counts_toward_given_total(&self) -> bool {
        matches!(self, LoanStatus::Accepted)
    }

    pub fn counts_toward_taken_total(&self) -> bool {
        matches!(self, LoanStatus::Accepted | LoanStatus::WaitingOnPayment)
    }
}

impl std::fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Loan row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Loan {
    pub id: Uuid,
    pub owner_user_id: Uuid,
    pub partner_user_id: Uuid,
    pub owner_wallet_address: Option<String>,
    pub partner_wallet_address: Option<String>,
    /// Whole PKR
    pub amount: i64,
    pub description: Option<String>,
    pub loan_date: Option<NaiveDate>,
    pub expected_return_date: Option<NaiveDate>,
    pub tx_hash: Option<String>,
    pub onchain_loan_id: Option<String>,
    pub payment_tx_hash: Option<String>,
    pub status: LoanStatus,
    pub paid_back_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewLoan {
    pub owner_user_id: Uuid,
    pub partner_user_id: Uuid,
    pub owner_wallet_address: Option<String>,
    pub partner_wallet_address: Option<String>,
    pub amount: i64,
    pub description: Option<String>,
    pub loan_date: Option<NaiveDate>,
    pub expected_return_date: Option<NaiveDate>,
}

/// Columns written alongside a status change. `None` leaves a column untouched;
/// `onchain_loan_id` is only ever filled, never replaced.
#[derive(Debug, Clone, Default)]
pub struct StatusPatch {
    pub tx_hash: Option<String>,
    pub onchain_loan_id: Option<String>,
    pub owner_wallet_address: Option<String>,
    pub partner_wallet_address: Option<String>,
    pub paid_back_date: Option<DateTime<Utc>>,
    pub payment_tx_hash: Option<String>,
}

/// Display info for the other side of a loan
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Party {
    pub name: String,
    pub username: String,
    pub store_name: String,
    pub wallet_address: String,
}

impl From<&User> for Party {
    fn from(user: &User) -> Self {
        Self {
            name: user.name.clone(),
            username: user.username.clone(),
            store_name: user.store_name.clone(),
            wallet_address: user.wallet_address.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LoanType {
    Given,
    Taken,
}

/// A loan joined with the counterpart's display info
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanView {
    pub id: Uuid,
    pub amount: i64,
    pub description: Option<String>,
    pub loan_date: Option<NaiveDate>,
    pub expected_return_date: Option<NaiveDate>,
    pub tx_hash: Option<String>,
    pub onchain_loan_id: Option<String>,
    pub status: LoanStatus,
    pub paid_back_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partner: Option<Party>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<Party>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loan_type: Option<LoanType>,
}

impl LoanView {
    pub fn new(loan: &Loan) -> Self {
        Self {
            id: loan.id,
            amount: loan.amount,
            description: loan.description.clone(),
            loan_date: loan.loan_date,
            expected_return_date: loan.expected_return_date,
            tx_hash: loan.tx_hash.clone(),
            onchain_loan_id: loan.onchain_loan_id.clone(),
            status: loan.status,
            paid_back_date: loan.paid_back_date,
            created_at: loan.created_at,
            partner: None,
            owner: None,
            loan_type: None,
        }
    }

    pub fn with_partner(mut self, partner: Option<Party>) -> Self {
        self.partner = partner;
        self
    }

    pub fn with_owner(mut self, owner: Option<Party>) -> Self {
        self.owner = owner;
        self
    }

    pub fn with_type(mut self, loan_type: LoanType) -> Self {
        self.loan_type = Some(loan_type);
        self
    }
}

/// Partner's answer to a pending loan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionAction {
    Accept,
    Reject,
}

impl DecisionAction {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "accept" => Some(DecisionAction::Accept),
            "reject" => Some(DecisionAction::Reject),
            _ => None,
        }
    }

    pub fn target_status(&self) -> LoanStatus {
        match self {
            DecisionAction::Accept => LoanStatus::Accepted,
            DecisionAction::Reject => LoanStatus::Rejected,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Decision {
    pub success: bool,
    pub loan: Loan,
    pub owner: Party,
    pub needs_on_chain_recording: bool,
}

/// What the owner's wallet needs to call `recordLoan`
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RecordingParams {
    pub id: Uuid,
    pub owner_wallet: String,
    pub partner_wallet: String,
    pub amount: i64,
    /// Amount in wei as a decimal string
    pub amount_wei: String,
    pub description: String,
    pub loan_date: i64,
    pub expected_return_date: i64,
    pub contract_address: Option<String>,
    /// ABI-encoded `recordLoan` call
    pub calldata: String,
}

/// What the partner's wallet needs to call `payLoan`
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PaymentDetails {
    pub id: Uuid,
    pub onchain_loan_id: String,
    pub amount: i64,
    pub amount_wei: String,
    pub owner_wallet: Option<String>,
    pub partner_wallet: Option<String>,
    pub description: String,
    pub contract_address: Option<String>,
    /// ABI-encoded `payLoan` call, sent with `amount_wei` as value
    pub calldata: String,
}

#[derive(Debug, Serialize)]
pub struct PaymentConfirmation {
    pub success: bool,
    pub loan: Loan,
    pub nft: Option<MintOutcome>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanLedgerSummary {
    pub loans_given: Vec<LoanView>,
    pub loans_taken: Vec<LoanView>,
    pub total_loan_given: i64,
    pub total_loan_taken: i64,
}

// Requests

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateLoanRequest {
    pub owner_wallet: Option<String>,
    pub partner_id: Option<String>,
    pub amount: Option<f64>,
    pub description: Option<String>,
    pub loan_date: Option<String>,
    pub expected_return_date: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecideRequest {
    pub loan_id: Option<String>,
    pub partner_wallet: Option<String>,
    pub action: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordRequest {
    pub loan_id: Option<String>,
    pub owner_wallet: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTxRequest {
    pub loan_id: Option<String>,
    pub tx_hash: Option<String>,
    pub onchain_loan_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayQuery {
    pub loan_id: Option<String>,
    pub partner_wallet: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayRequest {
    pub loan_id: Option<String>,
    pub partner_wallet: Option<String>,
    pub tx_hash: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanListQuery {
    pub owner_wallet: Option<String>,
    pub partner_wallet: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartnerWalletQuery {
    pub partner_wallet: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoanResponse<T> {
    pub loan: T,
}

#[derive(Debug, Serialize)]
pub struct LoansResponse {
    pub loans: Vec<LoanView>,
}

#[derive(Debug, Serialize)]
pub struct UpdateTxResponse {
    pub success: bool,
    pub loan: Loan,
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [LoanStatus; 5] = [
        LoanStatus::Pending,
        LoanStatus::Accepted,
        LoanStatus::Rejected,
        LoanStatus::WaitingOnPayment,
        LoanStatus::PaidBack,
    ];

    #[test]
    fn test_transitions_are_forward_only() {
        let allowed: Vec<(LoanStatus, LoanStatus)> = ALL
            .iter()
            .flat_map(|from| ALL.iter().map(move |to| (*from, *to)))
            .filter(|(from, to)| from.can_transition_to(*to))
            .collect();

        assert_eq!(allowed.len(), 4);
        assert!(!LoanStatus::Rejected.can_transition_to(LoanStatus::Accepted));
        assert!(!LoanStatus::PaidBack.can_transition_to(LoanStatus::WaitingOnPayment));
        assert!(!LoanStatus::Accepted.can_transition_to(LoanStatus::Accepted));
    }

    #[test]
    fn test_status_wire_names() {
        assert_eq!(
            serde_json::to_string(&LoanStatus::WaitingOnPayment).unwrap(),
            "\"waiting on payment\""
        );
        let parsed: LoanStatus = serde_json::from_str("\"paid back\"").unwrap();
        assert_eq!(parsed, LoanStatus::PaidBack);
        assert_eq!(LoanStatus::PaidBack.to_string(), "paid back");
    }

    #[test]
    fn test_totals_membership() {
        assert!(LoanStatus::Accepted.counts_toward_given_total());
        assert!(!LoanStatus::WaitingOnPayment.counts_toward_given_total());
        assert!(LoanStatus::WaitingOnPayment.counts_toward_taken_total());
        assert!(!LoanStatus::PaidBack.counts_toward_taken_total());
    }

    #[test]
    fn test_decision_action_parse() {
        assert_eq!(DecisionAction::parse("Accept"), Some(DecisionAction::Accept));
        assert_eq!(DecisionAction::parse(" reject "), Some(DecisionAction::Reject));
        assert_eq!(DecisionAction::parse("maybe"), None);
        assert_eq!(DecisionAction::Reject.target_status(), LoanStatus::Rejected);
    }
}
