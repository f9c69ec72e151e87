//! Persistence seam for users, partner links and loans
//!
//! Services depend on [`LedgerStore`] only. [`PgLedgerStore`] is the production
//! backend; [`MemoryLedgerStore`] backs tests and `STORE=memory` runs.

mod memory;
mod postgres;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::identity::{NewUser, User};
use crate::loan::model::{Loan, LoanStatus, NewLoan, StatusPatch};
use crate::partner::PartnerLink;

pub use memory::MemoryLedgerStore;
pub use postgres::PgLedgerStore;

#[derive(Debug, Error)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write
    #[error("{0}")]
    Conflict(String),

    #[error("Storage failure: {0}")]
    Database(String),

    /// The requested status change is not an edge of the loan lifecycle
    #[error("Illegal loan status change: {from} -> {to}")]
    IllegalTransition { from: LoanStatus, to: LoanStatus },
}

/// Refuses any status change the lifecycle graph does not allow
pub(crate) fn check_transition(from: LoanStatus, to: LoanStatus) -> Result<(), StoreError> {
    if from.can_transition_to(to) {
        Ok(())
    } else {
        Err(StoreError::IllegalTransition { from, to })
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                let what = match db_err.constraint() {
                    Some(c) if c.contains("onchain") => "On-chain loan id already used by another loan",
                    Some(c) if c.contains("wallet") => "Wallet address already registered",
                    Some(c) if c.contains("username") => "Username already taken",
                    Some(c) if c.contains("partners") => "Partner already added",
                    _ => "Record already exists",
                };
                return StoreError::Conflict(what.to_string());
            }
        }
        StoreError::Database(err.to_string())
    }
}

#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Fails with `Conflict` when the wallet or username (case-insensitive) is taken
    async fn insert_user(&self, user: NewUser) -> Result<User, StoreError>;

    /// Case-insensitive match on the stored wallet address
    async fn find_user_by_wallet(&self, wallet: &str) -> Result<Option<User>, StoreError>;

    /// Case-insensitive exact match
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;

    async fn find_users(&self, ids: &[Uuid]) -> Result<Vec<User>, StoreError>;

    /// Fails with `Conflict` when the pair already exists
    async fn insert_partner_link(
        &self,
        owner_user_id: Uuid,
        partner_user_id: Uuid,
    ) -> Result<PartnerLink, StoreError>;

    /// Link by id, only if it belongs to `owner_user_id`
    async fn find_partner_link(
        &self,
        link_id: Uuid,
        owner_user_id: Uuid,
    ) -> Result<Option<PartnerLink>, StoreError>;

    async fn list_partner_links(&self, owner_user_id: Uuid)
        -> Result<Vec<PartnerLink>, StoreError>;

    async fn insert_loan(&self, loan: NewLoan) -> Result<Loan, StoreError>;

    async fn find_loan(&self, id: Uuid) -> Result<Option<Loan>, StoreError>;

    /// Newest first
    async fn list_loans_by_owner(&self, owner_user_id: Uuid) -> Result<Vec<Loan>, StoreError>;

    /// Newest first, optionally restricted to one status
    async fn list_loans_by_partner(
        &self,
        partner_user_id: Uuid,
        status: Option<LoanStatus>,
    ) -> Result<Vec<Loan>, StoreError>;

    /// Compare-and-swap on status. Applies `patch` and moves the loan to `to`
    /// only while its current status is `from`; `None` when the guard fails.
    async fn transition_loan(
        &self,
        id: Uuid,
        from: LoanStatus,
        to: LoanStatus,
        patch: StatusPatch,
    ) -> Result<Option<Loan>, StoreError>;

    async fn ping(&self) -> Result<(), StoreError>;
}
