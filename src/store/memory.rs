use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{check_transition, LedgerStore, StoreError};
use crate::identity::{NewUser, User};
use crate::loan::model::{Loan, LoanStatus, NewLoan, StatusPatch};
use crate::partner::PartnerLink;

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    partners: HashMap<Uuid, PartnerLink>,
    loans: HashMap<Uuid, Loan>,
}

/// Process-local store with the same uniqueness and CAS rules as the schema
#[derive(Default)]
pub struct MemoryLedgerStore {
    tables: RwLock<Tables>,
}

impl MemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn newest_first(mut loans: Vec<Loan>) -> Vec<Loan> {
    loans.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    loans
}

#[async_trait]
impl LedgerStore for MemoryLedgerStore {
    async fn insert_user(&self, user: NewUser) -> Result<User, StoreError> {
        let mut tables = self.tables.write().await;

        for existing in tables.users.values() {
            if existing.wallet_address.eq_ignore_ascii_case(&user.wallet_address) {
                return Err(StoreError::Conflict(
                    "Wallet address already registered".to_string(),
                ));
            }
            if existing.username.to_lowercase() == user.username.to_lowercase() {
                return Err(StoreError::Conflict("Username already taken".to_string()));
            }
        }

        let user = User {
            id: Uuid::new_v4(),
            name: user.name,
            store_name: user.store_name,
            username: user.username,
            email: user.email,
            wallet_address: user.wallet_address,
            created_at: Utc::now(),
        };
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_user_by_wallet(&self, wallet: &str) -> Result<Option<User>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .find(|u| u.wallet_address.eq_ignore_ascii_case(wallet))
            .cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let tables = self.tables.read().await;
        let wanted = username.to_lowercase();
        Ok(tables
            .users
            .values()
            .find(|u| u.username.to_lowercase() == wanted)
            .cloned())
    }

    async fn find_users(&self, ids: &[Uuid]) -> Result<Vec<User>, StoreError> {
        let tables = self.tables.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| tables.users.get(id).cloned())
            .collect())
    }

    async fn insert_partner_link(
        &self,
        owner_user_id: Uuid,
        partner_user_id: Uuid,
    ) -> Result<PartnerLink, StoreError> {
        let mut tables = self.tables.write().await;

        let exists = tables
            .partners
            .values()
            .any(|l| l.owner_user_id == owner_user_id && l.partner_user_id == partner_user_id);
        if exists {
            return Err(StoreError::Conflict("Partner already added".to_string()));
        }

        let link = PartnerLink {
            id: Uuid::new_v4(),
            owner_user_id,
            partner_user_id,
            created_at: Utc::now(),
        };
        tables.partners.insert(link.id, link.clone());
        Ok(link)
    }

    async fn find_partner_link(
        &self,
        link_id: Uuid,
        owner_user_id: Uuid,
    ) -> Result<Option<PartnerLink>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .partners
            .get(&link_id)
            .filter(|l| l.owner_user_id == owner_user_id)
            .cloned())
    }

    async fn list_partner_links(
        &self,
        owner_user_id: Uuid,
    ) -> Result<Vec<PartnerLink>, StoreError> {
        let tables = self.tables.read().await;
        let mut links: Vec<PartnerLink> = tables
            .partners
            .values()
            .filter(|l| l.owner_user_id == owner_user_id)
            .cloned()
            .collect();
        links.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(links)
    }

    async fn insert_loan(&self, loan: NewLoan) -> Result<Loan, StoreError> {
        let mut tables = self.tables.write().await;

        let loan = Loan {
            id: Uuid::new_v4(),
            owner_user_id: loan.owner_user_id,
            partner_user_id: loan.partner_user_id,
            owner_wallet_address: loan.owner_wallet_address,
            partner_wallet_address: loan.partner_wallet_address,
            amount: loan.amount,
            description: loan.description,
            loan_date: loan.loan_date,
            expected_return_date: loan.expected_return_date,
            tx_hash: None,
            onchain_loan_id: None,
            payment_tx_hash: None,
            status: LoanStatus::Pending,
            paid_back_date: None,
            created_at: Utc::now(),
        };
        tables.loans.insert(loan.id, loan.clone());
        Ok(loan)
    }

    async fn find_loan(&self, id: Uuid) -> Result<Option<Loan>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.loans.get(&id).cloned())
    }

    async fn list_loans_by_owner(&self, owner_user_id: Uuid) -> Result<Vec<Loan>, StoreError> {
        let tables = self.tables.read().await;
        Ok(newest_first(
            tables
                .loans
                .values()
                .filter(|l| l.owner_user_id == owner_user_id)
                .cloned()
                .collect(),
        ))
    }

    async fn list_loans_by_partner(
        &self,
        partner_user_id: Uuid,
        status: Option<LoanStatus>,
    ) -> Result<Vec<Loan>, StoreError> {
        let tables = self.tables.read().await;
        Ok(newest_first(
            tables
                .loans
                .values()
                .filter(|l| l.partner_user_id == partner_user_id)
                .filter(|l| status.map_or(true, |s| l.status == s))
                .cloned()
                .collect(),
        ))
    }

    async fn transition_loan(
        &self,
        id: Uuid,
        from: LoanStatus,
        to: LoanStatus,
        patch: StatusPatch,
    ) -> Result<Option<Loan>, StoreError> {
        check_transition(from, to)?;
        let mut tables = self.tables.write().await;

        if let Some(onchain_id) = patch.onchain_loan_id.as_deref() {
            let taken = tables
                .loans
                .values()
                .any(|other| other.id != id && other.onchain_loan_id.as_deref() == Some(onchain_id));
            let unset = tables
                .loans
                .get(&id)
                .is_some_and(|loan| loan.status == from && loan.onchain_loan_id.is_none());
            if taken && unset {
                return Err(StoreError::Conflict(
                    "On-chain loan id already used by another loan".to_string(),
                ));
            }
        }

        let Some(loan) = tables.loans.get_mut(&id) else {
            return Ok(None);
        };
        if loan.status != from {
            return Ok(None);
        }

        loan.status = to;
        if patch.tx_hash.is_some() {
            loan.tx_hash = patch.tx_hash;
        }
        if loan.onchain_loan_id.is_none() {
            loan.onchain_loan_id = patch.onchain_loan_id;
        }
        if patch.owner_wallet_address.is_some() {
            loan.owner_wallet_address = patch.owner_wallet_address;
        }
        if patch.partner_wallet_address.is_some() {
            loan.partner_wallet_address = patch.partner_wallet_address;
        }
        if patch.paid_back_date.is_some() {
            loan.paid_back_date = patch.paid_back_date;
        }
        if patch.payment_tx_hash.is_some() {
            loan.payment_tx_hash = patch.payment_tx_hash;
        }

        Ok(Some(loan.clone()))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
