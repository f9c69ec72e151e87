use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::{check_transition, LedgerStore, StoreError};
use crate::identity::{NewUser, User};
use crate::loan::model::{Loan, LoanStatus, NewLoan, StatusPatch};
use crate::partner::PartnerLink;

#[derive(Clone)]
pub struct PgLedgerStore {
    db_pool: PgPool,
}

impl PgLedgerStore {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.db_pool
    }
}

#[async_trait]
impl LedgerStore for PgLedgerStore {
    async fn insert_user(&self, user: NewUser) -> Result<User, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, store_name, username, email, wallet_address)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(&user.name)
        .bind(&user.store_name)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.wallet_address)
        .fetch_one(&self.db_pool)
        .await?;

        Ok(user)
    }

    async fn find_user_by_wallet(&self, wallet: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE lower(wallet_address) = lower($1)",
        )
        .bind(wallet)
        .fetch_optional(&self.db_pool)
        .await?;

        Ok(user)
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let user =
            sqlx::query_as::<_, User>("SELECT * FROM users WHERE lower(username) = lower($1)")
                .bind(username)
                .fetch_optional(&self.db_pool)
                .await?;

        Ok(user)
    }

    async fn find_users(&self, ids: &[Uuid]) -> Result<Vec<User>, StoreError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let users = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(&self.db_pool)
            .await?;

        Ok(users)
    }

    async fn insert_partner_link(
        &self,
        owner_user_id: Uuid,
        partner_user_id: Uuid,
    ) -> Result<PartnerLink, StoreError> {
        let link = sqlx::query_as::<_, PartnerLink>(
            r#"
            INSERT INTO partners (owner_user_id, partner_user_id)
            VALUES ($1, $2)
            RETURNING *
            "#,
        )
        .bind(owner_user_id)
        .bind(partner_user_id)
        .fetch_one(&self.db_pool)
        .await?;

        Ok(link)
    }

    async fn find_partner_link(
        &self,
        link_id: Uuid,
        owner_user_id: Uuid,
    ) -> Result<Option<PartnerLink>, StoreError> {
        let link = sqlx::query_as::<_, PartnerLink>(
            "SELECT * FROM partners WHERE id = $1 AND owner_user_id = $2",
        )
        .bind(link_id)
        .bind(owner_user_id)
        .fetch_optional(&self.db_pool)
        .await?;

        Ok(link)
    }

    async fn list_partner_links(
        &self,
        owner_user_id: Uuid,
    ) -> Result<Vec<PartnerLink>, StoreError> {
        let links = sqlx::query_as::<_, PartnerLink>(
            "SELECT * FROM partners WHERE owner_user_id = $1 ORDER BY created_at DESC",
        )
        .bind(owner_user_id)
        .fetch_all(&self.db_pool)
        .await?;

        Ok(links)
    }

    async fn insert_loan(&self, loan: NewLoan) -> Result<Loan, StoreError> {
        let loan = sqlx::query_as::<_, Loan>(
            r#"
            INSERT INTO loans (
                owner_user_id, partner_user_id, owner_wallet_address, partner_wallet_address,
                amount, description, loan_date, expected_return_date, status
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(loan.owner_user_id)
        .bind(loan.partner_user_id)
        .bind(&loan.owner_wallet_address)
        .bind(&loan.partner_wallet_address)
        .bind(loan.amount)
        .bind(&loan.description)
        .bind(loan.loan_date)
        .bind(loan.expected_return_date)
        .bind(LoanStatus::Pending)
        .fetch_one(&self.db_pool)
        .await?;

        Ok(loan)
    }

    async fn find_loan(&self, id: Uuid) -> Result<Option<Loan>, StoreError> {
        let loan = sqlx::query_as::<_, Loan>("SELECT * FROM loans WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db_pool)
            .await?;

        Ok(loan)
    }

    async fn list_loans_by_owner(&self, owner_user_id: Uuid) -> Result<Vec<Loan>, StoreError> {
        let loans = sqlx::query_as::<_, Loan>(
            "SELECT * FROM loans WHERE owner_user_id = $1 ORDER BY created_at DESC",
        )
        .bind(owner_user_id)
        .fetch_all(&self.db_pool)
        .await?;

        Ok(loans)
    }

    async fn list_loans_by_partner(
        &self,
        partner_user_id: Uuid,
        status: Option<LoanStatus>,
    ) -> Result<Vec<Loan>, StoreError> {
        let mut query_builder =
            sqlx::QueryBuilder::new("SELECT * FROM loans WHERE partner_user_id = ");
        query_builder.push_bind(partner_user_id);

        if let Some(status) = status {
            query_builder.push(" AND status = ");
            query_builder.push_bind(status);
        }

        query_builder.push(" ORDER BY created_at DESC");

        let loans = query_builder
            .build_query_as::<Loan>()
            .fetch_all(&self.db_pool)
            .await?;

        Ok(loans)
    }

    async fn transition_loan(
        &self,
        id: Uuid,
        from: LoanStatus,
        to: LoanStatus,
        patch: StatusPatch,
    ) -> Result<Option<Loan>, StoreError> {
        check_transition(from, to)?;

        let loan = sqlx::query_as::<_, Loan>(
            r#"
            UPDATE loans SET
                status = $3,
                tx_hash = COALESCE($4, tx_hash),
                onchain_loan_id = COALESCE(onchain_loan_id, $5),
                owner_wallet_address = COALESCE($6, owner_wallet_address),
                partner_wallet_address = COALESCE($7, partner_wallet_address),
                paid_back_date = COALESCE($8, paid_back_date),
                payment_tx_hash = COALESCE($9, payment_tx_hash)
            WHERE id = $1 AND status = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(from)
        .bind(to)
        .bind(&patch.tx_hash)
        .bind(&patch.onchain_loan_id)
        .bind(&patch.owner_wallet_address)
        .bind(&patch.partner_wallet_address)
        .bind(patch.paid_back_date)
        .bind(&patch.payment_tx_hash)
        .fetch_optional(&self.db_pool)
        .await?;

        Ok(loan)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").fetch_one(&self.db_pool).await?;
        Ok(())
    }
}
