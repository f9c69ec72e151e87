use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Directed owner → partner edge
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, PartialEq, Eq)]
pub struct PartnerLink {
    pub id: Uuid,
    pub owner_user_id: Uuid,
    pub partner_user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// A partner as the owner sees it; `id` is the link id used when creating loans
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Partner {
    pub id: Uuid,
    pub username: String,
    pub name: String,
    pub wallet_address: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddPartnerRequest {
    pub owner_wallet: Option<String>,
    pub partner_username: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartnerQuery {
    pub owner_wallet: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PartnerResponse {
    pub partner: Partner,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PartnerListResponse {
    pub partners: Vec<Partner>,
    pub partner_count: usize,
}
