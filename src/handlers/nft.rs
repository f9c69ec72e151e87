use axum::{
    extract::{Path, State},
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;
use std::sync::Arc;

use alloy::primitives::U256;

use crate::chain::{AchievementMinter, MetadataService, MintOutcome};
use super::extract::ApiJson;
use crate::error::ApiError;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MintRequest {
    pub recipient_address: Option<String>,
    pub loan_id: Option<String>,
    /// Wei, as a decimal string or a JSON number
    pub amount: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct MintResponse {
    pub success: bool,
    #[serde(flatten)]
    pub outcome: MintOutcome,
}

fn parse_wei(amount: &Value) -> Option<U256> {
    match amount {
        Value::String(s) => U256::from_str(s.trim()).ok(),
        Value::Number(n) => n.as_u64().map(U256::from),
        _ => None,
    }
}

pub async fn mint_nft(
    State(minter): State<Arc<AchievementMinter>>,
    ApiJson(request): ApiJson<MintRequest>,
) -> Result<Json<MintResponse>, ApiError> {
    let missing = || ApiError::BadRequest("recipientAddress, loanId, and amount required".to_string());

    let recipient = request
        .recipient_address
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(missing)?;
    let loan_id = request
        .loan_id
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(missing)?;
    let amount = request.amount.as_ref().ok_or_else(missing)?;
    let amount = parse_wei(amount)
        .ok_or_else(|| ApiError::BadRequest("amount must be a wei integer".to_string()))?;

    let outcome = minter.mint(&recipient, &loan_id, amount).await?;

    Ok(Json(MintResponse {
        success: true,
        outcome,
    }))
}

pub async fn nft_metadata(
    State(service): State<Arc<MetadataService>>,
    Path(token_id): Path<String>,
) -> Result<Response, ApiError> {
    let metadata = service.achievement_metadata(&token_id).await?;

    let mut response = Json(metadata).into_response();
    let headers = response.headers_mut();
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static("no-cache, no-store, must-revalidate"),
    );
    headers.insert(header::PRAGMA, HeaderValue::from_static("no-cache"));
    headers.insert(header::EXPIRES, HeaderValue::from_static("0"));

    Ok(response)
}
