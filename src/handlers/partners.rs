use axum::{
    extract::State,
    Json,
};
use std::sync::Arc;

use super::extract::{ApiJson, ApiQuery};
use crate::error::ApiError;
use crate::partner::model::{
    AddPartnerRequest, PartnerListResponse, PartnerQuery, PartnerResponse,
};
use crate::partner::PartnerService;

pub async fn add_partner(
    State(service): State<Arc<PartnerService>>,
    ApiJson(request): ApiJson<AddPartnerRequest>,
) -> Result<Json<PartnerResponse>, ApiError> {
    let partner = service.add_partner(request).await?;

    Ok(Json(PartnerResponse { partner }))
}

pub async fn list_partners(
    State(service): State<Arc<PartnerService>>,
    ApiQuery(query): ApiQuery<PartnerQuery>,
) -> Result<Json<PartnerListResponse>, ApiError> {
    let partners = service.list_partners(query.owner_wallet.as_deref()).await?;

    Ok(Json(PartnerListResponse {
        partner_count: partners.len(),
        partners,
    }))
}
