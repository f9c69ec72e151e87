use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use super::extract::{ApiJson, ApiQuery};
use crate::error::ApiError;
use crate::identity::model::{SignupRequest, SignupResponse, UserResponse, WalletQuery};
use crate::identity::IdentityService;

pub async fn signup(
    State(service): State<Arc<IdentityService>>,
    ApiJson(request): ApiJson<SignupRequest>,
) -> Result<(StatusCode, Json<SignupResponse>), ApiError> {
    let user = service.signup(request).await?;

    Ok((
        StatusCode::CREATED,
        Json(SignupResponse {
            success: true,
            user,
        }),
    ))
}

pub async fn get_user(
    State(service): State<Arc<IdentityService>>,
    ApiQuery(query): ApiQuery<WalletQuery>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = service.get_user(query.wallet_address.as_deref()).await?;

    Ok(Json(UserResponse { user }))
}
