use axum::{
    extract::State,
    Json,
};
use std::sync::Arc;

use super::extract::{ApiJson, ApiQuery};
use crate::error::ApiError;
use crate::loan::model::{
    CreateLoanRequest, DecideRequest, Decision, LoanLedgerSummary, LoanListQuery, LoanResponse,
    LoansResponse, PartnerWalletQuery, PayQuery, PayRequest, PaymentConfirmation, PaymentDetails,
    RecordRequest, RecordingParams, UpdateTxRequest, UpdateTxResponse,
};
use crate::loan::{LoanService, LoanView, PaymentService, RecordingService};

pub async fn create_loan(
    State(service): State<Arc<LoanService>>,
    ApiJson(request): ApiJson<CreateLoanRequest>,
) -> Result<Json<LoanResponse<LoanView>>, ApiError> {
    let loan = service.create_loan(request).await?;

    Ok(Json(LoanResponse { loan }))
}

pub async fn list_loans(
    State(service): State<Arc<LoanService>>,
    ApiQuery(query): ApiQuery<LoanListQuery>,
) -> Result<Json<LoanLedgerSummary>, ApiError> {
    Ok(Json(service.list_loans(query).await?))
}

pub async fn list_pending_loans(
    State(service): State<Arc<LoanService>>,
    ApiQuery(query): ApiQuery<PartnerWalletQuery>,
) -> Result<Json<LoansResponse>, ApiError> {
    let loans = service.list_pending(query.partner_wallet.as_deref()).await?;

    Ok(Json(LoansResponse { loans }))
}

pub async fn list_awaiting_payment(
    State(service): State<Arc<LoanService>>,
    ApiQuery(query): ApiQuery<PartnerWalletQuery>,
) -> Result<Json<LoansResponse>, ApiError> {
    let loans = service
        .list_awaiting_payment(query.partner_wallet.as_deref())
        .await?;

    Ok(Json(LoansResponse { loans }))
}

pub async fn decide_loan(
    State(service): State<Arc<LoanService>>,
    ApiJson(request): ApiJson<DecideRequest>,
) -> Result<Json<Decision>, ApiError> {
    Ok(Json(service.decide(request).await?))
}

pub async fn record_onchain(
    State(service): State<Arc<RecordingService>>,
    ApiJson(request): ApiJson<RecordRequest>,
) -> Result<Json<LoanResponse<RecordingParams>>, ApiError> {
    let loan = service.prepare_recording(request).await?;

    Ok(Json(LoanResponse { loan }))
}

pub async fn update_tx(
    State(service): State<Arc<RecordingService>>,
    ApiJson(request): ApiJson<UpdateTxRequest>,
) -> Result<Json<UpdateTxResponse>, ApiError> {
    let loan = service.confirm_recording(request).await?;

    Ok(Json(UpdateTxResponse {
        success: true,
        loan,
    }))
}

pub async fn payment_details(
    State(service): State<Arc<PaymentService>>,
    ApiQuery(query): ApiQuery<PayQuery>,
) -> Result<Json<LoanResponse<PaymentDetails>>, ApiError> {
    let loan = service.payment_details(query).await?;

    Ok(Json(LoanResponse { loan }))
}

pub async fn confirm_payment(
    State(service): State<Arc<PaymentService>>,
    ApiJson(request): ApiJson<PayRequest>,
) -> Result<Json<PaymentConfirmation>, ApiError> {
    Ok(Json(service.confirm_payment(request).await?))
}
