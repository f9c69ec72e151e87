//! Loan lifecycle route definitions

use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers::*;
use crate::state::AppState;

pub fn loan_routes() -> Router<AppState> {
    Router::new()
        .route("/api/loans", get(list_loans).post(create_loan))
        .route("/api/loans/pending", get(list_pending_loans))
        .route("/api/loans/awaiting-payment", get(list_awaiting_payment))
        .route("/api/loans/accept", post(decide_loan))
        .route("/api/loans/record-onchain", post(record_onchain))
        .route("/api/loans/update-tx", post(update_tx))
        .route("/api/loans/pay", get(payment_details).post(confirm_payment))
}
