use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;

use crate::store::LedgerStore;

pub async fn root() -> &'static str {
    "Udhaar Ledger API Server"
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub database: String,
    pub version: String,
}

/// Reports store reachability; always 200 so load balancers can read the body
pub async fn health_check(State(store): State<Arc<dyn LedgerStore>>) -> Json<HealthResponse> {
    let (status, database) = match store.ping().await {
        Ok(()) => ("healthy", "connected".to_string()),
        Err(e) => ("unhealthy", format!("error: {}", e)),
    };

    Json(HealthResponse {
        status: status.to_string(),
        database,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
