//! Voice capture route definitions

use axum::{extract::DefaultBodyLimit, routing::post, Router};

use crate::handlers::{extract_loan_info, transcribe};
use crate::state::AppState;
use crate::voice::transcribe::MAX_AUDIO_BYTES;

/// Multipart framing on top of the largest accepted audio file
const MULTIPART_OVERHEAD: usize = 1024 * 1024;

pub fn voice_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/transcribe",
            post(transcribe).layer(DefaultBodyLimit::max(MAX_AUDIO_BYTES + MULTIPART_OVERHEAD)),
        )
        .route("/api/extract-loan-info", post(extract_loan_info))
}
