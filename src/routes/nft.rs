//! Achievement NFT route definitions

use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers::{mint_nft, nft_metadata};
use crate::state::AppState;

pub fn nft_routes() -> Router<AppState> {
    Router::new()
        .route("/api/nft/mint", post(mint_nft))
        .route("/api/nft/metadata/:token_id", get(nft_metadata))
}
