//! Partner route definitions

use axum::{routing::get, Router};

use crate::handlers::{add_partner, list_partners};
use crate::state::AppState;

pub fn partner_routes() -> Router<AppState> {
    Router::new().route("/api/partners", get(list_partners).post(add_partner))
}
