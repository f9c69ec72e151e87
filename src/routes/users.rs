//! User route definitions

use axum::{routing::get, Router};

use crate::handlers::{get_user, signup};
use crate::state::AppState;

pub fn user_routes() -> Router<AppState> {
    Router::new().route("/api/users", get(get_user).post(signup))
}
