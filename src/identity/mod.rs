//! Identity resolution: wallet addresses to registered users

pub mod model;
pub mod service;

pub use model::{NewUser, SignupRequest, User};
pub use service::{is_valid_wallet, normalize_wallet, IdentityService};
