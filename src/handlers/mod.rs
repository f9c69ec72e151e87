//! API handlers for the Udhaar Ledger backend

pub mod extract;
pub mod health;
pub mod loans;
pub mod nft;
pub mod partners;
pub mod users;
pub mod voice;

pub use health::{health_check, root};
pub use loans::*;
pub use nft::{mint_nft, nft_metadata};
pub use partners::{add_partner, list_partners};
pub use users::{get_user, signup};
pub use voice::{extract_loan_info, transcribe};
