//! Udhaar Ledger backend library
//!
//! Shopkeepers record informal loans ("udhaar") with their partners, move each
//! loan through acceptance, on-chain recording and repayment, and receive an
//! achievement NFT once a loan is paid back.

pub mod chain;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod identity;
pub mod loan;
pub mod middleware;
pub mod partner;
pub mod routes;
pub mod state;
pub mod store;
pub mod voice;
