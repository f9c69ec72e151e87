//! Loan lifecycle engine and its bridges to the chain
//!
//! ```text
//!  pending --accept--> accepted --record--> waiting on payment --pay--> paid back
//!     |
//!     +--reject--> rejected
//! ```

pub mod model;
pub mod payment;
pub mod recording;
pub mod service;

pub use model::{Loan, LoanStatus, LoanView};
pub use payment::PaymentService;
pub use recording::RecordingService;
pub use service::LoanService;
