//! Partner registry: who an owner lends to

pub mod model;
pub mod service;

pub use model::{AddPartnerRequest, Partner, PartnerLink};
pub use service::PartnerService;
