//! Business logic services.

pub mod dashboard;
pub mod service_request;
