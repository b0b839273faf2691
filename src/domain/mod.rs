//! Domain layer: candidate/pool models, configuration types, ports and errors.

pub mod errors;
pub mod models;
pub mod ports;

pub use errors::{DomainError, DomainResult};
