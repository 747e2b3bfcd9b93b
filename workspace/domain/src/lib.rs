//! Business rules of the rental domain, independent of the HTTP layer.
//!
//! Every check takes a generic [`sea_orm::ConnectionTrait`] so it can run
//! against a pooled connection or inside the caller's transaction.

pub mod audit;
pub mod error;
pub mod interval;
pub mod lease;
pub mod payment;
pub mod references;

#[cfg(test)]
mod testing;

pub use error::{DomainError, Result};
