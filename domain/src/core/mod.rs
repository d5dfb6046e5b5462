//! Core domain concepts shared across all subdomains.
//!
//! - [`error::DomainError`]: domain-level errors
//! - [`error::PayloadError`]: a push-channel payload that cannot be understood

pub mod error;
