//! Modules layer - Infrastructure components for external integrations
//!
//! Contains clients for the object store (catalogue images) and the
//! payment provider (checkout sessions).

pub mod payments;
pub mod storage;
