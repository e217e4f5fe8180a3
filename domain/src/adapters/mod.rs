//! Test-only adapters that live inside the domain crate for convenience.
//!
//! These are intended purely for unit testing and local demos. The DynamoDB
//! adapter lives in its own crate.

pub mod memory_repo;
