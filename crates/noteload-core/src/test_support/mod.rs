//! Test support
//!
//! In-memory collaborators for unit and integration tests. Enabled for this
//! crate's own tests and, through the `test-utils` feature, for dependents.

pub mod mocks;

pub use mocks::{FailOn, LoaderCall, MockCatalog, MockLoader};
