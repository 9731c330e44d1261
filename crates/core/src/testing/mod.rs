//! Test doubles and fixtures for the acquisition pipeline.
//!
//! Compiled into the library (not `#[cfg(test)]`) so both unit tests and
//! the integration suite can share them.

pub mod fixtures;
mod mock_provider;

pub use mock_provider::{MockProvider, RecordedSearch};
