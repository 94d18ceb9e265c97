//! Test utilities and sample data for PCBook
//!
//! Shared by unit tests, the API integration tests and the command-line demo.

pub mod fixtures;

pub use fixtures::*;
