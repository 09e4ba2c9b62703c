//! Mock filesystem implementations for testing.
//!
//! This module provides `MockFs` and pre-built scenarios for testing
//! readers without requiring actual Linux `/proc` or `/sys` access.

mod filesystem;
pub mod scenarios;

pub use filesystem::MockFs;
