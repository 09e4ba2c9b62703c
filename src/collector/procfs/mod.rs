//! Readers for the Linux `/proc` filesystem.
//!
//! This module provides parsers and readers for system and process
//! counters exposed by the `/proc` virtual filesystem.

pub mod parser;
pub mod process;
pub mod system;

pub use parser::ParseError;
pub use process::{ProcessReader, ProcessSample, SampleRequest};
pub use system::SystemReader;
