//! Storage Layer
//!
//! Handles JSON config persistence. The result cache lives with the analysis service.

pub mod config;

pub use config::*;
