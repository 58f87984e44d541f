//! Data Models
//!
//! Contains the data structures owned by the application layer.

pub mod settings;

pub use settings::*;
