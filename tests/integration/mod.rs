//! Integration Tests Module
//!
//! End-to-end tests for lintview: run supervision through the analysis
//! service, result cache properties, and config handling.

// Analysis service scenarios with a scripted launcher and a real shell
mod analysis_test;

// Result cache ordering and bounds
mod cache_test;

// Config file and command line overrides
mod config_test;
