//! Services
//!
//! Business logic services for the application.

pub mod analysis;

pub use analysis::{AnalysisReport, AnalysisRunSupervisor, AnalysisService, ResultCache};
