//! Component instances of the risk assessment service
//!
//! The data generator produces accounts and the risk engine scores them.

pub mod common;
pub mod data_generator;
pub mod risk_engine;

// Re-export instances for convenience
pub use data_generator::DataGeneratorInstance;
pub use risk_engine::{BatchAnalysis, BatchSummary, RiskEngineInstance};
