//! Runtime infrastructure shared by all components: the component contract,
//! lifecycle orchestration, configuration, clocks and metrics.

pub mod clock;
pub mod component;
pub mod config;
pub mod metrics;
pub mod orchestrator;
pub mod telemetry;
