//! Pure assessment logic wrapped by the component instances.

pub mod charts;
pub mod generator;
pub mod scoring;
