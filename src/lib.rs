//! Explainable risk assessment for social media accounts.
//!
//! Accounts are scored against seven behavioural factors into a 0..=100
//! risk score, banded into low, moderate and high risk, and every score
//! comes with human-readable explanations. The service generates synthetic
//! accounts for demonstration and exposes both a dashboard and a JSON API.

pub mod app;
pub mod core;
pub mod engine;
pub mod instances;
pub mod model;
pub mod store;
pub mod web;
