//! Persistent assessment history

pub mod history;
pub mod migrations;

pub use history::{HistoryEntry, HistoryStore};
