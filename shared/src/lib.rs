//! Shared types for the label station
//!
//! Common types used across the engine and printer crates: item records,
//! sort keys, search request types, and small utility helpers.

pub mod models;
pub mod util;

// Re-exports
pub use models::{ItemRecord, RawItemRow, SearchField, SearchMode, SearchRequest, SortKey};
pub use util::now_millis;
