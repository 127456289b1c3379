//! Utility functions for string formatting and comparison.

pub mod format;

// Re-export commonly used functions at module level
pub use format::{cmp_titles, collation_key, encode_uri_component, truncate_string};
