//! Utility functions for display formatting.

pub mod format;

pub use format::{expand_home, format_optional_timestamp, header_label, or_na};
