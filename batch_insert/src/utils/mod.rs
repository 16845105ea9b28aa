//! Utilities for batch_insert
//!
//! This module provides utility functions used across the library.

pub mod logging;
pub mod naming;

// Re-export key utility functions
pub use naming::{apply_naming_convention, get_table_name, mask_database_url, quote_identifier};
