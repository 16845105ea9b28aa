//! Database module for batch_insert
//!
//! This module handles database connections and statement executors.

pub mod connection;
pub mod executor;

// Re-export key types
pub use connection::{DatabaseConnection, DatabaseTransaction};
pub use executor::{AsyncExecutor, CapturedStatement, DryRunExecutor, Executor};
