//! Models module for batch_insert
//!
//! Row shapes, the entity trait and the table registry.

pub mod entity;
pub mod registry;
pub mod row;

// Re-export key types
pub use entity::Entity;
pub use registry::{TableMeta, TableRegistry};
pub use row::{EntityRow, Record, Row};
