//! Schema-bound entity trait

use crate::value::Value;

/// A struct that can be inserted as a schema-bound row
///
/// Usually implemented with `#[derive(Entity)]`. The attribute list may
/// include fields that are not real table columns; those are dropped
/// against the registered [`TableMeta`](crate::models::TableMeta).
pub trait Entity {
    /// Name under which the entity's table is registered
    fn entity_name() -> &'static str;

    /// Attribute name and current value pairs, in declaration order
    fn attributes(&self) -> Vec<(String, Value)>;
}
