//! Row shapes accepted by the batch compositor
//!
//! A [`Row`] is either a schema-less [`Record`] or a schema-bound
//! [`EntityRow`] whose real columns come from the table registry.

use indexmap::IndexMap;

use crate::error::{Error, Result};
use crate::models::entity::Entity;
use crate::value::Value;

/// Schema-less row: column name to value, in insertion order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    columns: IndexMap<String, Value>,
}

impl Record {
    /// Create an empty record
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a column value, keeping the column's first insertion position
    pub fn set(&mut self, column: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.columns.insert(column.into(), value.into());
        self
    }

    /// Builder form of [`Record::set`]
    pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(column, value);
        self
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns.get(column)
    }

    /// Column names in declaration order
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for Record
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = Record::new();
        for (column, value) in iter {
            record.set(column, value);
        }
        record
    }
}

/// Schema-bound row: an entity type name and its ordered attributes
///
/// The attribute set may contain names that are not real columns
/// (transient or computed fields); the compositor filters them out
/// against the registered table metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityRow {
    entity: String,
    attributes: IndexMap<String, Value>,
}

impl EntityRow {
    pub fn new(entity: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            attributes: IndexMap::new(),
        }
    }

    /// Snapshot an entity's current attributes
    pub fn from_entity<T: Entity>(entity: &T) -> Self {
        Self {
            entity: T::entity_name().to_string(),
            attributes: entity.attributes().into_iter().collect(),
        }
    }

    pub fn set(&mut self, attribute: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.attributes.insert(attribute.into(), value.into());
        self
    }

    pub fn with(mut self, attribute: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(attribute, value);
        self
    }

    /// Name of the entity type, the key into the table registry
    pub fn entity(&self) -> &str {
        &self.entity
    }

    pub fn get(&self, attribute: &str) -> Option<&Value> {
        self.attributes.get(attribute)
    }

    pub fn attribute_names(&self) -> impl Iterator<Item = &str> {
        self.attributes.keys().map(String::as_str)
    }
}

/// One record to insert
#[derive(Debug, Clone, PartialEq)]
pub enum Row {
    Record(Record),
    Entity(EntityRow),
}

impl Row {
    pub fn from_entity<T: Entity>(entity: &T) -> Self {
        Row::Entity(EntityRow::from_entity(entity))
    }

    /// Look up the stored value for a column
    pub fn get(&self, column: &str) -> Option<&Value> {
        match self {
            Row::Record(record) => record.get(column),
            Row::Entity(entity) => entity.get(column),
        }
    }

    /// Human-readable shape name, used in error messages
    pub fn shape(&self) -> String {
        match self {
            Row::Record(_) => "record".to_string(),
            Row::Entity(entity) => format!("entity `{}`", entity.entity()),
        }
    }
}

impl From<Record> for Row {
    fn from(record: Record) -> Self {
        Row::Record(record)
    }
}

impl From<EntityRow> for Row {
    fn from(entity: EntityRow) -> Self {
        Row::Entity(entity)
    }
}

/// JSON objects become records; any other JSON shape is rejected
impl TryFrom<serde_json::Value> for Row {
    type Error = Error;

    fn try_from(value: serde_json::Value) -> Result<Self> {
        match value {
            serde_json::Value::Object(map) => Ok(Row::Record(
                map.into_iter().map(|(k, v)| (k, Value::from(v))).collect(),
            )),
            other => Err(Error::UnsupportedRowShape(format!(
                "expected a JSON object, found {}",
                json_kind(&other)
            ))),
        }
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}
