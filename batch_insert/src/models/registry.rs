//! Table registry for batch_insert
//!
//! Maps entity type names to their table name and real column set. The
//! registry is filled once at startup (by hand, from configuration, or by
//! asking the database) and only read afterwards; share it behind an `Arc`.

use indexmap::IndexSet;
use std::collections::HashMap;

use crate::config::Config;
use crate::db::connection::DatabaseConnection;
use crate::error::{Error, Result};
use crate::models::entity::Entity;
use crate::utils::naming::get_table_name;

/// Table name and known columns for one entity type
#[derive(Debug, Clone, PartialEq)]
pub struct TableMeta {
    pub name: String,
    pub columns: IndexSet<String>,
}

impl TableMeta {
    pub fn new<I, S>(name: impl Into<String>, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }

    /// Whether `column` is a real column of this table
    pub fn has_column(&self, column: &str) -> bool {
        self.columns.contains(column)
    }
}

/// Registry of entity table mappings
#[derive(Debug, Clone, Default)]
pub struct TableRegistry {
    tables: HashMap<String, TableMeta>,
}

impl TableRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the mappings from configuration that list their columns
    ///
    /// Mappings without columns are skipped here; they need
    /// [`TableRegistry::register_discovered`] against a live connection.
    pub fn from_config(config: &Config) -> Result<Self> {
        let mut registry = Self::new();

        for mapping in config.tables.iter().filter(|m| !m.columns.is_empty()) {
            let table = mapping.table.clone().unwrap_or_else(|| {
                get_table_name(
                    &mapping.entity,
                    &config.naming.table_style,
                    config.naming.pluralize_tables,
                )
            });
            registry.register(&mapping.entity, TableMeta::new(table, mapping.columns.iter().cloned()))?;
        }

        Ok(registry)
    }

    /// Register the table mapping for an entity name
    pub fn register(&mut self, entity: impl Into<String>, meta: TableMeta) -> Result<()> {
        let entity = entity.into();

        if meta.name.trim().is_empty() {
            return Err(Error::InvalidArgument(format!(
                "Table name for entity `{}` must not be empty",
                entity
            )));
        }
        if meta.columns.is_empty() {
            return Err(Error::InvalidArgument(format!(
                "Table `{}` for entity `{}` has no columns",
                meta.name, entity
            )));
        }
        if self.tables.contains_key(&entity) {
            return Err(Error::InvalidArgument(format!(
                "Entity `{}` is already registered",
                entity
            )));
        }

        tracing::debug!(entity = %entity, table = %meta.name, columns = meta.columns.len(), "Registered table mapping");
        self.tables.insert(entity, meta);
        Ok(())
    }

    /// Register the table mapping for an [`Entity`] type
    pub fn register_entity<T: Entity>(&mut self, meta: TableMeta) -> Result<()> {
        self.register(T::entity_name(), meta)
    }

    /// Register an entity by reading the table's columns from the database
    pub async fn register_discovered(
        &mut self,
        connection: &DatabaseConnection,
        entity: &str,
        table: &str,
    ) -> Result<()> {
        let columns = connection.discover_columns(table).await?;
        self.register(entity, TableMeta::new(table, columns))
    }

    pub fn get(&self, entity: &str) -> Option<&TableMeta> {
        self.tables.get(entity)
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}
