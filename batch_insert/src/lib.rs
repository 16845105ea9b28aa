//! batch_insert: chunked multi-row INSERT composition
//!
//! Instead of issuing one `INSERT` per row, batch_insert composes one
//! `INSERT INTO t (a, b) VALUES (?, ?), (?, ?), ...` statement per chunk of
//! rows and hands it to an executor, summing the affected-row counts.
//!
//! Rows are either schema-less [`Record`]s or schema-bound entities whose
//! real columns are looked up in a [`TableRegistry`].

extern crate self as batch_insert;

pub mod config;
pub mod db;
pub mod error;
pub mod insert;
pub mod models;
pub mod utils;
pub mod value;

use std::sync::Arc;

// Re-export main types for easier access
pub use batch_insert_macros::Entity;
pub use config::Config;
pub use db::connection::{DatabaseConnection, DatabaseTransaction};
pub use db::executor::{AsyncExecutor, DryRunExecutor, Executor};
pub use error::{Error, Result};
pub use insert::{batch_insert, BatchInserter, InsertChunk, InsertOptions, InsertPlan};
pub use models::{EntityRow, Record, Row, TableMeta, TableRegistry};
pub use value::Value;

/// Initialize a client from the specified configuration file
pub async fn init(config_path: &str) -> Result<BatchInsertClient> {
    let config = config::load_from_file(config_path)?;
    BatchInsertClient::new(config).await
}

/// Database-backed batch inserter built from configuration
pub struct BatchInsertClient {
    config: Config,
    db_connection: DatabaseConnection,
    inserter: BatchInserter,
}

impl BatchInsertClient {
    /// Connect and build the table registry from configuration
    ///
    /// Table mappings that do not list their columns are completed by
    /// reading the columns from the database.
    pub async fn new(config: Config) -> Result<Self> {
        config.validate()?;

        tracing::info!(
            driver = %config.database.driver,
            url = %utils::logging::loggable_url(&config.database.url, &config.logging),
            "Connecting to database"
        );
        let db_connection = DatabaseConnection::connect(&config.database).await?;

        let mut registry = TableRegistry::from_config(&config)?;
        for mapping in config.tables.iter().filter(|m| m.columns.is_empty()) {
            let table = mapping.table.clone().unwrap_or_else(|| {
                utils::naming::get_table_name(
                    &mapping.entity,
                    &config.naming.table_style,
                    config.naming.pluralize_tables,
                )
            });
            registry
                .register_discovered(&db_connection, &mapping.entity, &table)
                .await?;
        }

        Ok(Self::with_registry(config, db_connection, registry))
    }

    /// Build a client around an existing connection and registry
    pub fn with_registry(config: Config, db_connection: DatabaseConnection, registry: TableRegistry) -> Self {
        let inserter = BatchInserter::with_options(Arc::new(registry), InsertOptions::from(&config.batch));

        Self {
            config,
            db_connection,
            inserter,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.db_connection
    }

    pub fn inserter(&self) -> &BatchInserter {
        &self.inserter
    }

    /// Insert rows, inside one transaction when `batch.use_transaction` is set
    pub async fn insert_rows(&self, table: Option<&str>, rows: &[Row]) -> Result<Option<u64>> {
        if self.config.batch.use_transaction {
            return self.insert_rows_atomically(table, rows).await;
        }

        let mut connection = self.db_connection.clone();
        self.inserter.insert_async(table, rows, &mut connection).await
    }

    /// Insert rows inside one transaction, rolling back every chunk on failure
    pub async fn insert_rows_atomically(&self, table: Option<&str>, rows: &[Row]) -> Result<Option<u64>> {
        // Surface planning errors without opening a transaction
        if self.inserter.plan(table, rows)?.is_none() {
            return Ok(None);
        }

        let mut transaction = self.db_connection.begin().await?;
        match self.inserter.insert_async(table, rows, &mut transaction).await {
            Ok(affected) => {
                transaction.commit().await?;
                Ok(affected)
            }
            Err(e) => {
                if let Err(rollback_error) = transaction.rollback().await {
                    tracing::error!(error = %rollback_error, "Rollback failed");
                }
                Err(e)
            }
        }
    }

    /// Insert schema-less records into `table`
    pub async fn insert_records(&self, table: &str, records: Vec<Record>) -> Result<Option<u64>> {
        let rows: Vec<Row> = records.into_iter().map(Row::Record).collect();
        self.insert_rows(Some(table), &rows).await
    }

    /// Insert entities into their registered table
    pub async fn insert_entities<T: models::Entity>(&self, entities: &[T]) -> Result<Option<u64>> {
        let rows: Vec<Row> = entities.iter().map(Row::from_entity).collect();
        self.insert_rows(None, &rows).await
    }
}
