//! Database connection handling
//!
//! This module opens sqlx pools and runs composed statements against them.

use async_trait::async_trait;
use futures::TryStreamExt;
use sqlx::{
    mysql::MySqlPoolOptions, sqlite::SqlitePoolOptions, MySql, Pool, Row, Sqlite, Transaction,
};

use crate::config::DatabaseConfig;
use crate::db::executor::AsyncExecutor;
use crate::error::{Error, Result};
use crate::utils::naming::quote_identifier;
use crate::value::Value;

/// Bind each value to the next `?` placeholder of a sqlx query
macro_rules! bind_values {
    ($query:expr, $params:expr) => {{
        let mut query = $query;
        for value in $params {
            query = match value {
                Value::Null => query.bind(None::<String>),
                Value::Bool(b) => query.bind(*b),
                Value::Int(i) => query.bind(*i),
                Value::Float(f) => query.bind(*f),
                Value::Text(s) => query.bind(s.clone()),
                Value::Bytes(b) => query.bind(b.clone()),
                Value::Json(j) => query.bind(j.to_string()),
                Value::Timestamp(t) => query.bind(*t),
                Value::Date(d) => query.bind(*d),
                Value::Uuid(u) => query.bind(u.to_string()),
            };
        }
        query
    }};
}

/// Enumeration of supported database types
#[derive(Debug, Clone)]
pub enum DatabaseConnection {
    MySql(Pool<MySql>),
    Sqlite(Pool<Sqlite>),
}

impl DatabaseConnection {
    /// Create a new database connection from configuration
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let pool_size = config.pool_size.unwrap_or(10);
        let timeout = std::time::Duration::from_secs(config.timeout_seconds.unwrap_or(30));

        match config.driver.as_str() {
            "mysql" => {
                let pool = MySqlPoolOptions::new()
                    .max_connections(pool_size)
                    .acquire_timeout(timeout)
                    .connect(&config.url)
                    .await?;

                Ok(DatabaseConnection::MySql(pool))
            }
            "sqlite" => {
                let pool = SqlitePoolOptions::new()
                    .max_connections(pool_size)
                    .acquire_timeout(timeout)
                    .connect(&config.url)
                    .await?;

                Ok(DatabaseConnection::Sqlite(pool))
            }
            _ => Err(Error::DatabaseError(format!(
                "Unsupported database driver: {}",
                config.driver
            ))),
        }
    }

    /// Driver name as used in configuration
    pub fn driver(&self) -> &'static str {
        match self {
            DatabaseConnection::MySql(_) => "mysql",
            DatabaseConnection::Sqlite(_) => "sqlite",
        }
    }

    pub fn is_closed(&self) -> bool {
        match self {
            DatabaseConnection::MySql(pool) => pool.is_closed(),
            DatabaseConnection::Sqlite(pool) => pool.is_closed(),
        }
    }

    /// Close the underlying pool
    pub async fn close(&self) {
        match self {
            DatabaseConnection::MySql(pool) => pool.close().await,
            DatabaseConnection::Sqlite(pool) => pool.close().await,
        }
    }

    fn ensure_open(&self) -> Result<()> {
        if self.is_closed() {
            return Err(Error::ExecutorUnavailable(format!(
                "{} connection pool is closed",
                self.driver()
            )));
        }
        Ok(())
    }

    /// Execute a SQL statement without parameters
    pub async fn execute(&self, sql: &str) -> Result<u64> {
        self.execute_with_params(sql, &[]).await
    }

    /// Execute a SQL statement, binding `params` to its placeholders in order
    pub async fn execute_with_params(&self, sql: &str, params: &[Value]) -> Result<u64> {
        self.ensure_open()?;

        let result = match self {
            DatabaseConnection::MySql(pool) => {
                bind_values!(sqlx::query(sql), params).execute(pool).await?.rows_affected()
            }
            DatabaseConnection::Sqlite(pool) => {
                bind_values!(sqlx::query(sql), params).execute(pool).await?.rows_affected()
            }
        };

        Ok(result)
    }

    /// Start a transaction on a pooled connection
    pub async fn begin(&self) -> Result<DatabaseTransaction> {
        self.ensure_open()?;

        match self {
            DatabaseConnection::MySql(pool) => Ok(DatabaseTransaction::MySql(pool.begin().await?)),
            DatabaseConnection::Sqlite(pool) => Ok(DatabaseTransaction::Sqlite(pool.begin().await?)),
        }
    }

    /// Read a table's column names, in table order
    pub async fn discover_columns(&self, table: &str) -> Result<Vec<String>> {
        self.ensure_open()?;

        let columns: Vec<String> = match self {
            DatabaseConnection::MySql(pool) => {
                let sql = r#"
                    SELECT CAST(COLUMN_NAME AS CHAR) AS column_name
                    FROM information_schema.COLUMNS
                    WHERE TABLE_SCHEMA = DATABASE() AND TABLE_NAME = ?
                    ORDER BY ORDINAL_POSITION
                "#;

                sqlx::query_scalar::<_, String>(sql)
                    .bind(table)
                    .fetch(pool)
                    .try_collect::<Vec<String>>()
                    .await?
            }
            DatabaseConnection::Sqlite(pool) => {
                let sql = format!("PRAGMA table_info({})", quote_identifier(table));

                sqlx::query(&sql)
                    .fetch_all(pool)
                    .await?
                    .iter()
                    .map(|row| row.try_get::<String, _>("name"))
                    .collect::<std::result::Result<_, sqlx::Error>>()?
            }
        };

        if columns.is_empty() {
            return Err(Error::DatabaseError(format!(
                "Table `{}` does not exist or has no columns",
                table
            )));
        }

        tracing::debug!(table = table, columns = columns.len(), "Discovered table columns");
        Ok(columns)
    }
}

#[async_trait]
impl AsyncExecutor for DatabaseConnection {
    async fn execute(&mut self, sql: &str, params: &[Value]) -> Result<u64> {
        self.execute_with_params(sql, params).await
    }
}

/// An open transaction, usable as an executor until committed
pub enum DatabaseTransaction {
    MySql(Transaction<'static, MySql>),
    Sqlite(Transaction<'static, Sqlite>),
}

impl DatabaseTransaction {
    pub async fn commit(self) -> Result<()> {
        match self {
            DatabaseTransaction::MySql(tx) => tx.commit().await?,
            DatabaseTransaction::Sqlite(tx) => tx.commit().await?,
        }
        Ok(())
    }

    pub async fn rollback(self) -> Result<()> {
        match self {
            DatabaseTransaction::MySql(tx) => tx.rollback().await?,
            DatabaseTransaction::Sqlite(tx) => tx.rollback().await?,
        }
        Ok(())
    }
}

#[async_trait]
impl AsyncExecutor for DatabaseTransaction {
    async fn execute(&mut self, sql: &str, params: &[Value]) -> Result<u64> {
        let result = match self {
            DatabaseTransaction::MySql(tx) => {
                bind_values!(sqlx::query(sql), params).execute(&mut **tx).await?.rows_affected()
            }
            DatabaseTransaction::Sqlite(tx) => {
                bind_values!(sqlx::query(sql), params).execute(&mut **tx).await?.rows_affected()
            }
        };

        Ok(result)
    }
}
