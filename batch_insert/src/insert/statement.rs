//! Multi-row INSERT statement buffer

use crate::models::row::Row;
use crate::utils::naming::quote_identifier;
use crate::value::Value;

/// One flushed chunk: statement text plus its flat parameter list
#[derive(Debug, Clone, PartialEq)]
pub struct InsertChunk {
    /// Zero-based position of the chunk within its batch
    pub index: usize,
    pub sql: String,
    pub params: Vec<Value>,
    /// Number of value-groups in `sql`
    pub rows: usize,
}

/// Accumulates value-groups behind a fixed `INSERT INTO ... VALUES ` prefix
///
/// Parameter `k` always belongs to placeholder `k` of the statement text;
/// values are appended in column order, row after row.
#[derive(Debug, Clone)]
pub struct InsertStatement {
    prefix: String,
    columns: Vec<String>,
    value_group: String,
    sql: String,
    params: Vec<Value>,
    rows: usize,
    chunks: usize,
}

impl InsertStatement {
    /// Start an empty statement sized for `rows_per_chunk` value-groups
    pub fn new(table: &str, columns: Vec<String>, rows_per_chunk: usize) -> Self {
        let quoted = columns
            .iter()
            .map(|c| quote_identifier(c))
            .collect::<Vec<_>>()
            .join(", ");
        let prefix = format!("INSERT INTO {} ({}) VALUES ", quote_identifier(table), quoted);
        let value_group = format!("({})", vec!["?"; columns.len()].join(", "));
        let capacity = rows_per_chunk.saturating_mul(columns.len());

        Self {
            sql: prefix.clone(),
            params: Vec::with_capacity(capacity),
            prefix,
            columns,
            value_group,
            rows: 0,
            chunks: 0,
        }
    }

    /// The shared `INSERT INTO <table> (<columns>) VALUES ` text
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Append one row's value-group and its parameters
    ///
    /// Columns the row does not carry are bound as NULL.
    pub fn push_row(&mut self, row: &Row) {
        if self.rows > 0 {
            self.sql.push_str(", ");
        }
        self.sql.push_str(&self.value_group);

        for column in &self.columns {
            self.params.push(row.get(column).cloned().unwrap_or(Value::Null));
        }
        self.rows += 1;
    }

    /// Number of value-groups buffered since the last flush
    pub fn len(&self) -> usize {
        self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn params(&self) -> &[Value] {
        &self.params
    }

    /// Hand out the buffered chunk and reset to the bare prefix
    pub fn take(&mut self) -> InsertChunk {
        let capacity = self.params.capacity();
        let chunk = InsertChunk {
            index: self.chunks,
            sql: std::mem::replace(&mut self.sql, self.prefix.clone()),
            params: std::mem::replace(&mut self.params, Vec::with_capacity(capacity)),
            rows: self.rows,
        };
        self.rows = 0;
        self.chunks += 1;
        chunk
    }
}
