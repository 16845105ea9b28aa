//! Statement executors
//!
//! The compositor never talks to a database itself. Each composed chunk is
//! handed to an executor, which runs it and reports the affected-row count.

use async_trait::async_trait;

use crate::error::Result;
use crate::value::Value;

/// Runs a parameterized statement synchronously
///
/// Implemented for any `FnMut(&str, &[Value]) -> Result<u64>`, so a closure
/// wrapping an existing database handle is enough.
pub trait Executor {
    /// Execute `sql` with `params` bound to its placeholders, in order
    fn execute(&mut self, sql: &str, params: &[Value]) -> Result<u64>;
}

impl<F> Executor for F
where
    F: FnMut(&str, &[Value]) -> Result<u64>,
{
    fn execute(&mut self, sql: &str, params: &[Value]) -> Result<u64> {
        self(sql, params)
    }
}

/// Runs a parameterized statement asynchronously
#[async_trait]
pub trait AsyncExecutor: Send {
    /// Execute `sql` with `params` bound to its placeholders, in order
    async fn execute(&mut self, sql: &str, params: &[Value]) -> Result<u64>;
}

/// A statement captured by [`DryRunExecutor`]
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedStatement {
    pub sql: String,
    pub params: Vec<Value>,
}

/// Executor that logs and records statements instead of running them
///
/// Reports `rows_per_statement(params)` affected rows, i.e. as if every
/// value-group had been inserted.
#[derive(Debug, Clone)]
pub struct DryRunExecutor {
    columns: usize,
    statements: Vec<CapturedStatement>,
}

impl DryRunExecutor {
    /// `columns` is the width of each value-group
    pub fn new(columns: usize) -> Self {
        Self {
            columns: columns.max(1),
            statements: Vec::new(),
        }
    }

    pub fn statements(&self) -> &[CapturedStatement] {
        &self.statements
    }

    fn capture(&mut self, sql: &str, params: &[Value]) -> u64 {
        tracing::info!(sql = sql, params = params.len(), "Statement (dry run)");
        self.statements.push(CapturedStatement {
            sql: sql.to_string(),
            params: params.to_vec(),
        });
        (params.len() / self.columns) as u64
    }
}

impl Executor for DryRunExecutor {
    fn execute(&mut self, sql: &str, params: &[Value]) -> Result<u64> {
        Ok(self.capture(sql, params))
    }
}

#[async_trait]
impl AsyncExecutor for DryRunExecutor {
    async fn execute(&mut self, sql: &str, params: &[Value]) -> Result<u64> {
        Ok(self.capture(sql, params))
    }
}
