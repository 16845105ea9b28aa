//! Batch insert compositor
//!
//! Turns an ordered batch of same-shaped rows into one multi-row
//! `INSERT INTO ... VALUES (?, ?), (?, ?), ...` statement per chunk and
//! flushes each chunk through an injected executor.
//!
//! Chunks run strictly one after another. A failing chunk aborts the batch;
//! chunks that were already flushed stay applied unless the executor is a
//! transaction the caller rolls back.

pub mod columns;
pub mod statement;

use std::sync::Arc;

use crate::config::BatchConfig;
use crate::db::executor::{AsyncExecutor, Executor};
use crate::error::{Error, Result};
use crate::models::entity::Entity;
use crate::models::registry::TableRegistry;
use crate::models::row::Row;
use crate::value::Value;

pub use columns::BatchShape;
pub use statement::{InsertChunk, InsertStatement};

/// Options controlling how a batch is chunked and checked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InsertOptions {
    /// Value-groups per statement
    pub chunk_size: usize,
    /// Check every row against the first row's shape before flushing
    pub validate_rows: bool,
}

impl InsertOptions {
    pub fn new(chunk_size: usize) -> Self {
        Self {
            chunk_size,
            validate_rows: true,
        }
    }
}

impl From<&BatchConfig> for InsertOptions {
    fn from(config: &BatchConfig) -> Self {
        Self {
            chunk_size: config.chunk_size,
            validate_rows: config.validate_rows,
        }
    }
}

/// Lazily composed chunks of one batch
///
/// Yields a chunk each time the running row count reaches a multiple of the
/// chunk size, then one final chunk for any leftover rows.
#[derive(Debug)]
pub struct InsertPlan<'a> {
    rows: &'a [Row],
    shape: BatchShape,
    statement: InsertStatement,
    chunk_size: usize,
    position: usize,
}

impl<'a> InsertPlan<'a> {
    /// Table and columns shared by every chunk
    pub fn shape(&self) -> &BatchShape {
        &self.shape
    }

    /// Total number of rows in the batch
    pub fn total_rows(&self) -> usize {
        self.rows.len()
    }

    /// Number of chunks the batch splits into
    pub fn chunk_count(&self) -> usize {
        self.rows.len().div_ceil(self.chunk_size)
    }
}

impl<'a> Iterator for InsertPlan<'a> {
    type Item = InsertChunk;

    fn next(&mut self) -> Option<InsertChunk> {
        while let Some(row) = self.rows.get(self.position) {
            self.statement.push_row(row);
            self.position += 1;

            if self.position % self.chunk_size == 0 {
                return Some(self.statement.take());
            }
        }

        if self.statement.is_empty() {
            None
        } else {
            Some(self.statement.take())
        }
    }
}

/// Composes and flushes multi-row inserts against a table registry
#[derive(Debug, Clone)]
pub struct BatchInserter {
    registry: Arc<TableRegistry>,
    options: InsertOptions,
}

impl BatchInserter {
    /// Create an inserter with row validation enabled
    pub fn new(registry: Arc<TableRegistry>, chunk_size: usize) -> Self {
        Self::with_options(registry, InsertOptions::new(chunk_size))
    }

    pub fn with_options(registry: Arc<TableRegistry>, options: InsertOptions) -> Self {
        Self { registry, options }
    }

    pub fn registry(&self) -> &TableRegistry {
        &self.registry
    }

    pub fn options(&self) -> InsertOptions {
        self.options
    }

    /// Derive the batch shape and prepare its chunks without executing anything
    ///
    /// Returns `None` for an empty batch. `table` is required for record rows
    /// and overrides the registered table for entity rows.
    pub fn plan<'a>(&self, table: Option<&str>, rows: &'a [Row]) -> Result<Option<InsertPlan<'a>>> {
        prepare(&self.registry, self.options, table, rows)
    }

    /// Insert `rows`, flushing each chunk through a synchronous executor
    ///
    /// Returns `None` for an empty batch, otherwise the summed affected-row
    /// count of all chunks.
    pub fn insert<E>(&self, table: Option<&str>, rows: &[Row], executor: &mut E) -> Result<Option<u64>>
    where
        E: Executor + ?Sized,
    {
        match self.plan(table, rows)? {
            Some(plan) => flush_all(plan, executor).map(Some),
            None => Ok(None),
        }
    }

    /// Insert `rows`, awaiting each chunk on an asynchronous executor in turn
    pub async fn insert_async<E>(
        &self,
        table: Option<&str>,
        rows: &[Row],
        executor: &mut E,
    ) -> Result<Option<u64>>
    where
        E: AsyncExecutor + ?Sized,
    {
        let Some(plan) = self.plan(table, rows)? else {
            return Ok(None);
        };

        let table = plan.shape().table.clone();
        let chunks = plan.chunk_count();
        let mut affected = 0u64;

        for chunk in plan {
            tracing::debug!(table = %table, chunk = chunk.index, rows = chunk.rows, params = chunk.params.len(), "Flushing chunk");
        tracing::trace!(chunk = chunk.index, types = ?param_types(&chunk), "Chunk parameter types");
            affected += executor
                .execute(&chunk.sql, &chunk.params)
                .await
                .map_err(|e| Error::execution(chunk.index, e))?;
        }

        tracing::info!(table = %table, rows = rows.len(), chunks = chunks, affected = affected, "Batch insert complete");
        Ok(Some(affected))
    }

    /// Insert entities into their registered table
    pub fn insert_entities<T, E>(&self, entities: &[T], executor: &mut E) -> Result<Option<u64>>
    where
        T: Entity,
        E: Executor + ?Sized,
    {
        let rows: Vec<Row> = entities.iter().map(Row::from_entity).collect();
        self.insert(None, &rows, executor)
    }
}

/// Insert `rows` into `table` in chunks of `chunk_size` rows
///
/// `registry` supplies the real columns of entity rows. Returns `None` for
/// empty input without calling `executor`, otherwise the total affected rows.
pub fn batch_insert<E>(
    table: &str,
    rows: &[Row],
    chunk_size: usize,
    registry: &TableRegistry,
    executor: &mut E,
) -> Result<Option<u64>>
where
    E: Executor + ?Sized,
{
    match prepare(registry, InsertOptions::new(chunk_size), Some(table), rows)? {
        Some(plan) => flush_all(plan, executor).map(Some),
        None => Ok(None),
    }
}

fn prepare<'a>(
    registry: &TableRegistry,
    options: InsertOptions,
    table: Option<&str>,
    rows: &'a [Row],
) -> Result<Option<InsertPlan<'a>>> {
    if options.chunk_size == 0 {
        return Err(Error::InvalidArgument(
            "chunk_size must be greater than zero".to_string(),
        ));
    }

    let Some(first) = rows.first() else {
        return Ok(None);
    };

    let shape = columns::discover(first, table, registry)?;
    if options.validate_rows {
        columns::validate(rows, &shape.columns)?;
    }

    let rows_per_chunk = options.chunk_size.min(rows.len());
    let statement = InsertStatement::new(&shape.table, shape.columns.clone(), rows_per_chunk);
    Ok(Some(InsertPlan {
        rows,
        shape,
        statement,
        chunk_size: options.chunk_size,
        position: 0,
    }))
}

fn param_types(chunk: &InsertChunk) -> Vec<&'static str> {
    chunk.params.iter().map(Value::type_name).collect()
}

fn flush_all<E>(plan: InsertPlan<'_>, executor: &mut E) -> Result<u64>
where
    E: Executor + ?Sized,
{
    let table = plan.shape().table.clone();
    let (rows, chunks) = (plan.total_rows(), plan.chunk_count());
    let mut affected = 0u64;

    for chunk in plan {
        tracing::debug!(table = %table, chunk = chunk.index, rows = chunk.rows, params = chunk.params.len(), "Flushing chunk");
        tracing::trace!(chunk = chunk.index, types = ?param_types(&chunk), "Chunk parameter types");
        affected += executor
            .execute(&chunk.sql, &chunk.params)
            .map_err(|e| Error::execution(chunk.index, e))?;
    }

    tracing::info!(table = %table, rows = rows, chunks = chunks, affected = affected, "Batch insert complete");
    Ok(affected)
}
