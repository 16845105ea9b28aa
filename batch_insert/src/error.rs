//! Error types for batch_insert

use thiserror::Error;

/// Result type for batch_insert operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for batch_insert
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A row is neither a record nor a registered entity
    #[error("Unsupported row shape: {0}")]
    UnsupportedRowShape(String),

    /// A later row does not match the shape derived from the first row
    #[error("Row {row} does not match the batch shape: {reason}")]
    RowShapeMismatch { row: usize, reason: String },

    #[error("Entity `{0}` has no table mapping in the registry")]
    UnknownEntity(String),

    /// The injected executor failed while flushing a chunk
    #[error("Executing chunk {chunk} failed: {source}")]
    ExecutionFailure {
        chunk: usize,
        #[source]
        source: Box<Error>,
    },

    /// The execution capability cannot be used at all
    #[error("Executor unavailable: {0}")]
    ExecutorUnavailable(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl Error {
    /// Wrap an executor error with the index of the chunk it was flushing
    ///
    /// `ExecutorUnavailable` is returned as is: nothing was executed.
    pub fn execution(chunk: usize, source: Error) -> Self {
        match source {
            Error::ExecutorUnavailable(_) => source,
            source => Error::ExecutionFailure {
                chunk,
                source: Box::new(source),
            },
        }
    }
}

/// Convert Serde JSON errors to batch_insert errors
impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Error::SerializationError(error.to_string())
    }
}

/// Convert Serde YAML errors to batch_insert errors
impl From<serde_yaml::Error> for Error {
    fn from(error: serde_yaml::Error) -> Self {
        Error::SerializationError(error.to_string())
    }
}

/// Convert TOML deserialization errors to batch_insert errors
impl From<toml::de::Error> for Error {
    fn from(error: toml::de::Error) -> Self {
        Error::ConfigError(error.to_string())
    }
}
