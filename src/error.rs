//! Error types for table operations

use thiserror::Error;

/// Errors that can occur while building or using a table handle
#[derive(Debug, Error)]
pub enum TableError {
    /// The record type cannot be mapped to a table
    #[error("Shape error: {0}")]
    Shape(String),

    /// The backend could not be reached
    #[error("Connection error: {0}")]
    Connection(String),

    /// Invalid handle configuration (unknown dialect, bad driver name)
    #[error("Configuration error: {0}")]
    Config(String),

    /// DDL execution failed
    #[error("Schema error on table '{table}': {source}")]
    Schema {
        table: String,
        #[source]
        source: sqlx::Error,
    },

    /// DML or query execution failed
    #[error("Statement error: {0}")]
    Statement(#[from] sqlx::Error),

    /// A result row could not be turned into a record
    #[error("Decode error: {0}")]
    Decode(String),

    /// The handle was used after `close`
    #[error("Table handle is closed")]
    Closed,

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl TableError {
    pub fn shape(msg: impl Into<String>) -> Self {
        Self::Shape(msg.into())
    }

    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    pub fn schema(table: impl Into<String>, source: sqlx::Error) -> Self {
        Self::Schema {
            table: table.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, TableError>;
