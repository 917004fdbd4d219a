//! SQL dialect rules
//!
//! Everything that differs between backend families lives here: identifier
//! quoting, parameter placeholders, identity-column syntax and column types.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TableError;
use crate::types::ColumnType;

/// Backend family used to render SQL text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// Embedded file database (SQLite)
    Sqlite,
    /// MySQL / MariaDB
    MySql,
    /// PostgreSQL
    Postgres,
    /// Microsoft SQL Server
    SqlServer,
}

impl Dialect {
    /// Canonical driver name
    pub fn name(&self) -> &'static str {
        match self {
            Dialect::Sqlite => "sqlite",
            Dialect::MySql => "mysql",
            Dialect::Postgres => "postgres",
            Dialect::SqlServer => "mssql",
        }
    }

    /// Infer the dialect from a connection URL scheme
    ///
    /// ```
    /// use tableio::Dialect;
    ///
    /// assert_eq!(Dialect::from_url("postgres://localhost/db").unwrap(), Dialect::Postgres);
    /// assert_eq!(Dialect::from_url("sqlite::memory:").unwrap(), Dialect::Sqlite);
    /// ```
    pub fn from_url(url: &str) -> Result<Self, TableError> {
        let scheme = url
            .split_once(':')
            .map(|(scheme, _)| scheme)
            .ok_or_else(|| TableError::config(format!("URL '{}' has no scheme", url)))?;
        scheme.parse()
    }

    /// Quote an identifier, doubling any embedded closing quote
    pub fn quote_identifier(&self, name: &str) -> String {
        match self {
            Dialect::Sqlite | Dialect::Postgres => format!("\"{}\"", name.replace('"', "\"\"")),
            Dialect::MySql => format!("`{}`", name.replace('`', "``")),
            Dialect::SqlServer => format!("[{}]", name.replace(']', "]]")),
        }
    }

    /// Positional parameter placeholder (1-based index)
    pub fn placeholder(&self, index: usize) -> String {
        match self {
            Dialect::Postgres => format!("${}", index),
            Dialect::Sqlite | Dialect::MySql => "?".to_string(),
            Dialect::SqlServer => format!("@p{}", index),
        }
    }

    /// Column definition for an auto-increment primary key, minus the name
    pub fn identity_column(&self) -> &'static str {
        match self {
            Dialect::Sqlite => "INTEGER PRIMARY KEY AUTOINCREMENT",
            Dialect::MySql => "INT PRIMARY KEY AUTO_INCREMENT",
            Dialect::Postgres => "SERIAL PRIMARY KEY",
            Dialect::SqlServer => "INT PRIMARY KEY IDENTITY(1,1)",
        }
    }

    /// Column type for a declared field type
    ///
    /// Integer fields are declared `INTEGER` on every dialect, which is 32 bits
    /// wide on PostgreSQL, MySQL and SQL Server. Values outside that range only
    /// round-trip on SQLite. Booleans are stored as 0/1 `INTEGER` on SQLite,
    /// since the `Any` driver cannot decode SQLite's `BOOLEAN` affinity.
    pub fn column_type(&self, column_type: ColumnType) -> &'static str {
        match (column_type, self) {
            (ColumnType::String, Dialect::SqlServer) => "NVARCHAR(255)",
            (ColumnType::String, _) => "VARCHAR(255)",
            (ColumnType::Integer, _) => "INTEGER",
            (ColumnType::Float, Dialect::Sqlite) => "REAL",
            (ColumnType::Float, Dialect::MySql) => "DOUBLE",
            (ColumnType::Float, Dialect::Postgres) => "DOUBLE PRECISION",
            (ColumnType::Float, Dialect::SqlServer) => "FLOAT",
            (ColumnType::Boolean, Dialect::Sqlite) => "INTEGER",
            (ColumnType::Boolean, Dialect::SqlServer) => "BIT",
            (ColumnType::Boolean, _) => "BOOLEAN",
            (ColumnType::Composite, Dialect::Sqlite) => "TEXT",
            (ColumnType::Composite, Dialect::SqlServer) => "NVARCHAR(MAX)",
            (ColumnType::Composite, Dialect::MySql | Dialect::Postgres) => "JSON",
        }
    }

    /// Expression used to read a column in a SELECT list
    ///
    /// Native JSON columns are read back as text so every backend hands the
    /// materializer the same JSON string.
    pub fn select_expression(&self, column: &str, column_type: ColumnType) -> String {
        let quoted = self.quote_identifier(column);
        match (column_type, self) {
            (ColumnType::Composite, Dialect::Postgres) => {
                format!("CAST({} AS TEXT) AS {}", quoted, quoted)
            }
            (ColumnType::Composite, Dialect::MySql) => {
                format!("CAST({} AS CHAR) AS {}", quoted, quoted)
            }
            _ => quoted,
        }
    }

    /// Placeholder used to write a value into a column
    pub fn value_placeholder(&self, index: usize, column_type: ColumnType) -> String {
        let placeholder = self.placeholder(index);
        match (column_type, self) {
            (ColumnType::Composite, Dialect::Postgres) => format!("CAST({} AS JSON)", placeholder),
            _ => placeholder,
        }
    }

    /// Boolean literal
    pub fn bool_literal(&self, value: bool) -> &'static str {
        match (self, value) {
            (Dialect::Postgres | Dialect::MySql, true) => "TRUE",
            (Dialect::Postgres | Dialect::MySql, false) => "FALSE",
            (Dialect::Sqlite | Dialect::SqlServer, true) => "1",
            (Dialect::Sqlite | Dialect::SqlServer, false) => "0",
        }
    }

    /// Single-quoted string literal
    pub fn string_literal(&self, value: &str) -> String {
        let escaped = value.replace('\'', "''");
        match self {
            // MySQL treats backslash as an escape character inside literals
            Dialect::MySql => format!("'{}'", escaped.replace('\\', "\\\\")),
            Dialect::SqlServer => format!("N'{}'", escaped),
            _ => format!("'{}'", escaped),
        }
    }
}

impl FromStr for Dialect {
    type Err = TableError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sqlite" | "sqlite3" => Ok(Dialect::Sqlite),
            "mysql" | "mariadb" => Ok(Dialect::MySql),
            "postgres" | "postgresql" | "pg" => Ok(Dialect::Postgres),
            "mssql" | "sqlserver" => Ok(Dialect::SqlServer),
            other => Err(TableError::config(format!(
                "Unknown dialect '{}'. Supported: sqlite, mysql, postgres, mssql",
                other
            ))),
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
