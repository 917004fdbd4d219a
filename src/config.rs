//! Configuration for Table
//!
//! Provides a builder pattern for configuring a table handle.

use std::sync::LazyLock;

use regex::Regex;

use crate::dialect::Dialect;
use crate::error::Result;

/// `user:pass@tcp(host:port)/db` style MySQL DSN
static MYSQL_TCP_DSN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:(?P<auth>[^@]*)@)?(?:tcp|unix)?\((?P<addr>[^)]*)\)(?P<rest>/.*)?$")
        .expect("valid regex")
});

/// Configuration for a table handle
#[derive(Debug, Clone)]
pub struct TableConfig {
    /// Connection URL understood by sqlx (`sqlite:`, `postgres://`, `mysql://`)
    pub database_url: String,
    /// SQL dialect; inferred from the URL scheme when not set
    pub dialect: Option<Dialect>,
    /// Overrides the table name derived from the record type
    pub table_name: Option<String>,
    /// Log generated statements at `info` instead of `debug`
    pub verbose: bool,
}

impl TableConfig {
    /// Create a new configuration builder
    pub fn builder(database_url: impl Into<String>) -> TableConfigBuilder {
        TableConfigBuilder::new(database_url)
    }

    /// Configuration from a driver name and driver-style DSN
    ///
    /// Accepts `sqlite3`/`sqlite`, `mysql`, `postgres` and `mssql`/`sqlserver`.
    /// Bare DSNs are turned into URLs:
    ///
    /// ```
    /// use tableio::{Dialect, TableConfig};
    ///
    /// let config = TableConfig::from_driver("sqlite3", "test.db").unwrap();
    /// assert_eq!(config.database_url, "sqlite:test.db?mode=rwc");
    /// assert_eq!(config.dialect, Some(Dialect::Sqlite));
    /// ```
    pub fn from_driver(driver: &str, dsn: &str) -> Result<Self> {
        let dialect: Dialect = driver.parse()?;
        let url = driver_url(dialect, dsn.trim());
        Ok(TableConfigBuilder::new(url).dialect(dialect).build())
    }

    /// Effective dialect: the explicit one, else the URL scheme's
    pub fn resolve_dialect(&self) -> Result<Dialect> {
        match self.dialect {
            Some(dialect) => Ok(dialect),
            None => Dialect::from_url(&self.database_url),
        }
    }
}

fn driver_url(dialect: Dialect, dsn: &str) -> String {
    match dialect {
        Dialect::Sqlite => {
            if dsn.starts_with("sqlite:") {
                dsn.to_string()
            } else if dsn == ":memory:" || dsn.is_empty() {
                "sqlite::memory:".to_string()
            } else if dsn.contains('?') {
                format!("sqlite:{}", dsn)
            } else {
                format!("sqlite:{}?mode=rwc", dsn)
            }
        }
        Dialect::MySql => {
            if dsn.contains("://") {
                return dsn.to_string();
            }
            match MYSQL_TCP_DSN.captures(dsn) {
                Some(caps) => {
                    let auth = caps.name("auth").map_or("", |m| m.as_str());
                    let addr = caps.name("addr").map_or("", |m| m.as_str());
                    let rest = caps.name("rest").map_or("", |m| m.as_str());
                    if auth.is_empty() {
                        format!("mysql://{}{}", addr, rest)
                    } else {
                        format!("mysql://{}@{}{}", auth, addr, rest)
                    }
                }
                None => format!("mysql://{}", dsn),
            }
        }
        Dialect::Postgres => {
            if dsn.contains("://") {
                dsn.to_string()
            } else {
                format!("postgres://{}", dsn)
            }
        }
        Dialect::SqlServer => {
            if dsn.contains("://") {
                dsn.to_string()
            } else {
                format!("mssql://{}", dsn)
            }
        }
    }
}

/// Builder for TableConfig
#[derive(Debug)]
pub struct TableConfigBuilder {
    database_url: String,
    dialect: Option<Dialect>,
    table_name: Option<String>,
    verbose: bool,
}

impl TableConfigBuilder {
    /// Create a new builder with the database URL
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            dialect: None,
            table_name: None,
            verbose: false,
        }
    }

    /// Set the SQL dialect explicitly
    pub fn dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = Some(dialect);
        self
    }

    /// Override the derived table name
    pub fn table_name(mut self, name: impl Into<String>) -> Self {
        self.table_name = Some(name.into());
        self
    }

    /// Enable or disable verbose statement logging (default: false)
    pub fn verbose(mut self, enabled: bool) -> Self {
        self.verbose = enabled;
        self
    }

    /// Build the configuration
    pub fn build(self) -> TableConfig {
        TableConfig {
            database_url: self.database_url,
            dialect: self.dialect,
            table_name: self.table_name,
            verbose: self.verbose,
        }
    }
}
