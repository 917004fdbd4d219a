//! Table - typed handle over one backend table
//!
//! A `Table<T>` owns a single backend connection and maps record type `T`
//! onto one table: it creates and drops the table, inserts records and
//! materializes query results back into `T`.

use std::marker::PhantomData;

use sqlx::any::{AnyArguments, AnyRow};
use sqlx::query::Query;
use sqlx::{Any, AnyConnection, Column, Connection, Executor, TypeInfo};

use crate::config::TableConfig;
use crate::dialect::Dialect;
use crate::error::{Result, TableError};
use crate::materialize::{self, ColumnInfo};
use crate::sql::{DdlGenerator, SqlValue, Statement, StatementBuilder, validate_identifier};
use crate::types::{ColumnType, FieldDescriptor, Record, RecordShape};

/// Lifecycle state of a table handle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableState {
    /// Connected; the table may not exist yet
    Constructed,
    /// `create_table_if_not_exists` succeeded
    SchemaReady,
    /// Connection released, every operation fails with [`TableError::Closed`]
    Closed,
}

/// Typed table handle
///
/// Every operation takes `&mut self`, so one handle is only ever driven by
/// one caller at a time. Operations issue exactly one request to the backend
/// and return once it has answered.
pub struct Table<T: Record> {
    conn: Option<AnyConnection>,
    builder: StatementBuilder,
    column_types: Vec<ColumnInfo>,
    state: TableState,
    verbose: bool,
    _record: PhantomData<fn() -> T>,
}

impl<T: Record> Table<T> {
    /// Connect a table handle from configuration
    ///
    /// This will:
    /// 1. Validate the record shape (no I/O happens if this fails)
    /// 2. Connect to the database and check the connection
    /// 3. Snapshot the column types if the table already exists
    pub async fn connect(config: TableConfig) -> Result<Self> {
        let shape = RecordShape::new(T::TYPE_NAME, T::fields())?;

        let table_name = config.table_name.clone().unwrap_or_else(T::table_name);
        validate_identifier(&table_name).map_err(|e| {
            TableError::shape(format!("{} table name: {}", T::TYPE_NAME, e))
        })?;
        for field in &shape.fields {
            validate_identifier(&field.name).map_err(|e| {
                TableError::shape(format!("{}.{}: {}", T::TYPE_NAME, field.field, e))
            })?;
        }

        let dialect = config.resolve_dialect()?;
        if let Ok(scheme) = Dialect::from_url(&config.database_url) {
            if scheme != dialect {
                return Err(TableError::config(format!(
                    "Dialect '{}' does not match connection URL scheme '{}'",
                    dialect, scheme
                )));
            }
        }
        if dialect == Dialect::SqlServer {
            return Err(TableError::connection(
                "No SQL Server driver is available; mssql statements can be rendered but not executed",
            ));
        }

        sqlx::any::install_default_drivers();
        let mut conn = AnyConnection::connect(&config.database_url)
            .await
            .map_err(|e| TableError::connection(format!("Database connection failed: {}", e)))?;
        conn.ping()
            .await
            .map_err(|e| TableError::connection(format!("Database ping failed: {}", e)))?;

        tracing::debug!("Connected {} table handle for '{}'", dialect, table_name);

        let mut table = Self {
            conn: Some(conn),
            builder: StatementBuilder::new(dialect, table_name, shape),
            column_types: Vec::new(),
            state: TableState::Constructed,
            verbose: config.verbose,
            _record: PhantomData,
        };

        // A missing table only leaves the cache empty until create
        table.refresh_column_types().await;

        Ok(table)
    }

    /// Connect from a driver name and driver-style DSN
    ///
    /// `Table::<Shape>::open("sqlite3", "test.db")` opens (creating if
    /// needed) the SQLite file `test.db`.
    pub async fn open(driver: &str, dsn: &str) -> Result<Self> {
        Self::connect(TableConfig::from_driver(driver, dsn)?).await
    }

    // =========================================================================
    // Introspection
    // =========================================================================

    pub fn table_name(&self) -> &str {
        self.builder.table_name()
    }

    pub fn dialect(&self) -> Dialect {
        self.builder.dialect()
    }

    /// Field descriptors in declaration order
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.builder.shape().fields
    }

    pub fn state(&self) -> TableState {
        self.state
    }

    pub fn select_list(&self) -> &str {
        self.builder.select_list()
    }

    pub fn insert_list(&self) -> &str {
        self.builder.insert_list()
    }

    /// Cached backend column types (empty until the table exists)
    pub fn column_types(&self) -> &[ColumnInfo] {
        &self.column_types
    }

    pub fn create_table_sql(&self) -> String {
        DdlGenerator::new(self.dialect()).generate_create_table(self.table_name(), self.fields())
    }

    pub fn drop_table_sql(&self) -> String {
        DdlGenerator::new(self.dialect()).generate_drop_table(self.table_name())
    }

    // =========================================================================
    // Schema Operations
    // =========================================================================

    /// Create the table unless it already exists, then refresh the column
    /// type cache
    pub async fn create_table_if_not_exists(&mut self) -> Result<()> {
        self.ensure_open()?;
        let sql = self.create_table_sql();
        let table = self.table_name().to_string();
        self.log_sql(&sql);

        let conn = self.connection()?;
        sqlx::raw_sql(&sql)
            .execute(&mut *conn)
            .await
            .map_err(|e| TableError::schema(table, e))?;

        self.refresh_column_types().await;
        self.state = TableState::SchemaReady;
        Ok(())
    }

    /// Drop the table if it exists and clear the column type cache
    pub async fn drop_table_if_exists(&mut self) -> Result<()> {
        self.ensure_open()?;
        let sql = self.drop_table_sql();
        let table = self.table_name().to_string();
        self.log_sql(&sql);

        let conn = self.connection()?;
        sqlx::raw_sql(&sql)
            .execute(&mut *conn)
            .await
            .map_err(|e| TableError::schema(table, e))?;

        self.column_types.clear();
        self.state = TableState::Constructed;
        Ok(())
    }

    // =========================================================================
    // Write Operations
    // =========================================================================

    /// Insert one record
    ///
    /// Auto-increment fields are skipped; the backend assigns them.
    pub async fn insert(&mut self, record: &T) -> Result<()> {
        self.ensure_open()?;
        let stmt = self.builder.insert(&record.to_values()?)?;
        self.log_statement(&stmt);

        let conn = self.connection()?;
        bind_statement(&stmt).execute(&mut *conn).await?;
        Ok(())
    }

    /// Insert records as one multi-statement execution
    ///
    /// The records are rendered into semicolon-joined INSERT statements with
    /// inline literals and sent in a single call. If a statement fails, the
    /// statements before it may already be applied: SQLite and MySQL run the
    /// batch statement by statement, PostgreSQL runs it in one implicit
    /// transaction. An empty slice does nothing.
    pub async fn insert_many(&mut self, records: &[T]) -> Result<()> {
        self.ensure_open()?;
        if records.is_empty() {
            return Ok(());
        }

        let rows = records
            .iter()
            .map(T::to_values)
            .collect::<Result<Vec<_>>>()?;
        let sql = self.builder.insert_batch(&rows)?;
        self.log_sql(&sql);

        let conn = self.connection()?;
        sqlx::raw_sql(&sql).execute(&mut *conn).await?;
        Ok(())
    }

    /// Delete rows by identity value, returning the number removed
    pub async fn delete_by_id(&mut self, id: i64) -> Result<u64> {
        self.ensure_open()?;
        let stmt = self.builder.delete_by_id(id);
        self.execute(stmt).await
    }

    /// Delete rows by display name, returning the number removed
    pub async fn delete_by_name(&mut self, name: &str) -> Result<u64> {
        self.ensure_open()?;
        let stmt = self.builder.delete_by_name(name);
        self.execute(stmt).await
    }

    // =========================================================================
    // Read Operations
    // =========================================================================

    /// All rows, in the order the backend returns them
    pub async fn all(&mut self) -> Result<Vec<T>> {
        self.ensure_open()?;
        let stmt = self.builder.select_all();
        self.fetch(stmt).await
    }

    /// Rows whose identity column equals `id`
    pub async fn by_id(&mut self, id: i64) -> Result<Vec<T>> {
        self.ensure_open()?;
        let stmt = self.builder.select_by_id(id);
        self.fetch(stmt).await
    }

    /// Rows whose display-name column equals `name`
    pub async fn by_name(&mut self, name: &str) -> Result<Vec<T>> {
        self.ensure_open()?;
        let stmt = self.builder.select_by_name(name);
        self.fetch(stmt).await
    }

    /// Run a raw SELECT and materialize its rows into `T`
    ///
    /// Result columns are matched to fields by column name. Fields without a
    /// matching column decode from null. On PostgreSQL and MySQL, composite
    /// columns must be selected as text (see [`Table::select_list`]).
    pub async fn query(&mut self, sql: &str) -> Result<Vec<T>> {
        self.ensure_open()?;
        self.log_sql(sql);
        let conn = self.connection()?;
        let rows: Vec<AnyRow> = sqlx::query::<Any>(sql).fetch_all(&mut *conn).await?;
        materialize::materialize(&rows, self.fields(), &self.column_types)
    }

    // =========================================================================
    // Connection Lifecycle
    // =========================================================================

    /// Check that the backend still answers
    pub async fn ping(&mut self) -> Result<()> {
        let conn = self.connection()?;
        conn.ping()
            .await
            .map_err(|e| TableError::connection(format!("Database ping failed: {}", e)))
    }

    /// Release the connection
    ///
    /// Closing an already closed handle does nothing.
    pub async fn close(&mut self) -> Result<()> {
        let Some(conn) = self.conn.take() else {
            return Ok(());
        };
        self.state = TableState::Closed;
        self.column_types.clear();

        tracing::debug!("Closing table handle for '{}'", self.table_name());
        conn.close()
            .await
            .map_err(|e| TableError::connection(format!("Closing connection failed: {}", e)))
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn ensure_open(&self) -> Result<()> {
        match self.conn {
            Some(_) => Ok(()),
            None => Err(TableError::Closed),
        }
    }

    fn connection(&mut self) -> Result<&mut AnyConnection> {
        self.conn.as_mut().ok_or(TableError::Closed)
    }

    async fn execute(&mut self, stmt: Statement) -> Result<u64> {
        self.log_statement(&stmt);
        let conn = self.connection()?;
        let result = bind_statement(&stmt).execute(&mut *conn).await?;
        Ok(result.rows_affected())
    }

    async fn fetch(&mut self, stmt: Statement) -> Result<Vec<T>> {
        self.log_statement(&stmt);
        let conn = self.connection()?;
        let rows = bind_statement(&stmt).fetch_all(&mut *conn).await?;
        materialize::materialize(&rows, &self.builder.shape().fields, &self.column_types)
    }

    /// Re-snapshot the column types, leaving the cache empty on failure
    ///
    /// An empty cache makes the materializer use the types each result row
    /// reports.
    async fn refresh_column_types(&mut self) {
        match self.load_column_types().await {
            Ok(columns) => self.column_types = columns,
            Err(e) => {
                tracing::debug!("No column types for '{}': {}", self.table_name(), e);
                self.column_types.clear();
            }
        }
    }

    async fn load_column_types(&mut self) -> Result<Vec<ColumnInfo>> {
        let sql = self.builder.select_all().sql;
        let conn = self.connection()?;
        let prepared = conn.prepare(sql.as_str()).await?;
        Ok(sqlx::Statement::columns(&prepared)
            .iter()
            .map(|c| ColumnInfo::new(c.name(), c.type_info().name()))
            .collect())
    }

    fn log_sql(&self, sql: &str) {
        if self.verbose {
            tracing::info!("{}", sql);
        } else {
            tracing::debug!("{}", sql);
        }
    }

    fn log_statement(&self, stmt: &Statement) {
        if stmt.params.is_empty() {
            return self.log_sql(&stmt.sql);
        }
        let params = stmt
            .params
            .iter()
            .map(|p| p.to_literal(self.dialect()))
            .collect::<Vec<_>>()
            .join(", ");
        if self.verbose {
            tracing::info!("{} -- params: [{}]", stmt.sql, params);
        } else {
            tracing::debug!("{} -- params: [{}]", stmt.sql, params);
        }
    }
}

impl<T: Record> std::fmt::Debug for Table<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Table")
            .field("record", &T::TYPE_NAME)
            .field("table_name", &self.table_name())
            .field("dialect", &self.dialect())
            .field("state", &self.state)
            .finish()
    }
}

/// Bind a statement's parameters in order
///
/// NULLs are bound with the declared column type so servers that type their
/// parameters accept them.
fn bind_statement(stmt: &Statement) -> Query<'_, Any, AnyArguments<'_>> {
    let mut query = sqlx::query::<Any>(&stmt.sql);
    for (value, column_type) in stmt.params.iter().zip(&stmt.param_types) {
        query = match value {
            SqlValue::Null => match column_type {
                ColumnType::Integer => query.bind(None::<i64>),
                ColumnType::Float => query.bind(None::<f64>),
                ColumnType::Boolean => query.bind(None::<bool>),
                ColumnType::String | ColumnType::Composite => query.bind(None::<String>),
            },
            SqlValue::Integer(i) => query.bind(*i),
            SqlValue::Float(f) => query.bind(*f),
            SqlValue::Boolean(b) => query.bind(*b),
            SqlValue::Text(s) => query.bind(s.as_str()),
        };
    }
    query
}
