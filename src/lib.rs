//! # tableio
//!
//! A typed table-mapping layer over relational backends.
//!
//! Derive [`Record`] on a plain struct and get a [`Table`] handle that creates
//! and drops the matching table, inserts records and reads them back. Table
//! and column names, schema DDL and DML are derived from the struct; no SQL
//! or per-field marshaling code is written by hand.
//!
//! ## Features
//!
//! - **Compile-time introspection**: `#[derive(Record)]` emits the field
//!   descriptors and value conversions for a struct
//! - **Dialect-aware SQL**: SQLite, MySQL, PostgreSQL and SQL Server
//!   identifier quoting, identity columns and column types
//! - **Idempotent schema operations**: `CREATE TABLE IF NOT EXISTS` and
//!   `DROP TABLE IF EXISTS` (or SQL Server's `OBJECT_ID` guard)
//! - **Composite fields**: nested structs, collections and enums are stored
//!   as JSON documents and decoded back into their Rust types
//! - **Bound parameters**: single inserts, lookups and deletes never embed
//!   values into SQL text
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use serde::{Deserialize, Serialize};
//! use tableio::{Record, Table};
//!
//! #[derive(Debug, Clone, Serialize, Deserialize)]
//! struct Address {
//!     street: String,
//!     city: String,
//! }
//!
//! #[derive(Debug, Record)]
//! struct Person {
//!     #[table(flags = "pk,auto")]
//!     id: i64,
//!     #[table(flags = "required")]
//!     name: String,
//!     age: i32,
//!     address: Option<Address>,
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut people = Table::<Person>::open("sqlite3", "people.db").await?;
//!     people.create_table_if_not_exists().await?;
//!
//!     people
//!         .insert(&Person { id: 0, name: "John".into(), age: 30, address: None })
//!         .await?;
//!
//!     for person in people.by_name("John").await? {
//!         println!("{:?}", person);
//!     }
//!
//!     people.close().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration
//!
//! Handles are configured using `TableConfig`:
//!
//! ```rust
//! use tableio::{Dialect, TableConfig};
//!
//! let config = TableConfig::builder("postgres://localhost/mydb")
//!     .dialect(Dialect::Postgres) // Inferred from the URL when omitted
//!     .table_name("staff")        // Overrides the derived table name
//!     .verbose(true)              // Log statements at info level
//!     .build();
//! ```
//!
//! ## Record Shape
//!
//! A record needs an integer identity field (flagged `pk`, or named `id`)
//! and a string display-name field (a column named `name`). Handles for
//! records without them are rejected before connecting.

extern crate self as tableio;

pub mod config;
pub mod dialect;
pub mod error;
pub mod materialize;
pub mod naming;
pub mod sql;
pub mod table;
pub mod types;

// Re-export main types for convenience
pub use config::{TableConfig, TableConfigBuilder};
pub use dialect::Dialect;
pub use error::{Result, TableError};
pub use materialize::ColumnInfo;
pub use table::{Table, TableState};
pub use types::{ColumnType, FieldDescriptor, Record, RecordShape};

/// Derive [`Record`] for a struct with named fields
pub use tableio_derive::Record;

// Re-export SQL utilities for advanced users
pub use sql::{DdlGenerator, SqlValue, Statement, StatementBuilder, validate_identifier};
