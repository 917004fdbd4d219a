//! SQL rendering
//!
//! Schema generation, statement building, value serialization and
//! identifier validation.

pub mod ddl;
pub mod dml;
pub mod sanitize;
pub mod value;

pub use ddl::DdlGenerator;
pub use dml::{Statement, StatementBuilder};
pub use sanitize::validate_identifier;
pub use value::SqlValue;
