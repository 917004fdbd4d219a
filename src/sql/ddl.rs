//! DDL Generation
//!
//! Renders dialect-specific, existence-guarded CREATE/DROP TABLE statements
//! from field descriptors.

use crate::dialect::Dialect;
use crate::types::FieldDescriptor;

/// DDL Generator for record tables
pub struct DdlGenerator {
    dialect: Dialect,
}

impl DdlGenerator {
    /// Create a new DDL generator for the given dialect
    pub fn new(dialect: Dialect) -> Self {
        Self { dialect }
    }

    /// Generate an idempotent CREATE TABLE statement
    ///
    /// SQL Server has no `IF NOT EXISTS` clause, so the statement is wrapped
    /// in an `OBJECT_ID` check instead.
    pub fn generate_create_table(&self, table_name: &str, fields: &[FieldDescriptor]) -> String {
        let quoted_table = self.dialect.quote_identifier(table_name);

        let column_defs: Vec<String> = fields
            .iter()
            .map(|field| format!("\t{}", self.format_column_definition(field)))
            .collect();
        let body = format!("(\n{}\n)", column_defs.join(",\n"));

        match self.dialect {
            Dialect::SqlServer => format!(
                "IF OBJECT_ID(N'{}', N'U') IS NULL\nBEGIN\nCREATE TABLE {} {}\nEND",
                quoted_table.replace('\'', "''"),
                quoted_table,
                body
            ),
            _ => format!("CREATE TABLE IF NOT EXISTS {} {}", quoted_table, body),
        }
    }

    /// Generate an idempotent DROP TABLE statement
    pub fn generate_drop_table(&self, table_name: &str) -> String {
        let quoted_table = self.dialect.quote_identifier(table_name);
        match self.dialect {
            Dialect::SqlServer => format!(
                "IF OBJECT_ID(N'{}', N'U') IS NOT NULL DROP TABLE {}",
                quoted_table.replace('\'', "''"),
                quoted_table
            ),
            _ => format!("DROP TABLE IF EXISTS {}", quoted_table),
        }
    }

    /// Format a single column definition for CREATE TABLE
    ///
    /// Identity columns use the dialect's identity syntax and take no further
    /// constraints. Other columns get their mapped type followed by
    /// `PRIMARY KEY`, `NOT NULL`, `UNIQUE`, or an explicit `NULL` when neither
    /// primary key nor required.
    pub fn format_column_definition(&self, field: &FieldDescriptor) -> String {
        let mut parts = vec![self.dialect.quote_identifier(&field.name)];

        if field.is_identity() {
            parts.push(self.dialect.identity_column().to_string());
            return parts.join(" ");
        }

        parts.push(self.dialect.column_type(field.column_type).to_string());

        if field.primary_key {
            parts.push("PRIMARY KEY".to_string());
        }
        if field.required {
            parts.push("NOT NULL".to_string());
        }
        if field.unique {
            parts.push("UNIQUE".to_string());
        }
        if !field.required && !field.primary_key {
            parts.push("NULL".to_string());
        }

        parts.join(" ")
    }
}
