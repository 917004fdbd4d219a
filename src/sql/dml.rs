//! DML statement building
//!
//! Column lists are rendered once per table; each call only renders the
//! row-specific part (placeholders, bound values, literals).

use crate::dialect::Dialect;
use crate::error::{Result, TableError};
use crate::sql::value::SqlValue;
use crate::types::{ColumnType, RecordShape};

/// SQL text plus its positional parameters
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<SqlValue>,
    /// Declared column type of each parameter, used to type bound NULLs
    pub param_types: Vec<ColumnType>,
}

impl Statement {
    fn new(sql: String, params: Vec<SqlValue>, param_types: Vec<ColumnType>) -> Self {
        Self {
            sql,
            params,
            param_types,
        }
    }
}

/// Builds INSERT/SELECT/DELETE statements for one table
#[derive(Debug, Clone)]
pub struct StatementBuilder {
    dialect: Dialect,
    table_name: String,
    quoted_table: String,
    shape: RecordShape,
    select_list: String,
    insert_list: String,
}

impl StatementBuilder {
    pub fn new(dialect: Dialect, table_name: impl Into<String>, shape: RecordShape) -> Self {
        let table_name = table_name.into();
        let quoted_table = dialect.quote_identifier(&table_name);

        let select_list = shape
            .fields
            .iter()
            .map(|f| dialect.select_expression(&f.name, f.column_type))
            .collect::<Vec<_>>()
            .join(", ");

        let insert_list = shape
            .insert_fields()
            .map(|(_, f)| dialect.quote_identifier(&f.name))
            .collect::<Vec<_>>()
            .join(", ");

        Self {
            dialect,
            table_name,
            quoted_table,
            shape,
            select_list,
            insert_list,
        }
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn shape(&self) -> &RecordShape {
        &self.shape
    }

    /// Comma-joined SELECT column list
    pub fn select_list(&self) -> &str {
        &self.select_list
    }

    /// Comma-joined INSERT column list (auto-increment columns excluded)
    pub fn insert_list(&self) -> &str {
        &self.insert_list
    }

    /// `SELECT <columns> FROM <table>`
    pub fn select_all(&self) -> Statement {
        Statement::new(
            format!("SELECT {} FROM {}", self.select_list, self.quoted_table),
            Vec::new(),
            Vec::new(),
        )
    }

    /// SELECT filtered on the identity column
    pub fn select_by_id(&self, id: i64) -> Statement {
        self.select_where(self.shape.identity, SqlValue::Integer(id))
    }

    /// SELECT filtered on the display-name column
    pub fn select_by_name(&self, name: &str) -> Statement {
        self.select_where(self.shape.display, SqlValue::Text(name.to_string()))
    }

    /// DELETE filtered on the identity column
    pub fn delete_by_id(&self, id: i64) -> Statement {
        self.delete_where(self.shape.identity, SqlValue::Integer(id))
    }

    /// DELETE filtered on the display-name column
    pub fn delete_by_name(&self, name: &str) -> Statement {
        self.delete_where(self.shape.display, SqlValue::Text(name.to_string()))
    }

    /// Single-row INSERT with bound parameters
    ///
    /// `values` are the record's field values in declaration order.
    pub fn insert(&self, values: &[serde_json::Value]) -> Result<Statement> {
        let params = self.insert_values(values)?;
        let param_types = self
            .shape
            .insert_fields()
            .map(|(_, f)| f.column_type)
            .collect();
        let placeholders = self
            .shape
            .insert_fields()
            .enumerate()
            .map(|(i, (_, f))| self.dialect.value_placeholder(i + 1, f.column_type))
            .collect::<Vec<_>>()
            .join(", ");

        Ok(Statement::new(
            format!(
                "INSERT INTO {} ({}) VALUES ({})",
                self.quoted_table, self.insert_list, placeholders
            ),
            params,
            param_types,
        ))
    }

    /// Semicolon-joined INSERT statements with inline literals
    ///
    /// Each row becomes its own statement so the batch runs as one
    /// multi-statement execution.
    pub fn insert_batch(&self, rows: &[Vec<serde_json::Value>]) -> Result<String> {
        let mut statements = Vec::with_capacity(rows.len());
        for values in rows {
            let literals = self
                .insert_values(values)?
                .iter()
                .map(|v| v.to_literal(self.dialect))
                .collect::<Vec<_>>()
                .join(", ");
            statements.push(format!(
                "INSERT INTO {} ({}) VALUES ({});",
                self.quoted_table, self.insert_list, literals
            ));
        }
        Ok(statements.join("\n"))
    }

    fn insert_values(&self, values: &[serde_json::Value]) -> Result<Vec<SqlValue>> {
        if values.len() != self.shape.fields.len() {
            return Err(TableError::decode(format!(
                "Expected {} field values for table '{}', got {}",
                self.shape.fields.len(),
                self.table_name,
                values.len()
            )));
        }

        self.shape
            .insert_fields()
            .map(|(i, f)| SqlValue::from_field(f.column_type, &f.field, &values[i]))
            .collect()
    }

    fn select_where(&self, field: usize, value: SqlValue) -> Statement {
        let field = &self.shape.fields[field];
        let column = self.dialect.quote_identifier(&field.name);
        Statement::new(
            format!(
                "SELECT {} FROM {} WHERE {} = {}",
                self.select_list,
                self.quoted_table,
                column,
                self.dialect.placeholder(1)
            ),
            vec![value],
            vec![field.column_type],
        )
    }

    fn delete_where(&self, field: usize, value: SqlValue) -> Statement {
        let field = &self.shape.fields[field];
        let column = self.dialect.quote_identifier(&field.name);
        Statement::new(
            format!(
                "DELETE FROM {} WHERE {} = {}",
                self.quoted_table,
                column,
                self.dialect.placeholder(1)
            ),
            vec![value],
            vec![field.column_type],
        )
    }
}
