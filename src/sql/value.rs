//! Field value serialization
//!
//! Converts the JSON value of one record field into a SQL value according
//! to its declared column type.

use crate::dialect::Dialect;
use crate::error::{Result, TableError};
use crate::types::ColumnType;

/// A single SQL value, bound as a parameter or rendered as a literal
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Text(String),
}

impl SqlValue {
    /// Convert a field value for a column of `column_type`
    ///
    /// Composite values, and any value whose JSON shape does not match the
    /// declared type, are stored as their JSON text.
    pub fn from_field(
        column_type: ColumnType,
        field: &str,
        value: &serde_json::Value,
    ) -> Result<Self> {
        use serde_json::Value;

        if value.is_null() {
            return Ok(SqlValue::Null);
        }

        Ok(match (column_type, value) {
            (ColumnType::Integer, Value::Number(n)) => {
                if let Some(i) = n.as_i64() {
                    SqlValue::Integer(i)
                } else if n.is_u64() {
                    return Err(TableError::decode(format!(
                        "Field '{}' value {} does not fit in a signed 64-bit integer",
                        field, n
                    )));
                } else {
                    SqlValue::Text(n.to_string())
                }
            }
            (ColumnType::Float, Value::Number(n)) => match n.as_f64() {
                Some(f) => SqlValue::Float(f),
                None => SqlValue::Text(n.to_string()),
            },
            (ColumnType::Boolean, Value::Bool(b)) => SqlValue::Boolean(*b),
            (ColumnType::String, Value::String(s)) => SqlValue::Text(s.clone()),
            (_, other) => SqlValue::Text(serde_json::to_string(other)?),
        })
    }

    /// Render as an inline SQL literal
    pub fn to_literal(&self, dialect: Dialect) -> String {
        match self {
            SqlValue::Null => "NULL".to_string(),
            SqlValue::Integer(i) => i.to_string(),
            SqlValue::Float(f) if f.is_finite() => format!("{:?}", f),
            SqlValue::Float(_) => "NULL".to_string(),
            SqlValue::Boolean(b) => dialect.bool_literal(*b).to_string(),
            SqlValue::Text(s) => dialect.string_literal(s),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    // =========================================================================
    // Conversion Tests
    // =========================================================================

    #[test]
    fn test_integer_field() {
        assert_eq!(
            SqlValue::from_field(ColumnType::Integer, "age", &json!(30)).unwrap(),
            SqlValue::Integer(30)
        );
        assert_eq!(
            SqlValue::from_field(ColumnType::Integer, "age", &json!(-7)).unwrap(),
            SqlValue::Integer(-7)
        );
    }

    #[test]
    fn test_integer_overflow_is_error() {
        let err = SqlValue::from_field(ColumnType::Integer, "big", &json!(u64::MAX)).unwrap_err();
        assert!(err.to_string().contains("big"));
    }

    #[test]
    fn test_string_field_kept_verbatim() {
        assert_eq!(
            SqlValue::from_field(ColumnType::String, "name", &json!("O'Brien")).unwrap(),
            SqlValue::Text("O'Brien".to_string())
        );
    }

    #[test]
    fn test_null_for_any_type() {
        for ty in [
            ColumnType::String,
            ColumnType::Integer,
            ColumnType::Float,
            ColumnType::Boolean,
            ColumnType::Composite,
        ] {
            assert_eq!(
                SqlValue::from_field(ty, "x", &json!(null)).unwrap(),
                SqlValue::Null
            );
        }
    }

    #[test]
    fn test_composite_field_is_json_text() {
        let value = json!({"street": "1 Main St", "zip": 10001});
        let sql = SqlValue::from_field(ColumnType::Composite, "address", &value).unwrap();
        match sql {
            SqlValue::Text(text) => {
                let back: serde_json::Value = serde_json::from_str(&text).unwrap();
                assert_eq!(back, value);
            }
            other => panic!("Expected text, got {:?}", other),
        }
    }

    #[test]
    fn test_composite_array_and_string() {
        assert_eq!(
            SqlValue::from_field(ColumnType::Composite, "tags", &json!(["a", "b"])).unwrap(),
            SqlValue::Text(r#"["a","b"]"#.to_string())
        );
        assert_eq!(
            SqlValue::from_field(ColumnType::Composite, "color", &json!("Red")).unwrap(),
            SqlValue::Text(r#""Red""#.to_string())
        );
    }

    #[test]
    fn test_bool_and_float_fields() {
        assert_eq!(
            SqlValue::from_field(ColumnType::Boolean, "active", &json!(true)).unwrap(),
            SqlValue::Boolean(true)
        );
        assert_eq!(
            SqlValue::from_field(ColumnType::Float, "score", &json!(1.5)).unwrap(),
            SqlValue::Float(1.5)
        );
    }

    // =========================================================================
    // Literal Rendering Tests
    // =========================================================================

    #[test]
    fn test_literals() {
        assert_eq!(SqlValue::Null.to_literal(Dialect::Postgres), "NULL");
        assert_eq!(SqlValue::Integer(42).to_literal(Dialect::Sqlite), "42");
        assert_eq!(SqlValue::Float(2.5).to_literal(Dialect::MySql), "2.5");
        assert_eq!(SqlValue::Float(3.0).to_literal(Dialect::MySql), "3.0");
        assert_eq!(SqlValue::Boolean(true).to_literal(Dialect::Sqlite), "1");
        assert_eq!(
            SqlValue::Text("it's".to_string()).to_literal(Dialect::Postgres),
            "'it''s'"
        );
    }

    #[test]
    fn test_non_finite_float_literal_is_null() {
        assert_eq!(SqlValue::Float(f64::NAN).to_literal(Dialect::Sqlite), "NULL");
    }
}
