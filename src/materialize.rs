//! Result materialization
//!
//! Turns raw, nullable, backend-typed result columns into records. Each
//! column is scanned into a nullable slot picked from its backend type name,
//! coerced to the declared type of the matching field, and the per-field
//! values are handed to [`Record::from_values`].

use serde::{Deserialize, Serialize};
use sqlx::any::AnyRow;
use sqlx::{Column, Row, TypeInfo};

use crate::error::{Result, TableError};
use crate::types::{ColumnType, FieldDescriptor, Record};

/// Name and backend type of one result column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub name: String,
    pub type_name: String,
}

impl ColumnInfo {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
        }
    }

    /// Column metadata reported by a fetched row
    pub fn from_row(row: &AnyRow) -> Vec<Self> {
        row.columns()
            .iter()
            .map(|c| Self::new(c.name(), c.type_info().name()))
            .collect()
    }
}

// ============================================================================
// Scan Slots
// ============================================================================

/// Nullable container a column value is decoded into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanSlot {
    Text,
    Bool,
    Int16,
    Int32,
    Int64,
    Float32,
    Float64,
    Bytes,
}

/// Order in which the remaining slots are tried when the preferred one fails
const FALLBACK_ORDER: [ScanSlot; 8] = [
    ScanSlot::Int64,
    ScanSlot::Float64,
    ScanSlot::Bool,
    ScanSlot::Text,
    ScanSlot::Int32,
    ScanSlot::Int16,
    ScanSlot::Float32,
    ScanSlot::Bytes,
];

impl ScanSlot {
    /// Pick a slot from a backend type name
    ///
    /// Unrecognized names decode as text.
    pub fn for_type_name(type_name: &str) -> Self {
        let upper = type_name.trim().to_ascii_uppercase();
        let base = upper.split('(').next().unwrap_or(&upper).trim();

        match base {
            "BOOL" | "BOOLEAN" | "BIT" => ScanSlot::Bool,
            "SMALLINT" | "INT2" | "TINYINT" => ScanSlot::Int16,
            "INT" | "INTEGER" | "INT4" | "MEDIUMINT" | "SERIAL" => ScanSlot::Int32,
            "BIGINT" | "INT8" | "BIGSERIAL" => ScanSlot::Int64,
            "REAL" | "FLOAT4" => ScanSlot::Float32,
            "DOUBLE" | "DOUBLE PRECISION" | "FLOAT" | "FLOAT8" | "NUMERIC" | "DECIMAL" => {
                ScanSlot::Float64
            }
            "BLOB" | "BYTEA" | "BINARY" | "VARBINARY" => ScanSlot::Bytes,
            _ => ScanSlot::Text,
        }
    }

    fn decode(self, row: &AnyRow, index: usize) -> std::result::Result<serde_json::Value, sqlx::Error> {
        use serde_json::Value;

        Ok(match self {
            ScanSlot::Text => row
                .try_get::<Option<String>, _>(index)?
                .map_or(Value::Null, Value::String),
            ScanSlot::Bool => row
                .try_get::<Option<bool>, _>(index)?
                .map_or(Value::Null, Value::Bool),
            ScanSlot::Int16 => row
                .try_get::<Option<i16>, _>(index)?
                .map_or(Value::Null, Value::from),
            ScanSlot::Int32 => row
                .try_get::<Option<i32>, _>(index)?
                .map_or(Value::Null, Value::from),
            ScanSlot::Int64 => row
                .try_get::<Option<i64>, _>(index)?
                .map_or(Value::Null, Value::from),
            ScanSlot::Float32 => row
                .try_get::<Option<f32>, _>(index)?
                .map_or(Value::Null, |f| Value::from(f as f64)),
            ScanSlot::Float64 => row
                .try_get::<Option<f64>, _>(index)?
                .map_or(Value::Null, Value::from),
            ScanSlot::Bytes => match row.try_get::<Option<Vec<u8>>, _>(index)? {
                None => Value::Null,
                Some(bytes) => match String::from_utf8(bytes) {
                    Ok(text) => Value::String(text),
                    Err(e) => Value::from(e.into_bytes()),
                },
            },
        })
    }
}

/// Scan one column, trying the preferred slot first
pub fn scan_column(row: &AnyRow, index: usize, preferred: ScanSlot) -> Result<serde_json::Value> {
    let first_err = match preferred.decode(row, index) {
        Ok(value) => return Ok(value),
        Err(e) => e,
    };

    for slot in FALLBACK_ORDER.into_iter().filter(|s| *s != preferred) {
        if let Ok(value) = slot.decode(row, index) {
            return Ok(value);
        }
    }

    Err(TableError::decode(format!(
        "Cannot scan column {}: {}",
        index, first_err
    )))
}

// ============================================================================
// Coercion
// ============================================================================

/// Coerce a scanned value to the JSON shape of a declared column type
pub fn coerce(column_type: ColumnType, value: serde_json::Value) -> std::result::Result<serde_json::Value, String> {
    use serde_json::Value;

    if value.is_null() {
        return Ok(Value::Null);
    }

    match (column_type, value) {
        (ColumnType::Integer, Value::Number(n)) => {
            if n.is_i64() || n.is_u64() {
                Ok(Value::Number(n))
            } else {
                match n.as_f64() {
                    Some(f) if f.fract() == 0.0 => Ok(Value::from(f as i64)),
                    _ => Err(format!("Cannot convert {} to integer", n)),
                }
            }
        }
        (ColumnType::Integer, Value::String(s)) => s
            .trim()
            .parse::<i64>()
            .map(Value::from)
            .map_err(|_| format!("Cannot convert '{}' to integer", s)),
        (ColumnType::Integer, Value::Bool(b)) => Ok(Value::from(b as i64)),

        (ColumnType::Float, Value::Number(n)) => Ok(Value::Number(n)),
        (ColumnType::Float, Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .map(Value::from)
            .map_err(|_| format!("Cannot convert '{}' to float", s)),

        (ColumnType::Boolean, Value::Bool(b)) => Ok(Value::Bool(b)),
        (ColumnType::Boolean, Value::Number(n)) => match n.as_i64() {
            Some(0) => Ok(Value::Bool(false)),
            Some(1) => Ok(Value::Bool(true)),
            _ => Err(format!("Cannot convert {} to boolean", n)),
        },
        (ColumnType::Boolean, Value::String(s)) => match s.trim().to_lowercase().as_str() {
            "true" | "1" | "yes" | "t" => Ok(Value::Bool(true)),
            "false" | "0" | "no" | "f" => Ok(Value::Bool(false)),
            _ => Err(format!("Cannot convert '{}' to boolean", s)),
        },

        (ColumnType::String, Value::String(s)) => Ok(Value::String(s)),
        (ColumnType::String, Value::Number(n)) => Ok(Value::String(n.to_string())),
        (ColumnType::String, Value::Bool(b)) => Ok(Value::String(b.to_string())),

        (ColumnType::Composite, Value::String(s)) => serde_json::from_str(&s)
            .map_err(|e| format!("Column holds invalid JSON ({}): {}", e, s)),
        (ColumnType::Composite, other) => Ok(other),

        (ty, other) => Err(format!("Type mismatch: expected {:?}, got {}", ty, other)),
    }
}

// ============================================================================
// Row Materialization
// ============================================================================

/// Materialize fetched rows into records
///
/// Column types come from `cached` when it describes a column, otherwise
/// from the row itself. Fields without a matching column decode from null.
pub fn materialize<T: Record>(
    rows: &[AnyRow],
    fields: &[FieldDescriptor],
    cached: &[ColumnInfo],
) -> Result<Vec<T>> {
    let Some(first) = rows.first() else {
        return Ok(Vec::new());
    };

    let reported = ColumnInfo::from_row(first);
    let plan: Vec<Option<(usize, ScanSlot)>> = fields
        .iter()
        .map(|field| {
            let index = reported
                .iter()
                .position(|c| c.name.eq_ignore_ascii_case(&field.name))?;
            let type_name = cached
                .iter()
                .find(|c| c.name.eq_ignore_ascii_case(&field.name))
                .map_or(reported[index].type_name.as_str(), |c| c.type_name.as_str());
            Some((index, ScanSlot::for_type_name(type_name)))
        })
        .collect();

    let mut records = Vec::with_capacity(rows.len());
    for row in rows {
        let mut values = Vec::with_capacity(fields.len());
        for (field, step) in fields.iter().zip(&plan) {
            let value = match step {
                Some((index, slot)) => {
                    let raw = scan_column(row, *index, *slot).map_err(|e| {
                        TableError::decode(format!("Field '{}': {}", field.field, e))
                    })?;
                    coerce(field.column_type, raw).map_err(|e| {
                        TableError::decode(format!("Field '{}': {}", field.field, e))
                    })?
                }
                None => serde_json::Value::Null,
            };
            values.push(value);
        }
        records.push(T::from_values(values)?);
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    // =========================================================================
    // Slot Selection Tests
    // =========================================================================

    #[test]
    fn test_slot_text_types() {
        for name in ["VARCHAR", "TEXT", "UUID", "TIMESTAMP", "varchar(255)", "JSON"] {
            assert_eq!(ScanSlot::for_type_name(name), ScanSlot::Text, "{}", name);
        }
    }

    #[test]
    fn test_slot_integer_types() {
        assert_eq!(ScanSlot::for_type_name("INT4"), ScanSlot::Int32);
        assert_eq!(ScanSlot::for_type_name("INTEGER"), ScanSlot::Int32);
        assert_eq!(ScanSlot::for_type_name("bigint"), ScanSlot::Int64);
        assert_eq!(ScanSlot::for_type_name("INT8"), ScanSlot::Int64);
        assert_eq!(ScanSlot::for_type_name("SMALLINT"), ScanSlot::Int16);
    }

    #[test]
    fn test_slot_other_types() {
        assert_eq!(ScanSlot::for_type_name("BOOL"), ScanSlot::Bool);
        assert_eq!(ScanSlot::for_type_name("BOOLEAN"), ScanSlot::Bool);
        assert_eq!(ScanSlot::for_type_name("DOUBLE"), ScanSlot::Float64);
        assert_eq!(ScanSlot::for_type_name("REAL"), ScanSlot::Float32);
        assert_eq!(ScanSlot::for_type_name("BLOB"), ScanSlot::Bytes);
    }

    #[test]
    fn test_slot_unknown_falls_back_to_text() {
        assert_eq!(ScanSlot::for_type_name("GEOMETRY"), ScanSlot::Text);
        assert_eq!(ScanSlot::for_type_name(""), ScanSlot::Text);
        assert_eq!(ScanSlot::for_type_name("NULL"), ScanSlot::Text);
    }

    // =========================================================================
    // Coercion Tests
    // =========================================================================

    #[test]
    fn test_coerce_null_passes_through() {
        assert_eq!(coerce(ColumnType::Integer, json!(null)).unwrap(), json!(null));
        assert_eq!(coerce(ColumnType::Composite, json!(null)).unwrap(), json!(null));
    }

    #[test]
    fn test_coerce_integer() {
        assert_eq!(coerce(ColumnType::Integer, json!(30)).unwrap(), json!(30));
        assert_eq!(coerce(ColumnType::Integer, json!("42")).unwrap(), json!(42));
        assert_eq!(coerce(ColumnType::Integer, json!(3.0)).unwrap(), json!(3));
        assert!(coerce(ColumnType::Integer, json!("abc")).is_err());
        assert!(coerce(ColumnType::Integer, json!(2.5)).is_err());
    }

    #[test]
    fn test_coerce_boolean() {
        assert_eq!(coerce(ColumnType::Boolean, json!(1)).unwrap(), json!(true));
        assert_eq!(coerce(ColumnType::Boolean, json!(0)).unwrap(), json!(false));
        assert_eq!(coerce(ColumnType::Boolean, json!("yes")).unwrap(), json!(true));
        assert_eq!(coerce(ColumnType::Boolean, json!("FALSE")).unwrap(), json!(false));
        assert!(coerce(ColumnType::Boolean, json!(7)).is_err());
        assert!(coerce(ColumnType::Boolean, json!("maybe")).is_err());
    }

    #[test]
    fn test_coerce_float() {
        assert_eq!(coerce(ColumnType::Float, json!(2)).unwrap(), json!(2));
        assert_eq!(coerce(ColumnType::Float, json!("1.25")).unwrap(), json!(1.25));
    }

    #[test]
    fn test_coerce_string() {
        assert_eq!(coerce(ColumnType::String, json!("NY")).unwrap(), json!("NY"));
        assert_eq!(coerce(ColumnType::String, json!(12)).unwrap(), json!("12"));
    }

    #[test]
    fn test_coerce_composite_parses_json_text() {
        let value = coerce(ColumnType::Composite, json!(r#"{"city":"NY","tags":["a"]}"#)).unwrap();
        assert_eq!(value, json!({"city": "NY", "tags": ["a"]}));

        let quoted = coerce(ColumnType::Composite, json!(r#""Red""#)).unwrap();
        assert_eq!(quoted, json!("Red"));
    }

    #[test]
    fn test_coerce_composite_invalid_json() {
        let err = coerce(ColumnType::Composite, json!("{not json")).unwrap_err();
        assert!(err.contains("invalid JSON"));
    }

    #[test]
    fn test_coerce_mismatch() {
        assert!(coerce(ColumnType::String, json!([1, 2])).is_err());
    }

    // =========================================================================
    // ColumnInfo Tests
    // =========================================================================

    #[test]
    fn test_column_info_serialization() {
        let info = ColumnInfo::new("age", "INTEGER");
        let json = serde_json::to_string(&info).unwrap();
        assert_eq!(json, r#"{"name":"age","type_name":"INTEGER"}"#);
    }
}
