//! Core type definitions
//!
//! Includes column types, per-field descriptors and the `Record` trait that
//! `#[derive(Record)]` implements.

use serde::{Deserialize, Serialize};

use crate::error::{Result, TableError};
use crate::naming;

// ============================================================================
// Column Types
// ============================================================================

/// Declared type class of a record field
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ColumnType {
    /// Text field (maps to a bounded VARCHAR)
    String,

    /// Any integer width (maps to INTEGER)
    Integer,

    /// Floating point field
    Float,

    /// Boolean field
    Boolean,

    /// Struct, collection or anything else; stored as JSON text
    Composite,
}

impl ColumnType {
    /// Whether this type is persisted as a JSON document
    pub fn is_composite(&self) -> bool {
        matches!(self, ColumnType::Composite)
    }
}

// ============================================================================
// Field Descriptors
// ============================================================================

/// Metadata for one persisted field of a record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FieldDescriptor {
    /// Rust field name
    pub field: String,

    /// Column name
    pub name: String,

    /// Declared type class
    #[serde(flatten)]
    pub column_type: ColumnType,

    /// Whether the Rust type is an `Option`
    #[serde(default)]
    pub optional: bool,

    #[serde(default)]
    pub primary_key: bool,

    #[serde(default)]
    pub auto_increment: bool,

    #[serde(default)]
    pub unique: bool,

    #[serde(default)]
    pub required: bool,
}

impl FieldDescriptor {
    /// Create a descriptor with no flags set
    pub fn new(field: impl Into<String>, name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            field: field.into(),
            name: name.into(),
            column_type,
            optional: false,
            primary_key: false,
            auto_increment: false,
            unique: false,
            required: false,
        }
    }

    /// Apply a comma-separated annotation string such as `"pk,auto"`
    ///
    /// Tokens are trimmed and case-insensitive; unknown tokens are ignored.
    pub fn with_flags(mut self, flags: &str) -> Self {
        for token in flags.split(',') {
            match token.trim().to_ascii_lowercase().as_str() {
                "pk" | "primarykey" => self.primary_key = true,
                "auto" | "autoincrement" => self.auto_increment = true,
                "unique" => self.unique = true,
                "required" | "notnull" => self.required = true,
                _ => {}
            }
        }
        self
    }

    /// Mark the field as `Option<_>`
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    pub fn auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Whether the backend assigns this column (both pk and auto)
    pub fn is_identity(&self) -> bool {
        self.primary_key && self.auto_increment
    }
}

// ============================================================================
// Record Trait
// ============================================================================

/// A struct that maps onto one table row
///
/// Implement it with `#[derive(Record)]`; hand-written impls must keep
/// `fields`, `to_values` and `from_values` in the same field order.
pub trait Record: Sized {
    /// Bare type name, used to derive the table name
    const TYPE_NAME: &'static str;

    /// Field metadata in declaration order
    fn fields() -> Vec<FieldDescriptor>;

    /// Physical table name
    fn table_name() -> String {
        naming::table_name(Self::TYPE_NAME)
    }

    /// Field values in declaration order
    fn to_values(&self) -> Result<Vec<serde_json::Value>>;

    /// Rebuild a record from values in declaration order
    fn from_values(values: Vec<serde_json::Value>) -> Result<Self>;
}

// ============================================================================
// Shape Validation
// ============================================================================

/// Validated field metadata of a record type
#[derive(Debug, Clone, PartialEq)]
pub struct RecordShape {
    /// All persisted fields, declaration order
    pub fields: Vec<FieldDescriptor>,
    /// Index of the identity field
    pub identity: usize,
    /// Index of the display-name field
    pub display: usize,
}

impl RecordShape {
    /// Validate the descriptors of `type_name`
    ///
    /// The identity field is the first integer field flagged `pk`, or failing
    /// that an integer field named `id`. The display-name field is a string
    /// field named `name`.
    pub fn new(type_name: &str, fields: Vec<FieldDescriptor>) -> Result<Self> {
        if fields.is_empty() {
            return Err(TableError::shape(format!(
                "{} has no persisted fields",
                type_name
            )));
        }

        for (i, field) in fields.iter().enumerate() {
            if field.name.is_empty() {
                return Err(TableError::shape(format!(
                    "{}.{} maps to an empty column name",
                    type_name, field.field
                )));
            }
            if fields[..i]
                .iter()
                .any(|other| other.name.eq_ignore_ascii_case(&field.name))
            {
                return Err(TableError::shape(format!(
                    "{}.{} reuses column name '{}'",
                    type_name, field.field, field.name
                )));
            }
            if field.auto_increment
                && !(field.primary_key && field.column_type == ColumnType::Integer)
            {
                return Err(TableError::shape(format!(
                    "{}.{} is marked auto but is not an integer primary key. For e.g:\n\n\t#[table(flags = \"pk,auto\")]\n\t{}: i64",
                    type_name, field.field, field.field
                )));
            }
        }

        let identity = fields
            .iter()
            .position(|f| f.primary_key && f.column_type == ColumnType::Integer)
            .or_else(|| {
                fields.iter().position(|f| {
                    f.column_type == ColumnType::Integer && f.name.eq_ignore_ascii_case("id")
                })
            })
            .ok_or_else(|| {
                TableError::shape(format!(
                    "{} is missing an identity field. For e.g:\n\n\t#[table(flags = \"pk,auto\")]\n\tid: i64",
                    type_name
                ))
            })?;

        let display = fields
            .iter()
            .position(|f| f.column_type == ColumnType::String && f.name.eq_ignore_ascii_case("name"))
            .ok_or_else(|| {
                let hint = fields
                    .iter()
                    .find(|f| f.column_type == ColumnType::String)
                    .map(|f| {
                        format!(
                            " Rename a string column, e.g:\n\n\t#[table(column = \"name\")]\n\t{}: String",
                            naming::to_snake_case(&f.field)
                        )
                    })
                    .unwrap_or_else(|| " Add a `name: String` field.".to_string());
                TableError::shape(format!(
                    "{} is missing a display-name field.{}",
                    type_name, hint
                ))
            })?;

        Ok(Self {
            fields,
            identity,
            display,
        })
    }

    pub fn identity_field(&self) -> &FieldDescriptor {
        &self.fields[self.identity]
    }

    pub fn display_field(&self) -> &FieldDescriptor {
        &self.fields[self.display]
    }

    /// Fields written by INSERT (auto-increment columns excluded)
    pub fn insert_fields(&self) -> impl Iterator<Item = (usize, &FieldDescriptor)> {
        self.fields
            .iter()
            .enumerate()
            .filter(|(_, f)| !f.auto_increment)
    }
}

// ============================================================================
// Derive Support
// ============================================================================

/// Helpers called by `#[derive(Record)]` expansions
#[doc(hidden)]
pub mod __private {
    use serde::Serialize;
    use serde::de::DeserializeOwned;

    use crate::error::{Result, TableError};

    pub use serde_json::Value;

    pub fn encode_field<V: Serialize + ?Sized>(value: &V, field: &str) -> Result<serde_json::Value> {
        serde_json::to_value(value).map_err(|e| {
            TableError::decode(format!("Cannot encode field '{}': {}", field, e))
        })
    }

    /// Float-typed field values, checked before encoding since JSON turns
    /// NaN and infinities into `null`
    pub trait FloatField {
        fn float_value(&self) -> Option<f64>;
    }

    impl FloatField for f64 {
        fn float_value(&self) -> Option<f64> {
            Some(*self)
        }
    }

    impl FloatField for f32 {
        fn float_value(&self) -> Option<f64> {
            Some(f64::from(*self))
        }
    }

    impl<T: FloatField> FloatField for Option<T> {
        fn float_value(&self) -> Option<f64> {
            self.as_ref().and_then(FloatField::float_value)
        }
    }

    pub fn encode_float_field<V: FloatField + Serialize>(
        value: &V,
        field: &str,
    ) -> Result<serde_json::Value> {
        match value.float_value() {
            Some(f) if !f.is_finite() => Err(TableError::decode(format!(
                "Cannot encode field '{}': {} has no SQL representation",
                field, f
            ))),
            _ => encode_field(value, field),
        }
    }

    pub fn decode_field<V: DeserializeOwned>(
        value: Option<serde_json::Value>,
        field: &str,
    ) -> Result<V> {
        let value = value.unwrap_or(serde_json::Value::Null);
        serde_json::from_value(value.clone()).map_err(|e| {
            TableError::decode(format!(
                "Cannot decode field '{}' from {}: {}",
                field, value, e
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn person_fields() -> Vec<FieldDescriptor> {
        vec![
            FieldDescriptor::new("id", "id", ColumnType::Integer).with_flags("pk,auto"),
            FieldDescriptor::new("name", "name", ColumnType::String).with_flags("required"),
            FieldDescriptor::new("age", "age", ColumnType::Integer),
            FieldDescriptor::new("city", "city", ColumnType::String),
        ]
    }

    // =========================================================================
    // Flag Parsing Tests
    // =========================================================================

    #[test]
    fn test_flags_all_tokens() {
        let f = FieldDescriptor::new("id", "id", ColumnType::Integer)
            .with_flags("pk, auto ,unique,required");
        assert!(f.primary_key);
        assert!(f.auto_increment);
        assert!(f.unique);
        assert!(f.required);
        assert!(f.is_identity());
    }

    #[test]
    fn test_flags_long_forms() {
        let f = FieldDescriptor::new("id", "id", ColumnType::Integer)
            .with_flags("PrimaryKey,AutoIncrement,NotNull");
        assert!(f.primary_key);
        assert!(f.auto_increment);
        assert!(f.required);
        assert!(!f.unique);
    }

    #[test]
    fn test_flags_unknown_tokens_ignored() {
        let f = FieldDescriptor::new("x", "x", ColumnType::String).with_flags("index,,bogus");
        assert_eq!(f, FieldDescriptor::new("x", "x", ColumnType::String));
    }

    #[test]
    fn test_builder_flags() {
        let f = FieldDescriptor::new("email", "email", ColumnType::String)
            .unique()
            .required()
            .optional();
        assert!(f.unique && f.required && f.optional);
        assert!(!f.is_identity());
    }

    // =========================================================================
    // Serialization Tests
    // =========================================================================

    #[test]
    fn test_column_type_serialization() {
        let json = serde_json::to_string(&ColumnType::Composite).unwrap();
        assert_eq!(json, r#"{"type":"composite"}"#);
    }

    #[test]
    fn test_descriptor_deserialization() {
        let json = r#"{"field":"age","name":"age","type":"integer","required":true}"#;
        let f: FieldDescriptor = serde_json::from_str(json).unwrap();
        assert_eq!(f.column_type, ColumnType::Integer);
        assert!(f.required);
        assert!(!f.primary_key);
    }

    // =========================================================================
    // Shape Validation Tests
    // =========================================================================

    #[test]
    fn test_shape_valid() {
        let shape = RecordShape::new("Person", person_fields()).unwrap();
        assert_eq!(shape.identity_field().name, "id");
        assert_eq!(shape.display_field().name, "name");
        let insert: Vec<_> = shape.insert_fields().map(|(_, f)| f.name.as_str()).collect();
        assert_eq!(insert, vec!["name", "age", "city"]);
    }

    #[test]
    fn test_shape_identity_by_convention() {
        let fields = vec![
            FieldDescriptor::new("Id", "Id", ColumnType::Integer),
            FieldDescriptor::new("Name", "Name", ColumnType::String),
        ];
        let shape = RecordShape::new("Thing", fields).unwrap();
        assert_eq!(shape.identity, 0);
        assert_eq!(shape.display, 1);
    }

    #[test]
    fn test_shape_pk_preferred_over_id_name() {
        let fields = vec![
            FieldDescriptor::new("id", "id", ColumnType::Integer),
            FieldDescriptor::new("code", "code", ColumnType::Integer).with_flags("pk"),
            FieldDescriptor::new("name", "name", ColumnType::String),
        ];
        let shape = RecordShape::new("Thing", fields).unwrap();
        assert_eq!(shape.identity_field().name, "code");
    }

    #[test]
    fn test_shape_missing_identity() {
        let fields = vec![FieldDescriptor::new("name", "name", ColumnType::String)];
        let err = RecordShape::new("Hello", fields).unwrap_err();
        assert!(matches!(err, TableError::Shape(_)));
        assert!(err.to_string().contains("identity"));
        assert!(err.to_string().contains("pk,auto"));
    }

    #[test]
    fn test_shape_string_id_is_not_identity() {
        let fields = vec![
            FieldDescriptor::new("id", "id", ColumnType::String),
            FieldDescriptor::new("name", "name", ColumnType::String),
        ];
        assert!(RecordShape::new("Hello", fields).is_err());
    }

    #[test]
    fn test_shape_missing_display_name() {
        let fields = vec![
            FieldDescriptor::new("id", "id", ColumnType::Integer),
            FieldDescriptor::new("FullTitle", "FullTitle", ColumnType::String),
        ];
        let err = RecordShape::new("Book", fields).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("display-name"));
        assert!(msg.contains("full_title"));
    }

    #[test]
    fn test_shape_duplicate_columns() {
        let fields = vec![
            FieldDescriptor::new("id", "id", ColumnType::Integer),
            FieldDescriptor::new("name", "name", ColumnType::String),
            FieldDescriptor::new("label", "NAME", ColumnType::String),
        ];
        let err = RecordShape::new("Dup", fields).unwrap_err();
        assert!(err.to_string().contains("reuses column name"));
    }

    #[test]
    fn test_shape_auto_requires_integer_pk() {
        let fields = vec![
            FieldDescriptor::new("id", "id", ColumnType::Integer),
            FieldDescriptor::new("name", "name", ColumnType::String).with_flags("auto"),
        ];
        assert!(RecordShape::new("Bad", fields).is_err());
    }

    #[test]
    fn test_shape_empty() {
        assert!(RecordShape::new("Empty", Vec::new()).is_err());
    }

    // =========================================================================
    // Derive Helper Tests
    // =========================================================================

    #[test]
    fn test_decode_field_missing_is_null() {
        let v: Option<String> = __private::decode_field(None, "city").unwrap();
        assert!(v.is_none());

        let err = __private::decode_field::<String>(None, "city").unwrap_err();
        assert!(matches!(err, TableError::Decode(_)));
        assert!(err.to_string().contains("city"));
    }

    #[test]
    fn test_encode_float_field_rejects_non_finite() {
        for value in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let err = __private::encode_float_field(&value, "score").unwrap_err();
            assert!(matches!(err, TableError::Decode(_)));
            assert!(err.to_string().contains("score"));
        }

        let err = __private::encode_float_field(&Some(f32::NAN), "ratio").unwrap_err();
        assert!(err.to_string().contains("ratio"));
    }

    #[test]
    fn test_encode_float_field_accepts_finite_and_none() {
        assert_eq!(
            __private::encode_float_field(&2.5f64, "score").unwrap(),
            serde_json::json!(2.5)
        );
        assert_eq!(
            __private::encode_float_field(&None::<f64>, "score").unwrap(),
            serde_json::Value::Null
        );
    }
}
