//! # Value Type System
//!
//! Field types, cell values and rows as they travel over the row protocol and
//! appear in service listings.
//!
//! ## Usage
//!
//! ```rust
//! use dataservice_client::value::{FieldMeta, FieldType, Row, RowMeta, Value};
//!
//! let meta = RowMeta::new(vec![
//!     FieldMeta::new("id", FieldType::Integer),
//!     FieldMeta::new("name", FieldType::String),
//! ]);
//! let row = Row::new(vec![Value::Integer(1), Value::String("alpha".into())]);
//!
//! assert_eq!(meta.index_of("name"), Some(1));
//! assert_eq!(row.get(1).and_then(Value::as_str), Some("alpha"));
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Data types a remote service field can declare.
///
/// Wire ids and type names follow the data-service row metadata; the SQL type
/// codes are the standard `java.sql.Types` constants relational tooling expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldType {
    Number,
    String,
    Date,
    Boolean,
    Integer,
    BigNumber,
    Binary,
    Timestamp,
}

impl FieldType {
    pub const ALL: [FieldType; 8] = [
        FieldType::Number,
        FieldType::String,
        FieldType::Date,
        FieldType::Boolean,
        FieldType::Integer,
        FieldType::BigNumber,
        FieldType::Binary,
        FieldType::Timestamp,
    ];

    /// Type id used in row-stream metadata
    pub fn wire_id(self) -> i32 {
        match self {
            FieldType::Number => 1,
            FieldType::String => 2,
            FieldType::Date => 3,
            FieldType::Boolean => 4,
            FieldType::Integer => 5,
            FieldType::BigNumber => 6,
            FieldType::Binary => 8,
            FieldType::Timestamp => 9,
        }
    }

    pub fn from_wire_id(id: i32) -> Option<Self> {
        FieldType::ALL.into_iter().find(|t| t.wire_id() == id)
    }

    /// Type name used in service listing documents
    pub fn type_name(self) -> &'static str {
        match self {
            FieldType::Number => "Number",
            FieldType::String => "String",
            FieldType::Date => "Date",
            FieldType::Boolean => "Boolean",
            FieldType::Integer => "Integer",
            FieldType::BigNumber => "BigNumber",
            FieldType::Binary => "Binary",
            FieldType::Timestamp => "Timestamp",
        }
    }

    /// Case-insensitive lookup by listing type name
    pub fn from_type_name(name: &str) -> Option<Self> {
        let name = name.trim();
        FieldType::ALL
            .into_iter()
            .find(|t| t.type_name().eq_ignore_ascii_case(name))
    }

    /// Standard SQL type code (`java.sql.Types`)
    pub fn sql_type(self) -> i32 {
        match self {
            FieldType::Number => 8,     // DOUBLE
            FieldType::String => 12,    // VARCHAR
            FieldType::Date => 91,      // DATE
            FieldType::Boolean => 16,   // BOOLEAN
            FieldType::Integer => -5,   // BIGINT
            FieldType::BigNumber => 3,  // DECIMAL
            FieldType::Binary => -4,    // LONGVARBINARY
            FieldType::Timestamp => 93, // TIMESTAMP
        }
    }

    /// SQL type name matching [`FieldType::sql_type`]
    pub fn sql_type_name(self) -> &'static str {
        match self {
            FieldType::Number => "DOUBLE",
            FieldType::String => "VARCHAR",
            FieldType::Date => "DATE",
            FieldType::Boolean => "BOOLEAN",
            FieldType::Integer => "BIGINT",
            FieldType::BigNumber => "DECIMAL",
            FieldType::Binary => "LONGVARBINARY",
            FieldType::Timestamp => "TIMESTAMP",
        }
    }

    /// Check if a value can be stored in a field of this type
    pub fn matches(self, value: &Value) -> bool {
        match value {
            Value::Null => true,
            other => other.field_type() == Some(self),
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

/// A single cell value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Null,
    Number(f64),
    String(String),
    Date(DateTime<Utc>),
    Boolean(bool),
    Integer(i64),
    /// Arbitrary-precision decimal in its textual form
    BigNumber(String),
    Binary(Vec<u8>),
    Timestamp(DateTime<Utc>),
}

impl Value {
    /// Type of this value, `None` for null
    pub fn field_type(&self) -> Option<FieldType> {
        match self {
            Value::Null => None,
            Value::Number(_) => Some(FieldType::Number),
            Value::String(_) => Some(FieldType::String),
            Value::Date(_) => Some(FieldType::Date),
            Value::Boolean(_) => Some(FieldType::Boolean),
            Value::Integer(_) => Some(FieldType::Integer),
            Value::BigNumber(_) => Some(FieldType::BigNumber),
            Value::Binary(_) => Some(FieldType::Binary),
            Value::Timestamp(_) => Some(FieldType::Timestamp),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Try to get as string reference (strings and big numbers)
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) | Value::BigNumber(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get as i64
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(v) => Some(*v),
            Value::Date(d) | Value::Timestamp(d) => Some(d.timestamp_millis()),
            _ => None,
        }
    }

    /// Try to get as f64
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(v) => Some(*v),
            Value::Integer(v) => Some(*v as f64),
            Value::BigNumber(s) => s.parse().ok(),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            Value::Date(d) | Value::Timestamp(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Binary(b) => Some(b),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Number(v) => write!(f, "{v}"),
            Value::String(s) | Value::BigNumber(s) => write!(f, "{s}"),
            Value::Date(d) => write!(f, "{}", d.format("%Y/%m/%d %H:%M:%S%.3f")),
            Value::Timestamp(d) => write!(f, "{}", d.format("%Y/%m/%d %H:%M:%S%.9f")),
            Value::Boolean(b) => write!(f, "{b}"),
            Value::Integer(v) => write!(f, "{v}"),
            Value::Binary(b) => write!(f, "<{} bytes>", b.len()),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Number(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

/// Name and type of one column in a row stream or service listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMeta {
    pub name: String,
    pub field_type: FieldType,
}

impl FieldMeta {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        FieldMeta {
            name: name.into(),
            field_type,
        }
    }
}

/// Ordered column layout of a row stream
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowMeta {
    fields: Vec<FieldMeta>,
}

impl RowMeta {
    pub fn new(fields: Vec<FieldMeta>) -> Self {
        RowMeta { fields }
    }

    pub fn fields(&self) -> &[FieldMeta] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn field(&self, idx: usize) -> Option<&FieldMeta> {
        self.fields.get(idx)
    }

    /// Position of a column by name (exact match first, then case-insensitive)
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields
            .iter()
            .position(|f| f.name == name)
            .or_else(|| {
                self.fields
                    .iter()
                    .position(|f| f.name.eq_ignore_ascii_case(name))
            })
    }

    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }
}

/// One decoded row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    values: Vec<Value>,
}

impl Row {
    pub fn new(values: Vec<Value>) -> Self {
        Row { values }
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }

    pub fn get(&self, idx: usize) -> Option<&Value> {
        self.values.get(idx)
    }

    /// Look a value up by column name using the stream's metadata
    pub fn get_by_name<'a>(&'a self, meta: &RowMeta, name: &str) -> Option<&'a Value> {
        meta.index_of(name).and_then(|idx| self.values.get(idx))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl fmt::Display for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, v) in self.values.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{v}")?;
        }
        write!(f, ")")
    }
}
