//! SQL binding types.

use serde::{Deserialize, Serialize};

/// SQL data types a bound parameter can carry.
///
/// The compiler records one of these next to every bound value so that
/// drivers can pick the right wire type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SqlType {
    /// Untyped NULL
    Null,

    // Integer types
    TinyInt,
    SmallInt,
    Integer,
    BigInt,

    // Floating point
    Real,
    Double,

    // Fixed precision
    Numeric { precision: u8, scale: u8 },
    Decimal { precision: u8, scale: u8 },

    // Boolean
    Boolean,

    // String types
    Char(u32),
    VarChar(u32),
    Text,

    // Binary types
    Blob,

    // Date/time types
    Date,
    Time,
    Timestamp,
    TimestampTz,

    // UUID
    Uuid,

    // JSON
    Json,
    JsonB,

    // Arrays (PostgreSQL)
    Array(Box<SqlType>),

    // Custom type name
    Custom(String),
}

impl SqlType {
    /// Get the SQL type name for this type.
    pub fn sql_name(&self) -> String {
        match self {
            SqlType::Null => "NULL".to_string(),
            SqlType::TinyInt => "TINYINT".to_string(),
            SqlType::SmallInt => "SMALLINT".to_string(),
            SqlType::Integer => "INTEGER".to_string(),
            SqlType::BigInt => "BIGINT".to_string(),
            SqlType::Real => "REAL".to_string(),
            SqlType::Double => "DOUBLE PRECISION".to_string(),
            SqlType::Numeric { precision, scale } => format!("NUMERIC({}, {})", precision, scale),
            SqlType::Decimal { precision, scale } => format!("DECIMAL({}, {})", precision, scale),
            SqlType::Boolean => "BOOLEAN".to_string(),
            SqlType::Char(len) => format!("CHAR({})", len),
            SqlType::VarChar(len) => format!("VARCHAR({})", len),
            SqlType::Text => "TEXT".to_string(),
            SqlType::Blob => "BLOB".to_string(),
            SqlType::Date => "DATE".to_string(),
            SqlType::Time => "TIME".to_string(),
            SqlType::Timestamp => "TIMESTAMP".to_string(),
            SqlType::TimestampTz => "TIMESTAMPTZ".to_string(),
            SqlType::Uuid => "UUID".to_string(),
            SqlType::Json => "JSON".to_string(),
            SqlType::JsonB => "JSONB".to_string(),
            SqlType::Array(inner) => format!("{}[]", inner.sql_name()),
            SqlType::Custom(name) => name.clone(),
        }
    }
}
