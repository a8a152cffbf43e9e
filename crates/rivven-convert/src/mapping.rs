//! Logical type to SQL type mapping
//!
//! Typed null binding needs to tell the statement which SQL type a null
//! stands for. [`SqlType`] carries the standard JDBC type codes so drivers
//! that bind nulls by code (`setNull(index, Types.DATE)`) get the right one.

use std::fmt;

use crate::error::{Error, Result};
use crate::logical::{LogicalType, LogicalTypeKind};

/// SQL type tag for parameter binding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SqlType {
    /// NULL
    Null,
    /// BOOLEAN
    Boolean,
    /// TINYINT
    TinyInt,
    /// SMALLINT
    SmallInt,
    /// INTEGER
    Integer,
    /// BIGINT
    BigInt,
    /// REAL (single precision)
    Real,
    /// DOUBLE
    Double,
    /// DECIMAL
    Decimal,
    /// CHAR
    Char,
    /// VARCHAR
    VarChar,
    /// BINARY
    Binary,
    /// VARBINARY
    VarBinary,
    /// DATE
    Date,
    /// TIME
    Time,
    /// TIMESTAMP
    Timestamp,
    /// TIMESTAMP WITH TIME ZONE
    TimestampWithTimeZone,
}

impl SqlType {
    /// JDBC `java.sql.Types` code
    pub const fn code(self) -> i32 {
        match self {
            Self::Null => 0,
            Self::Boolean => 16,
            Self::TinyInt => -6,
            Self::SmallInt => 5,
            Self::Integer => 4,
            Self::BigInt => -5,
            Self::Real => 7,
            Self::Double => 8,
            Self::Decimal => 3,
            Self::Char => 1,
            Self::VarChar => 12,
            Self::Binary => -2,
            Self::VarBinary => -3,
            Self::Date => 91,
            Self::Time => 92,
            Self::Timestamp => 93,
            Self::TimestampWithTimeZone => 2014,
        }
    }

    /// SQL type name
    pub const fn name(self) -> &'static str {
        match self {
            Self::Null => "NULL",
            Self::Boolean => "BOOLEAN",
            Self::TinyInt => "TINYINT",
            Self::SmallInt => "SMALLINT",
            Self::Integer => "INTEGER",
            Self::BigInt => "BIGINT",
            Self::Real => "REAL",
            Self::Double => "DOUBLE",
            Self::Decimal => "DECIMAL",
            Self::Char => "CHAR",
            Self::VarChar => "VARCHAR",
            Self::Binary => "BINARY",
            Self::VarBinary => "VARBINARY",
            Self::Date => "DATE",
            Self::Time => "TIME",
            Self::Timestamp => "TIMESTAMP",
            Self::TimestampWithTimeZone => "TIMESTAMP WITH TIME ZONE",
        }
    }
}

impl fmt::Display for SqlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Maps a column's logical type to the SQL type used for typed nulls
pub trait TypeMapping: Send + Sync {
    /// Get the SQL type for a logical type
    fn sql_type(&self, logical_type: &LogicalType) -> Result<SqlType>;
}

/// JDBC-style mapping of logical types to `java.sql.Types`
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardTypeMapping;

impl TypeMapping for StandardTypeMapping {
    fn sql_type(&self, logical_type: &LogicalType) -> Result<SqlType> {
        let sql_type = match logical_type.kind() {
            LogicalTypeKind::Null => SqlType::Null,
            LogicalTypeKind::Boolean => SqlType::Boolean,
            LogicalTypeKind::TinyInt => SqlType::TinyInt,
            LogicalTypeKind::SmallInt => SqlType::SmallInt,
            LogicalTypeKind::Integer => SqlType::Integer,
            LogicalTypeKind::BigInt => SqlType::BigInt,
            LogicalTypeKind::Float => SqlType::Real,
            LogicalTypeKind::Double => SqlType::Double,
            LogicalTypeKind::Decimal { .. } => SqlType::Decimal,
            LogicalTypeKind::Char { .. } => SqlType::Char,
            LogicalTypeKind::VarChar { .. } => SqlType::VarChar,
            LogicalTypeKind::Binary { .. } => SqlType::Binary,
            LogicalTypeKind::VarBinary { .. } => SqlType::VarBinary,
            LogicalTypeKind::Date => SqlType::Date,
            LogicalTypeKind::Time { .. } => SqlType::Time,
            LogicalTypeKind::Timestamp { .. } => SqlType::Timestamp,
            LogicalTypeKind::TimestampLtz { .. } => SqlType::TimestampWithTimeZone,
            LogicalTypeKind::Interval { .. }
            | LogicalTypeKind::Array(_)
            | LogicalTypeKind::Multiset(_)
            | LogicalTypeKind::Map(..)
            | LogicalTypeKind::Row(_)
            | LogicalTypeKind::Raw { .. } => {
                return Err(Error::type_conversion(format!(
                    "no SQL type for {}",
                    logical_type
                )))
            }
        };
        Ok(sql_type)
    }
}
