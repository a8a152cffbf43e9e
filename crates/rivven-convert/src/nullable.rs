//! Null-safety wrappers
//!
//! Raw converters from [`crate::registry`] only handle non-null values. The
//! wrappers here add the null check once per field:
//!
//! - read: a null source value becomes an absent field without calling the
//!   raw deserializer
//! - write: an absent field is bound as SQL NULL, either untyped or carrying
//!   the column's SQL type, without calling the raw serializer
//!
//! Wrapped converters are distinct types from raw ones, so wrapping twice
//! does not type-check.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::data::{Datum, RowData};
use crate::error::Result;
use crate::logical::LogicalType;
use crate::mapping::{SqlType, TypeMapping};
use crate::registry::{RawDeserializer, RawSerializer};
use crate::statement::StatementBinder;
use crate::types::Value;

type DeserializeFn = dyn Fn(&Value) -> Result<Option<Datum>> + Send + Sync;
type SerializeFn = dyn Fn(&RowData, usize, &mut dyn StatementBinder) -> Result<()> + Send + Sync;

/// Null-safe deserializer: `Ok(None)` for a null value
#[derive(Clone)]
pub struct Deserializer(Arc<DeserializeFn>);

impl Deserializer {
    /// Convert a boundary value into an optional datum
    #[inline]
    pub fn deserialize(&self, value: &Value) -> Result<Option<Datum>> {
        (self.0)(value)
    }
}

impl fmt::Debug for Deserializer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Deserializer")
    }
}

/// Null-safe serializer: binds SQL NULL for an absent field
#[derive(Clone)]
pub struct Serializer(Arc<SerializeFn>);

impl Serializer {
    /// Bind field `pos` of `row` at parameter `pos`
    #[inline]
    pub fn serialize(
        &self,
        row: &RowData,
        pos: usize,
        statement: &mut dyn StatementBinder,
    ) -> Result<()> {
        (self.0)(row, pos, statement)
    }
}

impl fmt::Debug for Serializer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Serializer")
    }
}

/// How absent fields are bound on the write path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NullStrategy {
    /// `bind_null` with the column's mapped SQL type
    #[default]
    Typed,
    /// `bind` with `Value::Null`
    Untyped,
}

impl fmt::Display for NullStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Typed => write!(f, "typed"),
            Self::Untyped => write!(f, "untyped"),
        }
    }
}

/// The null binding used for one column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NullBinding {
    /// `Value::Null`
    Untyped,
    /// SQL NULL of the given type
    Typed(SqlType),
}

impl NullBinding {
    /// Bind a null at `position`
    pub fn bind(self, statement: &mut dyn StatementBinder, position: usize) -> Result<()> {
        match self {
            Self::Untyped => statement.bind(position, Value::Null),
            Self::Typed(sql_type) => statement.bind_null(position, sql_type),
        }
    }
}

/// Wrap a raw deserializer with a null check.
///
/// Failures of `raw` are tagged with `position`.
pub fn wrap_nullable_read(raw: RawDeserializer, position: usize) -> Deserializer {
    Deserializer(Arc::new(move |value| {
        if value.is_null() {
            return Ok(None);
        }
        raw.deserialize(value)
            .map(Some)
            .map_err(|e| e.at_position(position))
    }))
}

/// Wrap a raw serializer so absent fields are bound with `null_binding`
pub fn wrap_nullable_write(raw: RawSerializer, null_binding: NullBinding) -> Serializer {
    Serializer(Arc::new(move |row, pos, statement| {
        if row.is_null_at(pos) {
            null_binding.bind(statement, pos)
        } else {
            raw.serialize(row, pos, statement)
        }
    }))
}

/// Wrap a raw serializer binding untyped nulls
pub fn wrap_nullable_write_untyped(raw: RawSerializer) -> Serializer {
    wrap_nullable_write(raw, NullBinding::Untyped)
}

/// Wrap a raw serializer binding nulls typed with the column's SQL type.
///
/// A column of the NULL type always binds a typed null.
pub fn wrap_nullable_write_typed(
    raw: RawSerializer,
    logical_type: &LogicalType,
    mapping: &dyn TypeMapping,
) -> Result<Serializer> {
    let sql_type = mapping.sql_type(logical_type)?;
    if logical_type.is_null_kind() {
        return Ok(Serializer(Arc::new(move |_, pos, statement| {
            statement.bind_null(pos, sql_type)
        })));
    }
    Ok(wrap_nullable_write(raw, NullBinding::Typed(sql_type)))
}
