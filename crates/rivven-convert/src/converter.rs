//! Row converter
//!
//! Converts between external database rows and internal [`RowData`] for a
//! fixed column list. All per-column converters are built once, up front;
//! construction fails on the first column without a converter.
//!
//! # Example
//!
//! ```rust
//! use rivven_convert::prelude::*;
//!
//! let converter = RowConverter::new(RowType::from_types([
//!     LogicalType::int(),
//!     LogicalType::string(),
//! ]))?;
//!
//! let row = converter.to_internal_lookup(&vec![Value::Int32(1), Value::Null])?;
//! assert_eq!(row.get(0), Some(&Datum::Int(1)));
//! assert!(row.is_null_at(1));
//!
//! let mut stmt = BoundStatement::new("INSERT INTO t VALUES (?, ?)", 2);
//! converter.to_external(&row, &mut stmt)?;
//! assert!(stmt.is_fully_bound());
//! # Ok::<(), rivven_convert::Error>(())
//! ```

use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace};

use crate::config::RowConverterConfig;
use crate::data::RowData;
use crate::error::{Error, Result};
use crate::logical::RowType;
use crate::mapping::{StandardTypeMapping, TypeMapping};
use crate::nullable::{
    wrap_nullable_read, wrap_nullable_write_typed, wrap_nullable_write_untyped, Deserializer,
    NullStrategy, Serializer,
};
use crate::registry::{create_external_converter, create_internal_converter};
use crate::source::{CursorRow, LookupRow};
use crate::statement::StatementBinder;

struct ColumnConverter {
    name: String,
    deserializer: Deserializer,
    serializer: Serializer,
}

/// Converter between external rows and [`RowData`] for one column list.
///
/// Cheap to clone; clones share the per-column converters. Safe to use from
/// many threads at once.
#[derive(Clone)]
pub struct RowConverter {
    row_type: RowType,
    columns: Arc<[ColumnConverter]>,
    null_strategy: NullStrategy,
}

impl RowConverter {
    /// Build a converter with the default null strategy and type mapping
    pub fn new(row_type: RowType) -> Result<Self> {
        RowConverterBuilder::new(row_type).build()
    }

    /// Builder for non-default options
    pub fn builder(row_type: RowType) -> RowConverterBuilder {
        RowConverterBuilder::new(row_type)
    }

    /// Validate `config` and build a converter from it
    pub fn from_config(config: &RowConverterConfig) -> Result<Self> {
        config.validate()?;
        RowConverterBuilder::new(config.row_type())
            .null_strategy(config.null_strategy)
            .build()
    }

    /// Column list
    #[inline]
    pub fn row_type(&self) -> &RowType {
        &self.row_type
    }

    /// Number of columns
    #[inline]
    pub fn arity(&self) -> usize {
        self.columns.len()
    }

    /// Null strategy of the write path
    #[inline]
    pub fn null_strategy(&self) -> NullStrategy {
        self.null_strategy
    }

    /// Convert the current row of a cursor.
    ///
    /// A position the cursor reports as NULL stays absent and is never read.
    pub fn to_internal<C: CursorRow + ?Sized>(&self, cursor: &C) -> Result<RowData> {
        self.check_arity("cursor", cursor.column_count())?;

        let mut row = RowData::new(self.arity());
        for (pos, column) in self.columns.iter().enumerate() {
            if cursor.is_null_at(pos).map_err(|e| self.fail(pos, e))? {
                continue;
            }
            let field = cursor
                .read_at(pos)
                .and_then(|value| column.deserializer.deserialize(&value))
                .map_err(|e| self.fail(pos, e))?;
            row.set_field(pos, field);
        }
        Ok(row)
    }

    /// Convert a pre-materialized lookup row
    pub fn to_internal_lookup<L: LookupRow + ?Sized>(&self, lookup: &L) -> Result<RowData> {
        self.check_arity("lookup row", lookup.column_count())?;

        let mut row = RowData::new(self.arity());
        for (pos, column) in self.columns.iter().enumerate() {
            let field = lookup
                .value_at(pos)
                .and_then(|value| column.deserializer.deserialize(&value))
                .map_err(|e| self.fail(pos, e))?;
            row.set_field(pos, field);
        }
        Ok(row)
    }

    /// Bind every field of `row` into `statement` and return the statement.
    ///
    /// On a failed field the statement is cleared, so it can be reused for
    /// the next row.
    pub fn to_external<'a, S: StatementBinder>(
        &self,
        row: &RowData,
        statement: &'a mut S,
    ) -> Result<&'a mut S> {
        self.check_arity("row", row.arity())?;
        let parameters = statement.parameter_count();
        if parameters < self.arity() {
            return Err(Error::arity("statement", self.arity(), parameters));
        }

        for (pos, column) in self.columns.iter().enumerate() {
            if let Err(e) = column.serializer.serialize(row, pos, &mut *statement) {
                statement.clear();
                return Err(self.fail(pos, e));
            }
        }
        Ok(statement)
    }

    fn check_arity(&self, target: &'static str, actual: usize) -> Result<()> {
        if actual != self.arity() {
            return Err(Error::arity(target, self.arity(), actual));
        }
        Ok(())
    }

    fn fail(&self, pos: usize, error: Error) -> Error {
        let error = error.at_column(pos, &self.columns[pos].name);
        trace!(position = pos, "row conversion failed: {}", error);
        error
    }
}

impl fmt::Debug for RowConverter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RowConverter")
            .field("row_type", &self.row_type.to_string())
            .field("null_strategy", &self.null_strategy)
            .finish()
    }
}

/// Builder for [`RowConverter`]
pub struct RowConverterBuilder {
    row_type: RowType,
    null_strategy: NullStrategy,
    type_mapping: Arc<dyn TypeMapping>,
}

impl RowConverterBuilder {
    /// Create a builder with the typed null strategy and the standard mapping
    pub fn new(row_type: RowType) -> Self {
        Self {
            row_type,
            null_strategy: NullStrategy::default(),
            type_mapping: Arc::new(StandardTypeMapping),
        }
    }

    /// Set how absent fields are bound
    pub fn null_strategy(mut self, null_strategy: NullStrategy) -> Self {
        self.null_strategy = null_strategy;
        self
    }

    /// Set the mapping used for typed nulls
    pub fn type_mapping(mut self, type_mapping: Arc<dyn TypeMapping>) -> Self {
        self.type_mapping = type_mapping;
        self
    }

    /// Build every column converter, failing on the first unsupported column
    pub fn build(self) -> Result<RowConverter> {
        let columns = self
            .row_type
            .fields()
            .iter()
            .enumerate()
            .map(|(pos, field)| -> Result<ColumnConverter> {
                let ty = &field.logical_type;
                let deserializer = wrap_nullable_read(create_internal_converter(pos, ty)?, pos);
                let raw = create_external_converter(pos, ty)?;
                let serializer = match self.null_strategy {
                    NullStrategy::Typed => {
                        wrap_nullable_write_typed(raw, ty, self.type_mapping.as_ref())
                            .map_err(|e| Error::unsupported_type(pos, ty, e.to_string()))?
                    }
                    NullStrategy::Untyped => wrap_nullable_write_untyped(raw),
                };
                Ok(ColumnConverter {
                    name: field.name.clone(),
                    deserializer,
                    serializer,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        debug!(
            arity = columns.len(),
            null_strategy = %self.null_strategy,
            "built row converter for {}",
            self.row_type
        );

        Ok(RowConverter {
            row_type: self.row_type,
            columns: columns.into(),
            null_strategy: self.null_strategy,
        })
    }
}

impl fmt::Debug for RowConverterBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RowConverterBuilder")
            .field("row_type", &self.row_type.to_string())
            .field("null_strategy", &self.null_strategy)
            .finish()
    }
}
