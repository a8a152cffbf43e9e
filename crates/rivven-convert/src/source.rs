//! Read-side collaborators
//!
//! - CursorRow: a positioned view over one row of a live result set
//! - LookupRow: an already materialized row, e.g. from a lookup cache
//!
//! Positions are 0-based on both.

use std::borrow::Cow;

use crate::error::{Error, Result};
use crate::types::{Row, Value};

/// One row of a live query cursor
pub trait CursorRow {
    /// Number of readable columns
    fn column_count(&self) -> usize;

    /// Read the value at `position`
    fn read_at(&self, position: usize) -> Result<Cow<'_, Value>>;

    /// Whether the value at `position` is SQL NULL.
    ///
    /// Checked before [`read_at`](Self::read_at). Cursors that report NULL
    /// out of band, like a JDBC `wasNull` flag next to a zero `getInt`,
    /// override this.
    fn is_null_at(&self, position: usize) -> Result<bool> {
        Ok(self.read_at(position)?.is_null())
    }
}

/// A pre-materialized row read by position
pub trait LookupRow {
    /// Number of values
    fn column_count(&self) -> usize;

    /// Value at `position`
    fn value_at(&self, position: usize) -> Result<Cow<'_, Value>>;
}

fn out_of_range(position: usize, len: usize) -> Error {
    Error::source_failure(format!(
        "position {} out of range for row of {} columns",
        position, len
    ))
}

impl CursorRow for Row {
    fn column_count(&self) -> usize {
        self.values().len()
    }

    fn read_at(&self, position: usize) -> Result<Cow<'_, Value>> {
        self.values().value_at(position)
    }
}

impl LookupRow for [Value] {
    fn column_count(&self) -> usize {
        self.len()
    }

    fn value_at(&self, position: usize) -> Result<Cow<'_, Value>> {
        self.get(position)
            .map(Cow::Borrowed)
            .ok_or_else(|| out_of_range(position, self.len()))
    }
}

impl LookupRow for Vec<Value> {
    fn column_count(&self) -> usize {
        self.len()
    }

    fn value_at(&self, position: usize) -> Result<Cow<'_, Value>> {
        self.as_slice().value_at(position)
    }
}

/// JSON arrays, as lookup caches store rows
impl LookupRow for [serde_json::Value] {
    fn column_count(&self) -> usize {
        self.len()
    }

    fn value_at(&self, position: usize) -> Result<Cow<'_, Value>> {
        self.get(position)
            .map(|json| Cow::Owned(Value::from_json(json)))
            .ok_or_else(|| out_of_range(position, self.len()))
    }
}

impl LookupRow for Vec<serde_json::Value> {
    fn column_count(&self) -> usize {
        self.len()
    }

    fn value_at(&self, position: usize) -> Result<Cow<'_, Value>> {
        self.as_slice().value_at(position)
    }
}

/// A JSON document that must be an array
impl LookupRow for serde_json::Value {
    fn column_count(&self) -> usize {
        self.as_array().map_or(0, Vec::len)
    }

    fn value_at(&self, position: usize) -> Result<Cow<'_, Value>> {
        match self {
            serde_json::Value::Array(items) => items.as_slice().value_at(position),
            _ => Err(Error::source_failure("lookup row is not a JSON array")),
        }
    }
}
