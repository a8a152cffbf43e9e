//! Internal record representation
//!
//! [`RowData`] is the fixed-arity row handed between pipeline stages. Each
//! field is either a [`Datum`] or absent (`None`), which is how SQL NULL is
//! represented internally.

use chrono::{DateTime, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use std::fmt;

/// Change flag of a row in a changelog stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RowKind {
    /// Insertion
    #[default]
    Insert,
    /// Retraction of a previous row before an update
    UpdateBefore,
    /// New contents of an updated row
    UpdateAfter,
    /// Deletion
    Delete,
}

impl RowKind {
    /// Short changelog notation (`+I`, `-U`, `+U`, `-D`)
    pub const fn short_string(self) -> &'static str {
        match self {
            Self::Insert => "+I",
            Self::UpdateBefore => "-U",
            Self::UpdateAfter => "+U",
            Self::Delete => "-D",
        }
    }

    /// Whether the row adds to the result (insert or update-after)
    pub const fn is_accumulate(self) -> bool {
        matches!(self, Self::Insert | Self::UpdateAfter)
    }
}

impl fmt::Display for RowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_string())
    }
}

/// Internal typed field value
#[derive(Debug, Clone, PartialEq)]
pub enum Datum {
    /// BOOLEAN
    Boolean(bool),
    /// TINYINT
    TinyInt(i8),
    /// SMALLINT
    SmallInt(i16),
    /// INT
    Int(i32),
    /// BIGINT
    BigInt(i64),
    /// FLOAT
    Float(f32),
    /// DOUBLE
    Double(f64),
    /// DECIMAL, scaled to the column's scale
    Decimal(Decimal),
    /// CHAR / VARCHAR
    String(String),
    /// BINARY / VARBINARY
    Binary(Vec<u8>),
    /// DATE as days since 1970-01-01
    Date(i32),
    /// TIME as milliseconds of the day
    Time(i32),
    /// TIMESTAMP without time zone
    Timestamp(NaiveDateTime),
    /// TIMESTAMP WITH LOCAL TIME ZONE, as an instant
    TimestampLtz(DateTime<Utc>),
}

impl Datum {
    /// Name of the datum's type family, for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Boolean(_) => "BOOLEAN",
            Self::TinyInt(_) => "TINYINT",
            Self::SmallInt(_) => "SMALLINT",
            Self::Int(_) => "INT",
            Self::BigInt(_) => "BIGINT",
            Self::Float(_) => "FLOAT",
            Self::Double(_) => "DOUBLE",
            Self::Decimal(_) => "DECIMAL",
            Self::String(_) => "STRING",
            Self::Binary(_) => "BINARY",
            Self::Date(_) => "DATE",
            Self::Time(_) => "TIME",
            Self::Timestamp(_) => "TIMESTAMP",
            Self::TimestampLtz(_) => "TIMESTAMP_LTZ",
        }
    }
}

impl From<bool> for Datum {
    fn from(v: bool) -> Self {
        Self::Boolean(v)
    }
}

impl From<i8> for Datum {
    fn from(v: i8) -> Self {
        Self::TinyInt(v)
    }
}

impl From<i16> for Datum {
    fn from(v: i16) -> Self {
        Self::SmallInt(v)
    }
}

impl From<i32> for Datum {
    fn from(v: i32) -> Self {
        Self::Int(v)
    }
}

impl From<i64> for Datum {
    fn from(v: i64) -> Self {
        Self::BigInt(v)
    }
}

impl From<f32> for Datum {
    fn from(v: f32) -> Self {
        Self::Float(v)
    }
}

impl From<f64> for Datum {
    fn from(v: f64) -> Self {
        Self::Double(v)
    }
}

impl From<Decimal> for Datum {
    fn from(v: Decimal) -> Self {
        Self::Decimal(v)
    }
}

impl From<String> for Datum {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<&str> for Datum {
    fn from(v: &str) -> Self {
        Self::String(v.to_owned())
    }
}

impl From<Vec<u8>> for Datum {
    fn from(v: Vec<u8>) -> Self {
        Self::Binary(v)
    }
}

/// Fixed-arity internal row
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RowData {
    kind: RowKind,
    fields: Vec<Option<Datum>>,
}

impl RowData {
    /// Create a row of `arity` absent fields
    pub fn new(arity: usize) -> Self {
        Self {
            kind: RowKind::Insert,
            fields: vec![None; arity],
        }
    }

    /// Create a row from field values
    pub fn from_fields(fields: Vec<Option<Datum>>) -> Self {
        Self {
            kind: RowKind::Insert,
            fields,
        }
    }

    /// Set the row kind
    pub fn with_kind(mut self, kind: RowKind) -> Self {
        self.kind = kind;
        self
    }

    /// Row kind
    #[inline]
    pub fn kind(&self) -> RowKind {
        self.kind
    }

    /// Set the row kind in place
    #[inline]
    pub fn set_kind(&mut self, kind: RowKind) {
        self.kind = kind;
    }

    /// Number of fields
    #[inline]
    pub fn arity(&self) -> usize {
        self.fields.len()
    }

    /// Whether the field at `pos` is absent (or out of range)
    #[inline]
    pub fn is_null_at(&self, pos: usize) -> bool {
        !matches!(self.fields.get(pos), Some(Some(_)))
    }

    /// Field at `pos`; `None` when absent or out of range
    #[inline]
    pub fn get(&self, pos: usize) -> Option<&Datum> {
        self.fields.get(pos).and_then(Option::as_ref)
    }

    /// Set the field at `pos`.
    ///
    /// # Panics
    ///
    /// Panics if `pos >= arity`.
    #[inline]
    pub fn set_field(&mut self, pos: usize, value: Option<Datum>) {
        self.fields[pos] = value;
    }

    /// All fields in order
    #[inline]
    pub fn fields(&self) -> &[Option<Datum>] {
        &self.fields
    }

    /// Consume the row into its fields
    pub fn into_fields(self) -> Vec<Option<Datum>> {
        self.fields
    }
}

impl fmt::Display for RowData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.kind)?;
        for (i, field) in self.fields.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            match field {
                Some(datum) => write!(f, "{:?}", datum)?,
                None => write!(f, "null")?,
            }
        }
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_row_is_all_null() {
        let row = RowData::new(3);
        assert_eq!(row.arity(), 3);
        assert!((0..3).all(|i| row.is_null_at(i)));
        assert_eq!(row.kind(), RowKind::Insert);
    }

    #[test]
    fn test_set_and_get() {
        let mut row = RowData::new(2);
        row.set_field(0, Some(Datum::Int(42)));

        assert_eq!(row.get(0), Some(&Datum::Int(42)));
        assert!(!row.is_null_at(0));
        assert!(row.is_null_at(1));
        assert!(row.is_null_at(5));
    }

    #[test]
    fn test_row_kind() {
        let row = RowData::from_fields(vec![Some(1_i64.into())]).with_kind(RowKind::UpdateBefore);
        assert_eq!(row.kind().short_string(), "-U");
        assert!(!row.kind().is_accumulate());
        assert!(RowKind::UpdateAfter.is_accumulate());
        assert_eq!(row.to_string(), "-U(BigInt(1))");
    }
}
