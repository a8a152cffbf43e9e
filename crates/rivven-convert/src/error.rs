//! Error types for rivven-convert
//!
//! Errors are split by when they can happen:
//! - Construction errors (unsupported column type, bad configuration) are fatal
//! - Row-level errors (conversion failures) concern a single row; the caller
//!   decides whether to skip the row or abort the batch
//! - Arity mismatches are misconfiguration and never row-level

use std::fmt;
use thiserror::Error;

/// Result type for rivven-convert operations
pub type Result<T> = std::result::Result<T, Error>;

/// Boxed error cause carried by conversion and source errors
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Error categories for classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Column type has no converter or cannot be parsed
    Schema,
    /// A value could not be converted (row-level)
    Conversion,
    /// Row, cursor or statement width does not match the column list
    Arity,
    /// Statement binding contract violated
    Binding,
    /// Configuration error
    Configuration,
}

impl ErrorCategory {
    /// Whether errors in this category only affect the row being converted
    #[inline]
    pub const fn is_row_level(self) -> bool {
        matches!(self, Self::Conversion)
    }
}

/// Main error type for rivven-convert
#[derive(Error, Debug)]
#[allow(missing_docs)]
pub enum Error {
    /// No converter exists for the column's logical type
    #[error("unsupported column type at position {position}: {logical_type} ({reason})")]
    UnsupportedColumnType {
        position: usize,
        logical_type: String,
        reason: String,
    },

    /// Converting a value at a column position failed
    #[error("conversion failed at column {position}{}: {message}", column_suffix(.column))]
    Conversion {
        position: usize,
        column: String,
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// Row, cursor or statement cannot satisfy the declared column count
    #[error("arity mismatch: {target} has {actual} columns, expected {expected}")]
    ArityMismatch {
        target: &'static str,
        expected: usize,
        actual: usize,
    },

    /// A raw value conversion failed (not yet tagged with a column)
    #[error("type conversion error: {message}")]
    TypeConversion { message: String },

    /// The cursor or lookup row failed to produce a value
    #[error("source error: {message}")]
    Source {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// The statement rejected a binding
    #[error("binding error at parameter {position}: {message}")]
    Binding { position: usize, message: String },

    /// A logical type string could not be parsed
    #[error("invalid logical type '{input}': {message}")]
    InvalidType { input: String, message: String },

    /// Configuration error
    #[error("configuration error: {message}")]
    Configuration { message: String },
}

impl Error {
    /// Get the error category
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::UnsupportedColumnType { .. } | Self::InvalidType { .. } => ErrorCategory::Schema,
            Self::Conversion { .. } | Self::TypeConversion { .. } | Self::Source { .. } => {
                ErrorCategory::Conversion
            }
            Self::ArityMismatch { .. } => ErrorCategory::Arity,
            Self::Binding { .. } => ErrorCategory::Binding,
            Self::Configuration { .. } => ErrorCategory::Configuration,
        }
    }

    /// Whether this error only affects the row being converted
    #[inline]
    pub fn is_row_level(&self) -> bool {
        self.category().is_row_level()
    }

    /// Column position this error refers to, if any
    pub fn position(&self) -> Option<usize> {
        match self {
            Self::UnsupportedColumnType { position, .. }
            | Self::Conversion { position, .. }
            | Self::Binding { position, .. } => Some(*position),
            _ => None,
        }
    }

    /// Create an unsupported column type error
    pub fn unsupported_type(
        position: usize,
        logical_type: impl fmt::Display,
        reason: impl Into<String>,
    ) -> Self {
        Self::UnsupportedColumnType {
            position,
            logical_type: logical_type.to_string(),
            reason: reason.into(),
        }
    }

    /// Create an arity mismatch error
    pub fn arity(target: &'static str, expected: usize, actual: usize) -> Self {
        Self::ArityMismatch {
            target,
            expected,
            actual,
        }
    }

    /// Create a type conversion error
    pub fn type_conversion(message: impl Into<String>) -> Self {
        Self::TypeConversion {
            message: message.into(),
        }
    }

    /// Create a source error
    pub fn source_failure(message: impl Into<String>) -> Self {
        Self::Source {
            message: message.into(),
            source: None,
        }
    }

    /// Create a source error with cause
    pub fn source_failure_with_cause(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Source {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a binding error
    pub fn binding(position: usize, message: impl Into<String>) -> Self {
        Self::Binding {
            position,
            message: message.into(),
        }
    }

    /// Create an invalid logical type error
    pub fn invalid_type(input: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidType {
            input: input.into(),
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Tag this error with the column position only
    pub fn at_position(self, position: usize) -> Self {
        self.at_column(position, "")
    }

    /// Tag this error with the column it happened at.
    ///
    /// A conversion error already tagged with the same position but no
    /// column name gets the name filled in. Other conversion errors, and
    /// fatal misconfiguration errors, are returned unchanged.
    pub fn at_column(self, position: usize, column: &str) -> Self {
        match self {
            Self::Conversion {
                position: tagged,
                column: existing,
                message,
                source,
            } => {
                let column = if tagged == position && existing.is_empty() {
                    column.to_owned()
                } else {
                    existing
                };
                Self::Conversion {
                    position: tagged,
                    column,
                    message,
                    source,
                }
            }
            fatal @ (Self::ArityMismatch { .. }
            | Self::UnsupportedColumnType { .. }
            | Self::Configuration { .. }) => fatal,
            Self::TypeConversion { message } => Self::Conversion {
                position,
                column: column.to_owned(),
                message,
                source: None,
            },
            other => Self::Conversion {
                position,
                column: column.to_owned(),
                message: other.to_string(),
                source: Some(Box::new(other)),
            },
        }
    }
}

fn column_suffix(column: &str) -> String {
    if column.is_empty() {
        String::new()
    } else {
        format!(" ({})", column)
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Schema => write!(f, "schema"),
            Self::Conversion => write!(f, "conversion"),
            Self::Arity => write!(f, "arity"),
            Self::Binding => write!(f, "binding"),
            Self::Configuration => write!(f, "configuration"),
        }
    }
}
