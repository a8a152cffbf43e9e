//! # rivven-convert
//!
//! Row conversion between relational database rows and Rivven's internal
//! row representation.
//!
//! A [`RowConverter`] is built once from an ordered column list and then
//! converts rows in both directions:
//!
//! - **Cursor rows** (live query results) into [`RowData`]
//! - **Lookup rows** (pre-materialized, e.g. JSON arrays from a lookup cache)
//!   into [`RowData`], with the same results as the cursor path
//! - [`RowData`] into **statement parameters**, binding SQL NULL for absent
//!   fields, typed with the column's SQL type by default
//!
//! Every column type is checked when the converter is built; an unsupported
//! type fails construction instead of the first row.
//!
//! ## Quick Start
//!
//! ```rust
//! use rivven_convert::prelude::*;
//!
//! let config = RowConverterConfig::from_json(r#"{
//!     "columns": [
//!         { "name": "id", "type": "INT" },
//!         { "name": "name", "type": "VARCHAR(64)" },
//!         { "name": "created", "type": "DATE" }
//!     ]
//! }"#)?;
//! let converter = RowConverter::from_config(&config)?;
//!
//! let row = converter.to_internal_lookup(&serde_json::json!([42, "abc", null]))?;
//! assert_eq!(row.get(0), Some(&Datum::Int(42)));
//!
//! let mut stmt = NamedStatement::parse(
//!     "INSERT INTO users (id, name, created) VALUES (:id, :name, :created)",
//!     &config.row_type().field_names(),
//! )?;
//! converter.to_external(&row, &mut stmt)?;
//! assert_eq!(stmt.sql(), "INSERT INTO users (id, name, created) VALUES (?, ?, ?)");
//! # Ok::<(), rivven_convert::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod config;
pub mod converter;
pub mod data;
pub mod error;
pub mod logical;
pub mod mapping;
pub mod nullable;
pub mod registry;
pub mod source;
pub mod statement;
pub mod types;

/// Prelude module for convenient imports
pub mod prelude {
    // Error types
    pub use crate::error::{Error, ErrorCategory, Result};

    // Boundary values
    pub use crate::types::{Row, Value};

    // Internal rows
    pub use crate::data::{Datum, RowData, RowKind};

    // Logical types and SQL type mapping
    pub use crate::logical::{LogicalType, LogicalTypeKind, RowField, RowType};
    pub use crate::mapping::{SqlType, StandardTypeMapping, TypeMapping};

    // Collaborators
    pub use crate::source::{CursorRow, LookupRow};
    pub use crate::statement::{Binding, BoundStatement, NamedStatement, StatementBinder};

    // Converters
    pub use crate::config::RowConverterConfig;
    pub use crate::converter::{RowConverter, RowConverterBuilder};
    pub use crate::nullable::{NullBinding, NullStrategy};
}

// Re-export commonly used items at crate root
pub use converter::RowConverter;
pub use data::RowData;
pub use error::{Error, Result};
pub use types::Value;
