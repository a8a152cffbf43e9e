//! Row converter configuration
//!
//! ```json
//! {
//!   "columns": [
//!     { "name": "id", "type": "BIGINT NOT NULL" },
//!     { "name": "price", "type": "DECIMAL(10, 2)" }
//!   ],
//!   "null_strategy": "untyped"
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::{Error, Result};
use crate::logical::{RowField, RowType};
use crate::nullable::NullStrategy;

/// Row converter configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RowConverterConfig {
    /// Columns in positional order
    pub columns: Vec<RowField>,

    /// How absent fields are bound on the write path
    #[serde(default)]
    pub null_strategy: NullStrategy,
}

impl RowConverterConfig {
    /// Create a config with the default null strategy
    pub fn new(columns: Vec<RowField>) -> Self {
        Self {
            columns,
            null_strategy: NullStrategy::default(),
        }
    }

    /// Set the null strategy
    pub fn with_null_strategy(mut self, null_strategy: NullStrategy) -> Self {
        self.null_strategy = null_strategy;
        self
    }

    /// Parse and validate a JSON config
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| Error::config(format!("invalid converter config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate column names
    pub fn validate(&self) -> Result<()> {
        if self.columns.is_empty() {
            return Err(Error::config("'columns' must not be empty"));
        }

        let mut seen = HashSet::with_capacity(self.columns.len());
        for (position, column) in self.columns.iter().enumerate() {
            let name = column.name.trim();
            if name.is_empty() {
                return Err(Error::config(format!(
                    "column {} has an empty name",
                    position
                )));
            }
            if !seen.insert(name.to_lowercase()) {
                return Err(Error::config(format!("duplicate column name '{}'", name)));
            }
        }
        Ok(())
    }

    /// Row type described by the columns
    pub fn row_type(&self) -> RowType {
        RowType::new(self.columns.clone())
    }
}
