//! Write-side collaborators
//!
//! - StatementBinder: positional parameter sink the row converter binds into
//! - BoundStatement: in-memory binder that enforces bind-once per parameter
//! - NamedStatement: SQL with `:field` placeholders, bound by row field index
//!
//! Positions are 0-based.

use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::mapping::SqlType;
use crate::types::Value;

/// Positional parameter sink of an outgoing statement
pub trait StatementBinder {
    /// Number of bindable positions
    fn parameter_count(&self) -> usize;

    /// Bind a value at `position`
    fn bind(&mut self, position: usize, value: Value) -> Result<()>;

    /// Bind SQL NULL of a specific SQL type at `position`
    fn bind_null(&mut self, position: usize, sql_type: SqlType) -> Result<()>;

    /// Drop all bindings made so far
    fn clear(&mut self);
}

/// A single parameter binding
#[derive(Debug, Clone, PartialEq)]
pub enum Binding {
    /// A value; `Value::Null` is an untyped null
    Value(Value),
    /// A null tagged with its SQL type
    Null(SqlType),
}

impl Binding {
    /// Whether this binding is a null of either form
    pub fn is_null(&self) -> bool {
        match self {
            Self::Value(v) => v.is_null(),
            Self::Null(_) => true,
        }
    }

    /// SQL type of a typed null
    pub fn null_type(&self) -> Option<SqlType> {
        match self {
            Self::Null(sql_type) => Some(*sql_type),
            Self::Value(_) => None,
        }
    }

    /// The bound value; typed nulls become `Value::Null`
    pub fn into_value(self) -> Value {
        match self {
            Self::Value(v) => v,
            Self::Null(_) => Value::Null,
        }
    }
}

/// In-memory statement that records bindings.
///
/// Every parameter must be bound exactly once before the bindings are taken;
/// call [`StatementBinder::clear`] to reuse the statement for the next row.
#[derive(Debug, Clone)]
pub struct BoundStatement {
    sql: String,
    slots: Vec<Option<Binding>>,
}

impl BoundStatement {
    /// Create a statement with `parameter_count` unbound parameters
    pub fn new(sql: impl Into<String>, parameter_count: usize) -> Self {
        Self {
            sql: sql.into(),
            slots: vec![None; parameter_count],
        }
    }

    /// SQL text
    #[inline]
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Binding at `position`, if bound
    pub fn binding(&self, position: usize) -> Option<&Binding> {
        self.slots.get(position).and_then(Option::as_ref)
    }

    /// All slots in order
    #[inline]
    pub fn bindings(&self) -> &[Option<Binding>] {
        &self.slots
    }

    /// Whether every parameter is bound
    pub fn is_fully_bound(&self) -> bool {
        self.slots.iter().all(Option::is_some)
    }

    /// Positions that are still unbound
    pub fn unbound_positions(&self) -> Vec<usize> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_none())
            .map(|(i, _)| i)
            .collect()
    }

    /// Take the bindings; fails while any parameter is unbound
    pub fn into_bindings(self) -> Result<Vec<Binding>> {
        if let Some(position) = self.slots.iter().position(Option::is_none) {
            return Err(Error::binding(position, "parameter not bound"));
        }
        Ok(self.slots.into_iter().flatten().collect())
    }

    /// Take the bound values, typed nulls becoming `Value::Null`
    pub fn into_params(self) -> Result<Vec<Value>> {
        Ok(self
            .into_bindings()?
            .into_iter()
            .map(Binding::into_value)
            .collect())
    }

    fn set(&mut self, position: usize, binding: Binding) -> Result<()> {
        let count = self.slots.len();
        let slot = self.slots.get_mut(position).ok_or_else(|| {
            Error::binding(
                position,
                format!("parameter index out of range ({} parameters)", count),
            )
        })?;
        if slot.is_some() {
            return Err(Error::binding(position, "parameter already bound"));
        }
        *slot = Some(binding);
        Ok(())
    }
}

impl StatementBinder for BoundStatement {
    fn parameter_count(&self) -> usize {
        self.slots.len()
    }

    fn bind(&mut self, position: usize, value: Value) -> Result<()> {
        self.set(position, Binding::Value(value))
    }

    fn bind_null(&mut self, position: usize, sql_type: SqlType) -> Result<()> {
        self.set(position, Binding::Null(sql_type))
    }

    fn clear(&mut self) {
        self.slots.iter_mut().for_each(|slot| *slot = None);
    }
}

/// Statement written with `:name` placeholders.
///
/// Placeholders are rewritten to `?` and numbered in order of appearance.
/// Binding position `i` targets the `i`-th field name and fans out to every
/// placeholder that names it, so a field may be referenced more than once
/// (e.g. in both the insert and the update part of an upsert).
#[derive(Debug, Clone)]
pub struct NamedStatement {
    statement: BoundStatement,
    field_placeholders: Vec<Vec<usize>>,
}

impl NamedStatement {
    /// Parse `sql` and map each of `field_names` to its placeholders.
    ///
    /// Fails if a field name has no placeholder in the SQL.
    pub fn parse<S: AsRef<str>>(sql: &str, field_names: &[S]) -> Result<Self> {
        let (rewritten, names) = parse_named_sql(sql);

        let mut by_name: HashMap<&str, Vec<usize>> = HashMap::new();
        for (index, name) in names.iter().enumerate() {
            by_name.entry(name.as_str()).or_default().push(index);
        }

        let field_placeholders = field_names
            .iter()
            .map(|field| {
                by_name.get(field.as_ref()).cloned().ok_or_else(|| {
                    Error::config(format!(
                        "field '{}' has no placeholder in statement: {}",
                        field.as_ref(),
                        sql
                    ))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            statement: BoundStatement::new(rewritten, names.len()),
            field_placeholders,
        })
    }

    /// SQL with positional `?` placeholders
    #[inline]
    pub fn sql(&self) -> &str {
        self.statement.sql()
    }

    /// Placeholder indexes bound by field `position`
    pub fn placeholders(&self, position: usize) -> Option<&[usize]> {
        self.field_placeholders.get(position).map(Vec::as_slice)
    }

    /// The underlying positional statement
    #[inline]
    pub fn statement(&self) -> &BoundStatement {
        &self.statement
    }

    /// Take the bound values in placeholder order
    pub fn into_params(self) -> Result<Vec<Value>> {
        self.statement.into_params()
    }

    fn targets(&self, position: usize) -> Result<Vec<usize>> {
        self.field_placeholders
            .get(position)
            .cloned()
            .ok_or_else(|| {
                Error::binding(
                    position,
                    format!(
                        "field index out of range ({} fields)",
                        self.field_placeholders.len()
                    ),
                )
            })
    }
}

impl StatementBinder for NamedStatement {
    fn parameter_count(&self) -> usize {
        self.field_placeholders.len()
    }

    fn bind(&mut self, position: usize, value: Value) -> Result<()> {
        for index in self.targets(position)? {
            self.statement.bind(index, value.clone())?;
        }
        Ok(())
    }

    fn bind_null(&mut self, position: usize, sql_type: SqlType) -> Result<()> {
        for index in self.targets(position)? {
            self.statement.bind_null(index, sql_type)?;
        }
        Ok(())
    }

    fn clear(&mut self) {
        self.statement.clear();
    }
}

/// Rewrite `:name` placeholders to `?`, returning the names in order.
///
/// Quoted literals and identifiers are copied verbatim and `::` casts are left
/// alone.
fn parse_named_sql(sql: &str) -> (String, Vec<String>) {
    let mut out = String::with_capacity(sql.len());
    let mut names = Vec::new();
    let mut chars = sql.chars().peekable();
    let mut quote: Option<char> = None;

    while let Some(c) = chars.next() {
        if let Some(q) = quote {
            out.push(c);
            if c == q {
                quote = None;
            }
            continue;
        }

        match c {
            '\'' | '"' | '`' => {
                quote = Some(c);
                out.push(c);
            }
            ':' if chars.peek() == Some(&':') => {
                out.push_str("::");
                chars.next();
            }
            ':' if chars
                .peek()
                .is_some_and(|n| n.is_ascii_alphabetic() || *n == '_') =>
            {
                let mut name = String::new();
                while let Some(&n) = chars.peek() {
                    if n.is_ascii_alphanumeric() || n == '_' {
                        name.push(n);
                        chars.next();
                    } else {
                        break;
                    }
                }
                names.push(name);
                out.push('?');
            }
            _ => out.push(c),
        }
    }

    (out, names)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bound_statement_bind_once() {
        let mut stmt = BoundStatement::new("INSERT INTO t VALUES (?, ?)", 2);
        stmt.bind(0, Value::Int32(1)).unwrap();

        let err = stmt.bind(0, Value::Int32(2)).unwrap_err();
        assert!(matches!(err, Error::Binding { position: 0, .. }));
        assert!(stmt.bind_null(2, SqlType::Date).is_err());
        assert_eq!(stmt.unbound_positions(), vec![1]);
    }

    #[test]
    fn test_into_params_requires_all_bound() {
        let mut stmt = BoundStatement::new("", 2);
        stmt.bind(0, Value::from("a")).unwrap();
        assert!(stmt.clone().into_params().is_err());

        stmt.bind_null(1, SqlType::Date).unwrap();
        assert!(stmt.is_fully_bound());
        assert_eq!(stmt.binding(1), Some(&Binding::Null(SqlType::Date)));
        assert_eq!(
            stmt.into_params().unwrap(),
            vec![Value::from("a"), Value::Null]
        );
    }

    #[test]
    fn test_clear_allows_rebinding() {
        let mut stmt = BoundStatement::new("", 1);
        stmt.bind(0, Value::Int32(1)).unwrap();
        stmt.clear();
        stmt.bind(0, Value::Int32(2)).unwrap();
        assert_eq!(stmt.binding(0), Some(&Binding::Value(Value::Int32(2))));
    }

    #[test]
    fn test_parse_named_sql() {
        let (sql, names) = parse_named_sql(
            "UPDATE t SET name = :name, note = ':skip', ts = :ts::timestamp WHERE id = :id",
        );
        assert_eq!(
            sql,
            "UPDATE t SET name = ?, note = ':skip', ts = ?::timestamp WHERE id = ?"
        );
        assert_eq!(names, vec!["name", "ts", "id"]);
    }

    #[test]
    fn test_named_statement_fan_out() {
        let mut stmt = NamedStatement::parse(
            "INSERT INTO t (id, v) VALUES (:id, :v) ON CONFLICT (id) DO UPDATE SET v = :v",
            &["id", "v"],
        )
        .unwrap();

        assert_eq!(stmt.parameter_count(), 2);
        assert_eq!(stmt.placeholders(1), Some(&[1, 2][..]));

        stmt.bind(0, Value::Int64(7)).unwrap();
        stmt.bind_null(1, SqlType::VarChar).unwrap();

        assert_eq!(
            stmt.statement().binding(2),
            Some(&Binding::Null(SqlType::VarChar))
        );
        assert_eq!(
            stmt.into_params().unwrap(),
            vec![Value::Int64(7), Value::Null, Value::Null]
        );
    }

    #[test]
    fn test_named_statement_missing_field() {
        let err = NamedStatement::parse("SELECT * FROM t WHERE id = :id", &["id", "name"])
            .unwrap_err();
        assert!(err.to_string().contains("name"));
    }
}
