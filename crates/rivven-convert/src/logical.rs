//! Logical column types
//!
//! A [`LogicalType`] is the engine-side type of a column, independent of how
//! the external source encodes it. Types are written the way SQL DDL spells
//! them (`INT`, `DECIMAL(10, 2) NOT NULL`, `TIMESTAMP(3) WITH LOCAL TIME ZONE`,
//! `ARRAY<STRING>`) and parse back from that form, which is also their serde
//! representation.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Maximum length of CHAR/VARCHAR/BINARY/VARBINARY columns
pub const MAX_LENGTH: u32 = i32::MAX as u32;

/// Maximum DECIMAL precision accepted by the parser
pub const MAX_DECIMAL_PRECISION: u32 = 38;

/// Maximum fractional-second precision for TIME and TIMESTAMP
pub const MAX_TIME_PRECISION: u32 = 9;

/// The shape of a logical type, without nullability
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LogicalTypeKind {
    /// The type of the NULL literal; every value is null
    Null,
    /// BOOLEAN
    Boolean,
    /// TINYINT
    TinyInt,
    /// SMALLINT
    SmallInt,
    /// INT / INTEGER
    Integer,
    /// BIGINT
    BigInt,
    /// FLOAT / REAL
    Float,
    /// DOUBLE
    Double,
    /// DECIMAL(p, s)
    Decimal {
        /// Total digits
        precision: u32,
        /// Digits after the decimal point
        scale: u32,
    },
    /// CHAR(n)
    Char {
        /// Fixed length
        length: u32,
    },
    /// VARCHAR(n); STRING is VARCHAR([`MAX_LENGTH`])
    VarChar {
        /// Maximum length
        length: u32,
    },
    /// BINARY(n)
    Binary {
        /// Fixed length
        length: u32,
    },
    /// VARBINARY(n); BYTES is VARBINARY([`MAX_LENGTH`])
    VarBinary {
        /// Maximum length
        length: u32,
    },
    /// DATE
    Date,
    /// TIME(p)
    Time {
        /// Fractional-second digits
        precision: u32,
    },
    /// TIMESTAMP(p) without time zone
    Timestamp {
        /// Fractional-second digits
        precision: u32,
    },
    /// TIMESTAMP(p) WITH LOCAL TIME ZONE
    TimestampLtz {
        /// Fractional-second digits
        precision: u32,
    },
    /// INTERVAL with its qualifier, e.g. `DAY TO SECOND(3)`
    Interval {
        /// Qualifier text
        qualifier: String,
    },
    /// ARRAY<T>
    Array(Box<LogicalType>),
    /// MULTISET<T>
    Multiset(Box<LogicalType>),
    /// MAP<K, V>
    Map(Box<LogicalType>, Box<LogicalType>),
    /// ROW<name T, ...>
    Row(Vec<(String, LogicalType)>),
    /// RAW('class')
    Raw {
        /// Opaque class name
        class: String,
    },
}

/// Logical type of a column: kind plus nullability
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LogicalType {
    kind: LogicalTypeKind,
    nullable: bool,
}

impl LogicalType {
    /// Create a nullable logical type
    pub const fn new(kind: LogicalTypeKind) -> Self {
        Self {
            kind,
            nullable: true,
        }
    }

    /// Get the kind
    #[inline]
    pub fn kind(&self) -> &LogicalTypeKind {
        &self.kind
    }

    /// Whether values of this type may be null
    #[inline]
    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    /// Whether this is the NULL type
    #[inline]
    pub fn is_null_kind(&self) -> bool {
        matches!(self.kind, LogicalTypeKind::Null)
    }

    /// Copy of this type with the given nullability.
    ///
    /// The NULL type is always nullable.
    pub fn with_nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable || self.is_null_kind();
        self
    }

    /// Copy of this type marked NOT NULL
    pub fn not_null(self) -> Self {
        self.with_nullable(false)
    }

    /// NULL
    pub const fn null() -> Self {
        Self::new(LogicalTypeKind::Null)
    }

    /// BOOLEAN
    pub const fn boolean() -> Self {
        Self::new(LogicalTypeKind::Boolean)
    }

    /// TINYINT
    pub const fn tiny_int() -> Self {
        Self::new(LogicalTypeKind::TinyInt)
    }

    /// SMALLINT
    pub const fn small_int() -> Self {
        Self::new(LogicalTypeKind::SmallInt)
    }

    /// INT
    pub const fn int() -> Self {
        Self::new(LogicalTypeKind::Integer)
    }

    /// BIGINT
    pub const fn big_int() -> Self {
        Self::new(LogicalTypeKind::BigInt)
    }

    /// FLOAT
    pub const fn float() -> Self {
        Self::new(LogicalTypeKind::Float)
    }

    /// DOUBLE
    pub const fn double() -> Self {
        Self::new(LogicalTypeKind::Double)
    }

    /// DECIMAL(precision, scale)
    pub const fn decimal(precision: u32, scale: u32) -> Self {
        Self::new(LogicalTypeKind::Decimal { precision, scale })
    }

    /// CHAR(length)
    pub const fn char(length: u32) -> Self {
        Self::new(LogicalTypeKind::Char { length })
    }

    /// VARCHAR(length)
    pub const fn varchar(length: u32) -> Self {
        Self::new(LogicalTypeKind::VarChar { length })
    }

    /// STRING
    pub const fn string() -> Self {
        Self::varchar(MAX_LENGTH)
    }

    /// BINARY(length)
    pub const fn binary(length: u32) -> Self {
        Self::new(LogicalTypeKind::Binary { length })
    }

    /// VARBINARY(length)
    pub const fn varbinary(length: u32) -> Self {
        Self::new(LogicalTypeKind::VarBinary { length })
    }

    /// BYTES
    pub const fn bytes() -> Self {
        Self::varbinary(MAX_LENGTH)
    }

    /// DATE
    pub const fn date() -> Self {
        Self::new(LogicalTypeKind::Date)
    }

    /// TIME(precision)
    pub const fn time(precision: u32) -> Self {
        Self::new(LogicalTypeKind::Time { precision })
    }

    /// TIMESTAMP(precision)
    pub const fn timestamp(precision: u32) -> Self {
        Self::new(LogicalTypeKind::Timestamp { precision })
    }

    /// TIMESTAMP(precision) WITH LOCAL TIME ZONE
    pub const fn timestamp_ltz(precision: u32) -> Self {
        Self::new(LogicalTypeKind::TimestampLtz { precision })
    }
}

impl From<LogicalTypeKind> for LogicalType {
    fn from(kind: LogicalTypeKind) -> Self {
        Self::new(kind)
    }
}

impl fmt::Display for LogicalTypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "NULL"),
            Self::Boolean => write!(f, "BOOLEAN"),
            Self::TinyInt => write!(f, "TINYINT"),
            Self::SmallInt => write!(f, "SMALLINT"),
            Self::Integer => write!(f, "INT"),
            Self::BigInt => write!(f, "BIGINT"),
            Self::Float => write!(f, "FLOAT"),
            Self::Double => write!(f, "DOUBLE"),
            Self::Decimal { precision, scale } => write!(f, "DECIMAL({}, {})", precision, scale),
            Self::Char { length } => write!(f, "CHAR({})", length),
            Self::VarChar { length } if *length == MAX_LENGTH => write!(f, "STRING"),
            Self::VarChar { length } => write!(f, "VARCHAR({})", length),
            Self::Binary { length } => write!(f, "BINARY({})", length),
            Self::VarBinary { length } if *length == MAX_LENGTH => write!(f, "BYTES"),
            Self::VarBinary { length } => write!(f, "VARBINARY({})", length),
            Self::Date => write!(f, "DATE"),
            Self::Time { precision } => write!(f, "TIME({})", precision),
            Self::Timestamp { precision } => write!(f, "TIMESTAMP({})", precision),
            Self::TimestampLtz { precision } => {
                write!(f, "TIMESTAMP({}) WITH LOCAL TIME ZONE", precision)
            }
            Self::Interval { qualifier } => write!(f, "INTERVAL {}", qualifier),
            Self::Array(element) => write!(f, "ARRAY<{}>", element),
            Self::Multiset(element) => write!(f, "MULTISET<{}>", element),
            Self::Map(key, value) => write!(f, "MAP<{}, {}>", key, value),
            Self::Row(fields) => {
                write!(f, "ROW<")?;
                for (i, (name, ty)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "`{}` {}", name.replace('`', "``"), ty)?;
                }
                write!(f, ">")
            }
            Self::Raw { class } => write!(f, "RAW('{}')", class.replace('\'', "''")),
        }
    }
}

impl fmt::Display for LogicalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if !self.nullable {
            write!(f, " NOT NULL")?;
        }
        Ok(())
    }
}

impl FromStr for LogicalType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let tokens = tokenize(s)?;
        let mut parser = TypeParser {
            input: s,
            tokens,
            pos: 0,
        };
        let ty = parser.parse_type()?;
        if let Some(token) = parser.peek() {
            return Err(parser.error(format!("unexpected trailing {}", token)));
        }
        Ok(ty)
    }
}

impl TryFrom<String> for LogicalType {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<LogicalType> for String {
    fn from(value: LogicalType) -> Self {
        value.to_string()
    }
}

/// A named column of a [`RowType`]
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RowField {
    /// Column name
    pub name: String,
    /// Column type
    #[serde(rename = "type")]
    pub logical_type: LogicalType,
}

impl RowField {
    /// Create a row field
    pub fn new(name: impl Into<String>, logical_type: LogicalType) -> Self {
        Self {
            name: name.into(),
            logical_type,
        }
    }
}

/// Ordered column list; its length is the arity of every converted row
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RowType {
    fields: Vec<RowField>,
}

impl RowType {
    /// Create a row type from named fields
    pub fn new(fields: Vec<RowField>) -> Self {
        Self { fields }
    }

    /// Create a row type from bare types, naming columns `f0`, `f1`, ...
    pub fn from_types(types: impl IntoIterator<Item = LogicalType>) -> Self {
        Self {
            fields: types
                .into_iter()
                .enumerate()
                .map(|(i, ty)| RowField::new(format!("f{}", i), ty))
                .collect(),
        }
    }

    /// Number of columns
    #[inline]
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Columns in order
    #[inline]
    pub fn fields(&self) -> &[RowField] {
        &self.fields
    }

    /// Type of the column at `position`
    pub fn type_at(&self, position: usize) -> Option<&LogicalType> {
        self.fields.get(position).map(|f| &f.logical_type)
    }

    /// Column names in order
    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }

    /// Position of a column by name (case-insensitive)
    pub fn position_of(&self, name: &str) -> Option<usize> {
        self.fields
            .iter()
            .position(|f| f.name.eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for RowType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = LogicalTypeKind::Row(
            self.fields
                .iter()
                .map(|field| (field.name.clone(), field.logical_type.clone()))
                .collect(),
        );
        fmt::Display::fmt(&kind, f)
    }
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Word(String),
    Quoted(String),
    Literal(String),
    Number(u32),
    Punct(char),
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Word(w) => write!(f, "'{}'", w),
            Self::Quoted(q) => write!(f, "`{}`", q),
            Self::Literal(l) => write!(f, "literal '{}'", l),
            Self::Number(n) => write!(f, "number {}", n),
            Self::Punct(c) => write!(f, "'{}'", c),
        }
    }
}

fn tokenize(input: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();

    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
        } else if c.is_ascii_alphabetic() || c == '_' {
            let mut word = String::new();
            while let Some(&c) = chars.peek() {
                if c.is_ascii_alphanumeric() || c == '_' {
                    word.push(c);
                    chars.next();
                } else {
                    break;
                }
            }
            tokens.push(Token::Word(word));
        } else if c.is_ascii_digit() {
            let mut digits = String::new();
            while let Some(&c) = chars.peek() {
                if c.is_ascii_digit() {
                    digits.push(c);
                    chars.next();
                } else {
                    break;
                }
            }
            let n = digits
                .parse()
                .map_err(|_| Error::invalid_type(input, format!("number {} too large", digits)))?;
            tokens.push(Token::Number(n));
        } else if c == '`' || c == '\'' {
            chars.next();
            let mut text = String::new();
            loop {
                match chars.next() {
                    Some(ch) if ch == c => {
                        // doubled quote is an escaped quote
                        if chars.peek() == Some(&c) {
                            text.push(c);
                            chars.next();
                        } else {
                            break;
                        }
                    }
                    Some(ch) => text.push(ch),
                    None => return Err(Error::invalid_type(input, "unterminated quote")),
                }
            }
            tokens.push(if c == '`' {
                Token::Quoted(text)
            } else {
                Token::Literal(text)
            });
        } else if matches!(c, '(' | ')' | '<' | '>' | ',') {
            tokens.push(Token::Punct(c));
            chars.next();
        } else {
            return Err(Error::invalid_type(
                input,
                format!("unexpected character '{}'", c),
            ));
        }
    }

    Ok(tokens)
}

struct TypeParser<'a> {
    input: &'a str,
    tokens: Vec<Token>,
    pos: usize,
}

impl TypeParser<'_> {
    fn error(&self, message: impl Into<String>) -> Error {
        Error::invalid_type(self.input, message)
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn peek_keyword(&self, keyword: &str) -> bool {
        matches!(self.peek(), Some(Token::Word(w)) if w.eq_ignore_ascii_case(keyword))
    }

    fn eat_keyword(&mut self, keyword: &str) -> bool {
        if self.peek_keyword(keyword) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect_keyword(&mut self, keyword: &str) -> Result<()> {
        if self.eat_keyword(keyword) {
            Ok(())
        } else {
            Err(self.error(format!("expected {}", keyword)))
        }
    }

    fn eat_punct(&mut self, punct: char) -> bool {
        if self.peek() == Some(&Token::Punct(punct)) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect_punct(&mut self, punct: char) -> Result<()> {
        if self.eat_punct(punct) {
            Ok(())
        } else {
            Err(self.error(format!("expected '{}'", punct)))
        }
    }

    fn expect_number(&mut self) -> Result<u32> {
        match self.next() {
            Some(Token::Number(n)) => Ok(n),
            Some(other) => Err(self.error(format!("expected number, found {}", other))),
            None => Err(self.error("expected number, found end of input")),
        }
    }

    /// Parses `(n)` if present
    fn optional_arg(&mut self) -> Result<Option<u32>> {
        if !self.eat_punct('(') {
            return Ok(None);
        }
        let n = self.expect_number()?;
        self.expect_punct(')')?;
        Ok(Some(n))
    }

    fn length(&mut self, default: u32) -> Result<u32> {
        let length = self.optional_arg()?.unwrap_or(default);
        if length == 0 || length > MAX_LENGTH {
            return Err(self.error(format!("length must be between 1 and {}", MAX_LENGTH)));
        }
        Ok(length)
    }

    fn time_precision(&mut self, default: u32) -> Result<u32> {
        let precision = self.optional_arg()?.unwrap_or(default);
        if precision > MAX_TIME_PRECISION {
            return Err(self.error(format!(
                "precision must be between 0 and {}",
                MAX_TIME_PRECISION
            )));
        }
        Ok(precision)
    }

    fn parse_type(&mut self) -> Result<LogicalType> {
        let word = match self.next() {
            Some(Token::Word(w)) => w.to_ascii_uppercase(),
            Some(other) => return Err(self.error(format!("expected type name, found {}", other))),
            None => return Err(self.error("empty type")),
        };

        let kind = match word.as_str() {
            "NULL" => LogicalTypeKind::Null,
            "BOOLEAN" | "BOOL" => LogicalTypeKind::Boolean,
            "TINYINT" => LogicalTypeKind::TinyInt,
            "SMALLINT" => LogicalTypeKind::SmallInt,
            "INT" | "INTEGER" => LogicalTypeKind::Integer,
            "BIGINT" => LogicalTypeKind::BigInt,
            "FLOAT" | "REAL" => LogicalTypeKind::Float,
            "DOUBLE" => {
                self.eat_keyword("PRECISION");
                LogicalTypeKind::Double
            }
            "DECIMAL" | "DEC" | "NUMERIC" => self.parse_decimal()?,
            "CHAR" | "CHARACTER" => {
                if self.eat_keyword("VARYING") {
                    LogicalTypeKind::VarChar {
                        length: self.length(1)?,
                    }
                } else {
                    LogicalTypeKind::Char {
                        length: self.length(1)?,
                    }
                }
            }
            "VARCHAR" => LogicalTypeKind::VarChar {
                length: self.length(1)?,
            },
            "STRING" => LogicalTypeKind::VarChar { length: MAX_LENGTH },
            "BINARY" => LogicalTypeKind::Binary {
                length: self.length(1)?,
            },
            "VARBINARY" => LogicalTypeKind::VarBinary {
                length: self.length(1)?,
            },
            "BYTES" => LogicalTypeKind::VarBinary { length: MAX_LENGTH },
            "DATE" => LogicalTypeKind::Date,
            "TIME" => {
                let precision = self.time_precision(0)?;
                if self.eat_keyword("WITHOUT") {
                    self.expect_keyword("TIME")?;
                    self.expect_keyword("ZONE")?;
                }
                LogicalTypeKind::Time { precision }
            }
            "TIMESTAMP" => {
                let precision = self.time_precision(6)?;
                if self.eat_keyword("WITHOUT") {
                    self.expect_keyword("TIME")?;
                    self.expect_keyword("ZONE")?;
                    LogicalTypeKind::Timestamp { precision }
                } else if self.eat_keyword("WITH") {
                    self.expect_keyword("LOCAL")?;
                    self.expect_keyword("TIME")?;
                    self.expect_keyword("ZONE")?;
                    LogicalTypeKind::TimestampLtz { precision }
                } else {
                    LogicalTypeKind::Timestamp { precision }
                }
            }
            "TIMESTAMP_LTZ" => LogicalTypeKind::TimestampLtz {
                precision: self.time_precision(6)?,
            },
            "INTERVAL" => self.parse_interval()?,
            "ARRAY" => LogicalTypeKind::Array(Box::new(self.parse_element()?)),
            "MULTISET" => LogicalTypeKind::Multiset(Box::new(self.parse_element()?)),
            "MAP" => {
                self.expect_punct('<')?;
                let key = self.parse_type()?;
                self.expect_punct(',')?;
                let value = self.parse_type()?;
                self.expect_punct('>')?;
                LogicalTypeKind::Map(Box::new(key), Box::new(value))
            }
            "ROW" => self.parse_row()?,
            "RAW" => {
                self.expect_punct('(')?;
                let class = match self.next() {
                    Some(Token::Literal(class)) => class,
                    _ => return Err(self.error("expected class literal")),
                };
                // serializer snapshot is irrelevant to conversion
                if self.eat_punct(',') {
                    self.next();
                }
                self.expect_punct(')')?;
                LogicalTypeKind::Raw { class }
            }
            other => return Err(self.error(format!("unknown type '{}'", other))),
        };

        let mut ty = LogicalType::new(kind);
        if self.eat_keyword("NOT") {
            self.expect_keyword("NULL")?;
            if ty.is_null_kind() {
                return Err(self.error("NULL type cannot be NOT NULL"));
            }
            ty = ty.not_null();
        } else {
            self.eat_keyword("NULL");
        }
        Ok(ty)
    }

    fn parse_decimal(&mut self) -> Result<LogicalTypeKind> {
        let (precision, scale) = if self.eat_punct('(') {
            let precision = self.expect_number()?;
            let scale = if self.eat_punct(',') {
                self.expect_number()?
            } else {
                0
            };
            self.expect_punct(')')?;
            (precision, scale)
        } else {
            (10, 0)
        };

        if precision == 0 || precision > MAX_DECIMAL_PRECISION {
            return Err(self.error(format!(
                "decimal precision must be between 1 and {}",
                MAX_DECIMAL_PRECISION
            )));
        }
        if scale > precision {
            return Err(self.error("decimal scale must not exceed precision"));
        }
        Ok(LogicalTypeKind::Decimal { precision, scale })
    }

    fn parse_interval(&mut self) -> Result<LogicalTypeKind> {
        let mut parts: Vec<String> = Vec::new();
        loop {
            match self.peek() {
                Some(Token::Word(w))
                    if !w.eq_ignore_ascii_case("NOT") && !w.eq_ignore_ascii_case("NULL") =>
                {
                    parts.push(w.to_ascii_uppercase());
                    self.pos += 1;
                }
                Some(Token::Punct('(')) => {
                    let n = self.optional_arg()?.unwrap_or_default();
                    if let Some(last) = parts.last_mut() {
                        last.push_str(&format!("({})", n));
                    }
                }
                _ => break,
            }
        }
        if parts.is_empty() {
            return Err(self.error("interval requires a qualifier"));
        }
        Ok(LogicalTypeKind::Interval {
            qualifier: parts.join(" "),
        })
    }

    fn parse_element(&mut self) -> Result<LogicalType> {
        self.expect_punct('<')?;
        let element = self.parse_type()?;
        self.expect_punct('>')?;
        Ok(element)
    }

    fn parse_row(&mut self) -> Result<LogicalTypeKind> {
        let close = if self.eat_punct('<') {
            '>'
        } else {
            self.expect_punct('(')?;
            ')'
        };

        let mut fields = Vec::new();
        if !self.eat_punct(close) {
            loop {
                let name = match self.next() {
                    Some(Token::Word(w)) | Some(Token::Quoted(w)) => w,
                    _ => return Err(self.error("expected row field name")),
                };
                let ty = self.parse_type()?;
                fields.push((name, ty));
                if self.eat_punct(close) {
                    break;
                }
                self.expect_punct(',')?;
            }
        }
        Ok(LogicalTypeKind::Row(fields))
    }
}
