//! Per-type converter registry
//!
//! Maps every logical type to a raw deserializer (boundary [`Value`] to
//! [`Datum`]) and a raw serializer ([`Datum`] to a statement binding). Raw
//! converters never see nulls; see [`crate::nullable`] for the wrappers that
//! handle them.
//!
//! Conversions are checked: a value is accepted only if it converts to the
//! column type without loss, otherwise the conversion fails.

use base64::Engine;
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use std::fmt;
use std::sync::Arc;

use crate::data::{Datum, RowData};
use crate::error::{Error, Result};
use crate::logical::{LogicalType, LogicalTypeKind};
use crate::statement::StatementBinder;
use crate::types::Value;

/// Largest DECIMAL precision representable without loss
pub const MAX_SUPPORTED_DECIMAL_PRECISION: u32 = 28;

/// Largest TIME precision representable as milliseconds of day
pub const MAX_SUPPORTED_TIME_PRECISION: u32 = 3;

/// Days from 0001-01-01 (CE) to 1970-01-01
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

const MILLIS_PER_SECOND: i32 = 1_000;
const NANOS_PER_MILLI: u32 = 1_000_000;

/// Largest integer magnitude exactly representable in an f32
const F32_EXACT_INT: i128 = 1 << 24;
/// Largest integer magnitude exactly representable in an f64
const F64_EXACT_INT: i128 = 1 << 53;

type DeserializeFn = dyn Fn(&Value) -> Result<Datum> + Send + Sync;
type SerializeFn = dyn Fn(&RowData, usize, &mut dyn StatementBinder) -> Result<()> + Send + Sync;

/// Converts a non-null boundary value into a datum
#[derive(Clone)]
pub struct RawDeserializer(Arc<DeserializeFn>);

impl RawDeserializer {
    /// Wrap a conversion function
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Value) -> Result<Datum> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Convert a non-null value
    #[inline]
    pub fn deserialize(&self, value: &Value) -> Result<Datum> {
        (self.0)(value)
    }
}

impl fmt::Debug for RawDeserializer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RawDeserializer")
    }
}

/// Binds the non-null field at a position into a statement
#[derive(Clone)]
pub struct RawSerializer(Arc<SerializeFn>);

impl RawSerializer {
    /// Wrap a binding function
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&RowData, usize, &mut dyn StatementBinder) -> Result<()> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

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

impl fmt::Debug for RawSerializer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RawSerializer")
    }
}

/// Why a logical type has no converter, or `None` if it is supported
pub fn unsupported_reason(logical_type: &LogicalType) -> Option<String> {
    match logical_type.kind() {
        LogicalTypeKind::Decimal { precision, .. }
            if *precision > MAX_SUPPORTED_DECIMAL_PRECISION =>
        {
            Some(format!(
                "decimal precision above {}",
                MAX_SUPPORTED_DECIMAL_PRECISION
            ))
        }
        LogicalTypeKind::Time { precision } if *precision > MAX_SUPPORTED_TIME_PRECISION => {
            Some(format!(
                "time precision above {}",
                MAX_SUPPORTED_TIME_PRECISION
            ))
        }
        LogicalTypeKind::Interval { .. } => Some("interval types are not supported".into()),
        LogicalTypeKind::Array(_)
        | LogicalTypeKind::Multiset(_)
        | LogicalTypeKind::Map(..)
        | LogicalTypeKind::Row(_) => Some("nested types are not supported".into()),
        LogicalTypeKind::Raw { .. } => Some("raw types are not supported".into()),
        _ => None,
    }
}

fn check_supported(position: usize, logical_type: &LogicalType) -> Result<()> {
    match unsupported_reason(logical_type) {
        Some(reason) => Err(Error::unsupported_type(position, logical_type, reason)),
        None => Ok(()),
    }
}

/// Create the raw deserializer for the column at `position`
pub fn create_internal_converter(
    position: usize,
    logical_type: &LogicalType,
) -> Result<RawDeserializer> {
    check_supported(position, logical_type)?;

    let converter = match logical_type.kind() {
        LogicalTypeKind::Null => RawDeserializer::new(|value| {
            Err(Error::type_conversion(format!(
                "NULL column received a {} value",
                value.sql_type()
            )))
        }),
        LogicalTypeKind::Boolean => RawDeserializer::new(|value| match value {
            Value::Bool(b) => Ok(Datum::Boolean(*b)),
            other => match integral(other) {
                Some(0) => Ok(Datum::Boolean(false)),
                Some(1) => Ok(Datum::Boolean(true)),
                _ => Err(mismatch("BOOLEAN", other)),
            },
        }),
        LogicalTypeKind::TinyInt => {
            RawDeserializer::new(|value| to_integer(value, "TINYINT").map(Datum::TinyInt))
        }
        LogicalTypeKind::SmallInt => {
            RawDeserializer::new(|value| to_integer(value, "SMALLINT").map(Datum::SmallInt))
        }
        LogicalTypeKind::Integer => {
            RawDeserializer::new(|value| to_integer(value, "INT").map(Datum::Int))
        }
        LogicalTypeKind::BigInt => {
            RawDeserializer::new(|value| to_integer(value, "BIGINT").map(Datum::BigInt))
        }
        LogicalTypeKind::Float => RawDeserializer::new(|value| to_f32(value).map(Datum::Float)),
        LogicalTypeKind::Double => RawDeserializer::new(|value| to_f64(value).map(Datum::Double)),
        LogicalTypeKind::Decimal { precision, scale } => {
            let (precision, scale) = (*precision, *scale);
            RawDeserializer::new(move |value| {
                to_decimal(value, precision, scale).map(Datum::Decimal)
            })
        }
        LogicalTypeKind::Char { .. } | LogicalTypeKind::VarChar { .. } => {
            RawDeserializer::new(|value| match value {
                Value::String(s) => Ok(Datum::String(s.clone())),
                Value::Uuid(u) => Ok(Datum::String(u.to_string())),
                other => Err(mismatch("STRING", other)),
            })
        }
        LogicalTypeKind::Binary { .. } | LogicalTypeKind::VarBinary { .. } => {
            RawDeserializer::new(|value| match value {
                Value::Bytes(b) => Ok(Datum::Binary(b.clone())),
                Value::String(s) => base64::engine::general_purpose::STANDARD
                    .decode(s)
                    .map(Datum::Binary)
                    .map_err(|e| Error::type_conversion(format!("invalid base64 binary: {}", e))),
                other => Err(mismatch("BINARY", other)),
            })
        }
        LogicalTypeKind::Date => RawDeserializer::new(|value| {
            let date = match value {
                Value::Date(d) => *d,
                Value::String(s) => parse_text(s, "DATE")?,
                other => return Err(mismatch("DATE", other)),
            };
            Ok(Datum::Date(date_to_days(date)))
        }),
        LogicalTypeKind::Time { .. } => RawDeserializer::new(|value| {
            let time = match value {
                Value::Time(t) => *t,
                Value::String(s) => parse_text(s, "TIME")?,
                other => return Err(mismatch("TIME", other)),
            };
            time_to_millis(time).map(Datum::Time)
        }),
        LogicalTypeKind::Timestamp { .. } => RawDeserializer::new(|value| match value {
            Value::DateTime(dt) => Ok(Datum::Timestamp(*dt)),
            Value::String(s) => parse_timestamp(s).map(Datum::Timestamp),
            other => Err(mismatch("TIMESTAMP", other)),
        }),
        LogicalTypeKind::TimestampLtz { .. } => RawDeserializer::new(|value| match value {
            Value::DateTimeTz(dt) => Ok(Datum::TimestampLtz(*dt)),
            Value::String(s) => DateTime::parse_from_rfc3339(s.trim())
                .map(|dt| Datum::TimestampLtz(dt.with_timezone(&Utc)))
                .map_err(|e| {
                    Error::type_conversion(format!("invalid TIMESTAMP_LTZ '{}': {}", s, e))
                }),
            other => Err(mismatch("TIMESTAMP_LTZ", other)),
        }),
        LogicalTypeKind::Interval { .. }
        | LogicalTypeKind::Array(_)
        | LogicalTypeKind::Multiset(_)
        | LogicalTypeKind::Map(..)
        | LogicalTypeKind::Row(_)
        | LogicalTypeKind::Raw { .. } => {
            return Err(Error::unsupported_type(
                position,
                logical_type,
                "no converter registered",
            ))
        }
    };

    Ok(converter)
}

/// Create the raw serializer for the column at `position`
pub fn create_external_converter(
    position: usize,
    logical_type: &LogicalType,
) -> Result<RawSerializer> {
    check_supported(position, logical_type)?;

    let converter = match logical_type.kind() {
        LogicalTypeKind::Null => RawSerializer::new(|row, pos, _| {
            Err(Error::type_conversion(format!(
                "NULL column holds a {} value",
                row.get(pos).map_or("missing", Datum::type_name)
            )))
        }),
        LogicalTypeKind::Boolean => datum_serializer(|datum| match datum {
            Datum::Boolean(b) => Ok(Value::Bool(*b)),
            other => Err(datum_mismatch("BOOLEAN", other)),
        }),
        LogicalTypeKind::TinyInt => datum_serializer(|datum| match datum {
            Datum::TinyInt(v) => Ok(Value::Int8(*v)),
            other => Err(datum_mismatch("TINYINT", other)),
        }),
        LogicalTypeKind::SmallInt => datum_serializer(|datum| match datum {
            Datum::SmallInt(v) => Ok(Value::Int16(*v)),
            other => Err(datum_mismatch("SMALLINT", other)),
        }),
        LogicalTypeKind::Integer => datum_serializer(|datum| match datum {
            Datum::Int(v) => Ok(Value::Int32(*v)),
            other => Err(datum_mismatch("INT", other)),
        }),
        LogicalTypeKind::BigInt => datum_serializer(|datum| match datum {
            Datum::BigInt(v) => Ok(Value::Int64(*v)),
            other => Err(datum_mismatch("BIGINT", other)),
        }),
        LogicalTypeKind::Float => datum_serializer(|datum| match datum {
            Datum::Float(v) => Ok(Value::Float32(*v)),
            other => Err(datum_mismatch("FLOAT", other)),
        }),
        LogicalTypeKind::Double => datum_serializer(|datum| match datum {
            Datum::Double(v) => Ok(Value::Float64(*v)),
            other => Err(datum_mismatch("DOUBLE", other)),
        }),
        LogicalTypeKind::Decimal { .. } => datum_serializer(|datum| match datum {
            Datum::Decimal(d) => Ok(Value::Decimal(*d)),
            other => Err(datum_mismatch("DECIMAL", other)),
        }),
        LogicalTypeKind::Char { .. } | LogicalTypeKind::VarChar { .. } => {
            datum_serializer(|datum| match datum {
                Datum::String(s) => Ok(Value::String(s.clone())),
                other => Err(datum_mismatch("STRING", other)),
            })
        }
        LogicalTypeKind::Binary { .. } | LogicalTypeKind::VarBinary { .. } => {
            datum_serializer(|datum| match datum {
                Datum::Binary(b) => Ok(Value::Bytes(b.clone())),
                other => Err(datum_mismatch("BINARY", other)),
            })
        }
        LogicalTypeKind::Date => datum_serializer(|datum| match datum {
            Datum::Date(days) => days_to_date(*days).map(Value::Date),
            other => Err(datum_mismatch("DATE", other)),
        }),
        LogicalTypeKind::Time { .. } => datum_serializer(|datum| match datum {
            Datum::Time(millis) => millis_to_time(*millis).map(Value::Time),
            other => Err(datum_mismatch("TIME", other)),
        }),
        LogicalTypeKind::Timestamp { .. } => datum_serializer(|datum| match datum {
            Datum::Timestamp(dt) => Ok(Value::DateTime(*dt)),
            other => Err(datum_mismatch("TIMESTAMP", other)),
        }),
        LogicalTypeKind::TimestampLtz { .. } => datum_serializer(|datum| match datum {
            Datum::TimestampLtz(dt) => Ok(Value::DateTimeTz(*dt)),
            other => Err(datum_mismatch("TIMESTAMP_LTZ", other)),
        }),
        LogicalTypeKind::Interval { .. }
        | LogicalTypeKind::Array(_)
        | LogicalTypeKind::Multiset(_)
        | LogicalTypeKind::Map(..)
        | LogicalTypeKind::Row(_)
        | LogicalTypeKind::Raw { .. } => {
            return Err(Error::unsupported_type(
                position,
                logical_type,
                "no converter registered",
            ))
        }
    };

    Ok(converter)
}

fn datum_serializer<F>(to_value: F) -> RawSerializer
where
    F: Fn(&Datum) -> Result<Value> + Send + Sync + 'static,
{
    RawSerializer::new(move |row, pos, statement| {
        let datum = row
            .get(pos)
            .ok_or_else(|| Error::type_conversion("field is null"))?;
        statement.bind(pos, to_value(datum)?)
    })
}

fn mismatch(expected: &str, value: &Value) -> Error {
    Error::type_conversion(format!("expected {}, got {}", expected, value.sql_type()))
}

fn datum_mismatch(expected: &str, datum: &Datum) -> Error {
    Error::type_conversion(format!(
        "expected {} field, got {}",
        expected,
        datum.type_name()
    ))
}

/// Integer value of any integer variant or of a decimal with no fraction
fn integral(value: &Value) -> Option<i128> {
    match value {
        Value::Int8(v) => Some(i128::from(*v)),
        Value::Int16(v) => Some(i128::from(*v)),
        Value::Int32(v) => Some(i128::from(*v)),
        Value::Int64(v) => Some(i128::from(*v)),
        Value::Decimal(d) if d.fract().is_zero() => d.to_i128(),
        _ => None,
    }
}

fn to_integer<T: TryFrom<i128>>(value: &Value, expected: &str) -> Result<T> {
    let n = integral(value).ok_or_else(|| mismatch(expected, value))?;
    T::try_from(n)
        .map_err(|_| Error::type_conversion(format!("{} out of range for {}", n, expected)))
}

fn to_f32(value: &Value) -> Result<f32> {
    match value {
        Value::Float32(v) => Ok(*v),
        Value::Float64(v) => {
            let narrowed = *v as f32;
            // exact, or the same shortest decimal text (0.1_f64 vs 0.1_f32)
            if f64::from(narrowed) == *v
                || v.is_nan()
                || narrowed.to_string() == v.to_string()
            {
                Ok(narrowed)
            } else {
                Err(not_representable(v, "FLOAT"))
            }
        }
        Value::Decimal(d) if !d.fract().is_zero() => decimal_to_float(d, "FLOAT"),
        other => match integral(other) {
            Some(n) if n.abs() <= F32_EXACT_INT => Ok(n as f32),
            Some(n) => Err(not_representable(n, "FLOAT")),
            None => Err(mismatch("FLOAT", other)),
        },
    }
}

fn to_f64(value: &Value) -> Result<f64> {
    match value {
        Value::Float32(v) => Ok(f64::from(*v)),
        Value::Float64(v) => Ok(*v),
        Value::Decimal(d) if !d.fract().is_zero() => decimal_to_float(d, "DOUBLE"),
        other => match integral(other) {
            Some(n) if n.abs() <= F64_EXACT_INT => Ok(n as f64),
            Some(n) => Err(not_representable(n, "DOUBLE")),
            None => Err(mismatch("DOUBLE", other)),
        },
    }
}

/// Nearest float to a fractional decimal, accepted only if the float's
/// shortest text reads back as the same decimal
fn decimal_to_float<F>(decimal: &Decimal, expected: &str) -> Result<F>
where
    F: std::str::FromStr + fmt::Display,
{
    let text = decimal.normalize().to_string();
    let float: F = text
        .parse()
        .map_err(|_| not_representable(decimal, expected))?;
    match float.to_string().parse::<Decimal>() {
        Ok(back) if back == *decimal => Ok(float),
        _ => Err(not_representable(decimal, expected)),
    }
}

fn not_representable(value: impl fmt::Display, expected: &str) -> Error {
    Error::type_conversion(format!("{} is not representable as {}", value, expected))
}

fn to_decimal(value: &Value, precision: u32, scale: u32) -> Result<Decimal> {
    let decimal = match value {
        Value::Decimal(d) => *d,
        Value::Int8(v) => Decimal::from(*v),
        Value::Int16(v) => Decimal::from(*v),
        Value::Int32(v) => Decimal::from(*v),
        Value::Int64(v) => Decimal::from(*v),
        Value::Float32(v) => Decimal::try_from(*v)
            .map_err(|e| Error::type_conversion(format!("invalid DECIMAL {}: {}", v, e)))?,
        Value::Float64(v) => Decimal::try_from(*v)
            .map_err(|e| Error::type_conversion(format!("invalid DECIMAL {}: {}", v, e)))?,
        Value::String(s) => s
            .trim()
            .parse::<Decimal>()
            .map_err(|e| Error::type_conversion(format!("invalid DECIMAL '{}': {}", s, e)))?,
        other => return Err(mismatch("DECIMAL", other)),
    };
    fit_decimal(decimal, precision, scale)
}

/// Round half-up to `scale` and check the integer digits fit `precision`
fn fit_decimal(decimal: Decimal, precision: u32, scale: u32) -> Result<Decimal> {
    let mut rounded = decimal.round_dp_with_strategy(scale, RoundingStrategy::MidpointAwayFromZero);

    let integer_digits = rounded
        .trunc()
        .abs()
        .to_u128()
        .map_or(u32::MAX, |n| n.checked_ilog10().map_or(0, |log| log + 1));
    if integer_digits > precision.saturating_sub(scale) {
        return Err(Error::type_conversion(format!(
            "{} does not fit DECIMAL({}, {})",
            decimal, precision, scale
        )));
    }

    rounded.rescale(scale);
    Ok(rounded)
}

fn parse_text<T>(text: &str, expected: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: fmt::Display,
{
    text.trim()
        .parse()
        .map_err(|e| Error::type_conversion(format!("invalid {} '{}': {}", expected, text, e)))
}

fn parse_timestamp(text: &str) -> Result<NaiveDateTime> {
    let trimmed = text.trim();
    NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S%.f"))
        .map_err(|e| Error::type_conversion(format!("invalid TIMESTAMP '{}': {}", text, e)))
}

fn date_to_days(date: NaiveDate) -> i32 {
    date.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE
}

fn days_to_date(days: i32) -> Result<NaiveDate> {
    days.checked_add(UNIX_EPOCH_DAYS_FROM_CE)
        .and_then(NaiveDate::from_num_days_from_ce_opt)
        .ok_or_else(|| Error::type_conversion(format!("DATE day {} out of range", days)))
}

fn time_to_millis(time: NaiveTime) -> Result<i32> {
    let nanos = time.nanosecond();
    if nanos % NANOS_PER_MILLI != 0 || nanos >= 1_000 * NANOS_PER_MILLI {
        return Err(Error::type_conversion(format!(
            "TIME {} has sub-millisecond precision",
            time
        )));
    }
    // seconds of day < 86400, so this cannot overflow
    let seconds = time.num_seconds_from_midnight() as i32;
    Ok(seconds * MILLIS_PER_SECOND + (nanos / NANOS_PER_MILLI) as i32)
}

fn millis_to_time(millis: i32) -> Result<NaiveTime> {
    if millis < 0 {
        return Err(Error::type_conversion(format!(
            "TIME millisecond {} out of range",
            millis
        )));
    }
    let seconds = (millis / MILLIS_PER_SECOND) as u32;
    let nanos = (millis % MILLIS_PER_SECOND) as u32 * NANOS_PER_MILLI;
    NaiveTime::from_num_seconds_from_midnight_opt(seconds, nanos).ok_or_else(|| {
        Error::type_conversion(format!("TIME millisecond {} out of range", millis))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn read(ty: LogicalType, value: Value) -> Result<Datum> {
        create_internal_converter(0, &ty).unwrap().deserialize(&value)
    }

    #[test]
    fn test_integer_narrowing_is_checked() {
        assert_eq!(
            read(LogicalType::int(), Value::Int64(42)).unwrap(),
            Datum::Int(42)
        );
        assert!(read(LogicalType::int(), Value::Int64(i64::from(i32::MAX) + 1)).is_err());
        assert!(read(LogicalType::tiny_int(), Value::Int16(128)).is_err());
        assert_eq!(
            read(LogicalType::big_int(), Value::Decimal(Decimal::from(7))).unwrap(),
            Datum::BigInt(7)
        );
        assert!(read(LogicalType::big_int(), Value::Decimal(Decimal::new(15, 1))).is_err());
        assert!(read(LogicalType::int(), Value::String("1".into())).is_err());
    }

    #[test]
    fn test_boolean_from_bit() {
        assert_eq!(
            read(LogicalType::boolean(), Value::Int8(1)).unwrap(),
            Datum::Boolean(true)
        );
        assert!(read(LogicalType::boolean(), Value::Int8(2)).is_err());
    }

    #[test]
    fn test_float_precision() {
        assert_eq!(
            read(LogicalType::float(), Value::Float64(1.5)).unwrap(),
            Datum::Float(1.5)
        );
        assert_eq!(
            read(LogicalType::float(), Value::Float64(0.1)).unwrap(),
            Datum::Float(0.1)
        );
        assert!(read(LogicalType::float(), Value::Float64(0.1 + 1e-12)).is_err());
        assert_eq!(
            read(LogicalType::float(), Value::Decimal(Decimal::new(1, 1))).unwrap(),
            Datum::Float(0.1)
        );
        let digits = Value::Decimal(Decimal::new(1_234_567_891, 10));
        assert!(read(LogicalType::float(), digits).is_err());
        assert_eq!(
            read(LogicalType::double(), Value::Decimal(Decimal::new(1, 1))).unwrap(),
            Datum::Double(0.1)
        );
        assert_eq!(
            read(LogicalType::double(), Value::Int64(3)).unwrap(),
            Datum::Double(3.0)
        );
        assert!(read(LogicalType::double(), Value::Int64(i64::MAX)).is_err());
    }

    #[test]
    fn test_decimal_scale_and_precision() {
        let ty = LogicalType::decimal(5, 2);
        assert_eq!(
            read(ty.clone(), Value::String("12.345".into())).unwrap(),
            Datum::Decimal(Decimal::from_str("12.35").unwrap())
        );
        assert_eq!(
            read(ty.clone(), Value::Int32(7)).unwrap(),
            Datum::Decimal(Decimal::from_str("7.00").unwrap())
        );
        assert!(read(ty.clone(), Value::Int32(1000)).is_err());
        assert!(read(ty, Value::Bool(true)).is_err());
    }

    #[test]
    fn test_temporal_reads() {
        let date = NaiveDate::from_ymd_opt(1970, 1, 2).unwrap();
        assert_eq!(
            read(LogicalType::date(), Value::Date(date)).unwrap(),
            Datum::Date(1)
        );
        assert_eq!(
            read(LogicalType::date(), Value::String("1969-12-31".into())).unwrap(),
            Datum::Date(-1)
        );

        let time = NaiveTime::from_hms_milli_opt(1, 0, 0, 250).unwrap();
        assert_eq!(
            read(LogicalType::time(3), Value::Time(time)).unwrap(),
            Datum::Time(3_600_250)
        );
        let micros = NaiveTime::from_hms_micro_opt(1, 0, 0, 1).unwrap();
        assert!(read(LogicalType::time(3), Value::Time(micros)).is_err());

        assert!(read(
            LogicalType::timestamp(3),
            Value::String("2024-03-01 10:00:00.5".into())
        )
        .is_ok());
        assert!(read(
            LogicalType::timestamp_ltz(3),
            Value::String("2024-03-01T10:00:00+02:00".into())
        )
        .is_ok());
    }

    #[test]
    fn test_binary_from_base64() {
        assert_eq!(
            read(LogicalType::bytes(), Value::String("AAEC".into())).unwrap(),
            Datum::Binary(vec![0, 1, 2])
        );
        assert!(read(LogicalType::bytes(), Value::String("***".into())).is_err());
    }

    #[test]
    fn test_null_column_rejects_values() {
        assert!(read(LogicalType::null(), Value::Int32(1)).is_err());
    }

    #[test]
    fn test_unsupported_types_fail_fast() {
        for s in ["ARRAY<INT>", "MAP<INT, INT>", "ROW<a INT>", "INTERVAL DAY", "DECIMAL(30, 2)", "TIME(6)"] {
            let ty = LogicalType::from_str(s).unwrap();
            let err = create_internal_converter(4, &ty).unwrap_err();
            assert!(matches!(
                err,
                Error::UnsupportedColumnType { position: 4, .. }
            ));
            assert!(create_external_converter(4, &ty).is_err());
        }
    }

    #[test]
    fn test_day_and_millis_helpers() {
        assert_eq!(days_to_date(0).unwrap(), NaiveDate::from_ymd_opt(1970, 1, 1).unwrap());
        assert!(days_to_date(i32::MAX).is_err());
        assert_eq!(
            millis_to_time(86_399_999).unwrap(),
            NaiveTime::from_hms_milli_opt(23, 59, 59, 999).unwrap()
        );
        assert!(millis_to_time(86_400_000).is_err());
        assert!(millis_to_time(-1).is_err());
    }
}
