//! Integration tests for the rivven-convert row converter

use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};
use rivven_convert::prelude::*;
use rust_decimal::Decimal;
use serde_json::json;
use std::borrow::Cow;
use std::str::FromStr;
use std::sync::Arc;

fn int_varchar_date() -> RowConverter {
    RowConverter::new(RowType::new(vec![
        RowField::new("id", LogicalType::int()),
        RowField::new("name", LogicalType::varchar(32)),
        RowField::new("created", LogicalType::date()),
    ]))
    .unwrap()
}

fn cursor(values: Vec<Value>) -> Row {
    Row::new(values)
}

/// Cursor reporting NULL through a flag, with a zero placeholder value
struct WasNullCursor {
    nulls: Vec<bool>,
}

impl CursorRow for WasNullCursor {
    fn column_count(&self) -> usize {
        self.nulls.len()
    }

    fn read_at(&self, position: usize) -> Result<Cow<'_, Value>> {
        if self.nulls[position] {
            Ok(Cow::Owned(Value::Int32(0)))
        } else {
            Ok(Cow::Owned(Value::Int32(position as i32 + 1)))
        }
    }

    fn is_null_at(&self, position: usize) -> Result<bool> {
        Ok(self.nulls[position])
    }
}

/// Cursor whose reads at one position fail
struct BrokenCursor {
    width: usize,
    broken: usize,
}

impl CursorRow for BrokenCursor {
    fn column_count(&self) -> usize {
        self.width
    }

    fn read_at(&self, position: usize) -> Result<Cow<'_, Value>> {
        if position == self.broken {
            Err(Error::source_failure("connection reset"))
        } else {
            Ok(Cow::Owned(Value::Int32(1)))
        }
    }
}

#[test]
fn test_int_varchar_date_scenario() {
    let converter = int_varchar_date();

    let row = converter
        .to_internal(&cursor(vec![Value::Int32(42), Value::from("abc"), Value::Null]))
        .unwrap();
    assert_eq!(row.arity(), 3);
    assert_eq!(row.get(0), Some(&Datum::Int(42)));
    assert_eq!(row.get(1), Some(&Datum::String("abc".into())));
    assert!(row.is_null_at(2));

    let mut stmt = BoundStatement::new("INSERT INTO t VALUES (?, ?, ?)", 3);
    converter.to_external(&row, &mut stmt).unwrap();

    assert_eq!(stmt.binding(0), Some(&Binding::Value(Value::Int32(42))));
    assert_eq!(stmt.binding(1), Some(&Binding::Value(Value::from("abc"))));
    assert_eq!(stmt.binding(2), Some(&Binding::Null(SqlType::Date)));
    assert_eq!(SqlType::Date.code(), 91);
}

#[test]
fn test_cursor_and_lookup_parity() {
    let converter = int_varchar_date();
    let date = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();

    let from_cursor = converter
        .to_internal(&cursor(vec![Value::Int32(7), Value::Null, Value::Date(date)]))
        .unwrap();
    let from_values = converter
        .to_internal_lookup(&vec![Value::Int32(7), Value::Null, Value::Date(date)])
        .unwrap();
    let from_json = converter
        .to_internal_lookup(&json!([7, null, "2024-02-29"]))
        .unwrap();

    assert_eq!(from_cursor, from_values);
    assert_eq!(from_cursor, from_json);
    assert!(from_json.is_null_at(1));
}

#[test]
fn test_cursor_and_json_parity_every_type() {
    let ts = NaiveDate::from_ymd_opt(2024, 3, 1)
        .unwrap()
        .and_hms_milli_opt(10, 30, 0, 125)
        .unwrap();
    let columns: Vec<(LogicalType, Value, &str)> = vec![
        (LogicalType::boolean(), Value::Bool(true), "true"),
        (LogicalType::tiny_int(), Value::Int8(-8), "-8"),
        (LogicalType::small_int(), Value::Int16(1_600), "1600"),
        (LogicalType::int(), Value::Int32(42), "42.0"),
        (
            LogicalType::big_int(),
            Value::Int64(9_007_199_254_740_993),
            "9007199254740993",
        ),
        (LogicalType::float(), Value::Float32(0.1), "0.1"),
        (LogicalType::double(), Value::Float64(0.1), "0.1"),
        (LogicalType::double(), Value::Float64(-2.5e10), "-2.5e10"),
        (
            LogicalType::decimal(20, 2),
            Value::Decimal(Decimal::from_str("123456789012345678.91").unwrap()),
            "123456789012345678.91",
        ),
        (
            LogicalType::decimal(5, 2),
            Value::Decimal(Decimal::from_str("0.10").unwrap()),
            "0.1",
        ),
        (LogicalType::string(), Value::from("héllo"), "\"héllo\""),
        (LogicalType::bytes(), Value::Bytes(vec![0xde, 0xad]), "\"3q0=\""),
        (
            LogicalType::date(),
            Value::Date(NaiveDate::from_ymd_opt(1969, 7, 20).unwrap()),
            "\"1969-07-20\"",
        ),
        (
            LogicalType::time(3),
            Value::Time(NaiveTime::from_hms_milli_opt(23, 59, 59, 999).unwrap()),
            "\"23:59:59.999\"",
        ),
        (
            LogicalType::timestamp(3),
            Value::DateTime(ts),
            "\"2024-03-01T10:30:00.125\"",
        ),
        (
            LogicalType::timestamp_ltz(3),
            Value::DateTimeTz(Utc.from_utc_datetime(&ts)),
            "\"2024-03-01T12:30:00.125+02:00\"",
        ),
        (LogicalType::int(), Value::Null, "null"),
    ];

    let converter =
        RowConverter::new(RowType::from_types(columns.iter().map(|(t, _, _)| t.clone())))
            .unwrap();
    let values: Vec<Value> = columns.iter().map(|(_, v, _)| v.clone()).collect();
    let text = format!(
        "[{}]",
        columns
            .iter()
            .map(|(_, _, json)| *json)
            .collect::<Vec<_>>()
            .join(", ")
    );
    let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();

    let from_cursor = converter.to_internal(&cursor(values)).unwrap();
    let from_json = converter.to_internal_lookup(&parsed).unwrap();

    for pos in 0..columns.len() {
        assert_eq!(
            from_cursor.get(pos),
            from_json.get(pos),
            "column {} ({})",
            pos,
            columns[pos].0
        );
    }
    assert_eq!(from_cursor, from_json);
}

#[test]
fn test_cursor_null_flag_skips_read() {
    let converter = RowConverter::new(RowType::from_types([
        LogicalType::int(),
        LogicalType::int(),
    ]))
    .unwrap();

    let row = converter
        .to_internal(&WasNullCursor {
            nulls: vec![true, false],
        })
        .unwrap();

    assert!(row.is_null_at(0));
    assert_eq!(row.get(1), Some(&Datum::Int(2)));
}

#[test]
fn test_arity_mismatch() {
    let converter = int_varchar_date();

    let err = converter
        .to_internal(&cursor(vec![Value::Int32(1), Value::from("a")]))
        .unwrap_err();
    assert!(matches!(
        err,
        Error::ArityMismatch {
            expected: 3,
            actual: 2,
            ..
        }
    ));
    assert_eq!(err.category(), ErrorCategory::Arity);
    assert!(!err.is_row_level());

    assert!(converter.to_internal_lookup(&json!([1, "a", null, 4])).is_err());

    let mut stmt = BoundStatement::new("", 3);
    assert!(converter.to_external(&RowData::new(2), &mut stmt).is_err());

    let mut narrow = BoundStatement::new("", 2);
    let err = converter
        .to_external(&RowData::new(3), &mut narrow)
        .unwrap_err();
    assert!(err.to_string().contains("statement"));
}

#[test]
fn test_read_failure_is_tagged_with_column() {
    let converter = int_varchar_date();

    let err = converter
        .to_internal_lookup(&json!([1, "a", "not a date"]))
        .unwrap_err();
    assert_eq!(err.position(), Some(2));
    assert!(err.is_row_level());
    assert!(err.to_string().contains("created"));
}

#[test]
fn test_cursor_failure_keeps_cause() {
    let converter = RowConverter::new(RowType::from_types([
        LogicalType::int(),
        LogicalType::int(),
    ]))
    .unwrap();

    let err = converter
        .to_internal(&BrokenCursor {
            width: 2,
            broken: 1,
        })
        .unwrap_err();
    match &err {
        Error::Conversion { position, .. } => assert_eq!(*position, 1),
        other => panic!("unexpected error: {}", other),
    }
    let cause = std::error::Error::source(&err).expect("cause");
    assert!(cause.to_string().contains("connection reset"));
}

#[test]
fn test_failed_write_leaves_statement_reusable() {
    let converter = RowConverter::new(RowType::from_types([
        LogicalType::int(),
        LogicalType::int(),
    ]))
    .unwrap();
    let mut stmt = BoundStatement::new("INSERT INTO t VALUES (?, ?)", 2);

    let bad = RowData::from_fields(vec![Some(Datum::Int(1)), Some(Datum::from("x"))]);
    assert!(converter.to_external(&bad, &mut stmt).is_err());
    assert_eq!(stmt.unbound_positions(), vec![0, 1]);

    let good = RowData::from_fields(vec![Some(Datum::Int(1)), Some(Datum::Int(2))]);
    converter.to_external(&good, &mut stmt).unwrap();
    assert_eq!(
        stmt.into_params().unwrap(),
        vec![Value::Int32(1), Value::Int32(2)]
    );
}

#[test]
fn test_write_rejects_mismatched_datum() {
    let converter = RowConverter::new(RowType::from_types([LogicalType::int()])).unwrap();
    let row = RowData::from_fields(vec![Some(Datum::from("oops"))]);

    let mut stmt = BoundStatement::new("", 1);
    let err = converter.to_external(&row, &mut stmt).unwrap_err();
    assert!(matches!(err, Error::Conversion { position: 0, .. }));
}

#[test]
fn test_round_trip_every_type() {
    let ts = NaiveDate::from_ymd_opt(2024, 3, 1)
        .unwrap()
        .and_hms_milli_opt(10, 30, 0, 125)
        .unwrap();
    let columns: Vec<(LogicalType, Value)> = vec![
        (LogicalType::boolean(), Value::Bool(true)),
        (LogicalType::tiny_int(), Value::Int8(-8)),
        (LogicalType::small_int(), Value::Int16(1_600)),
        (LogicalType::int(), Value::Int32(-32_000)),
        (LogicalType::big_int(), Value::Int64(1 << 40)),
        (LogicalType::float(), Value::Float32(1.25)),
        (LogicalType::double(), Value::Float64(-2.5e10)),
        (
            LogicalType::decimal(10, 2),
            Value::Decimal(Decimal::from_str("12345678.90").unwrap()),
        ),
        (LogicalType::char(3), Value::from("abc")),
        (LogicalType::string(), Value::from("héllo")),
        (LogicalType::binary(2), Value::Bytes(vec![0xde, 0xad])),
        (LogicalType::bytes(), Value::Bytes(vec![])),
        (
            LogicalType::date(),
            Value::Date(NaiveDate::from_ymd_opt(1969, 7, 20).unwrap()),
        ),
        (
            LogicalType::time(3),
            Value::Time(NaiveTime::from_hms_milli_opt(23, 59, 59, 999).unwrap()),
        ),
        (LogicalType::timestamp(3), Value::DateTime(ts)),
        (
            LogicalType::timestamp_ltz(3),
            Value::DateTimeTz(Utc.from_utc_datetime(&ts)),
        ),
    ];

    let (types, values): (Vec<_>, Vec<_>) = columns.into_iter().unzip();
    let converter = RowConverter::new(RowType::from_types(types)).unwrap();

    let row = converter.to_internal_lookup(&values).unwrap();
    let mut stmt = BoundStatement::new("", values.len());
    converter.to_external(&row, &mut stmt).unwrap();

    assert_eq!(stmt.into_params().unwrap(), values);
}

#[test]
fn test_null_round_trip_every_type() {
    let types = vec![
        (LogicalType::boolean(), SqlType::Boolean),
        (LogicalType::big_int(), SqlType::BigInt),
        (LogicalType::float(), SqlType::Real),
        (LogicalType::decimal(5, 1), SqlType::Decimal),
        (LogicalType::char(1), SqlType::Char),
        (LogicalType::bytes(), SqlType::VarBinary),
        (LogicalType::time(0), SqlType::Time),
        (LogicalType::timestamp_ltz(6), SqlType::TimestampWithTimeZone),
        (LogicalType::null(), SqlType::Null),
    ];
    let converter =
        RowConverter::new(RowType::from_types(types.iter().map(|(t, _)| t.clone()))).unwrap();

    let row = converter
        .to_internal_lookup(&vec![Value::Null; types.len()])
        .unwrap();
    assert!((0..types.len()).all(|i| row.is_null_at(i)));

    let mut stmt = BoundStatement::new("", types.len());
    converter.to_external(&row, &mut stmt).unwrap();
    for (i, (_, sql_type)) in types.iter().enumerate() {
        assert_eq!(stmt.binding(i), Some(&Binding::Null(*sql_type)));
    }
}

#[test]
fn test_untyped_null_strategy() {
    let converter = RowConverter::builder(RowType::from_types([LogicalType::date()]))
        .null_strategy(NullStrategy::Untyped)
        .build()
        .unwrap();
    assert_eq!(converter.null_strategy(), NullStrategy::Untyped);

    let mut stmt = BoundStatement::new("", 1);
    converter.to_external(&RowData::new(1), &mut stmt).unwrap();
    assert_eq!(stmt.binding(0), Some(&Binding::Value(Value::Null)));
}

#[test]
fn test_custom_type_mapping() {
    struct TextDates;

    impl TypeMapping for TextDates {
        fn sql_type(&self, logical_type: &LogicalType) -> Result<SqlType> {
            match logical_type.kind() {
                LogicalTypeKind::Date => Ok(SqlType::VarChar),
                _ => StandardTypeMapping.sql_type(logical_type),
            }
        }
    }

    let converter = RowConverter::builder(RowType::from_types([LogicalType::date()]))
        .type_mapping(Arc::new(TextDates))
        .build()
        .unwrap();

    let mut stmt = BoundStatement::new("", 1);
    converter.to_external(&RowData::new(1), &mut stmt).unwrap();
    assert_eq!(stmt.binding(0), Some(&Binding::Null(SqlType::VarChar)));
}

#[test]
fn test_unsupported_type_fails_fast() {
    for ty in ["ARRAY<INT>", "MAP<STRING, INT>", "ROW<a INT>", "RAW('x')"] {
        let row_type = RowType::from_types([
            LogicalType::int(),
            LogicalType::from_str(ty).unwrap(),
        ]);
        let err = RowConverter::new(row_type).unwrap_err();
        assert!(
            matches!(err, Error::UnsupportedColumnType { position: 1, .. }),
            "{}: {}",
            ty,
            err
        );
        assert_eq!(err.category(), ErrorCategory::Schema);
    }
}

#[test]
fn test_from_config() {
    let config = RowConverterConfig::from_json(
        r#"{
            "columns": [
                {"name": "id", "type": "BIGINT NOT NULL"},
                {"name": "price", "type": "DECIMAL(10, 2)"}
            ],
            "null_strategy": "untyped"
        }"#,
    )
    .unwrap();
    let converter = RowConverter::from_config(&config).unwrap();

    let row = converter.to_internal_lookup(&json!([1, 9.999])).unwrap();
    assert_eq!(row.get(0), Some(&Datum::BigInt(1)));
    assert_eq!(
        row.get(1),
        Some(&Datum::Decimal(Decimal::from_str("10.00").unwrap()))
    );

    let bad = RowConverterConfig::new(vec![RowField::new(
        "a",
        LogicalType::from_str("MULTISET<INT>").unwrap(),
    )]);
    assert!(RowConverter::from_config(&bad).is_err());
}

#[test]
fn test_named_statement_target() {
    let converter = int_varchar_date();
    let row = converter
        .to_internal_lookup(&json!([5, "x", null]))
        .unwrap()
        .with_kind(RowKind::UpdateAfter);

    let mut stmt = NamedStatement::parse(
        "INSERT INTO t (id, name, created) VALUES (:id, :name, :created) \
         ON CONFLICT (id) DO UPDATE SET name = :name, created = :created",
        &converter.row_type().field_names(),
    )
    .unwrap();
    converter.to_external(&row, &mut stmt).unwrap();

    assert_eq!(
        stmt.into_params().unwrap(),
        vec![
            Value::Int32(5),
            Value::from("x"),
            Value::Null,
            Value::from("x"),
            Value::Null
        ]
    );
}

#[test]
fn test_shared_across_threads() {
    let converter = int_varchar_date();
    let inputs: Vec<serde_json::Value> = (0..64)
        .map(|i| {
            let created = (i % 2 == 1).then_some("2020-01-01");
            json!([i, format!("name-{}", i), created])
        })
        .collect();
    let expected: Vec<RowData> = inputs
        .iter()
        .map(|input| converter.to_internal_lookup(input).unwrap())
        .collect();

    std::thread::scope(|scope| {
        for _ in 0..4 {
            let converter = converter.clone();
            let inputs = &inputs;
            let expected = &expected;
            scope.spawn(move || {
                for (input, want) in inputs.iter().zip(expected) {
                    assert_eq!(&converter.to_internal_lookup(input).unwrap(), want);
                }
            });
        }
    });
}
