//! Value normalization
//!
//! Converts cells of the engine's Arrow result batches into [`CellValue`]s. The
//! mapping is total and applied in a fixed order:
//!
//! 1. NULL stays null
//! 2. DECIMAL widens to `f64` (precision loss accepted)
//! 3. integers and finite floats pass through
//! 4. everything else becomes its text rendering
//!
//! Booleans are kept as booleans since hosts treat them as primitive values.
//! NaN and infinities are text (`nan`, `inf`, `-inf`) so they never collapse into
//! JSON null. HUGEINT reaches us as `Decimal128(38, 0)` and follows rule 2.

use crate::db::RawResultSet;
use crate::execution::result::{CellValue, NormalizedTable};
use chrono::{DateTime, NaiveDate, NaiveTime};
use duckdb::arrow::array::{Array, AsArray, FixedSizeListArray, MapArray, StructArray, UnionArray};
use duckdb::arrow::datatypes::{
    DataType, Date32Type, Decimal128Type, Float32Type, Float64Type, Int16Type, Int32Type, Int64Type, Int8Type,
    IntervalMonthDayNanoType, IntervalUnit, Time64MicrosecondType, Time64NanosecondType, TimeUnit,
    TimestampMicrosecondType, TimestampMillisecondType, TimestampNanosecondType, TimestampSecondType, UInt16Type,
    UInt32Type, UInt64Type, UInt8Type,
};
use duckdb::arrow::record_batch::RecordBatch;
use duckdb::arrow::util::display::{ArrayFormatter, FormatOptions};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use tracing::warn;

/// Days between 0001-01-01 and 1970-01-01
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;
const MICROS_PER_SECOND: i64 = 1_000_000;

/// Normalize the cell at `row` of `array`. Never fails.
pub fn normalize_cell(array: &dyn Array, row: usize) -> CellValue {
    if is_null_cell(array, row) {
        return CellValue::Null;
    }

    match array.data_type() {
        DataType::Decimal128(_, scale) => {
            CellValue::Float(decimal_to_f64(array.as_primitive::<Decimal128Type>().value(row), *scale))
        }
        DataType::Decimal256(_, _) => {
            let text = render_text(array, row);
            match text.parse::<f64>() {
                Ok(f) => float_cell(f),
                Err(_) => CellValue::Text(text),
            }
        }
        DataType::Int8 => CellValue::Integer(array.as_primitive::<Int8Type>().value(row).into()),
        DataType::Int16 => CellValue::Integer(array.as_primitive::<Int16Type>().value(row).into()),
        DataType::Int32 => CellValue::Integer(array.as_primitive::<Int32Type>().value(row).into()),
        DataType::Int64 => CellValue::Integer(array.as_primitive::<Int64Type>().value(row)),
        DataType::UInt8 => CellValue::Integer(array.as_primitive::<UInt8Type>().value(row).into()),
        DataType::UInt16 => CellValue::Integer(array.as_primitive::<UInt16Type>().value(row).into()),
        DataType::UInt32 => CellValue::Integer(array.as_primitive::<UInt32Type>().value(row).into()),
        DataType::UInt64 => {
            let u = array.as_primitive::<UInt64Type>().value(row);
            i64::try_from(u)
                .map(CellValue::Integer)
                .unwrap_or(CellValue::Float(u as f64))
        }
        DataType::Float32 => float_cell(array.as_primitive::<Float32Type>().value(row).into()),
        DataType::Float64 => float_cell(array.as_primitive::<Float64Type>().value(row)),
        DataType::Boolean => CellValue::Boolean(array.as_boolean().value(row)),
        _ => CellValue::Text(render_text(array, row)),
    }
}

/// Normalize every cell of every batch, keeping row and column order.
///
/// Counts come from the data actually received, not from what the query asked for.
pub fn normalize_result_set(batches: &[RecordBatch], columns: Vec<String>) -> NormalizedTable {
    let mut data: Vec<Vec<CellValue>> = Vec::new();
    for batch in batches {
        for row in 0..batch.num_rows() {
            data.push(
                batch
                    .columns()
                    .iter()
                    .map(|column| normalize_cell(column.as_ref(), row))
                    .collect(),
            );
        }
    }

    let table = NormalizedTable {
        row_count: data.len(),
        column_count: columns.len(),
        data,
        columns,
    };

    if let Some(idx) = table.first_ragged_row() {
        warn!(
            row = idx,
            width = table.data[idx].len(),
            expected = table.column_count,
            "Result row width does not match column count"
        );
    }

    table
}

pub fn normalize_raw(raw: RawResultSet) -> NormalizedTable {
    normalize_result_set(&raw.batches, raw.columns)
}

/// Text rendering of any cell, used for rule 4 and for values nested in lists,
/// structs and maps. Follows the engine's own VARCHAR casts where they differ
/// from Arrow's display.
pub fn render_text(array: &dyn Array, row: usize) -> String {
    if is_null_cell(array, row) {
        return "NULL".to_string();
    }

    match array.data_type() {
        DataType::Utf8 => array.as_string::<i32>().value(row).to_string(),
        DataType::LargeUtf8 => array.as_string::<i64>().value(row).to_string(),
        DataType::Date32 => format_date(array.as_primitive::<Date32Type>().value(row)),
        DataType::Timestamp(unit, tz) => format_timestamp(timestamp_micros(array, unit, row), tz.is_some()),
        DataType::Time64(TimeUnit::Microsecond) => {
            format_time_of_day(array.as_primitive::<Time64MicrosecondType>().value(row))
        }
        DataType::Time64(TimeUnit::Nanosecond) => {
            format_time_of_day(array.as_primitive::<Time64NanosecondType>().value(row) / 1_000)
        }
        DataType::Interval(IntervalUnit::MonthDayNano) => {
            let (months, days, nanos) =
                IntervalMonthDayNanoType::to_parts(array.as_primitive::<IntervalMonthDayNanoType>().value(row));
            format_interval(months, days, nanos)
        }
        DataType::Binary => escape_blob(array.as_binary::<i32>().value(row)),
        DataType::LargeBinary => escape_blob(array.as_binary::<i64>().value(row)),
        DataType::List(_) => render_items(array.as_list::<i32>().value(row).as_ref()),
        DataType::LargeList(_) => render_items(array.as_list::<i64>().value(row).as_ref()),
        DataType::FixedSizeList(_, _) => match array.as_any().downcast_ref::<FixedSizeListArray>() {
            Some(list) => render_items(list.value(row).as_ref()),
            None => format_with_arrow(array, row),
        },
        DataType::Struct(_) => match array.as_any().downcast_ref::<StructArray>() {
            Some(fields) => render_struct(fields, row),
            None => format_with_arrow(array, row),
        },
        DataType::Map(_, _) => match array.as_any().downcast_ref::<MapArray>() {
            Some(map) => render_map(&map.value(row)),
            None => format_with_arrow(array, row),
        },
        DataType::Union(_, _) => match array.as_any().downcast_ref::<UnionArray>() {
            Some(union) => render_text(union.value(row).as_ref(), 0),
            None => format_with_arrow(array, row),
        },
        _ => format_with_arrow(array, row),
    }
}

fn is_null_cell(array: &dyn Array, row: usize) -> bool {
    array.is_null(row) || matches!(array.data_type(), DataType::Null)
}

fn float_cell(f: f64) -> CellValue {
    if f.is_finite() {
        CellValue::Float(f)
    } else if f.is_nan() {
        CellValue::Text("nan".to_string())
    } else if f > 0.0 {
        CellValue::Text("inf".to_string())
    } else {
        CellValue::Text("-inf".to_string())
    }
}

/// Exact through `rust_decimal` where it fits (scale <= 28, 96-bit mantissa),
/// otherwise a plain division.
fn decimal_to_f64(unscaled: i128, scale: i8) -> f64 {
    u32::try_from(scale)
        .ok()
        .and_then(|s| Decimal::try_from_i128_with_scale(unscaled, s).ok())
        .and_then(|d| d.to_f64())
        .unwrap_or_else(|| unscaled as f64 / 10f64.powi(i32::from(scale)))
}

fn timestamp_micros(array: &dyn Array, unit: &TimeUnit, row: usize) -> i64 {
    match unit {
        TimeUnit::Second => array
            .as_primitive::<TimestampSecondType>()
            .value(row)
            .saturating_mul(MICROS_PER_SECOND),
        TimeUnit::Millisecond => array
            .as_primitive::<TimestampMillisecondType>()
            .value(row)
            .saturating_mul(1_000),
        TimeUnit::Microsecond => array.as_primitive::<TimestampMicrosecondType>().value(row),
        TimeUnit::Nanosecond => array.as_primitive::<TimestampNanosecondType>().value(row) / 1_000,
    }
}

fn format_date(days_since_epoch: i32) -> String {
    days_since_epoch
        .checked_add(UNIX_EPOCH_DAYS_FROM_CE)
        .and_then(NaiveDate::from_num_days_from_ce_opt)
        .map(|d| d.to_string())
        .unwrap_or_else(|| format!("{} days since epoch", days_since_epoch))
}

/// Zone-aware timestamps are stored as UTC and keep a `+00` suffix.
fn format_timestamp(micros: i64, with_offset: bool) -> String {
    match DateTime::from_timestamp_micros(micros) {
        Some(dt) if with_offset => format!("{}+00", dt.naive_utc()),
        Some(dt) => dt.naive_utc().to_string(),
        None => format!("{} us since epoch", micros),
    }
}

fn format_time_of_day(micros: i64) -> String {
    let secs = micros.div_euclid(MICROS_PER_SECOND);
    let nanos = micros.rem_euclid(MICROS_PER_SECOND) * 1_000;
    u32::try_from(secs)
        .ok()
        .zip(u32::try_from(nanos).ok())
        .and_then(|(s, n)| NaiveTime::from_num_seconds_from_midnight_opt(s, n))
        .map(|t| t.to_string())
        .unwrap_or_else(|| format_clock(micros.saturating_mul(1_000)))
}

fn format_interval(months: i32, days: i32, nanos: i64) -> String {
    let mut parts = Vec::new();
    if months != 0 {
        parts.push(plural(months, "month"));
    }
    if days != 0 {
        parts.push(plural(days, "day"));
    }
    if nanos != 0 || parts.is_empty() {
        parts.push(format_clock(nanos));
    }
    parts.join(" ")
}

fn plural(n: i32, unit: &str) -> String {
    if n.abs() == 1 {
        format!("{} {}", n, unit)
    } else {
        format!("{} {}s", n, unit)
    }
}

/// `[-]HH:MM:SS[.ffffff]` for a nanosecond duration
fn format_clock(nanos: i64) -> String {
    let sign = if nanos < 0 { "-" } else { "" };
    let total_micros = nanos.unsigned_abs() / 1_000;
    let micros = total_micros % 1_000_000;
    let total_secs = total_micros / 1_000_000;
    let (hours, minutes, seconds) = (total_secs / 3600, (total_secs / 60) % 60, total_secs % 60);

    if micros == 0 {
        format!("{}{:02}:{:02}:{:02}", sign, hours, minutes, seconds)
    } else {
        format!("{}{:02}:{:02}:{:02}.{:06}", sign, hours, minutes, seconds, micros)
    }
}

fn escape_blob(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    for &b in bytes {
        if b.is_ascii_graphic() || b == b' ' {
            out.push(char::from(b));
        } else {
            out.push_str(&format!("\\x{:02X}", b));
        }
    }
    out
}

/// `[a, b, NULL]`
fn render_items(items: &dyn Array) -> String {
    let parts: Vec<String> = (0..items.len()).map(|i| render_text(items, i)).collect();
    format!("[{}]", parts.join(", "))
}

/// `{'a': 1, 'b': x}`
fn render_struct(array: &StructArray, row: usize) -> String {
    let parts: Vec<String> = array
        .fields()
        .iter()
        .zip(array.columns())
        .map(|(field, column)| format!("'{}': {}", field.name(), render_text(column.as_ref(), row)))
        .collect();
    format!("{{{}}}", parts.join(", "))
}

/// `{k=v, k2=v2}`
fn render_map(entries: &StructArray) -> String {
    let columns = entries.columns();
    let (Some(keys), Some(values)) = (columns.first(), columns.get(1)) else {
        return "{}".to_string();
    };

    let parts: Vec<String> = (0..entries.len())
        .map(|i| format!("{}={}", render_text(keys.as_ref(), i), render_text(values.as_ref(), i)))
        .collect();
    format!("{{{}}}", parts.join(", "))
}

fn format_with_arrow(array: &dyn Array, row: usize) -> String {
    ArrayFormatter::try_new(array, &FormatOptions::default())
        .and_then(|formatter| formatter.value(row).try_to_string())
        .unwrap_or_else(|_| format!("<{}>", array.data_type()))
}
