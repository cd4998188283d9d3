//! FILENAME: report-engine/src/transform.rs
//! Row-set transformations shared by every builder: date-part derivation,
//! half-to-even rounding, time reformatting and tolerant sorting.

use std::collections::HashMap;
use std::sync::OnceLock;

use chrono::{Datelike, NaiveDate, NaiveTime};
use model::{Table, Value};
use regex::Regex;

use crate::definition::TimeFormat;
use crate::error::{ReportError, ReportResult};

fn hour_minute_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(\d{2}:\d{2})$").expect("Invalid regex pattern"))
}

/// Derives `day`, `month`, `year` and `week_of_month` from the `date`
/// column (`YYYY-MM-DD`). A table without a `date` column passes through
/// unchanged; an unparsable date is a validation error.
pub fn with_date_parts(table: &Table) -> ReportResult<Table> {
    let Some(date_idx) = table.column_index("date") else {
        return Ok(table.clone());
    };

    let mut days = Vec::with_capacity(table.n_rows());
    let mut months = Vec::with_capacity(table.n_rows());
    let mut years = Vec::with_capacity(table.n_rows());
    let mut weeks = Vec::with_capacity(table.n_rows());
    for row in table.rows() {
        match &row[date_idx] {
            Value::Empty => {
                days.push(Value::Empty);
                months.push(Value::Empty);
                years.push(Value::Empty);
                weeks.push(Value::Empty);
            }
            value => {
                let text = value.as_text().ok_or_else(|| {
                    ReportError::DataValidation(format!(
                        "Error processing date column: non-string value {}",
                        value
                    ))
                })?;
                let date = NaiveDate::parse_from_str(text, "%Y-%m-%d").map_err(|e| {
                    ReportError::DataValidation(format!(
                        "Error processing date column: '{}': {}",
                        text, e
                    ))
                })?;
                days.push(Value::Int(date.day() as i64));
                months.push(Value::Int(date.month() as i64));
                years.push(Value::Int(date.year() as i64));
                weeks.push(Value::Int(week_of_month(date.day()) as i64));
            }
        }
    }

    Ok(table.with_columns(vec![
        ("day".to_string(), days),
        ("month".to_string(), months),
        ("year".to_string(), years),
        ("week_of_month".to_string(), weeks),
    ]))
}

/// 1-based week index within the month.
pub fn week_of_month(day: u32) -> u32 {
    (day - 1) / 7 + 1
}

/// Rounds every Float-typed column with a precision entry, half to even.
/// All other columns pass through unchanged. Idempotent at equal
/// precision.
pub fn round_columns(table: &Table, precision: &HashMap<String, u32>) -> Table {
    if precision.is_empty() {
        return table.clone();
    }

    let mut replacements = Vec::new();
    for (column, &digits) in precision {
        if !table.is_float_column(column) {
            continue;
        }
        let Some(values) = table.column_values(column) else {
            continue;
        };
        let rounded = values
            .into_iter()
            .map(|v| match v {
                Value::Float(f) => Value::Float(formula::round_half_even(*f, digits as i32)),
                other => other.clone(),
            })
            .collect();
        replacements.push((column.clone(), rounded));
    }
    table.with_columns(replacements)
}

/// Reparses configured string time columns with their input pattern and
/// re-renders them with the output pattern. A malformed value skips that
/// column's formatting with a warning.
pub fn format_time(table: &Table, formats: &HashMap<String, TimeFormat>) -> Table {
    let mut out = table.clone();
    for (column, format) in formats {
        let Some(values) = out.column_values(column) else {
            continue;
        };

        let mut rendered = Vec::with_capacity(values.len());
        let mut ok = true;
        for value in values {
            match value {
                Value::Empty => rendered.push(Value::Empty),
                Value::Text(text) => {
                    match NaiveTime::parse_from_str(text, &format.input_format) {
                        Ok(time) => rendered.push(Value::Text(
                            time.format(&format.output_format).to_string(),
                        )),
                        Err(e) => {
                            log::warn!(
                                "Error formatting time column {}: '{}': {}",
                                column,
                                text,
                                e
                            );
                            ok = false;
                            break;
                        }
                    }
                }
                other => {
                    log::warn!(
                        "Error formatting time column {}: non-string value {}",
                        column,
                        other
                    );
                    ok = false;
                    break;
                }
            }
        }
        if ok {
            out = out.with_columns(vec![(column.clone(), rendered)]);
        }
    }
    out
}

/// Rewrites a time-string column to its trailing `HH:MM`. Values without
/// such a suffix become Empty.
pub fn extract_hour_minute(table: &Table, column: &str) -> Table {
    let Some(values) = table.column_values(column) else {
        return table.clone();
    };
    let truncated = values
        .into_iter()
        .map(|v| match v.as_text() {
            Some(text) => hour_minute_pattern()
                .captures(text)
                .and_then(|c| c.get(1))
                .map(|m| Value::Text(m.as_str().to_string()))
                .unwrap_or(Value::Empty),
            None => Value::Empty,
        })
        .collect();
    table.with_columns(vec![(column.to_string(), truncated)])
}

/// Stable ascending sort by the configured keys present in the table.
/// No present keys is a no-op, not an error.
pub fn sort_rows(table: &Table, sort_keys: &[String]) -> Table {
    let key_indices: Vec<usize> = sort_keys
        .iter()
        .filter_map(|k| table.column_index(k))
        .collect();
    if key_indices.is_empty() {
        return table.clone();
    }

    let mut order: Vec<usize> = (0..table.n_rows()).collect();
    order.sort_by(|&a, &b| {
        let (ra, rb) = (table.row(a), table.row(b));
        match (ra, rb) {
            (Some(ra), Some(rb)) => {
                for &idx in &key_indices {
                    let ord = ra[idx].compare(&rb[idx]);
                    if ord != std::cmp::Ordering::Equal {
                        return ord;
                    }
                }
                std::cmp::Ordering::Equal
            }
            _ => std::cmp::Ordering::Equal,
        }
    });
    table.take_rows(&order)
}

// ============================================================================
// TESTS
// ============================================================================
