//! FILENAME: report-engine/src/builder.rs
//! Section builders. One pipeline per report type, dispatched over the
//! closed `ReportType` enum: overall summary once, then per-period slices
//! with their own summaries, leaf records and human-readable titles.
//!
//! Every stage consumes a table and produces a new one; the definition
//! itself is never touched, so the per-period group-key adjustments (week
//! and month records drop the finer date keys) cannot leak between builds.

use chrono::{Datelike, Duration, NaiveDate};
use model::{Table, Value};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::aggregate;
use crate::calc::{self, CompiledFormula};
use crate::definition::{ReportDefinition, ReportType};
use crate::error::{ReportError, ReportResult};
use crate::transform;
use crate::view::{PeriodKey, Record, Report, Section, Subsection};

/// Marker title for a week index that starts past the month's end.
pub const INVALID_WEEK_TITLE: &str = "Invalid week number for the given month";

type SliceKey = SmallVec<[Value; 4]>;

impl ReportDefinition {
    /// Runs the full build. An empty input table is an expected outcome
    /// ("no data for the period") and yields `Ok(None)` with a warning.
    pub fn build(&self, table: &Table) -> ReportResult<Option<Report>> {
        if table.is_empty() {
            log::warn!("No valid data loaded or table is empty");
            return Ok(None);
        }

        let formulas = calc::compile_mappings(&self.formula_mappings, &self.constants)?;

        log::debug!("Deriving date columns");
        let table = transform::with_date_parts(table)?;
        log::debug!("Sorting data");
        let table = transform::sort_rows(&table, &self.sorting_columns);

        let ctx = BuildContext {
            def: self,
            formulas,
        };
        log::debug!("Building {} report", self.report_type.tag());
        let report = match self.report_type {
            ReportType::Hourwise => ctx.hourwise(&table)?,
            ReportType::Daywise => ctx.daywise(&table)?,
            ReportType::Weekwise => ctx.weekwise(&table)?,
            ReportType::Monthwise => ctx.monthwise(&table)?,
            ReportType::Shiftwise => ctx.shiftwise(&table)?,
            ReportType::Instantaneous => ctx.instantaneous(&table)?,
            ReportType::LotwiseConsolidated => ctx.lotwise_consolidated(&table)?,
        };
        Ok(Some(report))
    }
}

struct BuildContext<'a> {
    def: &'a ReportDefinition,
    formulas: Vec<CompiledFormula>,
}

impl BuildContext<'_> {
    // ===== shared pipeline stages =====

    /// Single aggregate record over the whole slice.
    fn summary(&self, slice: &Table, with_time: bool) -> ReportResult<Record> {
        let mut out = aggregate::summarize(slice, &self.def.roles, &self.def.summary_columns)?;
        out = calc::apply_formulas(&out, &self.formulas)?;
        if with_time {
            out = transform::format_time(&out, &self.def.time_formats);
        }
        out = transform::round_columns(&out, &self.def.precision);
        Ok(full_record(&out, 0))
    }

    /// Grouped, formula-augmented, rounded and sorted leaf rows.
    fn leaf_table(
        &self,
        slice: &Table,
        group_keys: &[String],
        with_time: bool,
    ) -> ReportResult<Table> {
        let mut out = aggregate::group(slice, group_keys, &self.def.roles)?;
        out = calc::apply_formulas(&out, &self.formulas)?;
        if with_time {
            out = transform::format_time(&out, &self.def.time_formats);
        }
        out = transform::round_columns(&out, &self.def.precision);
        Ok(transform::sort_rows(&out, &self.def.sorting_columns))
    }

    /// Narrows leaf rows to the display-mapped columns plus the always
    /// present `asset_id` (null when absent). With `sequence` set, the
    /// configured sequence column receives 1-based indices in final row
    /// order before the narrowing.
    fn filter_records(&self, table: &Table, sequence: bool) -> Vec<Record> {
        let sequence_column = if sequence {
            self.def.sequence_column.as_deref()
        } else {
            None
        };

        (0..table.n_rows())
            .map(|row_idx| {
                let mut full = full_record(table, row_idx);
                if let Some(column) = sequence_column {
                    full.set(column, Value::Int(row_idx as i64 + 1));
                }
                let asset_id = full.get("asset_id").cloned().unwrap_or(Value::Empty);
                let mut record: Record = full
                    .iter()
                    .filter(|(column, _)| {
                        *column != "asset_id" && self.def.column_mappings.contains_key(*column)
                    })
                    .map(|(column, value)| (column.to_string(), value.clone()))
                    .collect();
                record.set("asset_id", asset_id);
                record
            })
            .collect()
    }

    /// Group keys for leaf records, with the named date keys removed.
    fn record_keys(&self, dropped: &[&str]) -> Vec<String> {
        self.def
            .group_by_columns
            .iter()
            .filter(|c| !dropped.contains(&c.as_str()))
            .cloned()
            .collect()
    }

    fn shift_label(&self, id: &Value) -> String {
        let raw = match id {
            Value::Text(s) => s.clone(),
            other => other.to_string(),
        };
        self.def.shift_labels.get(&raw).cloned().unwrap_or(raw)
    }

    fn assemble(&self, sections: Vec<Section>, summary: Option<Record>) -> Report {
        Report {
            report_type: self.def.report_type,
            summary_label: summary.as_ref().map(|_| "overall summary".to_string()),
            summary,
            sections,
            column_header_mapping: self.def.column_mappings.clone(),
        }
    }

    // ===== per-type builders =====

    fn hourwise(&self, table: &Table) -> ReportResult<Report> {
        let overall = self.summary(table, true)?;
        let mut leaf = self.leaf_table(table, &self.def.group_by_columns, true)?;
        if let Some(column) = &self.def.end_time_column {
            leaf = transform::extract_hour_minute(&leaf, column);
        }
        let records = self.filter_records(&leaf, false);

        let sections = vec![Section::Period {
            title: None,
            subsections: vec![Subsection::Records { records }],
            summary_label: None,
            summary: None,
            key: None,
        }];
        Ok(self.assemble(sections, Some(overall)))
    }

    fn daywise(&self, table: &Table) -> ReportResult<Report> {
        let overall = self.summary(table, false)?;

        let mut sections = Vec::new();
        for (key, slice) in partition(table, &["year", "month", "day"])? {
            let [year, month, day] = key_ints::<3>(&key)?;
            let date_str = format!("{:04}-{:02}-{:02}", year, month, day);
            let title = date_title(year, month, day)?;

            let summary = self.summary(&slice, false)?;
            let leaf = self.leaf_table(&slice, &self.def.group_by_columns, false)?;
            let records = self.filter_records(&leaf, true);

            sections.push((
                key,
                Section::Period {
                    title: Some(title.clone()),
                    subsections: vec![Subsection::Records { records }],
                    summary_label: Some(format!("{} summary", title)),
                    summary: Some(summary),
                    key: Some(PeriodKey::Date { date: date_str }),
                },
            ));
        }
        Ok(self.assemble(sort_sections(sections), Some(overall)))
    }

    fn weekwise(&self, table: &Table) -> ReportResult<Report> {
        let overall = self.summary(table, true)?;
        let record_keys = self.record_keys(&["day", "month", "year", "date"]);

        let mut sections = Vec::new();
        for (key, slice) in partition(table, &["year", "month", "week_of_month"])? {
            let [year, month, week] = key_ints::<3>(&key)?;
            let title = week_title(year, month, week)?;

            let summary = self.summary(&slice, true)?;
            let leaf = self.leaf_table(&slice, &record_keys, true)?;
            let records = self.filter_records(&leaf, false);

            sections.push((
                key,
                Section::Period {
                    title: Some(title.clone()),
                    subsections: vec![Subsection::Records { records }],
                    summary_label: Some(format!("{} summary", title)),
                    summary: Some(summary),
                    key: Some(PeriodKey::Week {
                        year,
                        month,
                        week_of_month: week,
                    }),
                },
            ));
        }
        Ok(self.assemble(sort_sections(sections), Some(overall)))
    }

    fn monthwise(&self, table: &Table) -> ReportResult<Report> {
        let overall = self.summary(table, false)?;
        let record_keys = self.record_keys(&["day", "month", "year", "date", "week_of_month"]);

        let mut sections = Vec::new();
        for (key, slice) in partition(table, &["year", "month"])? {
            let [year, month] = key_ints::<2>(&key)?;
            let title = month_title(year, month)?;

            let summary = self.summary(&slice, false)?;
            let leaf = self.leaf_table(&slice, &record_keys, false)?;
            let records = self.filter_records(&leaf, false);

            sections.push((
                key,
                Section::Period {
                    title: Some(title.clone()),
                    subsections: vec![Subsection::Records { records }],
                    summary_label: Some(format!("{} summary", title)),
                    summary: Some(summary),
                    key: Some(PeriodKey::YearMonth {
                        year_month: format!("{:04}-{:02}", year, month),
                    }),
                },
            ));
        }
        Ok(self.assemble(sort_sections(sections), Some(overall)))
    }

    fn shiftwise(&self, table: &Table) -> ReportResult<Report> {
        let overall = self.summary(table, false)?;

        let mut sections = Vec::new();
        for (key, day_slice) in partition(table, &["year", "month", "day"])? {
            let [year, month, day] = key_ints::<3>(&key)?;
            let date_str = format!("{:04}-{:02}-{:02}", year, month, day);
            let title = date_title(year, month, day)?;
            let day_summary = self.summary(&day_slice, false)?;

            let mut subsections = Vec::new();
            for (shift_key, shift_slice) in
                partition(&day_slice, &["shift_id", "platform_shift_id"])?
            {
                let leaf = self.leaf_table(&shift_slice, &self.def.group_by_columns, false)?;
                let records = self.filter_records(&leaf, false);
                let shift_summary = self.summary(&shift_slice, false)?;
                let shift_title = self.shift_label(&shift_key[1]);

                subsections.push((
                    shift_key[0].clone(),
                    Subsection::Shift {
                        title: shift_title.clone(),
                        records,
                        summary_label: format!("{} summary", shift_title),
                        summary: shift_summary,
                        shift_id: shift_key[0].clone(),
                    },
                ));
            }
            subsections.sort_by(|a, b| a.0.compare(&b.0));

            sections.push((
                key,
                Section::Period {
                    title: Some(title.clone()),
                    subsections: subsections.into_iter().map(|(_, s)| s).collect(),
                    summary_label: Some(format!("{} summary", title)),
                    summary: Some(day_summary),
                    key: Some(PeriodKey::Date { date: date_str }),
                },
            ));
        }
        Ok(self.assemble(sort_sections(sections), Some(overall)))
    }

    fn instantaneous(&self, table: &Table) -> ReportResult<Report> {
        let overall = self.summary(table, false)?;

        let mut sections = Vec::new();
        for (key, slice) in partition(table, &["platform_shift_id"])? {
            let title = self.shift_label(&key[0]);
            let summary = self.summary(&slice, false)?;
            let leaf = self.leaf_table(&slice, &self.def.group_by_columns, false)?;
            let records = self.filter_records(&leaf, false);

            sections.push((
                key.clone(),
                Section::Period {
                    title: Some(title.clone()),
                    subsections: vec![Subsection::Records { records }],
                    summary_label: Some(format!("{} summary", title)),
                    summary: Some(summary),
                    key: Some(PeriodKey::Instant {
                        platform_shift_id: key[0].clone(),
                    }),
                },
            ));
        }
        Ok(self.assemble(sort_sections(sections), Some(overall)))
    }

    fn lotwise_consolidated(&self, table: &Table) -> ReportResult<Report> {
        let transformed = transform::round_columns(
            &calc::apply_formulas(table, &self.formulas)?,
            &self.def.precision,
        );

        let numeric_columns: Vec<String> = transformed
            .columns()
            .iter()
            .filter(|c| {
                self.def.column_mappings.contains_key(*c) && transformed.is_numeric_column(c)
            })
            .cloned()
            .collect();

        let mut sections = Vec::new();
        for (key, slice) in partition(&transformed, &["lot_number"])? {
            let records = self.filter_records(&slice, false);
            let summary = if numeric_columns.is_empty() {
                Vec::new()
            } else {
                lot_summary_rows(&slice, &numeric_columns)
            };

            sections.push((
                key.clone(),
                Section::Lot {
                    lot_number: key[0].clone(),
                    records,
                    summary,
                },
            ));
        }
        Ok(self.assemble(sort_sections(sections), None))
    }
}

// ===== helpers =====

/// Partitions rows by the named columns, in first-seen order. Every key
/// column must be present; builders only partition on columns they derive
/// or require.
fn partition(table: &Table, keys: &[&str]) -> ReportResult<Vec<(SliceKey, Table)>> {
    let indices: Vec<usize> = keys
        .iter()
        .map(|key| {
            table.column_index(key).ok_or_else(|| {
                ReportError::DataValidation(format!("Required column '{}' missing", key))
            })
        })
        .collect::<ReportResult<_>>()?;

    let mut slot_of: FxHashMap<SliceKey, usize> = FxHashMap::default();
    let mut slices: Vec<(SliceKey, Vec<usize>)> = Vec::new();
    for (row_idx, row) in table.rows().enumerate() {
        let key: SliceKey = indices.iter().map(|&i| row[i].clone()).collect();
        let slot = *slot_of.entry(key.clone()).or_insert_with(|| {
            slices.push((key, Vec::new()));
            slices.len() - 1
        });
        slices[slot].1.push(row_idx);
    }

    Ok(slices
        .into_iter()
        .map(|(key, rows)| (key, table.take_rows(&rows)))
        .collect())
}

fn full_record(table: &Table, row_idx: usize) -> Record {
    match table.row(row_idx) {
        Some(row) => table
            .columns()
            .iter()
            .zip(row)
            .map(|(c, v)| (c.clone(), v.clone()))
            .collect(),
        None => Record::new(),
    }
}

fn key_ints<const N: usize>(key: &SliceKey) -> ReportResult<[i64; N]> {
    let mut out = [0i64; N];
    for (slot, value) in out.iter_mut().zip(key.iter()) {
        *slot = value.as_f64().map(|f| f as i64).ok_or_else(|| {
            ReportError::DataValidation(format!("Non-numeric period key value: {}", value))
        })?;
    }
    Ok(out)
}

fn sort_sections(mut sections: Vec<(SliceKey, Section)>) -> Vec<Section> {
    sections.sort_by(|a, b| {
        a.0.iter()
            .zip(b.0.iter())
            .map(|(x, y)| x.compare(y))
            .find(|o| *o != std::cmp::Ordering::Equal)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    sections.into_iter().map(|(_, s)| s).collect()
}

fn ymd(year: i64, month: i64, day: i64) -> ReportResult<NaiveDate> {
    NaiveDate::from_ymd_opt(year as i32, month as u32, day as u32).ok_or_else(|| {
        ReportError::DataValidation(format!(
            "Invalid calendar date {:04}-{:02}-{:02}",
            year, month, day
        ))
    })
}

fn date_title(year: i64, month: i64, day: i64) -> ReportResult<String> {
    Ok(ymd(year, month, day)?.format("%d %b %Y").to_string())
}

fn month_title(year: i64, month: i64) -> ReportResult<String> {
    Ok(ymd(year, month, 1)?.format("%B %Y").to_string())
}

/// `"Week N - (DD Mon - DD Mon YYYY)"`, with the end clipped to the month
/// boundary. A week starting past the month's end titles as the explicit
/// invalid-state marker.
fn week_title(year: i64, month: i64, week: i64) -> ReportResult<String> {
    let first = ymd(year, month, 1)?;
    let start = first + Duration::days((week - 1) * 7);
    if start.month() as i64 != month || start.year() as i64 != year {
        return Ok(INVALID_WEEK_TITLE.to_string());
    }

    let next_month = if month == 12 {
        ymd(year + 1, 1, 1)?
    } else {
        ymd(year, month + 1, 1)?
    };
    let last = next_month.pred_opt().ok_or_else(|| {
        ReportError::DataValidation(format!("Invalid calendar month {:04}-{:02}", year, month))
    })?;
    let end = std::cmp::min(start + Duration::days(6), last);

    Ok(format!(
        "Week {} - ({} - {})",
        week,
        start.format("%d %b"),
        end.format("%d %b %Y")
    ))
}

fn lot_summary_rows(slice: &Table, numeric_columns: &[String]) -> Vec<Record> {
    let reductions: [(&str, fn(&[&Value]) -> Value); 3] = [
        ("Maximum", reduce_max),
        ("Minimum", reduce_min),
        ("Average", reduce_mean),
    ];

    reductions
        .iter()
        .map(|(label, reduce)| {
            let mut row = Record::new();
            for column in numeric_columns {
                let values = slice.column_values(column).unwrap_or_default();
                row.set(column.clone(), round_one_decimal(reduce(&values)));
            }
            row.set("summary_label", Value::Text(label.to_string()));
            row
        })
        .collect()
}

fn reduce_max(values: &[&Value]) -> Value {
    values
        .iter()
        .filter(|v| !v.is_empty())
        .max_by(|a, b| a.compare(b))
        .map(|v| (*v).clone())
        .unwrap_or(Value::Empty)
}

fn reduce_min(values: &[&Value]) -> Value {
    values
        .iter()
        .filter(|v| !v.is_empty())
        .min_by(|a, b| a.compare(b))
        .map(|v| (*v).clone())
        .unwrap_or(Value::Empty)
}

fn reduce_mean(values: &[&Value]) -> Value {
    let numeric: Vec<f64> = values.iter().filter_map(|v| v.as_f64()).collect();
    if numeric.is_empty() {
        Value::Empty
    } else {
        Value::Float(numeric.iter().sum::<f64>() / numeric.len() as f64)
    }
}

fn round_one_decimal(value: Value) -> Value {
    match value {
        Value::Float(f) => Value::Float(formula::round_half_even(f, 1)),
        other => other,
    }
}

// ============================================================================
// TESTS
// ============================================================================
