//! FILENAME: report-engine/src/view.rs
//! Report View - the immutable output artifact.
//!
//! These types serialize to the wire shape consumed by report clients.
//! Period keys flatten into the owning section object, so a daywise
//! section carries `date`, a monthwise section `year_month`, and so on.

use std::collections::BTreeMap;

use model::Value;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::definition::{ColumnMapping, ReportType};

/// An insertion-ordered record, serialized as a JSON object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record(Vec<(String, Value)>);

impl Record {
    pub fn new() -> Self {
        Record(Vec::new())
    }

    /// Inserts or replaces a field, keeping first-insertion order.
    pub fn set(&mut self, column: impl Into<String>, value: Value) {
        let column = column.into();
        match self.0.iter_mut().find(|(c, _)| *c == column) {
            Some(entry) => entry.1 = value,
            None => self.0.push((column, value)),
        }
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.0.iter().find(|(c, _)| c == column).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(c, v)| (c.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, Value)> for Record {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        let mut record = Record::new();
        for (column, value) in iter {
            record.set(column, value);
        }
        record
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (column, value) in &self.0 {
            map.serialize_entry(column, value)?;
        }
        map.end()
    }
}

/// The natural ordering key of a section, flattened into its JSON object.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum PeriodKey {
    /// Daywise and shiftwise sections: `"YYYY-MM-DD"`.
    Date { date: String },
    /// Monthwise sections: `"YYYY-MM"`.
    YearMonth { year_month: String },
    /// Weekwise sections.
    Week {
        year: i64,
        month: i64,
        week_of_month: i64,
    },
    /// Instantaneous sections.
    Instant { platform_shift_id: Value },
}

/// An inner grouping of a section. Most reports wrap a flat record list;
/// shiftwise sections carry titled per-shift subsections with their own
/// summaries.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Subsection {
    Records { records: Vec<Record> },
    Shift {
        title: String,
        records: Vec<Record>,
        summary_label: String,
        summary: Record,
        shift_id: Value,
    },
}

/// One period of the report.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Section {
    Period {
        #[serde(skip_serializing_if = "Option::is_none")]
        title: Option<String>,
        subsections: Vec<Subsection>,
        #[serde(skip_serializing_if = "Option::is_none")]
        summary_label: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        summary: Option<Record>,
        #[serde(flatten)]
        key: Option<PeriodKey>,
    },
    /// Lotwise-consolidated: records plus the three fixed summary rows.
    Lot {
        lot_number: Value,
        records: Vec<Record>,
        summary: Vec<Record>,
    },
}

/// The terminal output artifact. Never mutated after assembly.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub report_type: ReportType,
    pub sections: Vec<Section>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary_label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<Record>,
    pub column_header_mapping: BTreeMap<String, ColumnMapping>,
}

// ============================================================================
// TESTS
// ============================================================================
