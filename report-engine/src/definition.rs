//! FILENAME: report-engine/src/definition.rs
//! Report Definition - The serializable configuration of a single build.
//!
//! This module contains all the types needed to DESCRIBE a report run.
//! These structures are designed to be:
//! - Serializable (for wire transport and fixtures)
//! - Immutable snapshots of caller intent: a definition is assembled once
//!   through the consuming `with_*` builder methods and never mutated by a
//!   build, so concurrent builds cannot alias each other's key lists.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

// ============================================================================
// REPORT TYPE & CATEGORY
// ============================================================================

/// The nesting strategy of the generated report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportType {
    Hourwise,
    Daywise,
    Weekwise,
    Monthwise,
    Shiftwise,
    Instantaneous,
    #[serde(rename = "lotwise_consolidated")]
    LotwiseConsolidated,
}

impl ReportType {
    /// The wire tag emitted as `report_type` in the assembled report.
    pub fn tag(self) -> &'static str {
        match self {
            ReportType::Hourwise => "hourwise",
            ReportType::Daywise => "daywise",
            ReportType::Weekwise => "weekwise",
            ReportType::Monthwise => "monthwise",
            ReportType::Shiftwise => "shiftwise",
            ReportType::Instantaneous => "instantaneous",
            ReportType::LotwiseConsolidated => "lotwise_consolidated",
        }
    }

    /// Shift-bearing reports group on `shift_id` / `platform_shift_id`.
    pub fn is_shift_based(self) -> bool {
        matches!(self, ReportType::Shiftwise | ReportType::Instantaneous)
    }
}

/// Aggregation category of the requested report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportCategory {
    Countwise,
    Hankwise,
    Lotwise,
    Machinewise,
}

/// Filter parameters selecting what report to build.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportFilter {
    pub department_id: String,
    pub category: ReportCategory,
    pub report_type: ReportType,
}

// ============================================================================
// COLUMN ROLES
// ============================================================================

/// How a role-tagged column is reduced when rows are grouped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Sum,
    Average,
    CountDistinct,
    CountNonNull,
    First,
}

/// The five aggregation-role column lists of one build. A column belongs to
/// at most one list; group-key columns are tracked separately and must stay
/// disjoint from these.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ColumnRoles {
    #[serde(default)]
    pub sum: Vec<String>,
    #[serde(default)]
    pub average: Vec<String>,
    #[serde(default)]
    pub count_distinct: Vec<String>,
    #[serde(default)]
    pub count_nonnull: Vec<String>,
    #[serde(default)]
    pub first: Vec<String>,
}

impl ColumnRoles {
    /// All role-tagged columns with their role, in reduction order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Role)> {
        self.sum
            .iter()
            .map(|c| (c.as_str(), Role::Sum))
            .chain(self.average.iter().map(|c| (c.as_str(), Role::Average)))
            .chain(
                self.count_distinct
                    .iter()
                    .map(|c| (c.as_str(), Role::CountDistinct)),
            )
            .chain(
                self.count_nonnull
                    .iter()
                    .map(|c| (c.as_str(), Role::CountNonNull)),
            )
            .chain(self.first.iter().map(|c| (c.as_str(), Role::First)))
    }

    pub fn role_of(&self, column: &str) -> Option<Role> {
        self.iter().find(|(c, _)| *c == column).map(|(_, r)| r)
    }
}

// ============================================================================
// DISPLAY & FORMULA MAPPINGS
// ============================================================================

/// Display metadata for one output column. Negative sort orders force the
/// mandatory identity columns ahead of everything else.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnMapping {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(rename = "sortOrder", default)]
    pub sort_order: i32,
}

impl ColumnMapping {
    pub fn new(name: impl Into<String>, sort_order: i32) -> Self {
        ColumnMapping {
            name: name.into(),
            unit: None,
            sort_order,
        }
    }
}

/// One derived KPI column. Every parameter the expression references must
/// resolve through exactly one of the two maps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormulaMapping {
    pub column_name: String,
    pub formula: String,
    #[serde(rename = "paramColumnMap")]
    pub param_column_map: BTreeMap<String, String>,
    #[serde(rename = "paramConstMap", default)]
    pub param_const_map: BTreeMap<String, String>,
}

/// Input/output patterns for reformatting a string-typed time column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeFormat {
    pub input_format: String,
    pub output_format: String,
}

// ============================================================================
// REPORT DEFINITION
// ============================================================================

/// Everything one build needs, resolved up front. Constructed through the
/// consuming `with_*` methods and treated as read-only by the build itself.
#[derive(Debug, Clone)]
pub struct ReportDefinition {
    pub report_type: ReportType,
    /// Group keys for leaf records. The date-derived keys always lead.
    pub group_by_columns: Vec<String>,
    pub roles: ColumnRoles,
    pub summary_columns: Vec<String>,
    pub sorting_columns: Vec<String>,
    pub column_mappings: BTreeMap<String, ColumnMapping>,
    pub formula_mappings: Vec<FormulaMapping>,
    pub constants: HashMap<String, f64>,
    pub precision: HashMap<String, u32>,
    pub shift_labels: HashMap<String, String>,
    pub time_formats: HashMap<String, TimeFormat>,
    /// Daywise: column receiving the 1-based running index.
    pub sequence_column: Option<String>,
    /// Hourwise: time-of-day column truncated to its `HH:MM` suffix.
    pub end_time_column: Option<String>,
}

impl ReportDefinition {
    pub fn new(report_type: ReportType) -> Self {
        ReportDefinition {
            report_type,
            group_by_columns: ["day", "month", "year", "week_of_month"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            roles: ColumnRoles::default(),
            summary_columns: Vec::new(),
            sorting_columns: Vec::new(),
            column_mappings: BTreeMap::new(),
            formula_mappings: Vec::new(),
            constants: HashMap::new(),
            precision: HashMap::new(),
            shift_labels: HashMap::new(),
            time_formats: HashMap::new(),
            sequence_column: None,
            end_time_column: None,
        }
    }

    /// Appends to the default date-derived group keys, skipping duplicates.
    pub fn with_group_by_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for column in columns {
            let column = column.into();
            if !self.group_by_columns.contains(&column) {
                self.group_by_columns.push(column);
            }
        }
        self
    }

    pub fn with_roles(mut self, roles: ColumnRoles) -> Self {
        self.roles = roles;
        self
    }

    pub fn with_summary_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.summary_columns = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_sorting_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sorting_columns = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_column_mappings(mut self, mappings: BTreeMap<String, ColumnMapping>) -> Self {
        self.column_mappings = mappings;
        self
    }

    pub fn with_formula_mappings(mut self, mappings: Vec<FormulaMapping>) -> Self {
        self.formula_mappings = mappings;
        self
    }

    pub fn with_constants(mut self, constants: HashMap<String, f64>) -> Self {
        self.constants = constants;
        self
    }

    pub fn with_precision(mut self, precision: HashMap<String, u32>) -> Self {
        self.precision = precision;
        self
    }

    pub fn with_shift_labels(mut self, labels: HashMap<String, String>) -> Self {
        self.shift_labels = labels;
        self
    }

    pub fn with_time_formats(mut self, formats: HashMap<String, TimeFormat>) -> Self {
        self.time_formats = formats;
        self
    }

    pub fn with_sequence_column(mut self, column: Option<String>) -> Self {
        self.sequence_column = column;
        self
    }

    pub fn with_end_time_column(mut self, column: Option<String>) -> Self {
        self.end_time_column = column;
        self
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_type_tags() {
        assert_eq!(ReportType::Shiftwise.tag(), "shiftwise");
        assert_eq!(ReportType::LotwiseConsolidated.tag(), "lotwise_consolidated");
    }

    #[test]
    fn definition_starts_with_date_derived_keys() {
        let def = ReportDefinition::new(ReportType::Daywise);
        assert_eq!(
            def.group_by_columns,
            vec!["day", "month", "year", "week_of_month"]
        );
    }

    #[test]
    fn with_group_by_columns_appends_without_duplicates() {
        let def = ReportDefinition::new(ReportType::Daywise)
            .with_group_by_columns(["lot_number", "day", "lot_number"]);
        assert_eq!(
            def.group_by_columns,
            vec!["day", "month", "year", "week_of_month", "lot_number"]
        );
    }

    #[test]
    fn roles_iterate_in_reduction_order() {
        let roles = ColumnRoles {
            sum: vec!["production".to_string()],
            average: vec!["efficiency".to_string()],
            ..Default::default()
        };
        let collected: Vec<_> = roles.iter().collect();
        assert_eq!(collected[0], ("production", Role::Sum));
        assert_eq!(collected[1], ("efficiency", Role::Average));
        assert_eq!(roles.role_of("production"), Some(Role::Sum));
        assert_eq!(roles.role_of("missing"), None);
    }

    #[test]
    fn formula_mapping_uses_wire_field_names() {
        let json = r#"{
            "column_name": "efficiency",
            "formula": "produced / target * 100",
            "paramColumnMap": {"produced": "production", "target": "target_production"},
            "paramConstMap": {}
        }"#;
        let mapping: FormulaMapping = serde_json::from_str(json).unwrap();
        assert_eq!(mapping.column_name, "efficiency");
        assert_eq!(mapping.param_column_map["produced"], "production");
    }
}
