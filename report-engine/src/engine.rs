//! FILENAME: report-engine/src/engine.rs
//! The engine facade. Validates the request against the configuration,
//! resolves roles and mandatory display mappings, assembles a fresh
//! `ReportDefinition` and runs the build.
//!
//! Nothing is shared between builds except the read-only configuration,
//! so concurrent callers can hold one engine and build in parallel.

use std::collections::BTreeMap;

use model::Table;

use crate::classify;
use crate::config::EngineConfig;
use crate::definition::{
    ColumnMapping, ColumnRoles, FormulaMapping, ReportDefinition, ReportFilter,
};
use crate::error::ReportResult;
use crate::view::Report;

/// Per-request overrides. Anything left `None` falls back to the engine
/// configuration's defaults.
#[derive(Debug, Clone, Default)]
pub struct ReportRequest {
    pub grouping_columns: Option<Vec<String>>,
    pub roles: Option<ColumnRoles>,
    pub summary_columns: Option<Vec<String>>,
    pub column_mappings: Option<BTreeMap<String, ColumnMapping>>,
    pub sorting_columns: Option<Vec<String>>,
}

pub struct ReportEngine {
    config: EngineConfig,
}

impl ReportEngine {
    pub fn new(config: EngineConfig) -> Self {
        ReportEngine { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Builds a report with the configuration defaults.
    pub fn generate(&self, table: &Table, filter: &ReportFilter) -> ReportResult<Option<Report>> {
        self.generate_with(table, filter, ReportRequest::default())
    }

    /// Builds a report, letting the request override the configured role
    /// lists and display mappings. The department is validated before any
    /// data is touched.
    pub fn generate_with(
        &self,
        table: &Table,
        filter: &ReportFilter,
        request: ReportRequest,
    ) -> ReportResult<Option<Report>> {
        let roles = request.roles.unwrap_or_else(|| self.default_roles());
        let caller_grouping = request
            .grouping_columns
            .unwrap_or_else(|| self.config.grouping_columns.clone());

        let classification = classify::classify(&self.config, filter, &caller_grouping, roles)?;

        let mut column_mappings = request
            .column_mappings
            .unwrap_or_else(|| self.config.default_column_mappings());
        column_mappings.extend(classify::mandatory_mappings(&self.config, filter)?);

        let definition = ReportDefinition::new(filter.report_type)
            .with_group_by_columns(classification.grouping_columns)
            .with_roles(classification.roles)
            .with_summary_columns(
                request
                    .summary_columns
                    .unwrap_or_else(|| self.config.summary_columns.clone()),
            )
            .with_sorting_columns(
                request
                    .sorting_columns
                    .unwrap_or_else(|| self.config.sorting_columns.clone()),
            )
            .with_column_mappings(column_mappings)
            .with_formula_mappings(self.formula_mappings())
            .with_constants(self.config.constants.clone())
            .with_precision(self.config.precision_defaults.clone())
            .with_shift_labels(self.config.shift_labels.clone())
            .with_time_formats(self.config.time_formats.clone())
            .with_sequence_column(self.config.sequence_column.clone())
            .with_end_time_column(self.config.end_time_column.clone());

        definition.build(table)
    }

    fn default_roles(&self) -> ColumnRoles {
        ColumnRoles {
            sum: self.config.sum_columns.clone(),
            average: self.config.average_columns.clone(),
            count_distinct: self.config.count_distinct_columns.clone(),
            count_nonnull: self.config.count_nonnull_columns.clone(),
            first: self.config.first_value_columns.clone(),
        }
    }

    /// The configured named formulas in wire-mapping form.
    fn formula_mappings(&self) -> Vec<FormulaMapping> {
        self.config
            .formulas
            .iter()
            .map(|(name, formula)| FormulaMapping {
                column_name: name.clone(),
                formula: formula.formula.clone(),
                param_column_map: formula.parameters.clone(),
                param_const_map: formula.constants.clone(),
            })
            .collect()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DepartmentConfig;
    use crate::definition::{ReportCategory, ReportType};
    use model::Value;

    fn engine() -> ReportEngine {
        let mut config = EngineConfig::default();
        config.departments.insert(
            "spinning".to_string(),
            DepartmentConfig {
                product_column: "count_name".to_string(),
            },
        );
        config.sum_columns = vec!["production".to_string()];
        config.summary_columns = vec!["production".to_string()];
        ReportEngine::new(config)
    }

    fn filter() -> ReportFilter {
        ReportFilter {
            department_id: "spinning".to_string(),
            category: ReportCategory::Hankwise,
            report_type: ReportType::Daywise,
        }
    }

    #[test]
    fn empty_table_yields_none() {
        let table = Table::new(["date", "production"]);
        let report = engine().generate(&table, &filter()).unwrap();
        assert!(report.is_none());
    }

    #[test]
    fn unknown_department_fails_before_touching_data() {
        let mut bad = filter();
        bad.department_id = "weaving".to_string();
        let mut table = Table::new(["date", "production"]);
        table.push_row([Value::from("2025-07-01"), Value::Int(10)]);
        assert!(engine().generate(&table, &bad).is_err());
    }

    #[test]
    fn daywise_two_row_scenario() {
        let mut table = Table::new([
            "date",
            "shift_id",
            "production",
            "asset_id",
            "machine_name",
            "lot_number",
        ]);
        table.push_row([
            Value::from("2025-07-01"),
            Value::from("S1"),
            Value::Int(10),
            Value::from("A1"),
            Value::from("M1"),
            Value::from("L1"),
        ]);
        table.push_row([
            Value::from("2025-07-01"),
            Value::from("S1"),
            Value::Int(20),
            Value::from("A2"),
            Value::from("M2"),
            Value::from("L1"),
        ]);

        let report = engine()
            .generate(&table, &filter())
            .unwrap()
            .expect("non-empty input builds a report");

        let summary = report.summary.as_ref().unwrap();
        assert_eq!(summary.get("production"), Some(&Value::Int(30)));
        assert_eq!(report.sections.len(), 1);
        match &report.sections[0] {
            crate::view::Section::Period { title, .. } => {
                assert_eq!(title.as_deref(), Some("01 Jul 2025"));
            }
            other => panic!("expected a period section, got {:?}", other),
        }
    }
}
