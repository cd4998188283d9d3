//! FILENAME: report-engine/src/classify.rs
//! Column role classification. Resolves a (department, category, report
//! type) triple into the group-key set, the adjusted role lists, and the
//! mandatory identity display mappings.
//!
//! Every call builds fresh lists; nothing here is shared between builds.

use std::collections::BTreeMap;

use crate::config::EngineConfig;
use crate::definition::{ColumnMapping, ColumnRoles, ReportCategory, ReportFilter};
use crate::error::{ReportError, ReportResult};

const MACHINE_COLUMNS: [&str; 2] = ["asset_id", "machine_name"];

/// The classifier's output: disjoint group keys and role lists.
#[derive(Debug, Clone)]
pub struct Classification {
    pub grouping_columns: Vec<String>,
    pub roles: ColumnRoles,
}

/// Resolves the group-key and role column lists for one build.
///
/// Starts from the configured default group keys plus the department's
/// product column, then applies the category moves: `countwise`/`hankwise`
/// demote the machine columns to count-distinct, `lotwise` additionally
/// demotes the product column, `machinewise` changes nothing. Shift-based
/// report types add the shift keys.
pub fn classify(
    config: &EngineConfig,
    filter: &ReportFilter,
    caller_grouping: &[String],
    mut roles: ColumnRoles,
) -> ReportResult<Classification> {
    let department = config.departments.get(&filter.department_id).ok_or_else(|| {
        ReportError::Configuration(format!(
            "Department '{}' not configured",
            filter.department_id
        ))
    })?;

    let mut grouping: Vec<String> = Vec::new();
    for column in config
        .default_grouping_columns
        .iter()
        .chain(caller_grouping.iter())
    {
        push_unique(&mut grouping, column);
    }
    push_unique(&mut grouping, &department.product_column);

    match filter.category {
        ReportCategory::Countwise | ReportCategory::Hankwise => {
            for column in MACHINE_COLUMNS {
                push_unique(&mut roles.count_distinct, column);
            }
            grouping.retain(|c| !MACHINE_COLUMNS.contains(&c.as_str()));
        }
        ReportCategory::Lotwise => {
            for column in MACHINE_COLUMNS {
                push_unique(&mut roles.count_distinct, column);
            }
            push_unique(&mut roles.count_distinct, &department.product_column);
            grouping.retain(|c| !roles.count_distinct.contains(c));
        }
        ReportCategory::Machinewise => {}
    }

    if filter.report_type.is_shift_based() {
        push_unique(&mut grouping, "shift_id");
        push_unique(&mut grouping, "platform_shift_id");
    }

    Ok(Classification {
        grouping_columns: grouping,
        roles,
    })
}

/// The fixed identity mappings injected per category, with negative sort
/// orders so they lead the display ordering. The department's product
/// column must carry a column definition wherever a product mapping is
/// required.
pub fn mandatory_mappings(
    config: &EngineConfig,
    filter: &ReportFilter,
) -> ReportResult<BTreeMap<String, ColumnMapping>> {
    let department = config.departments.get(&filter.department_id).ok_or_else(|| {
        ReportError::Configuration(format!(
            "Department '{}' not configured",
            filter.department_id
        ))
    })?;
    let product_column = department.product_column.as_str();

    let product_mapping = |sort_order: i32| -> ReportResult<ColumnMapping> {
        let def = config.column_definitions.get(product_column).ok_or_else(|| {
            ReportError::Configuration(format!(
                "No column definition for product column '{}'",
                product_column
            ))
        })?;
        Ok(ColumnMapping {
            name: def.name.clone(),
            unit: def.unit.clone(),
            sort_order,
        })
    };

    let mut mappings = BTreeMap::new();
    match filter.category {
        ReportCategory::Countwise => {
            mappings.insert(product_column.to_string(), product_mapping(-3)?);
            mappings.insert(
                "lot_number".to_string(),
                ColumnMapping::new("Lot name", -2),
            );
            mappings.insert(
                "machine_name".to_string(),
                ColumnMapping::new("No. of M/C", -1),
            );
        }
        ReportCategory::Lotwise => {
            mappings.insert(
                "lot_number".to_string(),
                ColumnMapping::new("Lot name", -3),
            );
            let mut product = product_mapping(-2)?;
            product.name = format!("No. of {}", product.name);
            mappings.insert(product_column.to_string(), product);
            mappings.insert(
                "machine_name".to_string(),
                ColumnMapping::new("No. of M/C", -1),
            );
        }
        ReportCategory::Machinewise => {
            mappings.insert(
                "machine_name".to_string(),
                ColumnMapping::new("M/C Name", -3),
            );
            mappings.insert(product_column.to_string(), product_mapping(-2)?);
            mappings.insert(
                "lot_number".to_string(),
                ColumnMapping::new("Lot name", -1),
            );
        }
        ReportCategory::Hankwise => {}
    }
    Ok(mappings)
}

fn push_unique(list: &mut Vec<String>, column: &str) {
    if !list.iter().any(|c| c == column) {
        list.push(column.to_string());
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ColumnDefinition, DepartmentConfig};
    use crate::definition::ReportType;

    fn config() -> EngineConfig {
        let mut config = EngineConfig::default();
        config.departments.insert(
            "spinning".to_string(),
            DepartmentConfig {
                product_column: "count_name".to_string(),
            },
        );
        config.column_definitions.insert(
            "count_name".to_string(),
            ColumnDefinition {
                name: "Count".to_string(),
                unit: Some("Ne".to_string()),
                precision: None,
                sort_order: 0,
            },
        );
        config
    }

    fn filter(category: ReportCategory, report_type: ReportType) -> ReportFilter {
        ReportFilter {
            department_id: "spinning".to_string(),
            category,
            report_type,
        }
    }

    #[test]
    fn unknown_department_is_a_configuration_error() {
        let mut bad = filter(ReportCategory::Countwise, ReportType::Daywise);
        bad.department_id = "weaving".to_string();
        let err = classify(&config(), &bad, &[], ColumnRoles::default()).unwrap_err();
        assert!(matches!(err, ReportError::Configuration(_)));
    }

    #[test]
    fn countwise_demotes_machine_columns_to_count_distinct() {
        let result = classify(
            &config(),
            &filter(ReportCategory::Countwise, ReportType::Daywise),
            &[],
            ColumnRoles::default(),
        )
        .unwrap();

        assert!(result.roles.count_distinct.contains(&"asset_id".to_string()));
        assert!(result
            .roles
            .count_distinct
            .contains(&"machine_name".to_string()));
        assert!(!result.grouping_columns.contains(&"asset_id".to_string()));
        assert!(!result
            .grouping_columns
            .contains(&"machine_name".to_string()));
        assert!(result.grouping_columns.contains(&"count_name".to_string()));
    }

    #[test]
    fn lotwise_also_demotes_the_product_column() {
        let result = classify(
            &config(),
            &filter(ReportCategory::Lotwise, ReportType::Daywise),
            &[],
            ColumnRoles::default(),
        )
        .unwrap();

        assert!(result
            .roles
            .count_distinct
            .contains(&"count_name".to_string()));
        assert!(!result.grouping_columns.contains(&"count_name".to_string()));
    }

    #[test]
    fn machinewise_keeps_machine_columns_grouped() {
        let result = classify(
            &config(),
            &filter(ReportCategory::Machinewise, ReportType::Daywise),
            &[],
            ColumnRoles::default(),
        )
        .unwrap();

        assert!(result.grouping_columns.contains(&"asset_id".to_string()));
        assert!(result.roles.count_distinct.is_empty());
    }

    #[test]
    fn shift_based_reports_gain_shift_keys() {
        let result = classify(
            &config(),
            &filter(ReportCategory::Machinewise, ReportType::Shiftwise),
            &[],
            ColumnRoles::default(),
        )
        .unwrap();

        assert!(result.grouping_columns.contains(&"shift_id".to_string()));
        assert!(result
            .grouping_columns
            .contains(&"platform_shift_id".to_string()));
    }

    #[test]
    fn countwise_mandatory_mappings_lead_with_product() {
        let mappings = mandatory_mappings(
            &config(),
            &filter(ReportCategory::Countwise, ReportType::Daywise),
        )
        .unwrap();

        assert_eq!(mappings["count_name"].sort_order, -3);
        assert_eq!(mappings["lot_number"].name, "Lot name");
        assert_eq!(mappings["lot_number"].sort_order, -2);
        assert_eq!(mappings["machine_name"].name, "No. of M/C");
        assert_eq!(mappings["machine_name"].sort_order, -1);
    }

    #[test]
    fn lotwise_renames_product_as_count() {
        let mappings = mandatory_mappings(
            &config(),
            &filter(ReportCategory::Lotwise, ReportType::Daywise),
        )
        .unwrap();

        assert_eq!(mappings["count_name"].name, "No. of Count");
        assert_eq!(mappings["count_name"].sort_order, -2);
        assert_eq!(mappings["lot_number"].sort_order, -3);
    }

    #[test]
    fn hankwise_injects_no_mappings() {
        let mappings = mandatory_mappings(
            &config(),
            &filter(ReportCategory::Hankwise, ReportType::Daywise),
        )
        .unwrap();
        assert!(mappings.is_empty());
    }

    #[test]
    fn successive_builds_do_not_share_lists() {
        let cfg = config();
        let lot = filter(ReportCategory::Lotwise, ReportType::Daywise);
        let first = classify(&cfg, &lot, &[], ColumnRoles::default()).unwrap();
        let second = classify(&cfg, &lot, &[], ColumnRoles::default()).unwrap();
        assert_eq!(first.grouping_columns, second.grouping_columns);
        assert_eq!(
            first.roles.count_distinct,
            second.roles.count_distinct
        );
    }
}
