//! FILENAME: report-engine/src/config.rs
//! Engine configuration: the read-only registry a `ReportEngine` is built
//! from. Loading from YAML/JSON files is a host concern; this crate only
//! defines the structured value and its merge semantics.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::definition::{ColumnMapping, TimeFormat};

/// Per-department settings. The product column names the identity column
/// that distinguishes what the department manufactures.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepartmentConfig {
    pub product_column: String,
}

/// Declared metadata for a known column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnDefinition {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precision: Option<u32>,
    #[serde(default)]
    pub sort_order: i32,
}

impl ColumnDefinition {
    pub fn to_mapping(&self) -> ColumnMapping {
        ColumnMapping {
            name: self.name.clone(),
            unit: self.unit.clone(),
            sort_order: self.sort_order,
        }
    }
}

/// A named formula: expression plus its parameter resolution maps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormulaConfig {
    pub formula: String,
    /// parameter -> source column
    pub parameters: BTreeMap<String, String>,
    /// parameter -> constant id
    #[serde(default)]
    pub constants: BTreeMap<String, String>,
}

/// The complete engine configuration. One value per engine; read-only once
/// a build starts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub departments: HashMap<String, DepartmentConfig>,
    pub column_definitions: BTreeMap<String, ColumnDefinition>,
    pub formulas: BTreeMap<String, FormulaConfig>,
    pub constants: HashMap<String, f64>,
    pub precision_defaults: HashMap<String, u32>,
    pub shift_labels: HashMap<String, String>,
    pub time_formats: HashMap<String, TimeFormat>,

    /// Keys every role classification starts from.
    pub default_grouping_columns: Vec<String>,

    /// Default role lists used when a request supplies none.
    pub grouping_columns: Vec<String>,
    pub sum_columns: Vec<String>,
    pub average_columns: Vec<String>,
    pub count_distinct_columns: Vec<String>,
    pub count_nonnull_columns: Vec<String>,
    pub first_value_columns: Vec<String>,
    pub summary_columns: Vec<String>,
    pub sorting_columns: Vec<String>,

    pub sequence_column: Option<String>,
    pub end_time_column: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            departments: HashMap::new(),
            column_definitions: BTreeMap::new(),
            formulas: BTreeMap::new(),
            constants: HashMap::new(),
            precision_defaults: HashMap::new(),
            shift_labels: HashMap::new(),
            time_formats: HashMap::new(),
            default_grouping_columns: ["date", "lot_number", "asset_id", "machine_name"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            grouping_columns: Vec::new(),
            sum_columns: Vec::new(),
            average_columns: Vec::new(),
            count_distinct_columns: Vec::new(),
            count_nonnull_columns: Vec::new(),
            first_value_columns: Vec::new(),
            summary_columns: Vec::new(),
            sorting_columns: Vec::new(),
            sequence_column: None,
            end_time_column: None,
        }
    }
}

impl EngineConfig {
    /// Total merge of two configurations. Precedence: `other` wins on
    /// scalars, maps extend with `other` winning per key, lists concatenate
    /// de-duplicated in first-seen order.
    pub fn merge(mut self, other: EngineConfig) -> EngineConfig {
        self.departments.extend(other.departments);
        self.column_definitions.extend(other.column_definitions);
        self.formulas.extend(other.formulas);
        self.constants.extend(other.constants);
        self.precision_defaults.extend(other.precision_defaults);
        self.shift_labels.extend(other.shift_labels);
        self.time_formats.extend(other.time_formats);

        self.default_grouping_columns =
            concat_dedup(self.default_grouping_columns, other.default_grouping_columns);
        self.grouping_columns = concat_dedup(self.grouping_columns, other.grouping_columns);
        self.sum_columns = concat_dedup(self.sum_columns, other.sum_columns);
        self.average_columns = concat_dedup(self.average_columns, other.average_columns);
        self.count_distinct_columns =
            concat_dedup(self.count_distinct_columns, other.count_distinct_columns);
        self.count_nonnull_columns =
            concat_dedup(self.count_nonnull_columns, other.count_nonnull_columns);
        self.first_value_columns =
            concat_dedup(self.first_value_columns, other.first_value_columns);
        self.summary_columns = concat_dedup(self.summary_columns, other.summary_columns);
        self.sorting_columns = concat_dedup(self.sorting_columns, other.sorting_columns);

        if other.sequence_column.is_some() {
            self.sequence_column = other.sequence_column;
        }
        if other.end_time_column.is_some() {
            self.end_time_column = other.end_time_column;
        }
        self
    }

    /// Default display mappings derived from the column definitions.
    pub fn default_column_mappings(&self) -> BTreeMap<String, ColumnMapping> {
        self.column_definitions
            .iter()
            .map(|(column, def)| (column.clone(), def.to_mapping()))
            .collect()
    }
}

fn concat_dedup(mut base: Vec<String>, extra: Vec<String>) -> Vec<String> {
    for item in extra {
        if !base.contains(&item) {
            base.push(item);
        }
    }
    base
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_later_source_wins_on_scalars_and_map_keys() {
        let mut base = EngineConfig::default();
        base.constants.insert("denier".to_string(), 9000.0);
        base.sequence_column = Some("doff_number".to_string());

        let mut over = EngineConfig::default();
        over.constants.insert("denier".to_string(), 9500.0);
        over.constants.insert("tex".to_string(), 1000.0);
        over.sequence_column = Some("cycle_number".to_string());

        let merged = base.merge(over);
        assert_eq!(merged.constants["denier"], 9500.0);
        assert_eq!(merged.constants["tex"], 1000.0);
        assert_eq!(merged.sequence_column.as_deref(), Some("cycle_number"));
    }

    #[test]
    fn merge_concatenates_lists_without_duplicates() {
        let mut base = EngineConfig::default();
        base.sum_columns = vec!["production".to_string(), "waste".to_string()];
        let mut over = EngineConfig::default();
        over.sum_columns = vec!["waste".to_string(), "downtime".to_string()];

        let merged = base.merge(over);
        assert_eq!(merged.sum_columns, vec!["production", "waste", "downtime"]);
    }

    #[test]
    fn merge_keeps_scalar_when_other_is_unset() {
        let mut base = EngineConfig::default();
        base.sequence_column = Some("doff_number".to_string());
        let merged = base.merge(EngineConfig::default());
        assert_eq!(merged.sequence_column.as_deref(), Some("doff_number"));
    }

    #[test]
    fn default_grouping_columns_cover_identity_keys() {
        let config = EngineConfig::default();
        for key in ["date", "lot_number", "asset_id", "machine_name"] {
            assert!(config.default_grouping_columns.iter().any(|c| c == key));
        }
    }
}
