//! FILENAME: tests/common/mod.rs
//! Shared fixtures for report integration tests.

use std::collections::BTreeMap;

use model::{Table, Value};
use report_engine::{ColumnMapping, ColumnRoles, ReportDefinition, ReportType};

/// A small production run: two shifts on 01 Jul, one row on 02 Jul, one
/// row in week 5 (29 Jul) and one row in August.
pub fn production_table() -> Table {
    let mut table = Table::new([
        "date",
        "shift_id",
        "platform_shift_id",
        "lot_number",
        "asset_id",
        "machine_name",
        "production",
        "efficiency",
        "end_time",
    ]);
    let rows: Vec<(&str, &str, &str, &str, &str, &str, i64, f64, &str)> = vec![
        ("2025-07-01", "S1", "P1", "L1", "A1", "M1", 10, 90.0, "2025-07-01 06:30"),
        ("2025-07-01", "S2", "P2", "L1", "A2", "M2", 20, 80.0, "2025-07-01 14:30"),
        ("2025-07-02", "S1", "P1", "L2", "A1", "M1", 15, 85.0, "2025-07-02 06:30"),
        ("2025-07-29", "S1", "P1", "L2", "A1", "M1", 5, 70.0, "2025-07-29 06:30"),
        ("2025-08-01", "S1", "P1", "L3", "A1", "M1", 25, 95.0, "2025-08-01 06:30"),
    ];
    for (date, shift, platform, lot, asset, machine, production, efficiency, end) in rows {
        table.push_row([
            Value::from(date),
            Value::from(shift),
            Value::from(platform),
            Value::from(lot),
            Value::from(asset),
            Value::from(machine),
            Value::Int(production),
            Value::Float(efficiency),
            Value::from(end),
        ]);
    }
    table
}

pub fn display_mappings(columns: &[&str]) -> BTreeMap<String, ColumnMapping> {
    columns
        .iter()
        .enumerate()
        .map(|(i, column)| {
            (
                column.to_string(),
                ColumnMapping::new(column.to_string(), i as i32),
            )
        })
        .collect()
}

/// A definition over the production fixture: production sums, efficiency
/// averages, machines group.
pub fn definition(report_type: ReportType) -> ReportDefinition {
    ReportDefinition::new(report_type)
        .with_group_by_columns([
            "date",
            "lot_number",
            "asset_id",
            "machine_name",
            "shift_id",
            "platform_shift_id",
        ])
        .with_roles(ColumnRoles {
            sum: vec!["production".to_string()],
            average: vec!["efficiency".to_string()],
            count_distinct: vec![],
            count_nonnull: vec![],
            first: vec!["end_time".to_string()],
        })
        .with_column_mappings(display_mappings(&[
            "machine_name",
            "lot_number",
            "production",
            "efficiency",
            "end_time",
        ]))
}
