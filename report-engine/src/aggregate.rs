//! FILENAME: report-engine/src/aggregate.rs
//! Grouping and reduction. Partitions a table by its group-key tuple and
//! reduces every role-tagged column to one value per partition.
//!
//! Partition order is first-seen row order, so repeated builds over the
//! same input produce identical output.

use model::{Table, Value};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::definition::{ColumnRoles, Role};
use crate::error::{ReportError, ReportResult};

/// Key tuple for one partition. Most reports group on a handful of columns.
type GroupKey = SmallVec<[Value; 4]>;

/// Partitions `table` by the group-key columns present in it and reduces
/// each partition's role-tagged columns. Absent group keys are silently
/// dropped from the key tuple; columns with no role that are not group keys
/// are dropped from the output.
pub fn group(table: &Table, group_keys: &[String], roles: &ColumnRoles) -> ReportResult<Table> {
    let key_indices: Vec<(String, usize)> = group_keys
        .iter()
        .filter_map(|name| table.column_index(name).map(|idx| (name.clone(), idx)))
        .collect();
    if key_indices.is_empty() {
        return Err(ReportError::DataValidation(
            "No valid grouping columns found in table".to_string(),
        ));
    }

    let role_indices: Vec<(String, usize, Role)> = roles
        .iter()
        .filter_map(|(name, role)| {
            table
                .column_index(name)
                .map(|idx| (name.to_string(), idx, role))
        })
        .collect();

    // First-seen partition order.
    let mut partition_of: FxHashMap<GroupKey, usize> = FxHashMap::default();
    let mut keys: Vec<GroupKey> = Vec::new();
    let mut partitions: Vec<Vec<usize>> = Vec::new();
    for (row_idx, row) in table.rows().enumerate() {
        let key: GroupKey = key_indices.iter().map(|(_, idx)| row[*idx].clone()).collect();
        let slot = *partition_of.entry(key.clone()).or_insert_with(|| {
            keys.push(key);
            partitions.push(Vec::new());
            partitions.len() - 1
        });
        partitions[slot].push(row_idx);
    }

    let mut columns: Vec<String> = key_indices.iter().map(|(name, _)| name.clone()).collect();
    columns.extend(role_indices.iter().map(|(name, _, _)| name.clone()));

    let mut out = Table::new(columns);
    for (key, row_indices) in keys.iter().zip(&partitions) {
        let mut row: Vec<Value> = key.iter().cloned().collect();
        for (_, col_idx, role) in &role_indices {
            row.push(reduce(table, row_indices, *col_idx, *role));
        }
        out.push_row(row);
    }
    Ok(out)
}

/// Collapses the whole table to a single aggregate row. `First` columns are
/// excluded from summaries; the result narrows to `summary_columns` when
/// any of them resolve.
pub fn summarize(
    table: &Table,
    roles: &ColumnRoles,
    summary_columns: &[String],
) -> ReportResult<Table> {
    let role_indices: Vec<(String, usize, Role)> = roles
        .iter()
        .filter(|(_, role)| *role != Role::First)
        .filter_map(|(name, role)| {
            table
                .column_index(name)
                .map(|idx| (name.to_string(), idx, role))
        })
        .collect();
    if role_indices.is_empty() {
        return Err(ReportError::DataValidation(
            "No valid summary columns found".to_string(),
        ));
    }

    let all_rows: Vec<usize> = (0..table.n_rows()).collect();
    let mut out = Table::new(role_indices.iter().map(|(name, _, _)| name.clone()));
    out.push_row(
        role_indices
            .iter()
            .map(|(_, idx, role)| reduce(table, &all_rows, *idx, *role))
            .collect::<Vec<_>>(),
    );

    let narrowed: Vec<&String> = summary_columns
        .iter()
        .filter(|name| out.has_column(name))
        .collect();
    if !narrowed.is_empty() {
        out = out.select(narrowed.into_iter().map(String::as_str));
    }
    Ok(out)
}

fn reduce(table: &Table, row_indices: &[usize], col_idx: usize, role: Role) -> Value {
    // Indices come from grouping over 0..n_rows, so every lookup hits.
    let values = row_indices
        .iter()
        .filter_map(|&row| table.row(row))
        .map(|row| &row[col_idx]);
    match role {
        Role::Sum => reduce_sum(values),
        Role::Average => reduce_average(values),
        Role::CountDistinct => {
            let distinct: rustc_hash::FxHashSet<&Value> =
                values.filter(|v| !v.is_empty()).collect();
            Value::Int(distinct.len() as i64)
        }
        Role::CountNonNull => Value::Int(values.filter(|v| !v.is_empty()).count() as i64),
        Role::First => row_indices
            .first()
            .and_then(|&row| table.row(row))
            .map(|row| row[col_idx].clone())
            .unwrap_or(Value::Empty),
    }
}

/// Integer-preserving sum: stays `Int` until a float operand appears.
fn reduce_sum<'a>(values: impl Iterator<Item = &'a Value>) -> Value {
    let mut int_sum: i64 = 0;
    let mut float_sum: f64 = 0.0;
    let mut saw_float = false;
    for value in values {
        match value {
            Value::Int(i) => int_sum += i,
            Value::Float(f) => {
                saw_float = true;
                float_sum += f;
            }
            _ => {}
        }
    }
    if saw_float {
        Value::Float(float_sum + int_sum as f64)
    } else {
        Value::Int(int_sum)
    }
}

/// Arithmetic mean of the numeric values; `Empty` when there are none.
fn reduce_average<'a>(values: impl Iterator<Item = &'a Value>) -> Value {
    let mut sum = 0.0;
    let mut count = 0usize;
    for value in values {
        if let Some(f) = value.as_f64() {
            sum += f;
            count += 1;
        }
    }
    if count == 0 {
        Value::Empty
    } else {
        Value::Float(sum / count as f64)
    }
}

// ============================================================================
// TESTS
// ============================================================================
