//! FILENAME: report-engine/src/calc.rs
//! Formula columns. Compiles every formula mapping up front (parameter and
//! constant resolution included) and applies them per grouped row.

use std::collections::{HashMap, HashSet};

use formula::{evaluate, Expression};
use model::{Table, Value};

use crate::definition::FormulaMapping;
use crate::error::{ReportError, ReportResult};

/// A formula mapping validated against its parameter maps and the
/// constants registry, ready to run per row.
#[derive(Debug, Clone)]
pub struct CompiledFormula {
    pub column_name: String,
    expression_text: String,
    expr: Expression,
    /// parameter -> source column, in mapping order
    param_columns: Vec<(String, String)>,
    /// constant parameters, resolved to their values
    const_bindings: HashMap<String, f64>,
}

/// Compiles all mappings. Unknown functions, unbound parameters and
/// unknown constant ids all fail here, before any data row is visited.
pub fn compile_mappings(
    mappings: &[FormulaMapping],
    constants: &HashMap<String, f64>,
) -> ReportResult<Vec<CompiledFormula>> {
    mappings.iter().map(|m| compile_mapping(m, constants)).collect()
}

fn compile_mapping(
    mapping: &FormulaMapping,
    constants: &HashMap<String, f64>,
) -> ReportResult<CompiledFormula> {
    let mut const_bindings = HashMap::new();
    for (param, const_id) in &mapping.param_const_map {
        let value = constants.get(const_id).ok_or_else(|| {
            ReportError::FormulaCalculation {
                expression: mapping.formula.clone(),
                detail: format!("unknown constant '{}' for parameter '{}'", const_id, param),
            }
        })?;
        const_bindings.insert(param.clone(), *value);
    }

    let bound: HashSet<String> = mapping
        .param_column_map
        .keys()
        .chain(mapping.param_const_map.keys())
        .cloned()
        .collect();
    let expr = formula::compile(&mapping.formula, &bound).map_err(|e| {
        ReportError::FormulaCalculation {
            expression: mapping.formula.clone(),
            detail: e.to_string(),
        }
    })?;

    Ok(CompiledFormula {
        column_name: mapping.column_name.clone(),
        expression_text: mapping.formula.clone(),
        expr,
        param_columns: mapping
            .param_column_map
            .iter()
            .map(|(p, c)| (p.clone(), c.clone()))
            .collect(),
        const_bindings,
    })
}

/// Appends one Float column per compiled formula, computed row by row.
/// A formula whose source columns are missing from the table is skipped
/// with a warning and its column omitted; a null or non-numeric operand
/// zeroes the formula result for that row without evaluating.
pub fn apply_formulas(table: &Table, formulas: &[CompiledFormula]) -> ReportResult<Table> {
    let mut out = table.clone();
    for formula in formulas {
        let missing: Vec<&str> = formula
            .param_columns
            .iter()
            .map(|(_, column)| column.as_str())
            .filter(|column| !out.has_column(column))
            .collect();
        if !missing.is_empty() {
            log::warn!(
                "Skipping formula for {}: missing columns {:?}",
                formula.column_name,
                missing
            );
            continue;
        }

        let indices: Vec<(&str, usize)> = formula
            .param_columns
            .iter()
            .filter_map(|(param, column)| {
                out.column_index(column).map(|idx| (param.as_str(), idx))
            })
            .collect();

        let mut values = Vec::with_capacity(out.n_rows());
        for row in out.rows() {
            let mut bindings = formula.const_bindings.clone();
            let mut numeric = true;
            for (param, idx) in &indices {
                match row[*idx].as_f64() {
                    Some(n) => {
                        bindings.insert(param.to_string(), n);
                    }
                    None => {
                        numeric = false;
                        break;
                    }
                }
            }
            if !numeric {
                values.push(Value::Float(0.0));
                continue;
            }
            let result = evaluate(&formula.expr, &bindings).map_err(|e| {
                ReportError::FormulaCalculation {
                    expression: formula.expression_text.clone(),
                    detail: format!("{} (bindings: {:?})", e, bindings),
                }
            })?;
            values.push(Value::Float(result));
        }
        out = out.with_columns(vec![(formula.column_name.clone(), values)]);
    }
    Ok(out)
}

// ============================================================================
// TESTS
// ============================================================================
