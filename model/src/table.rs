//! FILENAME: model/src/table.rs
//! PURPOSE: Uniform column-by-row snapshot of measurement data.
//! CONTEXT: The caller owns the input table; every engine stage consumes
//! a table and produces a new one, never mutating its input. Rows are
//! padded to the column count on insert so the uniform-shape invariant
//! holds by construction.

use crate::value::Value;

/// An ordered collection of uniform records (columns x rows).
#[derive(Debug, Clone, Default)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Table {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Appends a row, padding or truncating to the column count.
    pub fn push_row<I>(&mut self, values: I)
    where
        I: IntoIterator<Item = Value>,
    {
        let mut row: Vec<Value> = values.into_iter().collect();
        row.resize(self.columns.len(), Value::Empty);
        self.rows.push(row);
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    /// True when the table holds no rows or no columns.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() || self.columns.is_empty()
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Value]> {
        self.rows.iter().map(|r| r.as_slice())
    }

    pub fn row(&self, index: usize) -> Option<&[Value]> {
        self.rows.get(index).map(|r| r.as_slice())
    }

    /// Value at (row, column name); None if either is absent.
    pub fn get(&self, row: usize, column: &str) -> Option<&Value> {
        let col = self.column_index(column)?;
        self.rows.get(row).and_then(|r| r.get(col))
    }

    /// All values of one column, top to bottom.
    pub fn column_values(&self, name: &str) -> Option<Vec<&Value>> {
        let col = self.column_index(name)?;
        Some(self.rows.iter().map(|r| &r[col]).collect())
    }

    /// Returns a new table with the given columns appended (or replaced,
    /// when a column of that name already exists). Each value vector must
    /// have one entry per row; shorter vectors pad with Empty.
    pub fn with_columns(&self, new_columns: Vec<(String, Vec<Value>)>) -> Table {
        let mut table = self.clone();
        for (name, mut values) in new_columns {
            values.resize(table.rows.len(), Value::Empty);
            match table.column_index(&name) {
                Some(idx) => {
                    for (row, value) in table.rows.iter_mut().zip(values) {
                        row[idx] = value;
                    }
                }
                None => {
                    table.columns.push(name);
                    for (row, value) in table.rows.iter_mut().zip(values) {
                        row.push(value);
                    }
                }
            }
        }
        table
    }

    /// Returns a new table narrowed to the named columns, in the given
    /// order, silently skipping names the table does not have.
    pub fn select<'a, I>(&self, names: I) -> Table
    where
        I: IntoIterator<Item = &'a str>,
    {
        let indices: Vec<usize> = names
            .into_iter()
            .filter_map(|n| self.column_index(n))
            .collect();
        Table {
            columns: indices.iter().map(|&i| self.columns[i].clone()).collect(),
            rows: self
                .rows
                .iter()
                .map(|r| indices.iter().map(|&i| r[i].clone()).collect())
                .collect(),
        }
    }

    /// Returns a new table containing only the rows at `indices`,
    /// preserving the given order.
    pub fn take_rows(&self, indices: &[usize]) -> Table {
        Table {
            columns: self.columns.clone(),
            rows: indices
                .iter()
                .filter_map(|&i| self.rows.get(i).cloned())
                .collect(),
        }
    }

    /// True when the column holds at least one Float value and nothing
    /// non-numeric besides Empty. Rounding applies only to such columns.
    pub fn is_float_column(&self, name: &str) -> bool {
        let Some(col) = self.column_index(name) else {
            return false;
        };
        let mut saw_float = false;
        for row in &self.rows {
            match &row[col] {
                Value::Float(_) => saw_float = true,
                Value::Empty | Value::Int(_) => {}
                _ => return false,
            }
        }
        saw_float
    }

    /// True when the column holds numeric values only (besides Empty),
    /// with at least one of them present.
    pub fn is_numeric_column(&self, name: &str) -> bool {
        let Some(col) = self.column_index(name) else {
            return false;
        };
        let mut saw_number = false;
        for row in &self.rows {
            match &row[col] {
                Value::Int(_) | Value::Float(_) => saw_number = true,
                Value::Empty => {}
                _ => return false,
            }
        }
        saw_number
    }
}
