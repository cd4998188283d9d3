//! FILENAME: report-engine/src/error.rs

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Data validation error: {0}")]
    DataValidation(String),

    #[error("Error calculating formula '{expression}': {detail}")]
    FormulaCalculation { expression: String, detail: String },
}

pub type ReportResult<T> = Result<T, ReportError>;
