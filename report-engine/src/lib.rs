//! FILENAME: report-engine/src/lib.rs
//! Hierarchical report subsystem for manufacturing-floor data.
//!
//! This crate turns a flat measurement table (one row per machine, shift
//! or time slice) into nested per-hour/day/week/month/shift/instant/lot
//! reports with roll-up summaries and computed KPI columns. It depends on
//! `model` for the shared value/table types and on `formula` for the
//! restricted arithmetic expression language.
//!
//! Layers:
//! - `config`: The read-only engine registry (departments, formulas, ...)
//! - `definition`: Per-build configuration (what the report IS)
//! - `classify` / `aggregate` / `calc` / `transform`: Pipeline stages
//! - `builder`: Per-report-type section assembly (HOW we build)
//! - `view`: The serializable output artifact (WHAT we emit)
//! - `engine`: The facade tying a request to a build

pub mod aggregate;
pub mod builder;
pub mod calc;
pub mod classify;
pub mod config;
pub mod definition;
pub mod engine;
pub mod error;
pub mod transform;
pub mod view;

pub use config::{ColumnDefinition, DepartmentConfig, EngineConfig, FormulaConfig};
pub use definition::{
    ColumnMapping, ColumnRoles, FormulaMapping, ReportCategory, ReportDefinition, ReportFilter,
    ReportType, Role, TimeFormat,
};
pub use engine::{ReportEngine, ReportRequest};
pub use error::{ReportError, ReportResult};
pub use view::{PeriodKey, Record, Report, Section, Subsection};
