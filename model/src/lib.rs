//! FILENAME: model/src/lib.rs
//! Shared data model for the report engine.
//!
//! This crate provides the fundamental value and table types that the
//! rest of the workspace operates on:
//! - `value`: the dynamically-typed cell value with hashable/orderable
//!   semantics so values can key group maps and drive sorting
//! - `table`: an immutable, uniform column-by-row snapshot of source data

pub mod table;
pub mod value;

pub use table::Table;
pub use value::Value;
