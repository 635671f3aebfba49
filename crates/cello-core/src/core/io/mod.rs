//! Readers for the files Cello consumes and produces.
//!
//! Cello's JSON output is not always strict JSON, its result tables are
//! header-less CSV files, and its output artifacts are named after the design.
//! This module hides those quirks behind small, typed readers.

pub mod artifacts;
pub mod lenient_json;
pub mod node_table;
