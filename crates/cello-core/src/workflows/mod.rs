//! # Workflows Module
//!
//! The public entry points of the library.
//!
//! - **Query** ([`query`]) - [`query::CelloQuery`] validates the inputs, selects input
//!   signals and runs the container; [`query::CompletedRun`] holds the output
//!   directory until its result is read.
//! - **Result** ([`result`]) - [`result::CelloResult`] reads the artifacts of one run
//!   into owned tables and scores.

pub mod query;
pub mod result;
