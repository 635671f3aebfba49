//! # Cello Client Library
//!
//! A typed client for the Cello v2 genetic circuit design tool. Cello itself
//! runs inside the `cidarlab/cello-dnacompiler` Docker image; this library
//! prepares its inputs, runs the container once per query and reads the
//! resulting artifacts back into plain Rust values.
//!
//! ## Architectural Philosophy
//!
//! The library follows a three-layer layout:
//!
//! - **[`core`]: The Foundation.** Stateless models of the documents Cello reads and
//!   writes (input sensor libraries, output netlists, logic and activity tables)
//!   and the chassis naming convention.
//!
//! - **[`engine`]: The Machinery.** Configuration, the container invocation and its
//!   [`engine::invocation::ContainerRuntime`] seam, the output directory lease and
//!   the archival of earlier results.
//!
//! - **[`workflows`]: The Public API.** [`CelloQuery`] and [`CelloResult`], which
//!   tie the other layers together.
//!
//! ## Example
//!
//! ```no_run
//! use celloapi::{CelloQuery, ChassisFiles, ProgressReporter, QueryConfigBuilder};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = QueryConfigBuilder::new()
//!     .input_dir("input")
//!     .output_dir("output")
//!     .verilog_file("and.v")
//!     .options_file(Some("options.csv".to_string()))
//!     .chassis(&ChassisFiles::new("Eco1C1G1T1"))
//!     .build()?;
//!
//! let mut query = CelloQuery::new(config)?;
//! query.set_input_signals(&["LacI", "TetR"])?;
//! let result = query.get_results(&ProgressReporter::new())?;
//! println!("circuit score: {}", result.circuit_score());
//! # Ok(())
//! # }
//! ```

pub mod core;
pub mod engine;
pub mod workflows;

pub use crate::core::chassis::{ChassisFiles, KNOWN_CHASSIS, known_chassis_names};
pub use crate::engine::config::{ConfigError, ContainerConfig, QueryConfig, QueryConfigBuilder};
pub use crate::engine::error::{CelloError, ErrorCategory};
pub use crate::engine::progress::{Progress, ProgressCallback, ProgressReporter};
pub use crate::workflows::query::{CUSTOM_INPUT_FILE, CelloQuery, CompletedRun};
pub use crate::workflows::result::CelloResult;
