//! Python bindings for the Cello container client.
//!
//! # Example
//!
//! ```python
//! from celloapi2 import CelloQuery, CelloResult
//!
//! q = CelloQuery(
//!     input_directory="/data/input",
//!     output_directory="/data/output",
//!     verilog_file="and.v",
//!     input_ucf="Eco1C1G1T1.UCF.json",
//!     input_sensors="Eco1C1G1T1.input.json",
//!     output_device="Eco1C1G1T1.output.json",
//!     compiler_options="options.csv",
//! )
//! for signal in q.get_input_signals():
//!     print(signal)
//! q.set_input_signals(["LacI", "TetR"])
//! result = q.get_results()
//! print(result.circuit_score, result.repressor_scores)
//! ```

mod error;
mod query;
mod result;

use pyo3::prelude::*;

/// celloapi2: run Cello v2 in a container and read back its scores.
///
/// This module provides:
/// - CelloQuery: input files, signal selection and container runs
/// - CelloResult: circuit and per-gate scores of an output directory
/// - CelloError and its subclasses, one per failure category
#[pymodule]
fn celloapi2(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<query::PyCelloQuery>()?;
    m.add_class::<result::PyCelloResult>()?;
    m.add("CUSTOM_INPUT_FILE", celloapi::CUSTOM_INPUT_FILE)?;
    m.add_function(wrap_pyfunction!(known_chassis, m)?)?;

    error::register(m)?;
    Ok(())
}

/// Names of the chassis shipped with Cello v2.
#[pyfunction]
fn known_chassis() -> Vec<&'static str> {
    celloapi::known_chassis_names()
}
