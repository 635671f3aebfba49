//! Python wrapper for the CelloResult class.

use pyo3::prelude::*;
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::error::cello_to_py_err;

/// Scores and tables read from one Cello output directory.
///
/// All values are captured when the object is created, so a later run into
/// the same directory does not change them.
///
/// Example:
///     >>> result = CelloResult("/data/output")
///     >>> result.circuit_score
///     112.5
///     >>> result.repressor_scores["$48"]
///     2.995732273553991
#[pyclass(name = "CelloResult", frozen)]
pub struct PyCelloResult {
    pub(crate) inner: celloapi::CelloResult,
}

impl From<celloapi::CelloResult> for PyCelloResult {
    fn from(inner: celloapi::CelloResult) -> Self {
        Self { inner }
    }
}

#[pymethods]
impl PyCelloResult {
    /// Read the result of a finished run.
    ///
    /// Args:
    ///     results_dir: The directory Cello wrote its output into.
    ///
    /// Raises:
    ///     ResultNotFoundError: An expected artifact is missing.
    ///     ResultParseError: An artifact cannot be read.
    #[new]
    fn new(results_dir: PathBuf) -> PyResult<Self> {
        celloapi::CelloResult::read(&results_dir)
            .map(Self::from)
            .map_err(cello_to_py_err)
    }

    #[getter]
    fn output_dir(&self) -> PathBuf {
        self.inner.output_dir().to_path_buf()
    }

    /// Overall circuit score reported by Cello's placement search.
    #[getter]
    fn circuit_score(&self) -> f64 {
        self.inner.circuit_score()
    }

    /// Per-gate scores, `ln(min ON activity / max OFF activity)`.
    #[getter]
    fn repressor_scores(&self) -> BTreeMap<String, f64> {
        self.inner.repressor_scores().clone()
    }

    /// Node label to truth-table states.
    #[getter]
    fn logic_dict(&self) -> BTreeMap<String, Vec<bool>> {
        self.inner.logic().clone()
    }

    /// Node label to predicted activity per truth-table state.
    #[getter]
    fn activity_dict(&self) -> BTreeMap<String, Vec<f64>> {
        self.inner.activity().clone()
    }

    /// Node label to the device name Cello assigned to it.
    #[getter]
    fn part_names(&self) -> BTreeMap<String, String> {
        self.inner.part_names().clone()
    }

    /// Device name to node label.
    fn get_part_map(&self) -> BTreeMap<String, String> {
        self.inner.part_map()
    }

    /// Score of a single gate, or None if the gate was not scored.
    fn gate_score(&self, label: &str) -> Option<f64> {
        self.inner.gate_score(label)
    }

    fn __repr__(&self) -> String {
        format!(
            "CelloResult(output_dir='{}', circuit_score={}, gates={})",
            self.inner.output_dir().display(),
            self.inner.circuit_score(),
            self.inner.repressor_scores().len()
        )
    }
}
