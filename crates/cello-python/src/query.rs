//! Python wrapper for the CelloQuery class.

use celloapi::{CUSTOM_INPUT_FILE, Progress, ProgressReporter, QueryConfigBuilder};
use pyo3::prelude::*;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{ConfigurationError, cello_to_py_err};
use crate::result::PyCelloResult;

/// A validated Cello run configuration.
///
/// Every file name is relative to `input_directory`. Construction fails if any
/// of them is missing; the output directory is created when absent.
///
/// Example:
///     >>> q = CelloQuery(
///     ...     input_directory="/data/input",
///     ...     output_directory="/data/output",
///     ...     verilog_file="and.v",
///     ...     input_ucf="Eco1C1G1T1.UCF.json",
///     ...     input_sensors="Eco1C1G1T1.input.json",
///     ...     output_device="Eco1C1G1T1.output.json",
///     ...     compiler_options="options.csv",
///     ... )
///     >>> q.set_input_signals(["LacI", "TetR"])
///     'custom_input.input.json'
///     >>> q.get_results().circuit_score
#[pyclass(name = "CelloQuery")]
pub struct PyCelloQuery {
    inner: celloapi::CelloQuery,
    logging: bool,
}

#[pymethods]
impl PyCelloQuery {
    /// Create a query.
    ///
    /// Args:
    ///     input_directory: Directory holding every input file.
    ///     output_directory: Directory Cello writes its results into.
    ///     verilog_file: The Verilog circuit description.
    ///     input_ucf: The User Constraint File of the target chassis.
    ///     input_sensors: The input sensor file.
    ///     output_device: The output device file.
    ///     compiler_options: Optional compiler options file.
    ///     logging: Echo the container output while Cello runs (default: False).
    ///     runtime: Container runtime executable (default: 'docker').
    ///     image: Cello container image.
    ///     timeout_secs: Kill runs that take longer than this many seconds.
    ///     archive_prior_results: Move earlier results aside before a run
    ///         (default: True).
    ///
    /// Raises:
    ///     ConfigurationError: A required file is missing.
    #[new]
    #[pyo3(signature = (
        input_directory,
        output_directory,
        verilog_file,
        input_ucf,
        input_sensors,
        output_device,
        compiler_options=None,
        logging=false,
        *,
        runtime=None,
        image=None,
        timeout_secs=None,
        archive_prior_results=true,
    ))]
    #[allow(clippy::too_many_arguments)]
    fn new(
        input_directory: PathBuf,
        output_directory: PathBuf,
        verilog_file: String,
        input_ucf: String,
        input_sensors: String,
        output_device: String,
        compiler_options: Option<String>,
        logging: bool,
        runtime: Option<String>,
        image: Option<String>,
        timeout_secs: Option<u64>,
        archive_prior_results: bool,
    ) -> PyResult<Self> {
        let mut builder = QueryConfigBuilder::new()
            .input_dir(input_directory)
            .output_dir(output_directory)
            .verilog_file(verilog_file)
            .options_file(compiler_options)
            .ucf_file(input_ucf)
            .input_sensor_file(input_sensors)
            .output_device_file(output_device)
            .timeout(timeout_secs.map(Duration::from_secs))
            .archive_prior_results(archive_prior_results);
        if let Some(runtime) = runtime {
            builder = builder.runtime(runtime);
        }
        if let Some(image) = image {
            builder = builder.image(image);
        }

        let config = builder
            .build()
            .map_err(|e| ConfigurationError::new_err(e.to_string()))?;
        let inner = celloapi::CelloQuery::new(config).map_err(cello_to_py_err)?;
        Ok(Self { inner, logging })
    }

    #[getter]
    fn input_directory(&self) -> PathBuf {
        self.inner.input_dir().to_path_buf()
    }

    #[getter]
    fn output_directory(&self) -> PathBuf {
        self.inner.output_dir().to_path_buf()
    }

    /// Name of the input sensor file the next run will use.
    #[getter]
    fn input_sensors(&self) -> String {
        self.inner.active_input_sensors().to_string()
    }

    /// List the signal names offered by the active input sensor file.
    fn get_input_signals(&self) -> PyResult<Vec<String>> {
        self.inner.input_signals().map_err(cello_to_py_err)
    }

    /// Restrict the run to a subset of the input signals.
    ///
    /// Writes a pruned copy of the default input sensor file into the input
    /// directory.
    ///
    /// Args:
    ///     input_signals: Signal names to keep.
    ///     output_filename: Name of the pruned file
    ///         (default: 'custom_input.input.json').
    ///     mutate: Make the pruned file active for the next run (default: True).
    ///
    /// Returns:
    ///     The name of the written file.
    ///
    /// Raises:
    ///     ConfigurationError: A signal is not offered by the default file.
    #[pyo3(signature = (input_signals, output_filename=None, mutate=true))]
    fn set_input_signals(
        &mut self,
        input_signals: Vec<String>,
        output_filename: Option<&str>,
        mutate: bool,
    ) -> PyResult<String> {
        let file_name = output_filename.unwrap_or(CUSTOM_INPUT_FILE);
        let written = if mutate {
            self.inner.set_input_signals_as(&input_signals, file_name)
        } else {
            self.inner.write_input_signals_as(&input_signals, file_name)
        };
        written.map_err(cello_to_py_err)
    }

    /// Make the default input sensor file active again.
    fn reset_input_signals(&mut self) {
        self.inner.reset_input_signals();
    }

    /// Run Cello and read its result.
    ///
    /// Blocks until the container exits. The GIL is released meanwhile.
    ///
    /// Raises:
    ///     ContainerEnvironmentError: The runtime or image is unavailable.
    ///     ExecutionError: Cello failed or timed out.
    ///     OutputBusyError: Another run holds the output directory.
    ///     ResultNotFoundError: Cello produced no circuit.
    fn get_results(&self, py: Python<'_>) -> PyResult<PyCelloResult> {
        let reporter = if self.logging {
            ProgressReporter::with_callback(Box::new(|event| {
                if let Progress::Message(line) = event {
                    println!("{line}");
                }
            }))
        } else {
            ProgressReporter::new()
        };
        let inner = &self.inner;
        py.allow_threads(|| inner.get_results(&reporter))
            .map(PyCelloResult::from)
            .map_err(cello_to_py_err)
    }

    fn __repr__(&self) -> String {
        let files = &self.inner.config().files;
        format!(
            "CelloQuery(verilog_file='{}', input_ucf='{}', input_sensors='{}', output_device='{}')",
            files.verilog, files.ucf, files.input_sensors, files.output_device
        )
    }
}
