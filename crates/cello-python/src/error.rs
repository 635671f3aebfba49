//! Python exception classes for library errors.

use celloapi::{CelloError as CoreError, ErrorCategory};
use pyo3::create_exception;
use pyo3::exceptions::PyException;
use pyo3::prelude::*;

create_exception!(
    celloapi2,
    CelloError,
    PyException,
    "Base class of every error raised by celloapi2."
);
create_exception!(
    celloapi2,
    ConfigurationError,
    CelloError,
    "A required input file is missing, or a signal selection is invalid."
);
create_exception!(
    celloapi2,
    ContainerEnvironmentError,
    CelloError,
    "The container runtime or the Cello image is not usable."
);
create_exception!(
    celloapi2,
    ExecutionError,
    CelloError,
    "Cello exited unsuccessfully or was killed after its timeout."
);
create_exception!(
    celloapi2,
    ResultNotFoundError,
    CelloError,
    "An expected Cello output artifact is missing."
);
create_exception!(
    celloapi2,
    ResultParseError,
    CelloError,
    "A Cello output artifact exists but cannot be read."
);
create_exception!(
    celloapi2,
    OutputBusyError,
    CelloError,
    "Another run holds the output directory."
);
create_exception!(
    celloapi2,
    CelloIoError,
    CelloError,
    "Reading or writing a file failed."
);

pub fn cello_to_py_err(err: CoreError) -> PyErr {
    let message = err.to_string();
    match err.category() {
        ErrorCategory::Configuration => ConfigurationError::new_err(message),
        ErrorCategory::Environment => ContainerEnvironmentError::new_err(message),
        ErrorCategory::Execution => ExecutionError::new_err(message),
        ErrorCategory::ResultNotFound => ResultNotFoundError::new_err(message),
        ErrorCategory::Parse => ResultParseError::new_err(message),
        ErrorCategory::Busy => OutputBusyError::new_err(message),
        ErrorCategory::Io => CelloIoError::new_err(message),
    }
}

pub fn register(m: &Bound<'_, PyModule>) -> PyResult<()> {
    let py = m.py();
    m.add("CelloError", py.get_type::<CelloError>())?;
    m.add("ConfigurationError", py.get_type::<ConfigurationError>())?;
    m.add(
        "ContainerEnvironmentError",
        py.get_type::<ContainerEnvironmentError>(),
    )?;
    m.add("ExecutionError", py.get_type::<ExecutionError>())?;
    m.add("ResultNotFoundError", py.get_type::<ResultNotFoundError>())?;
    m.add("ResultParseError", py.get_type::<ResultParseError>())?;
    m.add("OutputBusyError", py.get_type::<OutputBusyError>())?;
    m.add("CelloIoError", py.get_type::<CelloIoError>())?;
    Ok(())
}
