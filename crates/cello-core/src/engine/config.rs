use crate::core::chassis::ChassisFiles;
use crate::engine::error::CelloError;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_IMAGE: &str = "cidarlab/cello-dnacompiler:latest";
pub const DEFAULT_RUNTIME: &str = "docker";

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
    #[error("Invalid value for {parameter}: {reason}")]
    InvalidValue {
        parameter: &'static str,
        reason: String,
    },
}

impl From<ConfigError> for CelloError {
    fn from(err: ConfigError) -> Self {
        CelloError::Configuration(err.to_string())
    }
}

/// File names of the Cello inputs, relative to the input directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CircuitFiles {
    pub verilog: String,
    pub options: Option<String>,
    pub ucf: String,
    pub input_sensors: String,
    pub output_device: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerConfig {
    pub runtime: String,
    pub image: String,
    pub pull_missing_image: bool,
    pub timeout: Option<Duration>,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            runtime: DEFAULT_RUNTIME.to_string(),
            image: DEFAULT_IMAGE.to_string(),
            pull_missing_image: true,
            timeout: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryConfig {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub files: CircuitFiles,
    pub container: ContainerConfig,
    pub archive_prior_results: bool,
}

#[derive(Default)]
pub struct QueryConfigBuilder {
    input_dir: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    verilog: Option<String>,
    options: Option<String>,
    ucf: Option<String>,
    input_sensors: Option<String>,
    output_device: Option<String>,
    runtime: Option<String>,
    image: Option<String>,
    pull_missing_image: Option<bool>,
    timeout: Option<Duration>,
    archive_prior_results: Option<bool>,
}

impl QueryConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn input_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.input_dir = Some(path.into());
        self
    }
    pub fn output_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(path.into());
        self
    }
    pub fn verilog_file(mut self, name: impl Into<String>) -> Self {
        self.verilog = Some(name.into());
        self
    }
    pub fn options_file(mut self, name: Option<String>) -> Self {
        self.options = name;
        self
    }
    pub fn ucf_file(mut self, name: impl Into<String>) -> Self {
        self.ucf = Some(name.into());
        self
    }
    pub fn input_sensor_file(mut self, name: impl Into<String>) -> Self {
        self.input_sensors = Some(name.into());
        self
    }
    pub fn output_device_file(mut self, name: impl Into<String>) -> Self {
        self.output_device = Some(name.into());
        self
    }
    /// Sets the UCF, input-sensor and output-device files from a chassis name.
    pub fn chassis(self, chassis: &ChassisFiles) -> Self {
        self.ucf_file(chassis.ucf.clone())
            .input_sensor_file(chassis.input_sensors.clone())
            .output_device_file(chassis.output_device.clone())
    }
    pub fn runtime(mut self, program: impl Into<String>) -> Self {
        self.runtime = Some(program.into());
        self
    }
    pub fn image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }
    pub fn pull_missing_image(mut self, pull: bool) -> Self {
        self.pull_missing_image = Some(pull);
        self
    }
    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
    pub fn archive_prior_results(mut self, archive: bool) -> Self {
        self.archive_prior_results = Some(archive);
        self
    }

    pub fn build(self) -> Result<QueryConfig, ConfigError> {
        let files = CircuitFiles {
            verilog: required_name(self.verilog, "verilog_file")?,
            options: match self.options {
                Some(name) => Some(checked_name(name, "options_file")?),
                None => None,
            },
            ucf: required_name(self.ucf, "ucf_file")?,
            input_sensors: required_name(self.input_sensors, "input_sensor_file")?,
            output_device: required_name(self.output_device, "output_device_file")?,
        };

        let defaults = ContainerConfig::default();
        let container = ContainerConfig {
            runtime: self.runtime.unwrap_or(defaults.runtime),
            image: self.image.unwrap_or(defaults.image),
            pull_missing_image: self.pull_missing_image.unwrap_or(defaults.pull_missing_image),
            timeout: self.timeout,
        };
        if container.timeout.is_some_and(|t| t.is_zero()) {
            return Err(ConfigError::InvalidValue {
                parameter: "timeout",
                reason: "must be greater than zero".to_string(),
            });
        }

        Ok(QueryConfig {
            input_dir: self
                .input_dir
                .ok_or(ConfigError::MissingParameter("input_dir"))?,
            output_dir: self
                .output_dir
                .ok_or(ConfigError::MissingParameter("output_dir"))?,
            files,
            container,
            archive_prior_results: self.archive_prior_results.unwrap_or(true),
        })
    }
}

fn required_name(value: Option<String>, parameter: &'static str) -> Result<String, ConfigError> {
    checked_name(value.ok_or(ConfigError::MissingParameter(parameter))?, parameter)
}

// Inputs are bind-mounted, so names must stay inside the input directory.
fn checked_name(name: String, parameter: &'static str) -> Result<String, ConfigError> {
    let path = std::path::Path::new(&name);
    if name.trim().is_empty() {
        return Err(ConfigError::InvalidValue {
            parameter,
            reason: "file name is empty".to_string(),
        });
    }
    if path.is_absolute()
        || path
            .components()
            .any(|c| matches!(c, std::path::Component::ParentDir))
    {
        return Err(ConfigError::InvalidValue {
            parameter,
            reason: format!("'{name}' must be a path relative to the input directory"),
        });
    }
    Ok(name)
}
