use crate::cli::QueryArgs;
use crate::error::{CliError, Result};
use crate::utils::parser;
use celloapi::{ChassisFiles, QueryConfig, QueryConfigBuilder};
use directories::ProjectDirs;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

const CONFIG_FILE_NAME: &str = "config.toml";

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialContainerConfig {
    runtime: Option<String>,
    image: Option<String>,
    pull_missing_image: Option<bool>,
    timeout_secs: Option<u64>,
}

/// Query settings read from a TOML file, before CLI arguments are applied.
#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct PartialQueryConfig {
    input_dir: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    verilog: Option<String>,
    options: Option<String>,
    chassis: Option<String>,
    ucf: Option<String>,
    input_sensors: Option<String>,
    output_device: Option<String>,
    archive_prior_results: Option<bool>,
    signals: Option<Vec<String>>,
    container: Option<PartialContainerConfig>,
}

impl PartialQueryConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }

    /// Loads `explicit` if given, else the per-user default file if it exists.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        match default_config_path() {
            Some(path) if path.is_file() => Self::from_file(&path),
            _ => {
                debug!("No configuration file found; using CLI arguments only.");
                Ok(Self::default())
            }
        }
    }

    pub fn chassis(&self) -> Option<&str> {
        self.chassis.as_deref()
    }

    /// Signals selected in the configuration file, if any.
    pub fn signals(&self) -> &[String] {
        self.signals.as_deref().unwrap_or_default()
    }

    /// Merges file values, CLI arguments and `--set` overrides into a query
    /// configuration. CLI arguments win over `--set`, which wins over the file.
    ///
    /// The chassis files resolve in this order: file flags on the command
    /// line, then `chassis`, then names from `--set` or the file, then the
    /// file's chassis. A chassis named by the caller always replaces file
    /// names a config file spells out, so each chassis of a scan really runs
    /// its own files.
    ///
    /// # Arguments
    ///
    /// * `args` - The query arguments of the invoked command.
    /// * `chassis` - A chassis from the command line or a scan; falls back to
    ///   the file's.
    pub fn merge_with_cli(mut self, args: &QueryArgs, chassis: Option<&str>) -> Result<QueryConfig> {
        self.apply_set_values(&args.set_values)?;
        let container = self.container.take().unwrap_or_default();

        let parse = |name: &str| {
            parser::parse_chassis(name).map_err(|e| CliError::Argument(e.to_string()))
        };
        let cli_chassis = chassis.map(parse).transpose()?;
        let file_chassis = match (&cli_chassis, self.chassis.as_deref()) {
            (None, Some(name)) => Some(parse(name)?),
            _ => None,
        };

        let pick = |cli: &Option<String>,
                    file: &Option<String>,
                    field: fn(&ChassisFiles) -> &String,
                    what: &str| {
            cli.clone()
                .or_else(|| cli_chassis.as_ref().map(field).cloned())
                .or_else(|| file.clone())
                .or_else(|| file_chassis.as_ref().map(field).cloned())
                .ok_or_else(|| {
                    CliError::Config(format!(
                        "A value for '{}' is required: pass --chassis, set it in the config file or via CLI argument.",
                        what
                    ))
                })
        };
        let ucf = pick(&args.ucf, &self.ucf, |c| &c.ucf, "ucf")?;
        let input_sensors = pick(
            &args.input_sensors,
            &self.input_sensors,
            |c| &c.input_sensors,
            "input-sensors",
        )?;
        let output_device = pick(
            &args.output_device,
            &self.output_device,
            |c| &c.output_device,
            "output-device",
        )?;
        let verilog = args
            .verilog
            .clone()
            .or_else(|| self.verilog.clone())
            .ok_or_else(|| CliError::Config("A value for 'verilog' is required.".to_string()))?;

        let input_dir = args
            .input_dir
            .clone()
            .or(self.input_dir)
            .ok_or_else(|| CliError::Config("`input-dir` is required.".to_string()))?;
        let output_dir = args
            .output_dir
            .clone()
            .or(self.output_dir)
            .ok_or_else(|| CliError::Config("`output-dir` is required.".to_string()))?;

        let mut builder = QueryConfigBuilder::new()
            .input_dir(input_dir)
            .output_dir(output_dir)
            .verilog_file(verilog)
            .options_file(args.options.clone().or(self.options))
            .ucf_file(ucf)
            .input_sensor_file(input_sensors)
            .output_device_file(output_device)
            .timeout(args.timeout.or(container.timeout_secs).map(Duration::from_secs))
            .archive_prior_results(!args.no_archive && self.archive_prior_results.unwrap_or(true));
        if let Some(runtime) = args.runtime.clone().or(container.runtime) {
            builder = builder.runtime(runtime);
        }
        if let Some(image) = args.image.clone().or(container.image) {
            builder = builder.image(image);
        }
        if let Some(pull) = container.pull_missing_image {
            builder = builder.pull_missing_image(pull);
        }

        builder.build().map_err(|e| CliError::Config(e.to_string()))
    }

    fn apply_set_values(&mut self, set_values: &[String]) -> Result<()> {
        for kv_pair in set_values {
            let (key, value) =
                parser::parse_key_value(kv_pair).map_err(|e| CliError::Config(e.to_string()))?;

            match key {
                "input-dir" => self.input_dir = Some(PathBuf::from(value)),
                "output-dir" => self.output_dir = Some(PathBuf::from(value)),
                "verilog" => self.verilog = Some(value.to_string()),
                "options" => self.options = Some(value.to_string()),
                "chassis" => self.chassis = Some(value.to_string()),
                "ucf" => self.ucf = Some(value.to_string()),
                "input-sensors" => self.input_sensors = Some(value.to_string()),
                "output-device" => self.output_device = Some(value.to_string()),
                "signals" => {
                    self.signals = Some(
                        value
                            .split(',')
                            .map(str::trim)
                            .filter(|s| !s.is_empty())
                            .map(String::from)
                            .collect(),
                    );
                }
                "archive-prior-results" => {
                    self.archive_prior_results = Some(parse_value(key, value, "boolean")?);
                }
                "container.runtime" => {
                    self.container.get_or_insert_with(Default::default).runtime =
                        Some(value.to_string());
                }
                "container.image" => {
                    self.container.get_or_insert_with(Default::default).image =
                        Some(value.to_string());
                }
                "container.pull-missing-image" => {
                    self.container
                        .get_or_insert_with(Default::default)
                        .pull_missing_image = Some(parse_value(key, value, "boolean")?);
                }
                "container.timeout-secs" => {
                    self.container
                        .get_or_insert_with(Default::default)
                        .timeout_secs = Some(parse_value(key, value, "integer")?);
                }
                _ => {
                    return Err(CliError::Config(format!(
                        "Unsupported configuration key for --set: '{}'",
                        key
                    )));
                }
            }
        }
        Ok(())
    }
}

fn parse_value<T: std::str::FromStr>(key: &str, value: &str, kind: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| CliError::Config(format!("Invalid {} value for {}: {}", kind, key, value)))
}

/// `<config_dir>/cello/config.toml` for the current user.
pub fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("org", "cidarlab", "cello").map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
}
