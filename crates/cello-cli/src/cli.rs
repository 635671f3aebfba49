use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Cello CLI - Run the Cello genetic circuit design tool in Docker, select input signals and read back circuit scores.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Path to a TOML configuration file.
    /// Defaults to `cello/config.toml` in the user's configuration directory, if present.
    #[arg(short, long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the input signals offered by a chassis' input sensor file.
    Signals(SignalsArgs),
    /// Run Cello once and print the resulting scores.
    Run(RunArgs),
    /// Read and print the scores of an existing output directory.
    Result(ResultArgs),
    /// Run every combination of chassis and input signals and report the best circuit.
    Scan(ScanArgs),
    /// List the chassis shipped with Cello v2.
    Chassis,
}

/// Query settings shared by every command that builds a Cello query.
#[derive(Args, Debug, Clone, Default)]
pub struct QueryArgs {
    /// Directory holding the Verilog, options, UCF, input and output files.
    #[arg(short, long, value_name = "DIR")]
    pub input_dir: Option<PathBuf>,

    /// Directory Cello writes its results into.
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Verilog circuit file name, relative to the input directory.
    #[arg(long, value_name = "FILE")]
    pub verilog: Option<String>,

    /// Compiler options file name, relative to the input directory.
    #[arg(long, value_name = "FILE")]
    pub options: Option<String>,

    /// Override the UCF file name derived from the chassis.
    #[arg(long, value_name = "FILE")]
    pub ucf: Option<String>,

    /// Override the input sensor file name derived from the chassis.
    #[arg(long, value_name = "FILE")]
    pub input_sensors: Option<String>,

    /// Override the output device file name derived from the chassis.
    #[arg(long, value_name = "FILE")]
    pub output_device: Option<String>,

    /// Container runtime executable (e.g., 'docker' or 'podman').
    #[arg(long, value_name = "PROGRAM")]
    pub runtime: Option<String>,

    /// Cello container image.
    #[arg(long, value_name = "IMAGE")]
    pub image: Option<String>,

    /// Kill a run that takes longer than this many seconds.
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Do not move earlier results into a `prior_cello_result_*` directory before running.
    #[arg(long)]
    pub no_archive: bool,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S container.image=cello:dev
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}

/// Arguments for the `signals` subcommand.
#[derive(Args, Debug)]
pub struct SignalsArgs {
    #[command(flatten)]
    pub query: QueryArgs,

    /// Chassis name (e.g., 'Eco1C1G1T1'), resolving the UCF, input and output file names.
    #[arg(long, value_name = "NAME")]
    pub chassis: Option<String>,
}

/// Arguments for the `run` subcommand.
#[derive(Args, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub query: QueryArgs,

    /// Chassis name (e.g., 'Eco1C1G1T1'), resolving the UCF, input and output file names.
    #[arg(long, value_name = "NAME")]
    pub chassis: Option<String>,

    /// Restrict the run to these input signals (comma separated).
    #[arg(long, value_name = "NAMES", value_delimiter = ',')]
    pub signals: Vec<String>,

    /// Print the result as JSON instead of a table.
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `result` subcommand.
#[derive(Args, Debug)]
pub struct ResultArgs {
    /// Output directory of a finished Cello run.
    #[arg(required = true, value_name = "DIR")]
    pub dir: PathBuf,

    /// Print the result as JSON instead of a table.
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `scan` subcommand.
#[derive(Args, Debug)]
pub struct ScanArgs {
    #[command(flatten)]
    pub query: QueryArgs,

    /// Chassis to scan (comma separated). Defaults to every E. coli chassis.
    #[arg(long, value_name = "NAMES", value_delimiter = ',')]
    pub chassis: Vec<String>,

    /// Number of input signals the circuit takes.
    #[arg(short = 'n', long, value_name = "INT")]
    pub inputs: usize,
}
