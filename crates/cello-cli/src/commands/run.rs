use crate::cli::RunArgs;
use crate::commands::result::render;
use crate::config::PartialQueryConfig;
use crate::error::Result;
use crate::utils::progress::CliProgressHandler;
use celloapi::{CelloQuery, ProgressReporter};
use std::path::Path;
use tracing::info;

pub fn run(args: RunArgs, config_path: Option<&Path>, echo_output: bool) -> Result<()> {
    let partial = PartialQueryConfig::load(config_path)?;
    let signals = if args.signals.is_empty() {
        partial.signals().to_vec()
    } else {
        args.signals.clone()
    };

    info!("Merging configuration from file and CLI arguments...");
    let config = partial.merge_with_cli(&args.query, args.chassis.as_deref())?;
    let mut query = CelloQuery::new(config)?;

    if !signals.is_empty() {
        let file = query.set_input_signals(&signals)?;
        info!("Selected input signals {:?} (written to '{}').", signals, file);
    }

    let progress_handler = CliProgressHandler::new(echo_output);
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    println!("Executing Cello query... (this may take a while)");
    let result = query.get_results(&reporter)?;

    println!("{}", render(&result, args.json)?);
    Ok(())
}
