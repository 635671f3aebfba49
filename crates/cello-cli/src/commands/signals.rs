use crate::cli::SignalsArgs;
use crate::config::PartialQueryConfig;
use crate::error::Result;
use celloapi::CelloQuery;
use std::path::Path;
use tracing::info;

pub fn run(args: SignalsArgs, config_path: Option<&Path>) -> Result<()> {
    let config = PartialQueryConfig::load(config_path)?
        .merge_with_cli(&args.query, args.chassis.as_deref())?;
    let query = CelloQuery::new(config)?;

    let signals = query.input_signals()?;
    info!(
        "Input sensor file '{}' offers {} signal(s).",
        query.active_input_sensors(),
        signals.len()
    );
    for signal in signals {
        println!("{}", signal);
    }
    Ok(())
}
