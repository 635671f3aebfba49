use crate::cli::ScanArgs;
use crate::config::PartialQueryConfig;
use crate::error::{CliError, Result};
use crate::utils::progress::CliProgressHandler;
use celloapi::{CelloQuery, ChassisFiles, Progress, ProgressReporter, known_chassis_names};
use std::path::Path;
use tracing::{info, instrument, warn};

const DEFAULT_SCAN_ORGANISM: &str = "Escherichia coli";

/// One chassis to scan, with the query built for it.
pub struct ScanPlan {
    pub chassis: String,
    pub query: CelloQuery,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScanEntry {
    pub chassis: String,
    pub signals: Vec<String>,
    /// `None` when the combination did not yield a viable circuit.
    pub score: Option<f64>,
}

pub fn run(args: ScanArgs, config_path: Option<&Path>) -> Result<()> {
    if args.inputs == 0 {
        return Err(CliError::Argument(
            "--inputs must be at least 1".to_string(),
        ));
    }
    let chassis = if args.chassis.is_empty() {
        default_chassis()
    } else {
        args.chassis.clone()
    };

    let partial = PartialQueryConfig::load(config_path)?;
    let mut plans = Vec::with_capacity(chassis.len());
    for name in chassis {
        let config = partial.clone().merge_with_cli(&args.query, Some(&name))?;
        plans.push(ScanPlan {
            chassis: name,
            query: CelloQuery::new(config)?,
        });
    }

    let progress_handler = CliProgressHandler::new(false);
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());
    let entries = scan(plans, args.inputs, &reporter)?;

    print_summary(&entries);
    Ok(())
}

fn default_chassis() -> Vec<String> {
    known_chassis_names()
        .into_iter()
        .filter(|name| ChassisFiles::new(*name).organism() == Some(DEFAULT_SCAN_ORGANISM))
        .map(String::from)
        .collect()
}

/// Runs every `inputs`-sized signal combination of every plan, in order.
///
/// Combinations that fail without a viable circuit are recorded with no
/// score; any other failure aborts the scan.
#[instrument(skip_all, name = "scan")]
pub fn scan(
    mut plans: Vec<ScanPlan>,
    inputs: usize,
    reporter: &ProgressReporter,
) -> Result<Vec<ScanEntry>> {
    let mut work = Vec::with_capacity(plans.len());
    for plan in &plans {
        let signals = plan.query.available_signals()?;
        let combos = combinations(&signals, inputs);
        if combos.is_empty() {
            warn!(
                "Chassis '{}' offers {} signal(s), fewer than the {} requested.",
                plan.chassis,
                signals.len(),
                inputs
            );
        }
        work.push(combos);
    }

    let total: usize = work.iter().map(Vec::len).sum();
    info!("Scanning {} combination(s) across {} chassis.", total, plans.len());
    reporter.report(Progress::TaskStart {
        total_steps: total as u64,
    });

    let mut entries = Vec::with_capacity(total);
    for (plan, combos) in plans.iter_mut().zip(work) {
        for signals in combos {
            plan.query.set_input_signals(&signals)?;
            let outcome = plan.query.get_results(&ProgressReporter::new());
            plan.query.reset_input_signals();

            let score = match outcome {
                Ok(result) => Some(result.circuit_score()),
                Err(e) if e.is_no_viable_circuit() => {
                    warn!(
                        "No viable circuit for {} with {:?}: {}",
                        plan.chassis, signals, e
                    );
                    None
                }
                Err(e) => return Err(e.into()),
            };
            info!(chassis = %plan.chassis, ?signals, ?score, "Combination finished.");
            entries.push(ScanEntry {
                chassis: plan.chassis.clone(),
                signals,
                score,
            });
            reporter.report(Progress::TaskIncrement);
        }
    }
    reporter.report(Progress::TaskFinish);
    Ok(entries)
}

pub fn best(entries: &[ScanEntry]) -> Option<&ScanEntry> {
    entries
        .iter()
        .filter(|e| e.score.is_some())
        .max_by(|a, b| a.score.unwrap_or_default().total_cmp(&b.score.unwrap_or_default()))
}

fn print_summary(entries: &[ScanEntry]) {
    println!("{:<12} {:<30} {:>10}", "Chassis", "Input signals", "Score");
    for entry in entries {
        let score = entry
            .score
            .map_or_else(|| "-".to_string(), |s| format!("{:.4}", s));
        println!(
            "{:<12} {:<30} {:>10}",
            entry.chassis,
            entry.signals.join(","),
            score
        );
    }
    println!("-----");
    match best(entries) {
        Some(best) => {
            println!("Best Score: {}", best.score.unwrap_or_default());
            println!("Best Chassis: {}", best.chassis);
            println!("Best Input Signals: {:?}", best.signals);
        }
        None => println!("No combination produced a viable circuit."),
    }
}

/// All `k`-element combinations of `items`, in lexicographic index order.
pub fn combinations<T: Clone>(items: &[T], k: usize) -> Vec<Vec<T>> {
    let n = items.len();
    let mut out = Vec::new();
    if k == 0 || k > n {
        return out;
    }

    let mut idx: Vec<usize> = (0..k).collect();
    loop {
        out.push(idx.iter().map(|&i| items[i].clone()).collect());

        let Some(i) = (0..k).rev().find(|&i| idx[i] != i + n - k) else {
            return out;
        };
        idx[i] += 1;
        for j in i + 1..k {
            idx[j] = idx[j - 1] + 1;
        }
    }
}
