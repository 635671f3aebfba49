use crate::cli::ResultArgs;
use crate::error::{CliError, Result};
use celloapi::CelloResult;
use serde_json::json;
use tracing::info;

pub fn run(args: ResultArgs) -> Result<()> {
    info!("Reading Cello result from {:?}", &args.dir);
    let result = CelloResult::read(&args.dir)?;
    println!("{}", render(&result, args.json)?);
    Ok(())
}

pub fn render(result: &CelloResult, as_json: bool) -> Result<String> {
    if as_json {
        render_json(result)
    } else {
        Ok(render_table(result))
    }
}

fn render_table(result: &CelloResult) -> String {
    let mut out = format!("Circuit score: {}\n", result.circuit_score());
    if result.repressor_scores().is_empty() {
        out.push_str("No scorable gates.\n");
        return out;
    }
    out.push_str(&format!("{:<8} {:<16} {:>10}\n", "Gate", "Part", "Score"));
    for (gate, score) in result.repressor_scores() {
        let part = result.part_names().get(gate).map_or("-", String::as_str);
        out.push_str(&format!("{:<8} {:<16} {:>10.4}\n", gate, part, score));
    }
    out
}

fn render_json(result: &CelloResult) -> Result<String> {
    let gates: Vec<_> = result
        .repressor_scores()
        .iter()
        .map(|(gate, score)| {
            json!({
                "gate": gate,
                "part": result.part_names().get(gate),
                "score": score,
            })
        })
        .collect();
    let document = json!({
        "output_dir": result.output_dir().display().to_string(),
        "circuit_score": result.circuit_score(),
        "gates": gates,
        "part_names": result.part_names(),
    });
    serde_json::to_string_pretty(&document).map_err(|e| CliError::Other(e.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn sample_result() -> CelloResult {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("and_logic.csv"), "a,0,1\n$48,1,0\nYFP,0,1\n").unwrap();
        fs::write(dir.path().join("and_activity.csv"), "a,0.1,2.0\n$48,4.0,0.5\nYFP,0.2,8.0\n").unwrap();
        fs::write(
            dir.path().join("and_outputNetlist.json"),
            "{\"nodes\": [{\"name\": \"$48\", \"deviceName\": \"PhlF\"}, {\"name\": \"YFP\", \"deviceName\": \"YFP_reporter\"},]}",
        )
        .unwrap();
        fs::write(dir.path().join("log.log"), "SimulatedAnnealing - Score: 16.0\n").unwrap();
        CelloResult::read(dir.path()).unwrap()
    }

    #[test]
    fn table_lists_gates_with_parts() {
        let table = render(&sample_result(), false).unwrap();
        assert!(table.starts_with("Circuit score: 16\n"));
        assert!(table.contains("$48"));
        assert!(table.contains("PhlF"));
        assert!(table.contains(&format!("{:.4}", (4.0f64 / 0.5).ln())));
    }

    #[test]
    fn json_carries_scores_and_part_names() {
        let rendered = render(&sample_result(), true).unwrap();
        let value: serde_json::Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(value["circuit_score"], 16.0);
        assert_eq!(value["gates"][0]["gate"], "$48");
        assert_eq!(value["gates"][0]["part"], "PhlF");
        assert_eq!(value["part_names"]["YFP"], "YFP_reporter");
    }
}
