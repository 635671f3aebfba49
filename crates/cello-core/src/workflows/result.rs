use crate::core::io::artifacts::{Artifact, locate};
use crate::core::io::node_table::{
    NodeTable, parse_activity_cell, parse_logic_cell, read_node_table,
};
use crate::core::models::netlist::OutputNetlist;
use crate::engine::error::CelloError;
use std::collections::BTreeMap;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, warn};

const SCORE_MARKER: &str = "SimulatedAnnealing - Score:";

/// Gates produced by technology mapping carry Verilog's `$<n>` wire labels;
/// inputs and the output are named after the design's ports.
const GATE_PREFIX: char = '$';

/// The parsed outcome of one Cello run.
///
/// A `CelloResult` is a snapshot: it is read once from an output directory and
/// owns all of its data, so it stays valid after the directory is reused.
#[derive(Debug, Clone, PartialEq)]
pub struct CelloResult {
    output_dir: PathBuf,
    logic: NodeTable<bool>,
    activity: NodeTable<f64>,
    part_names: BTreeMap<String, String>,
    repressor_scores: BTreeMap<String, f64>,
    circuit_score: f64,
}

impl CelloResult {
    /// Reads the artifacts of a finished run.
    ///
    /// # Arguments
    ///
    /// * `output_dir` - The directory Cello wrote into. Archived results in
    ///   subdirectories are ignored.
    ///
    /// # Errors
    ///
    /// * [`CelloError::ResultNotFound`] if one of the four artifacts is missing.
    /// * [`CelloError::AmbiguousResult`] if an artifact pattern matches more than one file.
    /// * [`CelloError::Parse`] if an artifact is malformed, the logic and activity
    ///   tables disagree, or the log carries no circuit score.
    #[instrument(skip_all, name = "read_result", fields(dir = %output_dir.display()))]
    pub fn read(output_dir: &Path) -> Result<Self, CelloError> {
        let logic_path = locate(output_dir, Artifact::Logic)?;
        let activity_path = locate(output_dir, Artifact::Activity)?;
        let netlist_path = locate(output_dir, Artifact::Netlist)?;
        let log_path = locate(output_dir, Artifact::Log)?;
        debug!(
            logic = %logic_path.display(),
            activity = %activity_path.display(),
            netlist = %netlist_path.display(),
            log = %log_path.display(),
            "Located result artifacts."
        );

        let logic = read_node_table(&logic_path, parse_logic_cell)?;
        let activity = read_node_table(&activity_path, parse_activity_cell)?;
        check_tables_agree(&logic, &activity, &activity_path)?;

        let netlist = OutputNetlist::load(&netlist_path)?;
        let part_names = logic
            .keys()
            .filter_map(|label| {
                netlist
                    .device_name(label)
                    .map(|device| (label.clone(), device.to_string()))
            })
            .collect();

        let repressor_scores = logic
            .iter()
            .filter(|(label, _)| label.starts_with(GATE_PREFIX))
            .filter_map(|(label, states)| {
                let score = score_gate(states, &activity[label]);
                if score.is_none() {
                    warn!(gate = %label, "Gate has no scorable ON/OFF states; skipping.");
                }
                score.map(|s| (label.clone(), s))
            })
            .collect::<BTreeMap<_, _>>();

        let circuit_score = read_circuit_score(&log_path)?;

        info!(
            circuit_score,
            gates = repressor_scores.len(),
            "Read Cello result."
        );
        Ok(Self {
            output_dir: output_dir.to_path_buf(),
            logic,
            activity,
            part_names,
            repressor_scores,
            circuit_score,
        })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Boolean state of every node, one entry per truth-table row.
    pub fn logic(&self) -> &NodeTable<bool> {
        &self.logic
    }

    /// Predicted activity of every node, one entry per truth-table row.
    pub fn activity(&self) -> &NodeTable<f64> {
        &self.activity
    }

    /// Node label to assigned device name, e.g. `$48` to `PhlF`.
    pub fn part_names(&self) -> &BTreeMap<String, String> {
        &self.part_names
    }

    /// Device name to node label; the inverse of [`CelloResult::part_names`].
    pub fn part_map(&self) -> BTreeMap<String, String> {
        self.part_names
            .iter()
            .map(|(label, device)| (device.clone(), label.clone()))
            .collect()
    }

    pub fn repressor_scores(&self) -> &BTreeMap<String, f64> {
        &self.repressor_scores
    }

    pub fn gate_score(&self, label: &str) -> Option<f64> {
        self.repressor_scores.get(label).copied()
    }

    pub fn circuit_score(&self) -> f64 {
        self.circuit_score
    }
}

/// Scores one gate as `ln(min ON activity / max OFF activity)`.
///
/// Returns `None` when the gate is never ON, never OFF, or the ratio is not
/// defined for the observed activities.
pub fn score_gate(logic: &[bool], activity: &[f64]) -> Option<f64> {
    let mut low_on: Option<f64> = None;
    let mut high_off: Option<f64> = None;
    for (&on, &value) in logic.iter().zip(activity) {
        if on {
            low_on = Some(low_on.map_or(value, |v| v.min(value)));
        } else {
            high_off = Some(high_off.map_or(value, |v| v.max(value)));
        }
    }
    let (low_on, high_off) = (low_on?, high_off?);
    if low_on <= 0.0 || high_off <= 0.0 {
        return None;
    }
    Some((low_on / high_off).ln())
}

fn check_tables_agree(
    logic: &NodeTable<bool>,
    activity: &NodeTable<f64>,
    activity_path: &Path,
) -> Result<(), CelloError> {
    if !logic.keys().eq(activity.keys()) {
        let only_logic: Vec<_> = logic.keys().filter(|k| !activity.contains_key(*k)).collect();
        let only_activity: Vec<_> = activity.keys().filter(|k| !logic.contains_key(*k)).collect();
        return Err(CelloError::parse(
            activity_path,
            format!(
                "logic and activity tables list different nodes (only in logic: {only_logic:?}, only in activity: {only_activity:?})"
            ),
        ));
    }
    for (label, states) in logic {
        let values = &activity[label];
        if states.len() != values.len() {
            return Err(CelloError::parse(
                activity_path,
                format!(
                    "node '{label}' has {} logic states but {} activity values",
                    states.len(),
                    values.len()
                ),
            ));
        }
    }
    Ok(())
}

fn read_circuit_score(path: &Path) -> Result<f64, CelloError> {
    let file = std::fs::File::open(path).map_err(|e| CelloError::io(path, e))?;
    for line in BufReader::new(file).lines() {
        let line = line.map_err(|e| CelloError::io(path, e))?;
        if !line.contains(SCORE_MARKER) {
            continue;
        }
        let token = line.split_whitespace().last().unwrap_or_default();
        return token.parse::<f64>().map_err(|_| {
            CelloError::parse(path, format!("circuit score '{token}' is not a number"))
        });
    }
    Err(CelloError::parse(
        path,
        format!("no '{SCORE_MARKER}' line in log"),
    ))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    pub(crate) const LOGIC: &str = "a,0,1,0,1\nb,0,0,1,1\n$48,1,1,1,0\n$49,1,0,1,0\nYFP,0,0,0,1\n";
    pub(crate) const ACTIVITY: &str =
        "a,0.01,2.5,0.01,2.5\nb,0.02,0.02,3.0,3.0\n$48,4.0,2.0,5.0,0.1\n$49,8.0,0.2,6.0,0.4\nYFP,0.05,0.1,0.2,20.0\n";
    pub(crate) const NETLIST: &str = "{\n\t\"name\": \"and\",\n\t\"nodes\": [\n\t\t{\"name\": \"a\", \"deviceName\": \"LacI_sensor\"},\n\t\t{\"name\": \"b\", \"deviceName\": \"TetR_sensor\"},\n\t\t{\"name\": \"$48\", \"deviceName\": \"PhlF\"},\n\t\t{\"name\": \"$49\", \"deviceName\": \"SrpR\"},\n\t\t{\"name\": \"YFP\", \"deviceName\": \"YFP_reporter\"},\n\t],\n\t\"edges\": [],\n},\n";
    pub(crate) const LOG: &str = "INFO Starting\nINFO SimulatedAnnealing - Score: 112.5\nINFO Done\n";

    pub(crate) fn write_fixture(dir: &Path) {
        fs::write(dir.join("and_logic.csv"), LOGIC).unwrap();
        fs::write(dir.join("and_activity.csv"), ACTIVITY).unwrap();
        fs::write(dir.join("and_outputNetlist.json"), NETLIST).unwrap();
        fs::write(dir.join("log.log"), LOG).unwrap();
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-12,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn reads_scores_and_part_names_from_complete_output() {
        let dir = tempdir().unwrap();
        write_fixture(dir.path());

        let result = CelloResult::read(dir.path()).unwrap();

        assert_close(result.circuit_score(), 112.5);
        assert_eq!(result.repressor_scores().len(), 2);
        assert_close(result.gate_score("$48").unwrap(), (2.0f64 / 0.1).ln());
        assert_close(result.gate_score("$49").unwrap(), (6.0f64 / 0.4).ln());
        assert_eq!(result.gate_score("YFP"), None);

        assert_eq!(result.part_names()["$48"], "PhlF");
        assert_eq!(result.part_names()["YFP"], "YFP_reporter");
        assert_eq!(result.part_map()["SrpR"], "$49");
        assert_eq!(result.logic()["a"], vec![false, true, false, true]);
        assert_eq!(result.activity()["YFP"][3], 20.0);
        assert_eq!(result.output_dir(), dir.path());
    }

    #[test]
    fn each_missing_artifact_is_reported_as_result_not_found() {
        for missing in [
            "and_logic.csv",
            "and_activity.csv",
            "and_outputNetlist.json",
            "log.log",
        ] {
            let dir = tempdir().unwrap();
            write_fixture(dir.path());
            fs::remove_file(dir.path().join(missing)).unwrap();

            let err = CelloResult::read(dir.path()).unwrap_err();
            assert!(
                matches!(err, CelloError::ResultNotFound { .. }),
                "removing {missing} gave {err:?}"
            );
        }
    }

    #[test]
    fn log_without_score_line_is_a_parse_error() {
        let dir = tempdir().unwrap();
        write_fixture(dir.path());
        fs::write(dir.path().join("log.log"), "INFO nothing to see\n").unwrap();

        let err = CelloResult::read(dir.path()).unwrap_err();
        match err {
            CelloError::Parse { path, .. } => assert!(path.ends_with("log.log")),
            other => panic!("expected Parse, got {other:?}"),
        }
    }

    #[test]
    fn non_numeric_score_is_a_parse_error() {
        let dir = tempdir().unwrap();
        write_fixture(dir.path());
        fs::write(dir.path().join("log.log"), "SimulatedAnnealing - Score: high\n").unwrap();
        assert!(matches!(
            CelloResult::read(dir.path()),
            Err(CelloError::Parse { .. })
        ));
    }

    #[test]
    fn mismatched_node_sets_are_a_parse_error() {
        let dir = tempdir().unwrap();
        write_fixture(dir.path());
        fs::write(dir.path().join("and_activity.csv"), "a,1,1,1,1\n$48,1,1,1,1\n").unwrap();

        let err = CelloResult::read(dir.path()).unwrap_err();
        assert!(matches!(err, CelloError::Parse { .. }));
        assert!(err.to_string().contains("different nodes"));
    }

    #[test]
    fn mismatched_row_lengths_are_a_parse_error() {
        let dir = tempdir().unwrap();
        write_fixture(dir.path());
        let short = ACTIVITY.replace("$48,4.0,2.0,5.0,0.1", "$48,4.0,2.0,5.0");
        fs::write(dir.path().join("and_activity.csv"), short).unwrap();
        assert!(matches!(
            CelloResult::read(dir.path()),
            Err(CelloError::Parse { .. })
        ));
    }

    #[test]
    fn score_gate_requires_both_on_and_off_states() {
        assert_close(
            score_gate(&[true, false, true], &[3.0, 1.5, 6.0]).unwrap(),
            2.0f64.ln(),
        );
        assert_eq!(score_gate(&[true, true], &[1.0, 2.0]), None);
        assert_eq!(score_gate(&[false, false], &[1.0, 2.0]), None);
        assert_eq!(score_gate(&[true, false], &[1.0, 0.0]), None);
    }

    #[test]
    fn gates_without_off_state_are_skipped() {
        let dir = tempdir().unwrap();
        write_fixture(dir.path());
        let logic = LOGIC.replace("$49,1,0,1,0", "$49,1,1,1,1");
        fs::write(dir.path().join("and_logic.csv"), logic).unwrap();

        let result = CelloResult::read(dir.path()).unwrap();
        assert!(result.gate_score("$48").is_some());
        assert_eq!(result.gate_score("$49"), None);
    }
}
