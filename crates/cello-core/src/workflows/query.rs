use crate::core::models::sensors::SensorLibrary;
use crate::engine::archive::{archive_prior_results, has_prior_results};
use crate::engine::config::QueryConfig;
use crate::engine::error::CelloError;
use crate::engine::invocation::{ContainerRuntime, DockerRuntime, Invocation, ProcessOutput};
use crate::engine::lease::OutputLease;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::workflows::result::CelloResult;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, warn};

/// File written by [`CelloQuery::set_input_signals`] unless another name is given.
pub const CUSTOM_INPUT_FILE: &str = "custom_input.input.json";

/// A validated Cello job: input files, output directory and the runtime that
/// executes it.
///
/// The input sensor file can be swapped for a pruned copy with
/// [`CelloQuery::set_input_signals`]; everything else is fixed at
/// construction.
pub struct CelloQuery {
    config: QueryConfig,
    default_input_sensors: String,
    runtime: Box<dyn ContainerRuntime>,
}

impl std::fmt::Debug for CelloQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CelloQuery")
            .field("config", &self.config)
            .field("default_input_sensors", &self.default_input_sensors)
            .finish_non_exhaustive()
    }
}

impl CelloQuery {
    /// Creates a query that runs through the configured container runtime.
    ///
    /// # Errors
    ///
    /// Returns [`CelloError::MissingInputFile`] naming the first input that
    /// does not exist, or [`CelloError::Io`] if the output directory cannot be
    /// created.
    pub fn new(config: QueryConfig) -> Result<Self, CelloError> {
        let runtime = DockerRuntime::from_config(&config.container);
        Self::with_runtime(config, runtime)
    }

    pub fn with_runtime(
        mut config: QueryConfig,
        runtime: impl ContainerRuntime + 'static,
    ) -> Result<Self, CelloError> {
        if !config.input_dir.is_dir() {
            return Err(CelloError::MissingInputFile {
                role: "input directory",
                path: config.input_dir,
            });
        }
        config.input_dir = canonical(&config.input_dir)?;

        let files = &config.files;
        let inputs = [
            ("circuit", Some(&files.verilog)),
            ("options", files.options.as_ref()),
            ("constraint", Some(&files.ucf)),
            ("input sensor", Some(&files.input_sensors)),
            ("output device", Some(&files.output_device)),
        ];
        for (role, name) in inputs {
            let Some(name) = name else { continue };
            let path = config.input_dir.join(name);
            if !path.is_file() {
                return Err(CelloError::MissingInputFile { role, path });
            }
        }

        std::fs::create_dir_all(&config.output_dir)
            .map_err(|e| CelloError::io(&config.output_dir, e))?;
        config.output_dir = canonical(&config.output_dir)?;

        debug!(
            input_dir = %config.input_dir.display(),
            output_dir = %config.output_dir.display(),
            "Validated Cello query."
        );
        Ok(Self {
            default_input_sensors: config.files.input_sensors.clone(),
            config,
            runtime: Box::new(runtime),
        })
    }

    pub fn config(&self) -> &QueryConfig {
        &self.config
    }

    pub fn input_dir(&self) -> &Path {
        &self.config.input_dir
    }

    pub fn output_dir(&self) -> &Path {
        &self.config.output_dir
    }

    /// Name of the input sensor file the next run will use.
    pub fn active_input_sensors(&self) -> &str {
        &self.config.files.input_sensors
    }

    /// Signal names offered by the active input sensor file.
    pub fn input_signals(&self) -> Result<Vec<String>, CelloError> {
        Ok(self.load_sensors(&self.config.files.input_sensors)?.signal_names())
    }

    /// Signal names offered by the input sensor file the query was built with.
    pub fn available_signals(&self) -> Result<Vec<String>, CelloError> {
        Ok(self.load_sensors(&self.default_input_sensors)?.signal_names())
    }

    /// Restricts the next runs to `signals`.
    ///
    /// Writes a pruned copy of the default sensor file to
    /// [`CUSTOM_INPUT_FILE`] in the input directory and makes it active.
    ///
    /// # Errors
    ///
    /// Returns [`CelloError::UnknownSignal`] if a name is not offered by the
    /// default sensor file; the active selection is then left unchanged.
    pub fn set_input_signals<S: AsRef<str>>(&mut self, signals: &[S]) -> Result<String, CelloError> {
        self.set_input_signals_as(signals, CUSTOM_INPUT_FILE)
    }

    pub fn set_input_signals_as<S: AsRef<str>>(
        &mut self,
        signals: &[S],
        file_name: &str,
    ) -> Result<String, CelloError> {
        let name = self.write_input_signals_as(signals, file_name)?;
        info!(file = %name, "Activated custom input signal selection.");
        self.config.files.input_sensors = name.clone();
        Ok(name)
    }

    /// Like [`CelloQuery::set_input_signals`], but leaves the active selection alone.
    pub fn write_input_signals<S: AsRef<str>>(&self, signals: &[S]) -> Result<String, CelloError> {
        self.write_input_signals_as(signals, CUSTOM_INPUT_FILE)
    }

    pub fn write_input_signals_as<S: AsRef<str>>(
        &self,
        signals: &[S],
        file_name: &str,
    ) -> Result<String, CelloError> {
        if Path::new(file_name).file_name().and_then(|n| n.to_str()) != Some(file_name) {
            return Err(CelloError::Configuration(format!(
                "signal selection file '{file_name}' must be a plain file name"
            )));
        }
        if file_name == self.default_input_sensors {
            return Err(CelloError::Configuration(format!(
                "signal selection file '{file_name}' would overwrite the default input sensor file"
            )));
        }

        let library = self.load_sensors(&self.default_input_sensors)?;
        let available = library.signal_names();
        if let Some(unknown) = signals
            .iter()
            .map(|s| s.as_ref())
            .find(|s| !available.iter().any(|a| a == *s))
        {
            return Err(CelloError::UnknownSignal {
                signal: unknown.to_string(),
                available,
            });
        }

        let path = self.config.input_dir.join(file_name);
        library.retain_signals(signals).write(&path)?;
        debug!(path = %path.display(), signals = signals.len(), "Wrote pruned input sensor file.");
        Ok(file_name.to_string())
    }

    /// Makes the default input sensor file active again.
    pub fn reset_input_signals(&mut self) {
        self.config.files.input_sensors = self.default_input_sensors.clone();
    }

    /// The container invocation the next run will execute.
    pub fn invocation(&self) -> Invocation {
        Invocation::new(
            &self.config.input_dir,
            &self.config.output_dir,
            &self.config.files,
            &self.config.container.image,
        )
    }

    /// Runs Cello once and blocks until the container exits.
    ///
    /// The output directory stays leased to the returned [`CompletedRun`]
    /// until its result has been read.
    ///
    /// # Errors
    ///
    /// * [`CelloError::Environment`] if the container runtime cannot be used.
    /// * [`CelloError::OutputBusy`] if another run holds the output directory.
    /// * [`CelloError::Execution`] or [`CelloError::TimedOut`] if Cello fails.
    #[instrument(skip_all, name = "cello_compute")]
    pub fn compute(&self, reporter: &ProgressReporter) -> Result<CompletedRun, CelloError> {
        reporter.report(Progress::PhaseStart { name: "Preflight" });
        let preflight = self.preflight();
        reporter.report(Progress::PhaseFinish);
        let (lease, archived) = preflight?;

        reporter.report(Progress::PhaseStart { name: "Cello" });
        let invocation = self.invocation();
        info!(
            image = %invocation.image,
            input_sensors = %self.config.files.input_sensors,
            "Executing Cello query."
        );
        let output = self.runtime.run(&invocation, reporter);
        reporter.report(Progress::PhaseFinish);
        let output = output?.into_result()?;

        info!(
            elapsed_secs = output.elapsed.as_secs_f64(),
            "Cello query finished."
        );
        Ok(CompletedRun {
            lease,
            output,
            archived,
        })
    }

    // Claims the output directory and moves earlier results aside.
    fn preflight(&self) -> Result<(OutputLease, Option<PathBuf>), CelloError> {
        self.runtime.check_available(&self.config.container.image)?;

        let lease = OutputLease::acquire(&self.config.output_dir)?;
        let archived = if self.config.archive_prior_results
            && has_prior_results(&self.config.output_dir)?
        {
            warn!("Prior results detected in output directory; archiving them.");
            Some(archive_prior_results(&self.config.output_dir)?)
        } else {
            None
        };
        Ok((lease, archived))
    }

    /// Runs Cello and reads the result before releasing the output directory.
    pub fn get_results(&self, reporter: &ProgressReporter) -> Result<CelloResult, CelloError> {
        let run = self.compute(reporter)?;
        reporter.report(Progress::PhaseStart { name: "Reading results" });
        let result = run.into_result()?;
        reporter.report(Progress::PhaseFinish);
        Ok(result)
    }

    fn load_sensors(&self, file_name: &str) -> Result<SensorLibrary, CelloError> {
        SensorLibrary::load(&self.config.input_dir.join(file_name))
    }
}

/// A successful run whose artifacts still occupy the output directory.
#[derive(Debug)]
pub struct CompletedRun {
    lease: OutputLease,
    output: ProcessOutput,
    archived: Option<PathBuf>,
}

impl CompletedRun {
    pub fn output(&self) -> &ProcessOutput {
        &self.output
    }

    /// Where earlier results were moved before this run, if anywhere.
    pub fn archived_to(&self) -> Option<&Path> {
        self.archived.as_deref()
    }

    pub fn output_dir(&self) -> &Path {
        self.lease.dir()
    }

    /// Reads the run's artifacts and releases the output directory.
    pub fn into_result(self) -> Result<CelloResult, CelloError> {
        let result = CelloResult::read(self.lease.dir());
        self.lease.release()?;
        result
    }
}

fn canonical(path: &Path) -> Result<PathBuf, CelloError> {
    path.canonicalize().map_err(|e| CelloError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::chassis::ChassisFiles;
    use crate::engine::config::QueryConfigBuilder;
    use crate::workflows::result::tests::write_fixture;
    use serde_json::json;
    use std::fs;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use tempfile::{TempDir, tempdir};

    #[derive(Clone)]
    struct FakeRuntime {
        available: bool,
        exit_code: i32,
        write_artifacts: bool,
        score: Arc<Mutex<f64>>,
        calls: Arc<Mutex<Vec<Invocation>>>,
    }

    impl FakeRuntime {
        fn succeeding() -> Self {
            Self {
                available: true,
                exit_code: 0,
                write_artifacts: true,
                score: Arc::new(Mutex::new(112.5)),
                calls: Arc::new(Mutex::new(Vec::new())),
            }
        }
    }

    impl ContainerRuntime for FakeRuntime {
        fn check_available(&self, _image: &str) -> Result<(), CelloError> {
            if self.available {
                Ok(())
            } else {
                Err(CelloError::Environment("daemon unreachable".into()))
            }
        }

        fn run(
            &self,
            invocation: &Invocation,
            reporter: &ProgressReporter,
        ) -> Result<ProcessOutput, CelloError> {
            self.calls.lock().unwrap().push(invocation.clone());
            reporter.report(Progress::Message("fake cello".into()));
            let out = &invocation.mounts[1].host;
            if self.write_artifacts {
                write_fixture(out);
                let score = *self.score.lock().unwrap();
                fs::write(
                    out.join("log.log"),
                    format!("SimulatedAnnealing - Score: {score}\n"),
                )
                .unwrap();
            }
            Ok(ProcessOutput {
                exit_code: Some(self.exit_code),
                output: "fake cello\n".into(),
                elapsed: Duration::from_millis(1),
            })
        }
    }

    struct Workspace {
        _root: TempDir,
        input: PathBuf,
        output: PathBuf,
    }

    fn workspace() -> Workspace {
        let root = tempdir().unwrap();
        let input = root.path().join("input");
        let output = root.path().join("output");
        fs::create_dir(&input).unwrap();

        fs::write(input.join("and.v"), "module and(output out, input a, b);\nendmodule\n").unwrap();
        fs::write(input.join("options.csv"), "").unwrap();
        fs::write(input.join("Eco1C1G1T1.UCF.json"), "[]").unwrap();
        fs::write(input.join("Eco1C1G1T1.output.json"), "[]").unwrap();
        let mut records = Vec::new();
        for signal in ["LacI", "TetR", "AraC", "HKCDL"] {
            records.push(json!({"collection": "input_sensors", "name": format!("{signal}_sensor")}));
            records.push(json!({"collection": "models", "name": format!("{signal}_sensor_model")}));
            records.push(json!({"collection": "structures", "name": format!("{signal}_sensor_structure")}));
        }
        fs::write(
            input.join("Eco1C1G1T1.input.json"),
            serde_json::to_string(&records).unwrap(),
        )
        .unwrap();

        Workspace {
            _root: root,
            input,
            output,
        }
    }

    fn config(ws: &Workspace) -> QueryConfigBuilder {
        QueryConfigBuilder::new()
            .input_dir(&ws.input)
            .output_dir(&ws.output)
            .verilog_file("and.v")
            .options_file(Some("options.csv".into()))
            .chassis(&ChassisFiles::new("Eco1C1G1T1"))
    }

    fn query(ws: &Workspace, runtime: FakeRuntime) -> CelloQuery {
        CelloQuery::with_runtime(config(ws).build().unwrap(), runtime).unwrap()
    }

    #[test]
    fn construction_creates_output_directory() {
        let ws = workspace();
        let q = query(&ws, FakeRuntime::succeeding());
        assert!(ws.output.is_dir());
        assert!(q.output_dir().is_absolute());
        assert_eq!(q.active_input_sensors(), "Eco1C1G1T1.input.json");
    }

    #[test]
    fn construction_names_the_first_missing_file() {
        let ws = workspace();
        fs::remove_file(ws.input.join("Eco1C1G1T1.UCF.json")).unwrap();
        fs::remove_file(ws.input.join("Eco1C1G1T1.output.json")).unwrap();

        let err = CelloQuery::with_runtime(config(&ws).build().unwrap(), FakeRuntime::succeeding())
            .unwrap_err();
        match err {
            CelloError::MissingInputFile { role, path } => {
                assert_eq!(role, "constraint");
                assert!(path.ends_with("Eco1C1G1T1.UCF.json"));
            }
            other => panic!("expected MissingInputFile, got {other:?}"),
        }
    }

    #[test]
    fn missing_input_directory_is_a_configuration_error() {
        let ws = workspace();
        let cfg = config(&ws).input_dir(ws.input.join("nope")).build().unwrap();
        let err = CelloQuery::with_runtime(cfg, FakeRuntime::succeeding()).unwrap_err();
        assert!(matches!(
            err,
            CelloError::MissingInputFile {
                role: "input directory",
                ..
            }
        ));
    }

    #[test]
    fn set_and_reset_input_signals() {
        let ws = workspace();
        let mut q = query(&ws, FakeRuntime::succeeding());
        assert_eq!(q.input_signals().unwrap(), vec!["LacI", "TetR", "AraC", "HKCDL"]);

        let name = q.set_input_signals(&["AraC", "LacI"]).unwrap();
        assert_eq!(name, CUSTOM_INPUT_FILE);
        assert_eq!(q.active_input_sensors(), CUSTOM_INPUT_FILE);
        assert_eq!(q.input_signals().unwrap(), vec!["LacI", "AraC"]);
        assert_eq!(q.available_signals().unwrap().len(), 4);

        q.reset_input_signals();
        assert_eq!(q.input_signals().unwrap().len(), 4);
    }

    #[test]
    fn unknown_signal_leaves_selection_unchanged() {
        let ws = workspace();
        let mut q = query(&ws, FakeRuntime::succeeding());
        q.set_input_signals(&["TetR"]).unwrap();

        let err = q.set_input_signals(&["LacI", "GFP"]).unwrap_err();
        match err {
            CelloError::UnknownSignal { signal, available } => {
                assert_eq!(signal, "GFP");
                assert_eq!(available.len(), 4);
            }
            other => panic!("expected UnknownSignal, got {other:?}"),
        }
        assert_eq!(q.input_signals().unwrap(), vec!["TetR"]);
    }

    #[test]
    fn reselecting_draws_from_the_full_default_set() {
        let ws = workspace();
        let mut q = query(&ws, FakeRuntime::succeeding());
        q.set_input_signals(&["TetR"]).unwrap();
        q.set_input_signals(&["LacI", "HKCDL"]).unwrap();
        assert_eq!(q.input_signals().unwrap(), vec!["LacI", "HKCDL"]);
    }

    #[test]
    fn write_input_signals_does_not_change_active_file() {
        let ws = workspace();
        let q = query(&ws, FakeRuntime::succeeding());
        let name = q.write_input_signals_as(&["LacI"], "lacI_only.input.json").unwrap();
        assert_eq!(name, "lacI_only.input.json");
        assert!(ws.input.join("lacI_only.input.json").is_file());
        assert_eq!(q.active_input_sensors(), "Eco1C1G1T1.input.json");
    }

    #[test]
    fn selection_cannot_overwrite_the_default_file() {
        let ws = workspace();
        let mut q = query(&ws, FakeRuntime::succeeding());
        assert!(matches!(
            q.set_input_signals_as(&["LacI"], "Eco1C1G1T1.input.json"),
            Err(CelloError::Configuration(_))
        ));
        assert!(matches!(
            q.set_input_signals_as(&["LacI"], "../escape.json"),
            Err(CelloError::Configuration(_))
        ));
        assert_eq!(q.input_signals().unwrap().len(), 4);
    }

    #[test]
    fn get_results_runs_selected_sensor_file_and_reads_output() {
        let ws = workspace();
        let runtime = FakeRuntime::succeeding();
        let calls = runtime.calls.clone();
        let mut q = query(&ws, runtime);
        q.set_input_signals(&["LacI", "TetR"]).unwrap();

        let messages = Mutex::new(Vec::new());
        let reporter = ProgressReporter::with_callback(Box::new(|event| {
            messages.lock().unwrap().push(event);
        }));
        let result = q.get_results(&reporter).unwrap();
        drop(reporter);

        assert_eq!(result.circuit_score(), 112.5);
        assert_eq!(result.part_names()["$48"], "PhlF");
        let calls = calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert!(
            calls[0]
                .command
                .contains(&"/root/input/custom_input.input.json".to_string())
        );
        let events = messages.into_inner().unwrap();
        assert!(events.contains(&Progress::Message("fake cello".into())));
        assert!(events.contains(&Progress::PhaseStart { name: "Cello" }));
        OutputLease::acquire(&ws.output).unwrap();
    }

    #[test]
    fn captured_result_survives_the_next_run() {
        let ws = workspace();
        let runtime = FakeRuntime::succeeding();
        let score = runtime.score.clone();
        let q = query(&ws, runtime);

        let first = q.get_results(&ProgressReporter::new()).unwrap();
        *score.lock().unwrap() = 7.25;
        let run = q.compute(&ProgressReporter::new()).unwrap();
        let archive = run.archived_to().map(Path::to_path_buf).unwrap();
        let second = run.into_result().unwrap();

        assert_eq!(first.circuit_score(), 112.5);
        assert_eq!(second.circuit_score(), 7.25);
        assert_eq!(CelloResult::read(&archive).unwrap().circuit_score(), 112.5);
    }

    #[test]
    fn archival_can_be_disabled() {
        let ws = workspace();
        let cfg = config(&ws).archive_prior_results(false).build().unwrap();
        let q = CelloQuery::with_runtime(cfg, FakeRuntime::succeeding()).unwrap();
        q.get_results(&ProgressReporter::new()).unwrap();
        let run = q.compute(&ProgressReporter::new()).unwrap();
        assert!(run.archived_to().is_none());
        run.into_result().unwrap();
    }

    #[test]
    fn failed_run_is_an_execution_error_and_frees_the_directory() {
        let ws = workspace();
        let mut runtime = FakeRuntime::succeeding();
        runtime.exit_code = 1;
        runtime.write_artifacts = false;
        let q = query(&ws, runtime);

        let err = q.get_results(&ProgressReporter::new()).unwrap_err();
        assert!(matches!(err, CelloError::Execution { exit_code: Some(1), .. }));
        assert!(err.is_no_viable_circuit());
        OutputLease::acquire(&ws.output).unwrap();
    }

    #[test]
    fn successful_run_without_artifacts_is_result_not_found() {
        let ws = workspace();
        let mut runtime = FakeRuntime::succeeding();
        runtime.write_artifacts = false;
        let q = query(&ws, runtime);
        assert!(matches!(
            q.get_results(&ProgressReporter::new()),
            Err(CelloError::ResultNotFound { .. })
        ));
        OutputLease::acquire(&ws.output).unwrap();
    }

    #[test]
    fn unreachable_runtime_is_an_environment_error() {
        let ws = workspace();
        let mut runtime = FakeRuntime::succeeding();
        runtime.available = false;
        let calls = runtime.calls.clone();
        let q = query(&ws, runtime);

        let events = Mutex::new(Vec::new());
        let reporter = ProgressReporter::with_callback(Box::new(|event| {
            events.lock().unwrap().push(event);
        }));
        let err = q.get_results(&reporter).unwrap_err();
        drop(reporter);

        assert!(matches!(err, CelloError::Environment(_)));
        assert!(!err.is_no_viable_circuit());
        assert!(calls.lock().unwrap().is_empty());
        assert_eq!(
            events.into_inner().unwrap(),
            vec![Progress::PhaseStart { name: "Preflight" }, Progress::PhaseFinish]
        );
    }

    #[test]
    fn busy_directory_still_closes_the_preflight_phase() {
        let ws = workspace();
        let q = query(&ws, FakeRuntime::succeeding());
        let run = q.compute(&ProgressReporter::new()).unwrap();

        let events = Mutex::new(Vec::new());
        let reporter = ProgressReporter::with_callback(Box::new(|event| {
            events.lock().unwrap().push(event);
        }));
        assert!(matches!(q.compute(&reporter), Err(CelloError::OutputBusy { .. })));
        drop(reporter);

        assert_eq!(events.into_inner().unwrap().last(), Some(&Progress::PhaseFinish));
        run.into_result().unwrap();
    }

    #[test]
    fn leased_output_directory_refuses_a_second_run() {
        let ws = workspace();
        let q = query(&ws, FakeRuntime::succeeding());
        let run = q.compute(&ProgressReporter::new()).unwrap();

        assert!(matches!(
            q.compute(&ProgressReporter::new()),
            Err(CelloError::OutputBusy { .. })
        ));
        run.into_result().unwrap();
        q.compute(&ProgressReporter::new()).unwrap();
    }

    /// Needs Docker and a directory with Cello inputs in `CELLO_E2E_INPUT_DIR`.
    #[test]
    #[ignore]
    fn docker_end_to_end() {
        let input = std::env::var("CELLO_E2E_INPUT_DIR").expect("CELLO_E2E_INPUT_DIR not set");
        let output = tempdir().unwrap();
        let cfg = QueryConfigBuilder::new()
            .input_dir(input)
            .output_dir(output.path())
            .verilog_file("and.v")
            .options_file(Some("options.csv".into()))
            .chassis(&ChassisFiles::new("Eco1C1G1T1"))
            .build()
            .unwrap();
        let mut q = CelloQuery::new(cfg).unwrap();
        let signals = q.input_signals().unwrap();
        q.set_input_signals(&signals[..2]).unwrap();

        let result = q.get_results(&ProgressReporter::new()).unwrap();
        assert!(result.circuit_score().is_finite());
        assert!(result.circuit_score() > 0.0);
        let gates: Vec<_> = result
            .logic()
            .keys()
            .filter(|node| node.starts_with('$'))
            .collect();
        assert!(!gates.is_empty());
        for gate in gates {
            assert!(result.part_names().contains_key(gate), "no part for gate {gate}");
        }
        assert!(!result.repressor_scores().is_empty());
    }
}
