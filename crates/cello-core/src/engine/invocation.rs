use crate::engine::config::{CircuitFiles, ContainerConfig};
use crate::engine::error::CelloError;
use crate::engine::progress::{Progress, ProgressReporter};
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

pub const CONTAINER_INPUT_DIR: &str = "/root/input";
pub const CONTAINER_OUTPUT_DIR: &str = "/root/output";
const CONTAINER_CLASSPATH: &str = "/root/app.jar";
const CONTAINER_ENTRY_CLASS: &str = "org.cellocad.v2.DNACompiler.runtime.Main";

/// Exit status docker itself uses when it fails before the container runs.
const RUNTIME_FAILURE_EXIT_CODE: i32 = 125;

static NEXT_RUN: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mount {
    pub host: PathBuf,
    pub container: &'static str,
    pub read_only: bool,
}

impl Mount {
    fn to_volume_arg(&self) -> String {
        let mut arg = format!("{}:{}", self.host.display(), self.container);
        if self.read_only {
            arg.push_str(":ro");
        }
        arg
    }
}

/// A single containerized Cello run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Container name, unique per process and run.
    pub name: String,
    pub image: String,
    pub mounts: Vec<Mount>,
    pub command: Vec<String>,
}

impl Invocation {
    pub fn new(input_dir: &Path, output_dir: &Path, files: &CircuitFiles, image: &str) -> Self {
        let input = |name: &str| format!("{CONTAINER_INPUT_DIR}/{name}");

        let mut command: Vec<String> = vec![
            "java".into(),
            "-classpath".into(),
            CONTAINER_CLASSPATH.into(),
            CONTAINER_ENTRY_CLASS.into(),
            "-inputNetlist".into(),
            input(&files.verilog),
        ];
        if let Some(options) = &files.options {
            command.extend(["-options".into(), input(options)]);
        }
        command.extend([
            "-userConstraintsFile".into(),
            input(&files.ucf),
            "-inputSensorFile".into(),
            input(&files.input_sensors),
            "-outputDeviceFile".into(),
            input(&files.output_device),
            "-pythonEnv".into(),
            "python".into(),
            "-outputDir".into(),
            CONTAINER_OUTPUT_DIR.into(),
        ]);

        Self {
            name: format!(
                "cello-{}-{}",
                std::process::id(),
                NEXT_RUN.fetch_add(1, Ordering::Relaxed)
            ),
            image: image.to_string(),
            mounts: vec![
                Mount {
                    host: input_dir.to_path_buf(),
                    container: CONTAINER_INPUT_DIR,
                    read_only: true,
                },
                Mount {
                    host: output_dir.to_path_buf(),
                    container: CONTAINER_OUTPUT_DIR,
                    read_only: false,
                },
            ],
            command,
        }
    }

    /// Arguments passed to the runtime executable, starting with `run`.
    pub fn run_args(&self) -> Vec<String> {
        let mut args = vec![
            "run".to_string(),
            "--rm".to_string(),
            "--name".to_string(),
            self.name.clone(),
        ];
        for mount in &self.mounts {
            args.push("-v".to_string());
            args.push(mount.to_volume_arg());
        }
        args.push(self.image.clone());
        args.extend(self.command.iter().cloned());
        args
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutput {
    pub exit_code: Option<i32>,
    /// Interleaved stdout and stderr lines.
    pub output: String,
    pub elapsed: Duration,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Maps a finished process onto the error taxonomy.
    pub fn into_result(self) -> Result<Self, CelloError> {
        match self.exit_code {
            Some(0) => Ok(self),
            Some(RUNTIME_FAILURE_EXIT_CODE) => Err(CelloError::Environment(format!(
                "container runtime failed to start the container:\n{}",
                self.output.trim_end()
            ))),
            exit_code => Err(CelloError::Execution {
                exit_code,
                output: self.output,
            }),
        }
    }
}

/// Something that can execute an [`Invocation`] to completion.
pub trait ContainerRuntime: Send + Sync {
    /// Verifies that the runtime is reachable and the image can be used.
    fn check_available(&self, image: &str) -> Result<(), CelloError>;

    /// Runs the invocation, blocking until it exits.
    ///
    /// Only failures to start or supervise the process are errors here; a
    /// non-zero exit is reported through [`ProcessOutput::exit_code`].
    fn run(
        &self,
        invocation: &Invocation,
        reporter: &ProgressReporter,
    ) -> Result<ProcessOutput, CelloError>;
}

/// Runs Cello through the `docker` command-line client (or a compatible one).
#[derive(Debug, Clone)]
pub struct DockerRuntime {
    program: String,
    pull_missing_image: bool,
    timeout: Option<Duration>,
}

impl DockerRuntime {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            pull_missing_image: true,
            timeout: None,
        }
    }

    pub fn from_config(config: &ContainerConfig) -> Self {
        Self {
            program: config.runtime.clone(),
            pull_missing_image: config.pull_missing_image,
            timeout: config.timeout,
        }
    }

    fn probe(&self, args: &[&str]) -> Result<std::process::Output, CelloError> {
        Command::new(&self.program)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| self.spawn_error(e))
    }

    fn spawn_error(&self, e: std::io::Error) -> CelloError {
        match e.kind() {
            std::io::ErrorKind::NotFound => CelloError::Environment(format!(
                "container runtime '{}' was not found on PATH",
                self.program
            )),
            _ => CelloError::Environment(format!(
                "failed to start container runtime '{}': {}",
                self.program, e
            )),
        }
    }
}

impl Default for DockerRuntime {
    fn default() -> Self {
        Self::from_config(&ContainerConfig::default())
    }
}

impl ContainerRuntime for DockerRuntime {
    fn check_available(&self, image: &str) -> Result<(), CelloError> {
        let version = self.probe(&["version", "--format", "{{.Server.Version}}"])?;
        if !version.status.success() {
            return Err(CelloError::Environment(format!(
                "container daemon is not reachable through '{}': {}",
                self.program,
                String::from_utf8_lossy(&version.stderr).trim()
            )));
        }
        debug!(
            server_version = %String::from_utf8_lossy(&version.stdout).trim(),
            "Container runtime is reachable."
        );

        if !self.pull_missing_image {
            let inspect = self.probe(&["image", "inspect", image])?;
            if !inspect.status.success() {
                return Err(CelloError::Environment(format!(
                    "image '{image}' is not available locally and pulling is disabled"
                )));
            }
        }
        Ok(())
    }

    fn run(
        &self,
        invocation: &Invocation,
        reporter: &ProgressReporter,
    ) -> Result<ProcessOutput, CelloError> {
        let args = invocation.run_args();
        debug!(command = %format!("{} {}", self.program, args.join(" ")), "Spawning container.");

        let mut command = Command::new(&self.program);
        command.args(&args);
        self.supervise(command, Some(&invocation.name), reporter)
    }
}

impl DockerRuntime {
    fn supervise(
        &self,
        mut command: Command,
        container: Option<&str>,
        reporter: &ProgressReporter,
    ) -> Result<ProcessOutput, CelloError> {
        let start = Instant::now();
        let mut child = command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| self.spawn_error(e))?;

        let (tx, rx) = mpsc::channel();
        let mut readers = Vec::with_capacity(2);
        if let Some(stdout) = child.stdout.take() {
            readers.push(spawn_line_reader(stdout, tx.clone()));
        }
        if let Some(stderr) = child.stderr.take() {
            readers.push(spawn_line_reader(stderr, tx.clone()));
        }
        drop(tx);

        let deadline = self.timeout.map(|t| start + t);
        let mut output = String::new();
        loop {
            let next = match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return Err(self.stop_on_timeout(&mut child, container, output));
                    }
                    rx.recv_timeout(deadline - now)
                }
                None => rx.recv().map_err(|_| RecvTimeoutError::Disconnected),
            };
            match next {
                Ok(line) => {
                    debug!(target: "celloapi::container", "{}", line);
                    output.push_str(&line);
                    output.push('\n');
                    reporter.report(Progress::Message(line));
                }
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        for reader in readers {
            if reader.join().is_err() {
                warn!("Container output reader thread panicked.");
            }
        }

        let status = wait_until(&mut child, deadline)
            .map_err(|e| CelloError::Environment(format!("failed to wait for container: {e}")))?;
        let Some(status) = status else {
            return Err(self.stop_on_timeout(&mut child, container, output));
        };

        let elapsed = start.elapsed();
        info!(
            exit_code = ?status.code(),
            elapsed_secs = elapsed.as_secs_f64(),
            "Container exited."
        );
        Ok(ProcessOutput {
            exit_code: status.code(),
            output,
            elapsed,
        })
    }

    // Killing the client alone leaves the container running under the daemon,
    // still writing into the output mount. The container is force-removed and
    // checked gone before the caller gets the error back.
    fn stop_on_timeout(
        &self,
        child: &mut Child,
        container: Option<&str>,
        output: String,
    ) -> CelloError {
        warn!("Container exceeded its time limit; killing it.");
        if let Err(e) = child.kill() {
            warn!("Failed to kill container client: {}", e);
        }
        let _ = child.wait();

        if let Some(name) = container {
            match self.probe(&["rm", "--force", name]) {
                Ok(out) if !out.status.success() => debug!(
                    container = name,
                    "rm --force reported: {}",
                    String::from_utf8_lossy(&out.stderr).trim()
                ),
                Ok(_) => debug!(container = name, "Removed timed-out container."),
                Err(e) => warn!(container = name, "Failed to remove timed-out container: {}", e),
            }
            match self.probe(&["container", "inspect", name]) {
                Ok(out) if out.status.success() => {
                    return CelloError::Environment(format!(
                        "container '{name}' outlived its time limit and could not be removed; \
                         it may still be writing to the output directory"
                    ));
                }
                Ok(_) => {}
                Err(e) => warn!(container = name, "Could not confirm container removal: {}", e),
            }
        }

        CelloError::TimedOut {
            limit: self.timeout.unwrap_or_default(),
            output,
        }
    }
}

fn spawn_line_reader(
    stream: impl Read + Send + 'static,
    tx: mpsc::Sender<String>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        let mut reader = BufReader::new(stream);
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf) {
                Ok(0) | Err(_) => break,
                Ok(_) => {
                    let line = String::from_utf8_lossy(&buf).trim_end().to_string();
                    if tx.send(line).is_err() {
                        break;
                    }
                }
            }
        }
    })
}

// Returns `None` if the deadline passes before the child exits.
fn wait_until(
    child: &mut Child,
    deadline: Option<Instant>,
) -> std::io::Result<Option<std::process::ExitStatus>> {
    let Some(deadline) = deadline else {
        return child.wait().map(Some);
    };
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if Instant::now() >= deadline {
            return Ok(None);
        }
        thread::sleep(Duration::from_millis(50));
    }
}
