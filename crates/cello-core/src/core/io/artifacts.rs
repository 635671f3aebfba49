use crate::engine::error::CelloError;
use std::path::{Path, PathBuf};

/// The files Cello leaves in its output directory that the result reader consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Artifact {
    /// `<design>_logic.csv`: the boolean state of every node per input state.
    Logic,
    /// `<design>_activity.csv`: the predicted activity of every node per input state.
    Activity,
    /// `<design>_outputNetlist.json`: the technology-mapped netlist.
    Netlist,
    /// `<name>.log`: the run log that carries the overall circuit score.
    Log,
}

impl Artifact {
    pub const ALL: [Artifact; 4] = [
        Artifact::Logic,
        Artifact::Activity,
        Artifact::Netlist,
        Artifact::Log,
    ];

    pub fn suffix(self) -> &'static str {
        match self {
            Artifact::Logic => "_logic.csv",
            Artifact::Activity => "_activity.csv",
            Artifact::Netlist => "_outputNetlist.json",
            Artifact::Log => ".log",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Artifact::Logic => "logic table (*_logic.csv)",
            Artifact::Activity => "activity table (*_activity.csv)",
            Artifact::Netlist => "output netlist (*_outputNetlist.json)",
            Artifact::Log => "score log (*.log)",
        }
    }

    fn matches(self, file_name: &str) -> bool {
        file_name.len() > self.suffix().len() && file_name.ends_with(self.suffix())
    }
}

/// Finds the single file in `dir` (not recursing) that matches `artifact`.
///
/// # Errors
///
/// * [`CelloError::ResultNotFound`] when no file matches.
/// * [`CelloError::AmbiguousResult`] when more than one file matches.
/// * [`CelloError::Io`] when the directory cannot be listed.
pub fn locate(dir: &Path, artifact: Artifact) -> Result<PathBuf, CelloError> {
    let entries = std::fs::read_dir(dir).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => CelloError::ResultNotFound {
            artifact: artifact.description(),
            dir: dir.to_path_buf(),
        },
        _ => CelloError::io(dir, e),
    })?;

    let mut matches = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| CelloError::io(dir, e))?;
        let is_file = entry.file_type().map(|t| t.is_file()).unwrap_or(false);
        if is_file && artifact.matches(&entry.file_name().to_string_lossy()) {
            matches.push(entry.path());
        }
    }
    matches.sort();

    match matches.len() {
        0 => Err(CelloError::ResultNotFound {
            artifact: artifact.description(),
            dir: dir.to_path_buf(),
        }),
        1 => Ok(matches.remove(0)),
        _ => Err(CelloError::AmbiguousResult {
            artifact: artifact.description(),
            matches,
        }),
    }
}
