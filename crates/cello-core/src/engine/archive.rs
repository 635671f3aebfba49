use crate::engine::error::CelloError;
use crate::engine::lease::LEASE_FILE_NAME;
use chrono::Local;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const ARCHIVE_PREFIX: &str = "prior_cello_result_";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H-%M-%S%.6f";

fn is_reserved(name: &str) -> bool {
    name.starts_with(ARCHIVE_PREFIX) || name == LEASE_FILE_NAME
}

fn active_entries(dir: &Path) -> Result<Vec<PathBuf>, CelloError> {
    let mut entries = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(|e| CelloError::io(dir, e))? {
        let entry = entry.map_err(|e| CelloError::io(dir, e))?;
        if !is_reserved(&entry.file_name().to_string_lossy()) {
            entries.push(entry.path());
        }
    }
    entries.sort();
    Ok(entries)
}

/// Whether `dir` holds output of an earlier run.
pub fn has_prior_results(dir: &Path) -> Result<bool, CelloError> {
    Ok(!active_entries(dir)?.is_empty())
}

/// Moves every non-archive entry of `dir` into a fresh
/// `prior_cello_result_<timestamp>` subdirectory and returns its path.
pub fn archive_prior_results(dir: &Path) -> Result<PathBuf, CelloError> {
    let entries = active_entries(dir)?;
    let archive = create_archive_dir(dir)?;

    for entry in &entries {
        let Some(name) = entry.file_name() else {
            continue;
        };
        let target = archive.join(name);
        std::fs::rename(entry, &target).map_err(|e| CelloError::io(entry, e))?;
    }

    info!(
        archive = %archive.display(),
        entries = entries.len(),
        "Archived prior results."
    );
    Ok(archive)
}

fn create_archive_dir(dir: &Path) -> Result<PathBuf, CelloError> {
    let stamp = Local::now().format(TIMESTAMP_FORMAT).to_string();
    let mut candidate = dir.join(format!("{ARCHIVE_PREFIX}{stamp}"));
    let mut attempt = 1;
    loop {
        match std::fs::create_dir(&candidate) {
            Ok(()) => return Ok(candidate),
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                warn!(path = %candidate.display(), "Archive directory already exists.");
                attempt += 1;
                candidate = dir.join(format!("{ARCHIVE_PREFIX}{stamp}-{attempt}"));
            }
            Err(e) => return Err(CelloError::io(&candidate, e)),
        }
    }
}
