use crate::engine::error::CelloError;
use std::fs::{File, OpenOptions, TryLockError};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const LEASE_FILE_NAME: &str = ".cello-output.lock";

/// Exclusive claim on an output directory for the duration of one run.
///
/// The claim is an advisory lock on `.cello-output.lock`, so the operating
/// system drops it when the holder exits, even without unwinding. A second
/// claimant is refused with [`CelloError::OutputBusy`]. The lock file itself
/// stays in the directory; only the lock on it matters.
#[derive(Debug)]
pub struct OutputLease {
    dir: PathBuf,
    lock: PathBuf,
    file: File,
}

impl OutputLease {
    pub fn acquire(dir: &Path) -> Result<Self, CelloError> {
        let lock = dir.join(LEASE_FILE_NAME);
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock)
            .map_err(|e| CelloError::io(&lock, e))?;

        match file.try_lock() {
            Ok(()) => {}
            Err(TryLockError::WouldBlock) => {
                return Err(CelloError::OutputBusy {
                    dir: dir.to_path_buf(),
                    lock,
                });
            }
            Err(TryLockError::Error(e)) => return Err(CelloError::io(&lock, e)),
        }

        // Holder's pid, for whoever finds the directory busy.
        file.set_len(0)
            .and_then(|()| writeln!(file, "{}", std::process::id()))
            .map_err(|e| CelloError::io(&lock, e))?;

        debug!(lock = %lock.display(), "Acquired output directory lease.");
        Ok(Self {
            dir: dir.to_path_buf(),
            lock,
            file,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn release(self) -> Result<(), CelloError> {
        self.file
            .unlock()
            .map_err(|e| CelloError::io(&self.lock, e))?;
        debug!(lock = %self.lock.display(), "Released output directory lease.");
        Ok(())
    }
}
