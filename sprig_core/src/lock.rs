//! Exclusive lock around state transactions.
//!
//! Two layers: a process-local mutex so callers in the same process queue up
//! behind each other, and an OS-level exclusive lock on `.sprig/lock` so a
//! second process fails fast instead of interleaving its read-modify-write.
//! Both are released when the guard is dropped.

use crate::error::{Error, Result};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, warn};

static PROCESS_LOCK: Mutex<()> = Mutex::new(());

/// Guard holding the repository lock.
#[derive(Debug)]
pub struct StateLock {
    path: PathBuf,
    file: File,
    _process: MutexGuard<'static, ()>,
}

impl StateLock {
    /// Acquire the lock file at `path`.
    ///
    /// Blocks while another thread of this process holds a lock; returns
    /// [`Error::Locked`] immediately if another process holds it.
    pub fn acquire(path: &Path) -> Result<Self> {
        // A panic inside a previous transaction leaves nothing half-applied
        // in memory, so a poisoned mutex is still usable.
        let process = PROCESS_LOCK.lock().unwrap_or_else(PoisonError::into_inner);

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;

        match file.try_lock_exclusive() {
            Ok(()) => {
                debug!(path = %path.display(), "acquired state lock");
                Ok(Self {
                    path: path.to_path_buf(),
                    file,
                    _process: process,
                })
            }
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                warn!(path = %path.display(), "state lock held by another process");
                Err(Error::locked(path))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Path of the lock file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for StateLock {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            warn!(path = %self.path.display(), error = %e, "failed to release state lock");
        }
    }
}
