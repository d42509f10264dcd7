use fs2::FileExt;
use std::{
    ffi::OsString,
    fs::{self, File, OpenOptions},
    path::{Path, PathBuf},
    thread,
    time::{Duration, Instant},
};
use tracing::debug;

use crate::error::{Result, TallyError};

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Lock file guarding a charts document: `<charts>.lock`.
#[must_use]
pub fn lock_path_for(charts: &Path) -> PathBuf {
    let mut name = charts
        .file_name()
        .map_or_else(|| OsString::from("charts"), ToOwned::to_owned);
    name.push(".lock");
    charts.with_file_name(name)
}

/// RAII guard for the exclusive lock held while a charts file is read,
/// extended and rewritten.
#[derive(Debug)]
pub struct ChartsLock {
    file: File,
    path: PathBuf,
}

impl ChartsLock {
    /// Acquire the lock for `charts`, polling until `timeout` elapses.
    ///
    /// # Errors
    ///
    /// [`TallyError::LockTimeout`] when another process holds the lock for
    /// longer than `timeout`, or [`TallyError::Io`] when the lock file
    /// cannot be created.
    pub fn acquire(charts: &Path, timeout: Duration) -> Result<Self> {
        let path = lock_path_for(charts);
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let started = Instant::now();
        loop {
            let file = OpenOptions::new()
                .create(true)
                .read(true)
                .write(true)
                .truncate(false)
                .open(&path)?;

            if file.try_lock_exclusive().is_ok() {
                debug!(path = %path.display(), "acquired charts lock");
                return Ok(Self { file, path });
            }

            if started.elapsed() >= timeout {
                return Err(TallyError::LockTimeout {
                    path,
                    waited_ms: started.elapsed().as_millis(),
                });
            }
            thread::sleep(POLL_INTERVAL);
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Release early. Dropping the guard also releases.
    pub fn release(self) {
        drop(self);
    }
}

impl Drop for ChartsLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}
