//! Single-instance lock backed by an `flock(2)`-ed pid file.
//!
//! The lock lives on the open file description, so it survives the fork in
//! `daemon(3)` and is released by the kernel when the last holder exits.

use std::fs::{File, OpenOptions};
use std::io::{self, Seek, SeekFrom, Write};
use std::os::fd::AsRawFd;
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};

use log::{debug, warn};

use crate::error::PidFileError;

#[derive(Debug)]
pub struct PidFile {
    path: PathBuf,
    file: Option<File>,
}

impl PidFile {
    /// Create (or reuse) the pid file at `path` and lock it exclusively.
    ///
    /// Contention reports [`PidFileError::AlreadyRunning`] with the pid the
    /// holder wrote, when it can be read.
    pub fn acquire(path: &Path) -> Result<Self, PidFileError> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .mode(0o600)
            .open(path)?;

        // SAFETY: `file` is an open descriptor for the duration of the call.
        if unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_EX | libc::LOCK_NB) } != 0 {
            let err = io::Error::last_os_error();
            if err.kind() == io::ErrorKind::WouldBlock {
                return Err(PidFileError::AlreadyRunning {
                    pid: read_pid(path),
                });
            }
            return Err(err.into());
        }

        debug!("pidfile: locked {}", path.display());
        Ok(Self {
            path: path.to_path_buf(),
            file: Some(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replace the file contents with the calling process's pid.
    pub fn write_pid(&mut self) -> io::Result<()> {
        let file = self
            .file
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "pid file released"))?;
        file.set_len(0)?;
        file.seek(SeekFrom::Start(0))?;
        writeln!(file, "{}", std::process::id())?;
        file.sync_data()
    }

    /// Unlink the file and drop the lock. Calling it twice is harmless.
    pub fn remove(&mut self) {
        if self.file.is_none() {
            return;
        }
        if let Err(e) = std::fs::remove_file(&self.path) {
            warn!("pidfile: cannot remove {}: {}", self.path.display(), e);
        }
        self.file = None;
    }
}

impl Drop for PidFile {
    fn drop(&mut self) {
        self.remove();
    }
}

fn read_pid(path: &Path) -> Option<i32> {
    std::fs::read_to_string(path).ok()?.trim().parse().ok()
}
