//! Unified error types for the daemon.
//!
//! Each boundary has its own typed error; the core and lifecycle layers
//! funnel them into [`Error`] so the top-level startup path can report
//! every fatal condition uniformly.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::app::mapping::PinId;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum Error {
    #[error("receiver: {0}")]
    Receiver(#[from] ReceiverError),

    #[error("lifecycle: {0}")]
    Lifecycle(#[from] LifecycleError),
}

// ---------------------------------------------------------------------------
// Receiver errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ReceiverError {
    #[error("failed to open '{}': {source}", path.display())]
    Open { path: PathBuf, source: io::Error },

    /// Readiness registration could not be (re)created.
    #[error("readiness registration failed: {0}")]
    Register(#[source] io::Error),

    /// The readiness wait itself failed (not a timeout).
    #[error("readiness wait failed: {0}")]
    Wait(#[source] io::Error),

    #[error("code fetch failed: {0}")]
    Fetch(#[source] io::Error),

    #[error("device closed")]
    Closed,
}

// ---------------------------------------------------------------------------
// GPIO / actuator errors
// ---------------------------------------------------------------------------

/// I/O failure talking to the GPIO controller.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct GpioError(#[from] pub io::Error);

impl embedded_hal::digital::Error for GpioError {
    fn kind(&self) -> embedded_hal::digital::ErrorKind {
        embedded_hal::digital::ErrorKind::Other
    }
}

#[derive(Debug, Error)]
pub enum ActuationError {
    #[error("pin {pin}: output configuration failed: {source}")]
    Configure { pin: PinId, source: GpioError },

    #[error("pin {pin}: write failed: {source}")]
    Write { pin: PinId, source: GpioError },
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read '{}': {source}", path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("cannot parse '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("invalid value: {0}")]
    Invalid(&'static str),
}

// ---------------------------------------------------------------------------
// Lifecycle errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum PidFileError {
    #[error("daemon already running, pid: {}", pid.map_or_else(|| "unknown".to_owned(), |p| p.to_string()))]
    AlreadyRunning { pid: Option<i32> },

    #[error("{0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("cannot daemonize: {0}")]
    Detach(#[source] io::Error),

    #[error("cannot install signal handlers: {0}")]
    Signals(#[source] io::Error),

    #[error("{0}")]
    InstanceLock(#[from] PidFileError),
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

pub type Result<T> = core::result::Result<T, Error>;
