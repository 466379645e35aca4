//! Process lifecycle: startup priming, session detach, shutdown release.
//!
//! ```text
//!   open devices ─▶ prime (rearm + stale drain) ─▶ [detach ─▶ rearm]
//!                                                        │
//!   release ◀── run (until SIGINT / SIGTERM) ◀───────────┘
//! ```
//!
//! [`DaemonContext`] owns every handle the daemon holds. Signal handlers
//! touch none of it; they only raise the flag in [`signals`].

pub mod daemon;
pub mod pidfile;
pub mod signals;

use std::io;
use std::path::Path;
use std::sync::atomic::AtomicBool;

use log::{debug, warn};

use crate::app::events::ReceivedEvent;
use crate::app::ports::{ActuatorPort, EventSink, ReceiverPort};
use crate::app::service::Dispatcher;
use crate::error::{LifecycleError, PidFileError, Result};

use pidfile::PidFile;

pub struct DaemonContext<R: ReceiverPort, A: ActuatorPort, S: EventSink> {
    receiver: R,
    actuator: A,
    sink: S,
    dispatcher: Dispatcher,
    instance_lock: Option<PidFile>,
    released: bool,
}

impl<R: ReceiverPort, A: ActuatorPort, S: EventSink> DaemonContext<R, A, S> {
    pub fn new(receiver: R, actuator: A, sink: S, dispatcher: Dispatcher) -> Self {
        Self {
            receiver,
            actuator,
            sink,
            dispatcher,
            instance_lock: None,
            released: false,
        }
    }

    /// First readiness registration, then discard whatever the receiver
    /// latched before we attached.
    pub fn prime(&mut self) -> Result<Option<ReceivedEvent>> {
        self.receiver.rearm()?;
        self.dispatcher.drain_stale(&mut self.receiver, &mut self.sink)
    }

    /// Take the single-instance lock at `path`.
    ///
    /// Another running daemon is fatal. Any other failure is logged and the
    /// daemon carries on unprotected; `Ok(false)` reports that case.
    pub fn acquire_instance_lock(&mut self, path: &Path) -> Result<bool> {
        match PidFile::acquire(path) {
            Ok(lock) => {
                self.set_instance_lock(lock);
                Ok(true)
            }
            Err(e @ PidFileError::AlreadyRunning { .. }) => Err(LifecycleError::InstanceLock(e).into()),
            Err(e) => {
                warn!("Cannot open or create pidfile '{}': {}", path.display(), e);
                Ok(false)
            }
        }
    }

    pub fn set_instance_lock(&mut self, lock: PidFile) {
        self.instance_lock = Some(lock);
    }

    pub fn has_instance_lock(&self) -> bool {
        self.instance_lock.is_some()
    }

    /// Record the current pid in the instance lock, if one is held.
    pub fn write_pid(&mut self) {
        if let Some(lock) = self.instance_lock.as_mut() {
            if let Err(e) = lock.write_pid() {
                warn!("Cannot write pid to {}: {}", lock.path().display(), e);
            }
        }
    }

    /// Run `detach_op` (normally [`daemon::detach`]), then record the new
    /// pid and re-arm the receiver.
    ///
    /// On failure the instance lock is removed before returning.
    pub fn detach(&mut self, detach_op: impl FnOnce() -> io::Result<()>) -> Result<()> {
        if let Err(e) = detach_op() {
            if let Some(mut lock) = self.instance_lock.take() {
                lock.remove();
            }
            return Err(LifecycleError::Detach(e).into());
        }
        self.write_pid();
        self.receiver.rearm()?;
        debug!("Detached, receiver re-armed");
        Ok(())
    }

    /// Dispatch until `shutdown` is raised or the wait fails.
    pub fn run(&mut self, shutdown: &AtomicBool) -> Result<()> {
        self.dispatcher
            .run(&mut self.receiver, &mut self.actuator, &mut self.sink, shutdown)
    }

    /// Close both devices and drop the instance lock. Calling it twice is
    /// harmless; it also runs on drop.
    pub fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        self.receiver.close();
        self.actuator.close();
        if let Some(mut lock) = self.instance_lock.take() {
            lock.remove();
        }
        debug!("Resources released");
    }

    // ── Accessors ─────────────────────────────────────────────

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn receiver(&self) -> &R {
        &self.receiver
    }

    pub fn actuator(&self) -> &A {
        &self.actuator
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }
}

impl<R: ReceiverPort, A: ActuatorPort, S: EventSink> Drop for DaemonContext<R, A, S> {
    fn drop(&mut self) {
        self.release();
    }
}
