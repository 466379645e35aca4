//! Port traits — the hexagonal boundary between dispatch logic and devices.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ Dispatcher (domain)
//! ```
//!
//! Driven adapters (receiver device, GPIO controller, event sinks) implement
//! these traits. The [`Dispatcher`](super::service::Dispatcher) consumes them
//! via generics, so the dispatch core never touches a file descriptor.

use core::time::Duration;

use super::events::{AppEvent, ReceivedEvent};
use super::mapping::{PinAction, PinId};

pub use crate::error::{ActuationError, ReceiverError};

// ───────────────────────────────────────────────────────────────
// Receiver port (driven adapter: RF receiver → domain)
// ───────────────────────────────────────────────────────────────

/// Result of a bounded readiness wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// A decoded code is available; fetch it promptly.
    Ready,
    /// The timeout elapsed with nothing to read.
    TimedOut,
    /// A signal interrupted the wait.
    Interrupted,
}

/// Pollable receiver peripheral.
///
/// The peripheral buffers only the latest decode, so callers must call
/// [`fetch_last_code`](Self::fetch_last_code) right after a `Ready` wait.
pub trait ReceiverPort {
    /// Block until a code is available or `timeout` elapses.
    fn wait(&mut self, timeout: Duration) -> Result<WaitOutcome, ReceiverError>;

    /// Retrieve the most recent decode and its device timestamp.
    fn fetch_last_code(&mut self) -> Result<ReceivedEvent, ReceiverError>;

    /// (Re)create the readiness registration.
    ///
    /// Required once before the first wait and again after anything that
    /// tears down the process's readiness registrations (detaching from the
    /// controlling session forks, and kqueues are not inherited).
    fn rearm(&mut self) -> Result<(), ReceiverError>;

    /// Release the device handle. Calling it twice is harmless.
    fn close(&mut self) {}
}

// ───────────────────────────────────────────────────────────────
// Actuator port (driven adapter: domain → GPIO)
// ───────────────────────────────────────────────────────────────

/// Write-side port: applies a pin action.
pub trait ActuatorPort {
    /// Configure `pin` as an output, then drive it according to `action`.
    /// Stateless between calls; repeating a call is safe.
    fn apply(&mut self, pin: PinId, action: PinAction) -> Result<(), ActuationError>;

    /// Release the controller handle. Calling it twice is harmless.
    fn close(&mut self) {}
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`]s through this port.
pub trait EventSink {
    fn emit(&mut self, event: &AppEvent);
}
