//! Inbound receiver events and outbound application events.
//!
//! [`ReceivedEvent`] is what the receiver port hands the dispatcher on each
//! wakeup. [`AppEvent`] is what the dispatcher emits through the
//! [`EventSink`](super::ports::EventSink) port; adapters decide where it
//! ends up (system log, test recorder, ...).

use core::fmt;

use super::mapping::{CodeMapping, PinAction, PinId};

/// One decode fetched from the receiver after a readiness wakeup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReceivedEvent {
    pub code: u64,
    /// Device-clock timestamp (microseconds).
    pub timestamp: i64,
}

/// Audit record for an accepted and actuated code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuditRecord {
    pub code: u64,
    pub action: PinAction,
    pub pin: PinId,
}

impl From<&CodeMapping> for AuditRecord {
    fn from(m: &CodeMapping) -> Self {
        Self {
            code: m.code,
            action: m.action,
            pin: m.pin,
        }
    }
}

/// Renders as `0x1A2B S 5`.
impl fmt::Display for AuditRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:X} {} {}", self.code, self.action.letter(), self.pin)
    }
}

/// Counters accumulated by the dispatcher over its lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    /// Codes fetched from the receiver (stale drain excluded).
    pub received: u64,
    pub dispatched: u64,
    pub unmapped: u64,
    pub debounced: u64,
    pub actuation_failures: u64,
    /// Wakeups whose fetch failed.
    pub unreadable: u64,
}

/// Structured events emitted by the dispatcher.
#[derive(Debug, Clone)]
pub enum AppEvent {
    /// The dispatch loop is about to start.
    Started { mappings: usize, interval_ms: u64 },

    /// A code was accepted and its pin action applied.
    Dispatched(AuditRecord),

    /// A code was accepted but the pin write failed.
    ActuationFailed { record: AuditRecord, reason: String },

    /// A stale decode latched before startup was discarded.
    StaleDiscarded(ReceivedEvent),

    /// The dispatch loop has ended.
    Stopped(DispatchStats),
}
