//! Repeat suppression for received codes.
//!
//! A single press on an RF remote usually produces a burst of identical
//! decodes. The filter accepts a code when it differs from the last accepted
//! one, or when enough device-clock time has passed since that code was
//! accepted. Timestamps come from the receiver and are in microseconds.
//!
//! ## Known limitations
//!
//! - Code `0` doubles as the "nothing seen yet" sentinel, so a first real
//!   event carrying code 0 is treated as a repeat of nothing and accepted
//!   only through the interval branch.
//! - The device counter is compared with a plain absolute difference; a
//!   counter wrap or reset is not corrected for.

use super::events::ReceivedEvent;

/// Default minimum interval between two accepted identical codes.
pub const DEFAULT_INTERVAL_MS: u64 = 1000;

/// The only long-lived mutable state of the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebounceState {
    /// Last accepted code (`0` = none).
    pub last_code: u64,
    /// Device timestamp of the last accepted code.
    pub last_timestamp: i64,
    pub min_interval_ms: u64,
}

impl DebounceState {
    pub const fn new(min_interval_ms: u64) -> Self {
        Self {
            last_code: 0,
            last_timestamp: 0,
            min_interval_ms,
        }
    }

    /// Minimum interval expressed in device-clock units.
    pub const fn min_interval_us(&self) -> u64 {
        self.min_interval_ms.saturating_mul(1000)
    }
}

impl Default for DebounceState {
    fn default() -> Self {
        Self::new(DEFAULT_INTERVAL_MS)
    }
}

/// Applies the repeat policy to a [`DebounceState`].
#[derive(Debug, Clone, Default)]
pub struct DebounceFilter {
    state: DebounceState,
}

impl DebounceFilter {
    pub fn new(min_interval_ms: u64) -> Self {
        Self {
            state: DebounceState::new(min_interval_ms),
        }
    }

    /// Decide whether `event` is a fresh trigger.
    ///
    /// On acceptance the state is overwritten before returning, so the
    /// caller's later actuation outcome cannot cause the same event to be
    /// accepted twice.
    pub fn accept(&mut self, event: &ReceivedEvent) -> bool {
        let s = &mut self.state;
        let fresh = event.code != s.last_code
            || event.timestamp.abs_diff(s.last_timestamp) > s.min_interval_us();

        if fresh {
            s.last_code = event.code;
            s.last_timestamp = event.timestamp;
        }
        fresh
    }

    pub fn state(&self) -> &DebounceState {
        &self.state
    }
}
