//! Dispatcher — the event-driven core.
//!
//! [`Dispatcher`] owns the mapping table and the debounce filter and runs
//! the per-wakeup state machine:
//!
//! ```text
//!   AWAITING_EVENT ──Ready──▶ EVENT_FETCHED ──▶ ACCEPTED ──▶ AWAITING_EVENT
//!        ▲   │                      │
//!        └───┘ TimedOut             └──▶ REJECTED (unmapped / debounced)
//! ```
//!
//! All I/O flows through port traits injected at call sites, so the whole
//! loop is testable with mock adapters. Everything runs on one thread; the
//! only suspension point is the bounded readiness wait.

use core::sync::atomic::{AtomicBool, Ordering};
use core::time::Duration;

use log::{debug, warn};

use crate::error::Result;

use super::debounce::DebounceFilter;
use super::events::{AppEvent, AuditRecord, DispatchStats, ReceivedEvent};
use super::mapping::{CodeMapping, MappingTable};
use super::ports::{ActuatorPort, EventSink, ReceiverPort, WaitOutcome};

/// Default bound on a single readiness wait.
pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_secs(10);

/// What happened to one fetched code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// No mapping for the code; ignored silently.
    Unmapped,
    /// Mapped, but a repeat inside the debounce interval.
    Debounced,
    /// Accepted and the pin action applied.
    Dispatched(CodeMapping),
    /// Accepted, but the pin write failed.
    ActuationFailed(CodeMapping),
}

/// Result of one loop iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Iteration {
    TimedOut,
    Interrupted,
    /// Readiness reported but the fetch failed.
    Unreadable,
    Handled(DispatchOutcome),
}

pub struct Dispatcher {
    table: MappingTable,
    debounce: DebounceFilter,
    poll_timeout: Duration,
    stats: DispatchStats,
}

impl Dispatcher {
    pub fn new(table: MappingTable, interval_ms: u64, poll_timeout: Duration) -> Self {
        Self {
            table,
            debounce: DebounceFilter::new(interval_ms),
            poll_timeout,
            stats: DispatchStats::default(),
        }
    }

    // ── Startup ───────────────────────────────────────────────

    /// Discard a decode latched before the daemon attached.
    ///
    /// One bounded wait plus fetch; neither the table nor the debounce
    /// state is consulted. A failing wait is fatal, a failing fetch is not.
    pub fn drain_stale(
        &mut self,
        rx: &mut impl ReceiverPort,
        sink: &mut impl EventSink,
    ) -> Result<Option<ReceivedEvent>> {
        if rx.wait(self.poll_timeout)? != WaitOutcome::Ready {
            return Ok(None);
        }
        match rx.fetch_last_code() {
            Ok(stale) => {
                sink.emit(&AppEvent::StaleDiscarded(stale));
                Ok(Some(stale))
            }
            Err(e) => {
                warn!("Stale drain: {}", e);
                Ok(None)
            }
        }
    }

    // ── Loop ──────────────────────────────────────────────────

    /// Run until `shutdown` is raised. Returns early only on a fatal wait
    /// failure.
    pub fn run(
        &mut self,
        rx: &mut impl ReceiverPort,
        hw: &mut impl ActuatorPort,
        sink: &mut impl EventSink,
        shutdown: &AtomicBool,
    ) -> Result<()> {
        sink.emit(&AppEvent::Started {
            mappings: self.table.len(),
            interval_ms: self.debounce.state().min_interval_ms,
        });

        let result = loop {
            if shutdown.load(Ordering::Acquire) {
                break Ok(());
            }
            if let Err(e) = self.poll_once(rx, hw, sink) {
                break Err(e);
            }
        };

        sink.emit(&AppEvent::Stopped(self.stats));
        result
    }

    /// One pass: wait, fetch, dispatch.
    pub fn poll_once(
        &mut self,
        rx: &mut impl ReceiverPort,
        hw: &mut impl ActuatorPort,
        sink: &mut impl EventSink,
    ) -> Result<Iteration> {
        match rx.wait(self.poll_timeout)? {
            WaitOutcome::TimedOut => Ok(Iteration::TimedOut),
            WaitOutcome::Interrupted => Ok(Iteration::Interrupted),
            WaitOutcome::Ready => match rx.fetch_last_code() {
                Ok(event) => Ok(Iteration::Handled(self.handle_event(&event, hw, sink))),
                Err(e) => {
                    self.stats.unreadable += 1;
                    warn!("Receiver: {}", e);
                    Ok(Iteration::Unreadable)
                }
            },
        }
    }

    /// Lookup → debounce → actuate → audit, for one fetched code.
    pub fn handle_event(
        &mut self,
        event: &ReceivedEvent,
        hw: &mut impl ActuatorPort,
        sink: &mut impl EventSink,
    ) -> DispatchOutcome {
        self.stats.received += 1;

        let Some(mapping) = self.table.lookup(event.code).copied() else {
            self.stats.unmapped += 1;
            return DispatchOutcome::Unmapped;
        };

        if !self.debounce.accept(event) {
            self.stats.debounced += 1;
            debug!("Repeat of 0x{:X} suppressed", event.code);
            return DispatchOutcome::Debounced;
        }

        let record = AuditRecord::from(&mapping);
        match hw.apply(mapping.pin, mapping.action) {
            Ok(()) => {
                self.stats.dispatched += 1;
                sink.emit(&AppEvent::Dispatched(record));
                DispatchOutcome::Dispatched(mapping)
            }
            Err(e) => {
                self.stats.actuation_failures += 1;
                sink.emit(&AppEvent::ActuationFailed {
                    record,
                    reason: e.to_string(),
                });
                DispatchOutcome::ActuationFailed(mapping)
            }
        }
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn table(&self) -> &MappingTable {
        &self.table
    }

    pub fn debounce(&self) -> &DebounceFilter {
        &self.debounce
    }

    pub fn stats(&self) -> DispatchStats {
        self.stats
    }

    pub fn poll_timeout(&self) -> Duration {
        self.poll_timeout
    }
}
