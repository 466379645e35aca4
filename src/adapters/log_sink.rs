//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing dispatcher events through the `log`
//! facade, which [`crate::logging`] routes to the system log. Accepted
//! codes become the audit line `Receiving code 0x<HEX>: <A> <pin>`.

use log::{debug, info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`].
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Dispatched(r) => {
                info!("Receiving code 0x{:X}: {} {}", r.code, r.action.letter(), r.pin);
            }
            AppEvent::ActuationFailed { record, reason } => {
                warn!("Code 0x{:X}: {} {} failed: {}", record.code, record.action.letter(), record.pin, reason);
            }
            AppEvent::StaleDiscarded(ev) => {
                debug!("Discarded stale code 0x{:X} (ts={})", ev.code, ev.timestamp);
            }
            AppEvent::Started { mappings, interval_ms } => {
                info!("Dispatching {} mapping(s), repeat interval {} ms", mappings, interval_ms);
            }
            AppEvent::Stopped(s) => {
                info!(
                    "Stopped | received={} dispatched={} unmapped={} debounced={} \
                     failed={} unreadable={}",
                    s.received, s.dispatched, s.unmapped, s.debounced, s.actuation_failures, s.unreadable,
                );
            }
        }
    }
}
