//! Mock adapters for integration tests.
//!
//! The receiver replays a script of wakeups; the actuator records every
//! pin action and keeps the resulting levels; the sink records every
//! event. Nothing here touches a device node.

use std::collections::{HashMap, HashSet, VecDeque};
use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use rcgpiod::app::events::{AppEvent, ReceivedEvent};
use rcgpiod::app::mapping::{PinAction, PinId};
use rcgpiod::app::ports::{ActuationError, ActuatorPort, EventSink, ReceiverError, ReceiverPort, WaitOutcome};
use rcgpiod::error::GpioError;

// ── Receiver script ───────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
#[allow(dead_code)]
pub enum Step {
    /// Readiness, then this code/timestamp on fetch.
    Code(u64, i64),
    Timeout,
    /// Wait interrupted by a signal.
    Interrupt,
    /// Readiness, but the fetch fails.
    Unreadable,
    /// The wait primitive itself fails.
    WaitFails,
}

pub struct MockReceiver {
    script: VecDeque<Step>,
    pending: Option<Step>,
    /// Raised (as a termination signal would) once the script runs dry.
    stop: Option<Arc<AtomicBool>>,
    pub rearms: usize,
    pub waits: usize,
    pub closes: usize,
    pub closed: bool,
}

#[allow(dead_code)]
impl MockReceiver {
    pub fn new(script: impl IntoIterator<Item = Step>) -> Self {
        Self {
            script: script.into_iter().collect(),
            pending: None,
            stop: None,
            rearms: 0,
            waits: 0,
            closes: 0,
            closed: false,
        }
    }

    pub fn codes(codes: &[(u64, i64)]) -> Self {
        Self::new(codes.iter().map(|&(c, ts)| Step::Code(c, ts)))
    }

    pub fn stop_when_done(mut self, flag: &Arc<AtomicBool>) -> Self {
        self.stop = Some(Arc::clone(flag));
        self
    }

    pub fn remaining(&self) -> usize {
        self.script.len()
    }
}

impl ReceiverPort for MockReceiver {
    fn wait(&mut self, _timeout: Duration) -> Result<WaitOutcome, ReceiverError> {
        if self.closed {
            return Err(ReceiverError::Closed);
        }
        if self.rearms == 0 {
            return Err(ReceiverError::Wait(io::Error::new(io::ErrorKind::NotConnected, "not armed")));
        }
        self.waits += 1;
        let Some(step) = self.script.pop_front() else {
            if let Some(stop) = &self.stop {
                stop.store(true, Ordering::Release);
                return Ok(WaitOutcome::Interrupted);
            }
            return Ok(WaitOutcome::TimedOut);
        };
        match step {
            Step::Code(..) | Step::Unreadable => {
                self.pending = Some(step);
                Ok(WaitOutcome::Ready)
            }
            Step::Timeout => Ok(WaitOutcome::TimedOut),
            Step::Interrupt => Ok(WaitOutcome::Interrupted),
            Step::WaitFails => Err(ReceiverError::Wait(io::Error::from_raw_os_error(libc::EBADF))),
        }
    }

    fn fetch_last_code(&mut self) -> Result<ReceivedEvent, ReceiverError> {
        match self.pending.take() {
            Some(Step::Code(code, timestamp)) => Ok(ReceivedEvent { code, timestamp }),
            _ => Err(ReceiverError::Fetch(io::Error::from_raw_os_error(libc::EIO))),
        }
    }

    fn rearm(&mut self) -> Result<(), ReceiverError> {
        if self.closed {
            return Err(ReceiverError::Closed);
        }
        self.rearms += 1;
        Ok(())
    }

    fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.closes += 1;
        }
    }
}

// ── Actuator ──────────────────────────────────────────────────

#[derive(Default)]
pub struct MockActuator {
    pub applied: Vec<(PinId, PinAction)>,
    pub levels: HashMap<PinId, bool>,
    pub failing: HashSet<PinId>,
    pub closes: usize,
    closed: bool,
}

#[allow(dead_code)]
impl MockActuator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(pin: PinId) -> Self {
        let mut hw = Self::new();
        hw.failing.insert(pin);
        hw
    }

    pub fn level(&self, pin: PinId) -> bool {
        self.levels.get(&pin).copied().unwrap_or(false)
    }
}

impl ActuatorPort for MockActuator {
    fn apply(&mut self, pin: PinId, action: PinAction) -> Result<(), ActuationError> {
        if self.closed || self.failing.contains(&pin) {
            return Err(ActuationError::Write {
                pin,
                source: GpioError(io::Error::other("injected fault")),
            });
        }
        self.applied.push((pin, action));
        let level = self.levels.entry(pin).or_insert(false);
        *level = match action {
            PinAction::Set => true,
            PinAction::Clear => false,
            PinAction::Toggle => !*level,
        };
        Ok(())
    }

    fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.closes += 1;
        }
    }
}

// ── Sink ──────────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Audit records of successful dispatches, rendered.
    pub fn audit_lines(&self) -> Vec<String> {
        self.events
            .iter()
            .filter_map(|e| match e {
                AppEvent::Dispatched(r) => Some(r.to_string()),
                _ => None,
            })
            .collect()
    }

    pub fn failures(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, AppEvent::ActuationFailed { .. }))
            .count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}
