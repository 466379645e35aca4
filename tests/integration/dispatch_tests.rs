//! Dispatcher end-to-end: receiver wakeup → lookup → debounce → actuator →
//! audit, driven through `Dispatcher::run` with scripted adapters.

use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

use rcgpiod::app::events::AppEvent;
use rcgpiod::app::mapping::{CodeMapping, MappingTable, PinAction};
use rcgpiod::app::service::Dispatcher;
use rcgpiod::error::{Error, ReceiverError};

use crate::mock_hw::{MockActuator, MockReceiver, RecordingSink, Step};

fn dispatcher(mappings: &[CodeMapping]) -> Dispatcher {
    Dispatcher::new(mappings.iter().copied().collect::<MappingTable>(), 1000, Duration::from_millis(10))
}

fn run_script(d: &mut Dispatcher, script: Vec<Step>, hw: &mut MockActuator) -> RecordingSink {
    let stop = Arc::new(AtomicBool::new(false));
    let mut rx = MockReceiver::new(script).stop_when_done(&stop);
    rx.rearms = 1;
    let mut sink = RecordingSink::new();
    d.run(&mut rx, hw, &mut sink, &stop).unwrap();
    sink
}

// ── Repeat suppression ────────────────────────────────────────

#[test]
fn repeat_inside_interval_is_suppressed() {
    let mut d = dispatcher(&[CodeMapping::new(0x1A2B, 5, PinAction::Set)]);
    let mut hw = MockActuator::new();

    let sink = run_script(&mut d, vec![Step::Code(0x1A2B, 0), Step::Code(0x1A2B, 500_000)], &mut hw);

    assert_eq!(hw.applied, vec![(5, PinAction::Set)]);
    assert!(hw.level(5));
    assert_eq!(sink.audit_lines(), vec!["0x1A2B S 5"]);
    assert_eq!(d.stats().debounced, 1);
}

#[test]
fn repeat_after_interval_is_redriven() {
    let mut d = dispatcher(&[CodeMapping::new(0x1A2B, 5, PinAction::Set)]);
    let mut hw = MockActuator::new();

    let sink = run_script(&mut d, vec![Step::Code(0x1A2B, 0), Step::Code(0x1A2B, 1_200_000)], &mut hw);

    assert_eq!(hw.applied.len(), 2);
    assert_eq!(sink.audit_lines(), vec!["0x1A2B S 5", "0x1A2B S 5"]);
}

#[test]
fn unmapped_code_leaves_everything_untouched() {
    let mut d = dispatcher(&[CodeMapping::new(0x1A2B, 5, PinAction::Set)]);
    let mut hw = MockActuator::new();

    let sink = run_script(&mut d, vec![Step::Code(0x9999, 0)], &mut hw);

    assert!(hw.applied.is_empty());
    assert!(sink.audit_lines().is_empty());
    assert_eq!(d.debounce().state().last_code, 0);
    assert_eq!(d.stats().unmapped, 1);
}

#[test]
fn duplicate_code_uses_first_mapping() {
    let mut d = dispatcher(&[CodeMapping::new(5, 1, PinAction::Set), CodeMapping::new(5, 2, PinAction::Clear)]);
    let mut hw = MockActuator::new();

    run_script(&mut d, vec![Step::Code(5, 0)], &mut hw);

    assert_eq!(hw.applied, vec![(1, PinAction::Set)]);
    assert_eq!(d.table().lookup(5).unwrap().pin, 1);
}

#[test]
fn alternating_codes_are_never_debounced() {
    let mut d = dispatcher(&[
        CodeMapping::new(0xA, 1, PinAction::Toggle),
        CodeMapping::new(0xB, 2, PinAction::Toggle),
    ]);
    let mut hw = MockActuator::new();

    run_script(
        &mut d,
        vec![Step::Code(0xA, 0), Step::Code(0xB, 10), Step::Code(0xA, 20), Step::Code(0xB, 30)],
        &mut hw,
    );

    assert_eq!(hw.applied.len(), 4);
    assert!(!hw.level(1));
    assert!(!hw.level(2));
}

// ── Faults ────────────────────────────────────────────────────

#[test]
fn actuation_failure_does_not_stop_the_loop() {
    let mut d = dispatcher(&[CodeMapping::new(0x10, 7, PinAction::Set), CodeMapping::new(0x20, 3, PinAction::Set)]);
    let mut hw = MockActuator::failing_on(7);

    let sink = run_script(&mut d, vec![Step::Code(0x10, 0), Step::Code(0x20, 100)], &mut hw);

    assert_eq!(sink.failures(), 1);
    assert_eq!(sink.audit_lines(), vec!["0x20 S 3"]);
    let stats = d.stats();
    assert_eq!(stats.actuation_failures, 1);
    assert_eq!(stats.dispatched, 1);
}

#[test]
fn timeouts_interrupts_and_bad_fetches_are_skipped() {
    let mut d = dispatcher(&[CodeMapping::new(0x42, 4, PinAction::Set)]);
    let mut hw = MockActuator::new();

    run_script(
        &mut d,
        vec![Step::Timeout, Step::Interrupt, Step::Unreadable, Step::Code(0x42, 0)],
        &mut hw,
    );

    assert_eq!(hw.applied, vec![(4, PinAction::Set)]);
    assert_eq!(d.stats().unreadable, 1);
    assert_eq!(d.stats().received, 1);
}

#[test]
fn wait_failure_is_fatal_and_still_reports_stop() {
    let mut d = dispatcher(&[CodeMapping::new(0x42, 4, PinAction::Set)]);
    let stop = Arc::new(AtomicBool::new(false));
    let mut rx = MockReceiver::new([Step::Code(0x42, 0), Step::WaitFails, Step::Code(0x42, 5_000_000)]);
    rx.rearms = 1;
    let mut hw = MockActuator::new();
    let mut sink = RecordingSink::new();

    let err = d.run(&mut rx, &mut hw, &mut sink, &stop).unwrap_err();

    assert!(matches!(err, Error::Receiver(ReceiverError::Wait(_))));
    assert_eq!(hw.applied.len(), 1);
    assert_eq!(rx.remaining(), 1);
    assert!(matches!(sink.events.last(), Some(AppEvent::Stopped(s)) if s.dispatched == 1));
}

#[test]
fn raised_flag_stops_before_any_wait() {
    let mut d = dispatcher(&[]);
    let stop = AtomicBool::new(true);
    let mut rx = MockReceiver::new([Step::Code(1, 0)]);
    rx.rearms = 1;
    let mut sink = RecordingSink::new();

    d.run(&mut rx, &mut MockActuator::new(), &mut sink, &stop).unwrap();

    assert_eq!(rx.waits, 0);
    assert!(matches!(sink.events.first(), Some(AppEvent::Started { mappings: 0, interval_ms: 1000 })));
}
