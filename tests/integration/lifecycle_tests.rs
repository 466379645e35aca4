//! DaemonContext: priming, detach re-arm, and release semantics.

use std::io;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

use rcgpiod::app::events::AppEvent;
use rcgpiod::app::mapping::{CodeMapping, MappingTable, PinAction};
use rcgpiod::app::service::Dispatcher;
use rcgpiod::error::{Error, LifecycleError, PidFileError};
use rcgpiod::lifecycle::DaemonContext;
use rcgpiod::lifecycle::pidfile::PidFile;

use crate::mock_hw::{MockActuator, MockReceiver, RecordingSink, Step};

type Ctx = DaemonContext<MockReceiver, MockActuator, RecordingSink>;

fn context(rx: MockReceiver) -> Ctx {
    let table: MappingTable = [CodeMapping::new(0x1A2B, 5, PinAction::Set)].into_iter().collect();
    let dispatcher = Dispatcher::new(table, 1000, Duration::from_millis(10));
    DaemonContext::new(rx, MockActuator::new(), RecordingSink::new(), dispatcher)
}

fn pid_path(tag: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!("rcgpiod-it-{}-{}.pid", tag, std::process::id()))
}

#[test]
fn prime_arms_then_discards_latched_code() {
    let stop = Arc::new(AtomicBool::new(false));
    let rx = MockReceiver::new([Step::Code(0x1A2B, 0), Step::Code(0x1A2B, 0)]).stop_when_done(&stop);
    let mut ctx = context(rx);

    let stale = ctx.prime().unwrap();
    assert_eq!(stale.map(|e| e.code), Some(0x1A2B));
    assert_eq!(ctx.receiver().rearms, 1);
    assert!(matches!(ctx.sink().events[0], AppEvent::StaleDiscarded(_)));

    // The drained decode must not seed the repeat filter.
    ctx.run(&stop).unwrap();
    assert_eq!(ctx.actuator().applied, vec![(5, PinAction::Set)]);
}

#[test]
fn prime_with_nothing_latched() {
    let mut ctx = context(MockReceiver::new([Step::Timeout]));
    assert_eq!(ctx.prime().unwrap(), None);
    assert!(ctx.sink().events.is_empty());
}

#[test]
fn detach_rearms_unconditionally() {
    let mut ctx = context(MockReceiver::new([]));
    ctx.prime().unwrap();

    let mut detached = false;
    ctx.detach(|| {
        detached = true;
        Ok(())
    })
    .unwrap();

    assert!(detached);
    assert_eq!(ctx.receiver().rearms, 2);
}

#[test]
fn failed_detach_is_fatal_and_drops_the_lock() {
    let path = pid_path("detach-fail");
    let _ = std::fs::remove_file(&path);

    let mut ctx = context(MockReceiver::new([]));
    ctx.prime().unwrap();
    ctx.set_instance_lock(PidFile::acquire(&path).unwrap());

    let err = ctx.detach(|| Err(io::Error::from_raw_os_error(libc::EAGAIN))).unwrap_err();

    assert!(matches!(err, Error::Lifecycle(LifecycleError::Detach(_))));
    assert!(!ctx.has_instance_lock());
    assert!(!path.exists());
    assert_eq!(ctx.receiver().rearms, 1);
}

#[test]
fn detach_records_pid_in_lock() {
    let path = pid_path("detach-ok");
    let _ = std::fs::remove_file(&path);

    let mut ctx = context(MockReceiver::new([]));
    ctx.prime().unwrap();
    ctx.set_instance_lock(PidFile::acquire(&path).unwrap());
    ctx.detach(|| Ok(())).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    assert_eq!(text.trim(), std::process::id().to_string());

    ctx.release();
    assert!(!path.exists());
}

#[test]
fn second_instance_lock_is_fatal() {
    let path = pid_path("contend");
    let _ = std::fs::remove_file(&path);

    let mut first = context(MockReceiver::new([]));
    assert!(first.acquire_instance_lock(&path).unwrap());
    first.write_pid();

    let mut second = context(MockReceiver::new([]));
    let err = second.acquire_instance_lock(&path).unwrap_err();
    let pid = std::process::id() as i32;
    assert!(matches!(
        err,
        Error::Lifecycle(LifecycleError::InstanceLock(PidFileError::AlreadyRunning { pid: Some(p) })) if p == pid
    ));
    assert!(!second.has_instance_lock());
}

#[test]
fn unusable_lock_location_is_only_a_warning() {
    let mut ctx = context(MockReceiver::new([]));
    let acquired = ctx
        .acquire_instance_lock(std::path::Path::new("/nonexistent/dir/rcgpiod.pid"))
        .unwrap();
    assert!(!acquired);
    assert!(!ctx.has_instance_lock());
}

#[test]
fn release_is_idempotent() {
    let mut ctx = context(MockReceiver::new([]));
    ctx.prime().unwrap();

    ctx.release();
    ctx.release();

    assert_eq!(ctx.receiver().closes, 1);
    assert_eq!(ctx.actuator().closes, 1);
}

#[test]
fn run_after_release_fails_cleanly() {
    let stop = AtomicBool::new(false);
    let mut ctx = context(MockReceiver::new([Step::Code(0x1A2B, 0)]));
    ctx.prime().unwrap();
    ctx.release();

    assert!(ctx.run(&stop).is_err());
    assert!(ctx.actuator().applied.is_empty());
}
