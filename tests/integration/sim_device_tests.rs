//! Real adapters on the host simulation: a FIFO stands in for the receiver
//! and the GPIO controller is the in-memory bank.

#![cfg(not(target_os = "freebsd"))]

use std::ffi::CString;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use rcgpiod::adapters::gpio::GpioController;
use rcgpiod::adapters::hardware::HardwareAdapter;
use rcgpiod::adapters::log_sink::LogEventSink;
use rcgpiod::adapters::rcrecv::{RcRecvDevice, encode_record};
use rcgpiod::app::events::ReceivedEvent;
use rcgpiod::app::mapping::{CodeMapping, PinAction};
use rcgpiod::app::service::Dispatcher;
use rcgpiod::lifecycle::DaemonContext;

struct Fifo(PathBuf);

impl Fifo {
    fn new(tag: &str) -> Self {
        let path = std::env::temp_dir().join(format!("rcgpiod-it-{}-{}.fifo", tag, std::process::id()));
        let _ = std::fs::remove_file(&path);
        let c = CString::new(path.as_os_str().as_encoded_bytes()).unwrap();
        assert_eq!(unsafe { libc::mkfifo(c.as_ptr(), 0o600) }, 0);
        Self(path)
    }
}

impl Drop for Fifo {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.0);
    }
}

#[test]
fn fifo_codes_drive_simulated_pins() {
    let fifo = Fifo::new("e2e");
    let rx = RcRecvDevice::open(&fifo.0).unwrap();
    let hw = HardwareAdapter::new(GpioController::simulated(8));
    let table = [
        CodeMapping::new(0x1A2B, 5, PinAction::Set),
        CodeMapping::new(0x0C, 6, PinAction::Toggle),
    ]
    .into_iter()
    .collect();
    let dispatcher = Dispatcher::new(table, 1000, Duration::from_millis(20));
    let mut ctx = DaemonContext::new(rx, hw, LogEventSink::new(), dispatcher);

    // Nothing latched yet: the drain times out.
    assert_eq!(ctx.prime().unwrap(), None);

    let stop = Arc::new(AtomicBool::new(false));
    let writer_stop = Arc::clone(&stop);
    let path = fifo.0.clone();
    let writer = thread::spawn(move || {
        let mut w = std::fs::OpenOptions::new().write(true).open(&path).unwrap();
        for (code, ts) in [(0x1A2B, 0), (0x1A2B, 300_000), (0x0C, 400_000)] {
            w.write_all(&encode_record(&ReceivedEvent { code, timestamp: ts })).unwrap();
            thread::sleep(Duration::from_millis(30));
        }
        thread::sleep(Duration::from_millis(100));
        writer_stop.store(true, Ordering::Release);
    });

    ctx.run(&stop).unwrap();
    writer.join().unwrap();

    let stats = ctx.dispatcher().stats();
    assert_eq!(stats.received, 3);
    assert_eq!(stats.dispatched, 2);
    assert_eq!(stats.debounced, 1);
    ctx.release();
}
