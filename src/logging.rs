//! `log` backend writing to the system log.
//!
//! Records go to `syslog(3)` (facility `LOG_DAEMON`, ident `rcgpiod`) and,
//! until [`detach_stderr`] is called, are mirrored to stderr so a
//! foreground run shows them on the terminal.

use std::ffi::CString;
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};

use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError};

struct DaemonLogger {
    syslog: AtomicBool,
    stderr: AtomicBool,
}

static LOGGER: DaemonLogger = DaemonLogger {
    syslog: AtomicBool::new(false),
    stderr: AtomicBool::new(true),
};

/// Install the logger, open the system log and set the max level.
pub fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
    log::set_logger(&LOGGER)?;
    log::set_max_level(level);
    open_syslog();
    Ok(())
}

fn open_syslog() {
    // SAFETY: the ident is a 'static C string, as openlog(3) requires.
    unsafe { libc::openlog(c"rcgpiod".as_ptr(), libc::LOG_PID | libc::LOG_NDELAY, libc::LOG_DAEMON) };
    LOGGER.syslog.store(true, Ordering::Release);
}

/// Stop mirroring records to stderr (the terminal is gone after detaching).
pub fn detach_stderr() {
    LOGGER.stderr.store(false, Ordering::Release);
}

pub fn close_syslog() {
    if LOGGER.syslog.swap(false, Ordering::AcqRel) {
        // SAFETY: closelog(3) has no preconditions.
        unsafe { libc::closelog() };
    }
}

fn syslog_priority(level: Level) -> libc::c_int {
    match level {
        Level::Error => libc::LOG_ERR,
        Level::Warn => libc::LOG_WARNING,
        Level::Info => libc::LOG_INFO,
        Level::Debug | Level::Trace => libc::LOG_DEBUG,
    }
}

/// syslog(3) takes a C string; interior NULs are dropped.
fn to_cstring(msg: &str) -> CString {
    CString::new(msg.replace('\0', "")).unwrap_or_default()
}

impl Log for DaemonLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let msg = record.args().to_string();

        if self.syslog.load(Ordering::Acquire) {
            let line = to_cstring(&msg);
            // SAFETY: constant "%s" format with one NUL-terminated argument.
            unsafe { libc::syslog(syslog_priority(record.level()), c"%s".as_ptr(), line.as_ptr()) };
        }
        if self.stderr.load(Ordering::Acquire) {
            let _ = writeln!(std::io::stderr().lock(), "{:<5} {}", record.level(), msg);
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

/// Log panics at error level, then run the previously installed hook.
pub fn install_panic_hook() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let reason = if let Some(msg) = info.payload().downcast_ref::<&str>() {
            *msg
        } else if let Some(msg) = info.payload().downcast_ref::<String>() {
            msg.as_str()
        } else {
            "unknown panic"
        };
        match info.location() {
            Some(loc) => log::error!("PANIC at {}:{}: {}", loc.file(), loc.line(), reason),
            None => log::error!("PANIC: {}", reason),
        }
        default_hook(info);
    }));
}
