//! SIGINT / SIGTERM → cooperative shutdown.
//!
//! The handler only stores into [`SHUTDOWN`]. It is installed without
//! `SA_RESTART`, so a blocked readiness wait returns `EINTR` and the loop
//! sees the flag on its next turn. Release happens on the normal stack.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};

static SHUTDOWN: AtomicBool = AtomicBool::new(false);

extern "C" fn on_termination(_sig: libc::c_int) {
    SHUTDOWN.store(true, Ordering::Release);
}

/// Install the handlers. A signal ignored at startup stays ignored (as
/// under `nohup`). Returns the signals that were hooked.
pub fn install_termination_handlers() -> io::Result<Vec<libc::c_int>> {
    let mut hooked = Vec::with_capacity(2);
    for sig in [libc::SIGINT, libc::SIGTERM] {
        if install(sig)? {
            hooked.push(sig);
        }
    }
    Ok(hooked)
}

fn install(sig: libc::c_int) -> io::Result<bool> {
    // SAFETY: all-zero is a valid sigaction; the kernel fills `old`.
    let mut old: libc::sigaction = unsafe { std::mem::zeroed() };
    // SAFETY: query only, valid out-pointer.
    if unsafe { libc::sigaction(sig, std::ptr::null(), &mut old) } != 0 {
        return Err(io::Error::last_os_error());
    }
    if old.sa_sigaction == libc::SIG_IGN {
        return Ok(false);
    }

    // SAFETY: as above.
    let mut act: libc::sigaction = unsafe { std::mem::zeroed() };
    act.sa_sigaction = on_termination as extern "C" fn(libc::c_int) as libc::sighandler_t;
    act.sa_flags = 0;
    // SAFETY: valid sigset out-pointer, then a fully initialised action.
    let ret = unsafe {
        libc::sigemptyset(&mut act.sa_mask);
        libc::sigaction(sig, &act, std::ptr::null_mut())
    };
    if ret != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(true)
}

/// The flag the dispatch loop watches.
pub fn shutdown_flag() -> &'static AtomicBool {
    &SHUTDOWN
}

pub fn shutdown_requested() -> bool {
    SHUTDOWN.load(Ordering::Acquire)
}
