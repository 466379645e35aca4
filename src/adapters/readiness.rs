//! Readiness registration for the receiver descriptor.
//!
//! - **`target_os = "freebsd"`**: a kqueue with an `EVFILT_READ`,
//!   `EV_ADD | EV_CLEAR` registration on the device descriptor. A kqueue is
//!   not inherited across `fork(2)`, so after `daemon(3)` the registration
//!   must be created again with [`Readiness::rearm`].
//! - **`not(target_os = "freebsd")`**: `poll(2)` on the descriptor. There is
//!   no kernel-side registration, so `rearm` only rebinds the descriptor.
//!
//! A wait interrupted by a signal reports [`WaitOutcome::Interrupted`].

use std::io;
use std::os::fd::{AsRawFd, BorrowedFd, IntoRawFd, OwnedFd, RawFd};
#[cfg(target_os = "freebsd")]
use std::os::fd::FromRawFd;
use std::time::Duration;

use crate::app::ports::WaitOutcome;

/// A descriptor that is closed only by the process that created it.
///
/// kqueues are not copied into a `fork(2)` child, so the child must not
/// close the parent's number: it names nothing (or something unrelated).
#[cfg_attr(not(target_os = "freebsd"), allow(dead_code))]
struct ForkLocalFd {
    fd: Option<OwnedFd>,
    owner: libc::pid_t,
}

#[cfg_attr(not(target_os = "freebsd"), allow(dead_code))]
impl ForkLocalFd {
    fn new(fd: OwnedFd) -> Self {
        Self {
            fd: Some(fd),
            // SAFETY: getpid(2) cannot fail.
            owner: unsafe { libc::getpid() },
        }
    }

    fn as_raw_fd(&self) -> RawFd {
        self.fd.as_ref().map_or(-1, AsRawFd::as_raw_fd)
    }

    /// Whether the descriptor belongs to the calling process.
    fn is_local(&self) -> bool {
        // SAFETY: as above.
        self.owner == unsafe { libc::getpid() }
    }
}

impl Drop for ForkLocalFd {
    fn drop(&mut self) {
        if let Some(fd) = self.fd.take() {
            if self.is_local() {
                drop(fd);
            } else {
                // Inherited number from a pre-fork process: forget it.
                let _ = fd.into_raw_fd();
            }
        }
    }
}

pub struct Readiness {
    source: RawFd,
    #[cfg(target_os = "freebsd")]
    kq: Option<ForkLocalFd>,
    armed: bool,
}

impl Readiness {
    /// Unarmed readiness for `source`; call [`rearm`](Self::rearm) first.
    pub fn new(source: BorrowedFd<'_>) -> Self {
        Self {
            source: source.as_raw_fd(),
            #[cfg(target_os = "freebsd")]
            kq: None,
            armed: false,
        }
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// Drop any previous registration. The old kqueue is closed only if
    /// this process created it.
    pub fn disarm(&mut self) {
        #[cfg(target_os = "freebsd")]
        {
            self.kq = None;
        }
        self.armed = false;
    }

    /// Clamp to the `c_int` milliseconds `poll(2)` accepts.
    #[cfg_attr(target_os = "freebsd", allow(dead_code))]
    fn timeout_ms(timeout: Duration) -> libc::c_int {
        libc::c_int::try_from(timeout.as_millis()).unwrap_or(libc::c_int::MAX)
    }

    fn classify(ret: libc::c_int) -> io::Result<WaitOutcome> {
        if ret < 0 {
            let err = io::Error::last_os_error();
            return if err.kind() == io::ErrorKind::Interrupted {
                Ok(WaitOutcome::Interrupted)
            } else {
                Err(err)
            };
        }
        Ok(if ret > 0 { WaitOutcome::Ready } else { WaitOutcome::TimedOut })
    }
}

// ── kqueue (FreeBSD) ──────────────────────────────────────────

#[cfg(target_os = "freebsd")]
impl Readiness {
    pub fn rearm(&mut self) -> io::Result<()> {
        self.disarm();

        // SAFETY: kqueue() takes no arguments; a non-negative return is a
        // fresh descriptor we now own.
        let raw = unsafe { libc::kqueue() };
        if raw < 0 {
            return Err(io::Error::last_os_error());
        }
        // SAFETY: `raw` is a valid, exclusively owned descriptor.
        let kq = unsafe { OwnedFd::from_raw_fd(raw) };

        // SAFETY: an all-zero kevent is a valid bit pattern; the fields the
        // kernel reads are filled in below.
        let mut change: libc::kevent = unsafe { std::mem::zeroed() };
        change.ident = self.source as libc::uintptr_t;
        change.filter = libc::EVFILT_READ;
        change.flags = libc::EV_ADD | libc::EV_CLEAR;

        // SAFETY: one change entry, no event list, no timeout.
        let ret = unsafe {
            libc::kevent(kq.as_raw_fd(), &change, 1, std::ptr::null_mut(), 0, std::ptr::null())
        };
        if ret < 0 {
            return Err(io::Error::last_os_error());
        }

        self.kq = Some(ForkLocalFd::new(kq));
        self.armed = true;
        Ok(())
    }

    pub fn wait(&mut self, timeout: Duration) -> io::Result<WaitOutcome> {
        let Some(kq) = self.kq.as_ref().filter(|kq| kq.is_local()) else {
            return Err(io::Error::new(io::ErrorKind::NotConnected, "readiness not armed"));
        };
        let ts = libc::timespec {
            tv_sec: timeout.as_secs() as libc::time_t,
            tv_nsec: libc::c_long::from(timeout.subsec_nanos() as i32),
        };
        // SAFETY: as above.
        let mut triggered: libc::kevent = unsafe { std::mem::zeroed() };
        // SAFETY: no change list, room for exactly one triggered event.
        let ret = unsafe { libc::kevent(kq.as_raw_fd(), std::ptr::null(), 0, &mut triggered, 1, &ts) };
        Self::classify(ret)
    }
}

// ── poll (other unix targets) ─────────────────────────────────

#[cfg(not(target_os = "freebsd"))]
impl Readiness {
    pub fn rearm(&mut self) -> io::Result<()> {
        self.disarm();
        if self.source < 0 {
            return Err(io::Error::from_raw_os_error(libc::EBADF));
        }
        self.armed = true;
        Ok(())
    }

    pub fn wait(&mut self, timeout: Duration) -> io::Result<WaitOutcome> {
        if !self.armed {
            return Err(io::Error::new(io::ErrorKind::NotConnected, "readiness not armed"));
        }
        let mut pfd = libc::pollfd {
            fd: self.source,
            events: libc::POLLIN,
            revents: 0,
        };
        // SAFETY: a single valid pollfd on the stack.
        let ret = unsafe { libc::poll(&mut pfd, 1, Self::timeout_ms(timeout)) };
        let outcome = Self::classify(ret)?;
        if outcome == WaitOutcome::Ready && pfd.revents & libc::POLLNVAL != 0 {
            return Err(io::Error::from_raw_os_error(libc::EBADF));
        }
        Ok(outcome)
    }
}
