//! Detach from the controlling session.

use std::io;

/// `daemon(0, 0)`: fork, start a new session, chdir to `/` and point the
/// standard streams at `/dev/null`. Only the child returns.
///
/// Kqueues do not survive the fork; re-arm the receiver afterwards.
pub fn detach() -> io::Result<()> {
    // SAFETY: called from the single-threaded startup path before the
    // dispatch loop, so no other thread is lost across the fork.
    if unsafe { libc::daemon(0, 0) } != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}
