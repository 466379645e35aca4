//! Remote-control receiver adapter.
//!
//! Implements [`ReceiverPort`] over an `rcrecv(4)` device node.
//!
//! ## Dual-target design
//!
//! On FreeBSD: opens the device read-only and fetches the latest decode
//! with the `RCRECV_READ_CODE_INFO` ioctl.
//! On other unix targets: opens the path read/write and non-blocking (point
//! it at a FIFO) and reads 16-byte records, a little-endian `u64` code
//! followed by a little-endian `i64` timestamp. A record split across
//! writes is reassembled; the bytes read so far are kept until the rest
//! arrives.

use std::fs::File;
use std::os::fd::AsFd;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::debug;

use super::readiness::Readiness;
use crate::app::events::ReceivedEvent;
use crate::app::ports::{ReceiverError, ReceiverPort, WaitOutcome};

/// Size of one simulated record.
pub const SIM_RECORD_LEN: usize = 16;

pub struct RcRecvDevice {
    path: PathBuf,
    // Declared before `file` so the kqueue closes first.
    readiness: Option<Readiness>,
    file: Option<File>,
    #[cfg(not(target_os = "freebsd"))]
    partial: RecordBuf,
}

/// Bytes of a simulated record received so far.
#[cfg(not(target_os = "freebsd"))]
#[derive(Debug, Default)]
struct RecordBuf {
    buf: [u8; SIM_RECORD_LEN],
    filled: usize,
}

impl RcRecvDevice {
    pub fn open(path: &Path) -> Result<Self, ReceiverError> {
        let file = Self::open_file(path).map_err(|source| ReceiverError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        debug!("rcrecv: opened {}", path.display());
        Ok(Self {
            path: path.to_path_buf(),
            readiness: Some(Readiness::new(file.as_fd())),
            file: Some(file),
            #[cfg(not(target_os = "freebsd"))]
            partial: RecordBuf::default(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    #[cfg(target_os = "freebsd")]
    fn open_file(path: &Path) -> std::io::Result<File> {
        File::open(path)
    }

    #[cfg(not(target_os = "freebsd"))]
    fn open_file(path: &Path) -> std::io::Result<File> {
        use std::os::unix::fs::OpenOptionsExt;
        std::fs::OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(libc::O_NONBLOCK)
            .open(path)
    }

    fn file(&self) -> Result<&File, ReceiverError> {
        self.file.as_ref().ok_or(ReceiverError::Closed)
    }

    #[cfg(target_os = "freebsd")]
    fn read_code(&mut self) -> Result<ReceivedEvent, ReceiverError> {
        Self::ioctl_code(self.file()?).map_err(ReceiverError::Fetch)
    }

    #[cfg(target_os = "freebsd")]
    fn ioctl_code(file: &File) -> std::io::Result<ReceivedEvent> {
        use std::os::fd::AsRawFd;
        let mut rcc = ioctl::RcRecvCode::default();
        // SAFETY: the request's size field matches `RcRecvCode`, and the
        // kernel writes at most that many bytes into it.
        let ret = unsafe { libc::ioctl(file.as_raw_fd(), ioctl::RCRECV_READ_CODE_INFO, &mut rcc) };
        if ret < 0 {
            return Err(std::io::Error::last_os_error());
        }
        Ok(ReceivedEvent {
            code: u64::from(rcc.value),
            timestamp: rcc.last_time,
        })
    }

    #[cfg(not(target_os = "freebsd"))]
    fn read_code(&mut self) -> Result<ReceivedEvent, ReceiverError> {
        use std::io::{ErrorKind, Read};

        let mut file = self.file.as_ref().ok_or(ReceiverError::Closed)?;
        let rec = &mut self.partial;
        while rec.filled < SIM_RECORD_LEN {
            match file.read(&mut rec.buf[rec.filled..]) {
                Ok(0) => return Err(ReceiverError::Fetch(ErrorKind::UnexpectedEof.into())),
                Ok(n) => rec.filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => return Err(ReceiverError::Fetch(e)),
            }
        }
        rec.filled = 0;
        Ok(decode_record(&rec.buf))
    }
}

/// Encode a simulated receiver record.
pub fn encode_record(event: &ReceivedEvent) -> [u8; SIM_RECORD_LEN] {
    let mut buf = [0u8; SIM_RECORD_LEN];
    buf[..8].copy_from_slice(&event.code.to_le_bytes());
    buf[8..].copy_from_slice(&event.timestamp.to_le_bytes());
    buf
}

/// Decode a simulated receiver record.
pub fn decode_record(buf: &[u8; SIM_RECORD_LEN]) -> ReceivedEvent {
    let mut code = [0u8; 8];
    let mut ts = [0u8; 8];
    code.copy_from_slice(&buf[..8]);
    ts.copy_from_slice(&buf[8..]);
    ReceivedEvent {
        code: u64::from_le_bytes(code),
        timestamp: i64::from_le_bytes(ts),
    }
}

impl ReceiverPort for RcRecvDevice {
    fn wait(&mut self, timeout: Duration) -> Result<WaitOutcome, ReceiverError> {
        let readiness = self.readiness.as_mut().ok_or(ReceiverError::Closed)?;
        readiness.wait(timeout).map_err(ReceiverError::Wait)
    }

    fn fetch_last_code(&mut self) -> Result<ReceivedEvent, ReceiverError> {
        self.read_code()
    }

    fn rearm(&mut self) -> Result<(), ReceiverError> {
        self.file()?;
        let readiness = self.readiness.as_mut().ok_or(ReceiverError::Closed)?;
        readiness.rearm().map_err(ReceiverError::Register)?;
        debug!("rcrecv: readiness armed on {}", self.path.display());
        Ok(())
    }

    fn close(&mut self) {
        self.readiness = None;
        if self.file.take().is_some() {
            debug!("rcrecv: closed {}", self.path.display());
        }
    }
}

#[cfg(target_os = "freebsd")]
mod ioctl {
    //! `<dev/rcrecv/rcrecv.h>` and `<sys/ioccom.h>` equivalents.

    #[repr(C)]
    #[derive(Debug, Default)]
    pub struct RcRecvCode {
        pub value: libc::c_ulong,
        pub last_time: i64,
    }

    const IOCPARM_MASK: libc::c_ulong = 0x1fff;
    const IOC_OUT: libc::c_ulong = 0x4000_0000;

    const fn ior(group: u8, num: u8, len: usize) -> libc::c_ulong {
        IOC_OUT | ((len as libc::c_ulong & IOCPARM_MASK) << 16) | ((group as libc::c_ulong) << 8) | num as libc::c_ulong
    }

    pub const RCRECV_READ_CODE_INFO: libc::c_ulong =
        ior(b'R', 2, core::mem::size_of::<RcRecvCode>());
}
