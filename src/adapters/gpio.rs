//! GPIO controller access with `embedded-hal` output lines.
//!
//! ## Dual-target design
//!
//! On FreeBSD: talks to a `gpioc(4)` controller node through the
//! `GPIOSETCONFIG` / `GPIOSET` / `GPIOGET` / `GPIOTOGGLE` ioctls.
//! On other targets: drives an in-memory pin bank, so the daemon and its
//! tests run on a development host.

use std::collections::{HashMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};

use embedded_hal::digital::{ErrorType, OutputPin, StatefulOutputPin};
use log::debug;

use crate::app::mapping::PinId;
use crate::error::GpioError;

/// Pin count of the simulated bank used on non-FreeBSD hosts.
pub const SIM_PIN_COUNT: PinId = 32;

enum Backend {
    #[cfg(target_os = "freebsd")]
    Device(std::fs::File),
    Simulated(SimBank),
}

/// In-memory stand-in for a controller.
#[derive(Debug, Default)]
struct SimBank {
    pin_count: PinId,
    outputs: HashSet<PinId>,
    levels: HashMap<PinId, bool>,
}

impl SimBank {
    fn check(&self, pin: PinId) -> io::Result<()> {
        if pin >= self.pin_count {
            return Err(io::Error::from_raw_os_error(libc::EINVAL));
        }
        Ok(())
    }

    fn check_output(&self, pin: PinId) -> io::Result<()> {
        self.check(pin)?;
        if !self.outputs.contains(&pin) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("pin {pin} is not configured as an output"),
            ));
        }
        Ok(())
    }
}

/// Handle on one GPIO controller.
pub struct GpioController {
    path: PathBuf,
    backend: Option<Backend>,
}

impl GpioController {
    /// Open the controller node at `path`.
    #[cfg(target_os = "freebsd")]
    pub fn open(path: &Path) -> io::Result<Self> {
        let file = std::fs::OpenOptions::new().read(true).write(true).open(path)?;
        debug!("gpio: opened {}", path.display());
        Ok(Self {
            path: path.to_path_buf(),
            backend: Some(Backend::Device(file)),
        })
    }

    /// Simulation: `path` is only recorded, pins live in memory.
    #[cfg(not(target_os = "freebsd"))]
    pub fn open(path: &Path) -> io::Result<Self> {
        log::info!("gpio(sim): {} backed by a {}-pin in-memory bank", path.display(), SIM_PIN_COUNT);
        let mut ctrl = Self::simulated(SIM_PIN_COUNT);
        ctrl.path = path.to_path_buf();
        Ok(ctrl)
    }

    /// In-memory controller with pins `0..pin_count`.
    pub fn simulated(pin_count: PinId) -> Self {
        Self {
            path: PathBuf::from("sim"),
            backend: Some(Backend::Simulated(SimBank {
                pin_count,
                ..Default::default()
            })),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_open(&self) -> bool {
        self.backend.is_some()
    }

    fn backend(&mut self) -> Result<&mut Backend, GpioError> {
        self.backend
            .as_mut()
            .ok_or_else(|| GpioError(io::Error::new(io::ErrorKind::NotConnected, "controller closed")))
    }

    /// Configure `pin` as a push-pull output.
    pub fn configure_output(&mut self, pin: PinId) -> Result<(), GpioError> {
        match self.backend()? {
            #[cfg(target_os = "freebsd")]
            Backend::Device(file) => ioctl::set_config(file, pin, ioctl::GPIO_PIN_OUTPUT)?,
            Backend::Simulated(bank) => {
                bank.check(pin)?;
                bank.outputs.insert(pin);
            }
        }
        Ok(())
    }

    pub fn write(&mut self, pin: PinId, high: bool) -> Result<(), GpioError> {
        match self.backend()? {
            #[cfg(target_os = "freebsd")]
            Backend::Device(file) => ioctl::set(file, pin, high)?,
            Backend::Simulated(bank) => {
                bank.check_output(pin)?;
                bank.levels.insert(pin, high);
            }
        }
        Ok(())
    }

    pub fn toggle(&mut self, pin: PinId) -> Result<(), GpioError> {
        match self.backend()? {
            #[cfg(target_os = "freebsd")]
            Backend::Device(file) => ioctl::toggle(file, pin)?,
            Backend::Simulated(bank) => {
                bank.check_output(pin)?;
                let level = bank.levels.entry(pin).or_insert(false);
                *level = !*level;
            }
        }
        Ok(())
    }

    /// Current level of `pin` (`true` = high).
    pub fn read(&mut self, pin: PinId) -> Result<bool, GpioError> {
        match self.backend()? {
            #[cfg(target_os = "freebsd")]
            Backend::Device(file) => Ok(ioctl::get(file, pin)?),
            Backend::Simulated(bank) => {
                bank.check(pin)?;
                Ok(bank.levels.get(&pin).copied().unwrap_or(false))
            }
        }
    }

    /// Borrow one pin as an `embedded-hal` output line.
    pub fn line(&mut self, pin: PinId) -> GpioLine<'_> {
        GpioLine { ctrl: self, pin }
    }

    pub fn close(&mut self) {
        if self.backend.take().is_some() {
            debug!("gpio: closed {}", self.path.display());
        }
    }
}

// ── embedded-hal line ─────────────────────────────────────────

/// One controller pin behind the `embedded-hal` digital output traits.
pub struct GpioLine<'a> {
    ctrl: &'a mut GpioController,
    pin: PinId,
}

impl GpioLine<'_> {
    pub fn pin(&self) -> PinId {
        self.pin
    }
}

impl ErrorType for GpioLine<'_> {
    type Error = GpioError;
}

impl OutputPin for GpioLine<'_> {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.ctrl.write(self.pin, false)
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.ctrl.write(self.pin, true)
    }
}

impl StatefulOutputPin for GpioLine<'_> {
    fn is_set_high(&mut self) -> Result<bool, Self::Error> {
        self.ctrl.read(self.pin)
    }

    fn is_set_low(&mut self) -> Result<bool, Self::Error> {
        self.ctrl.read(self.pin).map(|high| !high)
    }

    // The controller flips the level itself; no read-modify-write.
    fn toggle(&mut self) -> Result<(), Self::Error> {
        self.ctrl.toggle(self.pin)
    }
}

// ── gpioc(4) ioctls ───────────────────────────────────────────

#[cfg(target_os = "freebsd")]
mod ioctl {
    use std::fs::File;
    use std::io;
    use std::os::fd::AsRawFd;

    use crate::app::mapping::PinId;

    pub const GPIO_PIN_OUTPUT: u32 = 0x0002;
    const GPIOMAXNAME: usize = 64;

    #[repr(C)]
    struct GpioPin {
        gp_pin: u32,
        gp_name: [libc::c_char; GPIOMAXNAME],
        gp_caps: u32,
        gp_flags: u32,
    }

    #[repr(C)]
    struct GpioReq {
        gp_pin: u32,
        gp_value: u32,
    }

    const IOCPARM_MASK: libc::c_ulong = 0x1fff;
    const IOC_OUT: libc::c_ulong = 0x4000_0000;
    const IOC_IN: libc::c_ulong = 0x8000_0000;
    const IOC_INOUT: libc::c_ulong = IOC_IN | IOC_OUT;

    const fn ioc(inout: libc::c_ulong, num: u8, len: usize) -> libc::c_ulong {
        inout | ((len as libc::c_ulong & IOCPARM_MASK) << 16) | ((b'G' as libc::c_ulong) << 8) | num as libc::c_ulong
    }

    const GPIOSETCONFIG: libc::c_ulong = ioc(IOC_IN, 2, size_of::<GpioPin>());
    const GPIOGET: libc::c_ulong = ioc(IOC_INOUT, 3, size_of::<GpioReq>());
    const GPIOSET: libc::c_ulong = ioc(IOC_IN, 4, size_of::<GpioReq>());
    const GPIOTOGGLE: libc::c_ulong = ioc(IOC_INOUT, 5, size_of::<GpioReq>());

    fn call<T>(file: &File, request: libc::c_ulong, arg: &mut T) -> io::Result<()> {
        // SAFETY: every request above encodes size_of::<T>() of the struct
        // passed with it, and `arg` is a live exclusive reference.
        let ret = unsafe { libc::ioctl(file.as_raw_fd(), request, arg as *mut T) };
        if ret < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }

    pub fn set_config(file: &File, pin: PinId, flags: u32) -> io::Result<()> {
        let mut cfg = GpioPin {
            gp_pin: pin,
            gp_name: [0; GPIOMAXNAME],
            gp_caps: 0,
            gp_flags: flags,
        };
        call(file, GPIOSETCONFIG, &mut cfg)
    }

    pub fn set(file: &File, pin: PinId, high: bool) -> io::Result<()> {
        let mut req = GpioReq {
            gp_pin: pin,
            gp_value: u32::from(high),
        };
        call(file, GPIOSET, &mut req)
    }

    pub fn toggle(file: &File, pin: PinId) -> io::Result<()> {
        let mut req = GpioReq { gp_pin: pin, gp_value: 0 };
        call(file, GPIOTOGGLE, &mut req)
    }

    pub fn get(file: &File, pin: PinId) -> io::Result<bool> {
        let mut req = GpioReq { gp_pin: pin, gp_value: 0 };
        call(file, GPIOGET, &mut req)?;
        Ok(req.gp_value != 0)
    }
}
