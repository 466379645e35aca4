//! Hardware adapter — bridges the GPIO controller to the actuator port.
//!
//! Every [`ActuatorPort::apply`] configures the pin as an output first and
//! then drives it through its `embedded-hal` line. On non-FreeBSD targets
//! the controller is the in-memory simulation.

use embedded_hal::digital::{OutputPin, StatefulOutputPin};

use super::gpio::GpioController;
use crate::app::mapping::{PinAction, PinId};
use crate::app::ports::{ActuationError, ActuatorPort};

/// Concrete adapter that owns the GPIO controller behind [`ActuatorPort`].
pub struct HardwareAdapter {
    gpio: GpioController,
}

impl HardwareAdapter {
    pub fn new(gpio: GpioController) -> Self {
        Self { gpio }
    }

    pub fn gpio(&mut self) -> &mut GpioController {
        &mut self.gpio
    }
}

// ── ActuatorPort implementation ───────────────────────────────

impl ActuatorPort for HardwareAdapter {
    fn apply(&mut self, pin: PinId, action: PinAction) -> Result<(), ActuationError> {
        self.gpio
            .configure_output(pin)
            .map_err(|source| ActuationError::Configure { pin, source })?;

        let mut line = self.gpio.line(pin);
        let result = match action {
            PinAction::Set => line.set_high(),
            PinAction::Clear => line.set_low(),
            PinAction::Toggle => line.toggle(),
        };
        result.map_err(|source| ActuationError::Write { pin, source })
    }

    fn close(&mut self) {
        self.gpio.close();
    }
}
