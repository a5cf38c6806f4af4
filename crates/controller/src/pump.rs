//! Pump relay driver. The `gpio` feature gates the real rppal pin; without
//! it a mock tracks state in memory so the controller runs on a dev machine.
//!
//! The driver owns write idempotence: `set` performs a hardware write and
//! reports an edge only when the requested state differs from the current
//! one, so repeated identical commands cause neither relay wear nor log spam.

use anyhow::Result;

#[cfg(feature = "gpio")]
use rppal::gpio::{Gpio, OutputPin};

// ---------------------------------------------------------------------------
// Real relay pin (production — requires rppal + Raspberry Pi hardware)
// ---------------------------------------------------------------------------

#[cfg(feature = "gpio")]
pub struct Pump {
    pin: OutputPin,
    active_low: bool,
    on: bool,
}

#[cfg(feature = "gpio")]
impl Pump {
    pub fn new(pin_num: u8, active_low: bool) -> Result<Self> {
        let gpio = Gpio::new()?;
        let mut pin = gpio.get(pin_num)?.into_output();

        // Fail-safe: relay OFF before the control loop starts.
        if active_low {
            pin.set_high();
        } else {
            pin.set_low();
        }

        tracing::info!(pin = pin_num, active_low, "pump relay initialised (OFF)");

        Ok(Self {
            pin,
            active_low,
            on: false,
        })
    }

    /// Drive the relay to `on`. Returns true when this call produced an
    /// actual edge; a request matching the current state writes nothing.
    pub fn set(&mut self, on: bool) -> bool {
        if self.on == on {
            return false;
        }
        // active-low relay: LOW = ON, HIGH = OFF
        if on != self.active_low {
            self.pin.set_high();
        } else {
            self.pin.set_low();
        }
        self.on = on;
        tracing::info!(pump = if on { "ON" } else { "OFF" }, "pump state changed");
        true
    }

    pub fn is_on(&self) -> bool {
        self.on
    }
}

// ---------------------------------------------------------------------------
// Mock relay (development — no hardware)
// ---------------------------------------------------------------------------

#[cfg(not(feature = "gpio"))]
pub struct Pump {
    on: bool,
    /// Hardware writes performed; exposed so tests can assert idempotence.
    pub(crate) writes: u32,
}

#[cfg(not(feature = "gpio"))]
impl Pump {
    pub fn new(pin_num: u8, active_low: bool) -> Result<Self> {
        tracing::info!(
            pin = pin_num,
            active_low,
            "[mock-gpio] pump relay initialised (not wired)"
        );
        Ok(Self { on: false, writes: 0 })
    }

    pub fn set(&mut self, on: bool) -> bool {
        if self.on == on {
            return false;
        }
        self.on = on;
        self.writes += 1;
        tracing::info!(
            pump = if on { "ON" } else { "OFF" },
            "[mock-gpio] pump state changed"
        );
        true
    }

    pub fn is_on(&self) -> bool {
        self.on
    }
}

// ===========================================================================
// Tests
// ===========================================================================
