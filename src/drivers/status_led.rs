//! Single-colour status LED on a digital output.
//!
//! Generic over any `embedded-hal` [`OutputPin`]: an `esp-idf-hal`
//! `PinDriver` on the device, a recording mock in tests.

use embedded_hal::digital::{Error as _, OutputPin};
use log::warn;

pub struct StatusLed<P> {
    pin: P,
    lit: bool,
}

impl<P: OutputPin> StatusLed<P> {
    /// Take ownership of the pin and drive it low.
    pub fn new(pin: P) -> Self {
        let mut led = Self { pin, lit: true };
        led.set(false);
        led
    }

    pub fn set(&mut self, on: bool) {
        let result = if on {
            self.pin.set_high()
        } else {
            self.pin.set_low()
        };
        if let Err(e) = result {
            warn!("status LED write failed: {:?}", e.kind());
        }
        self.lit = on;
    }

    pub fn is_lit(&self) -> bool {
        self.lit
    }

    /// Hand the pin back (tests, re-configuration).
    pub fn release(self) -> P {
        self.pin
    }
}
