//! Hardware adapter: bridges real peripherals to domain port traits.
//!
//! Owns the two detector inputs and both annunciator drivers, exposing them
//! through [`SensorPort`] and [`AnnunciatorPort`].  Everything is generic
//! over `embedded-hal` 1.0 traits, so the same adapter wraps
//! `esp-idf-hal` drivers on the device and plain mocks on the host.

use embedded_hal::digital::{Error as _, InputPin, OutputPin};
use embedded_hal::pwm::SetDutyCycle;
use log::warn;

use crate::app::ports::{AnnunciatorPort, SensorPort};
use crate::drivers::buzzer::Buzzer;
use crate::drivers::status_led::StatusLed;
use crate::sensors::Sensor;

/// Concrete adapter that combines all hardware behind port traits.
pub struct HardwareAdapter<M, V, L, B> {
    motion: M,
    vibration: V,
    led: StatusLed<L>,
    buzzer: Buzzer<B>,
}

impl<M, V, L, B> HardwareAdapter<M, V, L, B>
where
    M: InputPin,
    V: InputPin,
    L: OutputPin,
    B: SetDutyCycle,
{
    pub fn new(motion: M, vibration: V, led: StatusLed<L>, buzzer: Buzzer<B>) -> Self {
        Self {
            motion,
            vibration,
            led,
            buzzer,
        }
    }

    /// Direct access to the detector inputs, e.g. to re-arm their
    /// interrupts.
    pub fn inputs_mut(&mut self) -> (&mut M, &mut V) {
        (&mut self.motion, &mut self.vibration)
    }

    pub fn led(&self) -> &StatusLed<L> {
        &self.led
    }

    pub fn buzzer(&self) -> &Buzzer<B> {
        &self.buzzer
    }
}

fn read_line<P: InputPin>(pin: &mut P, sensor: Sensor) -> bool {
    pin.is_high().unwrap_or_else(|e| {
        warn!("{:?} line read failed: {:?}", sensor, e.kind());
        false
    })
}

// ── SensorPort implementation ─────────────────────────────────

impl<M, V, L, B> SensorPort for HardwareAdapter<M, V, L, B>
where
    M: InputPin,
    V: InputPin,
    L: OutputPin,
    B: SetDutyCycle,
{
    fn line_active(&mut self, sensor: Sensor) -> bool {
        match sensor {
            Sensor::Motion => read_line(&mut self.motion, sensor),
            Sensor::Vibration => read_line(&mut self.vibration, sensor),
        }
    }
}

// ── AnnunciatorPort implementation ────────────────────────────

impl<M, V, L, B> AnnunciatorPort for HardwareAdapter<M, V, L, B>
where
    M: InputPin,
    V: InputPin,
    L: OutputPin,
    B: SetDutyCycle,
{
    fn set_led(&mut self, on: bool) {
        self.led.set(on);
    }

    fn start_buzzer(&mut self) {
        self.buzzer.start();
    }

    fn stop_buzzer(&mut self) {
        self.buzzer.stop();
    }
}
