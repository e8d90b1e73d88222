//! Piezo buzzer on a duty-cycle (PWM) channel.
//!
//! The channel's carrier frequency is fixed at bring-up; this driver only
//! gates it: 50 % duty while sounding, fully off otherwise.

use embedded_hal::pwm::{Error as _, SetDutyCycle};
use log::warn;

const SOUNDING_DUTY_PERCENT: u8 = 50;

pub struct Buzzer<C> {
    channel: C,
    sounding: bool,
}

impl<C: SetDutyCycle> Buzzer<C> {
    /// Take ownership of the channel and silence it.
    pub fn new(channel: C) -> Self {
        let mut buzzer = Self {
            channel,
            sounding: true,
        };
        buzzer.stop();
        buzzer
    }

    pub fn start(&mut self) {
        if let Err(e) = self.channel.set_duty_cycle_percent(SOUNDING_DUTY_PERCENT) {
            warn!("buzzer start failed: {:?}", e.kind());
        }
        self.sounding = true;
    }

    pub fn stop(&mut self) {
        if let Err(e) = self.channel.set_duty_cycle_fully_off() {
            warn!("buzzer stop failed: {:?}", e.kind());
        }
        self.sounding = false;
    }

    pub fn is_sounding(&self) -> bool {
        self.sounding
    }

    pub fn release(self) -> C {
        self.channel
    }
}
