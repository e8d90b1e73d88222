//! Output drivers and the blink timing they share.

pub mod blink;
pub mod buzzer;
pub mod status_led;
