//! CANopen motion/vibration sensor node library.
//!
//! Exposes the runtime core and its adapters for the firmware binary,
//! integration tests and fuzzing.  ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod adapters;
pub mod annunciator;
pub mod app;
pub mod config;
pub mod config_store;
pub mod drivers;
pub mod error;
pub mod sensors;
