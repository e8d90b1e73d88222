//! Application core: pure domain logic, zero I/O.
//!
//! This module contains the business rules of the sensor node: detection
//! publishing, annunciator control and configuration handling.  All
//! interaction with hardware and the fieldbus happens through **port
//! traits** defined in [`ports`], keeping this layer fully testable
//! without real peripherals.

pub mod commands;
pub mod events;
pub mod ports;
pub mod runtime;
