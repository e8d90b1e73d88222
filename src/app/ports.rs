//! Port traits: the hexagonal boundary between the node runtime and the
//! outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ NodeRuntime / ConfigStore (domain)
//! ```
//!
//! The fieldbus stack, GPIO lines, annunciator outputs and the config flash
//! page are all reached through these traits, so the domain core runs
//! unchanged against the mocks in `tests/integration/mock_hw.rs`.

use crate::error::FlashError;
use crate::sensors::Sensor;

// ───────────────────────────────────────────────────────────────
// Object dictionary port (fieldbus stack ↔ domain)
// ───────────────────────────────────────────────────────────────

/// The slice of the CANopen object dictionary the node uses.  Every entry
/// is an 8-bit value at sub-index 0.
pub trait ObjectDictionaryPort {
    /// Read an entry.  Entries never written read as 0.
    fn get(&self, index: u16) -> u8;

    fn set(&mut self, index: u16, value: u8);

    /// Ask the stack to send the TPDO mapping the sensor state.
    fn request_transmit(&mut self);

    /// Node id the stack is currently running with, `None` before the stack
    /// is up.
    fn active_node_id(&self) -> Option<u8>;
}

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Synchronous line readings, used to hold a latched detection while the
/// input is still asserted.
pub trait SensorPort {
    fn line_active(&mut self, sensor: Sensor) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Annunciator port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

pub trait AnnunciatorPort {
    fn set_led(&mut self, on: bool);

    fn start_buzzer(&mut self);

    fn stop_buzzer(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Flash port (driven adapter: domain ↔ reserved config page)
// ───────────────────────────────────────────────────────────────

/// The reserved configuration page.
///
/// Erase unit is the whole page, program unit is one 64-bit word at a
/// word-aligned `offset` from the start of the page.  Erase and program are
/// only legal between [`unlock`](Self::unlock) and [`lock`](Self::lock).
pub trait FlashPort {
    fn unlock(&mut self);

    fn lock(&mut self);

    fn erase_page(&mut self) -> Result<(), FlashError>;

    fn program_word(&mut self, offset: usize, word: u64) -> Result<(), FlashError>;

    fn read_word(&self, offset: usize) -> u64;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}
