//! Motion and vibration detection latch.
//!
//! Each sensor line raises a GPIO interrupt on its rising edge.  The ISR
//! stamps the sensor's word with the time and the latched flag; the tick
//! path clears the word again once the detection is old enough and the line
//! has dropped.
//!
//! ```text
//!   ISR (TriggerHandle) ──store LATCHED|ts──▶ SensorLatch
//!   tick (NodeRuntime)  ──cas word→0───────▶ SensorLatch
//! ```
//!
//! Flag and timestamp share one `AtomicU32` per sensor (bit 31 is the flag,
//! bits 0..31 the time in ms modulo 2^31), so a re-trigger can never be
//! split from its flag by a concurrent clear.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use log::debug;

use crate::config::SENSOR_RESET_TIMEOUT_MS;

/// A detection input.  The discriminant is its bit in [`SensorState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Sensor {
    Motion = 0b01,
    Vibration = 0b10,
}

impl Sensor {
    pub const ALL: [Self; 2] = [Self::Motion, Self::Vibration];

    pub const fn mask(self) -> u8 {
        self as u8
    }

    const fn slot(self) -> usize {
        match self {
            Self::Motion => 0,
            Self::Vibration => 1,
        }
    }
}

/// Combined detection bits, as published at `0x6000`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SensorState(u8);

impl SensorState {
    pub const IDLE: Self = Self(0);

    pub const fn from_bits(bits: u8) -> Self {
        Self(bits & (Sensor::Motion.mask() | Sensor::Vibration.mask()))
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn contains(self, sensor: Sensor) -> bool {
        self.0 & sensor.mask() != 0
    }

    pub const fn is_idle(self) -> bool {
        self.0 == 0
    }
}

const LATCHED: u32 = 1 << 31;
const TIME_MASK: u32 = LATCHED - 1;
/// Elapsed times at or above this are a timestamp ahead of `now`.
const AHEAD: u32 = 1 << 30;

/// Interrupt-safe detection latch.
#[derive(Debug, Default)]
pub struct SensorLatch {
    words: [AtomicU32; 2],
}

impl SensorLatch {
    pub const fn new() -> Self {
        Self {
            words: [AtomicU32::new(0), AtomicU32::new(0)],
        }
    }

    /// Latch `sensor` as triggered at `now_ms`.  Interrupt context only;
    /// reach it through a [`TriggerHandle`].
    fn mark_triggered(&self, sensor: Sensor, now_ms: u32) {
        self.words[sensor.slot()].store(LATCHED | (now_ms & TIME_MASK), Ordering::Release);
    }

    /// Clear `sensor` if it has been latched for more than
    /// [`SENSOR_RESET_TIMEOUT_MS`] and its line is no longer active.
    /// Returns `true` if the bit was cleared.
    ///
    /// A timestamp ahead of `now_ms` (an interrupt that ran after the tick
    /// read its clock) counts as no time elapsed.
    pub fn update(&self, sensor: Sensor, now_ms: u32, line_active: bool) -> bool {
        let word = &self.words[sensor.slot()];
        let seen = word.load(Ordering::Acquire);
        if seen & LATCHED == 0 || line_active {
            return false;
        }

        let elapsed = now_ms.wrapping_sub(seen) & TIME_MASK;
        if elapsed <= SENSOR_RESET_TIMEOUT_MS || elapsed >= AHEAD {
            return false;
        }

        // A re-trigger since the load rewrote the word; keep it and look
        // again next tick.
        if word
            .compare_exchange(seen, 0, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return false;
        }
        debug!("Sensor: {:?} cleared", sensor);
        true
    }

    pub fn state(&self) -> SensorState {
        let bits = Sensor::ALL
            .iter()
            .filter(|s| self.words[s.slot()].load(Ordering::Acquire) & LATCHED != 0)
            .fold(0, |bits, s| bits | s.mask());
        SensorState(bits)
    }

    /// Timestamp of the latched detection (ms modulo 2^31), `None` if
    /// `sensor` is clear.
    pub fn triggered_at(&self, sensor: Sensor) -> Option<u32> {
        let word = self.words[sensor.slot()].load(Ordering::Acquire);
        (word & LATCHED != 0).then_some(word & TIME_MASK)
    }

    /// Drop every latched detection.  Tick context only.
    pub(crate) fn clear_all(&self) {
        for word in &self.words {
            word.store(0, Ordering::Release);
        }
    }

    /// Current raw word, for tests that interleave with the ISR.
    #[cfg(test)]
    fn raw(&self, sensor: Sensor) -> u32 {
        self.words[sensor.slot()].load(Ordering::Acquire)
    }
}

/// Set-only view of a [`SensorLatch`] for interrupt handlers.
#[derive(Debug, Clone)]
pub struct TriggerHandle(Arc<SensorLatch>);

impl TriggerHandle {
    pub(crate) fn new(latch: Arc<SensorLatch>) -> Self {
        Self(latch)
    }

    pub fn mark_triggered(&self, sensor: Sensor, now_ms: u32) {
        self.0.mark_triggered(sensor, now_ms);
    }
}
