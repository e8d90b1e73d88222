//! Duty-cycle blink generator shared by the status LED and the buzzer.
//!
//! The generator only keeps time: it tells the caller when the output should
//! flip and to which level.  Durations are supplied on every [`advance`]
//! call, so one instance can follow a change of profile (tempo → alarm)
//! without being rebuilt.
//!
//! ```text
//!  start          +high           +low            +high
//!    │‾‾‾‾‾‾‾‾‾‾‾‾‾‾│_______________│‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾│____
//! ```
//!
//! [`advance`]: BlinkGenerator::advance

/// A repeating on/off pattern, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlinkProfile {
    pub high_ms: u32,
    pub low_ms: u32,
}

impl BlinkProfile {
    pub const fn new(high_ms: u32, low_ms: u32) -> Self {
        Self { high_ms, low_ms }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    High,
    Low,
}

/// Outcome of one [`BlinkGenerator::advance`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlinkStep {
    /// The generator was disabled and has just started.
    pub started: bool,
    pub phase: Phase,
    /// The output must be driven to `phase`.
    pub changed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlinkGenerator {
    enabled: bool,
    phase: Phase,
    next_transition_ms: u32,
}

impl Default for BlinkGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl BlinkGenerator {
    pub const fn new() -> Self {
        Self {
            enabled: false,
            phase: Phase::Low,
            next_transition_ms: 0,
        }
    }

    /// Move the pattern forward to `now_ms`.
    pub fn advance(&mut self, now_ms: u32, profile: BlinkProfile) -> BlinkStep {
        if !self.enabled {
            self.enabled = true;
            self.phase = Phase::High;
            self.next_transition_ms = now_ms.wrapping_add(profile.high_ms);
            return BlinkStep {
                started: true,
                phase: Phase::High,
                changed: true,
            };
        }

        if !deadline_reached(now_ms, self.next_transition_ms) {
            return BlinkStep {
                started: false,
                phase: self.phase,
                changed: false,
            };
        }

        let (phase, hold_ms) = match self.phase {
            Phase::High => (Phase::Low, profile.low_ms),
            Phase::Low => (Phase::High, profile.high_ms),
        };
        self.phase = phase;
        self.next_transition_ms = now_ms.wrapping_add(hold_ms);
        BlinkStep {
            started: false,
            phase,
            changed: true,
        }
    }

    /// Reset to the disabled state.  Returns `true` if the generator was
    /// running, i.e. the caller still has an output to switch off.
    pub fn stop(&mut self) -> bool {
        let was_enabled = self.enabled;
        *self = Self::new();
        was_enabled
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn next_transition_ms(&self) -> u32 {
        self.next_transition_ms
    }
}

/// `now` has reached `deadline` on a wrapping millisecond clock.
fn deadline_reached(now_ms: u32, deadline_ms: u32) -> bool {
    now_ms.wrapping_sub(deadline_ms) < u32::MAX / 2
}
