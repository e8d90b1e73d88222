//! Node configuration and tuning constants
//!
//! [`NodeConfig`] is the record persisted in the reserved flash page: the
//! CANopen node id plus the buzzer and LED behaviour profiles.  Its on-flash
//! form is [`ConfigRecord`], exactly one 64-bit program word.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::drivers::blink::BlinkProfile;
use crate::error::ValidationError;

// ---------------------------------------------------------------------------
// Timing
// ---------------------------------------------------------------------------

/// Minimum time a latched detection stays visible before it may auto-clear.
pub const SENSOR_RESET_TIMEOUT_MS: u32 = 5000;
/// Period the main loop calls `NodeRuntime::tick` at.
pub const TICK_INTERVAL_MS: u32 = 10;

/// LED while the controller is armed: 100 ms flash every 2 s.
pub const LED_ARMED_BLINK: BlinkProfile = BlinkProfile::new(100, 2000);
/// Buzzer during an alarm: 100 ms beep every 0.5 s.
pub const BUZZER_ALARM_BLINK: BlinkProfile = BlinkProfile::new(100, 500);
/// Buzzer during the entry/exit tempo: 100 ms beep every 2 s.
pub const BUZZER_TEMPO_BLINK: BlinkProfile = BlinkProfile::new(100, 2000);

// ---------------------------------------------------------------------------
// Fieldbus
// ---------------------------------------------------------------------------

/// Node id 1 belongs to the controller, so sensor nodes start at 2.
pub const NODE_ID_MIN: u8 = 2;
pub const NODE_ID_MAX: u8 = 127;
pub const DEFAULT_NODE_ID: u8 = NODE_ID_MIN;

/// CAN bitrate handed to the protocol stack at init.
pub const BUS_BITRATE_KBPS: u16 = 250;

/// Object dictionary entry carrying the combined sensor state (TPDO 0).
pub const OD_SENSOR_STATE: u16 = 0x6000;
/// Object dictionary entry written by the controller with its mode.
pub const OD_CONTROLLER_MODE: u16 = 0x6001;

// ---------------------------------------------------------------------------
// Flash record layout
// ---------------------------------------------------------------------------

/// Flash program granularity.
pub const FLASH_WORD_SIZE: usize = 8;
/// Size of [`ConfigRecord`] once encoded.
pub const CONFIG_RECORD_SIZE: usize = 8;
/// Program words occupied by the record.
pub const CONFIG_WORDS: usize = CONFIG_RECORD_SIZE / FLASH_WORD_SIZE;

// ---------------------------------------------------------------------------
// Profiles
// ---------------------------------------------------------------------------

/// Buzzer behaviour.  Persisted as a 2-bit mask: bit 0 = tempo, bit 1 = alarm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BuzzerProfile {
    pub beep_on_tempo: bool,
    pub beep_on_alarm: bool,
}

impl BuzzerProfile {
    pub const DISABLED: Self = Self {
        beep_on_tempo: false,
        beep_on_alarm: false,
    };
    pub const MAX_BITS: u8 = 0b11;

    const TEMPO: u8 = 0b01;
    const ALARM: u8 = 0b10;

    /// Decode the persisted mask.  `None` for anything above [`Self::MAX_BITS`].
    pub const fn from_bits(bits: u8) -> Option<Self> {
        if bits > Self::MAX_BITS {
            return None;
        }
        Some(Self {
            beep_on_tempo: bits & Self::TEMPO != 0,
            beep_on_alarm: bits & Self::ALARM != 0,
        })
    }

    pub const fn bits(self) -> u8 {
        let mut bits = 0;
        if self.beep_on_tempo {
            bits |= Self::TEMPO;
        }
        if self.beep_on_alarm {
            bits |= Self::ALARM;
        }
        bits
    }
}

impl fmt::Display for BuzzerProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.beep_on_tempo, self.beep_on_alarm) {
            (false, false) => write!(f, "Disabled"),
            (true, false) => write!(f, "Beep on TEMPO"),
            (false, true) => write!(f, "Beep on ALARM"),
            (true, true) => write!(f, "Beep on TEMPO or ALARM"),
        }
    }
}

/// Status LED behaviour.  Persisted as a 2-bit mask: bit 0 = solid on
/// detection, bit 1 = blink while armed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LedProfile {
    pub on_detection: bool,
    pub blink_on_armed: bool,
}

impl LedProfile {
    pub const DISABLED: Self = Self {
        on_detection: false,
        blink_on_armed: false,
    };
    pub const MAX_BITS: u8 = 0b11;

    const DETECTION: u8 = 0b01;
    const ARMED: u8 = 0b10;

    pub const fn from_bits(bits: u8) -> Option<Self> {
        if bits > Self::MAX_BITS {
            return None;
        }
        Some(Self {
            on_detection: bits & Self::DETECTION != 0,
            blink_on_armed: bits & Self::ARMED != 0,
        })
    }

    pub const fn bits(self) -> u8 {
        let mut bits = 0;
        if self.on_detection {
            bits |= Self::DETECTION;
        }
        if self.blink_on_armed {
            bits |= Self::ARMED;
        }
        bits
    }
}

impl fmt::Display for LedProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.on_detection, self.blink_on_armed) {
            (false, false) => write!(f, "Disabled"),
            (true, false) => write!(f, "On during detection"),
            (false, true) => write!(f, "Blink when armed"),
            (true, true) => write!(f, "On during detection, blink when armed"),
        }
    }
}

// ---------------------------------------------------------------------------
// Controller mode
// ---------------------------------------------------------------------------

/// Mode published by the controller peer at [`OD_CONTROLLER_MODE`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ControllerMode {
    #[default]
    Idle,
    Armed,
    Tempo,
    Alarm,
    /// A value this firmware does not know.  Counts as "not idle".
    Unknown(u8),
}

impl ControllerMode {
    pub const fn from_raw(raw: u8) -> Self {
        match raw {
            0 => Self::Idle,
            1 => Self::Armed,
            2 => Self::Tempo,
            3 => Self::Alarm,
            other => Self::Unknown(other),
        }
    }

    pub const fn raw(self) -> u8 {
        match self {
            Self::Idle => 0,
            Self::Armed => 1,
            Self::Tempo => 2,
            Self::Alarm => 3,
            Self::Unknown(raw) => raw,
        }
    }

    pub const fn is_idle(self) -> bool {
        matches!(self, Self::Idle)
    }
}

// ---------------------------------------------------------------------------
// NodeConfig
// ---------------------------------------------------------------------------

/// The live configuration.  Profiles are always well-formed by
/// construction; only the node id can be out of range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeConfig {
    /// Desired CANopen node id.
    pub bus_address: u8,
    pub buzzer: BuzzerProfile,
    pub led: LedProfile,
}

impl NodeConfig {
    pub const FACTORY_DEFAULT: Self = Self {
        bus_address: DEFAULT_NODE_ID,
        buzzer: BuzzerProfile::DISABLED,
        led: LedProfile::DISABLED,
    };

    pub fn is_valid(&self) -> bool {
        is_valid_node_id(self.bus_address)
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self::FACTORY_DEFAULT
    }
}

pub const fn is_valid_node_id(id: u8) -> bool {
    id >= NODE_ID_MIN && id <= NODE_ID_MAX
}

// ---------------------------------------------------------------------------
// ConfigRecord (flash layout)
// ---------------------------------------------------------------------------

/// Raw record as stored in flash.  Fields are plain bytes so that whatever
/// the page holds (erased, corrupt, written by older firmware) can be
/// decoded and then range-checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigRecord {
    pub bus_address: u8,
    pub buzzer_profile: u8,
    pub led_profile: u8,
    pub reserved: [u8; 5],
}

impl ConfigRecord {
    /// Pack into program words, little-endian byte order within each word.
    pub fn to_words(&self) -> Result<[u64; CONFIG_WORDS], postcard::Error> {
        let mut bytes = [0u8; CONFIG_RECORD_SIZE];
        postcard::to_slice(self, &mut bytes)?;

        let mut words = [0u64; CONFIG_WORDS];
        for (word, chunk) in words.iter_mut().zip(bytes.chunks_exact(FLASH_WORD_SIZE)) {
            let mut le = [0u8; FLASH_WORD_SIZE];
            le.copy_from_slice(chunk);
            *word = u64::from_le_bytes(le);
        }
        Ok(words)
    }

    pub fn from_words(words: &[u64; CONFIG_WORDS]) -> Result<Self, postcard::Error> {
        let mut bytes = [0u8; CONFIG_RECORD_SIZE];
        for (chunk, word) in bytes.chunks_exact_mut(FLASH_WORD_SIZE).zip(words) {
            chunk.copy_from_slice(&word.to_le_bytes());
        }
        postcard::from_bytes(&bytes)
    }

    /// Range-check every field and lift into a [`NodeConfig`].
    pub fn validate(&self) -> Result<NodeConfig, ValidationError> {
        if !is_valid_node_id(self.bus_address) {
            return Err(ValidationError::BusAddressOutOfRange(self.bus_address));
        }
        let buzzer = BuzzerProfile::from_bits(self.buzzer_profile)
            .ok_or(ValidationError::BuzzerProfileOutOfRange(self.buzzer_profile))?;
        let led = LedProfile::from_bits(self.led_profile)
            .ok_or(ValidationError::LedProfileOutOfRange(self.led_profile))?;
        Ok(NodeConfig {
            bus_address: self.bus_address,
            buzzer,
            led,
        })
    }
}

impl From<NodeConfig> for ConfigRecord {
    fn from(cfg: NodeConfig) -> Self {
        Self {
            bus_address: cfg.bus_address,
            buzzer_profile: cfg.buzzer.bits(),
            led_profile: cfg.led.bits(),
            reserved: [0; 5],
        }
    }
}
