//! Annunciator policy: what the status LED and buzzer should be doing.
//!
//! Pure function of the latched sensor state, the controller mode and the
//! configured profiles.  The runtime turns the resulting plan into blink
//! generator steps and port calls.

use crate::config::{
    BUZZER_ALARM_BLINK, BUZZER_TEMPO_BLINK, BuzzerProfile, ControllerMode, LED_ARMED_BLINK,
    LedProfile,
};
use crate::drivers::blink::BlinkProfile;
use crate::sensors::SensorState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedDemand {
    /// Driven high directly, the blink generator is bypassed.
    Solid,
    Blink(BlinkProfile),
    Off,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuzzerDemand {
    Blink(BlinkProfile),
    Silent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnnunciatorPlan {
    pub led: LedDemand,
    pub buzzer: BuzzerDemand,
}

pub fn evaluate(
    state: SensorState,
    mode: ControllerMode,
    led: LedProfile,
    buzzer: BuzzerProfile,
) -> AnnunciatorPlan {
    let led = if !state.is_idle() && led.on_detection {
        LedDemand::Solid
    } else if !mode.is_idle() && led.blink_on_armed {
        LedDemand::Blink(LED_ARMED_BLINK)
    } else {
        LedDemand::Off
    };

    let buzzer = match mode {
        ControllerMode::Alarm if buzzer.beep_on_alarm => BuzzerDemand::Blink(BUZZER_ALARM_BLINK),
        ControllerMode::Tempo if buzzer.beep_on_tempo => BuzzerDemand::Blink(BUZZER_TEMPO_BLINK),
        _ => BuzzerDemand::Silent,
    };

    AnnunciatorPlan { led, buzzer }
}
