//! Node runtime: the application core.
//!
//! Owns every piece of mutable node state: the live configuration and its
//! store, the detection latch, the last seen controller mode and the two
//! annunciator blink generators.  The main loop calls [`NodeRuntime::tick`]
//! every [`TICK_INTERVAL_MS`](crate::config::TICK_INTERVAL_MS); GPIO
//! interrupts reach the latch only through a [`TriggerHandle`].

use std::sync::Arc;

use log::{debug, info};

use super::events::AppEvent;
use super::ports::{AnnunciatorPort, EventSink, FlashPort, ObjectDictionaryPort, SensorPort};
use crate::annunciator::{self, BuzzerDemand, LedDemand};
use crate::config::{
    BuzzerProfile, ControllerMode, LedProfile, NodeConfig, OD_CONTROLLER_MODE, OD_SENSOR_STATE,
    is_valid_node_id,
};
use crate::config_store::{ConfigStore, LoadReport};
use crate::drivers::blink::{BlinkGenerator, BlinkProfile, Phase};
use crate::error::{CommandError, StoreError};
use crate::sensors::{Sensor, SensorLatch, SensorState, TriggerHandle};

/// How the in-memory configuration relates to the flash copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistedState {
    InSync,
    /// The flash copy is valid but differs from the live configuration.
    Modified,
    /// A store failed part-way; the flash content is not known.
    Unknown,
}

pub struct NodeRuntime<F> {
    config: NodeConfig,
    store: ConfigStore<F>,
    /// Last configuration known to be in flash.
    persisted: Option<NodeConfig>,
    latch: Arc<SensorLatch>,
    controller_mode: ControllerMode,
    published_state: SensorState,
    led_blink: BlinkGenerator,
    buzzer_blink: BlinkGenerator,
}

impl<F: FlashPort> NodeRuntime<F> {
    /// Build a runtime on the factory default.  Call
    /// [`load_config`](Self::load_config) to pick up the stored one.
    pub fn new(store: ConfigStore<F>) -> Self {
        Self {
            config: NodeConfig::FACTORY_DEFAULT,
            store,
            persisted: None,
            latch: Arc::new(SensorLatch::new()),
            controller_mode: ControllerMode::Idle,
            published_state: SensorState::IDLE,
            led_blink: BlinkGenerator::new(),
            buzzer_blink: BlinkGenerator::new(),
        }
    }

    /// Handle for the GPIO interrupt handlers.
    pub fn trigger_handle(&self) -> TriggerHandle {
        TriggerHandle::new(Arc::clone(&self.latch))
    }

    /// Publish the initial sensor state.  No transmission is requested; the
    /// first TPDO goes out on the first real change.
    pub fn start(&mut self, od: &mut impl ObjectDictionaryPort, sink: &mut impl EventSink) {
        self.published_state = self.latch.state();
        od.set(OD_SENSOR_STATE, self.published_state.bits());
        info!(
            "Runtime: started, node id {} at {} kbit/s",
            self.config.bus_address,
            crate::config::BUS_BITRATE_KBPS
        );
        sink.emit(&AppEvent::Started(self.published_state));
    }

    /// Drop all latched detections and runtime state, switch both
    /// annunciators off.  The configuration is kept.
    pub fn reset(&mut self, hw: &mut impl AnnunciatorPort) {
        self.latch.clear_all();
        self.controller_mode = ControllerMode::Idle;
        self.published_state = SensorState::IDLE;
        self.led_blink.stop();
        self.buzzer_blink.stop();
        hw.set_led(false);
        hw.stop_buzzer();
        info!("Runtime: reset");
    }

    /// One pass of the main loop.
    pub fn tick(
        &mut self,
        now_ms: u32,
        hw: &mut (impl SensorPort + AnnunciatorPort),
        od: &mut impl ObjectDictionaryPort,
        sink: &mut impl EventSink,
    ) {
        // 1. Controller mode
        let mode = ControllerMode::from_raw(od.get(OD_CONTROLLER_MODE));
        if mode != self.controller_mode {
            info!("Controller state changed to: 0x{:02x}", mode.raw());
            sink.emit(&AppEvent::ControllerModeChanged {
                from: self.controller_mode,
                to: mode,
            });
            self.controller_mode = mode;
        }

        // 2. Expire old detections
        for sensor in Sensor::ALL {
            let line_active = hw.line_active(sensor);
            self.latch.update(sensor, now_ms, line_active);
        }

        // 3. Publish
        let state = self.latch.state();
        if state != self.published_state {
            debug!(
                "Sensors: 0b{:02b} -> 0b{:02b}",
                self.published_state.bits(),
                state.bits()
            );
            self.published_state = state;
            od.set(OD_SENSOR_STATE, state.bits());
            od.request_transmit();
            sink.emit(&AppEvent::SensorStateChanged(state));
        }

        // 4. Annunciators
        let plan = annunciator::evaluate(state, mode, self.config.led, self.config.buzzer);
        self.drive_led(now_ms, plan.led, hw);
        self.drive_buzzer(now_ms, plan.buzzer, hw);
    }

    fn drive_led(&mut self, now_ms: u32, demand: LedDemand, hw: &mut impl AnnunciatorPort) {
        match demand {
            LedDemand::Solid => {
                self.led_blink.stop();
                hw.set_led(true);
            }
            LedDemand::Blink(profile) => {
                if let Some(on) = step(&mut self.led_blink, now_ms, profile, "Led") {
                    hw.set_led(on);
                }
            }
            LedDemand::Off => {
                if self.led_blink.stop() {
                    debug!("Led: Stop");
                }
                hw.set_led(false);
            }
        }
    }

    fn drive_buzzer(&mut self, now_ms: u32, demand: BuzzerDemand, hw: &mut impl AnnunciatorPort) {
        match demand {
            BuzzerDemand::Blink(profile) => {
                match step(&mut self.buzzer_blink, now_ms, profile, "Buzzer") {
                    Some(true) => hw.start_buzzer(),
                    Some(false) => hw.stop_buzzer(),
                    None => {}
                }
            }
            BuzzerDemand::Silent => {
                if self.buzzer_blink.stop() {
                    debug!("Buzzer: Stop");
                    hw.stop_buzzer();
                }
            }
        }
    }

    // ── Configuration ─────────────────────────────────────────

    /// Read the configuration from flash, self-healing an invalid page.
    pub fn load_config(&mut self, sink: &mut impl EventSink) -> NodeConfig {
        let report = self.store.load_report();
        self.config = report.config();
        self.persisted = report.in_sync().then_some(self.config);
        match report {
            LoadReport::Stored(cfg) => sink.emit(&AppEvent::ConfigLoaded(cfg)),
            LoadReport::Defaulted { cause, healed } => {
                sink.emit(&AppEvent::ConfigDefaulted(cause));
                match healed {
                    Ok(()) => sink.emit(&AppEvent::ConfigStored(self.config)),
                    Err(e) => sink.emit(&AppEvent::StoreFailed(e)),
                }
            }
        }
        self.config
    }

    /// Write the live configuration to flash.
    pub fn store_config(&mut self, sink: &mut impl EventSink) -> Result<(), StoreError> {
        match self.store.store(&self.config) {
            Ok(()) => {
                self.persisted = Some(self.config);
                sink.emit(&AppEvent::ConfigStored(self.config));
                Ok(())
            }
            Err(e) => {
                self.persisted = None;
                sink.emit(&AppEvent::StoreFailed(e));
                Err(e)
            }
        }
    }

    pub fn restore_defaults(&mut self, sink: &mut impl EventSink) {
        self.config = NodeConfig::FACTORY_DEFAULT;
        sink.emit(&AppEvent::ConfigRestored);
    }

    /// Change the desired node id.  Takes effect at the next stack start.
    pub fn set_node_id(&mut self, id: u8) -> Result<(), CommandError> {
        if !is_valid_node_id(id) {
            return Err(CommandError::OutOfRange);
        }
        self.config.bus_address = id;
        Ok(())
    }

    pub fn set_buzzer_profile(&mut self, profile: BuzzerProfile) {
        self.config.buzzer = profile;
    }

    pub fn set_led_profile(&mut self, profile: LedProfile) {
        self.config.led = profile;
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    pub fn persisted_state(&self) -> PersistedState {
        match self.persisted {
            Some(cfg) if cfg == self.config => PersistedState::InSync,
            Some(_) => PersistedState::Modified,
            None => PersistedState::Unknown,
        }
    }

    pub fn controller_mode(&self) -> ControllerMode {
        self.controller_mode
    }

    /// State last handed to the object dictionary.
    pub fn published_state(&self) -> SensorState {
        self.published_state
    }

    pub fn latch(&self) -> &SensorLatch {
        &self.latch
    }

    pub fn led_blink(&self) -> &BlinkGenerator {
        &self.led_blink
    }

    pub fn buzzer_blink(&self) -> &BlinkGenerator {
        &self.buzzer_blink
    }

    pub fn store(&self) -> &ConfigStore<F> {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut ConfigStore<F> {
        &mut self.store
    }
}

/// Advance `blink` and return the level to drive, if it changed.
fn step(blink: &mut BlinkGenerator, now_ms: u32, profile: BlinkProfile, name: &str) -> Option<bool> {
    let step = blink.advance(now_ms, profile);
    if !step.changed {
        return None;
    }
    let on = step.phase == Phase::High;
    if step.started {
        debug!(
            "{}: Start (HighT={}, LowT={})",
            name, profile.high_ms, profile.low_ms
        );
    } else {
        debug!("{}: Switch {}", name, if on { "ON" } else { "OFF" });
    }
    Some(on)
}
