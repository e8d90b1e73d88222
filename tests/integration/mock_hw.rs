//! Mock adapters for integration tests.
//!
//! Record every port call so tests can assert on the full output and
//! fieldbus history without touching real GPIO/PWM registers.

use canopen_sensor::adapters::flash::SimFlashPage;
use canopen_sensor::app::events::AppEvent;
use canopen_sensor::app::ports::{AnnunciatorPort, EventSink, ObjectDictionaryPort, SensorPort};
use canopen_sensor::app::runtime::NodeRuntime;
use canopen_sensor::config::{OD_CONTROLLER_MODE, OD_SENSOR_STATE};
use canopen_sensor::config_store::ConfigStore;
use canopen_sensor::sensors::Sensor;
use std::collections::HashMap;

// ── Annunciator call record ───────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnunciatorCall {
    SetLed(bool),
    StartBuzzer,
    StopBuzzer,
}

// ── MockHardware ──────────────────────────────────────────────

#[derive(Default)]
pub struct MockHardware {
    pub calls: Vec<AnnunciatorCall>,
    pub motion_line: bool,
    pub vibration_line: bool,
}

#[allow(dead_code)]
impl MockHardware {
    pub fn new() -> Self {
        Self::default()
    }

    /// Level the LED was last driven to.
    pub fn led_on(&self) -> bool {
        self.calls
            .iter()
            .rev()
            .find_map(|c| match c {
                AnnunciatorCall::SetLed(on) => Some(*on),
                _ => None,
            })
            .unwrap_or(false)
    }

    pub fn buzzer_on(&self) -> bool {
        self.calls
            .iter()
            .rev()
            .find_map(|c| match c {
                AnnunciatorCall::StartBuzzer => Some(true),
                AnnunciatorCall::StopBuzzer => Some(false),
                AnnunciatorCall::SetLed(_) => None,
            })
            .unwrap_or(false)
    }

    pub fn count(&self, call: AnnunciatorCall) -> usize {
        self.calls.iter().filter(|c| **c == call).count()
    }
}

impl SensorPort for MockHardware {
    fn line_active(&mut self, sensor: Sensor) -> bool {
        match sensor {
            Sensor::Motion => self.motion_line,
            Sensor::Vibration => self.vibration_line,
        }
    }
}

impl AnnunciatorPort for MockHardware {
    fn set_led(&mut self, on: bool) {
        self.calls.push(AnnunciatorCall::SetLed(on));
    }

    fn start_buzzer(&mut self) {
        self.calls.push(AnnunciatorCall::StartBuzzer);
    }

    fn stop_buzzer(&mut self) {
        self.calls.push(AnnunciatorCall::StopBuzzer);
    }
}

// ── MockObjectDictionary ─────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OdCall {
    Set { index: u16, value: u8 },
    Transmit,
}

#[derive(Default)]
pub struct MockObjectDictionary {
    pub entries: HashMap<u16, u8>,
    pub calls: Vec<OdCall>,
    pub active_node_id: Option<u8>,
}

#[allow(dead_code)]
impl MockObjectDictionary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Controller peer writes its mode.
    pub fn set_controller_mode(&mut self, raw: u8) {
        self.entries.insert(OD_CONTROLLER_MODE, raw);
    }

    /// Value last published at `0x6000`.
    pub fn sensor_state(&self) -> u8 {
        self.get(OD_SENSOR_STATE)
    }

    pub fn transmits(&self) -> usize {
        self.calls.iter().filter(|c| **c == OdCall::Transmit).count()
    }
}

impl ObjectDictionaryPort for MockObjectDictionary {
    fn get(&self, index: u16) -> u8 {
        self.entries.get(&index).copied().unwrap_or(0)
    }

    fn set(&mut self, index: u16, value: u8) {
        self.entries.insert(index, value);
        self.calls.push(OdCall::Set { index, value });
    }

    fn request_transmit(&mut self) {
        self.calls.push(OdCall::Transmit);
    }

    fn active_node_id(&self) -> Option<u8> {
        self.active_node_id
    }
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(*event);
    }
}

// ── Fixture ───────────────────────────────────────────────────

pub struct Node {
    pub runtime: NodeRuntime<SimFlashPage>,
    pub hw: MockHardware,
    pub od: MockObjectDictionary,
    pub sink: RecordingSink,
}

#[allow(dead_code)]
impl Node {
    /// Runtime over `flash`, configuration loaded and started.
    pub fn boot(flash: SimFlashPage) -> Self {
        let mut node = Self {
            runtime: NodeRuntime::new(ConfigStore::new(flash)),
            hw: MockHardware::new(),
            od: MockObjectDictionary::new(),
            sink: RecordingSink::new(),
        };
        node.runtime.load_config(&mut node.sink);
        node.runtime.start(&mut node.od, &mut node.sink);
        node.od.calls.clear();
        node.sink.events.clear();
        node
    }

    pub fn tick(&mut self, now_ms: u32) {
        self.runtime
            .tick(now_ms, &mut self.hw, &mut self.od, &mut self.sink);
    }

    /// Tick every 10 ms over `[from, to]`.
    pub fn run(&mut self, from: u32, to: u32) {
        for now in (from..=to).step_by(10) {
            self.tick(now);
        }
    }

    pub fn command(&mut self, line: &str) -> (Result<(), canopen_sensor::error::CommandError>, String) {
        let words: Vec<&str> = line.split_whitespace().collect();
        let mut out = String::new();
        let result = canopen_sensor::app::commands::execute(
            &mut self.runtime,
            &self.od,
            &mut self.sink,
            words[0],
            &words[1..],
            &mut out,
        );
        (result, out)
    }
}
