//! Integration tests for the NodeRuntime tick pipeline: controller mode →
//! detection latch → object dictionary → annunciators.

use canopen_sensor::adapters::flash::SimFlashPage;
use canopen_sensor::app::events::AppEvent;
use canopen_sensor::config::{
    BuzzerProfile, ConfigRecord, ControllerMode, LedProfile, NodeConfig, OD_SENSOR_STATE,
};
use canopen_sensor::sensors::{Sensor, SensorState};

use crate::mock_hw::{AnnunciatorCall, Node, OdCall};

fn flash_with(buzzer: u8, led: u8) -> SimFlashPage {
    let cfg = NodeConfig {
        bus_address: 10,
        buzzer: BuzzerProfile::from_bits(buzzer).unwrap(),
        led: LedProfile::from_bits(led).unwrap(),
    };
    SimFlashPage::with_words(&ConfigRecord::from(cfg).to_words().unwrap())
}

// ── Alarm with beep-on-alarm, LED disabled, no detections ────

#[test]
fn alarm_beeps_100_every_500_without_touching_bus_or_led() {
    let mut node = Node::boot(flash_with(0b10, 0));
    node.od.set_controller_mode(3);

    for now in (0..=3000u32).step_by(10) {
        node.tick(now);
        let expected = now % 600 < 100;
        assert_eq!(node.hw.buzzer_on(), expected, "buzzer at t={now}");
    }

    assert_eq!(node.hw.count(AnnunciatorCall::SetLed(true)), 0);
    assert!(node.od.calls.is_empty(), "no state push or transmit");
    assert_eq!(node.hw.count(AnnunciatorCall::StartBuzzer), 6);
}

#[test]
fn detection_stamped_after_the_tick_clock_is_still_published() {
    let mut node = Node::boot(flash_with(0, 0b01));
    let isr = node.runtime.trigger_handle();

    // The interrupt ran after the tick read its clock.
    isr.mark_triggered(Sensor::Motion, 1001);
    node.tick(1000);
    assert_eq!(node.od.sensor_state(), 0b01);
    assert_eq!(node.od.transmits(), 1);

    node.run(1010, 6000);
    assert_eq!(node.od.sensor_state(), 0b01, "held for the whole timeout");
    node.tick(6010);
    assert_eq!(node.od.sensor_state(), 0);
    assert_eq!(node.od.transmits(), 2);
}

#[test]
fn armed_led_flashes_100_every_2000() {
    let mut node = Node::boot(flash_with(0, 0b10));
    node.od.set_controller_mode(1);

    for now in (0..=4200u32).step_by(10) {
        node.tick(now);
        assert_eq!(node.hw.led_on(), now % 2100 < 100, "LED at t={now}");
    }
}

#[test]
fn detection_is_pushed_then_transmitted_and_auto_clears() {
    let mut node = Node::boot(flash_with(0, 0b01));
    let isr = node.runtime.trigger_handle();

    isr.mark_triggered(Sensor::Motion, 1000);
    node.tick(1000);
    assert_eq!(
        node.od.calls,
        vec![
            OdCall::Set {
                index: OD_SENSOR_STATE,
                value: 0b01
            },
            OdCall::Transmit
        ]
    );
    assert!(node.hw.led_on(), "solid LED while detected");

    node.run(1010, 6000);
    assert_eq!(node.od.transmits(), 1, "held for the whole timeout");

    node.tick(6010);
    assert_eq!(node.od.sensor_state(), 0);
    assert_eq!(node.od.transmits(), 2);
    assert!(!node.hw.led_on());
    assert_eq!(
        node.sink.events.last(),
        Some(&AppEvent::SensorStateChanged(SensorState::IDLE))
    );
}

#[test]
fn active_line_holds_detection_past_timeout() {
    let mut node = Node::boot(SimFlashPage::new());
    node.runtime
        .trigger_handle()
        .mark_triggered(Sensor::Vibration, 0);
    node.hw.vibration_line = true;

    node.run(0, 20_000);
    assert_eq!(node.runtime.published_state(), SensorState::from_bits(0b10));

    node.hw.vibration_line = false;
    node.tick(20_010);
    assert!(node.runtime.published_state().is_idle());
}

#[test]
fn both_sensors_publish_combined_state() {
    let mut node = Node::boot(SimFlashPage::new());
    let isr = node.runtime.trigger_handle();
    isr.mark_triggered(Sensor::Motion, 0);
    isr.mark_triggered(Sensor::Vibration, 0);
    node.tick(0);
    assert_eq!(node.od.sensor_state(), 0b11);
    assert_eq!(node.od.transmits(), 1);
}

#[test]
fn detection_overrides_armed_blink_and_blink_restarts_high() {
    let mut node = Node::boot(flash_with(0, 0b11));
    node.od.set_controller_mode(1);
    node.run(0, 150); // blink started, now low
    assert!(!node.hw.led_on());

    node.runtime.trigger_handle().mark_triggered(Sensor::Motion, 160);
    node.tick(160);
    assert!(node.hw.led_on());
    assert!(!node.runtime.led_blink().is_enabled());

    node.run(170, 5160);
    node.tick(5170); // detection expires, back to armed blink
    assert!(node.runtime.published_state().is_idle());
    assert!(node.hw.led_on(), "blink restarts in the high phase");
    assert!(node.runtime.led_blink().is_enabled());
}

#[test]
fn unknown_controller_mode_blinks_led_but_stays_silent() {
    let mut node = Node::boot(flash_with(0b11, 0b10));
    node.od.set_controller_mode(0x42);
    node.tick(0);
    assert_eq!(node.runtime.controller_mode(), ControllerMode::Unknown(0x42));
    assert!(node.hw.led_on());
    assert!(!node.hw.buzzer_on());
    assert_eq!(node.hw.count(AnnunciatorCall::StartBuzzer), 0);
}

#[test]
fn tempo_to_alarm_keeps_buzzer_running() {
    let mut node = Node::boot(flash_with(0b11, 0));
    node.od.set_controller_mode(2);
    node.run(0, 200);
    assert!(!node.hw.buzzer_on());

    node.od.set_controller_mode(3);
    node.run(210, 2100);
    // The tempo low phase (until 2100) is served before the alarm profile.
    assert_eq!(node.hw.count(AnnunciatorCall::StartBuzzer), 2);
    node.run(2110, 2790);
    assert_eq!(node.hw.count(AnnunciatorCall::StartBuzzer), 3);
    assert_eq!(node.hw.count(AnnunciatorCall::StopBuzzer), 2);
}

#[test]
fn mode_changes_are_emitted_as_events() {
    let mut node = Node::boot(SimFlashPage::new());
    node.od.set_controller_mode(1);
    node.tick(0);
    node.od.set_controller_mode(3);
    node.tick(10);
    assert_eq!(
        node.sink.events,
        vec![
            AppEvent::ControllerModeChanged {
                from: ControllerMode::Idle,
                to: ControllerMode::Armed
            },
            AppEvent::ControllerModeChanged {
                from: ControllerMode::Armed,
                to: ControllerMode::Alarm
            },
        ]
    );
}
