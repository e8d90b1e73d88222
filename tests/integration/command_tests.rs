//! Integration tests for the console command surface.

use canopen_sensor::adapters::flash::SimFlashPage;
use canopen_sensor::app::commands::{self, COMMANDS};
use canopen_sensor::app::events::AppEvent;
use canopen_sensor::config::NodeConfig;
use canopen_sensor::error::{CommandError, FlashError, StoreError};

use crate::mock_hw::Node;

const NODE_ID_USAGE: &str = "Usage: \"set-node-id {node-id}\".\n  - node-id: (2-127).\n";

fn booted() -> Node {
    Node::boot(SimFlashPage::new())
}

// ── set-node-id ──────────────────────────────────────────────

#[test]
fn set_node_id_accepts_range_bounds() {
    let mut node = booted();
    assert_eq!(node.command("set-node-id 127").0, Ok(()));
    assert_eq!(node.runtime.config().bus_address, 127);
    assert_eq!(node.command("set-node-id 2").0, Ok(()));
    assert_eq!(node.runtime.config().bus_address, 2);
}

#[test]
fn set_node_id_out_of_range_fails_without_mutation() {
    let mut node = booted();
    node.command("set-node-id 64").0.unwrap();

    for bad in ["1", "128", "0", "999"] {
        let (result, out) = node.command(&format!("set-node-id {bad}"));
        assert_eq!(result, Err(CommandError::OutOfRange), "id {bad}");
        assert!(out.contains(NODE_ID_USAGE), "usage printed for {bad}: {out}");
        assert_eq!(node.runtime.config().bus_address, 64);
    }
}

#[test]
fn set_node_id_rejects_non_numeric_and_arity() {
    let mut node = booted();
    let (result, out) = node.command("set-node-id twelve");
    assert_eq!(result, Err(CommandError::InvalidValue));
    assert!(out.contains(NODE_ID_USAGE));

    let (result, out) = node.command("set-node-id");
    assert_eq!(result, Err(CommandError::WrongArity));
    assert!(out.contains(NODE_ID_USAGE));

    assert_eq!(node.command("set-node-id 5 6").0, Err(CommandError::WrongArity));
    assert_eq!(node.runtime.config().bus_address, 2);
    assert_eq!(commands::exit_status(&node.command("set-node-id x").0), 1);
}

// ── profiles ─────────────────────────────────────────────────

#[test]
fn set_buzzer_config_range() {
    let mut node = booted();
    assert_eq!(node.command("set-buzzer-config 3").0, Ok(()));
    let buzzer = node.runtime.config().buzzer;
    assert!(buzzer.beep_on_tempo && buzzer.beep_on_alarm);

    let (result, out) = node.command("set-buzzer-config 4");
    assert_eq!(result, Err(CommandError::OutOfRange));
    assert!(out.contains("       - 3: Beep on TEMPO or ALARM\n"));
    assert_eq!(node.runtime.config().buzzer.bits(), 3);
}

#[test]
fn set_led_config_range() {
    let mut node = booted();
    assert_eq!(node.command("set-led-config 2").0, Ok(()));
    assert!(node.runtime.config().led.blink_on_armed);
    assert!(!node.runtime.config().led.on_detection);

    let (result, out) = node.command("set-led-config -1");
    assert_eq!(result, Err(CommandError::InvalidValue));
    assert!(out.starts_with("set-led-config: invalid value\nUsage: \"set-led-config {config}\".\n  - config:\n"));
    assert_eq!(node.runtime.config().led.bits(), 2);
}

// ── restore / store / load ───────────────────────────────────

#[test]
fn restore_returns_to_factory_default() {
    let mut node = booted();
    node.command("set-node-id 99").0.unwrap();
    node.command("set-led-config 3").0.unwrap();
    assert_eq!(node.command("restore").0, Ok(()));
    assert_eq!(*node.runtime.config(), NodeConfig::FACTORY_DEFAULT);
    assert_eq!(node.sink.events.last(), Some(&AppEvent::ConfigRestored));
}

#[test]
fn stored_config_survives_reboot() {
    let mut node = booted();
    node.command("set-node-id 33").0.unwrap();
    node.command("set-buzzer-config 2").0.unwrap();
    node.command("set-led-config 1").0.unwrap();
    assert_eq!(node.command("store-config").0, Ok(()));

    let expected = *node.runtime.config();
    let rebooted = Node::boot(node.runtime.store().flash().clone());
    assert_eq!(*rebooted.runtime.config(), expected);
}

#[test]
fn load_config_discards_unsaved_edits() {
    let mut node = booted();
    node.command("set-node-id 17").0.unwrap();
    assert_eq!(node.command("load-config").0, Ok(()));
    assert_eq!(node.runtime.config().bus_address, 2);
}

#[test]
fn store_failure_is_reported_and_keeps_memory_config() {
    let mut node = booted();
    node.command("set-node-id 40").0.unwrap();
    node.runtime.store_mut().flash_mut().fail_next_erase();

    let (result, out) = node.command("store-config");
    assert_eq!(
        result,
        Err(CommandError::Store(StoreError::Erase(FlashError::EraseFailed)))
    );
    assert!(out.contains("store-config: store failed"));
    assert_eq!(node.runtime.config().bus_address, 40);

    let (_, out) = node.command("display");
    assert!(out.contains("  - Stored configuration: unknown (last store failed)\n"));
}

#[test]
fn failed_program_then_load_self_heals() {
    let mut node = booted();
    node.command("set-node-id 40").0.unwrap();
    node.runtime.store_mut().flash_mut().fail_next_program();
    assert!(node.command("store-config").0.is_err());

    assert_eq!(node.command("load-config").0, Ok(()));
    assert_eq!(*node.runtime.config(), NodeConfig::FACTORY_DEFAULT);
    let (_, out) = node.command("display");
    assert!(out.contains("  - Stored configuration: in sync\n"));
}

// ── display / help / unknown ─────────────────────────────────

#[test]
fn display_shows_parameters_and_status() {
    let mut node = booted();
    node.command("set-buzzer-config 1").0.unwrap();
    node.od.active_node_id = Some(2);

    let (result, out) = node.command("display");
    assert_eq!(result, Ok(()));
    assert_eq!(
        out,
        "-------------- Parameters --------------\n\
         \x20 - Desired NodeID: 2\n\
         \x20 - Buzzer configuration: 1 (Beep on TEMPO)\n\
         \x20 - LED configuration: 0 (Disabled)\n\
         ---------------- Status ----------------\n\
         \x20 - Active NodeID: 2\n\
         \x20 - Stored configuration: modified, not stored\n\
         ----------------------------------------\n"
    );
}

#[test]
fn display_before_stack_start() {
    let mut node = booted();
    let (_, out) = node.command("display");
    assert!(out.contains("  - Active NodeID: not started\n"));
}

#[test]
fn unknown_command_fails() {
    let mut node = booted();
    let (result, out) = node.command("reboot now");
    assert_eq!(result, Err(CommandError::UnknownCommand));
    assert!(out.contains("Unknown command \"reboot\""));
}

#[test]
fn help_lists_every_command() {
    let mut node = booted();
    let (result, out) = node.command("help");
    assert_eq!(result, Ok(()));
    for info in &COMMANDS {
        assert!(out.contains(info.name) && out.contains(info.help));
    }

    let (result, out) = node.command("help set-node-id");
    assert_eq!(result, Ok(()));
    assert!(out.contains(NODE_ID_USAGE));

    assert_eq!(node.command("help nothing").0, Err(CommandError::UnknownCommand));
}
