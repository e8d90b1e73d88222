//! Console commands.
//!
//! A console line is split into a command name and its arguments by the
//! caller, parsed into a [`Command`], then applied to the
//! [`NodeRuntime`].  Output goes to any [`core::fmt::Write`]: the UART
//! console on the device, a `String` in tests.
//!
//! Failures never touch the configuration.  Commands that take an argument
//! print their usage on every failure.

use core::fmt::{self, Write};

use super::ports::{EventSink, FlashPort, ObjectDictionaryPort};
use super::runtime::{NodeRuntime, PersistedState};
use crate::config::{BuzzerProfile, LedProfile, is_valid_node_id};
use crate::error::CommandError;

/// A console command's name and texts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandInfo {
    pub name: &'static str,
    pub help: &'static str,
    pub usage: Option<&'static str>,
}

const SET_NODE_ID_USAGE: &str = "Usage: \"set-node-id {node-id}\".\n  - node-id: (2-127).\n\n";

const SET_BUZZER_CONFIG_USAGE: &str = "Usage: \"set-buzzer-config {config}\".\n\
\x20 - config:\n\
\x20      - 0: Disabled\n\
\x20      - 1: Beep on TEMPO\n\
\x20      - 2: Beep on ALARM\n\
\x20      - 3: Beep on TEMPO or ALARM\n\n";

const SET_LED_CONFIG_USAGE: &str = "Usage: \"set-led-config {config}\".\n\
\x20 - config:\n\
\x20      - 0: Disabled\n\
\x20      - 1: Blink on detection\n\
\x20      - 2: Blink when the system is armed\n\
\x20      - 3: Blink on detection or when the system is armed\n\n";

const HELP_USAGE: &str = "Usage: \"help [command]\".\n\n";

pub static COMMANDS: [CommandInfo; 8] = [
    CommandInfo {
        name: "display",
        help: "Display information about the module.",
        usage: None,
    },
    CommandInfo {
        name: "restore",
        help: "Restore the default configuration.",
        usage: None,
    },
    CommandInfo {
        name: "store-config",
        help: "Store the configuration in flash.",
        usage: None,
    },
    CommandInfo {
        name: "load-config",
        help: "Load the configuration from flash.",
        usage: None,
    },
    CommandInfo {
        name: "set-node-id",
        help: "Change the node-id value.",
        usage: Some(SET_NODE_ID_USAGE),
    },
    CommandInfo {
        name: "set-buzzer-config",
        help: "Change the buzzer configuration.",
        usage: Some(SET_BUZZER_CONFIG_USAGE),
    },
    CommandInfo {
        name: "set-led-config",
        help: "Change the LED configuration.",
        usage: Some(SET_LED_CONFIG_USAGE),
    },
    CommandInfo {
        name: "help",
        help: "List the commands, or show one command's usage.",
        usage: Some(HELP_USAGE),
    },
];

pub fn find(name: &str) -> Option<&'static CommandInfo> {
    COMMANDS.iter().find(|info| info.name == name)
}

/// A parsed, validated console command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command<'a> {
    Display,
    Restore,
    StoreConfig,
    LoadConfig,
    SetNodeId(u8),
    SetBuzzerConfig(BuzzerProfile),
    SetLedConfig(LedProfile),
    Help(Option<&'a str>),
}

impl<'a> Command<'a> {
    /// Commands without arguments ignore any that are given.
    pub fn parse(name: &str, args: &[&'a str]) -> Result<Self, CommandError> {
        match name {
            "display" => Ok(Self::Display),
            "restore" => Ok(Self::Restore),
            "store-config" => Ok(Self::StoreConfig),
            "load-config" => Ok(Self::LoadConfig),
            "set-node-id" => {
                let id = u8::try_from(single_number(args)?).map_err(|_| CommandError::OutOfRange)?;
                if !is_valid_node_id(id) {
                    return Err(CommandError::OutOfRange);
                }
                Ok(Self::SetNodeId(id))
            }
            "set-buzzer-config" => profile_bits(args)
                .and_then(|bits| BuzzerProfile::from_bits(bits).ok_or(CommandError::OutOfRange))
                .map(Self::SetBuzzerConfig),
            "set-led-config" => profile_bits(args)
                .and_then(|bits| LedProfile::from_bits(bits).ok_or(CommandError::OutOfRange))
                .map(Self::SetLedConfig),
            "help" => match args {
                [] => Ok(Self::Help(None)),
                [topic] => Ok(Self::Help(Some(*topic))),
                _ => Err(CommandError::WrongArity),
            },
            _ => Err(CommandError::UnknownCommand),
        }
    }
}

fn single_number(args: &[&str]) -> Result<u32, CommandError> {
    let [arg] = args else {
        return Err(CommandError::WrongArity);
    };
    arg.trim()
        .parse::<u32>()
        .map_err(|_| CommandError::InvalidValue)
}

fn profile_bits(args: &[&str]) -> Result<u8, CommandError> {
    u8::try_from(single_number(args)?).map_err(|_| CommandError::OutOfRange)
}

/// Parse and run one console command.
pub fn execute<F: FlashPort>(
    runtime: &mut NodeRuntime<F>,
    od: &impl ObjectDictionaryPort,
    sink: &mut impl EventSink,
    name: &str,
    args: &[&str],
    out: &mut impl Write,
) -> Result<(), CommandError> {
    let Some(info) = find(name) else {
        writeln!(out, "Unknown command \"{}\", try \"help\".", name)?;
        return Err(CommandError::UnknownCommand);
    };

    let result = Command::parse(info.name, args)
        .and_then(|command| apply(command, runtime, od, sink, out));
    if let Err(e) = result {
        writeln!(out, "{}: {}", info.name, e)?;
        describe(info, false, out)?;
    }
    result
}

/// Write the help line (optional) and usage text of `info`.
fn describe(info: &CommandInfo, with_help: bool, out: &mut impl Write) -> fmt::Result {
    if with_help {
        writeln!(out, "{}: {}", info.name, info.help)?;
    }
    match info.usage {
        Some(usage) => out.write_str(usage),
        None => Ok(()),
    }
}

/// Shell exit status: 0 on success, 1 on failure.
pub fn exit_status(result: &Result<(), CommandError>) -> u8 {
    u8::from(result.is_err())
}

fn apply<F: FlashPort>(
    command: Command<'_>,
    runtime: &mut NodeRuntime<F>,
    od: &impl ObjectDictionaryPort,
    sink: &mut impl EventSink,
    out: &mut impl Write,
) -> Result<(), CommandError> {
    match command {
        Command::Display => display(runtime, od, out)?,
        Command::Restore => runtime.restore_defaults(sink),
        Command::StoreConfig => runtime.store_config(sink)?,
        Command::LoadConfig => {
            runtime.load_config(sink);
        }
        Command::SetNodeId(id) => runtime.set_node_id(id)?,
        Command::SetBuzzerConfig(profile) => runtime.set_buzzer_profile(profile),
        Command::SetLedConfig(profile) => runtime.set_led_profile(profile),
        Command::Help(None) => {
            for info in &COMMANDS {
                writeln!(out, "  {:<18} {}", info.name, info.help)?;
            }
        }
        Command::Help(Some(topic)) => {
            let info = find(topic).ok_or(CommandError::UnknownCommand)?;
            describe(info, true, out)?;
        }
    }
    Ok(())
}

fn display<F: FlashPort>(
    runtime: &NodeRuntime<F>,
    od: &impl ObjectDictionaryPort,
    out: &mut impl Write,
) -> fmt::Result {
    let cfg = runtime.config();
    writeln!(out, "-------------- Parameters --------------")?;
    writeln!(out, "  - Desired NodeID: {}", cfg.bus_address)?;
    writeln!(out, "  - Buzzer configuration: {} ({})", cfg.buzzer.bits(), cfg.buzzer)?;
    writeln!(out, "  - LED configuration: {} ({})", cfg.led.bits(), cfg.led)?;
    writeln!(out, "---------------- Status ----------------")?;
    match od.active_node_id() {
        Some(id) => writeln!(out, "  - Active NodeID: {}", id)?,
        None => writeln!(out, "  - Active NodeID: not started")?,
    }
    let stored = match runtime.persisted_state() {
        PersistedState::InSync => "in sync",
        PersistedState::Modified => "modified, not stored",
        PersistedState::Unknown => "unknown (last store failed)",
    };
    writeln!(out, "  - Stored configuration: {}", stored)?;
    writeln!(out, "----------------------------------------")
}
