//! CANopen sensor node firmware: main entry point.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    Adapters (outer ring)                     │
//! │                                                              │
//! │  HardwareAdapter      LogEventSink   PartitionFlash          │
//! │  (Sensor+Annunciator) (EventSink)    (FlashPort)             │
//! │  LocalObjectDictionary               MonotonicClock          │
//! │  (ObjectDictionaryPort)                                      │
//! │                                                              │
//! │  ─────────────── Port Trait Boundary ──────────────────      │
//! │                                                              │
//! │  ┌──────────────────────────────────────────────────────┐    │
//! │  │        NodeRuntime (pure logic)                      │    │
//! │  │  SensorLatch · AnnunciatorPolicy · ConfigStore       │    │
//! │  └──────────────────────────────────────────────────────┘    │
//! │                                                              │
//! │  GPIO ISRs ──▶ TriggerHandle        Console ──▶ commands     │
//! └──────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use std::io::BufRead;
use std::sync::mpsc;

use anyhow::{Result, anyhow};
use esp_idf_hal::delay::FreeRtos;
use esp_idf_hal::gpio::{InterruptType, PinDriver, Pull};
use esp_idf_hal::ledc::config::TimerConfig;
use esp_idf_hal::ledc::{LedcDriver, LedcTimerDriver};
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_hal::units::Hertz;
use log::{info, warn};

use canopen_sensor::adapters::flash::PartitionFlash;
use canopen_sensor::adapters::hardware::HardwareAdapter;
use canopen_sensor::adapters::log_sink::LogEventSink;
use canopen_sensor::adapters::object_dictionary::LocalObjectDictionary;
use canopen_sensor::adapters::time::MonotonicClock;
use canopen_sensor::app::commands;
use canopen_sensor::app::runtime::NodeRuntime;
use canopen_sensor::config::{BUS_BITRATE_KBPS, TICK_INTERVAL_MS};
use canopen_sensor::config_store::ConfigStore;
use canopen_sensor::drivers::buzzer::Buzzer;
use canopen_sensor::drivers::status_led::StatusLed;
use canopen_sensor::sensors::Sensor;

/// Label of the data partition holding the configuration record.
const CONFIG_PARTITION: &core::ffi::CStr = c"nodecfg";
/// Piezo resonance.
const BUZZER_FREQ_HZ: u32 = 2_700;
/// Console words per line, command name included.
const MAX_ARGS: usize = 4;

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;
    info!("CANopen sensor node v{}", env!("CARGO_PKG_VERSION"));

    let peripherals = Peripherals::take()?;
    let clock = MonotonicClock::new();
    let mut sink = LogEventSink::new();

    // ── 2. Configuration ──────────────────────────────────────
    let flash = PartitionFlash::find(CONFIG_PARTITION)
        .ok_or_else(|| anyhow!("config partition {:?} missing", CONFIG_PARTITION))?;
    let mut runtime = NodeRuntime::new(ConfigStore::new(flash));
    let config = runtime.load_config(&mut sink);
    info!(
        "Fieldbus: desired node id {} at {} kbit/s",
        config.bus_address, BUS_BITRATE_KBPS
    );

    // ── 3. Detector inputs (rising edge → latch) ──────────────
    let mut motion = PinDriver::input(peripherals.pins.gpio4)?;
    motion.set_pull(Pull::Down)?;
    motion.set_interrupt_type(InterruptType::PosEdge)?;
    let trigger = runtime.trigger_handle();
    // SAFETY: the callback only touches atomics and the timer register.
    unsafe {
        motion.subscribe(move || trigger.mark_triggered(Sensor::Motion, clock.now_ms()))?;
    }

    let mut vibration = PinDriver::input(peripherals.pins.gpio5)?;
    vibration.set_pull(Pull::Down)?;
    vibration.set_interrupt_type(InterruptType::PosEdge)?;
    let trigger = runtime.trigger_handle();
    // SAFETY: as above.
    unsafe {
        vibration.subscribe(move || trigger.mark_triggered(Sensor::Vibration, clock.now_ms()))?;
    }

    // ── 4. Annunciators ───────────────────────────────────────
    let led = StatusLed::new(PinDriver::output(peripherals.pins.gpio2)?);
    let buzzer_timer = LedcTimerDriver::new(
        peripherals.ledc.timer0,
        &TimerConfig::default().frequency(Hertz(BUZZER_FREQ_HZ)),
    )?;
    let buzzer = Buzzer::new(LedcDriver::new(
        peripherals.ledc.channel0,
        &buzzer_timer,
        peripherals.pins.gpio6,
    )?);

    let mut hw = HardwareAdapter::new(motion, vibration, led, buzzer);

    // ── 5. Fieldbus object dictionary ─────────────────────────
    // The protocol stack bridges this dictionary to the bus: it copies
    // 0x6001 in from RPDOs and sends 0x6000 on transmit requests.
    let mut od = LocalObjectDictionary::new();
    runtime.start(&mut od, &mut sink);
    od.set_active_node_id(Some(config.bus_address));

    // ── 6. Console reader ─────────────────────────────────────
    let (line_tx, line_rx) = mpsc::channel::<String>();
    std::thread::Builder::new()
        .name("console".into())
        .stack_size(4096)
        .spawn(move || {
            for line in std::io::stdin().lock().lines().map_while(std::result::Result::ok) {
                if line_tx.send(line).is_err() {
                    break;
                }
            }
        })?;

    info!("Entering main loop ({} ms tick)", TICK_INTERVAL_MS);

    // ── 7. Main loop ──────────────────────────────────────────
    loop {
        while let Ok(line) = line_rx.try_recv() {
            run_console_line(&mut runtime, &od, &mut sink, &line);
        }

        runtime.tick(clock.now_ms(), &mut hw, &mut od, &mut sink);

        // GPIO interrupts disarm after firing.
        let (motion, vibration) = hw.inputs_mut();
        if let Err(e) = motion.enable_interrupt().and_then(|()| vibration.enable_interrupt()) {
            warn!("re-arming sensor interrupts failed: {}", e);
        }

        FreeRtos::delay_ms(TICK_INTERVAL_MS);
    }
}

fn run_console_line(
    runtime: &mut NodeRuntime<PartitionFlash>,
    od: &LocalObjectDictionary,
    sink: &mut LogEventSink,
    line: &str,
) {
    let mut words: heapless::Vec<&str, MAX_ARGS> = heapless::Vec::new();
    for word in line.split_whitespace() {
        if words.push(word).is_err() {
            println!("Too many arguments.");
            return;
        }
    }
    let Some((name, args)) = words.split_first() else {
        return;
    };

    let mut out = String::new();
    let result = commands::execute(runtime, od, sink, name, args, &mut out);
    print!("{}", out);
    println!("[{}]", commands::exit_status(&result));
}
