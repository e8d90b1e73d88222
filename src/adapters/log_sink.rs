//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (which goes to UART / USB-CDC in production).

use log::{error, info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started(state) => {
                info!("START | sensors=0b{:02b}", state.bits());
            }
            AppEvent::ControllerModeChanged { from, to } => {
                info!("MODE  | {:?} -> {:?} (0x{:02X})", from, to, to.raw());
            }
            AppEvent::SensorStateChanged(state) => {
                info!("SENSE | state=0b{:02b}", state.bits());
            }
            AppEvent::ConfigLoaded(cfg) => {
                info!(
                    "CONF  | loaded node_id={} buzzer=\"{}\" led=\"{}\"",
                    cfg.bus_address, cfg.buzzer, cfg.led
                );
            }
            AppEvent::ConfigDefaulted(cause) => {
                warn!("CONF  | defaults restored: {}", cause);
            }
            AppEvent::ConfigStored(cfg) => {
                info!("CONF  | stored node_id={}", cfg.bus_address);
            }
            AppEvent::StoreFailed(e) => {
                error!("CONF  | store failed: {}", e);
            }
            AppEvent::ConfigRestored => {
                info!("CONF  | factory defaults in memory");
            }
        }
    }
}
