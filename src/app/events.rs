//! Outbound application events.
//!
//! The [`NodeRuntime`](super::runtime::NodeRuntime) emits these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other side
//! decide what to do with them.

use crate::config::{ControllerMode, NodeConfig};
use crate::error::{StoreError, ValidationError};
use crate::sensors::SensorState;

/// Structured events emitted by the application core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEvent {
    /// The runtime has started and published its initial state.
    Started(SensorState),

    /// The controller peer wrote a new mode.
    ControllerModeChanged {
        from: ControllerMode,
        to: ControllerMode,
    },

    /// The combined sensor state changed and was handed to the bus.
    SensorStateChanged(SensorState),

    /// A valid configuration was read from flash.
    ConfigLoaded(NodeConfig),

    /// The persisted configuration was invalid; the factory default replaced
    /// it.
    ConfigDefaulted(ValidationError),

    ConfigStored(NodeConfig),

    StoreFailed(StoreError),

    /// The in-memory configuration was reset to the factory default.
    ConfigRestored,
}
