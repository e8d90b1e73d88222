//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter             | Implements            | Connects to                 |
//! |---------------------|-----------------------|-----------------------------|
//! | `flash`             | FlashPort             | Data partition / sim page   |
//! | `hardware`          | SensorPort            | Detector GPIO inputs        |
//! |                     | AnnunciatorPort       | Status LED GPIO, buzzer PWM |
//! | `log_sink`          | EventSink             | Serial log output           |
//! | `object_dictionary` | ObjectDictionaryPort  | In-memory dictionary        |
//! | `time`              | (none)                | ESP32 system timer          |

pub mod flash;
pub mod hardware;
pub mod log_sink;
pub mod object_dictionary;
pub mod time;
