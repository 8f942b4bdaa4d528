//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter        | Implements         | Connects to                    |
//! |----------------|--------------------|--------------------------------|
//! | `console`      | (command source)   | stdin                          |
//! | `log_sink`     | EventSink          | `log` facade                   |
//! | `memory_store` | RealtimeStore      | in-process JSON tree           |
//! | `preferences`  | PreferenceStore    | TOML file                      |
//! | `rest_store`   | RealtimeStore      | realtime database REST (`live`)|
//! | `time`         | Clock              | system clock / fixed clock     |

pub mod console;
pub mod log_sink;
pub mod memory_store;
pub mod preferences;
#[cfg(feature = "live")]
pub mod rest_store;
pub mod time;
pub(super) mod utils;
