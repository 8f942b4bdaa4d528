//! Store keys, one per concern.

use crate::model::{ActuatorKey, SensorKey};

/// Global control mode, stored as a bare string.
pub const MODE: &str = "system/mode";

pub fn sensor_current(key: SensorKey) -> String {
    format!("sensors/{key}/current")
}

pub fn sensor_series(key: SensorKey) -> String {
    format!("sensors/{key}/series")
}

pub fn actuator_state(key: ActuatorKey) -> String {
    format!("actuators/{key}/state")
}

/// Write-only from the dashboard side; a controller elsewhere consumes it.
pub fn actuator_command(key: ActuatorKey) -> String {
    format!("actuators/{key}/command")
}

/// Split a path into its non-empty segments.
pub fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}
