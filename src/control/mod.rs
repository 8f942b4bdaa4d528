//! Automatic actuator control.
//!
//! [`evaluate`] is the threshold rule applied on every simulated tick while
//! the mode is `auto`.  It has no memory: crossing a threshold back and
//! forth flips the actuator every tick.  Callers that want stable outputs
//! wrap it in [`Hysteresis`] instead of changing the rule.

mod hysteresis;

pub use hysteresis::Hysteresis;

use serde::{Deserialize, Serialize};

use crate::model::{ActuatorKey, ActuatorMap, SensorKey, SensorMap};

/// Threshold set for the automatic rule.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlThresholds {
    /// Lamp turns on below this light level (klux).
    pub lamp_below_light: f64,
    /// Fan turns on above this air temperature (°C).
    pub fan_above_temp: f64,
    /// Fan turns on above this air humidity (%).
    pub fan_above_humidity: f64,
    /// Pump turns on below this soil moisture (%).
    pub pump_below_soil: f64,
}

impl Default for ControlThresholds {
    fn default() -> Self {
        Self {
            lamp_below_light: 20.0,
            fan_above_temp: 30.0,
            fan_above_humidity: 80.0,
            pump_below_soil: 30.0,
        }
    }
}

/// Map current readings to actuator on/off decisions.
pub fn evaluate(current: &SensorMap<f64>, t: &ControlThresholds) -> ActuatorMap<bool> {
    ActuatorMap::from_fn(|key| match key {
        ActuatorKey::Lamp => current[SensorKey::Light] < t.lamp_below_light,
        ActuatorKey::Fan => {
            current[SensorKey::AirTemp] > t.fan_above_temp
                || current[SensorKey::AirHumidity] > t.fan_above_humidity
        }
        ActuatorKey::Pump => current[SensorKey::SoilMoisture] < t.pump_below_soil,
    })
}

/// Decides actuator states from readings while the mode is `auto`.
///
/// `previous` carries the states before this decision; stateless
/// policies ignore it.
pub trait ActuatorPolicy {
    fn decide(&self, current: &SensorMap<f64>, previous: &ActuatorMap<bool>) -> ActuatorMap<bool>;
}

/// The plain threshold rule.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AutoController {
    thresholds: ControlThresholds,
}

impl AutoController {
    pub fn new(thresholds: ControlThresholds) -> Self {
        Self { thresholds }
    }
}

impl ActuatorPolicy for AutoController {
    fn decide(&self, current: &SensorMap<f64>, _previous: &ActuatorMap<bool>) -> ActuatorMap<bool> {
        evaluate(current, &self.thresholds)
    }
}
