//! Hysteresis wrapper around [`AutoController`](super::AutoController).
//!
//! Turning on uses the plain thresholds.  An actuator that is already on
//! stays on until its reading has cleared the threshold by `band`.

use super::{ActuatorPolicy, ControlThresholds, evaluate};
use crate::model::{ActuatorKey, ActuatorMap, SensorMap};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hysteresis {
    thresholds: ControlThresholds,
    band: f64,
}

impl Hysteresis {
    pub fn new(thresholds: ControlThresholds, band: f64) -> Self {
        Self {
            thresholds,
            band: band.max(0.0),
        }
    }

    /// Thresholds an actuator that is on must clear before it switches off.
    fn release_thresholds(&self) -> ControlThresholds {
        let t = &self.thresholds;
        ControlThresholds {
            lamp_below_light: t.lamp_below_light + self.band,
            fan_above_temp: t.fan_above_temp - self.band,
            fan_above_humidity: t.fan_above_humidity - self.band,
            pump_below_soil: t.pump_below_soil + self.band,
        }
    }
}

impl ActuatorPolicy for Hysteresis {
    fn decide(&self, current: &SensorMap<f64>, previous: &ActuatorMap<bool>) -> ActuatorMap<bool> {
        let engage = evaluate(current, &self.thresholds);
        let hold = evaluate(current, &self.release_thresholds());
        ActuatorMap::from_fn(|key: ActuatorKey| {
            if previous[key] { hold[key] } else { engage[key] }
        })
    }
}
