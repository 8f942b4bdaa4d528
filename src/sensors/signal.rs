//! Per-sensor signal models and the hour-of-day source they use.
//!
//! - `light` follows the day/night curve only; its previous value is
//!   ignored on every step.
//! - humidity, soil moisture and air temperature start from a slow
//!   sinusoid around a baseline and then random-walk from their last value.
//!
//! Every result is clamped to [`SensorKey::bounds`].

use chrono::Timelike;
use rand::Rng;

use super::noise::GaussianNoise;
use crate::model::SensorKey;

const LIGHT_PEAK: f64 = 90.0;
const LIGHT_SIGMA: f64 = 6.0;

/// Resolves the hour of day (0–23) for a millisecond timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DayClock {
    /// Host local time zone.
    #[default]
    Local,
    /// Fixed offset from UTC, in seconds.
    Fixed(i32),
}

impl DayClock {
    pub const UTC: DayClock = DayClock::Fixed(0);

    pub fn from_offset_minutes(minutes: Option<i32>) -> Self {
        minutes.map_or(Self::Local, |m| Self::Fixed(m * 60))
    }

    pub fn hour_of(&self, timestamp_ms: i64) -> u32 {
        match self {
            Self::Local => chrono::DateTime::from_timestamp_millis(timestamp_ms)
                .map(|utc| utc.with_timezone(&chrono::Local).hour())
                .unwrap_or_else(|| fixed_hour(timestamp_ms, 0)),
            Self::Fixed(offset_secs) => fixed_hour(timestamp_ms, *offset_secs),
        }
    }
}

fn fixed_hour(timestamp_ms: i64, offset_secs: i32) -> u32 {
    let secs = timestamp_ms.div_euclid(1000) + i64::from(offset_secs);
    (secs.rem_euclid(86_400) / 3_600) as u32
}

/// Daylight fraction in `[0, 1]`: zero from 18:00 to 06:00, peak at noon.
pub fn daylight(hour: u32) -> f64 {
    (((f64::from(hour) - 6.0) / 12.0) * core::f64::consts::PI)
        .sin()
        .max(0.0)
}

pub fn clamp_to(key: SensorKey, value: f64) -> f64 {
    let (min, max) = key.bounds();
    value.clamp(min, max)
}

fn light<R: Rng>(hour: u32, noise: &mut GaussianNoise<R>) -> f64 {
    daylight(hour) * LIGHT_PEAK + noise.sample(LIGHT_SIGMA)
}

/// Value of point `index` in the backfilled history.
pub fn initial_value<R: Rng>(
    key: SensorKey,
    index: usize,
    hour: u32,
    noise: &mut GaussianNoise<R>,
) -> f64 {
    let i = index as f64;
    let raw = match key {
        SensorKey::Light => light(hour, noise),
        SensorKey::AirHumidity => 65.0 + (i / 200.0).sin() * 10.0 + noise.sample(3.0),
        SensorKey::SoilMoisture => 45.0 + (i / 300.0).sin() * 8.0 + noise.sample(4.0),
        SensorKey::AirTemp => 26.0 + (i / 180.0).sin() * 4.0 + noise.sample(0.8),
    };
    clamp_to(key, raw)
}

/// Value for the next tick given the previous `current` reading.
pub fn next_value<R: Rng>(
    key: SensorKey,
    previous: f64,
    hour: u32,
    noise: &mut GaussianNoise<R>,
) -> f64 {
    let raw = match key {
        SensorKey::Light => light(hour, noise),
        SensorKey::AirHumidity => previous + noise.sample(1.5),
        SensorKey::SoilMoisture => previous + noise.sample(1.8),
        SensorKey::AirTemp => previous + noise.sample(0.4),
    };
    clamp_to(key, raw)
}
