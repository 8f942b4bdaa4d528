//! Domain model: sensor, actuator and mode types.
//!
//! No behaviour beyond lookups; every other module depends on these shapes.
//! Sensor and actuator sets are closed enumerations, so per-key data lives
//! in fixed arrays ([`SensorMap`], [`ActuatorMap`]) rather than hash maps.

use core::fmt;
use core::ops::{Index, IndexMut};
use core::str::FromStr;
use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::error::ParseError;

/// Points in a full simulated day at one-minute resolution.
pub const SERIES_CAPACITY: usize = 24 * 60;

/// Simulated tick spacing in milliseconds (one minute).
pub const TICK_MS: i64 = 60_000;

/// Length of the backfilled history window in milliseconds.
pub const HISTORY_MS: i64 = 24 * 60 * TICK_MS;

// ───────────────────────────────────────────────────────────────
// Sensors
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SensorKey {
    Light,
    AirHumidity,
    SoilMoisture,
    AirTemp,
}

impl SensorKey {
    pub const ALL: [SensorKey; 4] = [
        SensorKey::Light,
        SensorKey::AirHumidity,
        SensorKey::SoilMoisture,
        SensorKey::AirTemp,
    ];

    pub const fn index(self) -> usize {
        self as usize
    }

    /// Key as it appears in store paths (`sensors/<key>/…`).
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::AirHumidity => "airHumidity",
            Self::SoilMoisture => "soilMoisture",
            Self::AirTemp => "airTemp",
        }
    }

    /// Physical clamp range `(min, max)` for generated values.
    pub const fn bounds(self) -> (f64, f64) {
        match self {
            Self::Light => (0.0, 100.0),
            Self::AirHumidity => (30.0, 100.0),
            Self::SoilMoisture => (10.0, 90.0),
            Self::AirTemp => (10.0, 45.0),
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Light => "Light intensity",
            Self::AirHumidity => "Air humidity",
            Self::SoilMoisture => "Soil moisture",
            Self::AirTemp => "Air temperature",
        }
    }

    pub const fn unit(self) -> &'static str {
        match self {
            Self::Light => "klux",
            Self::AirHumidity | Self::SoilMoisture => "%",
            Self::AirTemp => "\u{00b0}C",
        }
    }
}

impl fmt::Display for SensorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SensorKey {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or(ParseError::UnknownSensor)
    }
}

/// One timestamped reading. Timestamps are milliseconds since the epoch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensorPoint {
    pub timestamp: i64,
    pub value: f64,
}

impl SensorPoint {
    pub const fn new(timestamp: i64, value: f64) -> Self {
        Self { timestamp, value }
    }
}

/// Ordered readings for one sensor, oldest first.
///
/// Used as a sliding window: [`advanced`](Self::advanced) drops the oldest
/// point and appends one, so the length never changes once populated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SensorSeries {
    points: VecDeque<SensorPoint>,
}

impl SensorSeries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            points: VecDeque::with_capacity(capacity),
        }
    }

    pub fn from_points(points: Vec<SensorPoint>) -> Self {
        Self {
            points: points.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> Option<&SensorPoint> {
        self.points.front()
    }

    pub fn last(&self) -> Option<&SensorPoint> {
        self.points.back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SensorPoint> {
        self.points.iter()
    }

    pub fn push(&mut self, point: SensorPoint) {
        self.points.push_back(point);
    }

    /// Append `point`, dropping the oldest entries so that at most
    /// `capacity` points remain.
    pub fn push_bounded(&mut self, point: SensorPoint, capacity: usize) {
        while !self.points.is_empty() && self.points.len() >= capacity {
            self.points.pop_front();
        }
        self.points.push_back(point);
    }

    /// New series with the oldest point dropped and `point` appended.
    /// An empty series just gains the point.
    pub fn advanced(&self, point: SensorPoint) -> Self {
        let mut next = self.clone();
        next.points.pop_front();
        next.points.push_back(point);
        next
    }

    pub fn to_vec(&self) -> Vec<SensorPoint> {
        self.points.iter().copied().collect()
    }
}

// ───────────────────────────────────────────────────────────────
// Actuators and mode
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActuatorKey {
    Lamp,
    Fan,
    Pump,
}

impl ActuatorKey {
    pub const ALL: [ActuatorKey; 3] = [ActuatorKey::Lamp, ActuatorKey::Fan, ActuatorKey::Pump];

    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Lamp => "lamp",
            Self::Fan => "fan",
            Self::Pump => "pump",
        }
    }

    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Lamp => "Lamp",
            Self::Fan => "Fan",
            Self::Pump => "Pump",
        }
    }
}

impl fmt::Display for ActuatorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActuatorKey {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or(ParseError::UnknownActuator)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ActuatorState {
    pub key: ActuatorKey,
    pub name: &'static str,
    #[serde(rename = "isOn")]
    pub is_on: bool,
}

impl ActuatorState {
    pub const fn new(key: ActuatorKey, is_on: bool) -> Self {
        Self {
            key,
            name: key.display_name(),
            is_on,
        }
    }
}

/// Global control mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Auto,
    Manual,
}

impl Mode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Manual => "manual",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "auto" => Ok(Self::Auto),
            "manual" => Ok(Self::Manual),
            _ => Err(ParseError::UnknownMode),
        }
    }
}

/// Dashboard colour theme, the only locally persisted preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Dark => "dark",
            Self::Light => "light",
        }
    }

    pub const fn toggled(self) -> Self {
        match self {
            Self::Dark => Self::Light,
            Self::Light => Self::Dark,
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dark" => Ok(Self::Dark),
            "light" => Ok(Self::Light),
            _ => Err(ParseError::UnknownTheme),
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Fixed per-key maps
// ───────────────────────────────────────────────────────────────

/// One `T` per [`SensorKey`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SensorMap<T>([T; 4]);

impl<T> SensorMap<T> {
    pub fn from_fn(mut f: impl FnMut(SensorKey) -> T) -> Self {
        Self(SensorKey::ALL.map(&mut f))
    }

    pub fn iter(&self) -> impl Iterator<Item = (SensorKey, &T)> {
        SensorKey::ALL.into_iter().zip(self.0.iter())
    }

    pub fn map<U>(&self, mut f: impl FnMut(SensorKey, &T) -> U) -> SensorMap<U> {
        SensorMap::from_fn(|k| f(k, &self[k]))
    }
}

impl<T> Index<SensorKey> for SensorMap<T> {
    type Output = T;

    fn index(&self, key: SensorKey) -> &T {
        &self.0[key.index()]
    }
}

impl<T> IndexMut<SensorKey> for SensorMap<T> {
    fn index_mut(&mut self, key: SensorKey) -> &mut T {
        &mut self.0[key.index()]
    }
}

/// One `T` per [`ActuatorKey`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ActuatorMap<T>([T; 3]);

impl<T> ActuatorMap<T> {
    pub fn from_fn(mut f: impl FnMut(ActuatorKey) -> T) -> Self {
        Self(ActuatorKey::ALL.map(&mut f))
    }

    pub fn iter(&self) -> impl Iterator<Item = (ActuatorKey, &T)> {
        ActuatorKey::ALL.into_iter().zip(self.0.iter())
    }

    pub fn map<U>(&self, mut f: impl FnMut(ActuatorKey, &T) -> U) -> ActuatorMap<U> {
        ActuatorMap::from_fn(|k| f(k, &self[k]))
    }
}

impl<T> Index<ActuatorKey> for ActuatorMap<T> {
    type Output = T;

    fn index(&self, key: ActuatorKey) -> &T {
        &self.0[key.index()]
    }
}

impl<T> IndexMut<ActuatorKey> for ActuatorMap<T> {
    fn index_mut(&mut self, key: ActuatorKey) -> &mut T {
        &mut self.0[key.index()]
    }
}

/// Round to two decimal places, the precision every stored reading uses.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
