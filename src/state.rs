//! Aggregate dashboard state and partial-update merges.
//!
//! [`DashboardState`] is an immutable snapshot.  Every mutator returns a
//! fresh value; series that a change does not touch are shared through
//! `Arc`, so replacing the snapshot on every tick stays cheap.
//!
//! Invariant: `current[k]` equals the value of the last point of
//! `series[k]` whenever that series is non-empty.

use std::sync::Arc;

use serde::Serialize;

use crate::model::{
    ActuatorKey, ActuatorMap, ActuatorState, Mode, SERIES_CAPACITY, SensorKey, SensorMap,
    SensorPoint, SensorSeries,
};

/// One partial update delivered by a sync gateway subscription.
///
/// Each variant touches exactly one key, so applying updates from
/// different streams in any interleaving yields the same per-key result.
#[derive(Debug, Clone, PartialEq)]
pub enum StateUpdate {
    /// Latest scalar reading for one sensor, received at `at_ms`.
    Current { key: SensorKey, value: f64, at_ms: i64 },
    /// Full replacement of one sensor's series (never a delta).
    Series { key: SensorKey, points: Vec<SensorPoint> },
    /// Reported actuator state.
    Actuator { key: ActuatorKey, is_on: bool },
    /// Global control mode.
    Mode(Mode),
}

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardState {
    pub series: SensorMap<Arc<SensorSeries>>,
    pub current: SensorMap<f64>,
    pub mode: Mode,
    pub actuators: ActuatorMap<ActuatorState>,
}

impl DashboardState {
    /// Build a snapshot from fully populated series.  `current` is derived
    /// from each series' last point (0 for an empty series); every
    /// actuator starts off.
    pub fn from_series(series: SensorMap<SensorSeries>, mode: Mode) -> Self {
        let current = series.map(|_, s| s.last().map_or(0.0, |p| p.value));
        Self {
            series: series.map(|_, s| Arc::new(s.clone())),
            current,
            mode,
            actuators: ActuatorMap::from_fn(|k| ActuatorState::new(k, false)),
        }
    }

    /// Snapshot with no history at all.
    pub fn empty() -> Self {
        Self::from_series(SensorMap::default(), Mode::Auto)
    }

    pub fn is_on(&self, key: ActuatorKey) -> bool {
        self.actuators[key].is_on
    }

    /// Actuator on/off flags only.
    pub fn actuator_flags(&self) -> ActuatorMap<bool> {
        self.actuators.map(|_, a| a.is_on)
    }

    /// True when every non-empty series ends with its `current` value.
    pub fn is_consistent(&self) -> bool {
        self.series.iter().all(|(k, s)| match s.last() {
            Some(p) => p.value == self.current[k],
            None => true,
        })
    }

    pub fn with_mode(&self, mode: Mode) -> Self {
        Self {
            mode,
            ..self.clone()
        }
    }

    pub fn with_actuator(&self, key: ActuatorKey, is_on: bool) -> Self {
        let mut next = self.clone();
        next.actuators[key].is_on = is_on;
        next
    }

    pub fn with_actuators(&self, flags: &ActuatorMap<bool>) -> Self {
        let mut next = self.clone();
        for (key, on) in flags.iter() {
            next.actuators[key].is_on = *on;
        }
        next
    }

    /// Merge one partial update.  Only the key named by the update changes.
    pub fn apply(&self, update: &StateUpdate) -> Self {
        match update {
            StateUpdate::Current { key, value, at_ms } => self.merge_current(*key, *value, *at_ms),
            StateUpdate::Series { key, points } => {
                let mut next = self.clone();
                let series = SensorSeries::from_points(points.clone());
                if let Some(last) = series.last() {
                    next.current[*key] = last.value;
                }
                next.series[*key] = Arc::new(series);
                next
            }
            StateUpdate::Actuator { key, is_on } => self.with_actuator(*key, *is_on),
            StateUpdate::Mode(mode) => self.with_mode(*mode),
        }
    }

    /// A scalar reading also lands in the series so the last point keeps
    /// matching `current`.  Timestamps never move backwards.
    fn merge_current(&self, key: SensorKey, value: f64, at_ms: i64) -> Self {
        let mut next = self.clone();
        next.current[key] = value;

        let series = &self.series[key];
        if series.last().is_some_and(|p| p.value == value) {
            return next;
        }
        let timestamp = series.last().map_or(at_ms, |p| p.timestamp.max(at_ms));
        let mut grown = SensorSeries::clone(series);
        grown.push_bounded(
            SensorPoint::new(timestamp, value),
            SERIES_CAPACITY.max(series.len()),
        );
        next.series[key] = Arc::new(grown);
        next
    }

    /// Serializable view of the current readings, actuators and mode.
    pub fn summary(&self) -> StateSummary {
        StateSummary {
            mode: self.mode,
            current: SensorKey::ALL.map(|k| (k, self.current[k])),
            actuators: ActuatorKey::ALL.map(|k| self.actuators[k]),
            series_len: SensorKey::ALL.map(|k| self.series[k].len()),
        }
    }
}

/// Compact, serializable projection of a [`DashboardState`].
#[derive(Debug, Clone, Serialize)]
pub struct StateSummary {
    pub mode: Mode,
    pub current: [(SensorKey, f64); 4],
    pub actuators: [ActuatorState; 3],
    pub series_len: [usize; 4],
}
