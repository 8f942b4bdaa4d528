//! Telemetry simulator: fabricates sensor history when no backend is used.
//!
//! [`TelemetrySimulator`] backfills 24 hours of one-minute readings per
//! sensor and then advances the whole [`DashboardState`] one point per tick.
//! When the mode is `auto`, every tick also runs the actuator policy.
//!
//! ```text
//!  GaussianNoise ──▶ signal models ──▶ SensorSeries ×4
//!                                          │
//!                       ActuatorPolicy ◀───┘ (auto mode only)
//! ```

pub mod noise;
pub mod signal;

use std::sync::Arc;

use log::debug;
use rand::Rng;
use rand::rngs::StdRng;

use crate::config::DashboardConfig;
use crate::control::{ActuatorPolicy, AutoController, Hysteresis};
use crate::model::{
    HISTORY_MS, Mode, SERIES_CAPACITY, SensorKey, SensorMap, SensorPoint, SensorSeries, TICK_MS,
    round2,
};
use crate::state::DashboardState;
use noise::GaussianNoise;
use signal::DayClock;

/// Demo-mode data source: synthetic history plus per-tick advance.
pub struct TelemetrySimulator<R = StdRng> {
    noise: GaussianNoise<R>,
    clock: DayClock,
    policy: Box<dyn ActuatorPolicy + Send>,
}

impl TelemetrySimulator<StdRng> {
    /// Build from configuration: fixed seed when one is configured, the
    /// configured UTC offset for the diurnal curve, and the hysteresis
    /// wrapper only when a non-zero band is set.
    pub fn from_config(config: &DashboardConfig) -> Self {
        let noise = config
            .seed
            .map_or_else(GaussianNoise::from_entropy, GaussianNoise::seeded);
        let policy: Box<dyn ActuatorPolicy + Send> = if config.hysteresis_band > 0.0 {
            Box::new(Hysteresis::new(config.thresholds, config.hysteresis_band))
        } else {
            Box::new(AutoController::new(config.thresholds))
        };
        Self::new(
            noise,
            DayClock::from_offset_minutes(config.utc_offset_minutes),
            policy,
        )
    }
}

impl<R: Rng> TelemetrySimulator<R> {
    pub fn new(
        noise: GaussianNoise<R>,
        clock: DayClock,
        policy: Box<dyn ActuatorPolicy + Send>,
    ) -> Self {
        Self {
            noise,
            clock,
            policy,
        }
    }

    /// [`SERIES_CAPACITY`] points per sensor, one minute apart, the first
    /// at `now_ms - 24h`.
    pub fn generate_initial_series(&mut self, now_ms: i64) -> SensorMap<SensorSeries> {
        let start = now_ms - HISTORY_MS;
        let mut series = SensorMap::from_fn(|_| SensorSeries::with_capacity(SERIES_CAPACITY));

        for key in SensorKey::ALL {
            for i in 0..SERIES_CAPACITY {
                let timestamp = start + i as i64 * TICK_MS;
                let hour = self.clock.hour_of(timestamp);
                let value = signal::initial_value(key, i, hour, &mut self.noise);
                series[key].push(SensorPoint::new(timestamp, round2(value)));
            }
        }
        debug!("Simulator: backfilled {} points per sensor", SERIES_CAPACITY);
        series
    }

    /// Fresh snapshot for session start: backfilled history, `auto` mode,
    /// every actuator off.
    pub fn initial_state(&mut self, now_ms: i64) -> DashboardState {
        DashboardState::from_series(self.generate_initial_series(now_ms), Mode::Auto)
    }

    /// Advance every sensor by one point stamped `now_ms`.
    ///
    /// Series lengths are preserved (oldest point dropped).  In `auto`
    /// mode the actuator policy overwrites actuator states; in `manual`
    /// mode they are returned untouched.
    pub fn advance(&mut self, state: &DashboardState, now_ms: i64) -> DashboardState {
        let hour = self.clock.hour_of(now_ms);
        let mut next = state.clone();

        for key in SensorKey::ALL {
            let value = round2(signal::next_value(
                key,
                state.current[key],
                hour,
                &mut self.noise,
            ));
            let point = SensorPoint::new(now_ms, value);
            next.series[key] = Arc::new(state.series[key].advanced(point));
            next.current[key] = value;
        }

        if next.mode == Mode::Auto {
            let flags = self.policy.decide(&next.current, &state.actuator_flags());
            next = next.with_actuators(&flags);
        }
        next
    }
}
