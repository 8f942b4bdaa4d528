//! Application service: the hexagonal core.
//!
//! [`DashboardService`] is the single owner of the [`DashboardState`]
//! snapshot.  Every mutation produces a fresh snapshot and swaps the
//! `Arc`, so readers holding an older snapshot never see a partial update.
//!
//! ```text
//!  TelemetrySimulator ──▶ ┌──────────────────────┐ ──▶ EventSink
//!  StateUpdate (live) ──▶ │   DashboardService    │
//!  OperatorCommand    ──▶ │  snapshot · mode gate │ ──▶ RemoteRequest
//!                         └──────────────────────┘
//! ```

use std::sync::Arc;

use log::{debug, info, warn};
use rand::Rng;

use crate::config::DataSource;
use crate::error::GatewayError;
use crate::model::{ActuatorKey, ActuatorMap, Mode};
use crate::sensors::TelemetrySimulator;
use crate::state::{DashboardState, StateUpdate};

use super::commands::{OperatorCommand, RemoteRequest};
use super::events::{AppEvent, Origin, TelemetryData};
use super::ports::EventSink;

// ───────────────────────────────────────────────────────────────
// DashboardService
// ───────────────────────────────────────────────────────────────

pub struct DashboardService {
    state: Arc<DashboardState>,
    source: DataSource,
    tick_count: u64,
}

impl DashboardService {
    /// Does **not** emit anything; call [`start`](Self::start) next.
    pub fn new(initial: DashboardState, source: DataSource) -> Self {
        Self {
            state: Arc::new(initial),
            source,
            tick_count: 0,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    pub fn start(&mut self, sink: &mut impl EventSink) {
        sink.emit(&AppEvent::Started {
            source: self.source,
            mode: self.state.mode,
        });
        info!(
            "DashboardService started (source={}, mode={})",
            self.source, self.state.mode
        );
    }

    pub fn stop(&mut self, sink: &mut impl EventSink) {
        sink.emit(&AppEvent::Stopped {
            ticks: self.tick_count,
        });
        info!("DashboardService stopped after {} ticks", self.tick_count);
    }

    // ── Per-tick orchestration (demo) ─────────────────────────

    /// Advance the simulated telemetry by one step stamped `now_ms`.
    ///
    /// In `auto` mode the simulator's policy may flip actuators; each flip
    /// is reported with [`Origin::Controller`].
    pub fn tick<R: Rng>(
        &mut self,
        sim: &mut TelemetrySimulator<R>,
        now_ms: i64,
        sink: &mut impl EventSink,
    ) {
        self.tick_count += 1;
        let before = self.state.actuator_flags();
        let next = sim.advance(&self.state, now_ms);
        self.replace(next, &before, Origin::Controller, sink);

        let s = &self.state;
        sink.emit(&AppEvent::Telemetry(TelemetryData {
            tick: self.tick_count,
            timestamp_ms: now_ms,
            mode: s.mode,
            current: s.current,
            actuators: s.actuator_flags(),
        }));
    }

    // ── Live updates ──────────────────────────────────────────

    /// Merge one subscription delivery.  Only the key the update names
    /// changes.
    pub fn apply_update(&mut self, update: &StateUpdate, sink: &mut impl EventSink) {
        let before_mode = self.state.mode;
        let before = self.state.actuator_flags();
        let next = self.state.apply(update);
        if next.mode != before_mode {
            sink.emit(&AppEvent::ModeChanged {
                from: before_mode,
                to: next.mode,
                origin: Origin::Remote,
            });
        }
        self.replace(next, &before, Origin::Remote, sink);
    }

    pub fn report_transport_error(&mut self, error: GatewayError, sink: &mut impl EventSink) {
        warn!("Sync transport error: {}", error);
        sink.emit(&AppEvent::TransportError(error));
    }

    /// Surface a failed remote write.  The optimistic local change stays.
    pub fn report_command_failed(
        &mut self,
        request: RemoteRequest,
        error: GatewayError,
        sink: &mut impl EventSink,
    ) {
        warn!("Remote request '{}' failed: {} (local state kept)", request, error);
        sink.emit(&AppEvent::CommandFailed { request, error });
    }

    // ── Command handling ──────────────────────────────────────

    /// Apply an operator command to the local snapshot and return the
    /// remote writes that mirror it.
    ///
    /// Actuator commands are dropped while the mode is `auto`.  A demo
    /// session discards the returned requests.
    pub fn handle_command(
        &mut self,
        cmd: OperatorCommand,
        sink: &mut impl EventSink,
    ) -> Vec<RemoteRequest> {
        match cmd {
            OperatorCommand::SetMode(mode) => {
                let from = self.state.mode;
                if from != mode {
                    self.state = Arc::new(self.state.with_mode(mode));
                    sink.emit(&AppEvent::ModeChanged {
                        from,
                        to: mode,
                        origin: Origin::Operator,
                    });
                }
                vec![RemoteRequest::Mode(mode)]
            }
            OperatorCommand::SetActuator(_, _) | OperatorCommand::SetAll(_)
                if self.state.mode == Mode::Auto =>
            {
                debug!("Command {:?} ignored in auto mode", cmd);
                sink.emit(&AppEvent::CommandIgnored {
                    command: cmd,
                    mode: Mode::Auto,
                });
                Vec::new()
            }
            OperatorCommand::SetActuator(key, on) => {
                let before = self.state.actuator_flags();
                let next = self.state.with_actuator(key, on);
                self.replace(next, &before, Origin::Operator, sink);
                vec![RemoteRequest::Actuator(key, on)]
            }
            OperatorCommand::SetAll(on) => {
                let before = self.state.actuator_flags();
                let next = self.state.with_actuators(&ActuatorMap::from_fn(|_| on));
                self.replace(next, &before, Origin::Operator, sink);
                ActuatorKey::ALL
                    .iter()
                    .map(|k| RemoteRequest::Actuator(*k, on))
                    .collect()
            }
        }
    }

    // ── Queries ───────────────────────────────────────────────

    /// Current snapshot.  Cheap to clone and safe to hold across updates.
    pub fn snapshot(&self) -> Arc<DashboardState> {
        Arc::clone(&self.state)
    }

    pub fn source(&self) -> DataSource {
        self.source
    }

    pub fn mode(&self) -> Mode {
        self.state.mode
    }

    /// Simulated ticks executed since startup.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    // ── Internal ──────────────────────────────────────────────

    fn replace(
        &mut self,
        next: DashboardState,
        before: &ActuatorMap<bool>,
        origin: Origin,
        sink: &mut impl EventSink,
    ) {
        for (key, was_on) in before.iter() {
            let is_on = next.is_on(key);
            if is_on != *was_on {
                sink.emit(&AppEvent::ActuatorChanged { key, is_on, origin });
            }
        }
        self.state = Arc::new(next);
    }
}
