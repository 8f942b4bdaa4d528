//! Outbound application events.
//!
//! The [`DashboardService`](super::service::DashboardService) emits these
//! through the [`EventSink`](super::ports::EventSink) port.  Adapters on
//! the other side decide what to do with them; the binary logs them.

use crate::config::DataSource;
use crate::error::GatewayError;
use crate::model::{ActuatorKey, ActuatorMap, Mode, SensorMap};

use super::commands::{OperatorCommand, RemoteRequest};

/// Who caused a state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// The automatic controller on a simulated tick.
    Controller,
    /// A local operator command (applied optimistically).
    Operator,
    /// A subscription delivery from the live backend.
    Remote,
}

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// The service has started (carries the data source and initial mode).
    Started { source: DataSource, mode: Mode },

    /// Per-tick telemetry snapshot.
    Telemetry(TelemetryData),

    ModeChanged { from: Mode, to: Mode, origin: Origin },

    ActuatorChanged {
        key: ActuatorKey,
        is_on: bool,
        origin: Origin,
    },

    /// An operator command was dropped because the mode did not allow it.
    CommandIgnored { command: OperatorCommand, mode: Mode },

    /// A remote write failed.  The optimistic local change is kept.
    CommandFailed {
        request: RemoteRequest,
        error: GatewayError,
    },

    /// A subscription reported a transport failure; last-known state is kept.
    TransportError(GatewayError),

    /// The session ended.
    Stopped { ticks: u64 },
}

/// A point-in-time reading set suitable for logging.
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetryData {
    pub tick: u64,
    pub timestamp_ms: i64,
    pub mode: Mode,
    pub current: SensorMap<f64>,
    pub actuators: ActuatorMap<bool>,
}
