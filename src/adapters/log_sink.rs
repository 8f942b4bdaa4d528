//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing each application event as one
//! structured log line.  The binary routes these through `env_logger`.

use log::{info, warn};

use crate::app::events::{AppEvent, Origin};
use crate::app::ports::EventSink;
use crate::model::{ActuatorKey, SensorKey};

/// Adapter that logs every [`AppEvent`].
#[derive(Debug)]
pub struct LogEventSink {
    /// Log every n-th telemetry line; 1 logs all.
    telemetry_every: u64,
}

impl LogEventSink {
    pub fn new() -> Self {
        Self { telemetry_every: 1 }
    }

    /// Only log every `n`-th telemetry event (state changes are always logged).
    pub fn with_telemetry_every(n: u64) -> Self {
        Self {
            telemetry_every: n.max(1),
        }
    }
}

impl Default for LogEventSink {
    fn default() -> Self {
        Self::new()
    }
}

fn on_off(on: bool) -> &'static str {
    if on { "ON" } else { "off" }
}

fn origin(o: Origin) -> &'static str {
    match o {
        Origin::Controller => "auto",
        Origin::Operator => "operator",
        Origin::Remote => "remote",
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Telemetry(t) => {
                if t.tick % self.telemetry_every != 0 {
                    return;
                }
                let c = &t.current;
                info!(
                    "TELEM | #{} mode={} | light={:.2}{} hum={:.2}{} soil={:.2}{} temp={:.2}{} | \
                     lamp={} fan={} pump={}",
                    t.tick,
                    t.mode,
                    c[SensorKey::Light],
                    SensorKey::Light.unit(),
                    c[SensorKey::AirHumidity],
                    SensorKey::AirHumidity.unit(),
                    c[SensorKey::SoilMoisture],
                    SensorKey::SoilMoisture.unit(),
                    c[SensorKey::AirTemp],
                    SensorKey::AirTemp.unit(),
                    on_off(t.actuators[ActuatorKey::Lamp]),
                    on_off(t.actuators[ActuatorKey::Fan]),
                    on_off(t.actuators[ActuatorKey::Pump]),
                );
            }
            AppEvent::ModeChanged { from, to, origin: o } => {
                info!("MODE  | {} -> {} ({})", from, to, origin(*o));
            }
            AppEvent::ActuatorChanged { key, is_on, origin: o } => {
                info!("ACT   | {} {} ({})", key.display_name(), on_off(*is_on), origin(*o));
            }
            AppEvent::CommandIgnored { command, mode } => {
                info!("CMD   | ignored {:?} in {} mode", command, mode);
            }
            AppEvent::CommandFailed { request, error } => {
                warn!("CMD   | '{}' failed: {}", request, error);
            }
            AppEvent::TransportError(error) => {
                warn!("SYNC  | {}", error);
            }
            AppEvent::Started { source, mode } => {
                info!("START | source={} mode={}", source, mode);
            }
            AppEvent::Stopped { ticks } => {
                info!("STOP  | ticks={}", ticks);
            }
        }
    }
}
