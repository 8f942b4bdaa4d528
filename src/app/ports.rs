//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ DashboardService / runner (domain)
//! ```
//!
//! Driven adapters (stores, event sinks, clocks, preference files)
//! implement these traits.  The service and runner consume them through
//! generics, so the domain core never touches the network or the
//! filesystem directly.
//!
//! ## Callback contract
//!
//! - Subscription callbacks may run on any thread, hence `Send`.
//! - Error callbacks report transport failures only; malformed payloads
//!   are normalised before the update callback sees them.

use serde_json::Value;

use crate::error::{GatewayError, StoreError};
use crate::gateway::Unsubscribe;
use crate::model::{ActuatorKey, Mode, SensorKey, SensorPoint, Theme};

use super::events::AppEvent;

/// Update callback for one subscription stream.
pub type OnUpdate<T> = Box<dyn FnMut(T) + Send + 'static>;

/// Transport-failure callback for one subscription stream.
pub type OnError<E> = Box<dyn FnMut(E) + Send + 'static>;

// ───────────────────────────────────────────────────────────────
// Sync gateway port (domain ↔ source of truth)
// ───────────────────────────────────────────────────────────────

/// Typed subscribe and command operations keyed by sensor, actuator and
/// mode.
///
/// Subscriptions never fail past their own boundary: a failed subscribe
/// calls `on_error` once and returns [`Unsubscribe::noop`].  Within one
/// stream, updates arrive in store order; across streams nothing is
/// ordered.
#[allow(async_fn_in_trait)]
pub trait SyncGateway {
    /// Latest scalar reading for `key`.
    fn subscribe_current(
        &self,
        key: SensorKey,
        on_value: OnUpdate<f64>,
        on_error: OnError<GatewayError>,
    ) -> Unsubscribe;

    /// The entire series for `key` on every change, never a delta.
    fn subscribe_series(
        &self,
        key: SensorKey,
        on_series: OnUpdate<Vec<SensorPoint>>,
        on_error: OnError<GatewayError>,
    ) -> Unsubscribe;

    fn subscribe_actuator(
        &self,
        key: ActuatorKey,
        on_state: OnUpdate<bool>,
        on_error: OnError<GatewayError>,
    ) -> Unsubscribe;

    /// Absent or malformed mode values are delivered as [`Mode::Auto`].
    fn subscribe_mode(&self, on_mode: OnUpdate<Mode>, on_error: OnError<GatewayError>)
    -> Unsubscribe;

    /// Persist `{isOn, timestamp}` for `key`.  Not retried on failure.
    async fn request_actuator_command(&self, key: ActuatorKey, is_on: bool)
    -> Result<(), GatewayError>;

    /// Persist the mode as a bare string.  Not retried on failure.
    async fn request_mode_change(&self, mode: Mode) -> Result<(), GatewayError>;
}

// ───────────────────────────────────────────────────────────────
// Realtime store port (gateway ↔ hierarchical JSON store)
// ───────────────────────────────────────────────────────────────

/// A hierarchical push store addressed by `/`-separated paths.
///
/// `watch` delivers the node's current value once, then again whenever it
/// changes; `None` means the node does not exist.  Last write wins per
/// path.
#[allow(async_fn_in_trait)]
pub trait RealtimeStore {
    fn watch(
        &self,
        path: &str,
        on_value: OnUpdate<Option<Value>>,
        on_error: OnError<StoreError>,
    ) -> Result<Unsubscribe, StoreError>;

    async fn set(&self, path: &str, value: Value) -> Result<(), StoreError>;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (domain → logging)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`]s through this port.
pub trait EventSink {
    fn emit(&mut self, event: &AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Clock port
// ───────────────────────────────────────────────────────────────

/// Wall-clock source in milliseconds since the Unix epoch.
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> i64;
}

// ───────────────────────────────────────────────────────────────
// Preference port
// ───────────────────────────────────────────────────────────────

/// Local persistence for the theme preference.  Nothing else is stored.
pub trait PreferenceStore {
    /// Stored theme, or the default when nothing valid is stored.
    fn load_theme(&self) -> Theme;

    fn save_theme(&mut self, theme: Theme) -> std::io::Result<()>;
}
