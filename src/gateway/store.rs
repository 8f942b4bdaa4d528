//! [`SyncGateway`] over any [`RealtimeStore`].

use std::sync::{Arc, Mutex, PoisonError};

use log::warn;
use serde_json::Value;

use super::{Unsubscribe, decode, paths};
use crate::app::ports::{Clock, OnError, OnUpdate, RealtimeStore, SyncGateway};
use crate::error::GatewayError;
use crate::model::{ActuatorKey, Mode, SensorKey, SensorPoint};

/// Maps typed gateway operations onto store paths and payload shapes.
pub struct StoreGateway<S> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
}

impl<S> Clone for StoreGateway<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<S: RealtimeStore> StoreGateway<S> {
    /// `clock` stamps outgoing actuator commands.
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    fn watch_decoded<T: 'static>(
        &self,
        path: String,
        decode: fn(Option<&Value>) -> Option<T>,
        mut on_update: OnUpdate<T>,
        on_error: OnError<GatewayError>,
    ) -> Unsubscribe {
        // The error callback serves both the subscribe failure below and
        // stream failures reported later by the store.
        let on_error = Arc::new(Mutex::new(on_error));
        let stream_error = Arc::clone(&on_error);
        let stream_path = path.clone();

        let watched = self.store.watch(
            &path,
            Box::new(move |raw| {
                if let Some(value) = decode(raw.as_ref()) {
                    on_update(value);
                }
            }),
            Box::new(move |source| {
                let mut report = stream_error.lock().unwrap_or_else(PoisonError::into_inner);
                (*report)(GatewayError::Stream {
                    path: stream_path.clone(),
                    source,
                });
            }),
        );

        match watched {
            Ok(handle) => handle,
            Err(source) => {
                warn!("Gateway: subscribe {} failed: {}", path, source);
                let mut report = on_error.lock().unwrap_or_else(PoisonError::into_inner);
                (*report)(GatewayError::Subscribe { path, source });
                Unsubscribe::noop()
            }
        }
    }

    async fn write(&self, path: String, value: Value) -> Result<(), GatewayError> {
        match self.store.set(&path, value).await {
            Ok(()) => Ok(()),
            Err(source) => Err(GatewayError::Command { path, source }),
        }
    }
}

impl<S: RealtimeStore> SyncGateway for StoreGateway<S> {
    fn subscribe_current(
        &self,
        key: SensorKey,
        on_value: OnUpdate<f64>,
        on_error: OnError<GatewayError>,
    ) -> Unsubscribe {
        self.watch_decoded(paths::sensor_current(key), decode::current, on_value, on_error)
    }

    fn subscribe_series(
        &self,
        key: SensorKey,
        on_series: OnUpdate<Vec<SensorPoint>>,
        on_error: OnError<GatewayError>,
    ) -> Unsubscribe {
        self.watch_decoded(paths::sensor_series(key), decode::series, on_series, on_error)
    }

    fn subscribe_actuator(
        &self,
        key: ActuatorKey,
        on_state: OnUpdate<bool>,
        on_error: OnError<GatewayError>,
    ) -> Unsubscribe {
        self.watch_decoded(paths::actuator_state(key), decode::actuator, on_state, on_error)
    }

    fn subscribe_mode(
        &self,
        on_mode: OnUpdate<Mode>,
        on_error: OnError<GatewayError>,
    ) -> Unsubscribe {
        self.watch_decoded(
            paths::MODE.to_owned(),
            |raw| Some(decode::mode(raw)),
            on_mode,
            on_error,
        )
    }

    async fn request_actuator_command(
        &self,
        key: ActuatorKey,
        is_on: bool,
    ) -> Result<(), GatewayError> {
        let payload = decode::encode_command(is_on, self.clock.now_ms());
        self.write(paths::actuator_command(key), payload).await
    }

    async fn request_mode_change(&self, mode: Mode) -> Result<(), GatewayError> {
        self.write(paths::MODE.to_owned(), decode::encode_mode(mode)).await
    }
}
