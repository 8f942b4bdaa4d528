//! StoreGateway over MemoryStore: payload normalisation, wire shapes and
//! failure reporting as seen through the typed port.

use std::sync::{Arc, Mutex};

use futures_lite::future::block_on;
use serde_json::{Value, json};

use growdash::app::ports::SyncGateway;
use growdash::error::{GatewayError, StoreError};
use growdash::model::{ActuatorKey, Mode, SensorKey, SensorPoint};

use crate::mock_store::{Backend, NOW};

fn collect<T: Send + 'static>() -> (Arc<Mutex<Vec<T>>>, Box<dyn FnMut(T) + Send>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    (seen, Box::new(move |v| sink.lock().unwrap().push(v)))
}

#[test]
fn series_arrives_whole_and_sorted() {
    let backend = Backend::new();
    let (seen, on_series) = collect::<Vec<SensorPoint>>();
    let (errors, on_error) = collect::<GatewayError>();
    let _sub = backend
        .gateway
        .subscribe_series(SensorKey::SoilMoisture, on_series, on_error);

    backend.store.put(
        "sensors/soilMoisture/series",
        json!({
            "-b": { "timestamp": NOW, "value": 31.0 },
            "-a": { "timestamp": NOW - 60_000, "value": 30.0 },
            "-c": { "bogus": true },
        }),
    );
    backend.store.put(
        "sensors/soilMoisture/series/-d",
        json!({ "timestamp": NOW + 60_000, "value": 29.5 }),
    );

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 2);
    assert_eq!(
        seen[0],
        vec![
            SensorPoint::new(NOW - 60_000, 30.0),
            SensorPoint::new(NOW, 31.0)
        ]
    );
    // Every delivery is the full series, not the appended point.
    assert_eq!(seen[1].len(), 3);
    assert_eq!(seen[1][2], SensorPoint::new(NOW + 60_000, 29.5));
    assert!(errors.lock().unwrap().is_empty());
}

#[test]
fn mode_reads_auto_when_missing_or_malformed() {
    let backend = Backend::new();
    let (seen, on_mode) = collect::<Mode>();
    let (_errors, on_error) = collect::<GatewayError>();
    let _sub = backend.gateway.subscribe_mode(on_mode, on_error);

    backend.store.put("system/mode", json!("manual"));
    backend.store.put("system/mode", json!(42));
    backend.store.put("system/mode", json!({ "mode": "manual" }));
    backend.store.put("system/mode", Value::Null);

    assert_eq!(
        *seen.lock().unwrap(),
        [Mode::Auto, Mode::Manual, Mode::Auto, Mode::Manual, Mode::Auto]
    );
}

#[test]
fn actuator_fallbacks() {
    let backend = Backend::new();
    let (seen, on_state) = collect::<bool>();
    let (_errors, on_error) = collect::<GatewayError>();
    let _sub = backend
        .gateway
        .subscribe_actuator(ActuatorKey::Fan, on_state, on_error);

    backend.store.put("actuators/fan/state", json!(true));
    backend.store.put("actuators/fan/state", json!({ "isOn": "yes" }));
    backend.store.put("actuators/fan/state", json!({ "isOn": true }));

    assert_eq!(*seen.lock().unwrap(), [true, false, true]);
}

#[test]
fn commands_land_in_wire_shape() {
    let backend = Backend::new();
    block_on(backend.gateway.request_actuator_command(ActuatorKey::Pump, true)).unwrap();
    backend.clock.advance(1_000);
    block_on(backend.gateway.request_mode_change(Mode::Manual)).unwrap();

    assert_eq!(
        backend.store.get("actuators/pump/command"),
        Some(json!({ "isOn": true, "timestamp": NOW }))
    );
    assert_eq!(backend.store.get("system/mode"), Some(json!("manual")));
    // The dashboard never writes the state path itself.
    assert_eq!(backend.store.get("actuators/pump/state"), None);
}

#[test]
fn unreachable_store_fails_command_with_path() {
    let backend = Backend::new();
    backend.store.set_reachable(false);
    let err = block_on(backend.gateway.request_actuator_command(ActuatorKey::Lamp, false))
        .unwrap_err();
    assert_eq!(err.path(), "actuators/lamp/command");
    assert!(matches!(
        err,
        GatewayError::Command {
            source: StoreError::Unreachable,
            ..
        }
    ));
}

#[test]
fn failed_subscribe_reports_once_and_returns_inert_handle() {
    let backend = Backend::new();
    backend.store.set_reachable(false);
    let (seen, on_value) = collect::<f64>();
    let (errors, on_error) = collect::<GatewayError>();
    let sub = backend
        .gateway
        .subscribe_current(SensorKey::AirTemp, on_value, on_error);

    assert!(!sub.is_active());
    backend.store.set_reachable(true);
    backend.store.put("sensors/airTemp/current", json!({ "value": 27.0 }));

    assert!(seen.lock().unwrap().is_empty());
    let errors = errors.lock().unwrap();
    assert_eq!(errors.len(), 1);
    assert!(matches!(errors[0], GatewayError::Subscribe { .. }));
}

#[test]
fn dropping_the_handle_stops_delivery() {
    let backend = Backend::new();
    let (seen, on_value) = collect::<f64>();
    let (_errors, on_error) = collect::<GatewayError>();
    let sub = backend
        .gateway
        .subscribe_current(SensorKey::Light, on_value, on_error);

    backend.store.put("sensors/light/current", json!(10.0));
    drop(sub);
    backend.store.put("sensors/light/current", json!(11.0));

    assert_eq!(*seen.lock().unwrap(), [10.0]);
    assert_eq!(backend.store.watcher_count(), 0);
}
