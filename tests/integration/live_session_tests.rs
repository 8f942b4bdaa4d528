//! LiveSession and run_live against a MemoryStore backend.

use std::sync::Arc;

use edge_executor::LocalExecutor;
use futures_lite::future::block_on;
use serde_json::json;

use growdash::app::commands::{OperatorCommand, RemoteRequest};
use growdash::app::events::{AppEvent, Origin};
use growdash::app::inbox::INBOX_DEPTH;
use growdash::app::ports::RealtimeStore;
use growdash::app::runner::{CommandChannel, LiveSession, StopSignal, run_live};
use growdash::app::service::DashboardService;
use growdash::config::DataSource;
use growdash::error::{GatewayError, StoreError};
use growdash::model::{ActuatorKey, Mode, SensorKey, SensorPoint};
use growdash::state::DashboardState;

use crate::mock_store::{Backend, NOW, Recorder, StopOn};

const SUBSCRIPTIONS: usize = 12;

fn live_service() -> DashboardService {
    DashboardService::new(DashboardState::empty(), DataSource::Live)
}

// ── Subscriptions and merging ────────────────────────────────

#[test]
fn open_subscribes_to_every_stream() {
    let backend = Backend::new();
    let session = LiveSession::open(&backend.gateway, backend.dyn_clock());
    assert_eq!(session.active_subscriptions(), SUBSCRIPTIONS);
    assert_eq!(backend.store.watcher_count(), SUBSCRIPTIONS);
}

#[test]
fn seeded_backend_is_merged_on_pump() {
    let backend = Backend::new();
    backend.seed();
    let session = LiveSession::open(&backend.gateway, backend.dyn_clock());
    let mut service = live_service();
    let mut sink = Recorder::default();

    assert!(session.pump(&mut service, &mut sink) > 0);

    let snap = service.snapshot();
    assert_eq!(snap.mode, Mode::Manual);
    assert!(snap.is_on(ActuatorKey::Lamp));
    assert!(!snap.is_on(ActuatorKey::Fan));
    assert_eq!(snap.current[SensorKey::Light], 42.0);
    assert_eq!(
        snap.series[SensorKey::Light].last(),
        Some(&SensorPoint::new(NOW, 42.0))
    );
    // Keys nobody wrote stay at their initial values.
    assert!(snap.series[SensorKey::AirTemp].is_empty());
    assert!(snap.is_consistent());
}

#[test]
fn scalar_readings_are_stamped_on_receipt() {
    let backend = Backend::new();
    let session = LiveSession::open(&backend.gateway, backend.dyn_clock());
    let mut service = live_service();
    let mut sink = Recorder::default();

    backend.clock.set(NOW + 5_000);
    backend.store.put("sensors/airTemp/current", json!({ "value": 27.5 }));
    session.pump(&mut service, &mut sink);

    let snap = service.snapshot();
    assert_eq!(snap.current[SensorKey::AirTemp], 27.5);
    assert_eq!(
        snap.series[SensorKey::AirTemp].last(),
        Some(&SensorPoint::new(NOW + 5_000, 27.5))
    );
}

#[test]
fn remote_state_overrides_optimistic_change() {
    let backend = Backend::new();
    backend.seed();
    let session = LiveSession::open(&backend.gateway, backend.dyn_clock());
    let mut service = live_service();
    let mut sink = Recorder::default();
    session.pump(&mut service, &mut sink);

    let requests = service.handle_command(OperatorCommand::SetActuator(ActuatorKey::Fan, true), &mut sink);
    assert_eq!(requests, [RemoteRequest::Actuator(ActuatorKey::Fan, true)]);
    assert!(service.snapshot().is_on(ActuatorKey::Fan));

    backend.store.put("actuators/fan/state", json!({ "isOn": false }));
    session.pump(&mut service, &mut sink);

    assert!(!service.snapshot().is_on(ActuatorKey::Fan));
    assert_eq!(
        sink.snapshot().last(),
        Some(&AppEvent::ActuatorChanged {
            key: ActuatorKey::Fan,
            is_on: false,
            origin: Origin::Remote
        })
    );
}

#[test]
fn write_burst_past_queue_depth_keeps_latest_value() {
    let backend = Backend::new();
    let session = LiveSession::open(&backend.gateway, backend.dyn_clock());
    let mut service = live_service();
    let mut sink = Recorder::default();

    for i in 0..=INBOX_DEPTH {
        let mode = if i % 2 == 0 { "manual" } else { "auto" };
        backend.store.put("system/mode", json!(mode));
    }
    backend.store.put("actuators/pump/state", json!({ "isOn": true }));

    let handled = session.pump(&mut service, &mut sink);
    assert!(handled < SUBSCRIPTIONS + INBOX_DEPTH);
    assert_eq!(service.mode(), Mode::Manual);
    assert!(service.snapshot().is_on(ActuatorKey::Pump));
    assert_eq!(sink.count(|e| matches!(e, AppEvent::TransportError(_))), 0);
}

// ── Failures ──────────────────────────────────────────────────

#[test]
fn unreachable_backend_reports_each_subscription() {
    let backend = Backend::new();
    backend.store.set_reachable(false);
    let session = LiveSession::open(&backend.gateway, backend.dyn_clock());
    let mut service = live_service();
    let mut sink = Recorder::default();

    assert_eq!(session.active_subscriptions(), 0);
    assert_eq!(session.pump(&mut service, &mut sink), SUBSCRIPTIONS);
    assert_eq!(
        sink.count(|e| matches!(e, AppEvent::TransportError(GatewayError::Subscribe { .. }))),
        SUBSCRIPTIONS
    );
    assert_eq!(*service.snapshot(), DashboardState::empty());
}

#[test]
fn stream_failure_keeps_last_known_state() {
    let backend = Backend::new();
    backend.seed();
    let session = LiveSession::open(&backend.gateway, backend.dyn_clock());
    let mut service = live_service();
    let mut sink = Recorder::default();
    session.pump(&mut service, &mut sink);
    let before = service.snapshot();

    backend.store.fail_watchers(StoreError::Transport("connection reset".into()));
    session.pump(&mut service, &mut sink);

    assert_eq!(service.snapshot(), before);
    assert_eq!(
        sink.count(|e| matches!(e, AppEvent::TransportError(GatewayError::Stream { .. }))),
        SUBSCRIPTIONS
    );
}

#[test]
fn close_releases_each_subscription_once() {
    let backend = Backend::new();
    let mut session = LiveSession::open(&backend.gateway, backend.dyn_clock());
    let mut service = live_service();
    let mut sink = Recorder::default();
    session.pump(&mut service, &mut sink);

    assert_eq!(session.close(), SUBSCRIPTIONS);
    assert_eq!(backend.store.watcher_count(), 0);
    assert_eq!(session.close(), 0);

    backend.store.put("system/mode", json!("manual"));
    assert_eq!(session.pump(&mut service, &mut sink), 0);
    assert_eq!(service.mode(), Mode::Auto);
}

// ── run_live ──────────────────────────────────────────────────

#[test]
fn run_live_writes_manual_command() {
    let backend = Backend::new();
    backend.seed();
    let mut session = LiveSession::open(&backend.gateway, backend.dyn_clock());
    let mut service = live_service();
    let mut sink = Recorder::default();
    session.pump(&mut service, &mut sink);

    // Stop once the command node shows up in the backend.
    let stop = Arc::new(StopSignal::new());
    let written = Arc::clone(&stop);
    let _watch = backend
        .store
        .watch(
            "actuators/fan/command",
            Box::new(move |value| {
                if value.is_some() {
                    written.signal(());
                }
            }),
            Box::new(|_| {}),
        )
        .unwrap();

    let commands = CommandChannel::new();
    commands
        .try_send(OperatorCommand::SetActuator(ActuatorKey::Fan, true))
        .unwrap();

    let executor: LocalExecutor<'_, 8> = LocalExecutor::new();
    block_on(executor.run(run_live(
        &executor,
        &backend.gateway,
        &mut session,
        &mut service,
        &commands,
        &stop,
        &mut sink,
    )));

    assert_eq!(
        backend.store.get("actuators/fan/command"),
        Some(json!({ "isOn": true, "timestamp": NOW }))
    );
    assert!(service.snapshot().is_on(ActuatorKey::Fan));
    assert_eq!(session.active_subscriptions(), 0);
    // Only the test's own watcher is left.
    assert_eq!(backend.store.watcher_count(), 1);
    assert!(matches!(sink.snapshot().last(), Some(AppEvent::Stopped { .. })));
}

#[test]
fn run_live_keeps_optimistic_state_when_write_fails() {
    let backend = Backend::new();
    backend.seed();
    let mut session = LiveSession::open(&backend.gateway, backend.dyn_clock());
    let mut service = live_service();
    let recorder = Recorder::default();
    let stop = StopSignal::new();
    let mut sink = StopOn {
        inner: recorder.clone(),
        stop: &stop,
        pred: |e: &AppEvent| matches!(e, AppEvent::CommandFailed { .. }),
    };
    session.pump(&mut service, &mut sink);
    backend.store.set_reachable(false);

    let commands = CommandChannel::new();
    commands
        .try_send(OperatorCommand::SetActuator(ActuatorKey::Lamp, false))
        .unwrap();

    let executor: LocalExecutor<'_, 8> = LocalExecutor::new();
    block_on(executor.run(run_live(
        &executor,
        &backend.gateway,
        &mut session,
        &mut service,
        &commands,
        &stop,
        &mut sink,
    )));

    assert!(!service.snapshot().is_on(ActuatorKey::Lamp));
    assert_eq!(backend.store.get("actuators/lamp/command"), None);
    let failed: Vec<_> = recorder
        .snapshot()
        .into_iter()
        .filter_map(|e| match e {
            AppEvent::CommandFailed { request, error } => Some((request, error)),
            _ => None,
        })
        .collect();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].0, RemoteRequest::Actuator(ActuatorKey::Lamp, false));
    assert_eq!(failed[0].1.path(), "actuators/lamp/command");
}

#[test]
fn run_live_ignores_actuator_commands_in_auto() {
    let backend = Backend::new();
    let mut session = LiveSession::open(&backend.gateway, backend.dyn_clock());
    let mut service = live_service();
    let recorder = Recorder::default();
    let stop = StopSignal::new();
    let mut sink = StopOn {
        inner: recorder.clone(),
        stop: &stop,
        pred: |e: &AppEvent| matches!(e, AppEvent::CommandIgnored { .. }),
    };

    let commands = CommandChannel::new();
    commands.try_send(OperatorCommand::SetAll(true)).unwrap();

    let executor: LocalExecutor<'_, 8> = LocalExecutor::new();
    block_on(executor.run(run_live(
        &executor,
        &backend.gateway,
        &mut session,
        &mut service,
        &commands,
        &stop,
        &mut sink,
    )));

    assert_eq!(service.mode(), Mode::Auto);
    for key in ActuatorKey::ALL {
        assert!(!service.snapshot().is_on(key));
        assert_eq!(backend.store.get(&format!("actuators/{key}/command")), None);
    }
    assert_eq!(
        recorder.count(|e| matches!(e, AppEvent::CommandIgnored { mode: Mode::Auto, .. })),
        1
    );
}
