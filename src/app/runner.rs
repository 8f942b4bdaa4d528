//! Orchestration loops: the single writer of the dashboard snapshot.
//!
//! ```text
//!  demo:  Ticker ───────┐
//!         commands ─────┼──▶ DashboardService ──▶ EventSink
//!         stop ─────────┘
//!
//!  live:  12 subscriptions ─▶ Inbox ─┐
//!         commands ──────────────────┼─▶ DashboardService
//!         stop ──────────────────────┘        │
//!         RemoteRequest tasks (LocalExecutor) ◀┘
//! ```
//!
//! Both loops check the stop signal before every step, so once it is
//! observed no further tick or merge is applied, even one that was
//! already due.

use std::sync::Arc;

use edge_executor::LocalExecutor;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_sync::signal::Signal;
use embassy_time::{Duration, Ticker};
use futures_lite::future;
use log::{debug, info};
use rand::Rng;

use crate::error::GatewayError;
use crate::gateway::Unsubscribe;
use crate::model::{ActuatorKey, SensorKey};
use crate::sensors::TelemetrySimulator;
use crate::state::StateUpdate;

use super::commands::{OperatorCommand, RemoteRequest};
use super::inbox::{Inbound, Inbox};
use super::ports::{Clock, EventSink, OnError, SyncGateway};
use super::service::DashboardService;

/// Operator commands from the console thread.
pub type CommandChannel = Channel<CriticalSectionRawMutex, OperatorCommand, 8>;

/// Session stop token.
pub type StopSignal = Signal<CriticalSectionRawMutex, ()>;

// ───────────────────────────────────────────────────────────────
// Demo loop
// ───────────────────────────────────────────────────────────────

enum DemoStep {
    Stop,
    Command(OperatorCommand),
    Tick,
}

/// Advance the simulator every `tick_every` until `stop` is signalled.
/// Returns the number of ticks applied by this call.
///
/// Remote requests produced by commands are discarded: there is no
/// backend in demo mode.
pub async fn run_demo<R: Rng>(
    service: &mut DashboardService,
    sim: &mut TelemetrySimulator<R>,
    clock: &dyn Clock,
    tick_every: Duration,
    commands: &CommandChannel,
    stop: &StopSignal,
    sink: &mut impl EventSink,
) -> u64 {
    let first = service.tick_count();
    let mut ticker = Ticker::every(tick_every);
    info!("Demo loop running, tick every {}ms", tick_every.as_millis());

    loop {
        if stop.signaled() {
            break;
        }
        let step = future::or(
            async {
                stop.wait().await;
                DemoStep::Stop
            },
            future::or(async { DemoStep::Command(commands.receive().await) }, async {
                ticker.next().await;
                DemoStep::Tick
            }),
        )
        .await;

        match step {
            DemoStep::Stop => break,
            DemoStep::Command(cmd) => {
                let requests = service.handle_command(cmd, sink);
                if !requests.is_empty() {
                    debug!("Demo: {} remote request(s) not sent", requests.len());
                }
            }
            DemoStep::Tick => {
                // A tick that raced the stop signal is dropped.
                if stop.signaled() {
                    break;
                }
                service.tick(sim, clock.now_ms(), sink);
            }
        }
    }

    service.stop(sink);
    service.tick_count() - first
}

// ───────────────────────────────────────────────────────────────
// Live session
// ───────────────────────────────────────────────────────────────

/// The full subscription set for one live dashboard session.
///
/// Subscription callbacks only enqueue; merging happens on the
/// orchestrator in [`pump`](Self::pump) or [`run_live`].
pub struct LiveSession {
    inbound: Arc<Inbox>,
    subscriptions: Vec<Unsubscribe>,
}

impl LiveSession {
    /// Subscribe to current value and series for every sensor, state for
    /// every actuator, and the mode.  `clock` stamps scalar readings on
    /// receipt.
    pub fn open<G: SyncGateway>(gateway: &G, clock: Arc<dyn Clock>) -> Self {
        let inbound = Arc::new(Inbox::new());
        let mut subscriptions = Vec::with_capacity(SensorKey::ALL.len() * 2 + ActuatorKey::ALL.len() + 1);

        for key in SensorKey::ALL {
            let tx = Arc::clone(&inbound);
            let clock = Arc::clone(&clock);
            subscriptions.push(gateway.subscribe_current(
                key,
                Box::new(move |value| {
                    let at_ms = clock.now_ms();
                    tx.push(Inbound::Update(StateUpdate::Current { key, value, at_ms }));
                }),
                report_errors(&inbound),
            ));

            let tx = Arc::clone(&inbound);
            subscriptions.push(gateway.subscribe_series(
                key,
                Box::new(move |points| {
                    tx.push(Inbound::Update(StateUpdate::Series { key, points }));
                }),
                report_errors(&inbound),
            ));
        }

        for key in ActuatorKey::ALL {
            let tx = Arc::clone(&inbound);
            subscriptions.push(gateway.subscribe_actuator(
                key,
                Box::new(move |is_on| {
                    tx.push(Inbound::Update(StateUpdate::Actuator { key, is_on }));
                }),
                report_errors(&inbound),
            ));
        }

        let tx = Arc::clone(&inbound);
        subscriptions.push(gateway.subscribe_mode(
            Box::new(move |mode| tx.push(Inbound::Update(StateUpdate::Mode(mode)))),
            report_errors(&inbound),
        ));

        let session = Self {
            inbound,
            subscriptions,
        };
        info!(
            "Live session open: {}/{} subscriptions active",
            session.active_subscriptions(),
            session.subscriptions.len()
        );
        session
    }

    pub fn active_subscriptions(&self) -> usize {
        self.subscriptions.iter().filter(|s| s.is_active()).count()
    }

    /// Merge everything queued so far.  Returns the number of messages
    /// handled.
    pub fn pump(&self, service: &mut DashboardService, sink: &mut impl EventSink) -> usize {
        let mut handled = 0;
        while let Some(msg) = self.inbound.try_receive() {
            dispatch(service, msg, sink);
            handled += 1;
        }
        handled
    }

    /// Cancel every subscription.  Each handle is released once; calling
    /// `close` again does nothing.  Returns how many were still active.
    pub fn close(&mut self) -> usize {
        let active = self.active_subscriptions();
        for sub in &mut self.subscriptions {
            sub.cancel();
        }
        self.subscriptions.clear();
        if active > 0 {
            info!("Live session closed ({} subscriptions released)", active);
        }
        active
    }
}

fn report_errors(inbound: &Arc<Inbox>) -> OnError<GatewayError> {
    let tx = Arc::clone(inbound);
    Box::new(move |error| tx.push(Inbound::TransportError(error)))
}

fn dispatch(service: &mut DashboardService, msg: Inbound, sink: &mut impl EventSink) {
    match msg {
        Inbound::Update(update) => service.apply_update(&update, sink),
        Inbound::TransportError(error) => service.report_transport_error(error, sink),
        Inbound::CommandFailed(request, error) => {
            service.report_command_failed(request, error, sink);
        }
    }
}

enum LiveStep {
    Stop,
    Command(OperatorCommand),
    Inbound(Inbound),
}

/// Drive a live session until `stop` is signalled, then close it.
///
/// Commands are applied optimistically and their remote writes spawned on
/// `executor`, so several can be in flight at once.  A failed write comes
/// back through the [`Inbox`] as [`Inbound::CommandFailed`].
pub async fn run_live<'a, G, const C: usize>(
    executor: &LocalExecutor<'a, C>,
    gateway: &G,
    session: &mut LiveSession,
    service: &mut DashboardService,
    commands: &CommandChannel,
    stop: &StopSignal,
    sink: &mut impl EventSink,
) where
    G: SyncGateway + Clone + 'a,
{
    session.pump(service, sink);

    loop {
        let inbound = Arc::clone(&session.inbound);
        let step = future::or(
            async {
                stop.wait().await;
                LiveStep::Stop
            },
            future::or(async { LiveStep::Command(commands.receive().await) }, async {
                LiveStep::Inbound(inbound.receive().await)
            }),
        )
        .await;

        match step {
            LiveStep::Stop => break,
            LiveStep::Command(cmd) => {
                for request in service.handle_command(cmd, sink) {
                    spawn_request(executor, gateway.clone(), request, Arc::clone(&session.inbound));
                }
            }
            LiveStep::Inbound(msg) => {
                if stop.signaled() {
                    break;
                }
                dispatch(service, msg, sink);
            }
        }
    }

    session.close();
    service.stop(sink);
}

fn spawn_request<'a, G, const C: usize>(
    executor: &LocalExecutor<'a, C>,
    gateway: G,
    request: RemoteRequest,
    inbound: Arc<Inbox>,
) where
    G: SyncGateway + 'a,
{
    debug!("Live: sending {}", request);
    executor
        .spawn(async move {
            let result = match request {
                RemoteRequest::Actuator(key, on) => gateway.request_actuator_command(key, on).await,
                RemoteRequest::Mode(mode) => gateway.request_mode_change(mode).await,
            };
            if let Err(error) = result {
                inbound.push(Inbound::CommandFailed(request, error));
            }
        })
        .detach();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::time::FixedClock;
    use crate::app::events::AppEvent;
    use crate::config::DataSource;
    use crate::control::AutoController;
    use crate::sensors::noise::GaussianNoise;
    use crate::sensors::signal::DayClock;
    use futures_lite::future::block_on;

    struct StopAfter<'s> {
        stop: &'s StopSignal,
        telemetry: u64,
        limit: u64,
    }

    impl EventSink for StopAfter<'_> {
        fn emit(&mut self, event: &AppEvent) {
            if matches!(event, AppEvent::Telemetry(_)) {
                self.telemetry += 1;
                if self.telemetry == self.limit {
                    self.stop.signal(());
                }
            }
        }
    }

    fn demo() -> (DashboardService, TelemetrySimulator) {
        let mut sim = TelemetrySimulator::new(
            GaussianNoise::seeded(1),
            DayClock::UTC,
            Box::new(AutoController::default()),
        );
        let svc = DashboardService::new(sim.initial_state(1_700_000_000_000), DataSource::Demo);
        (svc, sim)
    }

    #[test]
    fn stop_before_start_runs_zero_ticks() {
        let (mut svc, mut sim) = demo();
        let stop = StopSignal::new();
        let commands = CommandChannel::new();
        stop.signal(());
        let mut sink = StopAfter {
            stop: &stop,
            telemetry: 0,
            limit: u64::MAX,
        };
        let ticks = block_on(run_demo(
            &mut svc,
            &mut sim,
            &FixedClock::new(0),
            Duration::from_millis(1),
            &commands,
            &stop,
            &mut sink,
        ));
        assert_eq!(ticks, 0);
        assert_eq!(sink.telemetry, 0);
    }

    #[test]
    fn stop_inside_tick_prevents_further_ticks() {
        let (mut svc, mut sim) = demo();
        let stop = StopSignal::new();
        let commands = CommandChannel::new();
        let mut sink = StopAfter {
            stop: &stop,
            telemetry: 0,
            limit: 3,
        };
        let ticks = block_on(run_demo(
            &mut svc,
            &mut sim,
            &FixedClock::new(0),
            Duration::from_millis(1),
            &commands,
            &stop,
            &mut sink,
        ));
        assert_eq!(ticks, 3);
        assert_eq!(sink.telemetry, 3);
    }
}
