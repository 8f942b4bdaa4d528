//! GrowDash: main entry point.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    Adapters (outer ring)                     │
//! │                                                              │
//! │  console thread   LogEventSink   SystemClock   RestStore     │
//! │  (commands)       (EventSink)    (Clock)       (live only)   │
//! │                                                              │
//! │  ──────────────── Port Trait Boundary ───────────────────    │
//! │                                                              │
//! │  ┌──────────────────────────────────────────────────────┐    │
//! │  │       DashboardService (single snapshot owner)        │    │
//! │  │  demo: TelemetrySimulator · live: LiveSession         │    │
//! │  └──────────────────────────────────────────────────────┘    │
//! └──────────────────────────────────────────────────────────────┘
//! ```

#![deny(unused_must_use)]

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use edge_executor::LocalExecutor;
use embassy_sync::channel::Channel;
use embassy_sync::signal::Signal;
use embassy_time::Duration;
use futures_lite::future::block_on;
use log::{debug, info};

use growdash::adapters::console;
use growdash::adapters::log_sink::LogEventSink;
use growdash::adapters::preferences::FilePreferences;
use growdash::adapters::time::SystemClock;
use growdash::app::ports::Clock;
use growdash::app::runner::{CommandChannel, StopSignal, run_demo};
use growdash::app::service::DashboardService;
use growdash::config::{DashboardConfig, DataSource};
use growdash::model::SensorKey;
use growdash::sensors::TelemetrySimulator;

/// Operator commands: console thread → orchestrator.
static COMMANDS: CommandChannel = Channel::new();

/// Session stop: console `quit`/EOF or the `run_for_secs` timer.
static STOP: StopSignal = Signal::new();

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    info!("GrowDash v{} starting", env!("CARGO_PKG_VERSION"));

    // ── Configuration ──────────────────────────────────────────
    let explicit = std::env::var_os("DASHBOARD_CONFIG").map(PathBuf::from);
    let mut config = DashboardConfig::load_or_default(explicit.as_deref())?;
    config.apply_env(|key| std::env::var(key).ok())?;
    config.validate()?;
    config.log_summary();

    // ── Core ───────────────────────────────────────────────────
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let mut sim = TelemetrySimulator::from_config(&config);
    // Live mode starts from the simulated backfill until subscriptions deliver.
    let mut service = DashboardService::new(sim.initial_state(clock.now_ms()), config.source);
    let mut sink = LogEventSink::with_telemetry_every(config.telemetry_log_every);
    for key in SensorKey::ALL {
        let (min, max) = key.bounds();
        debug!("Sensor {}: {} [{}..{}] {}", key, key.label(), min, max, key.unit());
    }

    // ── Outer threads ──────────────────────────────────────────
    console::spawn(&COMMANDS, &STOP, FilePreferences::new(&config.preferences_path))
        .context("spawning console thread")?;
    if let Some(secs) = config.run_for_secs {
        std::thread::Builder::new()
            .name("run-for".into())
            .spawn(move || {
                std::thread::sleep(std::time::Duration::from_secs(secs));
                info!("run_for_secs={} elapsed, stopping", secs);
                STOP.signal(());
            })
            .context("spawning run-for timer")?;
    }

    service.start(&mut sink);
    let executor: LocalExecutor<'_, 16> = LocalExecutor::new();

    match config.source {
        DataSource::Demo => {
            let ticks = block_on(executor.run(run_demo(
                &mut service,
                &mut sim,
                clock.as_ref(),
                Duration::from_millis(config.tick_interval_ms),
                &COMMANDS,
                &STOP,
                &mut sink,
            )));
            info!("Demo finished after {} ticks", ticks);
        }
        DataSource::Live => run_live_source(&config, clock, &executor, &mut service, &mut sink)?,
    }

    let summary = serde_json::to_string(&service.snapshot().summary())?;
    info!("Final state: {}", summary);
    Ok(())
}

#[cfg(feature = "live")]
fn run_live_source(
    config: &DashboardConfig,
    clock: Arc<dyn Clock>,
    executor: &LocalExecutor<'_, 16>,
    service: &mut DashboardService,
    sink: &mut LogEventSink,
) -> Result<()> {
    use growdash::adapters::rest_store::RestStore;
    use growdash::app::runner::{LiveSession, run_live};
    use growdash::gateway::StoreGateway;

    let store = RestStore::new(&config.live).context("configuring live store")?;
    let gateway = StoreGateway::new(Arc::new(store), Arc::clone(&clock));
    let mut session = LiveSession::open(&gateway, clock);
    block_on(executor.run(run_live(
        executor,
        &gateway,
        &mut session,
        service,
        &COMMANDS,
        &STOP,
        sink,
    )));
    Ok(())
}

#[cfg(not(feature = "live"))]
fn run_live_source(
    _config: &DashboardConfig,
    _clock: Arc<dyn Clock>,
    _executor: &LocalExecutor<'_, 16>,
    _service: &mut DashboardService,
    _sink: &mut LogEventSink,
) -> Result<()> {
    anyhow::bail!("live source requested but this build has no `live` feature")
}
