//! Shared fixtures: a seeded backend store, a fixed clock and recording sinks.

use std::sync::{Arc, Mutex};

use serde_json::{Value, json};

use growdash::adapters::memory_store::MemoryStore;
use growdash::adapters::time::FixedClock;
use growdash::app::events::AppEvent;
use growdash::app::ports::{Clock, EventSink};
use growdash::app::runner::StopSignal;
use growdash::gateway::StoreGateway;

pub const NOW: i64 = 1_700_000_000_000;

pub struct Backend {
    pub store: MemoryStore,
    pub clock: Arc<FixedClock>,
    pub gateway: StoreGateway<MemoryStore>,
}

impl Backend {
    pub fn new() -> Self {
        let store = MemoryStore::new();
        let clock = Arc::new(FixedClock::new(NOW));
        let gateway = StoreGateway::new(Arc::new(store.clone()), Arc::clone(&clock) as Arc<dyn Clock>);
        Self {
            store,
            clock,
            gateway,
        }
    }

    pub fn dyn_clock(&self) -> Arc<dyn Clock> {
        Arc::clone(&self.clock) as Arc<dyn Clock>
    }

    /// Populate every path the dashboard reads.
    pub fn seed(&self) {
        self.store.put(
            "sensors/light/series",
            json!([
                { "timestamp": NOW - 60_000, "value": 40.0 },
                { "timestamp": NOW, "value": 42.0 },
            ]),
        );
        self.store.put("sensors/light/current", json!({ "value": 42.0 }));
        self.store.put("actuators/lamp/state", json!({ "isOn": true }));
        self.store.put("system/mode", Value::String("manual".into()));
    }
}

/// Collects every event into a shared list.
#[derive(Default, Clone)]
pub struct Recorder {
    pub events: Arc<Mutex<Vec<AppEvent>>>,
}

impl EventSink for Recorder {
    fn emit(&mut self, event: &AppEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

impl Recorder {
    pub fn snapshot(&self) -> Vec<AppEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.lock().unwrap().iter().filter(|e| pred(e)).count()
    }
}

/// Records events and signals `stop` on the first one matching `pred`.
pub struct StopOn<'a, F> {
    pub inner: Recorder,
    pub stop: &'a StopSignal,
    pub pred: F,
}

impl<F: Fn(&AppEvent) -> bool> EventSink for StopOn<'_, F> {
    fn emit(&mut self, event: &AppEvent) {
        self.inner.emit(event);
        if (self.pred)(event) {
            self.stop.signal(());
        }
    }
}
