//! REST realtime-database adapter (feature `live`).
//!
//! Talks to a Firebase-style realtime database over its REST surface:
//! `GET {base}/{path}.json` reads a node (JSON `null` when absent) and
//! `PUT {base}/{path}.json` replaces it.  Watching is implemented by
//! polling each path on its own thread and delivering only changes.
//!
//! Writes run the blocking request on a short-lived thread and hand the
//! outcome back through an embassy [`Signal`], so the orchestrator's
//! executor keeps running while a request is in flight.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use log::{debug, info, warn};
use reqwest::blocking::Client;
use serde_json::Value;

use super::utils::is_printable_ascii;
use crate::app::ports::{OnError, OnUpdate, RealtimeStore};
use crate::config::LiveConfig;
use crate::error::StoreError;
use crate::gateway::{Unsubscribe, paths};

type Outcome = Signal<CriticalSectionRawMutex, Result<(), StoreError>>;

#[derive(Clone)]
pub struct RestStore {
    client: Client,
    base_url: String,
    auth_token: Option<String>,
    poll_interval: Duration,
}

impl RestStore {
    pub fn new(config: &LiveConfig) -> Result<Self, StoreError> {
        let base_url = config
            .database_url
            .as_deref()
            .map(|u| u.trim().trim_end_matches('/').to_owned())
            .filter(|u| !u.is_empty())
            .ok_or_else(|| StoreError::Transport("no database URL configured".into()))?;
        if let Some(token) = &config.auth_token {
            if !is_printable_ascii(token) {
                return Err(StoreError::Transport("auth token contains invalid characters".into()));
            }
        }
        let client = Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()
            .map_err(|e| StoreError::Transport(e.to_string()))?;
        info!("RestStore: using {}", base_url);
        Ok(Self {
            client,
            base_url,
            auth_token: config.auth_token.clone(),
            poll_interval: Duration::from_millis(config.poll_interval_ms),
        })
    }

    /// `{base}/{path}.json[?auth=token]`
    pub fn url(&self, path: &str) -> String {
        let path = paths::segments(path).collect::<Vec<_>>().join("/");
        match &self.auth_token {
            Some(token) => format!("{}/{}.json?auth={}", self.base_url, path, token),
            None => format!("{}/{}.json", self.base_url, path),
        }
    }

    fn fetch(client: &Client, url: &str) -> Result<Option<Value>, StoreError> {
        let resp = client.get(url).send().map_err(map_reqwest)?;
        let status = resp.status();
        if !status.is_success() {
            return Err(StoreError::Transport(format!("HTTP {status}")));
        }
        let value: Value = resp
            .json()
            .map_err(|e| StoreError::InvalidResponse(e.to_string()))?;
        Ok((!value.is_null()).then_some(value))
    }

    fn put(client: &Client, url: &str, value: &Value) -> Result<(), StoreError> {
        let resp = client.put(url).json(value).send().map_err(map_reqwest)?;
        let status = resp.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(StoreError::Transport(format!("HTTP {status}")))
        }
    }
}

fn map_reqwest(e: reqwest::Error) -> StoreError {
    if e.is_connect() || e.is_timeout() {
        StoreError::Unreachable
    } else {
        StoreError::Transport(e.to_string())
    }
}

impl RealtimeStore for RestStore {
    fn watch(
        &self,
        path: &str,
        mut on_value: OnUpdate<Option<Value>>,
        mut on_error: OnError<StoreError>,
    ) -> Result<Unsubscribe, StoreError> {
        let active = Arc::new(AtomicBool::new(true));
        let running = Arc::clone(&active);
        let client = self.client.clone();
        let url = self.url(path);
        let interval = self.poll_interval;
        let label = path.to_owned();

        std::thread::Builder::new()
            .name(format!("watch:{path}"))
            .spawn(move || {
                let mut last: Option<Option<Value>> = None;
                let mut failing = false;
                while running.load(Ordering::SeqCst) {
                    match Self::fetch(&client, &url) {
                        Ok(value) => {
                            if failing {
                                info!("RestStore: {} recovered", label);
                                failing = false;
                            }
                            let changed = last.as_ref() != Some(&value);
                            if changed && running.load(Ordering::SeqCst) {
                                last = Some(value.clone());
                                on_value(value);
                            }
                        }
                        // One report per failure streak.
                        Err(e) if !failing => {
                            failing = true;
                            if running.load(Ordering::SeqCst) {
                                on_error(e);
                            }
                        }
                        Err(e) => debug!("RestStore: {} still failing: {}", label, e),
                    }
                    std::thread::sleep(interval);
                }
                debug!("RestStore: watcher for {} exited", label);
            })
            .map_err(|e| StoreError::Spawn(e.to_string()))?;

        Ok(Unsubscribe::new(move || active.store(false, Ordering::SeqCst)))
    }

    async fn set(&self, path: &str, value: Value) -> Result<(), StoreError> {
        let outcome = Arc::new(Outcome::new());
        let done = Arc::clone(&outcome);
        let client = self.client.clone();
        let url = self.url(path);

        std::thread::Builder::new()
            .name("store-put".into())
            .spawn(move || done.signal(Self::put(&client, &url, &value)))
            .map_err(|e| StoreError::Spawn(e.to_string()))?;

        let result = outcome.wait().await;
        if let Err(e) = &result {
            warn!("RestStore: PUT {} failed: {}", path, e);
        }
        result
    }
}
