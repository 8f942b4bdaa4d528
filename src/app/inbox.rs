//! Bounded fan-in queue between live subscriptions and the orchestrator.
//!
//! Subscription callbacks push from whatever thread the store delivers on;
//! the orchestrator drains with [`Inbox::try_receive`] or awaits
//! [`Inbox::receive`].  State updates are per-stream "latest value wins",
//! so when the queue is full it is compacted down to the newest update of
//! each stream instead of dropping the incoming message.  Only failure
//! reports are ever discarded, oldest first.

use std::cell::RefCell;
use std::collections::VecDeque;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use log::warn;

use crate::error::GatewayError;
use crate::model::{ActuatorKey, SensorKey};
use crate::state::StateUpdate;

use super::commands::RemoteRequest;

pub const INBOX_DEPTH: usize = 64;

/// One message on the live fan-in queue.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    Update(StateUpdate),
    TransportError(GatewayError),
    CommandFailed(RemoteRequest, GatewayError),
}

/// The remote node an update came from.  Two updates with the same key
/// replace each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StreamKey {
    Current(SensorKey),
    Series(SensorKey),
    Actuator(ActuatorKey),
    Mode,
}

impl Inbound {
    fn stream(&self) -> Option<StreamKey> {
        let Inbound::Update(update) = self else {
            return None;
        };
        Some(match update {
            StateUpdate::Current { key, .. } => StreamKey::Current(*key),
            StateUpdate::Series { key, .. } => StreamKey::Series(*key),
            StateUpdate::Actuator { key, .. } => StreamKey::Actuator(*key),
            StateUpdate::Mode(_) => StreamKey::Mode,
        })
    }
}

pub struct Inbox {
    pending: Mutex<CriticalSectionRawMutex, RefCell<VecDeque<Inbound>>>,
    ready: Signal<CriticalSectionRawMutex, ()>,
}

impl Default for Inbox {
    fn default() -> Self {
        Self::new()
    }
}

impl Inbox {
    pub const fn new() -> Self {
        Self {
            pending: Mutex::new(RefCell::new(VecDeque::new())),
            ready: Signal::new(),
        }
    }

    /// Queue `msg`.  Never blocks and never loses the newest update of a
    /// stream.
    pub fn push(&self, msg: Inbound) {
        self.pending.lock(|cell| {
            let mut queue = cell.borrow_mut();
            if queue.len() >= INBOX_DEPTH {
                compact(&mut queue);
            }
            if queue.len() >= INBOX_DEPTH {
                let oldest = queue
                    .iter()
                    .position(|m| m.stream().is_none())
                    .unwrap_or(0);
                queue.remove(oldest);
                warn!("Live: inbound queue full, dropped oldest failure report");
            }
            queue.push_back(msg);
        });
        self.ready.signal(());
    }

    pub fn try_receive(&self) -> Option<Inbound> {
        self.pending.lock(|cell| cell.borrow_mut().pop_front())
    }

    /// Wait for the next message.  Single consumer.
    pub async fn receive(&self) -> Inbound {
        loop {
            if let Some(msg) = self.try_receive() {
                return msg;
            }
            self.ready.wait().await;
        }
    }
}

/// Keep only the newest update per stream, in arrival order of those
/// newest updates.  Failure reports are kept untouched.
fn compact(queue: &mut VecDeque<Inbound>) {
    let before = queue.len();
    let mut seen: Vec<StreamKey> = Vec::new();
    let mut kept: VecDeque<Inbound> = VecDeque::with_capacity(before);
    while let Some(msg) = queue.pop_back() {
        match msg.stream() {
            Some(key) if seen.contains(&key) => continue,
            Some(key) => seen.push(key),
            None => {}
        }
        kept.push_front(msg);
    }
    *queue = kept;
    if queue.len() < before {
        warn!(
            "Live: inbound queue full, coalesced {} superseded update(s)",
            before - queue.len()
        );
    }
}
