//! In-process hierarchical push store.
//!
//! Implements [`RealtimeStore`] over a `serde_json::Value` tree shared
//! through `Arc`, so clones of a [`MemoryStore`] see the same data.  Used
//! as the backend in tests and for running the live session offline.
//!
//! Semantics follow a realtime database:
//!
//! - a watcher receives the node's value immediately, then on every write
//!   at, above or below its path that changes the value;
//! - writing `null` deletes the node and prunes empty parents;
//! - callbacks run after the tree lock is released, but deliveries are
//!   serialized, so watchers see values in the order they were stored.
//!   A callback must not write back into the same store.
//!
//! Failure injection: [`set_reachable(false)`](MemoryStore::set_reachable)
//! makes `watch` and `set` fail with [`StoreError::Unreachable`];
//! [`fail_watchers`](MemoryStore::fail_watchers) pushes a stream error to
//! every active watcher.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Weak};

use log::debug;
use serde_json::{Map, Value};

use super::utils::lock;
use crate::app::ports::{OnError, OnUpdate, RealtimeStore};
use crate::error::StoreError;
use crate::gateway::{Unsubscribe, paths};

type SharedUpdate = Arc<Mutex<OnUpdate<Option<Value>>>>;
type SharedError = Arc<Mutex<OnError<StoreError>>>;
type Delivery = (Arc<AtomicBool>, SharedUpdate, Option<Value>);

struct Watcher {
    id: u64,
    path: Vec<String>,
    last: Option<Value>,
    active: Arc<AtomicBool>,
    on_value: SharedUpdate,
    on_error: SharedError,
}

struct Inner {
    root: Value,
    watchers: Vec<Watcher>,
    next_id: u64,
    reachable: bool,
}

#[derive(Clone)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
    // Held from tree update through callback delivery.  Lock order:
    // `delivery`, then `inner`.
    delivery: Arc<Mutex<()>>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                root: Value::Object(Map::new()),
                watchers: Vec::new(),
                next_id: 0,
                reachable: true,
            })),
            delivery: Arc::new(Mutex::new(())),
        }
    }

    /// Synchronous write, notifying affected watchers before returning.
    /// Ignores reachability; this is the backend side of the store.
    pub fn put(&self, path: &str, value: Value) {
        let segs: Vec<&str> = paths::segments(path).collect();
        let _serial = lock(&self.delivery);
        let deliveries = {
            let mut inner = lock(&self.inner);
            if value.is_null() {
                remove(&mut inner.root, &segs);
            } else {
                write(&mut inner.root, &segs, value);
            }
            inner.collect_changes(&segs)
        };
        for (active, on_value, value) in deliveries {
            if active.load(Ordering::SeqCst) {
                let mut cb = lock(&on_value);
                (*cb)(value);
            }
        }
    }

    /// Current value at `path`, `None` when absent.
    pub fn get(&self, path: &str) -> Option<Value> {
        let segs: Vec<&str> = paths::segments(path).collect();
        read(&lock(&self.inner).root, &segs)
    }

    pub fn set_reachable(&self, reachable: bool) {
        lock(&self.inner).reachable = reachable;
    }

    /// Report `error` to every active watcher.
    pub fn fail_watchers(&self, error: StoreError) {
        let _serial = lock(&self.delivery);
        let targets: Vec<(Arc<AtomicBool>, SharedError)> = lock(&self.inner)
            .watchers
            .iter()
            .map(|w| (w.active.clone(), w.on_error.clone()))
            .collect();
        for (active, on_error) in targets {
            if active.load(Ordering::SeqCst) {
                let mut cb = lock(&on_error);
                (*cb)(error.clone());
            }
        }
    }

    /// Number of watchers that have not been cancelled.
    pub fn watcher_count(&self) -> usize {
        lock(&self.inner).watchers.len()
    }
}

impl Inner {
    /// Recompute every watcher overlapping `changed` and return the ones
    /// whose value differs from what they last saw.
    fn collect_changes(&mut self, changed: &[&str]) -> Vec<Delivery> {
        let root = &self.root;
        let mut out = Vec::new();
        for w in &mut self.watchers {
            if !overlaps(&w.path, changed) {
                continue;
            }
            let segs: Vec<&str> = w.path.iter().map(String::as_str).collect();
            let now = read(root, &segs);
            if now != w.last {
                w.last = now.clone();
                out.push((w.active.clone(), w.on_value.clone(), now));
            }
        }
        out
    }
}

impl RealtimeStore for MemoryStore {
    fn watch(
        &self,
        path: &str,
        on_value: OnUpdate<Option<Value>>,
        on_error: OnError<StoreError>,
    ) -> Result<Unsubscribe, StoreError> {
        let segs: Vec<&str> = paths::segments(path).collect();
        let active = Arc::new(AtomicBool::new(true));
        let on_value: SharedUpdate = Arc::new(Mutex::new(on_value));

        let _serial = lock(&self.delivery);
        let (id, initial) = {
            let mut inner = lock(&self.inner);
            if !inner.reachable {
                return Err(StoreError::Unreachable);
            }
            let id = inner.next_id;
            inner.next_id += 1;
            let initial = read(&inner.root, &segs);
            inner.watchers.push(Watcher {
                id,
                path: segs.iter().map(|s| (*s).to_owned()).collect(),
                last: initial.clone(),
                active: active.clone(),
                on_value: on_value.clone(),
                on_error: Arc::new(Mutex::new(on_error)),
            });
            (id, initial)
        };
        debug!("MemoryStore: watch #{} on {}", id, path);

        {
            let mut cb = lock(&on_value);
            (*cb)(initial);
        }

        let weak: Weak<Mutex<Inner>> = Arc::downgrade(&self.inner);
        Ok(Unsubscribe::new(move || {
            active.store(false, Ordering::SeqCst);
            if let Some(inner) = weak.upgrade() {
                lock(&inner).watchers.retain(|w| w.id != id);
            }
        }))
    }

    async fn set(&self, path: &str, value: Value) -> Result<(), StoreError> {
        if !lock(&self.inner).reachable {
            return Err(StoreError::Unreachable);
        }
        self.put(path, value);
        Ok(())
    }
}

// ── Tree helpers ──────────────────────────────────────────────

fn overlaps(watched: &[String], changed: &[&str]) -> bool {
    watched.iter().zip(changed).all(|(a, b)| a == b)
}

fn read(root: &Value, segs: &[&str]) -> Option<Value> {
    let mut node = root;
    for seg in segs {
        node = match node {
            Value::Object(map) => map.get(*seg)?,
            Value::Array(items) => items.get(seg.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    (!node.is_null()).then(|| node.clone())
}

fn as_map(node: &mut Value) -> &mut Map<String, Value> {
    if !node.is_object() {
        *node = Value::Object(Map::new());
    }
    match node {
        Value::Object(map) => map,
        _ => unreachable!("node was just replaced with an object"),
    }
}

fn write(root: &mut Value, segs: &[&str], value: Value) {
    let Some((last, parents)) = segs.split_last() else {
        *root = value;
        return;
    };
    let mut node = root;
    for seg in parents {
        node = as_map(node)
            .entry((*seg).to_owned())
            .or_insert_with(|| Value::Object(Map::new()));
    }
    as_map(node).insert((*last).to_owned(), value);
}

/// Delete the node at `segs`, pruning parents left empty.
fn remove(node: &mut Value, segs: &[&str]) {
    let Value::Object(map) = node else { return };
    match segs {
        [] => map.clear(),
        [last] => {
            map.remove(*last);
        }
        [head, rest @ ..] => {
            if let Some(child) = map.get_mut(*head) {
                remove(child, rest);
                if child.as_object().is_some_and(Map::is_empty) {
                    map.remove(*head);
                }
            }
        }
    }
}
