//! Single-flight cache keyed by string.
//!
//! Every expensive downstream interaction in the gateway (gRPC resolution,
//! HTTP probes, cluster listing) funnels through a [`CoalescingMap`]: bursts
//! of identical requests collapse to one outbound call per key, successful
//! results live for `expire`, failures for `error_expire`, and completed
//! entries above `capacity` are evicted oldest-first. The single-flight
//! property is load-bearing — a plain TTL cache would stampede the backends.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tokio::sync::{broadcast, Semaphore};

use crate::error::{Error, Result};

/// Tuning knobs for a [`CoalescingMap`].
#[derive(Debug, Clone)]
pub struct CoalescingConfig {
    /// Maximum producers running at once across all keys. Zero means
    /// unbounded.
    pub concurrency: usize,
    /// Maximum completed entries kept. Zero means unbounded.
    pub capacity: usize,
    /// How long a successful result stays fresh.
    pub expire: Duration,
    /// How long a failed result stays fresh.
    pub error_expire: Duration,
}

impl Default for CoalescingConfig {
    fn default() -> Self {
        Self {
            concurrency: 0,
            capacity: 0,
            expire: Duration::from_secs(60),
            error_expire: Duration::from_secs(5),
        }
    }
}

type Outcome<V> = std::result::Result<V, Arc<Error>>;

enum Slot<V> {
    InFlight(broadcast::Sender<Outcome<V>>),
    Done {
        outcome: Outcome<V>,
        stored_at: Instant,
    },
}

/// Per-key single-flight map with TTL and capacity eviction.
pub struct CoalescingMap<V> {
    slots: Mutex<HashMap<String, Slot<V>>>,
    limiter: Option<Arc<Semaphore>>,
    config: CoalescingConfig,
}

/// Removes an in-flight slot if its producer vanishes before publishing,
/// so joiners can race for the key again instead of waiting forever.
struct SlotGuard<'a, V> {
    map: &'a CoalescingMap<V>,
    key: String,
    armed: bool,
}

impl<V> SlotGuard<'_, V> {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl<V> Drop for SlotGuard<'_, V> {
    fn drop(&mut self) {
        if self.armed {
            if let Ok(mut slots) = self.map.slots.lock() {
                slots.remove(&self.key);
            }
        }
    }
}

enum Step<V> {
    Hit(Outcome<V>),
    Join(broadcast::Receiver<Outcome<V>>),
    Lead(broadcast::Sender<Outcome<V>>),
}

impl<V: Clone> CoalescingMap<V> {
    /// Creates an empty map with the given configuration.
    pub fn new(config: CoalescingConfig) -> Self {
        let limiter =
            (config.concurrency > 0).then(|| Arc::new(Semaphore::new(config.concurrency)));
        Self {
            slots: Mutex::new(HashMap::new()),
            limiter,
            config,
        }
    }

    /// Returns the value for `key`, computing it with `produce` at most once
    /// per key at any moment.
    ///
    /// A fresh stored result (success or error) is returned immediately;
    /// callers arriving while a producer runs join it and share its outcome;
    /// otherwise the caller becomes the producer, waiting for a concurrency
    /// slot when the map is bounded.
    ///
    /// # Errors
    /// Whatever `produce` returns; cached and joined errors arrive wrapped
    /// in [`Error::Shared`].
    pub async fn get<F, Fut>(&self, key: &str, produce: F) -> Result<V>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<V>>,
    {
        let mut produce = Some(produce);
        loop {
            let step = {
                let mut slots = self.slots.lock().expect("coalescing map lock poisoned");
                match slots.get(key) {
                    Some(Slot::Done { outcome, stored_at })
                        if self.is_fresh(outcome, *stored_at) =>
                    {
                        Step::Hit(outcome.clone())
                    }
                    Some(Slot::InFlight(tx)) => Step::Join(tx.subscribe()),
                    _ => {
                        let (tx, _) = broadcast::channel(1);
                        slots.insert(key.to_string(), Slot::InFlight(tx.clone()));
                        Step::Lead(tx)
                    }
                }
            };
            match step {
                Step::Hit(outcome) => return outcome.map_err(Error::Shared),
                Step::Join(mut rx) => match rx.recv().await {
                    Ok(outcome) => return outcome.map_err(Error::Shared),
                    // Producer dropped before publishing; contend again.
                    Err(_) => continue,
                },
                Step::Lead(tx) => {
                    let produce = produce.take().expect("producer closure consumed twice");
                    return self.lead(key, tx, produce).await;
                }
            }
        }
    }

    async fn lead<F, Fut>(
        &self,
        key: &str,
        tx: broadcast::Sender<Outcome<V>>,
        produce: F,
    ) -> Result<V>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<V>>,
    {
        let guard = SlotGuard {
            map: self,
            key: key.to_string(),
            armed: true,
        };
        let _permit = match &self.limiter {
            Some(limiter) => Some(
                limiter
                    .clone()
                    .acquire_owned()
                    .await
                    .expect("producer semaphore closed"),
            ),
            None => None,
        };
        let outcome = produce().await.map_err(Arc::new);
        {
            let mut slots = self.slots.lock().expect("coalescing map lock poisoned");
            slots.insert(
                key.to_string(),
                Slot::Done {
                    outcome: outcome.clone(),
                    stored_at: Instant::now(),
                },
            );
            self.evict_locked(&mut slots);
        }
        guard.disarm();
        let _ = tx.send(outcome.clone());
        outcome.map_err(Error::Shared)
    }

    fn is_fresh(&self, outcome: &Outcome<V>, stored_at: Instant) -> bool {
        let ttl = if outcome.is_ok() {
            self.config.expire
        } else {
            self.config.error_expire
        };
        stored_at.elapsed() < ttl
    }

    fn evict_locked(&self, slots: &mut HashMap<String, Slot<V>>) {
        if self.config.capacity == 0 {
            return;
        }
        let mut done: Vec<(String, Instant)> = slots
            .iter()
            .filter_map(|(key, slot)| match slot {
                Slot::Done { stored_at, .. } => Some((key.clone(), *stored_at)),
                Slot::InFlight(_) => None,
            })
            .collect();
        if done.len() <= self.config.capacity {
            return;
        }
        done.sort_by_key(|(_, stored_at)| *stored_at);
        let excess = done.len() - self.config.capacity;
        for (key, _) in done.into_iter().take(excess) {
            slots.remove(&key);
        }
    }
}
