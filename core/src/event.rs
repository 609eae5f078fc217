// Event bus implementation
//
// Minimal in-process publish/subscribe by event name. Delivery is synchronous
// on the publisher's thread; several threads may publish at once.
use crate::Result;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

static ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Milliseconds since UNIX epoch.
#[inline]
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Process-unique id: wall clock nanos plus a sequence number.
#[inline]
pub fn gen_id() -> String {
    let nanos = chrono::Utc::now().timestamp_nanos_opt().unwrap_or(0);
    let seq = ID_COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("{:x}-{:x}", nanos, seq)
}

/// A named event carrying at most one string argument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    #[serde(default = "gen_id")]
    pub id: String,
    pub name: String,
    #[serde(default = "now_ms")]
    pub timestamp_ms: i64,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub payload: Option<String>,
}

impl Event {
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            id: gen_id(),
            name: name.into(),
            timestamp_ms: now_ms(),
            source: source.into(),
            payload: None,
        }
    }

    pub fn with_payload(mut self, payload: impl Into<String>) -> Self {
        self.payload = Some(payload.into());
        self
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }
}

/// Event handler trait
pub trait EventHandler: Send + Sync {
    fn handle(&self, event: &Event) -> Result<()>;
}

/// Subscription information
#[derive(Clone)]
struct Subscription {
    id: String,
    handler: Arc<dyn EventHandler>,
}

/// Event bus statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventBusStats {
    pub total_published: u64,
    pub total_delivered: u64,
    pub failed_deliveries: u64,
    pub active_subscriptions: usize,
}

/// Event bus core implementation
pub struct EventBus {
    // Event name -> Subscriber list
    subscriptions: Arc<DashMap<String, Vec<Subscription>>>,

    // Statistics
    stats: Arc<DashMap<String, EventBusStats>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            subscriptions: Arc::new(DashMap::new()),
            stats: Arc::new(DashMap::new()),
        }
    }

    pub fn shutdown(&self) {
        info!("Event Bus shutting down");
        self.subscriptions.clear();
    }

    /// Deliver `event` to every handler subscribed to `event.name`.
    ///
    /// Handlers run on the calling thread in subscription order. A failing
    /// handler is logged and counted; it never fails the publish. Returns the
    /// number of successful deliveries.
    pub fn publish(&self, event: Event) -> Result<u64> {
        debug!("Publishing event {} ({})", event.id, event.name);

        // Snapshot handlers so no shard lock is held while they run
        let handlers: Vec<Subscription> = self
            .subscriptions
            .get(&event.name)
            .map(|subs| subs.value().clone())
            .unwrap_or_default();

        // Stats are only kept for subscribed names
        if handlers.is_empty() {
            warn!("No subscriptions for event: {}", event.name);
            return Ok(0);
        }

        let mut delivered = 0;
        let mut failed = 0;
        for sub in &handlers {
            match sub.handler.handle(&event) {
                Ok(()) => delivered += 1,
                Err(e) => {
                    failed += 1;
                    warn!("Handler {} failed on event {}: {}", sub.id, event.name, e);
                }
            }
        }

        self.update_stats(&event.name, |stats| {
            stats.total_published += 1;
            stats.total_delivered += delivered;
            stats.failed_deliveries += failed;
        });

        Ok(delivered)
    }

    /// Subscribe `handler` to events called `name`. Returns the subscription id.
    pub fn subscribe(&self, name: impl Into<String>, handler: Arc<dyn EventHandler>) -> String {
        let name = name.into();
        let subscription_id = format!("sub_{}_{}", name, gen_id());

        self.subscriptions
            .entry(name.clone())
            .or_default()
            .push(Subscription {
                id: subscription_id.clone(),
                handler,
            });

        self.update_stats(&name, |stats| {
            stats.active_subscriptions += 1;
        });

        info!("Created subscription {} for event {}", subscription_id, name);
        subscription_id
    }

    /// Unsubscribe by id. Returns whether a subscription was removed.
    pub fn unsubscribe(&self, subscription_id: &str) -> bool {
        let mut removed_from = None;
        for mut entry in self.subscriptions.iter_mut() {
            let before = entry.value().len();
            entry.value_mut().retain(|sub| sub.id != subscription_id);
            if entry.value().len() != before {
                removed_from = Some(entry.key().clone());
                break;
            }
        }

        match removed_from {
            Some(name) => {
                self.update_stats(&name, |stats| {
                    stats.active_subscriptions = stats.active_subscriptions.saturating_sub(1);
                });
                info!("Unsubscribed {}", subscription_id);
                true
            }
            None => {
                debug!("Unknown subscription {}", subscription_id);
                false
            }
        }
    }

    /// Get stats
    pub fn get_stats(&self, name: &str) -> Option<EventBusStats> {
        self.stats.get(name).map(|s| s.clone())
    }

    // Update stats helper function
    fn update_stats<F>(&self, name: &str, f: F)
    where
        F: FnOnce(&mut EventBusStats),
    {
        f(self.stats.entry(name.to_string()).or_default().value_mut());
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
