use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use axum::http::HeaderMap;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::Mutex;

use crate::core::config::RateLimitConfig;
use crate::shared::clock::{Clock, SystemClock};
use crate::shared::constants::UNKNOWN_CLIENT_ID;

/// Expiring key-value store of last-submission timestamps. The interface is
/// what a shared store (Redis) would offer, so the in-memory default can be
/// swapped without touching the gate.
#[async_trait]
pub trait RateStore: Send + Sync {
    async fn get(&self, key: &str) -> Option<DateTime<Utc>>;
    async fn set(&self, key: &str, timestamp: DateTime<Utc>, ttl: Duration);
    async fn remove(&self, key: &str);
}

struct StoredEntry {
    timestamp: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

/// In-process store with lazy expiry. Non-persistent and per-instance: resets
/// on restart and does not coordinate across instances, which is acceptable at
/// a single municipality's traffic.
pub struct InMemoryRateStore {
    clock: Arc<dyn Clock>,
    entries: Mutex<HashMap<String, StoredEntry>>,
}

impl InMemoryRateStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            entries: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl RateStore for InMemoryRateStore {
    async fn get(&self, key: &str) -> Option<DateTime<Utc>> {
        let mut entries = self.entries.lock().await;
        match entries.get(key) {
            Some(entry) if entry.expires_at > self.clock.now() => Some(entry.timestamp),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    async fn set(&self, key: &str, timestamp: DateTime<Utc>, ttl: Duration) {
        let expires_at = timestamp + ttl;
        self.entries.lock().await.insert(
            key.to_string(),
            StoredEntry {
                timestamp,
                expires_at,
            },
        );
    }

    async fn remove(&self, key: &str) {
        self.entries.lock().await.remove(key);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Allowed,
    Limited,
}

/// Per-client submission cooldown. A claim admits the caller and records the
/// timestamp in one step; callers release the claim with [`RateGate::forgive`]
/// when the admitted submission later fails, so only completed submissions
/// consume the slot.
pub struct RateGate {
    store: Arc<dyn RateStore>,
    clock: Arc<dyn Clock>,
    window: Duration,
    enabled: bool,
    exempt: HashSet<String>,
    claim_lock: Mutex<()>,
}

impl RateGate {
    pub fn new(
        config: &RateLimitConfig,
        store: Arc<dyn RateStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            clock,
            window: Duration::seconds(config.window_secs as i64),
            enabled: config.enabled,
            exempt: config.exempt_ips.iter().cloned().collect(),
            claim_lock: Mutex::new(()),
        }
    }

    /// Gate backed by the in-memory store and the system clock.
    pub fn in_memory(config: &RateLimitConfig) -> Self {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let store = Arc::new(InMemoryRateStore::new(clock.clone()));
        Self::new(config, store, clock)
    }

    pub fn is_exempt(&self, id: &str) -> bool {
        !self.enabled || self.exempt.contains(id)
    }

    /// Admits or rejects the identity. The window check and the timestamp
    /// write happen under one lock so two near-simultaneous requests from the
    /// same identity cannot both pass.
    pub async fn check_and_record(&self, id: &str) -> GateDecision {
        if self.is_exempt(id) {
            return GateDecision::Allowed;
        }

        let _claim = self.claim_lock.lock().await;
        let now = self.clock.now();
        if let Some(last) = self.store.get(id).await {
            if now - last < self.window {
                return GateDecision::Limited;
            }
        }
        self.store.set(id, now, self.window).await;
        GateDecision::Allowed
    }

    /// Releases a claim after a failed submission, so a rejected request
    /// leaves no lasting side effect on the caller's cooldown.
    pub async fn forgive(&self, id: &str) {
        if self.is_exempt(id) {
            return;
        }
        self.store.remove(id).await;
    }
}

/// Best-effort client identity: first comma-separated forwarded-for entry,
/// then the real-ip header, then a shared sentinel.
pub fn identify(headers: &HeaderMap) -> String {
    if let Some(forwarded) = headers.get("x-forwarded-for").and_then(|v| v.to_str().ok()) {
        if let Some(first) = forwarded.split(',').next() {
            let first = first.trim();
            if !first.is_empty() {
                return first.to_string();
            }
        }
    }

    if let Some(real_ip) = headers.get("x-real-ip").and_then(|v| v.to_str().ok()) {
        let real_ip = real_ip.trim();
        if !real_ip.is_empty() {
            return real_ip.to_string();
        }
    }

    UNKNOWN_CLIENT_ID.to_string()
}
