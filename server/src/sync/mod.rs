//! Best-effort change notification
//!
//! After a successful mutation the handler calls
//! [`SyncBroadcaster::notify`]; subscribed listeners (websocket fan-out,
//! kitchen displays) receive a [`SyncEvent`] telling them which resource of
//! which tenant changed. Delivery is fire-and-forget: the broadcast is not
//! required for correctness and a missing receiver is not an error.
//!
//! Each `(tenant, resource)` pair carries a monotonically increasing version
//! so clients can tell stale payloads from fresh ones.

use dashmap::DashMap;
use serde::Serialize;
use shared::util::now_millis;
use tokio::sync::broadcast;

/// Broadcast channel capacity
const SYNC_CHANNEL_CAPACITY: usize = 1024;

/// Lock-free per-resource version counters
#[derive(Debug, Default)]
pub struct ResourceVersions {
    versions: DashMap<String, u64>,
}

impl ResourceVersions {
    pub fn new() -> Self {
        Self {
            versions: DashMap::new(),
        }
    }

    /// Increment the version for a tenant's resource and return the new value
    pub fn increment(&self, tenant_id: &str, resource: &str) -> u64 {
        let mut entry = self
            .versions
            .entry(format!("{tenant_id}:{resource}"))
            .or_insert(0);
        *entry += 1;
        *entry
    }

    /// Current version for a tenant's resource (0 if never bumped)
    pub fn get(&self, tenant_id: &str, resource: &str) -> u64 {
        self.versions
            .get(&format!("{tenant_id}:{resource}"))
            .map(|v| *v)
            .unwrap_or(0)
    }
}

/// A change notification
#[derive(Debug, Clone, Serialize)]
pub struct SyncEvent {
    pub tenant_id: String,
    /// Entity kind that changed ("order", "table", "qr_order")
    pub resource: String,
    pub version: u64,
    pub timestamp: i64,
}

/// Change notification broadcaster
pub struct SyncBroadcaster {
    versions: ResourceVersions,
    tx: broadcast::Sender<SyncEvent>,
}

impl SyncBroadcaster {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(SYNC_CHANNEL_CAPACITY);
        Self {
            versions: ResourceVersions::new(),
            tx,
        }
    }

    /// Notify subscribers that a tenant's resource changed.
    ///
    /// Returns the new version. No receivers is not an error.
    pub fn notify(&self, tenant_id: &str, resource: &str) -> u64 {
        let version = self.versions.increment(tenant_id, resource);
        let event = SyncEvent {
            tenant_id: tenant_id.to_string(),
            resource: resource.to_string(),
            version,
            timestamp: now_millis(),
        };
        if self.tx.send(event).is_err() {
            tracing::debug!(tenant_id, resource, "Sync notification dropped: no receivers");
        }
        version
    }

    /// Subscribe to change notifications
    pub fn subscribe(&self) -> broadcast::Receiver<SyncEvent> {
        self.tx.subscribe()
    }

    /// Current version for a tenant's resource
    pub fn version(&self, tenant_id: &str, resource: &str) -> u64 {
        self.versions.get(tenant_id, resource)
    }
}

impl Default for SyncBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}
