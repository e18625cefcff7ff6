//! Server state - shared handles for all services
//!
//! `ServerState` is cloned into every request handler; all members are
//! shallow handles (`Arc` internally), so the clone is cheap.
//!
//! | Field | Purpose |
//! |-------|---------|
//! | config | Immutable configuration |
//! | manager | Order lifecycle mutations and queries |
//! | jwt | Token validation |
//! | sync | Best-effort change notification |

use std::sync::Arc;

use crate::auth::JwtService;
use crate::core::Config;
use crate::orders::{LifecycleStorage, OrderManager};
use crate::sync::SyncBroadcaster;

#[derive(Clone)]
pub struct ServerState {
    pub config: Config,
    pub manager: OrderManager,
    pub jwt: Arc<JwtService>,
    pub sync: Arc<SyncBroadcaster>,
}

impl ServerState {
    /// Initialize server state: ensure the work directory structure exists
    /// and open the database at `work_dir/database/comanda.redb`.
    pub fn initialize(config: &Config) -> anyhow::Result<Self> {
        let db_path = config.database_path();
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        tracing::info!(path = %db_path.display(), "Opening database");
        let storage = LifecycleStorage::open(&db_path)?;
        Ok(Self::with_storage(config.clone(), storage))
    }

    /// Build state over existing storage (tests use the in-memory backend)
    pub fn with_storage(config: Config, storage: LifecycleStorage) -> Self {
        let jwt = Arc::new(JwtService::new(&config.jwt));
        Self {
            manager: OrderManager::new(storage),
            jwt,
            sync: Arc::new(SyncBroadcaster::new()),
            config,
        }
    }

    /// Fire a best-effort change notification for a tenant's resource
    pub fn notify(&self, tenant_id: &str, resource: &str) {
        self.sync.notify(tenant_id, resource);
    }
}
