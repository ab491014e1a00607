//! Application state shared across handlers
//!
//! Holds the settlement engine and the admin directory. The directory is the
//! only source of roles: requests name an admin id, and the capability check
//! runs against the role on record, never against anything the client sent.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use nuzul_settlement::SettlementEngine;
use nuzul_types::{Actor, AdminId};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Settlement engine over the reservation ledger
    pub engine: Arc<SettlementEngine>,
    /// Admins known to the platform, keyed by id
    admins: Arc<RwLock<HashMap<AdminId, Actor>>>,
}

impl AppState {
    pub fn new(engine: Arc<SettlementEngine>) -> Self {
        Self {
            engine,
            admins: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Register an admin in the directory, replacing any previous record
    pub async fn register_admin(&self, actor: Actor) {
        self.admins.write().await.insert(actor.id.clone(), actor);
    }

    /// Resolve an admin id to the actor on record
    pub async fn resolve_admin(&self, id: &AdminId) -> Option<Actor> {
        self.admins.read().await.get(id).cloned()
    }
}
