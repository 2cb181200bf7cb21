//! Server state shared by the handlers.

use std::sync::Arc;

use crate::{
    domain::PresenceRegistry, infrastructure::repository::InMemoryPresenceRepository,
    usecase::ConnectionManager,
};

use super::config::{OriginPolicy, ServerConfig};

/// Shared application state
pub struct AppState {
    /// Connection lifecycle and relay operations
    pub manager: ConnectionManager,
    /// Origins allowed to open connections
    pub origin_policy: OriginPolicy,
}

impl AppState {
    /// Build the state for a fresh, empty registry.
    pub fn new(config: &ServerConfig) -> Self {
        let registry = PresenceRegistry::with_policy(config.duplicate_announce);
        let repository = Arc::new(InMemoryPresenceRepository::new(registry));
        Self {
            manager: ConnectionManager::new(repository),
            origin_policy: config.origin_policy.clone(),
        }
    }
}
