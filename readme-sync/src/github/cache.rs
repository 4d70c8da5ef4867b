//! Installation-scoped client cache.

use super::RepoError;
use octocrab::models::InstallationId;
use octocrab::Octocrab;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

/// Process-wide map of installation id to authenticated client.
///
/// Entries are immutable once created and live for the process; there is no
/// invalidation beyond restart, so rotated installation credentials go
/// stale until the service is restarted.
pub struct ClientCache {
    base: Octocrab,
    clients: Mutex<HashMap<u64, Octocrab>>,
}

impl ClientCache {
    /// Creates a cache over a base client.
    #[must_use]
    pub fn new(base: Octocrab) -> Self {
        Self {
            base,
            clients: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the client for an installation, creating and memoizing it on
    /// first use. Deliveries without an installation use the base client.
    ///
    /// # Errors
    ///
    /// Returns [`RepoError`] if the installation-scoped client cannot be
    /// constructed.
    pub fn client_for(&self, installation_id: Option<u64>) -> Result<Octocrab, RepoError> {
        let Some(id) = installation_id else {
            return Ok(self.base.clone());
        };

        let mut clients = self
            .clients
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(client) = clients.get(&id) {
            return Ok(client.clone());
        }

        let client = self.base.installation(InstallationId(id))?;
        clients.insert(id, client.clone());
        Ok(client)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_installation_returns_base_client() {
        let base = Octocrab::builder().build().unwrap();
        let cache = ClientCache::new(base);
        assert!(cache.client_for(None).is_ok());
    }
}
