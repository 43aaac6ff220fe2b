use std::sync::Arc;

use docreg_crypto::SigningKey;
use docreg_registry::DocumentRegistry;
use docreg_types::OwnerId;

/// Shared handler state.
///
/// The HTTP surface acts as a single service owner: every file uploaded
/// through it is registered under the service key's owner id, and file names
/// resolve through that owner's name index.
#[derive(Clone)]
pub struct AppState {
    pub registry: DocumentRegistry,
    key: Arc<SigningKey>,
}

impl AppState {
    pub fn new(registry: DocumentRegistry, key: SigningKey) -> Self {
        Self {
            registry,
            key: Arc::new(key),
        }
    }

    pub fn owner(&self) -> OwnerId {
        self.key.owner_id()
    }

    pub fn key(&self) -> &SigningKey {
        &self.key
    }
}
