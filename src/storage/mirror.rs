use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

use super::store::MirrorStore;

/// Fire-and-forget writer over the mirror store
///
/// Writes are dispatched on background tasks after the authoritative
/// in-memory mutation has committed, so a slow or unreachable store never
/// blocks or fails the calling operation.
#[derive(Clone)]
pub struct Mirror {
    store: Arc<dyn MirrorStore>,
}

impl Mirror {
    pub fn new(store: Arc<dyn MirrorStore>) -> Self {
        Self { store }
    }

    /// Writes a key on a background task; failures are logged and dropped.
    pub fn set(&self, key: String, value: String, ttl: Option<Duration>) {
        let store = Arc::clone(&self.store);
        tokio::spawn(async move {
            if let Err(e) = store.set(&key, value, ttl).await {
                warn!(key = %key, error = %e, "Mirror write failed");
            }
        });
    }

    /// Removes a key on a background task; failures are logged and dropped.
    pub fn remove(&self, key: String) {
        let store = Arc::clone(&self.store);
        tokio::spawn(async move {
            if let Err(e) = store.remove(&key).await {
                warn!(key = %key, error = %e, "Mirror removal failed");
            }
        });
    }
}
