use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::debug;

use crate::shared::AppError;

/// Trait for the external key-value mirror store
///
/// Values are opaque strings (the services serialize to JSON before
/// writing). A production deployment would implement this over Redis;
/// the in-memory implementation below covers development and tests.
#[async_trait]
pub trait MirrorStore: Send + Sync {
    async fn set(&self, key: &str, value: String, ttl: Option<Duration>) -> Result<(), AppError>;
    async fn get(&self, key: &str) -> Result<Option<String>, AppError>;
    async fn exists(&self, key: &str) -> Result<bool, AppError>;
    async fn remove(&self, key: &str) -> Result<(), AppError>;
}

struct Entry {
    value: String,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(deadline) => Instant::now() >= deadline,
            None => false,
        }
    }
}

/// In-memory implementation of MirrorStore for development and testing
pub struct InMemoryMirrorStore {
    entries: Mutex<HashMap<String, Entry>>,
}

impl Default for InMemoryMirrorStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryMirrorStore {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl MirrorStore for InMemoryMirrorStore {
    async fn set(&self, key: &str, value: String, ttl: Option<Duration>) -> Result<(), AppError> {
        debug!(key = %key, "Writing mirror entry");

        let mut entries = self.entries.lock().unwrap();
        entries.insert(
            key.to_string(),
            Entry {
                value,
                expires_at: ttl.map(|ttl| Instant::now() + ttl),
            },
        );
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        let mut entries = self.entries.lock().unwrap();

        if entries.get(key).is_some_and(Entry::is_expired) {
            entries.remove(key);
            return Ok(None);
        }

        Ok(entries.get(key).map(|entry| entry.value.clone()))
    }

    async fn exists(&self, key: &str) -> Result<bool, AppError> {
        Ok(self.get(key).await?.is_some())
    }

    async fn remove(&self, key: &str) -> Result<(), AppError> {
        debug!(key = %key, "Removing mirror entry");

        let mut entries = self.entries.lock().unwrap();
        entries.remove(key);
        Ok(())
    }
}
