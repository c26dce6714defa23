//! Persistent HTTP response cache
//!
//! Backed by a fjall keyspace with postcard-encoded entries. Constructed
//! explicitly at startup and passed by reference to the clients that need
//! it; scope is the process lifetime plus whatever survives on disk.

use anyhow::{anyhow, Result};
use fjall::Keyspace;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::debug;

#[derive(Serialize, Deserialize)]
struct StoredEntry<T> {
    value: T,
    expires_at: u64, // Unix timestamp (seconds)
}

pub struct PersistentCache {
    store: Keyspace,
}

impl PersistentCache {
    /// Open (or create) the cache database at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let db = fjall::Database::builder(&path).open()?;
        let items = db.keyspace("cache", fjall::KeyspaceCreateOptions::default)?;
        Ok(PersistentCache { store: items })
    }

    /// Stores a serializable value with a time-to-live (TTL).
    #[tracing::instrument(name = "put_cache", level = "debug", skip(self, value))]
    pub fn put<T: Serialize>(&self, key: &str, value: &T, ttl: Duration) -> Result<()> {
        let expires_at = SystemTime::now()
            .checked_add(ttl)
            .ok_or(anyhow!("TTL overflow"))?
            .duration_since(UNIX_EPOCH)?
            .as_secs();
        let entry = StoredEntry { value, expires_at };
        let bytes = postcard::to_stdvec(&entry)?;

        self.store.insert(key.as_bytes(), bytes)?;
        Ok(())
    }

    /// Retrieves a value if it exists and has not expired.
    /// Returns `None` for cache misses or expired entries.
    #[tracing::instrument(name = "query_cache", level = "debug", skip(self))]
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let maybe_bytes = self.store.get(key.as_bytes())?.map(|v| v.to_vec());

        if let Some(bytes) = maybe_bytes {
            let entry: StoredEntry<T> = postcard::from_bytes(&bytes)?;
            let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs();

            if now < entry.expires_at {
                debug!("Key found and still fresh");
                Ok(Some(entry.value))
            } else {
                debug!("Key found but expired");
                self.remove(key)?;
                Ok(None)
            }
        } else {
            debug!("Key not found");
            Ok(None)
        }
    }

    /// Manually removes a key from the cache.
    pub fn remove(&self, key: &str) -> Result<()> {
        self.store.remove(key.as_bytes())?;
        Ok(())
    }
}
