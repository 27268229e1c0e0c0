//! TTL cache for per-identity access lists.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

/// Byte-oriented cache keyed by authorization ID.
///
/// Values are opaque serialized access lists; the provider decodes
/// them and treats decode failures as misses, so any storage that
/// round-trips bytes works here.
pub trait AclCache: Send + Sync {
    /// Look up an unexpired entry.
    fn get(&self, key: &str) -> Option<Vec<u8>>;

    /// Store an entry, restarting its TTL.
    fn set(&self, key: &str, value: Vec<u8>);
}

/// In-process [`AclCache`] with a fixed TTL per entry.
///
/// Entries are created lazily and never invalidated except by expiry.
/// Concurrent writers for one key race benignly; last write wins.
pub struct MemoryAclCache {
    ttl: Duration,
    entries: RwLock<HashMap<String, (Instant, Vec<u8>)>>,
}

impl MemoryAclCache {
    /// Create a cache whose entries expire `ttl` after being written.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }
}

impl AclCache for MemoryAclCache {
    fn get(&self, key: &str) -> Option<Vec<u8>> {
        let entries = match self.entries.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        entries.get(key).and_then(|(written, value)| {
            if written.elapsed() < self.ttl {
                Some(value.clone())
            } else {
                None
            }
        })
    }

    fn set(&self, key: &str, value: Vec<u8>) {
        let mut entries = match self.entries.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        entries.insert(key.to_string(), (Instant::now(), value));
    }
}
