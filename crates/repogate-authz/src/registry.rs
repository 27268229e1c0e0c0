//! Process-wide holder of the active provider set.
//!
//! Configuration reloads publish a whole new [`ProviderSnapshot`];
//! nothing is ever mutated in place. A resolution that captured a
//! snapshot keeps running against it even if a reload lands mid-flight,
//! which is accepted as eventually-consistent configuration.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::provider::{AuthzProvider, IdentityMapper, IdentityProvider};

/// Immutable view of the configured providers and the default policy.
pub struct ProviderSnapshot {
    default_allow: bool,
    identity_providers: Vec<Arc<dyn IdentityProvider>>,
    authz_providers: Vec<Arc<dyn AuthzProvider>>,
    identity_mappers: Vec<Arc<dyn IdentityMapper>>,
}

impl ProviderSnapshot {
    /// Assemble a snapshot. Provider order is security-relevant: the
    /// first provider to claim a repository URI is authoritative for
    /// it.
    #[must_use]
    pub fn new(
        default_allow: bool,
        identity_providers: Vec<Arc<dyn IdentityProvider>>,
        authz_providers: Vec<Arc<dyn AuthzProvider>>,
        identity_mappers: Vec<Arc<dyn IdentityMapper>>,
    ) -> Self {
        Self {
            default_allow,
            identity_providers,
            authz_providers,
            identity_mappers,
        }
    }

    /// Whether repositories claimed by no provider are allowed.
    #[must_use]
    pub fn default_allow(&self) -> bool {
        self.default_allow
    }

    /// Configured identity providers, in resolution order.
    #[must_use]
    pub fn identity_providers(&self) -> &[Arc<dyn IdentityProvider>] {
        &self.identity_providers
    }

    /// Configured authorization providers, in resolution order.
    #[must_use]
    pub fn authz_providers(&self) -> &[Arc<dyn AuthzProvider>] {
        &self.authz_providers
    }

    /// Configured identity mappers, in resolution order.
    #[must_use]
    pub fn identity_mappers(&self) -> &[Arc<dyn IdentityMapper>] {
        &self.identity_mappers
    }
}

impl Default for ProviderSnapshot {
    /// No providers configured and default-allow on, matching the
    /// engine's behavior before the first configuration load.
    fn default() -> Self {
        Self::new(true, Vec::new(), Vec::new(), Vec::new())
    }
}

/// Lock-protected, atomically swappable holder of the active snapshot.
pub struct ProviderRegistry {
    active: RwLock<Arc<ProviderSnapshot>>,
}

impl ProviderRegistry {
    /// Create a registry with the default (empty, allow-by-default)
    /// snapshot.
    #[must_use]
    pub fn new() -> Self {
        Self {
            active: RwLock::new(Arc::new(ProviderSnapshot::default())),
        }
    }

    /// Atomically publish a new snapshot.
    ///
    /// The write lock covers only the pointer swap, never any I/O, so
    /// reloads cannot block an in-flight resolution.
    pub fn replace(&self, snapshot: ProviderSnapshot) {
        *write_lock(&self.active) = Arc::new(snapshot);
    }

    /// Capture the active snapshot.
    ///
    /// The read lock is held only long enough to clone the `Arc`; the
    /// caller resolves against the captured snapshot with no lock held.
    #[must_use]
    pub fn snapshot(&self) -> Arc<ProviderSnapshot> {
        Arc::clone(&read_lock(&self.active))
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// The guarded value is a plain Arc, so a panic while holding the lock
// cannot leave it torn; recover from poisoning instead of propagating.
fn read_lock<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    match lock.read() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

fn write_lock<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    match lock.write() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
