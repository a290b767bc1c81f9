//! Unit-of-work context and connection binding.
//!
//! A [`WorkContext`] is the explicit handle for one logical unit of work.
//! Beginning a transaction binds a [`ConnectionHolder`] into the context,
//! keyed by the owning factory; every template call made with the same
//! context then reuses that bound connection. The engine serializes writes
//! per connection, so a multi-statement operation must stay on one
//! connection, and the binding is what keeps it there.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::lock_api::ArcMutexGuard;
use parking_lot::{Mutex, RawMutex, RwLock};
use rustc_hash::FxHashMap;

use crate::connection::{FactoryKey, ManagedConnection};
use crate::error::{AccessError, Result};

/// Guard over a holder's connection slot, keeping the slot exclusively
/// leased while a call (or streaming result) runs on it.
pub type HolderGuard = ArcMutexGuard<RawMutex, Option<ManagedConnection>>;

/// Per-transaction record tying a connection to a unit of work.
///
/// Created when a transaction begins, destroyed when it completes. The
/// connection slot is empty only after the owning transaction has taken the
/// connection back for release.
pub struct ConnectionHolder {
    connection: Arc<Mutex<Option<ManagedConnection>>>,
    transaction_active: AtomicBool,
    synchronized: AtomicBool,
}

impl ConnectionHolder {
    pub(crate) fn new(connection: ManagedConnection) -> Arc<Self> {
        Arc::new(Self {
            connection: Arc::new(Mutex::new(Some(connection))),
            transaction_active: AtomicBool::new(false),
            synchronized: AtomicBool::new(false),
        })
    }

    /// Leases the bound connection; calls on the same holder run in
    /// issuance order.
    pub fn lease(&self) -> HolderGuard {
        Mutex::lock_arc(&self.connection)
    }

    /// Takes the connection out of the holder for release.
    pub(crate) fn take_connection(&self) -> Option<ManagedConnection> {
        self.connection.lock().take()
    }

    /// Whether a transaction is currently active on this holder.
    pub fn is_transaction_active(&self) -> bool {
        self.transaction_active.load(Ordering::Acquire)
    }

    pub(crate) fn set_transaction_active(&self, active: bool) {
        self.transaction_active.store(active, Ordering::Release);
    }

    /// Whether this holder was synchronized with a transaction when bound.
    pub fn is_synchronized(&self) -> bool {
        self.synchronized.load(Ordering::Acquire)
    }

    pub(crate) fn set_synchronized(&self, synchronized: bool) {
        self.synchronized.store(synchronized, Ordering::Release);
    }
}

impl std::fmt::Debug for ConnectionHolder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionHolder")
            .field("transaction_active", &self.is_transaction_active())
            .field("synchronized", &self.is_synchronized())
            .finish_non_exhaustive()
    }
}

/// Explicit unit-of-work context.
///
/// Cloning is cheap and clones share the same bindings, so a context can be
/// handed through call chains. A context with no bindings behaves as plain
/// auto-commit: every call acquires and releases its own connection.
#[derive(Debug, Clone, Default)]
pub struct WorkContext {
    bindings: Arc<RwLock<FxHashMap<FactoryKey, Arc<ConnectionHolder>>>>,
}

impl WorkContext {
    /// Creates an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up the holder bound for the given factory, if any.
    pub fn holder(&self, key: FactoryKey) -> Option<Arc<ConnectionHolder>> {
        self.bindings.read().get(&key).cloned()
    }

    /// Whether a holder is bound for the given factory.
    pub fn is_bound(&self, key: FactoryKey) -> bool {
        self.bindings.read().contains_key(&key)
    }

    pub(crate) fn bind(&self, key: FactoryKey, holder: Arc<ConnectionHolder>) -> Result<()> {
        let mut bindings = self.bindings.write();
        if bindings.contains_key(&key) {
            return Err(AccessError::TransactionState(
                "a connection is already bound to this context for the factory".into(),
            ));
        }
        bindings.insert(key, holder);
        Ok(())
    }

    pub(crate) fn unbind(&self, key: FactoryKey) -> Option<Arc<ConnectionHolder>> {
        self.bindings.write().remove(&key)
    }
}
