//! Connection lifecycle management.
//!
//! Factories hand out exclusive [`ManagedConnection`] handles. A connection
//! is owned by exactly one of: the factory's free pool, a transaction-bound
//! holder, or a single in-flight call. Never two holders at once.

mod pool;
mod simple;

pub use pool::{PoolConfig, PooledConnectionFactory};
pub use simple::SimpleConnectionFactory;

use std::sync::atomic::{AtomicU64, Ordering};

use crate::engine::{Connection, Cursor, PreparedStatement};
use crate::error::Result;
use crate::value::PropertyMap;

static NEXT_FACTORY_KEY: AtomicU64 = AtomicU64::new(1);

/// Identity of a factory instance, used as the binding key when a connection
/// is associated with a unit of work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FactoryKey(u64);

impl FactoryKey {
    pub(crate) fn next() -> Self {
        Self(NEXT_FACTORY_KEY.fetch_add(1, Ordering::Relaxed))
    }
}

/// A factory-issued connection.
///
/// Wraps the engine handle with an identifier for log correlation. Dropping
/// the wrapper closes the underlying connection; factories that pool reuse
/// the wrapper instead of dropping it.
pub struct ManagedConnection {
    id: u64,
    inner: Box<dyn Connection>,
}

impl ManagedConnection {
    pub(crate) fn new(id: u64, inner: Box<dyn Connection>) -> Self {
        Self { id, inner }
    }

    /// Factory-scoped identifier of this connection.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Prepares a statement on this connection.
    pub fn prepare(&mut self, text: &str) -> Result<Box<dyn PreparedStatement>> {
        self.inner.prepare(text)
    }

    /// Executes a prepared statement with named parameters.
    pub fn execute(
        &mut self,
        statement: &mut dyn PreparedStatement,
        parameters: &PropertyMap,
    ) -> Result<Box<dyn Cursor>> {
        self.inner.execute(statement, parameters)
    }

    /// Probes the underlying connection.
    pub fn is_live(&self) -> bool {
        self.inner.is_live()
    }
}

impl std::fmt::Debug for ManagedConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManagedConnection")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

/// Creates and manages connections to the engine.
///
/// `release` must be passed every connection obtained from `acquire` once the
/// borrowing operation completes; transaction-bound connections are released
/// by the transaction that created the binding.
pub trait ConnectionFactory: Send + Sync {
    /// Obtains a connection, newly created or pooled.
    fn acquire(&self) -> Result<ManagedConnection>;

    /// Returns a connection to the factory.
    fn release(&self, connection: ManagedConnection);

    /// Closes the factory and every connection it still owns. Idempotent.
    fn shutdown(&self);

    /// The binding key identifying this factory instance.
    fn key(&self) -> FactoryKey;
}
