//! Factory without reuse: every acquire connects, every release closes.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tracing::debug;

use super::{ConnectionFactory, FactoryKey, ManagedConnection};
use crate::engine::GraphEngine;
use crate::error::Result;

/// A connection factory that creates a new connection for each request.
///
/// Useful for tests and single-threaded tools; production setups use
/// [`super::PooledConnectionFactory`].
pub struct SimpleConnectionFactory {
    engine: Arc<dyn GraphEngine>,
    key: FactoryKey,
    next_id: AtomicU64,
}

impl SimpleConnectionFactory {
    /// Creates a factory over the given engine.
    pub fn new(engine: Arc<dyn GraphEngine>) -> Self {
        Self {
            engine,
            key: FactoryKey::next(),
            next_id: AtomicU64::new(1),
        }
    }
}

impl ConnectionFactory for SimpleConnectionFactory {
    fn acquire(&self) -> Result<ManagedConnection> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        debug!(connection_id = id, "creating new connection");
        Ok(ManagedConnection::new(id, self.engine.connect()?))
    }

    fn release(&self, connection: ManagedConnection) {
        debug!(connection_id = connection.id(), "closing connection");
        drop(connection);
    }

    fn shutdown(&self) {
        // Nothing pooled, nothing to close.
    }

    fn key(&self) -> FactoryKey {
        self.key
    }
}
