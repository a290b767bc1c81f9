//! In-memory engine for tests and examples.
//!
//! [`MemoryEngine`] implements the engine boundary against an in-memory
//! property graph and understands the statement shapes the crate's builders
//! generate. It also counts open native handles (connections, statements,
//! cursors) so tests can assert the exact-once release contract: after a
//! result sequence ends, statement and cursor counts must be back at zero.

mod interpreter;

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use interpreter::{column_index, GraphStore};

use crate::engine::{Connection, Cursor, GraphEngine, PreparedStatement};
use crate::error::Result;
use crate::row::Row;
use crate::value::{PropertyMap, Value};

/// Open-handle counters maintained by the in-memory engine.
///
/// Counts go up when a handle is created and down when it drops.
#[derive(Debug, Default)]
pub struct HandleCounters {
    connections: AtomicUsize,
    statements: AtomicUsize,
    cursors: AtomicUsize,
}

impl HandleCounters {
    /// Connections currently open.
    pub fn open_connections(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }

    /// Prepared statements currently open.
    pub fn open_statements(&self) -> usize {
        self.statements.load(Ordering::SeqCst)
    }

    /// Cursors currently open.
    pub fn open_cursors(&self) -> usize {
        self.cursors.load(Ordering::SeqCst)
    }
}

/// An in-memory graph engine.
///
/// Connections share one store behind a lock, mirroring an embedded engine
/// that serializes statement execution per database.
#[derive(Default)]
pub struct MemoryEngine {
    store: Arc<Mutex<GraphStore>>,
    counters: Arc<HandleCounters>,
    epoch: Arc<AtomicU64>,
}

impl MemoryEngine {
    /// Creates an empty engine.
    pub fn new() -> Self {
        Self::default()
    }

    /// The engine's handle counters.
    pub fn counters(&self) -> Arc<HandleCounters> {
        Arc::clone(&self.counters)
    }

    /// Makes every currently open connection start failing liveness probes.
    ///
    /// Connections opened afterwards are live again. Used to exercise
    /// borrow-time validation and replacement in pooling factories.
    pub fn invalidate_connections(&self) {
        self.epoch.fetch_add(1, Ordering::SeqCst);
    }

    /// Number of nodes stored under the given label.
    pub fn node_count(&self, label: &str) -> usize {
        self.store
            .lock()
            .nodes
            .get(label)
            .map(Vec::len)
            .unwrap_or(0)
    }

    /// Number of stored relationships of the given type.
    pub fn relationship_count(&self, rel_type: &str) -> usize {
        self.store
            .lock()
            .relationships
            .iter()
            .filter(|rel| rel.rel_type == rel_type)
            .count()
    }
}

impl GraphEngine for MemoryEngine {
    fn connect(&self) -> Result<Box<dyn Connection>> {
        self.counters.connections.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MemoryConnection {
            store: Arc::clone(&self.store),
            counters: Arc::clone(&self.counters),
            engine_epoch: Arc::clone(&self.epoch),
            born_at_epoch: self.epoch.load(Ordering::SeqCst),
        }))
    }
}

struct MemoryConnection {
    store: Arc<Mutex<GraphStore>>,
    counters: Arc<HandleCounters>,
    engine_epoch: Arc<AtomicU64>,
    born_at_epoch: u64,
}

impl Connection for MemoryConnection {
    fn prepare(&mut self, text: &str) -> Result<Box<dyn PreparedStatement>> {
        self.counters.statements.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MemoryStatement {
            text: text.to_string(),
            counters: Arc::clone(&self.counters),
        }))
    }

    fn execute(
        &mut self,
        statement: &mut dyn PreparedStatement,
        parameters: &PropertyMap,
    ) -> Result<Box<dyn Cursor>> {
        let result = {
            let mut store = self.store.lock();
            interpreter::run(&mut store, statement.text(), parameters)?
        };
        self.counters.cursors.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MemoryCursor {
            columns: column_index(&result.columns),
            column_names: result.columns,
            rows: result.rows.into_iter(),
            counters: Arc::clone(&self.counters),
        }))
    }

    fn is_live(&self) -> bool {
        self.born_at_epoch == self.engine_epoch.load(Ordering::SeqCst)
    }
}

impl Drop for MemoryConnection {
    fn drop(&mut self) {
        self.counters.connections.fetch_sub(1, Ordering::SeqCst);
    }
}

struct MemoryStatement {
    text: String,
    counters: Arc<HandleCounters>,
}

impl PreparedStatement for MemoryStatement {
    fn text(&self) -> &str {
        &self.text
    }
}

impl Drop for MemoryStatement {
    fn drop(&mut self) {
        self.counters.statements.fetch_sub(1, Ordering::SeqCst);
    }
}

struct MemoryCursor {
    columns: Arc<FxHashMap<String, usize>>,
    column_names: Vec<String>,
    rows: std::vec::IntoIter<smallvec::SmallVec<[Value; 8]>>,
    counters: Arc<HandleCounters>,
}

impl Cursor for MemoryCursor {
    fn column_count(&self) -> usize {
        self.column_names.len()
    }

    fn column_name(&self, index: usize) -> &str {
        &self.column_names[index]
    }

    fn next_row(&mut self) -> Result<Option<Row>> {
        Ok(self
            .rows
            .next()
            .map(|values| Row::new(Arc::clone(&self.columns), values)))
    }
}

impl Drop for MemoryCursor {
    fn drop(&mut self) {
        self.counters.cursors.fetch_sub(1, Ordering::SeqCst);
    }
}
