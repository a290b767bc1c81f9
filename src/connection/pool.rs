//! Bounded connection pool with idle eviction.
//!
//! The pool is the concurrency-control point of the whole layer: the engine
//! permits one active write statement at a time per database, so bounding
//! live connections and handing each borrower exclusive ownership is what
//! serializes writers.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::{ConnectionFactory, FactoryKey, ManagedConnection};
use crate::engine::GraphEngine;
use crate::error::{AccessError, Result};

/// Sizing and health-check options for [`PooledConnectionFactory`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Maximum number of connections alive at once (borrowed plus idle).
    pub max_total: usize,

    /// Maximum number of idle connections retained on release; surplus
    /// connections are closed instead of pooled.
    pub max_idle: usize,

    /// Idle connections the eviction pass keeps available, creating new ones
    /// if needed.
    pub min_idle: usize,

    /// How long a borrow blocks for a free connection before failing with
    /// [`AccessError::PoolExhausted`].
    pub max_wait: Duration,

    /// Probe connections when borrowing; dead ones are discarded and
    /// transparently replaced.
    pub test_on_borrow: bool,

    /// Probe idle connections during eviction passes.
    pub test_on_idle: bool,

    /// Interval between background eviction passes. Zero disables the
    /// evictor thread.
    pub eviction_interval: Duration,

    /// Minimum idle age before a connection becomes eligible for eviction.
    pub min_evictable_idle: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_total: 10,
            max_idle: 5,
            min_idle: 2,
            max_wait: Duration::from_secs(30),
            test_on_borrow: true,
            test_on_idle: true,
            eviction_interval: Duration::from_secs(60),
            min_evictable_idle: Duration::from_secs(300),
        }
    }
}

struct IdleConnection {
    connection: ManagedConnection,
    idle_since: Instant,
}

struct PoolState {
    idle: VecDeque<IdleConnection>,
    active: usize,
    shut_down: bool,
}

/// A connection factory that pools connections up to a configured bound.
///
/// Borrowing blocks up to [`PoolConfig::max_wait`] when the pool is at
/// capacity, then fails with a distinct pool-exhausted error. A background
/// evictor closes connections idle past the configured threshold while
/// keeping [`PoolConfig::min_idle`] warm.
pub struct PooledConnectionFactory {
    engine: Arc<dyn GraphEngine>,
    config: PoolConfig,
    key: FactoryKey,
    state: Mutex<PoolState>,
    available: Condvar,
    next_id: AtomicU64,
    evictor: Mutex<Option<JoinHandle<()>>>,
    stop: Arc<(Mutex<bool>, Condvar)>,
}

impl PooledConnectionFactory {
    /// Creates a pool with the given configuration.
    pub fn new(engine: Arc<dyn GraphEngine>, config: PoolConfig) -> Arc<Self> {
        info!(
            max_total = config.max_total,
            max_idle = config.max_idle,
            min_idle = config.min_idle,
            "created connection pool"
        );
        let pool = Arc::new(Self {
            engine,
            config,
            key: FactoryKey::next(),
            state: Mutex::new(PoolState {
                idle: VecDeque::new(),
                active: 0,
                shut_down: false,
            }),
            available: Condvar::new(),
            next_id: AtomicU64::new(1),
            evictor: Mutex::new(None),
            stop: Arc::new((Mutex::new(false), Condvar::new())),
        });
        if pool.config.eviction_interval > Duration::ZERO {
            let weak = Arc::downgrade(&pool);
            let stop = Arc::clone(&pool.stop);
            let interval = pool.config.eviction_interval;
            match std::thread::Builder::new()
                .name("umbra-pool-evictor".to_string())
                .spawn(move || evictor_loop(weak, stop, interval))
            {
                Ok(handle) => *pool.evictor.lock() = Some(handle),
                Err(e) => warn!("failed to spawn pool evictor: {e}"),
            }
        }
        pool
    }

    /// Creates a pool with [`PoolConfig::default`].
    pub fn with_defaults(engine: Arc<dyn GraphEngine>) -> Arc<Self> {
        Self::new(engine, PoolConfig::default())
    }

    /// Number of currently borrowed connections.
    pub fn active(&self) -> usize {
        self.state.lock().active
    }

    /// Number of idle connections waiting in the pool.
    pub fn idle(&self) -> usize {
        self.state.lock().idle.len()
    }

    fn create(&self) -> Result<ManagedConnection> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        debug!(connection_id = id, "creating new pooled connection");
        let inner = self
            .engine
            .connect()
            .map_err(|e| AccessError::Connection(format!("failed to create connection: {e}")))?;
        Ok(ManagedConnection::new(id, inner))
    }

    /// One eviction pass: drop dead or over-age idle connections (keeping
    /// `min_idle` warm), then top the idle set back up to `min_idle`.
    fn evict(&self) {
        let needed = {
            let mut state = self.state.lock();
            if state.shut_down {
                return;
            }
            let now = Instant::now();
            let max_evictable = state.idle.len().saturating_sub(self.config.min_idle);
            let mut kept = VecDeque::with_capacity(state.idle.len());
            let mut evicted = 0usize;
            while let Some(entry) = state.idle.pop_front() {
                let dead = self.config.test_on_idle && !entry.connection.is_live();
                let expired = now.duration_since(entry.idle_since) >= self.config.min_evictable_idle
                    && evicted < max_evictable;
                if dead || expired {
                    evicted += 1;
                    debug!(
                        connection_id = entry.connection.id(),
                        dead, "evicting idle connection"
                    );
                    drop(entry);
                } else {
                    kept.push_back(entry);
                }
            }
            state.idle = kept;
            let live = state.active + state.idle.len();
            self.config
                .min_idle
                .saturating_sub(state.idle.len())
                .min(self.config.max_total.saturating_sub(live))
        };

        for _ in 0..needed {
            let connection = match self.create() {
                Ok(c) => c,
                Err(e) => {
                    warn!("failed to replenish idle connections: {e}");
                    break;
                }
            };
            let mut state = self.state.lock();
            let within_limits = !state.shut_down
                && state.idle.len() < self.config.min_idle
                && state.active + state.idle.len() < self.config.max_total;
            if within_limits {
                state.idle.push_back(IdleConnection {
                    connection,
                    idle_since: Instant::now(),
                });
                drop(state);
                self.available.notify_one();
            }
        }
    }
}

impl ConnectionFactory for PooledConnectionFactory {
    fn acquire(&self) -> Result<ManagedConnection> {
        let deadline = Instant::now() + self.config.max_wait;
        let mut state = self.state.lock();
        loop {
            if state.shut_down {
                return Err(AccessError::Connection("connection pool is shut down".into()));
            }
            while let Some(entry) = state.idle.pop_front() {
                if self.config.test_on_borrow && !entry.connection.is_live() {
                    warn!(
                        connection_id = entry.connection.id(),
                        "discarding dead connection on borrow"
                    );
                    drop(entry);
                    continue;
                }
                state.active += 1;
                debug!(
                    active = state.active,
                    idle = state.idle.len(),
                    "borrowed connection from pool"
                );
                return Ok(entry.connection);
            }
            if state.active < self.config.max_total {
                state.active += 1;
                drop(state);
                return self.create().map_err(|e| {
                    let mut state = self.state.lock();
                    state.active = state.active.saturating_sub(1);
                    drop(state);
                    self.available.notify_one();
                    e
                });
            }
            let now = Instant::now();
            if now >= deadline {
                return Err(AccessError::PoolExhausted {
                    waited: self.config.max_wait,
                });
            }
            let _ = self.available.wait_for(&mut state, deadline - now);
        }
    }

    fn release(&self, connection: ManagedConnection) {
        let retired = {
            let mut state = self.state.lock();
            state.active = state.active.saturating_sub(1);
            if !state.shut_down && connection.is_live() && state.idle.len() < self.config.max_idle {
                state.idle.push_back(IdleConnection {
                    connection,
                    idle_since: Instant::now(),
                });
                debug!(
                    active = state.active,
                    idle = state.idle.len(),
                    "returned connection to pool"
                );
                None
            } else {
                Some(connection)
            }
        };
        if let Some(connection) = retired {
            debug!(connection_id = connection.id(), "closing connection on release");
            drop(connection);
        }
        self.available.notify_one();
    }

    fn shutdown(&self) {
        {
            let (lock, signal) = &*self.stop;
            let mut stopped = lock.lock();
            if !*stopped {
                info!("closing connection pool");
            }
            *stopped = true;
            signal.notify_all();
        }
        if let Some(handle) = self.evictor.lock().take() {
            // The evictor itself may drop the last Arc and land here; joining
            // our own thread would never return.
            if handle.thread().id() != std::thread::current().id() {
                let _ = handle.join();
            }
        }
        let drained: Vec<IdleConnection> = {
            let mut state = self.state.lock();
            state.shut_down = true;
            state.idle.drain(..).collect()
        };
        drop(drained);
        self.available.notify_all();
    }

    fn key(&self) -> FactoryKey {
        self.key
    }
}

impl Drop for PooledConnectionFactory {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn evictor_loop(
    pool: Weak<PooledConnectionFactory>,
    stop: Arc<(Mutex<bool>, Condvar)>,
    interval: Duration,
) {
    loop {
        {
            let (lock, signal) = &*stop;
            let mut stopped = lock.lock();
            if *stopped {
                return;
            }
            let _ = signal.wait_for(&mut stopped, interval);
            if *stopped {
                return;
            }
        }
        match pool.upgrade() {
            Some(pool) => pool.evict(),
            None => return,
        }
    }
}
