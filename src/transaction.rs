//! Logical transactions over an auto-committing engine.
//!
//! The engine commits every statement as it executes and supports at most
//! one concurrent write transaction, so explicit BEGIN/COMMIT/ROLLBACK are
//! not used. What a [`Transaction`] actually provides is connection scoping:
//! every template call made with the transaction's context runs on the same
//! bound connection, in issuance order.
//!
//! # Known consistency gap
//!
//! Because statements are already durable when they return, `commit` has
//! nothing left to do and `rollback` cannot undo writes that already
//! executed. A partial failure inside a multi-statement transaction leaves
//! the earlier writes applied. Rollback signals this with a warning instead
//! of silently claiming success.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::connection::ConnectionFactory;
use crate::context::{ConnectionHolder, WorkContext};
use crate::error::{AccessError, Result};

/// The state of a logical transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxState {
    /// Transaction is active and its connection is bound.
    Active,
    /// Transaction was marked committed.
    Committed,
    /// Transaction was marked rolled back.
    RolledBack,
    /// Cleanup ran; the binding is gone.
    Closed,
}

/// Begins logical transactions by binding connections into a [`WorkContext`].
pub struct TransactionManager {
    factory: Arc<dyn ConnectionFactory>,
}

impl TransactionManager {
    /// Creates a manager over the given factory.
    pub fn new(factory: Arc<dyn ConnectionFactory>) -> Self {
        Self { factory }
    }

    /// The factory this manager binds connections from.
    pub fn factory(&self) -> &Arc<dyn ConnectionFactory> {
        &self.factory
    }

    /// Begins a transaction on the given context.
    ///
    /// If the context has no connection bound for this factory, one is
    /// acquired, wrapped in a holder, and bound; the returned transaction
    /// owns the binding and will release the connection on completion. If a
    /// holder is already bound, the returned transaction participates in it
    /// and never releases the outer transaction's connection.
    pub fn begin(&self, context: &WorkContext) -> Result<Transaction> {
        let key = self.factory.key();
        if let Some(holder) = context.holder(key) {
            debug!("joining existing transaction binding");
            holder.set_transaction_active(true);
            return Ok(Transaction {
                context: context.clone(),
                factory: Arc::clone(&self.factory),
                holder,
                owns_binding: false,
                state: TxState::Active,
            });
        }

        let connection = self.factory.acquire()?;
        debug!(
            connection_id = connection.id(),
            "acquired connection for new transaction"
        );
        let holder = ConnectionHolder::new(connection);
        holder.set_transaction_active(true);
        holder.set_synchronized(true);
        if let Err(e) = context.bind(key, Arc::clone(&holder)) {
            if let Some(connection) = holder.take_connection() {
                self.factory.release(connection);
            }
            return Err(e);
        }
        debug!(
            "started transaction in auto-commit mode; atomicity is not guaranteed and failed \
             operations cannot be rolled back"
        );
        Ok(Transaction {
            context: context.clone(),
            factory: Arc::clone(&self.factory),
            holder,
            owns_binding: true,
            state: TxState::Active,
        })
    }
}

/// A logical transaction scope.
///
/// Must be completed with [`Transaction::commit`] or
/// [`Transaction::rollback`]; dropping an undecided transaction rolls it
/// back with a warning.
pub struct Transaction {
    context: WorkContext,
    factory: Arc<dyn ConnectionFactory>,
    holder: Arc<ConnectionHolder>,
    owns_binding: bool,
    state: TxState,
}

impl Transaction {
    /// The context this transaction is bound into.
    pub fn context(&self) -> &WorkContext {
        &self.context
    }

    /// Current transaction state.
    pub fn state(&self) -> TxState {
        self.state
    }

    /// Whether this transaction created the binding (as opposed to
    /// participating in an outer transaction).
    pub fn owns_binding(&self) -> bool {
        self.owns_binding
    }

    /// Marks the transaction committed.
    ///
    /// The engine already committed every statement individually, so this
    /// only completes the logical scope and releases the binding.
    pub fn commit(mut self) -> Result<()> {
        self.ensure_active("commit")?;
        debug!("committing transaction (statements were auto-committed as they executed)");
        self.state = TxState::Committed;
        self.cleanup();
        Ok(())
    }

    /// Marks the transaction rolled back.
    ///
    /// Statements that already executed were committed by the engine and are
    /// not undone; this is surfaced as a warning, never as silent success.
    pub fn rollback(mut self) -> Result<()> {
        self.ensure_active("rollback")?;
        warn!(
            "rollback requested, but the engine auto-commits each statement; writes already \
             executed in this transaction remain applied"
        );
        self.state = TxState::RolledBack;
        self.cleanup();
        Ok(())
    }

    fn ensure_active(&self, operation: &str) -> Result<()> {
        if self.state == TxState::Active {
            Ok(())
        } else {
            Err(AccessError::TransactionState(format!(
                "cannot {operation}: transaction is {:?}",
                self.state
            )))
        }
    }

    /// Unbinds and releases the connection if this transaction created the
    /// binding; participating transactions leave the outer binding alone.
    fn cleanup(&mut self) {
        if self.owns_binding {
            self.context.unbind(self.factory.key());
            self.holder.set_transaction_active(false);
            self.holder.set_synchronized(false);
            if let Some(connection) = self.holder.take_connection() {
                debug!(
                    connection_id = connection.id(),
                    "releasing connection after transaction"
                );
                self.factory.release(connection);
            }
        }
        self.state = TxState::Closed;
    }
}

impl Drop for Transaction {
    fn drop(&mut self) {
        if self.state == TxState::Active {
            warn!("transaction dropped while active; treating as rollback");
            self.state = TxState::RolledBack;
            self.cleanup();
        } else if self.state != TxState::Closed {
            self.cleanup();
        }
    }
}

impl std::fmt::Debug for Transaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transaction")
            .field("state", &self.state)
            .field("owns_binding", &self.owns_binding)
            .finish_non_exhaustive()
    }
}
