//! Transaction-aware query execution.
//!
//! [`GraphTemplate`] is the central execution surface: it resolves a
//! connection (the context-bound one inside a transaction, a fresh one
//! otherwise), prepares and executes statements, and maps result rows
//! through caller-supplied readers. Outside a transaction every call
//! acquires and releases its own connection; inside one, all calls reuse the
//! bound connection in issuance order.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::connection::{ConnectionFactory, ManagedConnection};
use crate::context::{HolderGuard, WorkContext};
use crate::error::{AccessError, BoxError, Result};
use crate::row::Row;
use crate::statement::Statement;
use crate::stream::RowIter;

/// A connection resolved for the duration of one call or one streamed
/// result.
///
/// `Bound` leases a transaction-bound connection and leaves ownership with
/// the holder; `Owned` carries a freshly acquired connection and returns it
/// to the factory on drop.
pub(crate) enum ConnectionLease {
    Bound(HolderGuard),
    Owned {
        connection: Option<ManagedConnection>,
        factory: Arc<dyn ConnectionFactory>,
    },
}

impl ConnectionLease {
    fn connection(&mut self) -> Result<&mut ManagedConnection> {
        match self {
            ConnectionLease::Bound(guard) => guard.as_mut().ok_or_else(|| {
                AccessError::TransactionState(
                    "bound connection was already released by its transaction".into(),
                )
            }),
            ConnectionLease::Owned { connection, .. } => connection
                .as_mut()
                .ok_or_else(|| AccessError::Connection("connection lease is empty".into())),
        }
    }
}

impl Drop for ConnectionLease {
    fn drop(&mut self) {
        if let ConnectionLease::Owned {
            connection,
            factory,
        } = self
        {
            if let Some(connection) = connection.take() {
                factory.release(connection);
            }
        }
    }
}

/// Executes statements with managed connections and mapped results.
pub struct GraphTemplate {
    factory: Arc<dyn ConnectionFactory>,
}

impl GraphTemplate {
    /// Creates a template over the given connection factory.
    pub fn new(factory: Arc<dyn ConnectionFactory>) -> Self {
        Self { factory }
    }

    /// The factory this template resolves connections from.
    pub fn factory(&self) -> &Arc<dyn ConnectionFactory> {
        &self.factory
    }

    /// Executes a write statement outside any transaction.
    pub fn execute(&self, statement: &Statement) -> Result<()> {
        self.execute_with(None, statement)
    }

    /// Executes a write statement, reusing a context-bound connection when
    /// one is present.
    pub fn execute_in(&self, context: &WorkContext, statement: &Statement) -> Result<()> {
        self.execute_with(Some(context), statement)
    }

    /// Runs a query and maps every row through `reader`.
    pub fn query<T, F>(&self, statement: &Statement, reader: F) -> Result<Vec<T>>
    where
        F: FnMut(&Row) -> std::result::Result<T, BoxError> + Send + 'static,
    {
        self.query_iter_with(None, statement, reader)?.collect()
    }

    /// Context-aware variant of [`GraphTemplate::query`].
    pub fn query_in<T, F>(
        &self,
        context: &WorkContext,
        statement: &Statement,
        reader: F,
    ) -> Result<Vec<T>>
    where
        F: FnMut(&Row) -> std::result::Result<T, BoxError> + Send + 'static,
    {
        self.query_iter_with(Some(context), statement, reader)?
            .collect()
    }

    /// Runs a query and returns the mapped rows as a lazy sequence.
    ///
    /// See [`RowIter`] for the release guarantees. Outside a transaction the
    /// sequence owns the connection it runs on; do not hold it longer than
    /// the rows are needed.
    pub fn query_iter<T, F>(&self, statement: &Statement, reader: F) -> Result<RowIter<T>>
    where
        F: FnMut(&Row) -> std::result::Result<T, BoxError> + Send + 'static,
    {
        self.query_iter_with(None, statement, reader)
    }

    /// Context-aware variant of [`GraphTemplate::query_iter`].
    ///
    /// Inside a transaction the sequence leases the bound connection until
    /// it is dropped; later calls on the same context wait for the lease.
    pub fn query_iter_in<T, F>(
        &self,
        context: &WorkContext,
        statement: &Statement,
        reader: F,
    ) -> Result<RowIter<T>>
    where
        F: FnMut(&Row) -> std::result::Result<T, BoxError> + Send + 'static,
    {
        self.query_iter_with(Some(context), statement, reader)
    }

    /// Runs a query expected to match at most one row.
    ///
    /// The result is fully consumed either way, so no cursor is left half
    /// read; matching more than one row succeeds with the first but is
    /// logged as a warning.
    pub fn query_one<T, F>(&self, statement: &Statement, reader: F) -> Result<Option<T>>
    where
        F: FnMut(&Row) -> std::result::Result<T, BoxError> + Send + 'static,
    {
        self.query_one_with(None, statement, reader)
    }

    /// Context-aware variant of [`GraphTemplate::query_one`].
    pub fn query_one_in<T, F>(
        &self,
        context: &WorkContext,
        statement: &Statement,
        reader: F,
    ) -> Result<Option<T>>
    where
        F: FnMut(&Row) -> std::result::Result<T, BoxError> + Send + 'static,
    {
        self.query_one_with(Some(context), statement, reader)
    }

    /// Extracts one column of a query as strings.
    pub fn query_strings(&self, statement: &Statement, column: &str) -> Result<Vec<String>> {
        let column = column.to_string();
        self.query(statement, move |row| Ok(row.get(&column)?.to_string()))
    }

    /// Context-aware variant of [`GraphTemplate::query_strings`].
    pub fn query_strings_in(
        &self,
        context: &WorkContext,
        statement: &Statement,
        column: &str,
    ) -> Result<Vec<String>> {
        let column = column.to_string();
        self.query_in(context, statement, move |row| {
            Ok(row.get(&column)?.to_string())
        })
    }

    fn execute_with(&self, context: Option<&WorkContext>, statement: &Statement) -> Result<()> {
        warn_on_inline_literals(statement.text());
        debug!(query = statement.text(), "executing statement");
        let mut lease = self.lease(context)?;
        let connection = lease.connection()?;
        let mut prepared = connection.prepare(statement.text())?;
        let cursor = connection.execute(prepared.as_mut(), statement.parameters())?;
        drop(cursor);
        drop(prepared);
        Ok(())
    }

    fn query_one_with<T, F>(
        &self,
        context: Option<&WorkContext>,
        statement: &Statement,
        reader: F,
    ) -> Result<Option<T>>
    where
        F: FnMut(&Row) -> std::result::Result<T, BoxError> + Send + 'static,
    {
        let mut results: Vec<T> = self
            .query_iter_with(context, statement, reader)?
            .collect::<Result<_>>()?;
        if results.len() > 1 {
            warn!(
                matched = results.len(),
                query = statement.text(),
                "query_one matched more than one row"
            );
        }
        if results.is_empty() {
            Ok(None)
        } else {
            Ok(Some(results.swap_remove(0)))
        }
    }

    fn query_iter_with<T, F>(
        &self,
        context: Option<&WorkContext>,
        statement: &Statement,
        reader: F,
    ) -> Result<RowIter<T>>
    where
        F: FnMut(&Row) -> std::result::Result<T, BoxError> + Send + 'static,
    {
        warn_on_inline_literals(statement.text());
        debug!(query = statement.text(), "querying");
        let mut lease = self.lease(context)?;
        let prepared;
        let cursor;
        {
            let connection = lease.connection()?;
            let mut statement_handle = connection.prepare(statement.text())?;
            cursor = connection.execute(statement_handle.as_mut(), statement.parameters())?;
            prepared = statement_handle;
        }
        Ok(RowIter::new(
            cursor,
            prepared,
            statement.parameters().clone(),
            lease,
            Box::new(reader),
        ))
    }

    /// Resolves the connection for one call: the context-bound connection if
    /// the context holds one for this factory, otherwise a fresh acquire
    /// that the lease releases on drop.
    fn lease(&self, context: Option<&WorkContext>) -> Result<ConnectionLease> {
        if let Some(context) = context {
            if let Some(holder) = context.holder(self.factory.key()) {
                debug!("reusing transaction-bound connection");
                return Ok(ConnectionLease::Bound(holder.lease()));
            }
        }
        let connection = self.factory.acquire()?;
        Ok(ConnectionLease::Owned {
            connection: Some(connection),
            factory: Arc::clone(&self.factory),
        })
    }
}

fn warn_on_inline_literals(text: &str) {
    if text.contains('\'') || text.contains('"') {
        warn!(
            query = text,
            "statement embeds inline string literals; bind named parameters instead"
        );
    }
}
