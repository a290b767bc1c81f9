//! Lazy, resource-safe row streaming.
//!
//! [`RowIter`] is the scoped-acquisition construct that ties native handle
//! release to the life of a result sequence. Whatever way the sequence ends
//! (exhaustion, an early break, a reader failure, or an engine error), the
//! handles are released in a fixed order: cursor, prepared statement, bound
//! parameters, and finally the connection. The connection is only released
//! here when it was acquired for this call rather than bound to a
//! transaction.

use tracing::debug;

use crate::engine::{Cursor, PreparedStatement};
use crate::error::{AccessError, BoxError, Result};
use crate::row::Row;
use crate::template::ConnectionLease;
use crate::value::PropertyMap;

pub(crate) type BoxedReader<T> =
    Box<dyn FnMut(&Row) -> std::result::Result<T, BoxError> + Send>;

/// A lazy, forward-only, non-restartable sequence of mapped rows.
///
/// Each pull maps one result row through the reader. The row's column values
/// are owned copies, valid only for that reader invocation; the cursor
/// invalidates them when the next row is pulled.
///
/// Dropping the iterator at any point triggers the full release sequence, so
/// breaking out of a loop early is the supported cancellation mechanism.
pub struct RowIter<T> {
    // Field order is the release order; Rust drops fields in declaration
    // order, which is what guarantees cursor-before-statement-before-
    // parameters-before-connection on every exit path.
    cursor: Option<Box<dyn Cursor>>,
    statement: Option<Box<dyn PreparedStatement>>,
    parameters: PropertyMap,
    lease: Option<ConnectionLease>,
    reader: BoxedReader<T>,
    row_index: usize,
    finished: bool,
}

impl<T> RowIter<T> {
    pub(crate) fn new(
        cursor: Box<dyn Cursor>,
        statement: Box<dyn PreparedStatement>,
        parameters: PropertyMap,
        lease: ConnectionLease,
        reader: BoxedReader<T>,
    ) -> Self {
        Self {
            cursor: Some(cursor),
            statement: Some(statement),
            parameters,
            lease: Some(lease),
            reader,
            row_index: 0,
            finished: false,
        }
    }

    /// Number of rows pulled so far.
    pub fn rows_read(&self) -> usize {
        self.row_index
    }

    /// Releases every handle immediately instead of waiting for drop.
    fn finish(&mut self) {
        self.finished = true;
        self.cursor = None;
        self.statement = None;
        self.parameters.clear();
        self.lease = None;
    }
}

impl<T> Iterator for RowIter<T> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let cursor = self.cursor.as_mut()?;
        match cursor.next_row() {
            Ok(Some(row)) => {
                let index = self.row_index;
                self.row_index += 1;
                match (self.reader)(&row) {
                    Ok(item) => Some(Ok(item)),
                    Err(source) => {
                        self.finish();
                        Some(Err(AccessError::Mapping { row: index, source }))
                    }
                }
            }
            Ok(None) => {
                debug!(rows = self.row_index, "result sequence exhausted");
                self.finish();
                None
            }
            Err(e) => {
                self.finish();
                Some(Err(e))
            }
        }
    }
}

impl<T> std::iter::FusedIterator for RowIter<T> {}
