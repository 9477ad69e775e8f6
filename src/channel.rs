//! Collaborator seams
//!
//! Scripting never talks to a server. The only outward calls are read-only
//! queries that decide whether an optional sub-object exists; statement
//! execution is described here so callers can plug an executor in, but the
//! scripting code never invokes it.

use std::fmt;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use thiserror::Error;
use tracing::warn;

/// Server error numbers raised when the caller lacks permission to see a
/// catalog object. While probing optional sub-objects these mean "absent".
pub const PERMISSION_ERRORS: &[i32] = &[229, 230, 262, 297, 300];

/// A read-only query against the target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub query: String,
}

impl Request {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
        }
    }
}

/// Tabular query result.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Rowset {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

impl Rowset {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// First column of the first row.
    pub fn scalar(&self) -> Option<&str> {
        self.rows.first()?.first()?.as_deref()
    }
}

/// Failure reported by a collaborator, carrying the server error number.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("query failed with error {number}: {message}")]
pub struct QueryError {
    pub number: i32,
    pub message: String,
}

impl QueryError {
    pub fn new(number: i32, message: impl Into<String>) -> Self {
        Self {
            number,
            message: message.into(),
        }
    }

    /// The caller may not see the object; not a real failure for probes.
    pub fn is_permission_denied(&self) -> bool {
        PERMISSION_ERRORS.contains(&self.number)
    }
}

/// Read-only catalog access.
pub trait QueryCollaborator {
    fn query(&self, request: &Request) -> Result<Rowset, QueryError>;
}

/// Statement execution, supplied by the caller.
pub trait ExecutionCollaborator: Send + Sync {
    fn execute_non_query(&self, statements: &[String]) -> Result<(), QueryError>;
    fn execute_with_results(&self, statements: &[String]) -> Result<Rowset, QueryError>;
}

/// Whether an optional sub-object exists.
///
/// Permission failures count as "absent" and are logged; every other
/// failure is returned.
pub fn probe_exists<Q>(collaborator: &Q, request: &Request) -> Result<bool, QueryError>
where
    Q: QueryCollaborator + ?Sized,
{
    match collaborator.query(request) {
        Ok(rowset) => Ok(!rowset.is_empty()),
        Err(err) if err.is_permission_denied() => {
            warn!(number = err.number, query = %request.query, "probe denied; treating object as absent");
            Ok(false)
        }
        Err(err) => Err(err),
    }
}

/// Per-object execution channel, created at most once on first use even
/// under concurrent access.
#[derive(Default)]
pub struct ExecutionChannel {
    cell: OnceCell<Arc<dyn ExecutionCollaborator>>,
}

impl fmt::Debug for ExecutionChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionChannel")
            .field("initialized", &self.cell.get().is_some())
            .finish()
    }
}

impl ExecutionChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// The channel, opening it with `open` if this is the first access.
    ///
    /// A failing `open` leaves the channel uninitialized so a later call
    /// may retry.
    pub fn get_or_open<F, E>(&self, open: F) -> Result<Arc<dyn ExecutionCollaborator>, E>
    where
        F: FnOnce() -> Result<Arc<dyn ExecutionCollaborator>, E>,
    {
        self.cell.get_or_try_init(open).map(Arc::clone)
    }

    pub fn get(&self) -> Option<Arc<dyn ExecutionCollaborator>> {
        self.cell.get().cloned()
    }

    pub fn is_open(&self) -> bool {
        self.cell.get().is_some()
    }
}
