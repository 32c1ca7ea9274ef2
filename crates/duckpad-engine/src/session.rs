//! Scoped connection sessions.
//!
//! [`scoped`] is the only path through which statements reach an engine:
//! it opens one connection, lends a [`SessionHandle`] to the operation and
//! closes the connection once the operation finishes, whatever its outcome.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::engine::{Engine, Session};
use crate::error::{Result, WorkbenchError};
use crate::result::TabularResult;

/// Cheaply cloneable handle to one open session.
///
/// Statements issued through clones of the same handle are serialized.
#[derive(Clone)]
pub struct SessionHandle {
    inner: Arc<Mutex<SessionState>>,
}

struct SessionState {
    session: Box<dyn Session>,
    closed: bool,
}

impl SessionHandle {
    fn new(session: Box<dyn Session>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(SessionState {
                session,
                closed: false,
            })),
        }
    }

    /// Execute one statement on this session.
    pub async fn query(&self, sql: &str) -> Result<TabularResult> {
        let mut state = self.inner.lock().await;
        if state.closed {
            return Err(WorkbenchError::QueryExecution(
                "Session already closed".to_string(),
            ));
        }
        debug!(sql = %sql, "Executing statement");
        state.session.query(sql).await
    }

    /// Close the underlying connection; later calls are no-ops.
    async fn close(&self) -> Result<()> {
        let mut state = self.inner.lock().await;
        if state.closed {
            return Ok(());
        }
        state.closed = true;
        state.session.close().await
    }
}

/// Run `op` against a fresh session and close it afterwards.
///
/// The result of `op` is returned unchanged after the close. A failure to
/// close is logged and does not mask that result.
pub async fn scoped<T, F, Fut>(engine: &dyn Engine, op: F) -> Result<T>
where
    F: FnOnce(SessionHandle) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let session = engine.connect().await?;
    debug!(engine = %engine.name(), "Database connection established");

    let handle = SessionHandle::new(session);
    let outcome = op(handle.clone()).await;

    match handle.close().await {
        Ok(()) => debug!(engine = %engine.name(), "Database connection closed"),
        Err(e) => warn!(engine = %engine.name(), error = %e, "Error closing connection"),
    }

    outcome
}
