//! Interception hooks around statement execution.
//!
//! Three independent hook kinds wrap the execution pipeline:
//!
//! - [`ExecHook`] wraps the physical execution. Every execution method goes
//!   through this chain.
//! - [`OneHook`] wraps the single-row bind step; [`AllHook`] wraps the
//!   multi-row bind step. The Exec chain sits *outside* the One/All chain.
//!
//! Hooks are appended to a [`SelectQuery`](crate::SelectQuery) and invoked in
//! registration order, first-registered outermost. Each hook receives the
//! downstream operation as an explicit value and decides whether to invoke
//! it: returning `Ok` without calling it skips the downstream work (the
//! caller observes success with the destination untouched), and returning an
//! error aborts the chain with that error propagated unchanged.

use crate::error::QbResult;
use std::any::Any;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

/// Boxed future alias used by hook signatures.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A type-erased bind destination handed through One/All hook chains.
///
/// The slot behind the mutex is an `Option<T>` (One) or `Option<Vec<T>>`
/// (All); the innermost operation downcasts it back. A hook may substitute
/// its own slot to redirect binding. The mutex is a hand-off cell and is
/// never held across an await point.
pub type BindTarget = Arc<Mutex<dyn Any + Send>>;

/// Context describing the statement a hook is wrapping.
#[derive(Debug, Clone)]
pub struct QueryContext {
    /// The rendered SQL text.
    pub sql: String,
    /// Number of driver-bound parameters.
    pub param_count: usize,
}

impl QueryContext {
    pub(crate) fn new(sql: &str, param_count: usize) -> Self {
        Self {
            sql: sql.to_string(),
            param_count,
        }
    }
}

/// The downstream operation of an Exec hook: run the rest of the pipeline.
pub struct ExecNext<'a> {
    op: Box<dyn FnOnce() -> BoxFuture<'a, QbResult<()>> + Send + 'a>,
}

impl<'a> ExecNext<'a> {
    pub(crate) fn new(op: Box<dyn FnOnce() -> BoxFuture<'a, QbResult<()>> + Send + 'a>) -> Self {
        Self { op }
    }

    /// Invoke the downstream operation.
    pub async fn run(self) -> QbResult<()> {
        (self.op)().await
    }
}

/// Interceptor around physical statement execution.
pub trait ExecHook: Send + Sync {
    /// Wrap the downstream operation. Call `next.run().await` to proceed.
    fn around<'a>(&'a self, ctx: &'a QueryContext, next: ExecNext<'a>)
    -> BoxFuture<'a, QbResult<()>>;
}

/// The downstream operation of a One/All hook: bind into a target.
///
/// The hook chooses the target to pass down, which is how a hook substitutes
/// the bind destination.
pub struct BindNext<'a> {
    op: Box<dyn FnOnce(BindTarget) -> BoxFuture<'a, QbResult<()>> + Send + 'a>,
}

impl<'a> BindNext<'a> {
    pub(crate) fn new(
        op: Box<dyn FnOnce(BindTarget) -> BoxFuture<'a, QbResult<()>> + Send + 'a>,
    ) -> Self {
        Self { op }
    }

    /// Invoke the downstream operation against a target.
    pub async fn run(self, target: BindTarget) -> QbResult<()> {
        (self.op)(target).await
    }
}

/// Interceptor around the single-row bind step.
pub trait OneHook: Send + Sync {
    /// Wrap the downstream operation. Call `next.run(target).await` to
    /// proceed (passing `target` or a substitute).
    fn around<'a>(
        &'a self,
        ctx: &'a QueryContext,
        target: BindTarget,
        next: BindNext<'a>,
    ) -> BoxFuture<'a, QbResult<()>>;
}

/// Interceptor around the multi-row bind step.
pub trait AllHook: Send + Sync {
    /// Wrap the downstream operation. Call `next.run(target).await` to
    /// proceed (passing `target` or a substitute).
    fn around<'a>(
        &'a self,
        ctx: &'a QueryContext,
        target: BindTarget,
        next: BindNext<'a>,
    ) -> BoxFuture<'a, QbResult<()>>;
}

/// A `tracing`-based hook that emits the SQL about to be executed.
///
/// Enable via the crate feature: `pgqb = { features = ["tracing"] }` and
/// register with [`SelectQuery::with_exec_hook`](crate::SelectQuery::with_exec_hook).
#[cfg(feature = "tracing")]
#[derive(Debug, Clone)]
pub struct TracingExecHook {
    /// Truncate long SQL strings (in chars). `None` means no truncation.
    pub max_sql_length: Option<usize>,
}

#[cfg(feature = "tracing")]
impl Default for TracingExecHook {
    fn default() -> Self {
        Self {
            max_sql_length: Some(200),
        }
    }
}

#[cfg(feature = "tracing")]
impl TracingExecHook {
    /// Create a new hook with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Disable SQL truncation.
    pub fn no_truncate(mut self) -> Self {
        self.max_sql_length = None;
        self
    }

    fn display_sql(&self, sql: &str) -> String {
        match self.max_sql_length {
            Some(max) if sql.chars().count() > max => {
                let truncated: String = sql.chars().take(max).collect();
                format!("{truncated}...")
            }
            _ => sql.to_string(),
        }
    }
}

#[cfg(feature = "tracing")]
impl ExecHook for TracingExecHook {
    fn around<'a>(
        &'a self,
        ctx: &'a QueryContext,
        next: ExecNext<'a>,
    ) -> BoxFuture<'a, QbResult<()>> {
        Box::pin(async move {
            tracing::debug!(
                target: "pgqb.sql",
                param_count = ctx.param_count,
                sql = %self.display_sql(&ctx.sql),
            );
            next.run().await
        })
    }
}
