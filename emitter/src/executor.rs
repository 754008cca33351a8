//! Where listener invocations run.
//!
//! Dispatch never calls a listener while a lock is held. Each invocation is
//! packaged as a [`Job`] and handed to an [`Executor`], which decides whether
//! it runs on a tokio blocking thread, a fresh OS thread, or inline on the
//! caller's thread.

use std::sync::Arc;

use tokio::runtime::Handle;

use crate::config::{ConfigError, DispatchMode};

/// A unit of work submitted by the emitter.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Runs jobs submitted by the emitter.
///
/// `execute` must not wait for the job to finish unless the implementation
/// is explicitly synchronous (see [`InlineExecutor`]). It returns `false`
/// when the job was dropped without running; such jobs are not counted as
/// scheduled by [`Dispatch`](crate::Dispatch).
pub trait Executor: Send + Sync + 'static {
    fn execute(&self, job: Job) -> bool;
}

/// Runs jobs on a tokio runtime's blocking pool.
///
/// Listeners are synchronous functions that may block, so they are not run
/// on the async worker threads.
#[derive(Debug, Clone)]
pub struct TokioExecutor {
    handle: Handle,
}

impl TokioExecutor {
    pub fn new(handle: Handle) -> Self {
        Self { handle }
    }

    /// Executor bound to the runtime of the calling context, if any.
    pub fn current() -> Option<Self> {
        Handle::try_current().ok().map(Self::new)
    }
}

impl Executor for TokioExecutor {
    fn execute(&self, job: Job) -> bool {
        drop(self.handle.spawn_blocking(job));
        true
    }
}

/// Runs each job on a new OS thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadExecutor;

impl Executor for ThreadExecutor {
    fn execute(&self, job: Job) -> bool {
        let spawned = std::thread::Builder::new()
            .name("emitter-listener".into())
            .spawn(job);
        match spawned {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!(error = %e, "failed to spawn listener thread, job dropped");
                false
            }
        }
    }
}

/// Runs each job immediately on the submitting thread.
///
/// Opt-in synchronous delivery: `emit` returns after every listener ran.
#[derive(Debug, Clone, Copy, Default)]
pub struct InlineExecutor;

impl Executor for InlineExecutor {
    fn execute(&self, job: Job) -> bool {
        job();
        true
    }
}

/// The executor used when none is configured: the current tokio runtime if
/// called from within one, a thread per job otherwise.
pub fn default_executor() -> Arc<dyn Executor> {
    match TokioExecutor::current() {
        Some(executor) => Arc::new(executor),
        None => Arc::new(ThreadExecutor),
    }
}

impl DispatchMode {
    /// Build the executor for this mode.
    ///
    /// Fails for [`DispatchMode::Tokio`] outside of a tokio runtime.
    pub fn executor(self) -> Result<Arc<dyn Executor>, ConfigError> {
        match self {
            DispatchMode::Auto => Ok(default_executor()),
            DispatchMode::Tokio => TokioExecutor::current()
                .map(|e| Arc::new(e) as Arc<dyn Executor>)
                .ok_or_else(|| {
                    ConfigError::Runtime(
                        "dispatch mode `tokio` requires a running tokio runtime".into(),
                    )
                }),
            DispatchMode::Thread => Ok(Arc::new(ThreadExecutor)),
            DispatchMode::Inline => Ok(Arc::new(InlineExecutor)),
        }
    }
}
