//! Per-event ordered listener storage.
//!
//! A [`ListenerRegistry`] owns the ordered [`Callable`] sequence for one
//! event name behind its own lock. The front of the sequence is delivered
//! first; `prepend` puts a registration ahead of everything already there.

use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::oneshot;

use crate::executor::Executor;
use crate::listener::{Callable, Listener, SubscriptionId};
use crate::Args;

/// Where a new registration is inserted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Position {
    Front,
    #[default]
    Back,
}

/// Ordered listeners for one event name.
#[derive(Debug, Default)]
pub struct ListenerRegistry {
    callables: Mutex<VecDeque<Arc<Callable>>>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&self, callable: Arc<Callable>) -> &Self {
        self.callables.lock().push_back(callable);
        self
    }

    pub fn prepend(&self, callable: Arc<Callable>) -> &Self {
        self.callables.lock().push_front(callable);
        self
    }

    /// Insert unless the registry already holds `max` or more callables.
    ///
    /// The length check and the insertion happen under one lock acquisition,
    /// so concurrent callers can never push the length past `max`. On
    /// rejection the callable is handed back untouched.
    pub fn try_insert(
        &self,
        callable: Arc<Callable>,
        position: Position,
        max: usize,
    ) -> Result<(), Arc<Callable>> {
        let mut callables = self.callables.lock();
        if callables.len() >= max {
            return Err(callable);
        }
        match position {
            Position::Front => callables.push_front(callable),
            Position::Back => callables.push_back(callable),
        }
        Ok(())
    }

    /// Visit every callable front to back.
    ///
    /// The sequence is snapshotted under the lock and the visitor runs with
    /// the lock released, so it may call [`remove`](Self::remove) (or any
    /// other method) on this registry.
    pub fn for_each(&self, mut visit: impl FnMut(&Arc<Callable>)) {
        let snapshot: Vec<Arc<Callable>> = self.callables.lock().iter().cloned().collect();
        for callable in &snapshot {
            visit(callable);
        }
    }

    /// Remove this exact registration record.
    pub fn remove(&self, callable: &Arc<Callable>) -> bool {
        let mut callables = self.callables.lock();
        match callables.iter().position(|c| Arc::ptr_eq(c, callable)) {
            Some(index) => {
                callables.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn remove_by_id(&self, id: SubscriptionId) -> Option<Arc<Callable>> {
        let mut callables = self.callables.lock();
        let index = callables.iter().position(|c| c.id() == id)?;
        callables.remove(index)
    }

    /// First registration (front to back) wrapping `listener`.
    pub fn find_by_listener(&self, listener: &Listener) -> Option<Arc<Callable>> {
        self.callables
            .lock()
            .iter()
            .find(|c| c.listener().ptr_eq(listener))
            .cloned()
    }

    /// Find and remove the first registration wrapping `listener` in one step.
    pub fn remove_by_listener(&self, listener: &Listener) -> Option<Arc<Callable>> {
        let mut callables = self.callables.lock();
        let index = callables
            .iter()
            .position(|c| c.listener().ptr_eq(listener))?;
        callables.remove(index)
    }

    pub fn len(&self) -> usize {
        self.callables.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.callables.lock().is_empty()
    }

    /// Snapshot of the registered listeners, in delivery order.
    pub fn listeners(&self) -> Vec<Listener> {
        self.callables
            .lock()
            .iter()
            .map(|c| c.listener().clone())
            .collect()
    }

    /// Remove every registration, returning them in order.
    pub fn drain(&self) -> Vec<Arc<Callable>> {
        self.callables.lock().drain(..).collect()
    }

    /// Schedule one invocation per registered callable.
    ///
    /// The sweep runs under the registry lock: every callable present is
    /// captured and once-callables are removed in the same pass, so two
    /// concurrent dispatches can never both schedule the same
    /// once-registration. Jobs are submitted to `executor` after the lock is
    /// released and are not awaited.
    pub fn dispatch(&self, event: &str, args: &Args, executor: &dyn Executor) -> Dispatch {
        let scheduled: Vec<Arc<Callable>> = {
            let mut callables = self.callables.lock();
            let mut scheduled = Vec::with_capacity(callables.len());
            callables.retain(|c| {
                scheduled.push(c.clone());
                !c.is_once()
            });
            scheduled
        };

        tracing::trace!(event, listeners = scheduled.len(), "dispatching");

        let event: Arc<str> = Arc::from(event);
        let mut completions = Vec::with_capacity(scheduled.len());
        for callable in scheduled {
            let (done, completion) = oneshot::channel::<()>();
            let event = event.clone();
            let args = args.clone();
            let accepted = executor.execute(Box::new(move || {
                let _done = done;
                invoke(&event, callable.listener(), &args);
            }));
            if accepted {
                completions.push(completion);
            }
        }
        Dispatch { completions }
    }
}

fn invoke(event: &str, listener: &Listener, args: &Args) {
    if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| listener.call(args))) {
        let message = payload
            .downcast_ref::<&str>()
            .copied()
            .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
            .unwrap_or("<non-string panic payload>");
        tracing::warn!(event, panic = message, "listener panicked");
    }
}

/// The invocations scheduled by one emission.
///
/// Dropping it does not cancel anything; it only lets the caller wait.
#[derive(Debug, Default)]
pub struct Dispatch {
    completions: Vec<oneshot::Receiver<()>>,
}

impl Dispatch {
    /// Number of listener invocations the executor accepted.
    ///
    /// Jobs the executor dropped (e.g. a listener thread that failed to
    /// spawn) are not counted and are not waited for.
    pub fn scheduled(&self) -> usize {
        self.completions.len()
    }

    /// Wait until every scheduled invocation has finished or panicked.
    pub async fn wait(self) {
        for completion in self.completions {
            let _ = completion.await;
        }
    }

    /// Blocking variant of [`wait`](Self::wait) for synchronous callers.
    ///
    /// Panics if called from within an asynchronous execution context.
    pub fn wait_blocking(self) {
        for completion in self.completions {
            let _ = completion.blocking_recv();
        }
    }
}
