use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use dashmap::DashMap;

use crate::config::{ConfigError, EmitterConfig};
use crate::error::EmitterError;
use crate::executor::{default_executor, Executor};
use crate::listener::{Callable, Listener, SubscriptionId};
use crate::registry::{Dispatch, ListenerRegistry, Position};
use crate::{args, Args};

/// Emitted after every successful subscription with `(event: String, listener: Listener)`.
pub const NEW_LISTENER: &str = "newListener";

/// Emitted after every successful removal with `(event: String, listener: Listener)`.
pub const REMOVE_LISTENER: &str = "removeListener";

/// Thread-safe in-process event emitter.
///
/// Listeners subscribe to an event name and are invoked, in registration
/// order, with the [`Args`] of every [`emit`](Self::emit) of that name.
/// Invocations are handed to an [`Executor`] and never awaited by `emit`,
/// so a slow listener does not hold up the emitting caller or the other
/// listeners.
///
/// Each event name may hold at most `max_listeners` registrations at a time.
///
/// The two reserved events [`NEW_LISTENER`] and [`REMOVE_LISTENER`] are
/// emitted automatically after subscriptions and removals. They are
/// ordinary event names and are submitted to the executor only after the
/// triggering call has released every lock it took.
///
/// `EventEmitter` is `Clone` and can be shared across threads.
#[derive(Clone)]
pub struct EventEmitter {
    inner: Arc<Inner>,
}

struct Inner {
    registries: DashMap<String, Arc<ListenerRegistry>>,
    max_listeners: AtomicUsize,
    executor: Arc<dyn Executor>,
}

impl EventEmitter {
    /// Create an emitter with the default executor.
    ///
    /// Inside a tokio runtime, listeners run on its blocking pool; anywhere
    /// else, each invocation gets its own thread.
    pub fn new(max_listeners: usize) -> Self {
        Self::with_shared_executor(max_listeners, default_executor())
    }

    pub fn with_executor(max_listeners: usize, executor: impl Executor) -> Self {
        Self::with_shared_executor(max_listeners, Arc::new(executor))
    }

    pub fn with_shared_executor(max_listeners: usize, executor: Arc<dyn Executor>) -> Self {
        Self {
            inner: Arc::new(Inner {
                registries: DashMap::new(),
                max_listeners: AtomicUsize::new(max_listeners),
                executor,
            }),
        }
    }

    /// Create an emitter from loaded config.
    pub fn from_config(config: &EmitterConfig) -> Result<Self, ConfigError> {
        let executor = config.dispatch.executor()?;
        Ok(Self::with_shared_executor(config.max_listeners, executor))
    }

    pub fn max_listeners(&self) -> usize {
        self.inner.max_listeners.load(Ordering::Relaxed)
    }

    /// Change the per-event ceiling.
    ///
    /// Existing registrations are kept when lowering it; only new
    /// subscriptions are rejected.
    pub fn set_max_listeners(&self, max_listeners: usize) -> &Self {
        self.inner.max_listeners.store(max_listeners, Ordering::Relaxed);
        self
    }

    // ── Subscription ───────────────────────────────────────────────────

    /// Register `listener` for `event`.
    ///
    /// Fails without side effects when the event already holds
    /// `max_listeners` registrations. On success, [`NEW_LISTENER`] is
    /// scheduled with the event name and listener.
    pub fn subscribe(
        &self,
        event: &str,
        listener: Listener,
        once: bool,
        position: Position,
    ) -> Result<SubscriptionId, EmitterError> {
        let registry = self.registry_or_create(event);
        let max = self.max_listeners();
        let callable = Arc::new(Callable::new(listener.clone(), once));
        let id = callable.id();

        if registry.try_insert(callable, position, max).is_err() {
            tracing::warn!(event, max, "listener rejected, max listeners reached");
            return Err(EmitterError::MaxListenersExceeded {
                event: event.to_string(),
                max,
            });
        }

        tracing::debug!(event, %id, once, ?position, "listener added");
        self.announce(NEW_LISTENER, event, listener);
        Ok(id)
    }

    pub fn on(&self, event: &str, listener: Listener) -> Result<SubscriptionId, EmitterError> {
        self.subscribe(event, listener, false, Position::Back)
    }

    pub fn add_listener(
        &self,
        event: &str,
        listener: Listener,
    ) -> Result<SubscriptionId, EmitterError> {
        self.on(event, listener)
    }

    /// Register a listener that is removed as soon as one emission schedules it.
    pub fn once(&self, event: &str, listener: Listener) -> Result<SubscriptionId, EmitterError> {
        self.subscribe(event, listener, true, Position::Back)
    }

    pub fn prepend_listener(
        &self,
        event: &str,
        listener: Listener,
    ) -> Result<SubscriptionId, EmitterError> {
        self.subscribe(event, listener, false, Position::Front)
    }

    pub fn prepend_once_listener(
        &self,
        event: &str,
        listener: Listener,
    ) -> Result<SubscriptionId, EmitterError> {
        self.subscribe(event, listener, true, Position::Front)
    }

    // ── Removal ────────────────────────────────────────────────────────

    /// Remove the first registration (in delivery order) of `listener`.
    ///
    /// When the same listener is registered several times, each call removes
    /// only the front-most one; use [`unsubscribe`](Self::unsubscribe) to
    /// target a specific registration. Returns `false` if the event is
    /// unknown or the listener is not registered.
    pub fn remove_listener(&self, event: &str, listener: &Listener) -> bool {
        let Some(registry) = self.registry(event) else {
            return false;
        };
        match registry.remove_by_listener(listener) {
            Some(callable) => {
                self.removed(event, &callable);
                true
            }
            None => false,
        }
    }

    pub fn off(&self, event: &str, listener: &Listener) -> bool {
        self.remove_listener(event, listener)
    }

    /// Remove the registration identified by `id`.
    pub fn unsubscribe(&self, event: &str, id: SubscriptionId) -> bool {
        let Some(registry) = self.registry(event) else {
            return false;
        };
        match registry.remove_by_id(id) {
            Some(callable) => {
                self.removed(event, &callable);
                true
            }
            None => false,
        }
    }

    /// Remove every registration for `event`.
    ///
    /// [`REMOVE_LISTENER`] is scheduled once per registration actually
    /// removed by this call. Unknown events are ignored.
    pub fn remove_all_listeners(&self, event: &str) -> &Self {
        if let Some(registry) = self.registry(event) {
            registry.for_each(|callable| {
                if registry.remove(callable) {
                    self.removed(event, callable);
                }
            });
        }
        self
    }

    // ── Emission ───────────────────────────────────────────────────────

    /// Schedule every listener of `event` with `args`.
    ///
    /// Returns the number of invocations scheduled; emitting an event nobody
    /// listens to is a no-op returning `0`. Does not wait for listeners.
    pub fn emit(&self, event: &str, args: Args) -> usize {
        self.dispatch(event, args).scheduled()
    }

    /// Like [`emit`](Self::emit), but returns the [`Dispatch`] so the caller
    /// can wait for the scheduled invocations.
    pub fn dispatch(&self, event: &str, args: Args) -> Dispatch {
        match self.registry(event) {
            Some(registry) => registry.dispatch(event, &args, self.inner.executor.as_ref()),
            None => {
                tracing::trace!(event, "no listeners registered");
                Dispatch::default()
            }
        }
    }

    /// Emit and wait until every scheduled listener has finished.
    pub async fn emit_and_wait(&self, event: &str, args: Args) -> usize {
        let dispatch = self.dispatch(event, args);
        let scheduled = dispatch.scheduled();
        dispatch.wait().await;
        scheduled
    }

    // ── Introspection ──────────────────────────────────────────────────

    pub fn listener_count(&self, event: &str) -> usize {
        self.registry(event).map_or(0, |registry| registry.len())
    }

    /// Every event name that has ever had a subscription, including names
    /// whose listeners have all been removed since.
    pub fn event_names(&self) -> Vec<String> {
        self.inner
            .registries
            .iter()
            .map(|entry| entry.key().clone())
            .collect()
    }

    /// Snapshot of the listeners of `event`, in delivery order.
    pub fn raw_listeners(&self, event: &str) -> Vec<Listener> {
        self.registry(event)
            .map(|registry| registry.listeners())
            .unwrap_or_default()
    }

    // ── Internals ──────────────────────────────────────────────────────

    fn registry(&self, event: &str) -> Option<Arc<ListenerRegistry>> {
        self.inner
            .registries
            .get(event)
            .map(|entry| entry.value().clone())
    }

    fn registry_or_create(&self, event: &str) -> Arc<ListenerRegistry> {
        if let Some(registry) = self.registry(event) {
            return registry;
        }
        self.inner
            .registries
            .entry(event.to_string())
            .or_default()
            .value()
            .clone()
    }

    fn removed(&self, event: &str, callable: &Callable) {
        tracing::debug!(event, id = %callable.id(), "listener removed");
        self.announce(REMOVE_LISTENER, event, callable.listener().clone());
    }

    /// Schedule a reserved-event emission on the executor.
    ///
    /// Callers must not hold any registry lock or map guard.
    fn announce(&self, reserved: &'static str, event: &str, listener: Listener) {
        let emitter = self.clone();
        let args = args![event.to_string(), listener];
        self.inner.executor.execute(Box::new(move || {
            emitter.emit(reserved, args);
        }));
    }
}

impl Default for EventEmitter {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_MAX_LISTENERS)
    }
}

impl fmt::Debug for EventEmitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventEmitter")
            .field("events", &self.inner.registries.len())
            .field("max_listeners", &self.max_listeners())
            .finish()
    }
}
