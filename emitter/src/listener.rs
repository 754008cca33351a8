use std::fmt;
use std::sync::Arc;

use uuid::Uuid;

use crate::Args;

type ListenerFn = dyn Fn(&Args) + Send + Sync;

/// A shared reference to a listener function.
///
/// Cloning a `Listener` clones the reference, so clones compare equal under
/// [`Listener::ptr_eq`]. Keep a clone around to remove the listener later by
/// reference; two listeners built from separate `Listener::new` calls are
/// always distinct, even when they wrap identical closures.
#[derive(Clone)]
pub struct Listener {
    func: Arc<ListenerFn>,
}

impl Listener {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Args) + Send + Sync + 'static,
    {
        Self { func: Arc::new(f) }
    }

    pub fn call(&self, args: &Args) {
        (self.func)(args)
    }

    /// Whether both references point to the same listener function.
    pub fn ptr_eq(&self, other: &Listener) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.func), Arc::as_ptr(&other.func))
    }
}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Listener({:p})", Arc::as_ptr(&self.func))
    }
}

/// Opaque handle returned by a successful subscription.
///
/// Identifies exactly one registration, so it stays unambiguous when the
/// same [`Listener`] is registered more than once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(Uuid);

impl SubscriptionId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Sub({})", &self.0.simple().to_string()[..8])
    }
}

/// One registration record: a listener plus its once flag.
#[derive(Debug)]
pub struct Callable {
    id: SubscriptionId,
    listener: Listener,
    once: bool,
}

impl Callable {
    pub fn new(listener: Listener, once: bool) -> Self {
        Self {
            id: SubscriptionId::new(),
            listener,
            once,
        }
    }

    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    pub fn listener(&self) -> &Listener {
        &self.listener
    }

    pub fn is_once(&self) -> bool {
        self.once
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clone_is_same_listener() {
        let a = Listener::new(|_| {});
        let b = a.clone();
        assert!(a.ptr_eq(&b));
    }

    #[test]
    fn test_separate_listeners_are_distinct() {
        let a = Listener::new(|_| {});
        let b = Listener::new(|_| {});
        assert!(!a.ptr_eq(&b));
    }

    #[test]
    fn test_callables_get_unique_ids() {
        let listener = Listener::new(|_| {});
        let first = Callable::new(listener.clone(), false);
        let second = Callable::new(listener, true);
        assert_ne!(first.id(), second.id());
        assert!(first.listener().ptr_eq(second.listener()));
        assert!(second.is_once());
    }
}
