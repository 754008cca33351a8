//! Thread-safe in-process event emitter.
//!
//! Listeners subscribe to string-named events; [`EventEmitter::emit`] hands
//! one invocation per listener to an [`Executor`] and returns without waiting
//! for them.
//!
//! ```no_run
//! use emitter::{args, EventEmitter, Listener};
//!
//! let events = EventEmitter::new(10);
//! let greet = Listener::new(|args| {
//!     if let Some(name) = args.get::<&str>(0) {
//!         println!("hello, {name}");
//!     }
//! });
//! events.on("greet", greet.clone()).unwrap();
//! events.emit("greet", args!["world"]);
//! events.remove_listener("greet", &greet);
//! ```
//!
//! Each event name keeps its listeners in an ordered [`ListenerRegistry`]
//! guarded by its own lock. The emitter's map of names to registries has a
//! separate lock that is only held while a registry is looked up or created.

mod args;
pub mod config;
mod emitter;
mod error;
pub mod executor;
mod listener;
pub mod registry;

pub use args::{Arg, Args};
pub use config::{ConfigError, DispatchMode, EmitterConfig, DEFAULT_MAX_LISTENERS};
pub use emitter::{EventEmitter, NEW_LISTENER, REMOVE_LISTENER};
pub use error::EmitterError;
pub use executor::{Executor, InlineExecutor, Job, ThreadExecutor, TokioExecutor};
pub use listener::{Callable, Listener, SubscriptionId};
pub use registry::{Dispatch, ListenerRegistry, Position};

pub mod prelude {
    //! Re-exports of the most commonly used emitter types.
    pub use crate::{args, Args, EmitterError, EventEmitter, Listener, SubscriptionId};
}
