//! Core action primitives for Sextant (Layer 1).
//!
//! `sextant_action` provides everything an action pipeline needs below the
//! type hierarchy:
//!
//! - [`action`] - The per-invocation [`Action`] instance (inputs, outputs, extensions)
//! - [`error`] - The [`Halt`] control-flow signal and the error taxonomy
//! - [`handler`] - Handler and method shapes, and the [`Next`] continuation
//! - [`invoker`] - Uniform call adapter for every handler shape
//! - [`matcher`] - Conditions attached to message and callback entries
//! - [`registry`] - Immutable, copy-on-write, event-keyed handler storage
//! - [`resolver`] - Message and callback resolution over registry entries
//!
//! # Architecture
//!
//! This crate is Layer 1 of the Sextant architecture:
//!
//! - **Layer 1** (`sextant_action`): Action instance and handler plumbing (this crate)
//! - **Layer 2** (`sextant_pipeline`): Action types, hook composition, execution, results
//!
//! Layer 1 never sees the type hierarchy. Named methods are resolved through
//! the [`MethodLookup`] trait, which Layer 2 implements on its action types.
//!
//! # Example
//!
//! ```
//! use sextant_action::handler::Handler;
//! use sextant_action::registry::{MessageEntry, Registry};
//! use sextant_action::resolver::MessageResolver;
//! use sextant_action::{Action, Fields, MessageEvent};
//!
//! let registry = Registry::new()
//!     .register(MessageEvent::Success, MessageEntry::new(Handler::literal("Saved")));
//!
//! let mut action = Action::new("SaveDraft", Fields::new());
//! let entries = registry.for_event(MessageEvent::Success);
//! let resolver = MessageResolver::new(MessageEvent::Success, entries);
//! assert_eq!(resolver.resolve_message(&mut action, None), "Saved");
//! ```

/// The per-invocation action instance.
pub mod action;

/// Control-flow signal and error taxonomy.
pub mod error;

/// Event types keying the registries.
pub mod event;

/// Handler shapes, method shapes, and the pipeline continuation.
pub mod handler;

/// Uniform handler invocation.
pub mod invoker;

/// Conditions attached to registry entries.
pub mod matcher;

/// Immutable event-keyed handler storage.
pub mod registry;

/// Message and callback resolution.
pub mod resolver;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use crate::action::{Action, Fields, MethodLookup};
    pub use crate::error::{
        BoxError, Completion, ContractAccessError, Exception, Failure, HandlerError, Halt,
        InputError,
    };
    pub use crate::event::{CallbackEvent, MessageEvent};
    pub use crate::handler::{Handler, HandlerArgs, HandlerShape, Method, MethodTable, Next};
    pub use crate::invoker::Invoker;
    pub use crate::matcher::Matcher;
    pub use crate::registry::{CallbackEntry, MessageEntry, Registry};
    pub use crate::resolver::{CallbackResolver, MessageResolver};
}

// Re-export key types at crate root for convenience
pub use action::{Action, Fields, MethodLookup};
pub use error::{Completion, Exception, Failure, Halt};
pub use event::{CallbackEvent, MessageEvent};
