//! Action types and execution for Sextant (Layer 2).
//!
//! `sextant_pipeline` turns declared action types into executions:
//!
//! - [`ActionType`] - Type tree nodes holding locally declared hooks, methods,
//!   messages, callbacks and fields
//! - [`Pipeline`] - The composed `around`/`before`/body/`after` stack
//! - [`OutcomeClassifier`] - Classifies how a pipeline ended and dispatches callbacks
//! - [`ActionExecutor`] - Runs an action type and resolves its message
//! - [`ActionResult`] - The immutable, field-restricted view returned to callers
//!
//! # Example
//!
//! ```
//! use sextant_pipeline::prelude::*;
//!
//! let place_order = ActionType::builder("PlaceOrder")
//!     .declare(|d| {
//!         d.exposes("order_id")
//!             .call(|action| action.expose("order_id", 1001))
//!             .success_message("Order placed");
//!     })
//!     .build();
//!
//! let result = ActionExecutor::new().run(&place_order, Fields::new());
//! assert!(result.is_ok());
//! assert_eq!(result.message(), "Order placed");
//! assert_eq!(result.get_as::<u32>("order_id").unwrap(), 1001);
//! ```
//!
//! # Architecture
//!
//! This crate is Layer 2 of the Sextant architecture:
//!
//! - **Layer 1** (`sextant_action`): Action instance and handler plumbing
//! - **Layer 2** (`sextant_pipeline`): Action types, hooks, execution and results (this crate)

/// Action type descriptors, declarations and extensions.
pub mod descriptor;

/// Action execution engine and its configuration.
pub mod executor;

/// Declared fields and redaction.
pub mod field;

/// Lifecycle hooks and pipeline composition.
pub mod hooks;

/// Outcome classification.
pub mod outcome;

/// The post-execution result view.
pub mod result;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use crate::descriptor::{ActionType, ActionTypeBuilder, Declarations, Extension};
    pub use crate::executor::{ActionExecutor, ExceptionContext, ExceptionHook, ExecutorConfig};
    pub use crate::field::{FILTERED, Field, redact};
    pub use crate::hooks::{Body, Hook, HookKind, HookSource, Pipeline};
    pub use crate::outcome::{Execution, Outcome, OutcomeClassifier};
    pub use crate::result::ActionResult;
    pub use sextant_action::prelude::*;
}

// Re-export key types at crate root for convenience
pub use descriptor::{ActionType, Declarations, Extension};
pub use executor::{ActionExecutor, ExecutorConfig};
pub use field::Field;
pub use hooks::Pipeline;
pub use outcome::{Outcome, OutcomeClassifier};
pub use result::ActionResult;
