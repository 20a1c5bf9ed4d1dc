//! # Sextant Internal Library
//!
//! Re-exports the core Sextant crates for convenience.

/// Layer 1: Action instances, handlers and resolution.
pub use sextant_action;

/// Layer 2: Action types, hook composition and execution.
pub use sextant_pipeline;

/// Tracing subscriber setup.
pub use sextant_tracing;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use sextant_pipeline::prelude::*;
    pub use sextant_tracing::{TracingConfig, TracingFormat};
}
