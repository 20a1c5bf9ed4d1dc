//! Action execution orchestration for Rust.
//!
//! Declare action types with layered `around`/`before`/`after` hooks,
//! outcome callbacks and message handlers, then run them with an
//! [`ActionExecutor`](sextant_internal::sextant_pipeline::ActionExecutor):
//!
//! ```
//! use sextant::prelude::*;
//!
//! let greet = ActionType::builder("Greet")
//!     .declare(|d| {
//!         d.exposes("greeting")
//!             .call(|action| {
//!                 let name: String = action.input_as("name")?;
//!                 action.expose("greeting", format!("Hello, {name}"))
//!             })
//!             .success_message("Greeted");
//!     })
//!     .build();
//!
//! let mut inputs = Fields::new();
//! inputs.insert("name".to_owned(), "Ada".into());
//! let result = ActionExecutor::new().run(&greet, inputs);
//!
//! assert!(result.is_ok());
//! assert_eq!(result.get_as::<String>("greeting").unwrap(), "Hello, Ada");
//! ```

pub use sextant_internal::*;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use sextant_internal::prelude::*;
}
