//! Message and callback resolution over registry entries.
//!
//! Both resolvers take entries in evaluation order, most recent first. They
//! differ in how many entries they act on:
//!
//! - [`MessageResolver`] stops at the first entry that yields a non-blank
//!   message.
//! - [`CallbackResolver`] runs every matching entry for its side effects.
//!
//! Neither resolver lets a handler failure escape. Failures are logged by
//! the [`Invoker`](crate::invoker::Invoker) and the entry is skipped.

mod callback;
mod message;

pub use callback::CallbackResolver;
pub use message::MessageResolver;
