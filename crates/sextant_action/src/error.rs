//! Control-flow signal and error taxonomy.
//!
//! Hooks, bodies, methods and handlers all return `Result<_, Halt>`. A
//! [`Halt`] is one of three things:
//!
//! - [`Halt::Fail`] - an intentional business failure carrying a user-safe message
//! - [`Halt::Complete`] - an early, non-error completion of the pipeline
//! - [`Halt::Error`] - any other error, preserved as an [`Exception`]
//!
//! Any `std::error::Error + Send + Sync + 'static` converts into a `Halt`
//! through `?`, so action bodies can propagate library errors directly:
//!
//! ```
//! use sextant_action::Halt;
//!
//! fn parse_quantity(raw: &str) -> Result<u32, Halt> {
//!     let quantity: u32 = raw.parse()?;
//!     if quantity == 0 {
//!         return Err(Halt::fail("Quantity must be positive"));
//!     }
//!     Ok(quantity)
//! }
//!
//! assert!(parse_quantity("3").is_ok());
//! assert!(parse_quantity("0").unwrap_err().is_fail());
//! assert!(parse_quantity("x").unwrap_err().is_error());
//! ```
//!
//! `Halt` intentionally does not implement [`core::error::Error`]; that keeps
//! the blanket `From` conversion coherent.

use core::any::Any;
use core::error::Error;
use core::fmt;
use std::sync::Arc;

/// Boxed error type accepted at collaborator boundaries.
pub type BoxError = Box<dyn Error + Send + Sync + 'static>;

// ─────────────────────────────────────────────────────────────────────────────
// Failure
// ─────────────────────────────────────────────────────────────────────────────

/// An expected, caller-declared abort with a user-safe message.
///
/// Failures are never routed to the global exception hook; only `failure`
/// and `error` callbacks fire for them.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct Failure {
    message: String,
}

impl Failure {
    /// Creates a failure with the given message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Returns the user-safe failure message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Completion
// ─────────────────────────────────────────────────────────────────────────────

/// Early completion of the pipeline.
///
/// Skips whatever remains of the pipeline and finishes the execution as a
/// success. The optional message replaces the resolved success message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Completion {
    message: Option<String>,
}

impl Completion {
    /// Completion without a message.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Completion carrying a success message.
    #[must_use]
    pub fn with_message(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
        }
    }

    /// Returns the completion message, if any.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Exception
// ─────────────────────────────────────────────────────────────────────────────

/// Ad-hoc error used by [`Exception::msg`].
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
struct MessageError(String);

/// The error that terminated an execution.
///
/// Wraps the original error value unmodified behind an [`Arc`], so it can be
/// handed to every interested handler and kept on the result while callers
/// still recover the concrete type with [`downcast_ref`](Self::downcast_ref).
#[derive(Clone)]
pub struct Exception {
    inner: Arc<dyn Error + Send + Sync + 'static>,
    type_name: &'static str,
}

impl Exception {
    /// Wraps an error value.
    ///
    /// Wrapping an `Exception` returns a clone of it rather than nesting.
    #[must_use]
    pub fn new<E>(error: E) -> Self
    where
        E: Error + Send + Sync + 'static,
    {
        if let Some(existing) = (&error as &dyn Any).downcast_ref::<Exception>() {
            return existing.clone();
        }
        Self {
            inner: Arc::new(error),
            type_name: core::any::type_name::<E>(),
        }
    }

    /// Wraps an already boxed error.
    #[must_use]
    pub fn from_boxed(error: BoxError) -> Self {
        Self {
            inner: Arc::from(error),
            type_name: "dyn core::error::Error",
        }
    }

    /// Creates an exception from a plain message.
    #[must_use]
    pub fn msg(message: impl Into<String>) -> Self {
        Self::new(MessageError(message.into()))
    }

    /// Returns the error's display message.
    #[must_use]
    pub fn message(&self) -> String {
        self.inner.to_string()
    }

    /// Returns the type name of the wrapped error.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Returns `true` if the wrapped error is of type `E`.
    #[must_use]
    pub fn is<E: Error + 'static>(&self) -> bool {
        self.inner.is::<E>()
    }

    /// Returns the wrapped error as `E`, if it is one.
    #[must_use]
    pub fn downcast_ref<E: Error + 'static>(&self) -> Option<&E> {
        self.inner.downcast_ref::<E>()
    }

    /// Returns the business failure this exception carries, if any.
    #[must_use]
    pub fn failure(&self) -> Option<&Failure> {
        self.downcast_ref::<Failure>()
    }

    /// Returns `true` if this exception carries a business failure.
    #[must_use]
    pub fn is_failure(&self) -> bool {
        self.is::<Failure>()
    }

    /// Returns the wrapped error.
    #[must_use]
    pub fn as_error(&self) -> &(dyn Error + Send + Sync + 'static) {
        &*self.inner
    }

    /// Returns `true` if both exceptions wrap the same error instance.
    #[must_use]
    pub fn ptr_eq(&self, other: &Exception) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Exception {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Exception")
            .field("type", &self.type_name)
            .field("message", &self.message())
            .finish()
    }
}

impl fmt::Display for Exception {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.inner, f)
    }
}

impl Error for Exception {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.inner.source()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Halt
// ─────────────────────────────────────────────────────────────────────────────

/// Early exit from a hook, body, method or handler.
#[derive(Debug, Clone)]
pub enum Halt {
    /// Intentional business failure.
    Fail(Failure),
    /// Non-error short-circuit of the remaining pipeline.
    Complete(Completion),
    /// Any other error.
    ///
    /// Build it with [`Halt::error`] or `?`. A [`Failure`] wrapped here
    /// directly is still classified as a business failure.
    Error(Exception),
}

impl Halt {
    /// Signals a business failure.
    #[must_use]
    pub fn fail(message: impl Into<String>) -> Self {
        Halt::Fail(Failure::new(message))
    }

    /// Signals early completion without a message.
    #[must_use]
    pub fn complete() -> Self {
        Halt::Complete(Completion::new())
    }

    /// Signals early completion with a success message.
    #[must_use]
    pub fn complete_with(message: impl Into<String>) -> Self {
        Halt::Complete(Completion::with_message(message))
    }

    /// Wraps an arbitrary error.
    #[must_use]
    pub fn error<E>(error: E) -> Self
    where
        E: Error + Send + Sync + 'static,
    {
        Self::from_exception(Exception::new(error))
    }

    /// Raises an ad-hoc error with the given message.
    #[must_use]
    pub fn msg(message: impl Into<String>) -> Self {
        Halt::Error(Exception::msg(message))
    }

    /// Classifies an exception, unwrapping business failures into [`Halt::Fail`].
    #[must_use]
    pub fn from_exception(exception: Exception) -> Self {
        match exception.failure() {
            Some(failure) => Halt::Fail(failure.clone()),
            None => Halt::Error(exception),
        }
    }

    /// Returns `true` for [`Halt::Fail`].
    #[must_use]
    pub fn is_fail(&self) -> bool {
        matches!(self, Halt::Fail(_))
    }

    /// Returns `true` for [`Halt::Complete`].
    #[must_use]
    pub fn is_complete(&self) -> bool {
        matches!(self, Halt::Complete(_))
    }

    /// Returns `true` for [`Halt::Error`].
    #[must_use]
    pub fn is_error(&self) -> bool {
        matches!(self, Halt::Error(_))
    }

    /// Converts into the triggering exception; completions carry none.
    #[must_use]
    pub fn into_exception(self) -> Option<Exception> {
        match self {
            Halt::Fail(failure) => Some(Exception::new(failure)),
            Halt::Error(exception) => Some(exception),
            Halt::Complete(_) => None,
        }
    }
}

impl fmt::Display for Halt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Halt::Fail(failure) => write!(f, "failure: {failure}"),
            Halt::Complete(completion) => match completion.message() {
                Some(message) => write!(f, "completed early: {message}"),
                None => write!(f, "completed early"),
            },
            Halt::Error(exception) => write!(f, "{}: {exception}", exception.type_name()),
        }
    }
}

impl<E> From<E> for Halt
where
    E: Error + Send + Sync + 'static,
{
    fn from(error: E) -> Self {
        Halt::from_exception(Exception::new(error))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// HandlerError
// ─────────────────────────────────────────────────────────────────────────────

/// A failure inside a hook or handler's plumbing rather than its logic.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HandlerError {
    /// No method with this name is declared anywhere in the type chain.
    #[error("no method `{method}` declared on action `{action}`")]
    UnknownMethod {
        /// The action type name.
        action: String,
        /// The requested method name.
        method: String,
    },

    /// A wrapping method was referenced where a plain call is required.
    #[error("method `{method}` wraps the pipeline and cannot be called directly")]
    NotCallable {
        /// The method name.
        method: String,
    },
}

// ─────────────────────────────────────────────────────────────────────────────
// InputError
// ─────────────────────────────────────────────────────────────────────────────

/// Errors reading typed inputs from an action.
#[derive(Debug, thiserror::Error)]
pub enum InputError {
    /// The input is not present.
    #[error("missing input `{field}`")]
    Missing {
        /// The input name.
        field: String,
    },

    /// The input is present but does not decode as the requested type.
    #[error("input `{field}` has an unexpected shape: {source}")]
    Decode {
        /// The input name.
        field: String,
        /// The decoding error.
        #[source]
        source: serde_json::Error,
    },
}

// ─────────────────────────────────────────────────────────────────────────────
// ContractAccessError
// ─────────────────────────────────────────────────────────────────────────────

/// Programmer error reading a field from a finished result.
#[derive(Debug, thiserror::Error)]
pub enum ContractAccessError {
    /// The field is not a declared output of the action.
    #[error("`{field}` is not a declared output of `{action}`")]
    Undeclared {
        /// The action type name.
        action: String,
        /// The requested field.
        field: String,
    },

    /// The declared field does not decode as the requested type.
    #[error("declared output `{field}` could not be decoded: {source}")]
    Decode {
        /// The requested field.
        field: String,
        /// The decoding error.
        #[source]
        source: serde_json::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("disk full")]
    struct DiskFull;

    #[test]
    fn question_mark_routes_failures_to_fail() {
        fn body() -> Result<(), Halt> {
            Err::<(), _>(Failure::new("no stock"))?;
            Ok(())
        }

        match body() {
            Err(Halt::Fail(failure)) => assert_eq!(failure.message(), "no stock"),
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[test]
    fn question_mark_routes_other_errors_to_error() {
        fn body() -> Result<(), Halt> {
            Err::<(), _>(DiskFull)?;
            Ok(())
        }

        let halt = body().unwrap_err();
        assert!(halt.is_error());
        let exception = halt.into_exception().unwrap();
        assert!(exception.is::<DiskFull>());
        assert_eq!(exception.message(), "disk full");
    }

    #[test]
    fn wrapping_an_exception_does_not_nest() {
        let original = Exception::new(DiskFull);
        let wrapped = Exception::new(original.clone());

        assert!(wrapped.ptr_eq(&original));
        assert!(wrapped.downcast_ref::<DiskFull>().is_some());
    }

    #[test]
    fn failure_exception_round_trips_through_halt() {
        let exception = Halt::fail("nope").into_exception().unwrap();
        assert!(exception.is_failure());
        assert_eq!(exception.failure().map(Failure::message), Some("nope"));
        assert!(Halt::from_exception(exception).is_fail());
    }

    #[test]
    fn completion_carries_no_exception() {
        assert!(Halt::complete().into_exception().is_none());
        assert_eq!(
            Halt::complete_with("done").to_string(),
            "completed early: done"
        );
    }

    #[test]
    fn msg_exception_displays_message() {
        let exception = Exception::msg("boom");
        assert_eq!(exception.to_string(), "boom");
        assert!(!exception.is_failure());
    }
}
