//! Conditions attached to message and callback entries.
//!
//! An entry without a matcher always applies and is called *static*. A
//! matcher is evaluated against the running action and the triggering
//! exception, if any.

use core::error::Error;
use core::fmt;
use std::sync::Arc;

use crate::action::Action;
use crate::error::Exception;
use crate::invoker::{Invoker, is_truthy};

type PredicateFn = dyn Fn(&Action, Option<&Exception>) -> bool + Send + Sync;

/// Checks whether an exception wraps one concrete error type.
#[derive(Clone, Copy)]
pub struct ErrorType {
    check: fn(&Exception) -> bool,
    type_name: &'static str,
}

impl ErrorType {
    fn of<E: Error + 'static>() -> Self {
        fn check<E: Error + 'static>(exception: &Exception) -> bool {
            exception.is::<E>()
        }
        Self {
            check: check::<E>,
            type_name: core::any::type_name::<E>(),
        }
    }

    /// Returns the matched type's name.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

/// Decides whether a registry entry applies to the current execution.
#[derive(Clone)]
pub enum Matcher {
    /// An arbitrary predicate over the action and exception.
    When(Arc<PredicateFn>),
    /// A method on the action; applies when it returns a truthy value.
    Method(Arc<str>),
    /// Applies when the triggering exception wraps a given error type.
    Error(ErrorType),
    /// Inverts another matcher.
    Not(Box<Matcher>),
}

impl Matcher {
    /// Matches when the predicate returns `true`.
    #[must_use]
    pub fn when<F>(predicate: F) -> Self
    where
        F: Fn(&Action, Option<&Exception>) -> bool + Send + Sync + 'static,
    {
        Matcher::When(Arc::new(predicate))
    }

    /// Matches when the named method returns a truthy value.
    #[must_use]
    pub fn method(name: impl Into<Arc<str>>) -> Self {
        Matcher::Method(name.into())
    }

    /// Matches when the triggering exception is an `E`.
    #[must_use]
    pub fn error<E: Error + 'static>() -> Self {
        Matcher::Error(ErrorType::of::<E>())
    }

    /// Matches when `matcher` does not.
    #[must_use]
    pub fn not(matcher: Matcher) -> Self {
        Matcher::Not(Box::new(matcher))
    }

    /// Evaluates the matcher.
    ///
    /// A method matcher that halts is logged and treated as not matching.
    pub fn matches(&self, action: &mut Action, exception: Option<&Exception>) -> bool {
        match self {
            Matcher::When(predicate) => predicate(action, exception),
            Matcher::Method(name) => match Invoker::call_method(action, name, exception) {
                Ok(value) => is_truthy(&value),
                Err(halt) => {
                    tracing::warn!(
                        action = %action.name(),
                        operation = "matcher",
                        method = %name,
                        error = %halt,
                        "matcher raised; treating as no match"
                    );
                    false
                }
            },
            Matcher::Error(error_type) => exception.is_some_and(|e| (error_type.check)(e)),
            Matcher::Not(inner) => !inner.matches(action, exception),
        }
    }
}

impl fmt::Debug for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Matcher::When(_) => f.write_str("When(..)"),
            Matcher::Method(name) => f.debug_tuple("Method").field(name).finish(),
            Matcher::Error(error_type) => {
                f.debug_tuple("Error").field(&error_type.type_name).finish()
            }
            Matcher::Not(inner) => f.debug_tuple("Not").field(inner).finish(),
        }
    }
}
