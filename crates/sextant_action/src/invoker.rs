//! Uniform handler invocation.
//!
//! The [`Invoker`] calls any [`Handler`] shape the same way and contains
//! failures: a handler that halts is logged with an operation tag and yields
//! no value, so it can never replace or mask the execution's outcome.
//!
//! Hooks do not go through the invoker. A hook that fails or completes early
//! is an intentional control path and must reach the outcome classifier.

use serde_json::Value;

use crate::action::Action;
use crate::error::{Exception, HandlerError};
use crate::handler::{Handler, HandlerArgs, HandlerResult};

/// Uniform call adapter for handler shapes.
#[derive(Debug, Clone, Copy, Default)]
pub struct Invoker;

impl Invoker {
    /// Calls a handler, logging and swallowing any halt.
    ///
    /// `operation` describes the call site in logs (e.g. `"success callback"`).
    /// Returns `None` when the handler halted.
    pub fn call(
        action: &mut Action,
        handler: &Handler,
        exception: Option<&Exception>,
        operation: &str,
    ) -> Option<Value> {
        match Self::try_call(action, handler, exception) {
            Ok(value) => Some(value),
            Err(halt) => {
                tracing::warn!(
                    action = %action.name(),
                    operation,
                    error = %halt,
                    "handler raised; continuing"
                );
                None
            }
        }
    }

    /// Calls a handler and returns its halt unchanged.
    ///
    /// # Errors
    ///
    /// Returns the handler's own halt, or [`HandlerError::UnknownMethod`] when
    /// a method reference does not resolve.
    pub fn try_call(
        action: &mut Action,
        handler: &Handler,
        exception: Option<&Exception>,
    ) -> HandlerResult {
        match handler {
            Handler::Literal(value) => Ok(value.clone()),
            Handler::Method(name) => Self::call_method(action, name, exception),
            Handler::Niladic(f) => f(action),
            Handler::Positional(f) => f(action, exception),
            Handler::Named(f) => f(action, HandlerArgs { exception }),
        }
    }

    /// Resolves a method against the action's type and calls it.
    ///
    /// # Errors
    ///
    /// Returns [`HandlerError::UnknownMethod`] if no such method is declared,
    /// otherwise whatever the method halts with.
    pub fn call_method(
        action: &mut Action,
        name: &str,
        exception: Option<&Exception>,
    ) -> HandlerResult {
        let method = action.method(name).ok_or_else(|| HandlerError::UnknownMethod {
            action: action.name().to_owned(),
            method: name.to_owned(),
        })?;
        method.call(name, action, exception)
    }
}

/// Converts a handler value into message text; `null` yields nothing.
#[must_use]
pub fn value_to_text(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) => Some(text),
        other => Some(other.to_string()),
    }
}

/// Returns `true` unless the text is empty or whitespace.
#[must_use]
pub fn is_present(text: &str) -> bool {
    !text.trim().is_empty()
}

/// Interprets a handler value as a condition: `null` and `false` are false.
#[must_use]
pub fn is_truthy(value: &Value) -> bool {
    !matches!(value, Value::Null | Value::Bool(false))
}
