//! The read-only view of a finished execution.

use core::fmt;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::Value;
use sextant_action::error::ContractAccessError;
use sextant_action::{Exception, Fields};

use crate::field::{Field, redact};
use crate::outcome::Outcome;

/// Immutable result returned by every execution.
///
/// Only the action's declared outputs are readable. A declared output the
/// action never exposed reads as `null`; reading anything else is a
/// [`ContractAccessError`].
///
/// `Debug` and `Display` replace sensitive outputs with
/// [`FILTERED`](crate::field::FILTERED).
#[derive(Clone)]
pub struct ActionResult {
    action_name: String,
    execution_id: String,
    outcome: Outcome,
    message: String,
    exception: Option<Exception>,
    declared: Vec<Field>,
    fields: Fields,
    elapsed: Duration,
}

impl ActionResult {
    pub(crate) fn new(
        action_name: impl Into<String>,
        execution_id: impl Into<String>,
        outcome: Outcome,
        message: String,
        exception: Option<Exception>,
        declared: Vec<Field>,
        outputs: &Fields,
        elapsed: Duration,
    ) -> Self {
        let fields = declared
            .iter()
            .map(|field| {
                let value = outputs.get(field.name()).cloned().unwrap_or(Value::Null);
                (field.name().to_owned(), value)
            })
            .collect();
        Self {
            action_name: action_name.into(),
            execution_id: execution_id.into(),
            outcome,
            message,
            exception,
            declared,
            fields,
            elapsed,
        }
    }

    /// Returns `true` if the execution succeeded.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.outcome.is_success()
    }

    /// Returns `true` if the action signaled a business failure.
    #[must_use]
    pub fn is_failure(&self) -> bool {
        self.outcome == Outcome::Failure
    }

    /// Returns `true` if an unexpected error escaped the pipeline.
    #[must_use]
    pub fn is_exception(&self) -> bool {
        self.outcome == Outcome::Exception
    }

    /// Returns the outcome.
    #[must_use]
    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    /// Returns the success message if ok, otherwise the error message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the error message, if the execution did not succeed.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        (!self.is_ok()).then_some(self.message.as_str())
    }

    /// Returns the success message, if the execution succeeded.
    #[must_use]
    pub fn success(&self) -> Option<&str> {
        self.is_ok().then_some(self.message.as_str())
    }

    /// Returns the triggering exception, if the execution did not succeed.
    #[must_use]
    pub fn exception(&self) -> Option<&Exception> {
        self.exception.as_ref()
    }

    /// Returns the action type name.
    #[must_use]
    pub fn action_name(&self) -> &str {
        &self.action_name
    }

    /// Returns the execution id.
    #[must_use]
    pub fn execution_id(&self) -> &str {
        &self.execution_id
    }

    /// Returns how long the execution took.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Returns the declared outputs.
    #[must_use]
    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    /// Reads a declared output.
    ///
    /// # Errors
    ///
    /// Returns [`ContractAccessError::Undeclared`] if `name` is not a declared
    /// output of the action.
    pub fn get(&self, name: &str) -> Result<&Value, ContractAccessError> {
        self.fields
            .get(name)
            .ok_or_else(|| ContractAccessError::Undeclared {
                action: self.action_name.clone(),
                field: name.to_owned(),
            })
    }

    /// Reads and decodes a declared output.
    ///
    /// # Errors
    ///
    /// Returns [`ContractAccessError::Undeclared`] if `name` is not declared,
    /// or [`ContractAccessError::Decode`] if it does not decode as `T`.
    pub fn get_as<T: DeserializeOwned>(&self, name: &str) -> Result<T, ContractAccessError> {
        let value = self.get(name)?;
        T::deserialize(value).map_err(|source| ContractAccessError::Decode {
            field: name.to_owned(),
            source,
        })
    }

    /// Converts a non-successful result into its exception.
    ///
    /// # Errors
    ///
    /// Returns the triggering [`Exception`] unless the execution succeeded.
    pub fn into_result(self) -> Result<Self, Exception> {
        match &self.exception {
            Some(exception) if !self.is_ok() => Err(exception.clone()),
            _ => Ok(self),
        }
    }

    fn redacted_fields(&self) -> Fields {
        redact(&self.fields, &self.declared)
    }
}

impl fmt::Debug for ActionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionResult")
            .field("action", &self.action_name)
            .field("outcome", &self.outcome)
            .field("message", &self.message)
            .field("exception", &self.exception)
            .field("fields", &self.redacted_fields())
            .field("elapsed", &self.elapsed)
            .finish()
    }
}

impl fmt::Display for ActionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}] {:?}", self.action_name, self.outcome, self.message)?;
        if !self.fields.is_empty() {
            write!(f, " {}", Value::Object(self.redacted_fields()))?;
        }
        Ok(())
    }
}
